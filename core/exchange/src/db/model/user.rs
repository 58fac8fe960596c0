use chrono::{NaiveDateTime, Utc};
use diesel::backend::Backend;
use diesel::deserialize;
use diesel::serialize::Output;
use diesel::sql_types::Integer;
use diesel::types::{FromSql, ToSql};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::schema::exchange_user;

/// Role is fixed at account creation and never changes afterwards.
#[derive(
    FromPrimitive,
    AsExpression,
    FromSqlRow,
    PartialEq,
    Debug,
    Clone,
    Copy,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[sql_type = "Integer"]
pub enum Role {
    /// Waste-producing organization. Creates Material listings.
    Industry = 0,
    /// Craftsperson. Creates Requests against available Materials.
    Artisan = 1,
    /// Oversight role. Moderates users, never a transacting party.
    Admin = 2,
}

#[derive(Clone, Debug, Identifiable, Insertable, Queryable, Serialize, Deserialize)]
#[table_name = "exchange_user"]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,

    /// Set for Industry accounts only.
    pub company_name: Option<String>,
    /// Set for Industry accounts only.
    pub tax_id: Option<String>,
    /// Set for Artisan accounts only.
    pub location: Option<String>,

    pub is_verified: bool,
    pub is_active: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl User {
    pub fn new(new_user: NewUser) -> User {
        let now = Utc::now().naive_utc();
        // Attributes not matching the role are discarded.
        let (company_name, tax_id, location) = match new_user.role {
            Role::Industry => (new_user.company_name, new_user.tax_id, None),
            Role::Artisan => (None, None, new_user.location),
            Role::Admin => (None, None, None),
        };

        User {
            id: Uuid::new_v4().to_string(),
            email: new_user.email,
            name: new_user.name,
            role: new_user.role,
            company_name,
            tax_id,
            location,
            is_verified: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl<DB: Backend> ToSql<Integer, DB> for Role
where
    i32: ToSql<Integer, DB>,
{
    fn to_sql<W: std::io::Write>(&self, out: &mut Output<W, DB>) -> diesel::serialize::Result {
        (*self as i32).to_sql(out)
    }
}

impl<DB> FromSql<Integer, DB> for Role
where
    i32: FromSql<Integer, DB>,
    DB: Backend,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> deserialize::Result<Self> {
        let enum_value = i32::from_sql(bytes)?;
        Ok(FromPrimitive::from_i32(enum_value).ok_or(anyhow::anyhow!(
            "Invalid conversion from {} (i32) to Role.",
            enum_value
        ))?)
    }
}
