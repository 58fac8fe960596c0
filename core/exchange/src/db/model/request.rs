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

use crate::db::model::Material;
use crate::db::schema::exchange_request;

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
pub enum RequestStatus {
    /// Newly created by a requester. Awaits the owner's decision.
    Pending = 0,
    /// Accepted by the owner. Material quantity has been reserved and a
    /// pending Transaction exists.
    Accepted = 1,
    /// Declined by the owner. Terminal.
    Rejected = 2,
    /// Settled by either party after acceptance. Terminal.
    Completed = 3,
}

#[derive(Clone, Debug, Identifiable, Insertable, Queryable, Serialize, Deserialize)]
#[table_name = "exchange_request"]
pub struct Request {
    pub id: String,
    pub material_id: String,
    pub requester_id: String,
    /// Copied from the material's owner at creation time and immutable
    /// thereafter.
    pub owner_id: String,
    pub quantity: f64,
    pub message: String,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Request {
    pub fn new(material: &Material, requester_id: &str, quantity: f64, message: String) -> Request {
        let now = Utc::now().naive_utc();
        Request {
            id: Uuid::new_v4().to_string(),
            material_id: material.id.clone(),
            requester_id: requester_id.to_string(),
            owner_id: material.owner_id.clone(),
            quantity,
            message,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl<DB: Backend> ToSql<Integer, DB> for RequestStatus
where
    i32: ToSql<Integer, DB>,
{
    fn to_sql<W: std::io::Write>(&self, out: &mut Output<W, DB>) -> diesel::serialize::Result {
        (*self as i32).to_sql(out)
    }
}

impl<DB> FromSql<Integer, DB> for RequestStatus
where
    i32: FromSql<Integer, DB>,
    DB: Backend,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> deserialize::Result<Self> {
        let enum_value = i32::from_sql(bytes)?;
        Ok(FromPrimitive::from_i32(enum_value).ok_or(anyhow::anyhow!(
            "Invalid conversion from {} (i32) to RequestStatus.",
            enum_value
        ))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_integer_mapping_is_stable() {
        for (raw, status) in [
            (0, RequestStatus::Pending),
            (1, RequestStatus::Accepted),
            (2, RequestStatus::Rejected),
            (3, RequestStatus::Completed),
        ] {
            assert_eq!(RequestStatus::from_i32(raw), Some(status));
            assert_eq!(status as i32, raw);
        }
        assert_eq!(RequestStatus::from_i32(4), None);
        assert_eq!(RequestStatus::from_i32(-1), None);
    }
}
