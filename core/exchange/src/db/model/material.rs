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

use crate::db::schema::exchange_material;

/// Listing status is monotonic: it only ever moves away from `Available`,
/// never back automatically.
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
pub enum MaterialStatus {
    Available = 0,
    Reserved = 1,
    /// Remaining quantity reached zero.
    Sold = 2,
}

#[derive(Clone, Debug, Identifiable, Insertable, Queryable, Serialize, Deserialize)]
#[table_name = "exchange_material"]
pub struct Material {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub location: String,
    pub price: f64,
    pub description: String,
    /// JSON array of image URLs.
    pub images: String,
    pub status: MaterialStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewMaterial {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub location: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Field-wise update applied by the listing owner. `None` leaves the stored
/// value untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MaterialPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub status: Option<MaterialStatus>,
}

impl Material {
    pub fn new(new_material: NewMaterial, owner_id: &str) -> Result<Material, serde_json::Error> {
        let now = Utc::now().naive_utc();
        Ok(Material {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: new_material.name,
            category: new_material.category,
            quantity: new_material.quantity,
            unit: new_material.unit,
            location: new_material.location,
            price: new_material.price,
            description: new_material.description,
            images: serde_json::to_string(&new_material.images)?,
            status: MaterialStatus::Available,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn image_urls(&self) -> Vec<String> {
        serde_json::from_str(&self.images).unwrap_or_default()
    }
}

impl<DB: Backend> ToSql<Integer, DB> for MaterialStatus
where
    i32: ToSql<Integer, DB>,
{
    fn to_sql<W: std::io::Write>(&self, out: &mut Output<W, DB>) -> diesel::serialize::Result {
        (*self as i32).to_sql(out)
    }
}

impl<DB> FromSql<Integer, DB> for MaterialStatus
where
    i32: FromSql<Integer, DB>,
    DB: Backend,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> deserialize::Result<Self> {
        let enum_value = i32::from_sql(bytes)?;
        Ok(FromPrimitive::from_i32(enum_value).ok_or(anyhow::anyhow!(
            "Invalid conversion from {} (i32) to MaterialStatus.",
            enum_value
        ))?)
    }
}
