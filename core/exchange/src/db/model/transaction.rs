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

use crate::db::schema::exchange_transaction;

pub const PAYMENT_METHOD_ESCROW: &str = "escrow";

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
pub enum TransactionStatus {
    /// Funds notionally held in escrow until the request completes.
    Pending = 0,
    Completed = 1,
    Failed = 2,
    Refunded = 3,
}

#[derive(Clone, Debug, Identifiable, Insertable, Queryable, Serialize, Deserialize)]
#[table_name = "exchange_transaction"]
pub struct Transaction {
    pub id: String,
    /// At most one Transaction per Request, enforced by a unique index.
    pub request_id: String,
    /// request.quantity * material.price at acceptance time. Frozen.
    pub amount: f64,
    pub status: TransactionStatus,
    pub payment_method: String,
    pub transaction_reference: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Transaction {
    pub fn new(request_id: &str, amount: f64) -> Transaction {
        let now = Utc::now().naive_utc();
        Transaction {
            id: Uuid::new_v4().to_string(),
            request_id: request_id.to_string(),
            amount,
            status: TransactionStatus::Pending,
            payment_method: PAYMENT_METHOD_ESCROW.to_string(),
            transaction_reference: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

impl<DB: Backend> ToSql<Integer, DB> for TransactionStatus
where
    i32: ToSql<Integer, DB>,
{
    fn to_sql<W: std::io::Write>(&self, out: &mut Output<W, DB>) -> diesel::serialize::Result {
        (*self as i32).to_sql(out)
    }
}

impl<DB> FromSql<Integer, DB> for TransactionStatus
where
    i32: FromSql<Integer, DB>,
    DB: Backend,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> deserialize::Result<Self> {
        let enum_value = i32::from_sql(bytes)?;
        Ok(FromPrimitive::from_i32(enum_value).ok_or(anyhow::anyhow!(
            "Invalid conversion from {} (i32) to TransactionStatus.",
            enum_value
        ))?)
    }
}
