use diesel::prelude::*;

use scraplink_persistence::executor::{readonly_transaction, AsDao, PoolType};

use crate::db::model::Transaction;
use crate::db::schema::exchange_request::dsl as dsl_request;
use crate::db::schema::exchange_transaction::dsl;
use crate::error::Error;

/// Transactions are created and updated only as side effects of the request
/// lifecycle, so this DAO is read-only.
pub struct TransactionDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for TransactionDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        TransactionDao { pool }
    }
}

impl<'c> TransactionDao<'c> {
    pub async fn get_for_request(&self, request_id: String) -> Result<Option<Transaction>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_transaction
                .filter(dsl::request_id.eq(request_id))
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// All transactions the user takes part in, on either side of the
    /// underlying request.
    pub async fn list_for_user(&self, user_id: String) -> Result<Vec<Transaction>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_transaction
                .inner_join(dsl_request::exchange_request)
                .filter(
                    dsl_request::owner_id
                        .eq(&user_id)
                        .or(dsl_request::requester_id.eq(&user_id)),
                )
                .select(crate::db::schema::exchange_transaction::all_columns)
                .order(dsl::created_at.desc())
                .load(conn)?)
        })
        .await
    }
}
