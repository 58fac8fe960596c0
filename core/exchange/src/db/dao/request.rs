use chrono::Utc;
use diesel::prelude::*;

use scraplink_persistence::executor::{
    do_with_transaction, readonly_transaction, AsDao, ConnType, PoolType,
};

use crate::auth::{check, Action};
use crate::db::dao::material::{get_material, reserve};
use crate::db::dao::user::get_user;
use crate::db::model::{Request, RequestStatus, Transaction, TransactionStatus};
use crate::db::schema::exchange_request::dsl;
use crate::db::schema::exchange_transaction::dsl as dsl_transaction;
use crate::error::Error;

pub struct RequestDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for RequestDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        RequestDao { pool }
    }
}

fn get_request(conn: &ConnType, request_id: &str) -> Result<Request, Error> {
    dsl::exchange_request
        .find(request_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Request [{}]", request_id)))
}

/// Explains a compare-and-swap transition that matched zero rows. The
/// follow-up read runs in the same transaction as the failed update.
fn classify_failed_transition(
    conn: &ConnType,
    request_id: &str,
    actor_id: &str,
    both_parties: bool,
    expected: RequestStatus,
    to: RequestStatus,
) -> Error {
    let request = match get_request(conn, request_id) {
        Ok(request) => request,
        Err(e) => return e,
    };
    let authorized = if both_parties {
        actor_id == request.owner_id || actor_id == request.requester_id
    } else {
        actor_id == request.owner_id
    };
    if !authorized {
        return Error::Unauthorized(format!("Not a party of Request [{}].", request_id));
    }
    if request.status != expected {
        return Error::InvalidState(format!(
            "Can't update Request [{}] state from {} to {}.",
            request_id, request.status, to
        ));
    }
    // The row still looks eligible, so the swap lost against a concurrent
    // writer whose result this snapshot doesn't see yet.
    Error::Conflict(format!("Request [{}] was modified concurrently.", request_id))
}

impl<'c> RequestDao<'c> {
    pub async fn create(
        &self,
        requester_id: String,
        material_id: String,
        quantity: f64,
        message: String,
    ) -> Result<Request, Error> {
        do_with_transaction(self.pool, move |conn| {
            let requester = get_user(conn, &requester_id)?;
            let material = get_material(conn, &material_id)?;
            check(&requester, Action::CreateRequest(&material))?;

            if quantity <= 0.0 {
                return Err(Error::Validation("Quantity must be greater than 0.".into()));
            }
            // Validated against the current quantity only. Other pending
            // requests for the same material do not reserve anything yet.
            if quantity > material.quantity {
                return Err(Error::InsufficientQuantity {
                    requested: quantity,
                    available: material.quantity,
                });
            }

            let request = Request::new(&material, &requester.id, quantity, message);
            diesel::insert_into(dsl::exchange_request)
                .values(&request)
                .execute(conn)?;
            Ok(request)
        })
        .await
    }

    /// Accept is one atomic unit: the status swap, the quantity reservation
    /// and the Transaction insert either all commit or none do. The swap is
    /// the first statement of the transaction, so concurrent accepts
    /// serialize on the write lock and at most one can see `Pending`.
    pub async fn accept(
        &self,
        actor_id: String,
        request_id: String,
    ) -> Result<(Request, Transaction), Error> {
        do_with_transaction(self.pool, move |conn| {
            let now = Utc::now().naive_utc();
            let num_updated = diesel::update(
                dsl::exchange_request
                    .filter(dsl::id.eq(&request_id))
                    .filter(dsl::owner_id.eq(&actor_id))
                    .filter(dsl::status.eq(RequestStatus::Pending)),
            )
            .set((
                dsl::status.eq(RequestStatus::Accepted),
                dsl::updated_at.eq(now),
            ))
            .execute(conn)?;
            if num_updated == 0 {
                return Err(classify_failed_transition(
                    conn,
                    &request_id,
                    &actor_id,
                    false,
                    RequestStatus::Pending,
                    RequestStatus::Accepted,
                ));
            }

            let request = get_request(conn, &request_id)?;
            let material = reserve(conn, &request.material_id, request.quantity, now)?;

            let transaction = Transaction::new(&request.id, request.quantity * material.price);
            diesel::insert_into(dsl_transaction::exchange_transaction)
                .values(&transaction)
                .execute(conn)?;

            Ok((request, transaction))
        })
        .await
    }

    /// Rejection is terminal. It touches neither the material nor any
    /// transaction; nothing was reserved while the request was pending.
    pub async fn reject(&self, actor_id: String, request_id: String) -> Result<Request, Error> {
        do_with_transaction(self.pool, move |conn| {
            let num_updated = diesel::update(
                dsl::exchange_request
                    .filter(dsl::id.eq(&request_id))
                    .filter(dsl::owner_id.eq(&actor_id))
                    .filter(dsl::status.eq(RequestStatus::Pending)),
            )
            .set((
                dsl::status.eq(RequestStatus::Rejected),
                dsl::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
            if num_updated == 0 {
                return Err(classify_failed_transition(
                    conn,
                    &request_id,
                    &actor_id,
                    false,
                    RequestStatus::Pending,
                    RequestStatus::Rejected,
                ));
            }
            get_request(conn, &request_id)
        })
        .await
    }

    /// Either party settles an accepted request. The associated escrow
    /// Transaction completes in the same atomic unit.
    pub async fn complete(&self, actor_id: String, request_id: String) -> Result<Request, Error> {
        do_with_transaction(self.pool, move |conn| {
            let now = Utc::now().naive_utc();
            let num_updated = diesel::update(
                dsl::exchange_request
                    .filter(dsl::id.eq(&request_id))
                    .filter(
                        dsl::owner_id
                            .eq(&actor_id)
                            .or(dsl::requester_id.eq(&actor_id)),
                    )
                    .filter(dsl::status.eq(RequestStatus::Accepted)),
            )
            .set((
                dsl::status.eq(RequestStatus::Completed),
                dsl::updated_at.eq(now),
            ))
            .execute(conn)?;
            if num_updated == 0 {
                return Err(classify_failed_transition(
                    conn,
                    &request_id,
                    &actor_id,
                    true,
                    RequestStatus::Accepted,
                    RequestStatus::Completed,
                ));
            }

            let num_transactions = diesel::update(
                dsl_transaction::exchange_transaction
                    .filter(dsl_transaction::request_id.eq(&request_id)),
            )
            .set((
                dsl_transaction::status.eq(TransactionStatus::Completed),
                dsl_transaction::completed_at.eq(now),
                dsl_transaction::updated_at.eq(now),
            ))
            .execute(conn)?;
            if num_transactions == 0 {
                // Accept creates the transaction, so an accepted request
                // without one means the store is corrupt.
                return Err(Error::NotFound(format!(
                    "Transaction for Request [{}]",
                    request_id
                )));
            }

            get_request(conn, &request_id)
        })
        .await
    }

    pub async fn get(&self, request_id: String) -> Result<Option<Request>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_request
                .find(request_id)
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn list_for_requester(&self, requester_id: String) -> Result<Vec<Request>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_request
                .filter(dsl::requester_id.eq(requester_id))
                .order(dsl::created_at.desc())
                .load(conn)?)
        })
        .await
    }

    pub async fn list_for_owner(&self, owner_id: String) -> Result<Vec<Request>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_request
                .filter(dsl::owner_id.eq(owner_id))
                .order(dsl::created_at.desc())
                .load(conn)?)
        })
        .await
    }
}
