use metrics::counter;

use scraplink_persistence::executor::DbExecutor;

use crate::auth::{check, Action};
use crate::db::dao::{MaterialDao, RequestDao, TransactionDao, UserDao};
use crate::db::model::{
    Material, MaterialPatch, NewMaterial, NewUser, Request, Transaction, User,
};
use crate::error::Error;

/// Entry point for every exchange operation. The caller's identity is passed
/// explicitly to each mutating call; there is no ambient current user.
#[derive(Clone)]
pub struct ExchangeProcessor {
    db: DbExecutor,
}

impl ExchangeProcessor {
    pub fn new(db: DbExecutor) -> Self {
        counter!("exchange.materials.created", 0);
        counter!("exchange.requests.created", 0);
        counter!("exchange.requests.accepted", 0);
        counter!("exchange.requests.rejected", 0);
        counter!("exchange.requests.completed", 0);
        ExchangeProcessor { db }
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        if new_user.email.trim().is_empty() {
            return Err(Error::Validation("email is required".into()));
        }
        if new_user.name.trim().is_empty() {
            return Err(Error::Validation("name is required".into()));
        }
        self.db.as_dao::<UserDao>().create(new_user).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, Error> {
        self.db.as_dao::<UserDao>().get(user_id.to_string()).await
    }

    pub async fn list_users(&self, actor_id: &str) -> Result<Vec<User>, Error> {
        let actor = self.require_user(actor_id).await?;
        check(&actor, Action::ListUsers)?;
        self.db.as_dao::<UserDao>().list().await
    }

    pub async fn set_user_active(
        &self,
        actor_id: &str,
        user_id: &str,
        active: bool,
    ) -> Result<User, Error> {
        let actor = self.require_user(actor_id).await?;
        let user = self.require_user(user_id).await?;
        check(&actor, Action::SetUserActive(&user))?;

        log::info!(
            "Admin [{}] sets User [{}] active = {}.",
            actor.id,
            user.id,
            active
        );
        self.db
            .as_dao::<UserDao>()
            .set_active(user_id.to_string(), active)
            .await
    }

    pub async fn set_user_verified(
        &self,
        actor_id: &str,
        user_id: &str,
        verified: bool,
    ) -> Result<User, Error> {
        let actor = self.require_user(actor_id).await?;
        let user = self.require_user(user_id).await?;
        check(&actor, Action::SetUserVerified(&user))?;

        log::info!(
            "Admin [{}] sets User [{}] verified = {}.",
            actor.id,
            user.id,
            verified
        );
        self.db
            .as_dao::<UserDao>()
            .set_verified(user_id.to_string(), verified)
            .await
    }

    // ---------------------------------------------------------------------
    // Materials
    // ---------------------------------------------------------------------

    pub async fn create_material(
        &self,
        owner_id: &str,
        new_material: NewMaterial,
    ) -> Result<Material, Error> {
        for (field, value) in [
            ("name", &new_material.name),
            ("category", &new_material.category),
            ("unit", &new_material.unit),
            ("location", &new_material.location),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{} is required", field)));
            }
        }
        if new_material.quantity < 0.0 {
            return Err(Error::Validation("Quantity can't be negative.".into()));
        }
        if new_material.price < 0.0 {
            return Err(Error::Validation("Price can't be negative.".into()));
        }

        let material = self
            .db
            .as_dao::<MaterialDao>()
            .create(owner_id.to_string(), new_material)
            .await?;
        counter!("exchange.materials.created", 1);
        log::info!("Material [{}] listed by [{}].", material.id, material.owner_id);
        Ok(material)
    }

    pub async fn update_material(
        &self,
        actor_id: &str,
        material_id: &str,
        patch: MaterialPatch,
    ) -> Result<Material, Error> {
        self.db
            .as_dao::<MaterialDao>()
            .update(actor_id.to_string(), material_id.to_string(), patch)
            .await
    }

    pub async fn delete_material(&self, actor_id: &str, material_id: &str) -> Result<(), Error> {
        self.db
            .as_dao::<MaterialDao>()
            .delete(actor_id.to_string(), material_id.to_string())
            .await
    }

    pub async fn get_material(&self, material_id: &str) -> Result<Option<Material>, Error> {
        self.db
            .as_dao::<MaterialDao>()
            .get(material_id.to_string())
            .await
    }

    pub async fn list_materials_for_owner(&self, owner_id: &str) -> Result<Vec<Material>, Error> {
        self.db
            .as_dao::<MaterialDao>()
            .list_for_owner(owner_id.to_string())
            .await
    }

    pub async fn list_available_materials(&self) -> Result<Vec<Material>, Error> {
        self.db.as_dao::<MaterialDao>().list_available().await
    }

    // ---------------------------------------------------------------------
    // Request lifecycle
    // ---------------------------------------------------------------------

    pub async fn create_request(
        &self,
        requester_id: &str,
        material_id: &str,
        quantity: f64,
        message: impl Into<String>,
    ) -> Result<Request, Error> {
        let request = self
            .db
            .as_dao::<RequestDao>()
            .create(
                requester_id.to_string(),
                material_id.to_string(),
                quantity,
                message.into(),
            )
            .await?;
        counter!("exchange.requests.created", 1);
        log::info!(
            "Request [{}] created by [{}] for {} of Material [{}].",
            request.id,
            request.requester_id,
            request.quantity,
            request.material_id
        );
        Ok(request)
    }

    pub async fn accept_request(
        &self,
        actor_id: &str,
        request_id: &str,
    ) -> Result<(Request, Transaction), Error> {
        let (request, transaction) = self
            .db
            .as_dao::<RequestDao>()
            .accept(actor_id.to_string(), request_id.to_string())
            .await?;
        counter!("exchange.requests.accepted", 1);
        log::info!(
            "Request [{}] accepted; Transaction [{}] holds {} in escrow.",
            request.id,
            transaction.id,
            transaction.amount
        );
        Ok((request, transaction))
    }

    pub async fn reject_request(&self, actor_id: &str, request_id: &str) -> Result<Request, Error> {
        let request = self
            .db
            .as_dao::<RequestDao>()
            .reject(actor_id.to_string(), request_id.to_string())
            .await?;
        counter!("exchange.requests.rejected", 1);
        log::info!("Request [{}] rejected.", request.id);
        Ok(request)
    }

    pub async fn complete_request(
        &self,
        actor_id: &str,
        request_id: &str,
    ) -> Result<Request, Error> {
        let request = self
            .db
            .as_dao::<RequestDao>()
            .complete(actor_id.to_string(), request_id.to_string())
            .await?;
        counter!("exchange.requests.completed", 1);
        log::info!("Request [{}] completed by [{}].", request.id, actor_id);
        Ok(request)
    }

    pub async fn get_request(&self, request_id: &str) -> Result<Option<Request>, Error> {
        self.db
            .as_dao::<RequestDao>()
            .get(request_id.to_string())
            .await
    }

    pub async fn list_requests_sent(&self, requester_id: &str) -> Result<Vec<Request>, Error> {
        self.db
            .as_dao::<RequestDao>()
            .list_for_requester(requester_id.to_string())
            .await
    }

    pub async fn list_requests_received(&self, owner_id: &str) -> Result<Vec<Request>, Error> {
        self.db
            .as_dao::<RequestDao>()
            .list_for_owner(owner_id.to_string())
            .await
    }

    // ---------------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------------

    pub async fn get_transaction_for_request(
        &self,
        request_id: &str,
    ) -> Result<Option<Transaction>, Error> {
        self.db
            .as_dao::<TransactionDao>()
            .get_for_request(request_id.to_string())
            .await
    }

    pub async fn list_transactions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Transaction>, Error> {
        self.db
            .as_dao::<TransactionDao>()
            .list_for_user(user_id.to_string())
            .await
    }

    async fn require_user(&self, user_id: &str) -> Result<User, Error> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User [{}]", user_id)))
    }
}
