use chrono::Utc;
use diesel::prelude::*;

use scraplink_persistence::executor::{
    do_with_transaction, readonly_transaction, AsDao, ConnType, PoolType,
};

use crate::db::model::{NewUser, User};
use crate::db::schema::exchange_user::dsl;
use crate::error::Error;

pub struct UserDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for UserDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        UserDao { pool }
    }
}

pub(super) fn get_user(conn: &ConnType, user_id: &str) -> Result<User, Error> {
    dsl::exchange_user
        .find(user_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("User [{}]", user_id)))
}

impl<'c> UserDao<'c> {
    pub async fn create(&self, new_user: NewUser) -> Result<User, Error> {
        let user = User::new(new_user);
        do_with_transaction(self.pool, move |conn| {
            diesel::insert_into(dsl::exchange_user)
                .values(&user)
                .execute(conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => Error::Validation(format!("Email [{}] already registered.", user.email)),
                    e => e.into(),
                })?;
            Ok(user)
        })
        .await
    }

    pub async fn get(&self, user_id: String) -> Result<Option<User>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_user.find(user_id).first(conn).optional()?)
        })
        .await
    }

    pub async fn list(&self) -> Result<Vec<User>, Error> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::exchange_user
                .order(dsl::created_at.desc())
                .load(conn)?)
        })
        .await
    }

    pub async fn set_active(&self, user_id: String, active: bool) -> Result<User, Error> {
        do_with_transaction(self.pool, move |conn| {
            let num_updated = diesel::update(dsl::exchange_user.find(&user_id))
                .set((
                    dsl::is_active.eq(active),
                    dsl::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            if num_updated == 0 {
                return Err(Error::NotFound(format!("User [{}]", user_id)));
            }
            get_user(conn, &user_id)
        })
        .await
    }

    pub async fn set_verified(&self, user_id: String, verified: bool) -> Result<User, Error> {
        do_with_transaction(self.pool, move |conn| {
            let num_updated = diesel::update(dsl::exchange_user.find(&user_id))
                .set((
                    dsl::is_verified.eq(verified),
                    dsl::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            if num_updated == 0 {
                return Err(Error::NotFound(format!("User [{}]", user_id)));
            }
            get_user(conn, &user_id)
        })
        .await
    }
}
