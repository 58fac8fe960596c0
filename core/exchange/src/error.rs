use crate::db::DbError;

/// Every operation of the exchange core returns one of these tagged kinds.
/// All of them are recoverable at the caller; the boundary layer maps each
/// kind to a stable status code.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Insufficient quantity: requested {requested}, available {available}")]
    InsufficientQuantity { requested: f64, available: f64 },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("DB connection error: {0}")]
    Db(#[from] r2d2::Error),
    #[error("DAO error: {0}")]
    Dao(#[from] diesel::result::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("task: {0}")]
    RuntimeError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Diesel(e) => Error::from(e),
            DbError::Pool(e) => Error::from(e),
            DbError::RuntimeError(e) => Error::from(e),
        }
    }
}
