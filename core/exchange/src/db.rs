pub mod dao;
pub mod model;
pub mod schema;

pub use scraplink_persistence::executor::Error as DbError;

pub type DbResult<T> = Result<T, DbError>;
