pub mod material;
pub mod request;
pub mod transaction;
pub mod user;

pub use material::MaterialDao;
pub use request::RequestDao;
pub use transaction::TransactionDao;
pub use user::UserDao;
