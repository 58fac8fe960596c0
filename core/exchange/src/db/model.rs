mod material;
mod request;
mod transaction;
mod user;

pub use material::{Material, MaterialPatch, MaterialStatus, NewMaterial};
pub use request::{Request, RequestStatus};
pub use transaction::{Transaction, TransactionStatus, PAYMENT_METHOD_ESCROW};
pub use user::{NewUser, Role, User};
