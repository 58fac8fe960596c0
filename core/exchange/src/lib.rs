//! Material exchange core: the request lifecycle and transaction settlement
//! engine connecting industry listings with artisan requests.
//!
//! HTTP framing, authentication and search live outside this crate; every
//! operation takes a verified user id and returns a tagged [`error::Error`].

#[macro_use]
extern crate diesel;

pub mod auth;
pub mod db;
pub mod error;
pub mod processor;

pub mod migrations {
    #[derive(diesel_migrations::EmbedMigrations)]
    struct _Dummy;
}

pub use error::Error;
pub use processor::ExchangeProcessor;
