//! Token lifecycle: retrieval with transparent refresh, code exchange and
//! revocation on top of a [`ports::TokenRepository`].

pub mod manager;
pub mod ports;

pub use manager::AuthManager;
