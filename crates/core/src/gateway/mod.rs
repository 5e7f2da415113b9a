//! Gateway-facing abstractions owned by the core
//!
//! The HTTP gateway itself lives in the infrastructure layer; the core only
//! defines the token cache it owns and the read port other services consume.

pub mod cache;
pub mod ports;
