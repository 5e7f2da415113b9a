//! Entity mirroring from the vendor API into the local store

pub mod ports;
pub mod service;

pub use service::{EntitySyncService, NESTED_LINE_ITEMS};
