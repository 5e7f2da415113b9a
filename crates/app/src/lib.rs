//! # SuiteLink Application
//!
//! Wires the SQLite repositories, the token manager and the vendor gateway
//! into one [`AppContext`] and exposes the command handlers the `suitelink`
//! binary dispatches to.

pub mod commands;
pub mod context;

pub use commands::CommandOutput;
pub use context::AppContext;
