//! Time abstractions
//!
//! Services that compare timestamps (token expiry, reorder windows) take a
//! [`Clock`] so tests can pin and advance wall time deterministically.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
