//! Resilience patterns for outbound traffic
//!
//! The vendor enforces a strict request-rate ceiling shared by all of its
//! sub-services, so every outbound call passes through one process-wide
//! [`RateLimiter`].

pub mod rate_limiter;

pub use rate_limiter::{RateLimiter, RateLimiterConfig, RateLimiterConfigBuilder};
