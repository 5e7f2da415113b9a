//! Shared test helpers for `suitelink-core` integration tests.
//!
//! In-memory implementations of every core port so service tests can focus
//! on behaviour instead of storage plumbing.

#![allow(dead_code)]

pub mod oauth;
pub mod repositories;
