//! Reorder-level batch job

pub mod calculator;
pub mod engine;
pub mod ports;

pub use engine::ReorderLevelEngine;
