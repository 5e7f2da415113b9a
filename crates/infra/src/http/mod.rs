//! Vendor HTTP transport

pub mod client;

pub use client::HttpClient;
