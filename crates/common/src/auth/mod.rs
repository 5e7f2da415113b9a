//! OAuth 2.0 token endpoint support
//!
//! The vendor issues one access/refresh pair that is valid across all of its
//! sub-services. This module talks to the vendor's accounts server directly;
//! it never goes through the rate-limited API gateway, which itself depends on
//! a valid access token.

pub mod client;
pub mod traits;
pub mod types;

pub use client::{OAuthClient, OAuthClientError};
pub use traits::OAuthClientTrait;
pub use types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};
