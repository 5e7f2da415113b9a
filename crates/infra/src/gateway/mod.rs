//! HTTP gateway to the vendor sub-services

pub mod api_gateway;
pub mod envelope;

pub use api_gateway::{ApiGateway, GatewayResponse, RequestOptions};
