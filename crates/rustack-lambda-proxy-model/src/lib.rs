//! API Gateway proxy integration wire types.
//!
//! This crate holds the JSON shapes exchanged with the gateway:
//!
//! - [`ProxyRequest`]: the inbound proxy integration event
//! - [`ProxyResponse`]: the document returned to the gateway
//! - [`ParameterMap`]: an order-preserving string map used for headers,
//!   query-string parameters and path parameters
//!
//! The types only describe the wire format. Translation to and from HTTP
//! features lives in `rustack-lambda-proxy`.

pub mod params;
pub mod request;
pub mod response;

pub use params::ParameterMap;
pub use request::{ProxyIdentity, ProxyRequest, ProxyRequestContext};
pub use response::ProxyResponse;
