//! API Gateway proxy integration adapter.
//!
//! Translates a proxy integration event into generic HTTP request features,
//! runs a [`ProxyProcessor`] against them and translates the response
//! features back into the gateway's response document.
//!
//! ```text
//! ProxyRequest ──► RequestMarshaller ──► HttpRequestFeatures
//!                                              │
//!                                      ProxyProcessor::process
//!                                              │
//! ProxyResponse ◄── ResponseMarshaller ◄── HttpResponseFeatures
//! ```
//!
//! - **Encoding**: content-type driven choice between text and Base64 bodies
//! - **Request / Response**: the two marshalling directions
//! - **Dispatch**: one invocation end to end, with failure containment and
//!   guaranteed context teardown
//! - **Pipeline**: runs any hyper `Service` as the processor

pub mod config;
pub mod context;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod features;
pub mod outcome;
pub mod pipeline;
pub mod request;
pub mod response;

pub use config::ProxyConfig;
pub use context::{InvocationContext, LambdaContext};
pub use dispatch::{InvocationDispatcher, ProxyProcessor};
pub use encoding::{EncodingPolicy, ResponseContentEncoding};
pub use error::{BoxError, DispatchError, ProcessorError, RequestError};
pub use features::{HeaderDictionary, HttpRequestFeatures, HttpResponseFeatures};
pub use outcome::InvocationOutcome;
pub use pipeline::ServiceProcessor;
pub use request::RequestMarshaller;
pub use response::ResponseMarshaller;

pub use rustack_lambda_proxy_model as model;
