//! Generic, synchronous REST client.
//!
//! # Overview
//! Issues GET/POST/PUT/DELETE calls against one configured endpoint, encoding
//! the payload as nothing, JSON, a URL-encoded form or multipart form data,
//! and returning the body either as raw text or deserialized into any
//! `DeserializeOwned` type the caller names.
//!
//! # Design
//! - `request::build_request` is pure: (method, path, payload) in,
//!   `RequestSpec` out. GET folds the payload into the query string; every
//!   other verb always carries a body.
//! - `encoding` holds the body encoders; `query` the payload-to-parameter
//!   flattening they and GET share.
//! - `transport::Transport` is the only I/O seam. `UreqTransport` is the
//!   pooled, timeout-aware default.
//! - `decode` turns the body into text or a typed value; generic targets
//!   like `Vec<T>` are resolved at compile time.
//! - `RestClient` strings these together, one blocking call at a time.

pub mod client;
pub mod config;
pub mod decode;
pub mod encoding;
pub mod error;
pub mod http;
pub mod query;
pub mod request;
pub mod transport;

pub use client::{Call, RestClient, RestClientBuilder};
pub use config::{ClientConfig, Credentials, Endpoint, EndpointBuilder, PoolOptions, Protocol, Proxy, Timeouts};
pub use encoding::{Encoding, Payload};
pub use error::{RestError, RestResult};
pub use http::{Body, Method, Multipart, Part, RequestSpec, ResponseOutcome};
pub use query::{query_params_of, Params, QueryEncodable};
pub use transport::{Transport, UreqTransport};
