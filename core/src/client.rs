//! The generic REST client facade.
//!
//! # Design
//! `RestClient` holds only its frozen configuration and a `Transport`. Each
//! call is a one-shot cycle run on the caller's thread: build the request,
//! dispatch it once, check the status, decode the body. Build and decode are
//! pure; only the transport touches the network, so a client can be pointed
//! at a fake transport in tests.
//!
//! Every verb is available with four payload flavors (none, JSON, form,
//! multipart) and two result flavors (raw text, typed), either through the
//! string-verb `call`/`call_as` pair or the fluent `get`/`post`/`put`/`delete`
//! calls.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ClientConfig, Endpoint, EndpointBuilder, PoolOptions, Protocol, Proxy, Timeouts};
use crate::decode::{decode_json, decode_text};
use crate::encoding::Payload;
use crate::error::{RestError, RestResult};
use crate::http::{Method, RequestSpec, ResponseOutcome};
use crate::query::QueryEncodable;
use crate::request::build_request;
use crate::transport::{Transport, UreqTransport};

/// Synchronous REST client for one endpoint.
///
/// Safe to share between threads; concurrent calls share the transport's
/// connection pool and nothing else.
#[derive(Debug, Clone)]
pub struct RestClient<T: Transport = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl RestClient<UreqTransport> {
    /// Create a client backed by a pooled `ureq` transport.
    pub fn new(config: ClientConfig) -> RestResult<Self> {
        let transport = UreqTransport::new(&config)?;
        Ok(Self { config, transport })
    }

    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::default()
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// Build the request a call would send, without sending it.
    pub fn build_request(&self, method: Method, path: &str, payload: &Payload) -> RestResult<RequestSpec> {
        build_request(&self.config.endpoint, method, path, payload)
    }

    /// Build, dispatch and status-check one call.
    pub fn execute(&self, method: Method, path: &str, payload: &Payload) -> RestResult<ResponseOutcome> {
        let request = self.build_request(method, path, payload)?;
        let outcome = self.transport.execute(&request)?;
        check_status(outcome)
    }

    /// Call with a verb given as a string; the body comes back verbatim.
    pub fn call(&self, method: &str, path: &str, payload: &Payload) -> RestResult<String> {
        let method: Method = method.parse()?;
        self.execute(method, path, payload).map(decode_text)
    }

    /// Call with a verb given as a string and decode the JSON body into `R`.
    pub fn call_as<R: DeserializeOwned>(&self, method: &str, path: &str, payload: &Payload) -> RestResult<R> {
        let method: Method = method.parse()?;
        self.execute(method, path, payload).and_then(decode_json)
    }

    pub fn request(&self, method: Method, path: impl Into<String>) -> Call<'_, T> {
        Call {
            client: self,
            method,
            path: path.into(),
            payload: Ok(Payload::None),
        }
    }

    pub fn get(&self, path: impl Into<String>) -> Call<'_, T> {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: impl Into<String>) -> Call<'_, T> {
        self.request(Method::Post, path)
    }

    pub fn put(&self, path: impl Into<String>) -> Call<'_, T> {
        self.request(Method::Put, path)
    }

    pub fn delete(&self, path: impl Into<String>) -> Call<'_, T> {
        self.request(Method::Delete, path)
    }
}

/// 2xx and 3xx pass; anything else becomes `UnsuccessfulResponse` with the
/// body the server sent.
fn check_status(outcome: ResponseOutcome) -> RestResult<ResponseOutcome> {
    if outcome.is_success_or_redirect() {
        return Ok(outcome);
    }
    tracing::warn!(status = outcome.status, "response is not successful");
    Err(RestError::UnsuccessfulResponse {
        status: outcome.status,
        body: outcome.body,
    })
}

/// One pending call: verb and path fixed, payload optional.
///
/// A JSON serialization failure is held until `send`/`send_as`/`build`, so
/// payload setters can be chained without `?`.
#[derive(Debug)]
#[must_use = "a call does nothing until it is sent"]
pub struct Call<'c, T: Transport> {
    client: &'c RestClient<T>,
    method: Method,
    path: String,
    payload: RestResult<Payload>,
}

impl<T: Transport> Call<'_, T> {
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Ok(payload);
        self
    }

    pub fn json<S: Serialize + ?Sized>(mut self, value: &S) -> Self {
        self.payload = Payload::json(value);
        self
    }

    pub fn form(mut self, params: &impl QueryEncodable) -> Self {
        self.payload = Ok(Payload::form(params));
        self
    }

    pub fn multipart<I, P>(mut self, params: &impl QueryEncodable, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.payload = Ok(Payload::multipart(params, files));
        self
    }

    pub fn build(self) -> RestResult<RequestSpec> {
        let payload = self.payload?;
        self.client.build_request(self.method, &self.path, &payload)
    }

    /// Send and return the raw body.
    pub fn send(self) -> RestResult<String> {
        let payload = self.payload?;
        self.client.execute(self.method, &self.path, &payload).map(decode_text)
    }

    /// Send and decode the JSON body into `R`.
    pub fn send_as<R: DeserializeOwned>(self) -> RestResult<R> {
        let payload = self.payload?;
        self.client.execute(self.method, &self.path, &payload).and_then(decode_json)
    }
}

/// Fluent builder collecting endpoint, timeout, pool and proxy options.
#[derive(Debug, Clone, Default)]
pub struct RestClientBuilder {
    endpoint: EndpointBuilder,
    timeouts: Timeouts,
    pool: PoolOptions,
    proxy: Option<Proxy>,
}

impl RestClientBuilder {
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.endpoint = self.endpoint.protocol(protocol);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.host(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.endpoint = self.endpoint.port(port);
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.base_path(base_path);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.username(username);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.endpoint = self.endpoint.password(password);
        self
    }

    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts = self.timeouts.read(timeout);
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts = self.timeouts.write(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts = self.timeouts.connect(timeout);
        self
    }

    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn max_connection_count(mut self, max: usize) -> Self {
        self.pool = self.pool.max_connections(max);
        self
    }

    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.pool = self.pool.keep_alive(keep_alive);
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.pool = self.pool.retry_count(retry_count);
        self
    }

    pub fn config(self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.build(),
            timeouts: self.timeouts,
            pool: self.pool,
            proxy: self.proxy,
        }
    }

    pub fn build(self) -> RestResult<RestClient> {
        RestClient::new(self.config())
    }
}
