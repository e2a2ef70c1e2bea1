//! Executing a built request over the network.
//!
//! # Design
//! `Transport` is the only place the crate does I/O. Everything before it
//! (building, encoding) and after it (status check, decoding) is pure, so the
//! facade can be tested against a recording fake. `UreqTransport` is the
//! production implementation: a blocking `ureq::Agent` whose connection pool
//! is shared by every call made through it, from any thread.

use std::time::Instant;

use ureq::{Agent, ProxyProtocol, RequestBuilder};

use crate::config::{ClientConfig, Proxy};
use crate::error::RestResult;
use crate::http::{Method, RequestSpec, ResponseOutcome};

/// Executes one request, exactly once, and reads the whole body.
///
/// Implementations return non-2xx statuses as data; classifying them is the
/// caller's job.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &RequestSpec) -> RestResult<ResponseOutcome>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &RequestSpec) -> RestResult<ResponseOutcome> {
        (**self).execute(request)
    }
}

/// Pooled blocking transport backed by `ureq`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Build the agent from the client configuration.
    ///
    /// Read timeouts cover waiting for the response head and body, write
    /// timeouts cover sending the request head and body. The pool keeps at
    /// most `max_connections` idle connections for `keep_alive` each.
    /// `retry_count` is not used. Response bodies are read whole, with no
    /// size limit.
    pub fn new(config: &ClientConfig) -> RestResult<Self> {
        let timeouts = &config.timeouts;
        let pool = &config.pool;

        let proxy = config.proxy.as_ref().map(ureq_proxy).transpose()?;

        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(timeouts.connect))
            .timeout_send_request(Some(timeouts.write))
            .timeout_send_body(Some(timeouts.write))
            .timeout_recv_response(Some(timeouts.read))
            .timeout_recv_body(Some(timeouts.read))
            .max_idle_connections(pool.max_connections)
            .max_idle_connections_per_host(pool.max_connections)
            .max_idle_age(pool.keep_alive)
            .proxy(proxy)
            .build()
            .new_agent();

        tracing::debug!(
            endpoint = %config.endpoint.url(),
            max_connections = pool.max_connections,
            keep_alive_ms = pool.keep_alive.as_millis() as u64,
            proxy = config.proxy.is_some(),
            "created ureq transport"
        );

        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &RequestSpec) -> RestResult<ResponseOutcome> {
        let start = Instant::now();
        let url = request.url.as_str();
        let bytes = request.body.as_ref().map(|b| b.to_bytes()).unwrap_or_default();
        let headers = &request.headers;

        let result = match request.method {
            Method::Get => with_headers(self.agent.get(url), headers).call(),
            Method::Post => with_headers(self.agent.post(url), headers).send(&bytes[..]),
            Method::Put => with_headers(self.agent.put(url), headers).send(&bytes[..]),
            Method::Delete => with_headers(self.agent.delete(url), headers)
                .force_send_body()
                .send(&bytes[..]),
        };

        let mut response = result.inspect_err(|e| {
            tracing::debug!(method = %request.method, url, error = %e, "transport failure");
        })?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()?;

        tracing::debug!(
            method = %request.method,
            url,
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "response received"
        );

        Ok(ResponseOutcome { status, body })
    }
}

/// Credentials are handed over verbatim; they never pass through a URI.
fn ureq_proxy(proxy: &Proxy) -> RestResult<ureq::Proxy> {
    let mut builder = ureq::Proxy::builder(ProxyProtocol::Http)
        .host(&proxy.host)
        .port(proxy.port);
    if let Some(username) = &proxy.username {
        builder = builder
            .username(username)
            .password(proxy.password.as_deref().unwrap_or(""));
    }
    Ok(builder.build()?)
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
