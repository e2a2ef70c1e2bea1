//! Stateless request construction.
//!
//! # Design
//! `build_request` turns (method, path, payload) into a `RequestSpec` without
//! touching the network. GET never carries a body: whatever the payload is,
//! its parameters go into the query string. Every other verb always carries
//! a body, empty when there is no payload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::Endpoint;
use crate::encoding::{encode_body, Payload};
use crate::error::RestResult;
use crate::http::{Method, RequestSpec};
use crate::query::Params;

/// Everything but RFC 3986 unreserved characters is escaped, so a space
/// becomes `%20` and a literal `+` survives as `%2B`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Build the request for one call against `endpoint`.
pub fn build_request(
    endpoint: &Endpoint,
    method: Method,
    path: &str,
    payload: &Payload,
) -> RestResult<RequestSpec> {
    let mut headers = Vec::new();
    if let Some(creds) = endpoint.credentials() {
        let token = STANDARD.encode(format!("{}:{}", creds.username, creds.password));
        headers.push(("Authorization".to_string(), format!("Basic {token}")));
    }

    let (query, body) = match method {
        Method::Get => (payload.query_params(), None),
        Method::Post | Method::Put | Method::Delete => {
            let body = encode_body(payload)?;
            headers.push(("Content-Type".to_string(), body.content_type()));
            (Vec::new(), Some(body))
        }
    };

    let url = compose_url(&endpoint.url(), path, &query);
    tracing::debug!(%method, %url, encoding = ?payload.encoding(), "built request");

    Ok(RequestSpec {
        method,
        url,
        query,
        headers,
        body,
    })
}

/// Base URL + path, then the query string when there are parameters. A path
/// that already has a query gets the new pairs appended with `&`.
pub fn compose_url(base_url: &str, path: &str, query: &Params) -> String {
    let mut url = format!("{base_url}{path}");
    if query.is_empty() {
        return url;
    }
    url.push(if path.contains('?') { '&' } else { '?' });
    for (i, (name, value)) in query.iter().enumerate() {
        if i > 0 {
            url.push('&');
        }
        url.extend(utf8_percent_encode(name, QUERY_COMPONENT));
        url.push('=');
        url.extend(utf8_percent_encode(value, QUERY_COMPONENT));
    }
    url
}
