//! HTTP request and response described as plain data.
//!
//! # Design
//! `RequestSpec` is the fully-built, transport-independent description of one
//! call: the request builder produces it without touching the network, and a
//! `Transport` consumes it. `ResponseOutcome` flows the other way and is
//! handed straight to the decoder. Neither outlives the call that made it.

use std::fmt;
use std::str::FromStr;

use crate::error::RestError;
use crate::query::Params;

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const TEXT_PLAIN: &str = "text/plain";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; anything but the four supported verbs is rejected.
impl FromStr for Method {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(RestError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A `multipart/form-data` body with its boundary fixed at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    pub boundary: String,
    pub parts: Vec<Part>,
}

/// Request body, already encoded from the caller's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Zero-length body, still labelled `application/json`.
    Empty,
    Json(Vec<u8>),
    Form(Params),
    Multipart(Multipart),
}

/// A request ready for dispatch.
///
/// `url` already carries the query string. `body` is `None` only for GET;
/// every other verb gets at least `Body::Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub query: Params,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl RequestSpec {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What came back from the server, body read in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub status: u16,
    pub body: String,
}

impl ResponseOutcome {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx or 3xx.
    pub fn is_success_or_redirect(&self) -> bool {
        (200..400).contains(&self.status)
    }
}
