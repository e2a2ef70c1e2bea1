//! Request payloads and the body encoders that put them on the wire.
//!
//! # Design
//! A `Payload` names both the data and how it should travel. For non-GET
//! verbs `encode_body` picks the matching encoder and yields a `Body`; for GET
//! the request builder asks the payload for its query parameters instead and
//! no encoder runs. Encoders do all fallible work (serialization, reading
//! multipart files) up front, so a `Body` always has a known size and
//! content type by the time it reaches the transport.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::{RestError, RestResult};
use crate::http::{Body, Multipart, Part, APPLICATION_JSON, FORM_URLENCODED, TEXT_PLAIN};
use crate::query::{Params, QueryEncodable};

/// Name given to every file part of a multipart body.
pub const FILE_PART_NAME: &str = "file";

/// How a payload is serialized into a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    None,
    Json,
    Form,
    Multipart,
}

/// Data sent with a call, tagged with its encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    Json(Value),
    Form(Params),
    Multipart { params: Params, files: Vec<PathBuf> },
}

impl Payload {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> RestResult<Self> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(|e| RestError::encoding("payload is not serializable as JSON", e))
    }

    pub fn form(params: &impl QueryEncodable) -> Self {
        Payload::Form(params.to_query_params())
    }

    pub fn multipart<I, P>(params: &impl QueryEncodable, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Payload::Multipart {
            params: params.to_query_params(),
            files: files.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Payload::None => Encoding::None,
            Payload::Json(_) => Encoding::Json,
            Payload::Form(_) => Encoding::Form,
            Payload::Multipart { .. } => Encoding::Multipart,
        }
    }

    /// The payload folded into query parameters, as GET delivers it.
    /// Multipart files have no query form and are left out.
    pub fn query_params(&self) -> Params {
        match self {
            Payload::None => Vec::new(),
            Payload::Json(value) => value.to_query_params(),
            Payload::Form(params) | Payload::Multipart { params, .. } => params.clone(),
        }
    }
}

/// Encode a payload into a request body using the encoder its variant names.
pub fn encode_body(payload: &Payload) -> RestResult<Body> {
    match payload {
        Payload::None => Ok(encode_empty()),
        Payload::Json(value) => encode_json(value),
        Payload::Form(params) => Ok(encode_form(params)),
        Payload::Multipart { params, files } => encode_multipart(params, files),
    }
}

pub fn encode_empty() -> Body {
    Body::Empty
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> RestResult<Body> {
    serde_json::to_vec(value)
        .map(Body::Json)
        .map_err(|e| RestError::encoding("payload is not serializable as JSON", e))
}

pub fn encode_form(params: &Params) -> Body {
    Body::Form(params.clone())
}

/// File parts first, one per file, then one text part per parameter.
pub fn encode_multipart<P: AsRef<Path>>(params: &Params, files: &[P]) -> RestResult<Body> {
    let mut parts = Vec::with_capacity(files.len() + params.len());
    for path in files {
        parts.push(file_part(path.as_ref())?);
    }
    parts.extend(params.iter().map(|(name, value)| Part {
        name: name.clone(),
        filename: None,
        content_type: None,
        data: value.as_bytes().to_vec(),
    }));

    Ok(Body::Multipart(Multipart {
        boundary: Uuid::new_v4().simple().to_string(),
        parts,
    }))
}

fn file_part(path: &Path) -> RestResult<Part> {
    let data = fs::read(path)
        .map_err(|e| RestError::encoding(format!("cannot read file {}", path.display()), e))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Part {
        name: FILE_PART_NAME.to_string(),
        filename: Some(filename),
        // Files are not sniffed.
        content_type: Some(TEXT_PLAIN.to_string()),
        data,
    })
}

impl Body {
    pub fn content_type(&self) -> String {
        match self {
            Body::Empty | Body::Json(_) => APPLICATION_JSON.to_string(),
            Body::Form(_) => FORM_URLENCODED.to_string(),
            Body::Multipart(m) => format!("multipart/form-data; boundary={}", m.boundary),
        }
    }

    /// Wire bytes of the body.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Empty => Vec::new(),
            Body::Json(bytes) => bytes.clone(),
            Body::Form(params) => form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params)
                .finish()
                .into_bytes(),
            Body::Multipart(m) => m.to_bytes(),
        }
    }
}

impl Multipart {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", quote(&part.name));
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", quote(filename)));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

fn quote(s: &str) -> String {
    s.replace('\n', "%0A").replace('\r', "%0D").replace('"', "%22")
}
