//! Turning payloads into ordered key/value string pairs.
//!
//! Used for the query string of GET requests and for form and multipart
//! fields. Maps and pair lists convert directly. Structs go through their
//! `Serialize` impl and are flattened one level deep, so no per-type code is
//! needed for the common case.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::error::{RestError, RestResult};

/// Ordered key/value pairs. Duplicate keys are allowed and kept.
pub type Params = Vec<(String, String)>;

/// A payload that can be delivered as query or form parameters.
pub trait QueryEncodable {
    fn to_query_params(&self) -> Params;
}

impl<T: QueryEncodable + ?Sized> QueryEncodable for &T {
    fn to_query_params(&self) -> Params {
        (**self).to_query_params()
    }
}

impl QueryEncodable for [(String, String)] {
    fn to_query_params(&self) -> Params {
        self.to_vec()
    }
}

impl QueryEncodable for [(&str, &str)] {
    fn to_query_params(&self) -> Params {
        self.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

impl<const N: usize> QueryEncodable for [(&str, &str); N] {
    fn to_query_params(&self) -> Params {
        self.as_slice().to_query_params()
    }
}

impl QueryEncodable for Vec<(String, String)> {
    fn to_query_params(&self) -> Params {
        self.clone()
    }
}

/// Iteration order of a `HashMap` is unspecified; use `BTreeMap` or a pair
/// list when order matters.
impl<S: std::hash::BuildHasher> QueryEncodable for HashMap<String, String, S> {
    fn to_query_params(&self) -> Params {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl QueryEncodable for BTreeMap<String, String> {
    fn to_query_params(&self) -> Params {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Top-level object fields become pairs; null fields are skipped. Any other
/// value yields no pairs.
impl QueryEncodable for Value {
    fn to_query_params(&self) -> Params {
        match self {
            Value::Object(map) => map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), scalar_text(v)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Strings are used as-is; everything else as its JSON text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten any serializable value through its JSON form.
pub fn query_params_of<T: Serialize + ?Sized>(value: &T) -> RestResult<Params> {
    let value = serde_json::to_value(value)
        .map_err(|e| RestError::encoding("payload is not serializable", e))?;
    Ok(value.to_query_params())
}
