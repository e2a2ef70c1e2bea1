//! Response decoding: raw text, or JSON into a caller-chosen type.
//!
//! The target type is picked at compile time, so parameterized targets such
//! as `Vec<Widget>` or `HashMap<String, Vec<Widget>>` need nothing beyond the
//! type annotation at the call site.

use serde::de::DeserializeOwned;

use crate::error::{RestError, RestResult};
use crate::http::ResponseOutcome;

/// The body exactly as the server sent it.
pub fn decode_text(outcome: ResponseOutcome) -> String {
    outcome.body
}

/// Deserialize the body as JSON into `T`. On failure the raw body travels
/// with the error.
pub fn decode_json<T: DeserializeOwned>(outcome: ResponseOutcome) -> RestResult<T> {
    serde_json::from_str(&outcome.body).map_err(|source| RestError::Deserialization {
        source,
        body: outcome.body,
    })
}
