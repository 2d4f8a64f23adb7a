//! JSON and binary encoding of requests and responses.
//!
//! Binary output uses `bincode` and is write-only: the tagged enums in the
//! response cannot be read back by a non-self-describing format.

use std::fs;
use std::path::Path;

use osteon_types::{OsteonError, OsteonResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::contract::{AnalysisRequest, AnalysisResponse};

/// Pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> OsteonResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| OsteonError::Serialization(e.to_string()))
}

pub fn from_json<T: DeserializeOwned>(text: &str) -> OsteonResult<T> {
    serde_json::from_str(text).map_err(|e| OsteonError::Serialization(e.to_string()))
}

/// Compact binary form.
pub fn to_binary<T: Serialize>(value: &T) -> OsteonResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| OsteonError::Serialization(e.to_string()))
}

/// Reads a JSON request from disk.
pub fn read_request(path: &Path) -> OsteonResult<AnalysisRequest> {
    let text = fs::read_to_string(path)?;
    let request: AnalysisRequest = from_json(&text)?;
    debug!(path = %path.display(), regions = request.regions.len(), "request loaded");
    Ok(request)
}

/// Writes a response as JSON, or bincode when `binary` is set.
pub fn write_response(path: &Path, response: &AnalysisResponse, binary: bool) -> OsteonResult<()> {
    let bytes = if binary { to_binary(response)? } else { to_json(response)?.into_bytes() };
    fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), binary, "response written");
    Ok(())
}
