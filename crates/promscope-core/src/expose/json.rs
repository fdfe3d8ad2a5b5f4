//! JSON snapshot encoding (array of families, as gathered).

use bytes::Bytes;

use crate::error::{PromscopeError, Result};
use crate::family::MetricFamily;

pub fn encode(families: &[MetricFamily]) -> Result<Bytes> {
    serde_json::to_vec(families)
        .map(Bytes::from)
        .map_err(|e| PromscopeError::Encode(format!("json: {e}")))
}
