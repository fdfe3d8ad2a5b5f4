//! Exposition encoders.
//!
//! The whole body is rendered into a buffer before anything is returned, so
//! callers never hold a half-written response.

pub mod json;
pub mod text;

use bytes::Bytes;

use crate::error::Result;
use crate::family::MetricFamily;

/// Prometheus text format content type.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
/// JSON snapshot content type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Negotiated exposition format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
}

impl Format {
    /// Pick a format from an `Accept` header value; text unless JSON is
    /// explicitly requested. Media ranges with `q=0` are refused by the
    /// client and ignored.
    pub fn negotiate(accept: Option<&str>) -> Self {
        let Some(accept) = accept else {
            return Format::Text;
        };
        let wants_json = accept.split(',').any(|part| {
            let mut params = part.split(';');
            let media = params.next().unwrap_or("").trim();
            media.eq_ignore_ascii_case(JSON_CONTENT_TYPE) && !params.any(is_zero_quality)
        });
        if wants_json {
            Format::Json
        } else {
            Format::Text
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Text => TEXT_CONTENT_TYPE,
            Format::Json => JSON_CONTENT_TYPE,
        }
    }
}

fn is_zero_quality(param: &str) -> bool {
    let Some((k, v)) = param.split_once('=') else {
        return false;
    };
    k.trim().eq_ignore_ascii_case("q") && v.trim().parse::<f64>().map_or(false, |q| q <= 0.0)
}

/// Encode a snapshot in the given format.
pub fn encode(families: &[MetricFamily], format: Format) -> Result<Bytes> {
    match format {
        Format::Text => text::encode(families),
        Format::Json => json::encode(families),
    }
}
