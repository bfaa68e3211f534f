//! Request handlers, grouped by table shape.

pub mod directory;
pub mod link;
pub mod record;

use crate::error::AppError;
use crate::tables::MAX_ID;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

/// Parse a path segment as a surrogate key: a non-negative integer within the
/// declared id range. Failure carries the literal segment.
pub fn parse_id(segment: &str) -> Result<i64, AppError> {
    segment
        .parse::<i64>()
        .ok()
        .filter(|n| (0..=MAX_ID).contains(n))
        .ok_or_else(|| AppError::InvalidId(segment.to_string()))
}

/// Unwrap the JSON body extractor, mapping a malformed body to a 400.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_the_id_range() {
        assert_eq!(parse_id("0").unwrap(), 0);
        assert_eq!(parse_id("4294967295").unwrap(), 0xffff_ffff);
    }

    #[test]
    fn parse_id_echoes_the_bad_segment() {
        for bad in ["abc", "-1", "4294967296", "1.5", ""] {
            match parse_id(bad) {
                Err(AppError::InvalidId(seg)) => assert_eq!(seg, bad),
                other => panic!("expected InvalidId, got {other:?}"),
            }
        }
    }
}
