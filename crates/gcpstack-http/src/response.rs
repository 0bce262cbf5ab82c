//! Response shaping and error envelopes.

use bytes::Bytes;
use gcpstack_model::error::{GcpError, GcpErrorCode};
use gcpstack_model::operations::ApiFamily;
use http::header::{
    CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderName, HeaderValue, VARY,
};
use serde::Serialize;

use crate::body::GcpResponseBody;

/// Content type for JSON responses and error envelopes.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Cache policy on every JSON response.
pub const NO_CACHE: &str = "no-cache, no-store, max-age=0, must-revalidate";

/// Vary header on every JSON response.
pub const VARY_ORIGIN: &str = "Origin, X-Origin";

/// Message shown to clients instead of the cause of an internal error.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error encountered.";

/// Build a response carrying pre-serialized JSON.
#[must_use]
pub fn json_bytes_response(
    status: http::StatusCode,
    json: Vec<u8>,
) -> http::Response<GcpResponseBody> {
    http::Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CACHE_CONTROL, NO_CACHE)
        .header(VARY, VARY_ORIGIN)
        .body(GcpResponseBody::from_json(json))
        .expect("valid JSON response")
}

/// Serialize `value` into a `200 OK` JSON response.
///
/// # Errors
///
/// Returns an internal error if serialization fails.
pub fn json_response<T: Serialize>(value: &T) -> Result<http::Response<GcpResponseBody>, GcpError> {
    let json = serde_json::to_vec(value).map_err(|e| {
        GcpError::internal_error(format!("failed to encode response: {e}")).with_source(e)
    })?;
    Ok(json_bytes_response(http::StatusCode::OK, json))
}

/// `204 No Content`.
#[must_use]
pub fn no_content() -> http::Response<GcpResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::NO_CONTENT)
        .header(CACHE_CONTROL, NO_CACHE)
        .body(GcpResponseBody::empty())
        .expect("valid empty response")
}

/// Raw object content with its entity tag and any extra headers.
#[must_use]
pub fn media_response(
    content: Bytes,
    content_type: &str,
    etag: &str,
    extra_headers: &[(HeaderName, String)],
) -> http::Response<GcpResponseBody> {
    let len = content.len();
    let mut response = http::Response::builder()
        .status(http::StatusCode::OK)
        .header(CONTENT_LENGTH, len)
        .body(GcpResponseBody::from_bytes(content))
        .expect("valid media response");

    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(content_type) {
        headers.insert(CONTENT_TYPE, hv);
    }
    if let Ok(hv) = HeaderValue::from_str(etag) {
        headers.insert(ETAG, hv);
    }
    for (name, value) in extra_headers {
        if let Ok(hv) = HeaderValue::from_str(value) {
            headers.insert(name.clone(), hv);
        }
    }

    response
}

/// Serialize an error into the family's envelope.
///
/// Storage:
///
/// ```json
/// {"error": {"code": 404, "message": "...",
///            "errors": [{"domain": "global", "reason": "notFound", "message": "..."}]}}
/// ```
///
/// The database admin flavor adds `"status": "NOT_FOUND"` next to `code`.
#[must_use]
pub fn error_to_json(error: &GcpError, family: ApiFamily) -> Vec<u8> {
    let message = if error.code == GcpErrorCode::Internal {
        INTERNAL_ERROR_MESSAGE
    } else {
        error.message.as_str()
    };

    let mut inner = serde_json::json!({
        "code": error.status_code.as_u16(),
        "message": message,
        "errors": [{
            "domain": "global",
            "reason": error.code.reason(family),
            "message": message,
        }],
    });
    if family == ApiFamily::Sql {
        inner["status"] = serde_json::Value::from(error.code.status());
    }

    serde_json::to_vec(&serde_json::json!({ "error": inner }))
        .expect("JSON serialization of error cannot fail")
}

/// Convert a `GcpError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &GcpError, family: ApiFamily) -> http::Response<GcpResponseBody> {
    json_bytes_response(error.status_code, error_to_json(error, family))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &[u8]) -> serde_json::Value {
        serde_json::from_slice(json).unwrap()
    }

    #[test]
    fn test_should_format_storage_envelope() {
        let err = GcpError::conflict(
            "Your previous request to create the named bucket succeeded and you already own it.",
        );
        let json = parse(&error_to_json(&err, ApiFamily::Storage));
        assert_eq!(json["error"]["code"], 409);
        assert_eq!(json["error"]["errors"][0]["domain"], "global");
        assert_eq!(json["error"]["errors"][0]["reason"], "conflict");
        assert!(json["error"].get("status").is_none());
    }

    #[test]
    fn test_should_format_sql_envelope_with_status() {
        let err = GcpError::not_found("The Cloud SQL instance does not exist.");
        let json = parse(&error_to_json(&err, ApiFamily::Sql));
        assert_eq!(json["error"]["code"], 404);
        assert_eq!(json["error"]["status"], "NOT_FOUND");
        assert_eq!(json["error"]["errors"][0]["reason"], "notFound");
    }

    #[test]
    fn test_should_hide_internal_error_details() {
        let err = GcpError::internal_error("lock poisoned at store.rs:42");
        let json = parse(&error_to_json(&err, ApiFamily::Storage));
        assert_eq!(json["error"]["code"], 500);
        assert_eq!(json["error"]["message"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(json["error"]["errors"][0]["reason"], "backendError");
    }

    #[test]
    fn test_should_build_error_response_with_headers() {
        let err = GcpError::invalid("Invalid bucket name: 'ab'");
        let resp = error_to_response(&err, ApiFamily::Storage);
        assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);
        assert_eq!(resp.headers().get(CACHE_CONTROL).unwrap(), NO_CACHE);
        assert_eq!(resp.headers().get(VARY).unwrap(), VARY_ORIGIN);
    }

    #[test]
    fn test_should_build_json_success_response() {
        let resp = json_response(&serde_json::json!({"kind": "storage#buckets"})).unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_should_build_media_response() {
        let resp = media_response(
            Bytes::from_static(b"hello"),
            "text/plain",
            "\"abc\"",
            &[(HeaderName::from_static("x-goog-generation"), "7".to_owned())],
        );
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(resp.headers().get(CONTENT_LENGTH).unwrap(), "5");
        assert_eq!(resp.headers().get(ETAG).unwrap(), "\"abc\"");
        assert_eq!(resp.headers().get("x-goog-generation").unwrap(), "7");
    }

    #[test]
    fn test_should_build_no_content() {
        assert_eq!(no_content().status(), http::StatusCode::NO_CONTENT);
    }
}
