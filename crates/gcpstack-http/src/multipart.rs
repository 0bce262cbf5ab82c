//! `multipart/related` upload parser.
//!
//! The upload endpoint accepts a two-part body: a JSON metadata document
//! followed by the raw object content. Works on the already-collected body.

use bytes::Bytes;
use gcpstack_model::error::GcpError;
use gcpstack_model::storage::ObjectUploadMetadata;

/// A decoded `multipart/related` upload.
#[derive(Debug)]
pub struct RelatedUpload {
    /// Decoded JSON metadata part.
    pub metadata: ObjectUploadMetadata,
    /// Raw content part.
    pub content: Bytes,
    /// `Content-Type` header of the content part, if any.
    pub content_type: Option<String>,
}

impl RelatedUpload {
    /// Effective content type: the metadata's, then the content part's.
    #[must_use]
    pub fn effective_content_type(&self) -> Option<&str> {
        self.metadata
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .or(self.content_type.as_deref())
    }
}

/// Whether a `Content-Type` header announces a multipart body.
#[must_use]
pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/")
}

/// Extract the boundary parameter from a multipart `Content-Type`.
///
/// # Errors
///
/// Returns a parse error if the header does not parse, is not multipart, or
/// has no boundary.
pub fn extract_boundary(content_type: &str) -> Result<String, GcpError> {
    let mime: mime::Mime = content_type
        .parse()
        .map_err(|e| GcpError::parse_error(format!("Invalid Content-Type {content_type:?}: {e}")))?;

    if mime.type_() != mime::MULTIPART {
        return Err(GcpError::parse_error(format!(
            "Expected a multipart Content-Type, got: {content_type}"
        )));
    }

    match mime.get_param(mime::BOUNDARY) {
        Some(boundary) if !boundary.as_str().is_empty() => Ok(boundary.as_str().to_owned()),
        _ => Err(GcpError::parse_error("Missing boundary in multipart Content-Type")),
    }
}

/// Parse a `multipart/related` upload body.
///
/// # Errors
///
/// Returns a parse error for a missing boundary, anything other than exactly
/// two parts, a part without a header/body separator, or a metadata part that
/// is not JSON.
pub fn parse_related(body: &Bytes, content_type: &str) -> Result<RelatedUpload, GcpError> {
    let boundary = extract_boundary(content_type)?;
    let delimiter = format!("--{boundary}");
    let parts = split_parts(body, delimiter.as_bytes());

    if parts.len() != 2 {
        return Err(GcpError::parse_error(format!(
            "Expected 2 parts in multipart/related body, found {}",
            parts.len()
        )));
    }

    let (_, metadata_body) = split_headers_body(parts[0])
        .ok_or_else(|| GcpError::parse_error("Malformed metadata part"))?;
    let (content_headers, content_body) = split_headers_body(parts[1])
        .ok_or_else(|| GcpError::parse_error("Malformed content part"))?;

    let metadata = if metadata_body.iter().all(u8::is_ascii_whitespace) {
        ObjectUploadMetadata::default()
    } else {
        serde_json::from_slice(metadata_body).map_err(|e| {
            GcpError::parse_error(format!("Metadata part is not valid JSON: {e}")).with_source(e)
        })?
    };

    Ok(RelatedUpload {
        metadata,
        content: body.slice_ref(content_body),
        content_type: header_value(content_headers, "content-type"),
    })
}

/// Split the body into the parts between boundary delimiters.
///
/// The CRLF that precedes each delimiter belongs to the delimiter, so it is
/// removed from the end of each part. Text after the closing delimiter is
/// ignored.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();

    let Some(first) = find_bytes(body, delimiter) else {
        return parts;
    };
    let mut remaining = &body[first + delimiter.len()..];

    loop {
        if remaining.starts_with(b"--") {
            break;
        }
        remaining = skip_line_break(remaining);

        let Some(pos) = find_bytes(remaining, delimiter) else {
            // Unterminated body: keep what we have as the last part.
            let part = strip_line_break(remaining);
            if !part.is_empty() {
                parts.push(part);
            }
            break;
        };
        parts.push(strip_line_break(&remaining[..pos]));
        remaining = &remaining[pos + delimiter.len()..];
    }

    parts
}

/// Split a part into its header block and body.
///
/// The header block ends at the first blank line, CRLF or bare LF, whichever
/// comes first. A part with no headers starts directly with that blank line.
fn split_headers_body(part: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(body) = part
        .strip_prefix(b"\r\n")
        .or_else(|| part.strip_prefix(b"\n"))
    {
        return Some((&part[..0], body));
    }

    let crlf = find_bytes(part, b"\r\n\r\n").map(|pos| (pos, 4));
    let lf = find_bytes(part, b"\n\n").map(|pos| (pos, 2));
    let (pos, len) = match (crlf, lf) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    Some((&part[..pos], &part[pos + len..]))
}

/// Find a header value in a part's header block, case-insensitively.
fn header_value(headers: &[u8], name: &str) -> Option<String> {
    String::from_utf8_lossy(headers).lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_owned())
    })
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn skip_line_break(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n")
        .or_else(|| data.strip_prefix(b"\n"))
        .unwrap_or(data)
}

fn strip_line_break(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n")
        .or_else(|| data.strip_suffix(b"\n"))
        .unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CT: &str = "multipart/related; boundary=foo_bar_baz";

    fn related_body(metadata: &str, content_headers: &str, content: &[u8]) -> Bytes {
        let mut body = Vec::new();
        body.extend_from_slice(b"--foo_bar_baz\r\n");
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata.as_bytes());
        body.extend_from_slice(b"\r\n--foo_bar_baz\r\n");
        body.extend_from_slice(content_headers.as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n--foo_bar_baz--\r\n");
        Bytes::from(body)
    }

    #[test]
    fn test_should_extract_boundary() {
        assert_eq!(extract_boundary(CT).unwrap(), "foo_bar_baz");
        assert_eq!(
            extract_boundary(r#"multipart/related; boundary="===abc==""#).unwrap(),
            "===abc=="
        );
    }

    #[test]
    fn test_should_reject_missing_or_foreign_boundary() {
        assert!(extract_boundary("multipart/related").is_err());
        assert!(extract_boundary("application/json").is_err());
        assert!(extract_boundary("not a mime type").is_err());
    }

    #[test]
    fn test_should_detect_multipart_content_type() {
        assert!(is_multipart("multipart/related; boundary=x"));
        assert!(is_multipart("Multipart/Form-Data"));
        assert!(!is_multipart("text/plain"));
    }

    #[test]
    fn test_should_parse_related_upload() {
        let body = related_body(
            r#"{"name": "dir/file.txt", "metadata": {"owner": "ci"}}"#,
            "Content-Type: text/plain\r\n",
            b"hello",
        );
        let upload = parse_related(&body, CT).unwrap();

        assert_eq!(upload.metadata.name.as_deref(), Some("dir/file.txt"));
        assert_eq!(
            upload
                .metadata
                .metadata
                .as_ref()
                .and_then(|m| m.get("owner"))
                .map(String::as_str),
            Some("ci")
        );
        assert_eq!(upload.content.as_ref(), b"hello");
        assert_eq!(upload.content_type.as_deref(), Some("text/plain"));
        assert_eq!(upload.effective_content_type(), Some("text/plain"));
    }

    #[test]
    fn test_should_prefer_metadata_content_type() {
        let body = related_body(
            r#"{"contentType": "application/json"}"#,
            "Content-Type: text/plain\r\n",
            b"{}",
        );
        let upload = parse_related(&body, CT).unwrap();
        assert_eq!(upload.effective_content_type(), Some("application/json"));
    }

    #[test]
    fn test_should_keep_binary_content_intact() {
        let content = b"\x00\x01\r\n\xff\r\n";
        let body = related_body("{}", "Content-Type: application/octet-stream\r\n", content);
        let upload = parse_related(&body, CT).unwrap();
        assert_eq!(upload.content.as_ref(), content);
    }

    #[test]
    fn test_should_accept_content_part_without_headers() {
        let body = related_body("{}", "", b"raw");
        let upload = parse_related(&body, CT).unwrap();
        assert_eq!(upload.content.as_ref(), b"raw");
        assert!(upload.content_type.is_none());
        assert!(upload.effective_content_type().is_none());
    }

    #[test]
    fn test_should_keep_blank_crlf_lines_inside_content() {
        let body = Bytes::from_static(
            b"--sep\nContent-Type: application/json\n\n{\"name\":\"o\"}\n\
              --sep\nContent-Type: text/plain\n\nline1\r\n\r\nline2\n--sep--\n",
        );
        let upload = parse_related(&body, "multipart/related; boundary=sep").unwrap();
        assert_eq!(upload.metadata.name.as_deref(), Some("o"));
        assert_eq!(upload.content_type.as_deref(), Some("text/plain"));
        assert_eq!(upload.content.as_ref(), b"line1\r\n\r\nline2");
    }

    #[test]
    fn test_should_keep_blank_lines_in_header_less_content() {
        let body = related_body("{}", "", b"a\r\n\r\nb\n\nc");
        let upload = parse_related(&body, CT).unwrap();
        assert_eq!(upload.content.as_ref(), b"a\r\n\r\nb\n\nc");
        assert!(upload.content_type.is_none());
    }

    #[test]
    fn test_should_reject_non_json_metadata() {
        let body = related_body("name=x", "Content-Type: text/plain\r\n", b"hello");
        let err = parse_related(&body, CT).unwrap_err();
        assert_eq!(err.code, gcpstack_model::GcpErrorCode::ParseError);
    }

    #[test]
    fn test_should_reject_wrong_part_count() {
        let body = Bytes::from_static(
            b"--foo_bar_baz\r\nContent-Type: application/json\r\n\r\n{}\r\n--foo_bar_baz--\r\n",
        );
        assert!(parse_related(&body, CT).is_err());
    }
}
