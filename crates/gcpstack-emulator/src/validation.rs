//! Request validation.
//!
//! Bucket names follow the storage naming rules; every other resource name
//! only has to be present. All checks run before the store is touched.

use std::net::IpAddr;

use crate::error::EmulatorError;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Prefix reserved for the provider's own buckets.
const RESERVED_PREFIX: &str = "goog";

/// Validate a bucket name.
///
/// Rules, checked in order:
/// - 3-63 characters long
/// - Only lowercase letters, digits, `-`, `_`, and `.`
/// - Must start and end with a letter or digit
/// - Not an IP address literal (e.g. `192.168.0.1`)
/// - Must not start with `goog`
///
/// # Errors
///
/// Returns [`EmulatorError::InvalidBucketName`] naming the first violated rule.
///
/// # Examples
///
/// ```
/// use gcpstack_emulator::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my.bucket-name").is_ok());
/// assert!(validate_bucket_name("ab").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), EmulatorError> {
    let invalid = |reason: &str| EmulatorError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    let len = name.len();
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(&format!(
            "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters"
        )));
    }

    if !name.bytes().all(|b| {
        b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_' || b == b'.'
    }) {
        return Err(invalid(
            "Bucket name must only contain lowercase letters, digits, dashes, underscores, and dots",
        ));
    }

    let bytes = name.as_bytes();
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !alnum(bytes[0]) || !alnum(bytes[len - 1]) {
        return Err(invalid("Bucket name must start and end with a letter or digit"));
    }

    if name.parse::<IpAddr>().is_ok() {
        return Err(invalid("Bucket name must not be an IP address"));
    }

    if name.starts_with(RESERVED_PREFIX) {
        return Err(invalid("Bucket name must not begin with the reserved prefix 'goog'"));
    }

    Ok(())
}

/// Validate an object name. Any non-empty string is accepted, `/` included.
///
/// # Errors
///
/// Returns [`EmulatorError::Required`] for an empty name.
pub fn validate_object_name(name: &str) -> Result<(), EmulatorError> {
    require_non_empty("name", name)
}

/// Require a non-empty value for a named field.
///
/// # Errors
///
/// Returns [`EmulatorError::Required`] when `value` is empty.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), EmulatorError> {
    if value.is_empty() {
        Err(EmulatorError::Required { field })
    } else {
        Ok(())
    }
}
