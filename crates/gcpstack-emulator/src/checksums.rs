//! Content digests carried on object records.
//!
//! Both digests are base64 of the raw digest bytes: MD5 as 16 bytes, CRC32C
//! (Castagnoli) as the big-endian `u32`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use md5::{Digest, Md5};

/// Compute the base64-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use gcpstack_emulator::checksums::compute_md5_base64;
///
/// assert_eq!(compute_md5_base64(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
/// ```
#[must_use]
pub fn compute_md5_base64(data: &[u8]) -> String {
    BASE64_STANDARD.encode(Md5::digest(data))
}

/// Compute the base64-encoded big-endian CRC32C of `data`.
///
/// # Examples
///
/// ```
/// use gcpstack_emulator::checksums::compute_crc32c_base64;
///
/// assert_eq!(compute_crc32c_base64(b"hello"), "mnG7TA==");
/// ```
#[must_use]
pub fn compute_crc32c_base64(data: &[u8]) -> String {
    BASE64_STANDARD.encode(crc32c::crc32c(data).to_be_bytes())
}

/// Both digests of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigests {
    /// Base64 MD5.
    pub md5: String,
    /// Base64 CRC32C.
    pub crc32c: String,
}

impl ContentDigests {
    /// Digest `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self {
            md5: compute_md5_base64(data),
            crc32c: compute_crc32c_base64(data),
        }
    }

    /// The `x-goog-hash` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("crc32c={},md5={}", self.crc32c, self.md5)
    }
}
