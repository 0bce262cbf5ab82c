//! Shared utilities: entity tags, the monotonic clock, and resource links.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngExt;

/// Characters escaped when an object name is placed in a single path segment.
const OBJECT_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Generate a fresh opaque entity tag.
///
/// # Examples
///
/// ```
/// use gcpstack_emulator::utils::generate_etag;
///
/// assert_ne!(generate_etag(), generate_etag());
/// ```
#[must_use]
pub fn generate_etag() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; 12];
    rng.fill(&mut buf);
    BASE64_STANDARD.encode(buf)
}

/// Generate a random six-digit decimal string.
#[must_use]
pub fn generate_numeric_suffix() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; 4];
    rng.fill(&mut buf);
    format!("{:06}", u32::from_be_bytes(buf) % 1_000_000)
}

/// Percent-encode an object name so it fits in one path segment.
///
/// # Examples
///
/// ```
/// use gcpstack_emulator::utils::encode_object_name;
///
/// assert_eq!(encode_object_name("a/b c.txt"), "a%2Fb%20c.txt");
/// ```
#[must_use]
pub fn encode_object_name(name: &str) -> String {
    utf8_percent_encode(name, OBJECT_NAME_ENCODE_SET).to_string()
}

/// One reading of the [`MonotonicClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Nanoseconds since the Unix epoch.
    pub nanos: i64,
    /// The same instant as a timestamp.
    pub time: DateTime<Utc>,
}

/// Wall clock that never repeats or goes backwards.
///
/// Each reading is the current time in nanoseconds, or one nanosecond past
/// the previous reading if the wall clock has not advanced.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: i64,
}

impl MonotonicClock {
    /// Take a reading.
    pub fn tick(&mut self) -> Tick {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let nanos = now.max(self.last.saturating_add(1));
        self.last = nanos;
        Tick {
            nanos,
            time: DateTime::from_timestamp_nanos(nanos),
        }
    }
}

/// Builds the absolute links embedded in resources.
#[derive(Debug, Clone)]
pub struct Links {
    base: String,
}

impl Links {
    /// Create a builder rooted at `external_url`.
    #[must_use]
    pub fn new(external_url: &str) -> Self {
        Self {
            base: external_url.trim_end_matches('/').to_owned(),
        }
    }

    /// `selfLink` of a bucket.
    #[must_use]
    pub fn bucket(&self, bucket: &str) -> String {
        format!("{}/storage/v1/b/{bucket}", self.base)
    }

    /// `selfLink` of an object.
    #[must_use]
    pub fn object(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/b/{bucket}/o/{}",
            self.base,
            encode_object_name(name)
        )
    }

    /// `mediaLink` of an object generation.
    #[must_use]
    pub fn media(&self, bucket: &str, name: &str, generation: i64) -> String {
        format!(
            "{}/download/storage/v1/b/{bucket}/o/{}?generation={generation}&alt=media",
            self.base,
            encode_object_name(name)
        )
    }

    /// `selfLink` of an instance, also used as an operation's `targetLink`.
    #[must_use]
    pub fn instance(&self, project: &str, instance: &str) -> String {
        format!(
            "{}/sql/v1beta4/projects/{project}/instances/{instance}",
            self.base
        )
    }

    /// `selfLink` of a database.
    #[must_use]
    pub fn database(&self, project: &str, instance: &str, database: &str) -> String {
        format!("{}/databases/{database}", self.instance(project, instance))
    }

    /// `selfLink` of an operation.
    #[must_use]
    pub fn operation(&self, project: &str, operation: &str) -> String {
        format!(
            "{}/sql/v1beta4/projects/{project}/operations/{operation}",
            self.base
        )
    }
}
