//! Object storage resources: buckets, objects, and their request bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_util::{rfc3339, string_number};

/// Default bucket location.
pub const DEFAULT_LOCATION: &str = "US";

/// Default storage class for buckets.
pub const DEFAULT_STORAGE_CLASS: &str = "STANDARD";

/// Content type assigned when an upload does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Always `storage#bucket`.
    pub kind: String,
    /// Same as the bucket name.
    pub id: String,
    /// Canonical URL of this resource.
    pub self_link: String,
    /// Owning project number.
    #[serde(with = "string_number")]
    pub project_number: u64,
    /// Globally unique bucket name.
    pub name: String,
    /// Creation time.
    #[serde(with = "rfc3339")]
    pub time_created: DateTime<Utc>,
    /// Last metadata change.
    #[serde(with = "rfc3339")]
    pub updated: DateTime<Utc>,
    /// Metadata generation, starting at 1.
    #[serde(with = "string_number")]
    pub metageneration: i64,
    /// Location, upper-cased (`US`, `EU`, `US-CENTRAL1`).
    pub location: String,
    /// `multi-region` or `region`.
    pub location_type: String,
    /// Default storage class for new objects.
    pub storage_class: String,
    /// Entity tag, regenerated on every mutation.
    pub etag: String,
    /// User labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Bucket {
    /// Resource kind.
    pub const KIND: &str = "storage#bucket";
}

/// The location type the live service reports for a location.
#[must_use]
pub fn location_type(location: &str) -> &'static str {
    match location {
        "US" | "EU" | "ASIA" => "multi-region",
        "NAM4" | "EUR4" | "ASIA1" => "dual-region",
        _ => "region",
    }
}

/// An object's metadata. Content bytes are stored alongside, never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    /// Always `storage#object`.
    pub kind: String,
    /// `bucket/name/generation`.
    pub id: String,
    /// Canonical metadata URL.
    pub self_link: String,
    /// Content download URL.
    pub media_link: String,
    /// Object name; may contain `/`.
    pub name: String,
    /// Owning bucket.
    pub bucket: String,
    /// Content generation (nanosecond creation timestamp).
    #[serde(with = "string_number")]
    pub generation: i64,
    /// Metadata generation, starting at 1 for each content generation.
    #[serde(with = "string_number")]
    pub metageneration: i64,
    /// MIME type of the content.
    pub content_type: String,
    /// Storage class, inherited from the bucket at creation.
    pub storage_class: String,
    /// Content length in bytes.
    #[serde(with = "string_number")]
    pub size: u64,
    /// Base64 MD5 of the content.
    pub md5_hash: String,
    /// Base64 big-endian CRC32C (Castagnoli) of the content.
    pub crc32c: String,
    /// Entity tag, regenerated on every mutation.
    pub etag: String,
    /// Creation time of this generation.
    #[serde(with = "rfc3339")]
    pub time_created: DateTime<Utc>,
    /// Last metadata change.
    #[serde(with = "rfc3339")]
    pub updated: DateTime<Utc>,
    /// User metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Object {
    /// Resource kind.
    pub const KIND: &str = "storage#object";
}

/// `storage#buckets` list envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buckets {
    /// Always `storage#buckets`.
    pub kind: String,
    /// The buckets, sorted by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Bucket>,
}

impl Buckets {
    /// Resource kind.
    pub const KIND: &str = "storage#buckets";

    /// Wrap a bucket list.
    #[must_use]
    pub fn new(items: Vec<Bucket>) -> Self {
        Self {
            kind: Self::KIND.to_owned(),
            items,
        }
    }
}

/// `storage#objects` list envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objects {
    /// Always `storage#objects`.
    pub kind: String,
    /// Objects not rolled up into a prefix, sorted by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Object>,
    /// Common prefixes, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,
}

impl Objects {
    /// Resource kind.
    pub const KIND: &str = "storage#objects";

    /// Wrap a listing result.
    #[must_use]
    pub fn new(items: Vec<Object>, prefixes: Vec<String>) -> Self {
        Self {
            kind: Self::KIND.to_owned(),
            items,
            prefixes,
        }
    }
}

/// Body of `POST /storage/v1/b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInsertRequest {
    /// Bucket name.
    #[serde(default)]
    pub name: String,
    /// Location; defaults to `US`.
    #[serde(default)]
    pub location: Option<String>,
    /// Storage class; defaults to `STANDARD`.
    #[serde(default)]
    pub storage_class: Option<String>,
    /// Initial labels.
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Body of `PATCH`/`PUT /storage/v1/b/{bucket}`. Absent fields are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketPatch {
    /// New storage class.
    #[serde(default)]
    pub storage_class: Option<String>,
    /// New location.
    #[serde(default)]
    pub location: Option<String>,
    /// Label changes; a `null` value deletes the label.
    #[serde(default)]
    pub labels: Option<BTreeMap<String, Option<String>>>,
}

/// JSON metadata part of a `multipart/related` upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectUploadMetadata {
    /// Object name, used when the `name` query parameter is absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Content type, overriding the content part's header.
    #[serde(default)]
    pub content_type: Option<String>,
    /// User metadata.
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Body of `PATCH`/`PUT /storage/v1/b/{bucket}/o/{object}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    /// New content type.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Metadata changes; a `null` value deletes the key.
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, Option<String>>>,
}

/// Apply a key-wise patch: present values overwrite, `None` removes.
pub fn merge_string_map(
    target: &mut BTreeMap<String, String>,
    patch: BTreeMap<String, Option<String>>,
) {
    for (key, value) in patch {
        match value {
            Some(v) => {
                target.insert(key, v);
            }
            None => {
                target.remove(&key);
            }
        }
    }
}
