//! Buckets and objects.

use std::collections::BTreeMap;

use bytes::Bytes;
use gcpstack_model::storage::{
    Bucket, BucketInsertRequest, BucketPatch, DEFAULT_LOCATION, DEFAULT_STORAGE_CLASS, Object,
    ObjectPatch, location_type, merge_string_map,
};
use tracing::debug;

use super::GcpStore;
use crate::checksums::ContentDigests;
use crate::error::EmulatorError;
use crate::listing::list_with_delimiter;
use crate::utils::generate_etag;

/// A bucket together with the objects it owns.
#[derive(Debug, Clone)]
pub struct BucketRecord {
    /// The bucket resource.
    pub bucket: Bucket,
    /// Project the bucket was created under.
    pub project: String,
    /// Objects keyed by name.
    pub objects: BTreeMap<String, StoredObject>,
}

/// Object metadata and content.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// The object resource.
    pub meta: Object,
    /// The object bytes.
    pub content: Bytes,
}

/// Everything needed to create an object.
#[derive(Debug, Clone)]
pub struct NewObject {
    /// Object name.
    pub name: String,
    /// Resolved content type.
    pub content_type: String,
    /// Object bytes.
    pub content: Bytes,
    /// User metadata.
    pub metadata: BTreeMap<String, String>,
}

fn non_empty_upper(value: Option<String>) -> Option<String> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.to_ascii_uppercase())
}

impl GcpStore {
    // -----------------------------------------------------------------------
    // Buckets
    // -----------------------------------------------------------------------

    /// Create a bucket under `project`. The name must already be validated.
    pub fn create_bucket(
        &self,
        project: &str,
        req: BucketInsertRequest,
    ) -> Result<Bucket, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        if inner.buckets.contains_key(&req.name) {
            return Err(EmulatorError::BucketAlreadyExists { bucket: req.name });
        }

        let tick = inner.clock.tick();
        let location =
            non_empty_upper(req.location).unwrap_or_else(|| DEFAULT_LOCATION.to_owned());
        let bucket = Bucket {
            kind: Bucket::KIND.to_owned(),
            id: req.name.clone(),
            self_link: self.ctx.links.bucket(&req.name),
            project_number: self.ctx.project_number,
            name: req.name.clone(),
            time_created: tick.time,
            updated: tick.time,
            metageneration: 1,
            location_type: location_type(&location).to_owned(),
            location,
            storage_class: non_empty_upper(req.storage_class)
                .unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_owned()),
            etag: generate_etag(),
            labels: req.labels.unwrap_or_default(),
        };

        inner.buckets.insert(
            req.name,
            BucketRecord {
                bucket: bucket.clone(),
                project: project.to_owned(),
                objects: BTreeMap::new(),
            },
        );
        debug!(bucket = %bucket.name, project, "bucket stored");
        Ok(bucket)
    }

    /// Get a bucket by name.
    #[must_use]
    pub fn get_bucket(&self, name: &str) -> Option<Bucket> {
        self.inner
            .read()
            .buckets
            .get(name)
            .map(|record| record.bucket.clone())
    }

    /// List buckets sorted by name, optionally only those created under `project`.
    #[must_use]
    pub fn list_buckets(&self, project: Option<&str>) -> Vec<Bucket> {
        self.inner
            .read()
            .buckets
            .values()
            .filter(|record| project.is_none_or(|p| record.project == p))
            .map(|record| record.bucket.clone())
            .collect()
    }

    /// Merge `patch` into a bucket. Absent or empty fields are preserved.
    pub fn update_bucket(&self, name: &str, patch: BucketPatch) -> Result<Bucket, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let record = inner
            .buckets
            .get_mut(name)
            .ok_or_else(|| EmulatorError::NoSuchBucket {
                bucket: name.to_owned(),
            })?;
        let bucket = &mut record.bucket;

        if let Some(class) = non_empty_upper(patch.storage_class) {
            bucket.storage_class = class;
        }
        if let Some(location) = non_empty_upper(patch.location) {
            bucket.location_type = location_type(&location).to_owned();
            bucket.location = location;
        }
        if let Some(labels) = patch.labels {
            merge_string_map(&mut bucket.labels, labels);
        }

        bucket.metageneration += 1;
        bucket.updated = inner.clock.tick().time;
        bucket.etag = generate_etag();
        Ok(bucket.clone())
    }

    /// Delete an empty bucket.
    pub fn delete_bucket(&self, name: &str) -> Result<(), EmulatorError> {
        let mut inner = self.inner.write();
        let record = inner
            .buckets
            .get(name)
            .ok_or_else(|| EmulatorError::NoSuchBucket {
                bucket: name.to_owned(),
            })?;
        if !record.objects.is_empty() {
            return Err(EmulatorError::BucketNotEmpty {
                bucket: name.to_owned(),
            });
        }
        inner.buckets.remove(name);
        Ok(())
    }

    /// Whether a bucket owns no objects.
    pub fn bucket_is_empty(&self, name: &str) -> Result<bool, EmulatorError> {
        self.inner
            .read()
            .buckets
            .get(name)
            .map(|record| record.objects.is_empty())
            .ok_or_else(|| EmulatorError::NoSuchBucket {
                bucket: name.to_owned(),
            })
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Store an object.
    ///
    /// If the current object under the same name has the same MD5, content
    /// type, and user metadata, it is returned unchanged. Otherwise a new
    /// generation replaces it.
    pub fn create_object(&self, bucket: &str, new: NewObject) -> Result<Object, EmulatorError> {
        let digests = ContentDigests::of(&new.content);

        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let record = inner
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| EmulatorError::NoSuchBucket {
                bucket: bucket.to_owned(),
            })?;

        if let Some(existing) = record.objects.get(&new.name) {
            let meta = &existing.meta;
            if meta.md5_hash == digests.md5
                && meta.content_type == new.content_type
                && meta.metadata == new.metadata
            {
                debug!(
                    bucket,
                    object = %new.name,
                    generation = meta.generation,
                    "identical upload, keeping generation"
                );
                return Ok(meta.clone());
            }
        }

        let tick = inner.clock.tick();
        let generation = tick.nanos;
        let links = &self.ctx.links;
        let object = Object {
            kind: Object::KIND.to_owned(),
            id: format!("{bucket}/{}/{generation}", new.name),
            self_link: links.object(bucket, &new.name),
            media_link: links.media(bucket, &new.name, generation),
            name: new.name.clone(),
            bucket: bucket.to_owned(),
            generation,
            metageneration: 1,
            content_type: new.content_type,
            storage_class: record.bucket.storage_class.clone(),
            size: new.content.len() as u64,
            md5_hash: digests.md5,
            crc32c: digests.crc32c,
            etag: generate_etag(),
            time_created: tick.time,
            updated: tick.time,
            metadata: new.metadata,
        };

        record.objects.insert(
            new.name,
            StoredObject {
                meta: object.clone(),
                content: new.content,
            },
        );
        Ok(object)
    }

    /// Get object metadata.
    #[must_use]
    pub fn get_object(&self, bucket: &str, name: &str) -> Option<Object> {
        self.inner
            .read()
            .buckets
            .get(bucket)
            .and_then(|record| record.objects.get(name))
            .map(|stored| stored.meta.clone())
    }

    /// Get object metadata and content.
    #[must_use]
    pub fn get_object_content(&self, bucket: &str, name: &str) -> Option<(Object, Bytes)> {
        self.inner
            .read()
            .buckets
            .get(bucket)
            .and_then(|record| record.objects.get(name))
            .map(|stored| (stored.meta.clone(), stored.content.clone()))
    }

    /// List objects with optional prefix and delimiter.
    ///
    /// Returns the matching objects and the common prefixes, both ascending.
    pub fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> Result<(Vec<Object>, Vec<String>), EmulatorError> {
        let inner = self.inner.read();
        let record = inner
            .buckets
            .get(bucket)
            .ok_or_else(|| EmulatorError::NoSuchBucket {
                bucket: bucket.to_owned(),
            })?;

        let listing = list_with_delimiter(
            record
                .objects
                .iter()
                .map(|(name, stored)| (name.as_str(), &stored.meta)),
            prefix,
            delimiter,
        );
        Ok((
            listing.items.into_iter().cloned().collect(),
            listing.prefixes,
        ))
    }

    /// Merge a metadata patch into an object, bumping its metageneration.
    pub fn update_object(
        &self,
        bucket: &str,
        name: &str,
        patch: ObjectPatch,
    ) -> Result<Object, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let stored = inner
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| EmulatorError::NoSuchBucket {
                bucket: bucket.to_owned(),
            })?
            .objects
            .get_mut(name)
            .ok_or_else(|| EmulatorError::NoSuchObject {
                bucket: bucket.to_owned(),
                object: name.to_owned(),
            })?;
        let meta = &mut stored.meta;

        if let Some(content_type) = patch.content_type.filter(|c| !c.is_empty()) {
            meta.content_type = content_type;
        }
        if let Some(metadata) = patch.metadata {
            merge_string_map(&mut meta.metadata, metadata);
        }

        meta.metageneration += 1;
        meta.updated = inner.clock.tick().time;
        meta.etag = generate_etag();
        Ok(meta.clone())
    }

    /// Delete an object.
    pub fn delete_object(&self, bucket: &str, name: &str) -> Result<(), EmulatorError> {
        let mut inner = self.inner.write();
        inner
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| EmulatorError::NoSuchBucket {
                bucket: bucket.to_owned(),
            })?
            .objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EmulatorError::NoSuchObject {
                bucket: bucket.to_owned(),
                object: name.to_owned(),
            })
    }
}
