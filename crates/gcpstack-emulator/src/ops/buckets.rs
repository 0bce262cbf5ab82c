//! Bucket operations: list, insert, get, patch, delete.

use gcpstack_model::GcpError;
use gcpstack_model::storage::{Bucket, BucketInsertRequest, BucketPatch, Buckets};
use tracing::debug;

use crate::error::EmulatorError;
use crate::provider::GcpEmulator;
use crate::validation::{require_non_empty, validate_bucket_name};

impl GcpEmulator {
    /// List buckets, optionally only those created under `project`.
    pub(crate) fn handle_list_buckets(&self, project: Option<&str>) -> Buckets {
        Buckets::new(self.store.list_buckets(project))
    }

    /// Create a bucket under `project`, or the configured project.
    pub(crate) fn handle_insert_bucket(
        &self,
        project: Option<&str>,
        req: BucketInsertRequest,
    ) -> Result<Bucket, GcpError> {
        require_non_empty("name", &req.name)?;
        validate_bucket_name(&req.name)?;

        let project = project.unwrap_or_else(|| self.project_id());
        let bucket = self.store.create_bucket(project, req)?;
        debug!(bucket = %bucket.name, project, "insert_bucket completed");
        Ok(bucket)
    }

    /// Get a bucket.
    pub(crate) fn handle_get_bucket(&self, name: &str) -> Result<Bucket, GcpError> {
        self.store.get_bucket(name).ok_or_else(|| {
            EmulatorError::NoSuchBucket {
                bucket: name.to_owned(),
            }
            .into()
        })
    }

    /// Merge a patch into a bucket. `PATCH` and `PUT` both land here.
    pub(crate) fn handle_patch_bucket(
        &self,
        name: &str,
        patch: BucketPatch,
    ) -> Result<Bucket, GcpError> {
        let bucket = self.store.update_bucket(name, patch)?;
        debug!(bucket = %name, metageneration = bucket.metageneration, "patch_bucket completed");
        Ok(bucket)
    }

    /// Delete an empty bucket.
    pub(crate) fn handle_delete_bucket(&self, name: &str) -> Result<(), GcpError> {
        self.store.delete_bucket(name)?;
        debug!(bucket = %name, "delete_bucket completed");
        Ok(())
    }
}
