//! Object operations: list, upload, get, download, patch, delete.

use bytes::Bytes;
use gcpstack_http::multipart::{is_multipart, parse_related};
use gcpstack_model::GcpError;
use gcpstack_model::storage::{DEFAULT_CONTENT_TYPE, Object, ObjectPatch, Objects};
use tracing::debug;

use crate::error::EmulatorError;
use crate::provider::GcpEmulator;
use crate::state::storage::NewObject;
use crate::validation::validate_object_name;

fn no_such_object(bucket: &str, name: &str) -> GcpError {
    EmulatorError::NoSuchObject {
        bucket: bucket.to_owned(),
        object: name.to_owned(),
    }
    .into()
}

impl GcpEmulator {
    /// List objects under an optional prefix, folding on an optional delimiter.
    pub(crate) fn handle_list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> Result<Objects, GcpError> {
        let (items, prefixes) = self.store.list_objects(bucket, prefix, delimiter)?;
        Ok(Objects::new(items, prefixes))
    }

    /// Upload an object.
    ///
    /// A `multipart/` request carries a JSON metadata part and a content part;
    /// anything else is a simple upload whose body is the content and whose
    /// `Content-Type` header is the object's. The `name` query parameter wins
    /// over the metadata's `name`.
    pub(crate) fn handle_insert_object(
        &self,
        bucket: &str,
        name_param: Option<&str>,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<Object, GcpError> {
        let header = content_type.unwrap_or("").trim();

        let (metadata_name, object_content_type, content, metadata) = if is_multipart(header) {
            let upload = parse_related(&body, header)?;
            let object_content_type = upload.effective_content_type().map(str::to_owned);
            (
                upload.metadata.name,
                object_content_type,
                upload.content,
                upload.metadata.metadata.unwrap_or_default(),
            )
        } else {
            let object_content_type = (!header.is_empty()).then(|| header.to_owned());
            (None, object_content_type, body, Default::default())
        };

        let name = name_param
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .or(metadata_name.filter(|n| !n.is_empty()))
            .ok_or(EmulatorError::Required { field: "name" })?;
        validate_object_name(&name)?;

        let object = self.store.create_object(
            bucket,
            NewObject {
                name,
                content_type: object_content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
                content,
                metadata,
            },
        )?;
        debug!(
            bucket,
            object = %object.name,
            generation = object.generation,
            size = object.size,
            "insert_object completed"
        );
        Ok(object)
    }

    /// Get object metadata.
    pub(crate) fn handle_get_object(&self, bucket: &str, name: &str) -> Result<Object, GcpError> {
        self.store
            .get_object(bucket, name)
            .ok_or_else(|| no_such_object(bucket, name))
    }

    /// Get object metadata and content.
    pub(crate) fn handle_download_object(
        &self,
        bucket: &str,
        name: &str,
    ) -> Result<(Object, Bytes), GcpError> {
        self.store
            .get_object_content(bucket, name)
            .ok_or_else(|| no_such_object(bucket, name))
    }

    /// Merge a metadata patch into an object. `PATCH` and `PUT` both land here.
    pub(crate) fn handle_patch_object(
        &self,
        bucket: &str,
        name: &str,
        patch: ObjectPatch,
    ) -> Result<Object, GcpError> {
        let object = self.store.update_object(bucket, name, patch)?;
        debug!(
            bucket,
            object = %name,
            metageneration = object.metageneration,
            "patch_object completed"
        );
        Ok(object)
    }

    /// Delete an object.
    pub(crate) fn handle_delete_object(&self, bucket: &str, name: &str) -> Result<(), GcpError> {
        self.store.delete_object(bucket, name)?;
        debug!(bucket, object = %name, "delete_object completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use gcpstack_model::GcpErrorCode;
    use gcpstack_model::storage::BucketInsertRequest;

    use super::*;
    use crate::ops::test_support::emulator;

    fn with_bucket(name: &str) -> GcpEmulator {
        let emulator = emulator();
        emulator
            .handle_insert_bucket(
                None,
                BucketInsertRequest {
                    name: name.to_owned(),
                    ..Default::default()
                },
            )
            .unwrap_or_else(|e| panic!("insert bucket failed: {e}"));
        emulator
    }

    fn related_body(metadata: &str, content_headers: &str, content: &str) -> Bytes {
        Bytes::from(format!(
            "--sep\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --sep\r\n{content_headers}\r\n{content}\r\n--sep--\r\n"
        ))
    }

    #[test]
    fn test_should_upload_simple_object() {
        let emulator = with_bucket("mybucket");
        let object = emulator
            .handle_insert_object(
                "mybucket",
                Some("a/b.txt"),
                Some("text/plain"),
                Bytes::from_static(b"hello"),
            )
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(object.name, "a/b.txt");
        assert_eq!(object.size, 5);
        assert_eq!(object.content_type, "text/plain");
        assert_eq!(object.md5_hash, "XUFAKrxLKna5cZ2REBfFkg==");

        let (_, content) = emulator
            .handle_download_object("mybucket", "a/b.txt")
            .unwrap_or_else(|e| panic!("download failed: {e}"));
        assert_eq!(content.as_ref(), b"hello");
    }

    #[test]
    fn test_should_default_content_type() {
        let emulator = with_bucket("mybucket");
        let object = emulator
            .handle_insert_object("mybucket", Some("raw"), None, Bytes::from_static(b"\x00"))
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(object.content_type, "application/octet-stream");
    }

    #[test]
    fn test_should_upload_multipart_object() {
        let emulator = with_bucket("mybucket");
        let body = related_body(
            r#"{"name":"docs/readme.md","metadata":{"owner":"ops"}}"#,
            "Content-Type: text/markdown\r\n",
            "# hi",
        );
        let object = emulator
            .handle_insert_object(
                "mybucket",
                None,
                Some("multipart/related; boundary=sep"),
                body,
            )
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(object.name, "docs/readme.md");
        assert_eq!(object.content_type, "text/markdown");
        assert_eq!(object.size, 4);
        assert_eq!(
            object.metadata,
            BTreeMap::from([("owner".to_owned(), "ops".to_owned())])
        );
    }

    #[test]
    fn test_should_prefer_query_name_and_metadata_content_type() {
        let emulator = with_bucket("mybucket");
        let body = related_body(
            r#"{"name":"ignored","contentType":"application/json"}"#,
            "Content-Type: text/plain\r\n",
            "{}",
        );
        let object = emulator
            .handle_insert_object(
                "mybucket",
                Some("chosen"),
                Some("multipart/related; boundary=sep"),
                body,
            )
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(object.name, "chosen");
        assert_eq!(object.content_type, "application/json");
    }

    #[test]
    fn test_should_require_object_name() {
        let emulator = with_bucket("mybucket");
        let err = emulator
            .handle_insert_object("mybucket", None, Some("text/plain"), Bytes::new())
            .unwrap_err();
        assert_eq!(err.code, GcpErrorCode::Required);
    }

    #[test]
    fn test_should_reject_malformed_multipart() {
        let emulator = with_bucket("mybucket");
        let err = emulator
            .handle_insert_object(
                "mybucket",
                Some("x"),
                Some("multipart/related"),
                Bytes::from_static(b"whatever"),
            )
            .unwrap_err();
        assert_eq!(err.code, GcpErrorCode::ParseError);
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_report_missing_bucket_on_upload() {
        let emulator = emulator();
        let err = emulator
            .handle_insert_object("ghost", Some("x"), None, Bytes::new())
            .unwrap_err();
        assert_eq!(err.code, GcpErrorCode::NotFound);
    }

    #[test]
    fn test_should_patch_and_delete_object() {
        let emulator = with_bucket("mybucket");
        emulator
            .handle_insert_object("mybucket", Some("o"), None, Bytes::from_static(b"1"))
            .unwrap_or_else(|e| panic!("upload failed: {e}"));

        let patched = emulator
            .handle_patch_object(
                "mybucket",
                "o",
                ObjectPatch {
                    metadata: Some(BTreeMap::from([("k".to_owned(), Some("v".to_owned()))])),
                    ..Default::default()
                },
            )
            .unwrap_or_else(|e| panic!("patch failed: {e}"));
        assert_eq!(patched.metageneration, 2);

        emulator
            .handle_delete_object("mybucket", "o")
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        assert_eq!(
            emulator.handle_get_object("mybucket", "o").unwrap_err().code,
            GcpErrorCode::NotFound
        );
    }
}
