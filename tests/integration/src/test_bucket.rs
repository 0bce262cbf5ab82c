//! Bucket integration tests.

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use crate::{TestServer, expect_error, expect_json, test_bucket_name};

    #[tokio::test]
    async fn test_should_create_and_list_bucket_for_project() {
        let server = TestServer::start()
            .await
            .unwrap_or_else(|e| panic!("server failed to start: {e}"));

        let resp = server
            .post_json("/storage/v1/b?project=p1", &json!({ "name": "mybucket" }))
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        let created = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        assert_eq!(created["kind"], "storage#bucket");

        let resp = server
            .get("/storage/v1/b?project=p1")
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        let list = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert_eq!(list["kind"], "storage#buckets");
        let bucket = &list["items"][0];
        assert_eq!(bucket["name"], "mybucket");
        assert_eq!(bucket["kind"], "storage#bucket");
        assert_eq!(bucket["location"], "US");
        assert_eq!(bucket["storageClass"], "STANDARD");
        assert!(bucket["projectNumber"].is_string());
        assert!(bucket["metageneration"].is_string());

        let resp = server
            .post_json("/storage/v1/b?project=p1", &json!({ "name": "mybucket" }))
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        expect_error(resp, StatusCode::CONFLICT, "conflict")
            .await
            .unwrap_or_else(|e| panic!("duplicate create: {e}"));
    }

    #[tokio::test]
    async fn test_should_get_identical_bucket_after_create() {
        let server = TestServer::start()
            .await
            .unwrap_or_else(|e| panic!("server failed to start: {e}"));
        let name = test_bucket_name("get");
        let created = server
            .create_bucket(&name)
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let resp = server
            .get(&format!("/storage/v1/b/{name}"))
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        let fetched = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_should_patch_bucket_labels() {
        let server = TestServer::start()
            .await
            .unwrap_or_else(|e| panic!("server failed to start: {e}"));
        let name = test_bucket_name("patch");
        let created = server
            .create_bucket(&name)
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));

        let resp = server
            .send_json(
                Method::PATCH,
                &format!("/storage/v1/b/{name}"),
                &json!({ "labels": { "env": "dev" } }),
            )
            .await
            .unwrap_or_else(|e| panic!("patch failed: {e}"));
        let patched = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("patch failed: {e}"));
        assert_eq!(patched["labels"]["env"], "dev");
        assert_eq!(patched["metageneration"], "2");
        assert_eq!(patched["location"], created["location"]);
        assert_ne!(patched["etag"], created["etag"]);
    }

    #[tokio::test]
    async fn test_should_refuse_to_delete_non_empty_bucket() {
        let server = TestServer::start()
            .await
            .unwrap_or_else(|e| panic!("server failed to start: {e}"));
        server
            .create_bucket("b-e4")
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        let resp = server
            .upload("b-e4", "o/one", "text/plain", b"1")
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = server
            .delete("/storage/v1/b/b-e4")
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        expect_error(resp, StatusCode::CONFLICT, "conflict")
            .await
            .unwrap_or_else(|e| panic!("non-empty delete: {e}"));

        let resp = server
            .delete("/storage/v1/b/b-e4/o/o/one")
            .await
            .unwrap_or_else(|e| panic!("delete object failed: {e}"));
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = server
            .delete("/storage/v1/b/b-e4")
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}
