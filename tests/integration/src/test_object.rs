//! Object integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use reqwest::header::{CONTENT_TYPE, ETAG};

    use crate::{TestServer, expect_json, test_bucket_name};

    async fn server_with_bucket(prefix: &str) -> (TestServer, String) {
        let server = TestServer::start()
            .await
            .unwrap_or_else(|e| panic!("server failed to start: {e}"));
        let bucket = test_bucket_name(prefix);
        server
            .create_bucket(&bucket)
            .await
            .unwrap_or_else(|e| panic!("create bucket failed: {e}"));
        (server, bucket)
    }

    #[tokio::test]
    async fn test_should_upload_and_download_simple_object() {
        let (server, bucket) = server_with_bucket("simple").await;

        let resp = server
            .upload(&bucket, "a/b.txt", "text/plain", b"hello")
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        let object = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(object["kind"], "storage#object");
        assert_eq!(object["size"], "5");
        assert_eq!(object["contentType"], "text/plain");
        assert_eq!(object["md5Hash"], "XUFAKrxLKna5cZ2REBfFkg==");

        let resp = server
            .get(&format!("/storage/v1/b/{bucket}/o/a/b.txt?alt=media"))
            .await
            .unwrap_or_else(|e| panic!("download failed: {e}"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain");
        assert!(resp.headers().contains_key(ETAG));
        let body = resp
            .bytes()
            .await
            .unwrap_or_else(|e| panic!("read body failed: {e}"));
        assert_eq!(body.as_ref(), b"hello");

        let resp = server
            .get(&format!("/download/storage/v1/b/{bucket}/o/a%2Fb.txt"))
            .await
            .unwrap_or_else(|e| panic!("download failed: {e}"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()["x-goog-generation"],
            object["generation"].as_str().unwrap_or_default()
        );
    }

    #[tokio::test]
    async fn test_should_keep_generation_for_identical_upload() {
        let (server, bucket) = server_with_bucket("idem").await;

        let upload = |content: &'static [u8]| {
            let server = server.clone();
            let bucket = bucket.clone();
            async move {
                let resp = server
                    .upload(&bucket, "x.txt", "text/plain", content)
                    .await
                    .unwrap_or_else(|e| panic!("upload failed: {e}"));
                expect_json(resp, StatusCode::OK)
                    .await
                    .unwrap_or_else(|e| panic!("upload failed: {e}"))
            }
        };

        let first = upload(b"0123456789").await;
        let second = upload(b"0123456789").await;
        assert_eq!(first["generation"], second["generation"]);

        let third = upload(b"9876543210").await;
        let generation = |v: &serde_json::Value| -> i64 {
            v["generation"]
                .as_str()
                .and_then(|g| g.parse().ok())
                .unwrap_or_else(|| panic!("generation missing: {v}"))
        };
        assert!(generation(&third) > generation(&first));
    }

    #[tokio::test]
    async fn test_should_upload_multipart_related() {
        let (server, bucket) = server_with_bucket("multi").await;
        let body = "--BOUNDARY\r\n\
                    Content-Type: application/json; charset=UTF-8\r\n\r\n\
                    {\"name\":\"docs/readme.md\",\"metadata\":{\"owner\":\"ops\"}}\r\n\
                    --BOUNDARY\r\n\
                    Content-Type: text/markdown\r\n\r\n\
                    # title\r\n\
                    --BOUNDARY--\r\n";

        let resp = server
            .client
            .post(server.url(&format!(
                "/upload/storage/v1/b/{bucket}/o?uploadType=multipart"
            )))
            .header(CONTENT_TYPE, "multipart/related; boundary=BOUNDARY")
            .body(body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        let object = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));
        assert_eq!(object["name"], "docs/readme.md");
        assert_eq!(object["contentType"], "text/markdown");
        assert_eq!(object["size"], "7");
        assert_eq!(object["metadata"]["owner"], "ops");
    }

    #[tokio::test]
    async fn test_should_list_with_delimiter() {
        let (server, bucket) = server_with_bucket("list").await;
        for name in ["root.txt", "f/1.txt", "f/2.txt"] {
            let resp = server
                .upload(&bucket, name, "text/plain", b"x")
                .await
                .unwrap_or_else(|e| panic!("upload failed: {e}"));
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = server
            .get(&format!("/storage/v1/b/{bucket}/o?delimiter=/"))
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        let list = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert_eq!(list["kind"], "storage#objects");
        let names: Vec<_> = list["items"]
            .as_array()
            .unwrap_or_else(|| panic!("items missing: {list}"))
            .iter()
            .map(|o| o["name"].as_str().unwrap_or_default().to_owned())
            .collect();
        assert_eq!(names, ["root.txt"]);
        assert_eq!(list["prefixes"], serde_json::json!(["f/"]));

        let resp = server
            .get(&format!("/storage/v1/b/{bucket}/o?prefix=f/"))
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        let list = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert_eq!(list["items"][0]["name"], "f/1.txt");
        assert_eq!(list["items"][1]["name"], "f/2.txt");
    }

    #[tokio::test]
    async fn test_should_update_object_metadata() {
        let (server, bucket) = server_with_bucket("meta").await;
        server
            .upload(&bucket, "doc", "text/plain", b"x")
            .await
            .unwrap_or_else(|e| panic!("upload failed: {e}"));

        let resp = server
            .send_json(
                reqwest::Method::PUT,
                &format!("/storage/v1/b/{bucket}/o/doc"),
                &serde_json::json!({ "contentType": "text/html", "metadata": { "k": "v" } }),
            )
            .await
            .unwrap_or_else(|e| panic!("update failed: {e}"));
        let object = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("update failed: {e}"));
        assert_eq!(object["contentType"], "text/html");
        assert_eq!(object["metadata"]["k"], "v");
        assert_eq!(object["metageneration"], "2");
    }
}
