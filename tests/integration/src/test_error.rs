//! Error envelope and HTTP surface integration tests.

#[cfg(test)]
mod tests {
    use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, VARY};
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use crate::{TestServer, expect_error, expect_json, sql_path};

    async fn server() -> TestServer {
        TestServer::start()
            .await
            .unwrap_or_else(|e| panic!("server failed to start: {e}"))
    }

    #[tokio::test]
    async fn test_should_report_health() {
        let server = server().await;
        let resp = server
            .get("/health")
            .await
            .unwrap_or_else(|e| panic!("health failed: {e}"));
        let body = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("health failed: {e}"));
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_should_send_json_headers() {
        let server = server().await;
        let resp = server
            .get("/storage/v1/b")
            .await
            .unwrap_or_else(|e| panic!("list failed: {e}"));
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json; charset=UTF-8");
        assert_eq!(
            headers[CACHE_CONTROL],
            "no-cache, no-store, max-age=0, must-revalidate"
        );
        assert_eq!(headers[VARY], "Origin, X-Origin");
        assert_eq!(headers["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_should_answer_cors_preflight() {
        let server = server().await;
        let resp = server
            .client
            .request(Method::OPTIONS, server.url("/storage/v1/b"))
            .send()
            .await
            .unwrap_or_else(|e| panic!("preflight failed: {e}"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert!(resp.headers().contains_key("access-control-allow-methods"));
        let body = resp
            .bytes()
            .await
            .unwrap_or_else(|e| panic!("read failed: {e}"));
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_invalid_bucket_name() {
        let server = server().await;
        for name in ["ab", "-abc", "abc-", "GoodBucket", "192.168.0.1", "googletest"] {
            let resp = server
                .post_json("/storage/v1/b", &json!({ "name": name }))
                .await
                .unwrap_or_else(|e| panic!("create failed: {e}"));
            expect_error(resp, StatusCode::BAD_REQUEST, "invalid")
                .await
                .unwrap_or_else(|e| panic!("{name} should be rejected: {e}"));
        }
    }

    #[tokio::test]
    async fn test_should_reject_object_name_that_is_not_utf8() {
        let server = server().await;
        let resp = server
            .get("/storage/v1/b/any-bucket/o/%FF")
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        expect_error(resp, StatusCode::BAD_REQUEST, "invalid")
            .await
            .unwrap_or_else(|e| panic!("non-UTF-8 name: {e}"));
    }

    #[tokio::test]
    async fn test_should_reject_malformed_json() {
        let server = server().await;
        let resp = server
            .client
            .post(server.url("/storage/v1/b"))
            .header(CONTENT_TYPE, "application/json")
            .body("{\"name\":")
            .send()
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        expect_error(resp, StatusCode::BAD_REQUEST, "parseError")
            .await
            .unwrap_or_else(|e| panic!("malformed body: {e}"));
    }

    #[tokio::test]
    async fn test_should_return_storage_not_found_envelope() {
        let server = server().await;
        let resp = server
            .get("/storage/v1/b/missing-bucket")
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        let body = expect_error(resp, StatusCode::NOT_FOUND, "notFound")
            .await
            .unwrap_or_else(|e| panic!("missing bucket: {e}"));
        assert_eq!(body["error"]["errors"][0]["domain"], "global");
        assert!(body["error"].get("status").is_none());
    }

    #[tokio::test]
    async fn test_should_return_sql_not_found_envelope() {
        let server = server().await;
        let resp = server
            .get(&sql_path("/instances/ghost"))
            .await
            .unwrap_or_else(|e| panic!("get failed: {e}"));
        let body = expect_error(resp, StatusCode::NOT_FOUND, "notFound")
            .await
            .unwrap_or_else(|e| panic!("missing instance: {e}"));
        assert_eq!(body["error"]["status"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_should_reject_unsupported_method() {
        let server = server().await;
        let resp = server
            .client
            .request(Method::PATCH, server.url("/storage/v1/b"))
            .send()
            .await
            .unwrap_or_else(|e| panic!("request failed: {e}"));
        expect_error(resp, StatusCode::METHOD_NOT_ALLOWED, "methodNotAllowed")
            .await
            .unwrap_or_else(|e| panic!("wrong method: {e}"));
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_unknown_route() {
        let server = server().await;
        let resp = server
            .get("/storage/v2/nothing")
            .await
            .unwrap_or_else(|e| panic!("request failed: {e}"));
        expect_error(resp, StatusCode::NOT_FOUND, "notFound")
            .await
            .unwrap_or_else(|e| panic!("unknown route: {e}"));
    }
}
