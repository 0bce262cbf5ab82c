//! Database admin integration tests.

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::{Value, json};

    use crate::{TestServer, expect_error, expect_json, sql_path};

    async fn server_with_instance(name: &str) -> (TestServer, Value) {
        let server = TestServer::start()
            .await
            .unwrap_or_else(|e| panic!("server failed to start: {e}"));
        let operation = server
            .create_instance(name)
            .await
            .unwrap_or_else(|e| panic!("create instance failed: {e}"));
        (server, operation)
    }

    async fn get_json(server: &TestServer, path: &str) -> Value {
        let resp = server
            .get(path)
            .await
            .unwrap_or_else(|e| panic!("GET {path} failed: {e}"));
        expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("GET {path} failed: {e}"))
    }

    #[tokio::test]
    async fn test_should_create_instance_with_defaults() {
        let (server, operation) = server_with_instance("db1").await;
        assert_eq!(operation["kind"], "sql#operation");
        assert_eq!(operation["operationType"], "CREATE");
        assert_eq!(operation["status"], "DONE");
        assert_eq!(operation["targetId"], "db1");

        let instance = get_json(&server, &sql_path("/instances/db1")).await;
        assert_eq!(instance["kind"], "sql#instance");
        assert_eq!(instance["state"], "RUNNABLE");
        assert_eq!(instance["databaseVersion"], "MYSQL_8_0");
        assert_eq!(instance["settings"]["kind"], "sql#settings");
        assert!(instance["settings"]["settingsVersion"].is_string());

        let databases = get_json(&server, &sql_path("/instances/db1/databases")).await;
        assert_eq!(databases["kind"], "sql#databasesList");
        assert_eq!(databases["items"][0]["name"], "mysql");

        let users = get_json(&server, &sql_path("/instances/db1/users")).await;
        assert_eq!(users["kind"], "sql#usersList");
        assert_eq!(users["items"][0]["name"], "root");
        assert_eq!(users["items"][0]["host"], "%");
    }

    #[tokio::test]
    async fn test_should_record_one_operation_per_mutation() {
        let (server, created) = server_with_instance("db1").await;

        let resp = server
            .post_json(
                &sql_path("/instances/db1/databases"),
                &json!({ "name": "app" }),
            )
            .await
            .unwrap_or_else(|e| panic!("create database failed: {e}"));
        let db_op = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("create database failed: {e}"));
        assert_eq!(db_op["operationType"], "CREATE_DATABASE");

        let resp = server
            .post_json(
                &sql_path("/instances/db1/users"),
                &json!({ "name": "app", "password": "hunter2" }),
            )
            .await
            .unwrap_or_else(|e| panic!("create user failed: {e}"));
        let user_op = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("create user failed: {e}"));
        assert_eq!(user_op["operationType"], "CREATE_USER");

        let operations = get_json(&server, &sql_path("/operations?instance=db1")).await;
        let names: Vec<_> = operations["items"]
            .as_array()
            .unwrap_or_else(|| panic!("items missing: {operations}"))
            .iter()
            .map(|op| op["name"].clone())
            .collect();
        assert_eq!(
            names,
            [
                user_op["name"].clone(),
                db_op["name"].clone(),
                created["name"].clone()
            ]
        );

        let name = created["name"].as_str().unwrap_or_default();
        let fetched = get_json(&server, &sql_path(&format!("/operations/{name}"))).await;
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_should_never_return_passwords() {
        let (server, _) = server_with_instance("db1").await;
        server
            .post_json(
                &sql_path("/instances/db1/users"),
                &json!({ "name": "app", "host": "10.0.0.1", "password": "hunter2" }),
            )
            .await
            .unwrap_or_else(|e| panic!("create user failed: {e}"));

        let user = get_json(&server, &sql_path("/instances/db1/users/app?host=10.0.0.1")).await;
        assert_eq!(user["host"], "10.0.0.1");
        assert!(user.get("password").is_none());
    }

    #[tokio::test]
    async fn test_should_update_and_delete_user_by_query() {
        let (server, _) = server_with_instance("db1").await;
        server
            .post_json(
                &sql_path("/instances/db1/users"),
                &json!({ "name": "app" }),
            )
            .await
            .unwrap_or_else(|e| panic!("create user failed: {e}"));

        let resp = server
            .send_json(
                Method::PUT,
                &sql_path("/instances/db1/users?name=app&host=%25"),
                &json!({ "host": "10.1.2.3" }),
            )
            .await
            .unwrap_or_else(|e| panic!("update user failed: {e}"));
        let op = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("update user failed: {e}"));
        assert_eq!(op["operationType"], "UPDATE_USER");

        let user = get_json(&server, &sql_path("/instances/db1/users/app?host=10.1.2.3")).await;
        assert_eq!(user["host"], "10.1.2.3");

        let resp = server
            .delete(&sql_path("/instances/db1/users?name=app&host=10.1.2.3"))
            .await
            .unwrap_or_else(|e| panic!("delete user failed: {e}"));
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = server
            .get(&sql_path("/instances/db1/users/app"))
            .await
            .unwrap_or_else(|e| panic!("get user failed: {e}"));
        expect_error(resp, StatusCode::NOT_FOUND, "notFound")
            .await
            .unwrap_or_else(|e| panic!("deleted user: {e}"));
    }

    #[tokio::test]
    async fn test_should_merge_instance_patch() {
        let (server, _) = server_with_instance("db1").await;
        let before = get_json(&server, &sql_path("/instances/db1")).await;

        let resp = server
            .send_json(
                Method::PATCH,
                &sql_path("/instances/db1"),
                &json!({ "settings": { "tier": "db-custom-2-7680" } }),
            )
            .await
            .unwrap_or_else(|e| panic!("patch failed: {e}"));
        let op = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("patch failed: {e}"));
        assert_eq!(op["operationType"], "UPDATE");

        let after = get_json(&server, &sql_path("/instances/db1")).await;
        assert_eq!(after["settings"]["tier"], "db-custom-2-7680");
        assert_eq!(
            after["settings"]["dataDiskSizeGb"],
            before["settings"]["dataDiskSizeGb"]
        );
        assert_eq!(after["region"], before["region"]);
        assert_ne!(after["etag"], before["etag"]);
    }

    #[tokio::test]
    async fn test_should_protect_instance_from_deletion() {
        let (server, _) = server_with_instance("db1").await;
        server
            .send_json(
                Method::PATCH,
                &sql_path("/instances/db1"),
                &json!({ "settings": { "deletionProtectionEnabled": true } }),
            )
            .await
            .unwrap_or_else(|e| panic!("patch failed: {e}"));

        let resp = server
            .delete(&sql_path("/instances/db1"))
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        let body = expect_error(resp, StatusCode::BAD_REQUEST, "failedPrecondition")
            .await
            .unwrap_or_else(|e| panic!("protected delete: {e}"));
        assert_eq!(body["error"]["status"], "FAILED_PRECONDITION");

        server
            .send_json(
                Method::PATCH,
                &sql_path("/instances/db1"),
                &json!({ "settings": { "deletionProtectionEnabled": false } }),
            )
            .await
            .unwrap_or_else(|e| panic!("patch failed: {e}"));
        let resp = server
            .delete(&sql_path("/instances/db1"))
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        let op = expect_json(resp, StatusCode::OK)
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        assert_eq!(op["operationType"], "DELETE");

        let resp = server
            .delete(&sql_path("/instances/db1"))
            .await
            .unwrap_or_else(|e| panic!("delete failed: {e}"));
        expect_error(resp, StatusCode::NOT_FOUND, "notFound")
            .await
            .unwrap_or_else(|e| panic!("missing instance: {e}"));
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_instance() {
        let (server, _) = server_with_instance("db1").await;
        let resp = server
            .post_json(&sql_path("/instances"), &json!({ "name": "db1" }))
            .await
            .unwrap_or_else(|e| panic!("create failed: {e}"));
        let body = expect_error(resp, StatusCode::CONFLICT, "conflict")
            .await
            .unwrap_or_else(|e| panic!("duplicate instance: {e}"));
        assert_eq!(body["error"]["status"], "ALREADY_EXISTS");
    }
}
