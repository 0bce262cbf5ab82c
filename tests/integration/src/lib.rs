//! Integration tests for the GcpStack server.
//!
//! Each test starts its own in-process server on an ephemeral loopback port,
//! backed by a fresh dataset, and drives it over real HTTP with `reqwest`.
//! Set `GCPSTACK_ENDPOINT_URL` to run the same tests against an external
//! server instead.
//!
//! ```text
//! cargo test -p gcpstack-integration
//! ```

use std::sync::Once;

use anyhow::{Context, Result};
use gcpstack_core::GcpStackConfig;
use gcpstack_emulator::{GcpEmulator, GcpEmulatorHandler};
use gcpstack_http::service::{GcpHttpConfig, GcpHttpService};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use serde_json::Value;
use tokio::net::TcpListener;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A running server and a client pointed at it.
#[derive(Debug, Clone)]
pub struct TestServer {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// HTTP client.
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start a server, or attach to `GCPSTACK_ENDPOINT_URL` when set.
    pub async fn start() -> Result<Self> {
        init_tracing();

        let base_url = match std::env::var("GCPSTACK_ENDPOINT_URL") {
            Ok(url) => url.trim_end_matches('/').to_owned(),
            Err(_) => spawn_server().await?,
        };

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET` a path.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    /// `DELETE` a path.
    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).send().await?)
    }

    /// Send a JSON body with the given method.
    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?)
    }

    /// `POST` a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        self.send_json(reqwest::Method::POST, path, body).await
    }

    /// Upload raw bytes as an object.
    pub async fn upload(
        &self,
        bucket: &str,
        name: &str,
        content_type: &str,
        content: &'static [u8],
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url(&format!(
                "/upload/storage/v1/b/{bucket}/o?uploadType=media&name={name}"
            )))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content)
            .send()
            .await?)
    }

    /// Create a bucket, failing the test on any non-200 answer.
    pub async fn create_bucket(&self, name: &str) -> Result<Value> {
        let resp = self
            .post_json("/storage/v1/b", &serde_json::json!({ "name": name }))
            .await?;
        expect_json(resp, reqwest::StatusCode::OK).await
    }

    /// Create an instance, returning the operation.
    pub async fn create_instance(&self, name: &str) -> Result<Value> {
        let resp = self
            .post_json(
                &sql_path("/instances"),
                &serde_json::json!({ "name": name }),
            )
            .await?;
        expect_json(resp, reqwest::StatusCode::OK).await
    }
}

/// Bind an ephemeral port and serve a fresh emulator on it.
async fn spawn_server() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    let base_url = format!("http://{addr}");

    let config = GcpStackConfig::builder()
        .listen_host("127.0.0.1".to_owned())
        .port(addr.port())
        .external_url(base_url.clone())
        .build();
    let handler = GcpEmulatorHandler::new(GcpEmulator::new(config));
    let service = GcpHttpService::new(handler, GcpHttpConfig::default());

    tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let conn = http
                .serve_connection(TokioIo::new(stream), service.clone())
                .into_owned();
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::debug!(error = %e, "test connection closed with error");
                }
            });
        }
    });

    Ok(base_url)
}

/// Prefix a path with the database admin API root.
#[must_use]
pub fn sql_path(path: &str) -> String {
    format!("/sql/v1beta4/projects/playground{path}")
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Assert the status and decode the JSON body.
pub async fn expect_json(resp: reqwest::Response, status: reqwest::StatusCode) -> Result<Value> {
    let actual = resp.status();
    let body = resp.text().await?;
    anyhow::ensure!(
        actual == status,
        "expected {status}, got {actual}: {body}"
    );
    serde_json::from_str(&body).with_context(|| format!("invalid JSON body: {body}"))
}

/// Assert an error response: status, envelope shape, and reason.
pub async fn expect_error(
    resp: reqwest::Response,
    status: reqwest::StatusCode,
    reason: &str,
) -> Result<Value> {
    let body = expect_json(resp, status).await?;
    let error = &body["error"];
    anyhow::ensure!(
        error["code"] == u64::from(status.as_u16()),
        "envelope code mismatch: {body}"
    );
    anyhow::ensure!(
        error["errors"][0]["reason"] == reason,
        "expected reason {reason}: {body}"
    );
    Ok(body)
}

mod test_bucket;
mod test_error;
mod test_object;
mod test_sql;
