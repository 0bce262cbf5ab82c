//! Configuration management for GcpStack.
//!
//! All configuration is driven by environment variables. Every variable is
//! optional; unparseable values fall back to the default and emit a warning.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::types::ProjectId;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON document per event.
    Json,
}

impl LogFormat {
    /// Parse a format name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" | "plain" | "pretty" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Global GcpStack configuration.
///
/// # Examples
///
/// ```
/// use gcpstack_core::GcpStackConfig;
///
/// let config = GcpStackConfig::default();
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.project_id.as_str(), "playground");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GcpStackConfig {
    /// Host the listener binds to.
    #[builder(default = String::from("0.0.0.0"))]
    pub listen_host: String,

    /// Port the listener binds to.
    #[builder(default = 8080)]
    pub port: u16,

    /// The single project identity every resource is scoped to.
    #[builder(default)]
    pub project_id: ProjectId,

    /// Project number emitted on bucket records.
    #[builder(default = 123_456_789_012)]
    pub project_number: u64,

    /// Base URL used when building `selfLink`-style fields.
    #[builder(default = String::from("http://localhost:8080"))]
    pub external_url: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Tracing output format.
    #[builder(default)]
    pub log_format: LogFormat,

    /// Upper bound on draining in-flight requests at shutdown.
    #[builder(default = Duration::from_secs(30))]
    pub shutdown_timeout: Duration,

    /// Timeout for reading request headers and bodies.
    #[builder(default = Duration::from_secs(15))]
    pub read_timeout: Duration,

    /// Timeout for producing a response once the request head is read.
    #[builder(default = Duration::from_secs(15))]
    pub write_timeout: Duration,

    /// How long a keep-alive connection may sit without a request.
    #[builder(default = Duration::from_secs(60))]
    pub idle_timeout: Duration,
}

impl Default for GcpStackConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GcpStackConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LISTEN_HOST` | `0.0.0.0` |
    /// | `PORT` | `8080` |
    /// | `PROJECT_ID` | `playground` |
    /// | `PROJECT_NUMBER` | `123456789012` |
    /// | `EXTERNAL_URL` | `http://localhost:<PORT>` |
    /// | `LOG_LEVEL` | `info` |
    /// | `LOG_FORMAT` | `text` |
    /// | `SHUTDOWN_TIMEOUT` | `30s` |
    /// | `READ_TIMEOUT` | `15s` |
    /// | `WRITE_TIMEOUT` | `15s` |
    /// | `IDLE_TIMEOUT` | `60s` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("LISTEN_HOST") {
            config.listen_host = v;
        }
        if let Some(v) = lookup("PORT") {
            match v.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid PORT"),
            }
        }
        if let Some(v) = lookup("PROJECT_ID") {
            match ProjectId::new(v) {
                Ok(project) => config.project_id = project,
                Err(e) => tracing::warn!(error = %e, "ignoring invalid PROJECT_ID"),
            }
        }
        if let Some(v) = lookup("PROJECT_NUMBER") {
            match v.parse::<u64>() {
                Ok(n) => config.project_number = n,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid PROJECT_NUMBER"),
            }
        }
        config.external_url = lookup("EXTERNAL_URL").map_or_else(
            || format!("http://localhost:{}", config.port),
            |v| v.trim_end_matches('/').to_owned(),
        );
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            match LogFormat::parse(&v) {
                Some(format) => config.log_format = format,
                None => tracing::warn!(value = %v, "ignoring invalid LOG_FORMAT"),
            }
        }
        for (key, slot) in [
            ("SHUTDOWN_TIMEOUT", &mut config.shutdown_timeout),
            ("READ_TIMEOUT", &mut config.read_timeout),
            ("WRITE_TIMEOUT", &mut config.write_timeout),
            ("IDLE_TIMEOUT", &mut config.idle_timeout),
        ] {
            if let Some(v) = lookup(key) {
                match parse_duration(&v) {
                    Some(d) => *slot = d,
                    None => tracing::warn!(value = %v, "ignoring invalid {key}"),
                }
            }
        }

        config
    }

    /// The `host:port` the listener binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.port)
    }
}

/// Parse a duration such as `30`, `30s`, `500ms`, `2m` or `1h`.
///
/// A bare number is taken as seconds.
#[must_use]
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().ok()?;

    match unit.trim() {
        "" | "s" | "sec" | "secs" => Some(Duration::from_secs(amount)),
        "ms" => Some(Duration::from_millis(amount)),
        "m" | "min" => Some(Duration::from_secs(amount.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(amount.checked_mul(3600)?)),
        _ => None,
    }
}
