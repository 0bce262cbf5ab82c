//! GcpStack Server - object storage and database admin emulator.
//!
//! This binary serves the storage JSON API and the database admin REST API
//! from one in-memory dataset built on `gcpstack-emulator`. It exposes a
//! health endpoint for orchestration systems and drains in-flight requests
//! on shutdown.
//!
//! # Usage
//!
//! ```text
//! PORT=8080 PROJECT_ID=playground gcpstack-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LISTEN_HOST` | `0.0.0.0` | Bind host |
//! | `PORT` | `8080` | Bind port |
//! | `PROJECT_ID` | `playground` | Project every resource is scoped to |
//! | `PROJECT_NUMBER` | `123456789012` | Numeric project id in responses |
//! | `EXTERNAL_URL` | `http://localhost:<PORT>` | Base URL for `selfLink`s |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `SHUTDOWN_TIMEOUT` | `30s` | Drain deadline on shutdown |
//! | `READ_TIMEOUT` | `15s` | Request head and body read deadline |
//! | `WRITE_TIMEOUT` | `15s` | Response production deadline |
//! | `IDLE_TIMEOUT` | `60s` | Keep-alive connection idle bound |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod idle;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gcpstack_core::{GcpStackConfig, LogFormat};
use gcpstack_emulator::{GcpEmulator, GcpEmulatorHandler, GcpStore};
use gcpstack_http::dispatch::GcpHandler;
use gcpstack_http::service::{GcpHttpConfig, GcpHttpService};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;

use crate::idle::{IdleTracked, IdleTracker};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(())
}

/// Build the [`GcpHttpConfig`] from the application [`GcpStackConfig`].
fn build_http_config(config: &GcpStackConfig) -> GcpHttpConfig {
    GcpHttpConfig {
        read_timeout: config.read_timeout,
        write_timeout: config.write_timeout,
        ..GcpHttpConfig::default()
    }
}

/// Connection-level deadlines applied by the accept loop.
#[derive(Debug, Clone, Copy)]
struct ServerTimeouts {
    shutdown: Duration,
    read: Duration,
    idle: Duration,
}

impl ServerTimeouts {
    fn from_config(config: &GcpStackConfig) -> Self {
        Self {
            shutdown: config.shutdown_timeout,
            read: config.read_timeout,
            idle: config.idle_timeout,
        }
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
///
/// Connections with no request in flight are closed after the idle timeout.
/// In-flight requests get the shutdown timeout to finish once the signal arrives.
async fn serve<H: GcpHandler>(
    listener: TcpListener,
    service: GcpHttpService<H>,
    timeouts: ServerTimeouts,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let mut http = HttpConnBuilder::new(TokioExecutor::new());
    http.http1()
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read);

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let tracker = Arc::new(IdleTracker::new());
                let svc = IdleTracked::new(service.clone(), Arc::clone(&tracker));
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());
                let idle = timeouts.idle;

                tokio::spawn(async move {
                    tokio::select! {
                        result = conn => {
                            if let Err(e) = result {
                                error!(peer_addr = %peer_addr, error = %e, "connection error");
                            }
                        }
                        () = tracker.expired(idle) => {
                            debug!(peer_addr = %peer_addr, "closing idle connection");
                        }
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests, up to the deadline.
    if tokio::time::timeout(timeouts.shutdown, graceful.shutdown())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = timeouts.shutdown.as_secs(),
            "shutdown deadline exceeded, abandoning open connections"
        );
    } else {
        info!("all connections drained");
    }

    Ok(())
}

/// Perform a health check by connecting to the server and requesting `/health`.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(response: &str) -> bool {
    response.contains("200 OK") && response.contains("\"status\":\"ok\"")
}

/// Address the health check dials: a wildcard bind is reached via loopback.
fn health_check_addr(config: &GcpStackConfig) -> String {
    config.listen_addr().replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GcpStackConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&health_check_addr(&config)).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level, config.log_format)?;

    info!(
        listen = %config.listen_addr(),
        project_id = %config.project_id,
        external_url = %config.external_url,
        version = VERSION,
        "starting GcpStack Server",
    );

    let http_config = build_http_config(&config);
    let timeouts = ServerTimeouts::from_config(&config);
    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen_addr()))?;

    let emulator = Arc::new(GcpEmulator::new(config));
    let store: Arc<GcpStore> = Arc::clone(emulator.store());
    let handler = GcpEmulatorHandler::from_emulator(emulator);
    let service = GcpHttpService::new(handler, http_config);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service, timeouts).await?;

    store.reset();
    info!("exiting");
    Ok(())
}
