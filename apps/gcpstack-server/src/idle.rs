//! Keep-alive idle bound for a single connection.
//!
//! Each accepted connection gets an [`IdleTracker`]. Its service is wrapped in
//! [`IdleTracked`], which marks requests as they start and finish, and the
//! connection task races the hyper connection against [`IdleTracker::expired`].
//! A connection with a request in flight is never considered idle.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hyper::service::Service;
use parking_lot::Mutex;
use tokio::time::Instant;

/// Request activity on one connection.
#[derive(Debug)]
pub(crate) struct IdleTracker {
    in_flight: AtomicUsize,
    last_active: Mutex<Instant>,
}

impl IdleTracker {
    pub(crate) fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            last_active: Mutex::new(Instant::now()),
        }
    }

    /// Mark a request as started. The returned guard marks it finished on drop.
    pub(crate) fn begin(self: &Arc<Self>) -> RequestGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Resolves once no request has been in flight for `idle`.
    pub(crate) async fn expired(&self, idle: Duration) {
        loop {
            if self.in_flight.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(idle).await;
                continue;
            }
            let deadline = *self.last_active.lock() + idle;
            if Instant::now() >= deadline {
                return;
            }
            tokio::time::sleep_until(deadline).await;
        }
    }
}

/// Marks one request as finished when dropped.
#[derive(Debug)]
pub(crate) struct RequestGuard {
    tracker: Arc<IdleTracker>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        *self.tracker.last_active.lock() = Instant::now();
        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A service that reports its requests to an [`IdleTracker`].
#[derive(Debug, Clone)]
pub(crate) struct IdleTracked<S> {
    inner: S,
    tracker: Arc<IdleTracker>,
}

impl<S> IdleTracked<S> {
    pub(crate) fn new(inner: S, tracker: Arc<IdleTracker>) -> Self {
        Self { inner, tracker }
    }
}

impl<S, R> Service<R> for IdleTracked<S>
where
    S: Service<R>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: R) -> Self::Future {
        let guard = self.tracker.begin();
        let fut = self.inner.call(req);
        Box::pin(async move {
            let result = fut.await;
            drop(guard);
            result
        })
    }
}
