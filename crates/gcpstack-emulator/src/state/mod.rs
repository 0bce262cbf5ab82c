//! The in-memory dataset.
//!
//! [`GcpStore`] owns every record behind a single [`parking_lot::RwLock`].
//! Reads take the shared lock and clone what they return; mutations take the
//! exclusive lock for the whole check-then-write sequence, so every store
//! operation is atomic. The lock is never held across an `.await`: callers
//! read the request body first and only then enter the store.
//!
//! The store is split by resource family:
//!
//! - [`storage`]: buckets and objects
//! - [`sql`]: instances with their databases and users
//! - [`operations`]: the log of completed operations

pub mod operations;
pub mod sql;
pub mod storage;

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use gcpstack_core::GcpStackConfig;
use gcpstack_model::sql::{Database, DatabaseInstance, Operation, User};
use gcpstack_model::storage::{Bucket, Object};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use self::operations::OperationLog;
use self::sql::InstanceRecord;
use self::storage::BucketRecord;
use crate::utils::{Links, MonotonicClock};

/// First host number handed out on the synthetic `10.0.0.0/8` network.
const FIRST_HOST: u32 = 2;

/// Identity and addressing the store stamps onto records.
#[derive(Debug, Clone)]
pub struct StoreContext {
    /// Configured project id.
    pub project_id: String,
    /// Configured project number.
    pub project_number: u64,
    /// Link builder rooted at the external URL.
    pub links: Links,
}

impl StoreContext {
    /// Derive the context from the global configuration.
    #[must_use]
    pub fn from_config(config: &GcpStackConfig) -> Self {
        Self {
            project_id: config.project_id.as_str().to_owned(),
            project_number: config.project_number,
            links: Links::new(&config.external_url),
        }
    }
}

/// Everything behind the lock.
#[derive(Debug, Default)]
pub(crate) struct StoreInner {
    pub(crate) buckets: BTreeMap<String, BucketRecord>,
    pub(crate) instances: BTreeMap<String, InstanceRecord>,
    pub(crate) operations: OperationLog,
    pub(crate) clock: MonotonicClock,
    pub(crate) next_host: u32,
}

impl StoreInner {
    /// Allocate the next synthetic private address.
    pub(crate) fn allocate_ip(&mut self) -> Ipv4Addr {
        let host = self.next_host.max(FIRST_HOST);
        self.next_host = host + 1;
        Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 0, 0, 0)) + host)
    }
}

/// The single coherent dataset.
#[derive(Debug)]
pub struct GcpStore {
    pub(crate) inner: RwLock<StoreInner>,
    pub(crate) ctx: StoreContext,
}

impl GcpStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            ctx,
        }
    }

    /// Create an empty store from the global configuration.
    #[must_use]
    pub fn from_config(config: &GcpStackConfig) -> Self {
        Self::new(StoreContext::from_config(config))
    }

    /// The identity stamped onto records.
    #[must_use]
    pub fn context(&self) -> &StoreContext {
        &self.ctx
    }

    /// A read-only copy of every record, without object content.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read();
        StoreSnapshot {
            buckets: inner
                .buckets
                .values()
                .map(|record| BucketSnapshot {
                    bucket: record.bucket.clone(),
                    objects: record.objects.values().map(|o| o.meta.clone()).collect(),
                })
                .collect(),
            instances: inner
                .instances
                .values()
                .map(|record| InstanceSnapshot {
                    instance: record.instance.clone(),
                    databases: record.databases.values().cloned().collect(),
                    users: record.users.values().cloned().collect(),
                })
                .collect(),
            operations: inner.operations.list(None),
        }
    }

    /// Drop every record.
    ///
    /// The clock survives, so generations issued after a reset never repeat
    /// ones handed out before it.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        let buckets = inner.buckets.len();
        let instances = inner.instances.len();
        let clock = std::mem::take(&mut inner.clock);
        *inner = StoreInner {
            clock,
            ..StoreInner::default()
        };
        info!(buckets, instances, "store reset");
    }
}

/// Read-only view of the dataset for dashboard consumers.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Buckets sorted by name, each with its objects sorted by name.
    pub buckets: Vec<BucketSnapshot>,
    /// Instances sorted by name, each with its databases and users.
    pub instances: Vec<InstanceSnapshot>,
    /// Operations, newest first.
    pub operations: Vec<Operation>,
}

/// A bucket and its object metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSnapshot {
    /// The bucket.
    pub bucket: Bucket,
    /// Its objects.
    pub objects: Vec<Object>,
}

/// An instance and its children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSnapshot {
    /// The instance.
    pub instance: DatabaseInstance,
    /// Its databases.
    pub databases: Vec<Database>,
    /// Its users.
    pub users: Vec<User>,
}
