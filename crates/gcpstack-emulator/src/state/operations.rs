//! The operation log.
//!
//! Every successful instance, database, or user mutation appends exactly one
//! completed [`Operation`]. Entries are appended in clock order, so walking
//! the log backwards yields newest first.

use gcpstack_model::sql::{Operation, OperationStatus, OperationType};

use super::{GcpStore, StoreContext};
use crate::utils::MonotonicClock;

/// Caller identity recorded on operations.
const OPERATION_USER: &str = "user@example.com";

/// Append-only record of completed operations.
#[derive(Debug, Default)]
pub struct OperationLog {
    entries: Vec<Operation>,
}

impl OperationLog {
    /// Build, store, and return a completed operation against `instance`.
    pub(crate) fn record(
        &mut self,
        clock: &mut MonotonicClock,
        ctx: &StoreContext,
        operation_type: OperationType,
        instance: &str,
    ) -> Operation {
        let tick = clock.tick();
        let name = format!("operation-{}", tick.nanos);
        let operation = Operation {
            kind: Operation::KIND.to_owned(),
            self_link: ctx.links.operation(&ctx.project_id, &name),
            name,
            operation_type: operation_type.as_str().to_owned(),
            status: OperationStatus::Done.external().to_owned(),
            target_id: instance.to_owned(),
            target_project: ctx.project_id.clone(),
            target_link: ctx.links.instance(&ctx.project_id, instance),
            user: OPERATION_USER.to_owned(),
            insert_time: tick.time,
            start_time: tick.time,
            end_time: tick.time,
        };
        self.entries.push(operation.clone());
        operation
    }

    /// Look up an operation by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.entries.iter().find(|op| op.name == name)
    }

    /// Operations newest first, optionally only those targeting `instance`.
    #[must_use]
    pub fn list(&self, instance: Option<&str>) -> Vec<Operation> {
        self.entries
            .iter()
            .rev()
            .filter(|op| instance.is_none_or(|i| op.target_id == i))
            .cloned()
            .collect()
    }

    /// Number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GcpStore {
    /// Get an operation by name.
    #[must_use]
    pub fn get_operation(&self, name: &str) -> Option<Operation> {
        self.inner.read().operations.get(name).cloned()
    }

    /// List operations newest first, optionally filtered by target instance.
    #[must_use]
    pub fn list_operations(&self, instance: Option<&str>) -> Vec<Operation> {
        self.inner.read().operations.list(instance)
    }

    /// Total number of recorded operations.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.inner.read().operations.len()
    }
}
