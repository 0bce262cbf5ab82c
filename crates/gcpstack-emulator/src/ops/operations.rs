//! Operation log queries.

use gcpstack_model::GcpError;
use gcpstack_model::sql::{Operation, OperationsList};

use crate::error::EmulatorError;
use crate::provider::GcpEmulator;

impl GcpEmulator {
    /// List operations newest first, optionally for one instance.
    pub(crate) fn handle_list_operations(&self, instance: Option<&str>) -> OperationsList {
        OperationsList::new(self.store.list_operations(instance))
    }

    pub(crate) fn handle_get_operation(&self, name: &str) -> Result<Operation, GcpError> {
        self.store.get_operation(name).ok_or_else(|| {
            EmulatorError::NoSuchOperation {
                operation: name.to_owned(),
            }
            .into()
        })
    }
}
