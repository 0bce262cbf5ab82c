//! Instance operations. Mutations answer with the recorded operation.

use gcpstack_model::GcpError;
use gcpstack_model::sql::{
    DatabaseInstance, InstanceInsertRequest, InstancePatch, InstancesList, Operation,
};
use tracing::debug;

use crate::error::EmulatorError;
use crate::provider::GcpEmulator;
use crate::validation::require_non_empty;

impl GcpEmulator {
    /// List instances sorted by name.
    pub(crate) fn handle_list_instances(&self) -> InstancesList {
        InstancesList::new(self.store.list_instances())
    }

    /// Create an instance together with its default database and root user.
    pub(crate) fn handle_insert_instance(
        &self,
        req: InstanceInsertRequest,
    ) -> Result<Operation, GcpError> {
        require_non_empty("name", &req.name)?;
        let operation = self.store.create_instance(req)?;
        debug!(
            instance = %operation.target_id,
            operation = %operation.name,
            "insert_instance completed"
        );
        Ok(operation)
    }

    /// Get an instance.
    pub(crate) fn handle_get_instance(&self, name: &str) -> Result<DatabaseInstance, GcpError> {
        self.store.get_instance(name).ok_or_else(|| {
            EmulatorError::NoSuchInstance {
                instance: name.to_owned(),
            }
            .into()
        })
    }

    /// Merge a patch into an instance. `PATCH` and `PUT` both land here.
    pub(crate) fn handle_patch_instance(
        &self,
        name: &str,
        patch: InstancePatch,
    ) -> Result<Operation, GcpError> {
        let operation = self.store.update_instance(name, patch)?;
        debug!(instance = %name, operation = %operation.name, "patch_instance completed");
        Ok(operation)
    }

    /// Delete an instance unless it is deletion-protected.
    pub(crate) fn handle_delete_instance(&self, name: &str) -> Result<Operation, GcpError> {
        let operation = self.store.delete_instance(name)?;
        debug!(instance = %name, operation = %operation.name, "delete_instance completed");
        Ok(operation)
    }
}
