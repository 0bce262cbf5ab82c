//! Database operations.

use gcpstack_model::GcpError;
use gcpstack_model::sql::{Database, DatabaseInsertRequest, DatabasePatch, DatabasesList, Operation};
use tracing::debug;

use crate::provider::GcpEmulator;
use crate::validation::require_non_empty;

impl GcpEmulator {
    pub(crate) fn handle_list_databases(&self, instance: &str) -> Result<DatabasesList, GcpError> {
        Ok(DatabasesList::new(self.store.list_databases(instance)?))
    }

    pub(crate) fn handle_insert_database(
        &self,
        instance: &str,
        req: DatabaseInsertRequest,
    ) -> Result<Operation, GcpError> {
        require_non_empty("name", &req.name)?;
        let database = req.name.clone();
        let operation = self.store.create_database(instance, req)?;
        debug!(
            instance,
            database = %database,
            operation = %operation.name,
            "insert_database completed"
        );
        Ok(operation)
    }

    pub(crate) fn handle_get_database(
        &self,
        instance: &str,
        name: &str,
    ) -> Result<Database, GcpError> {
        Ok(self.store.get_database(instance, name)?)
    }

    pub(crate) fn handle_patch_database(
        &self,
        instance: &str,
        name: &str,
        patch: DatabasePatch,
    ) -> Result<Operation, GcpError> {
        let operation = self.store.update_database(instance, name, patch)?;
        debug!(instance, database = %name, "patch_database completed");
        Ok(operation)
    }

    pub(crate) fn handle_delete_database(
        &self,
        instance: &str,
        name: &str,
    ) -> Result<Operation, GcpError> {
        let operation = self.store.delete_database(instance, name)?;
        debug!(instance, database = %name, "delete_database completed");
        Ok(operation)
    }
}
