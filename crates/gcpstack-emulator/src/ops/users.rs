//! User operations.
//!
//! Users are keyed by `(name, host)`. Update and delete address the user with
//! `name` and optional `host` query parameters.

use gcpstack_model::GcpError;
use gcpstack_model::sql::{Operation, User, UserInsertRequest, UserUpdateRequest, UsersList};
use tracing::debug;

use crate::error::EmulatorError;
use crate::provider::GcpEmulator;
use crate::validation::require_non_empty;

fn required_name(name: Option<&str>) -> Result<&str, EmulatorError> {
    name.filter(|n| !n.is_empty())
        .ok_or(EmulatorError::Required { field: "name" })
}

impl GcpEmulator {
    pub(crate) fn handle_list_users(&self, instance: &str) -> Result<UsersList, GcpError> {
        Ok(UsersList::new(self.store.list_users(instance)?))
    }

    pub(crate) fn handle_insert_user(
        &self,
        instance: &str,
        req: UserInsertRequest,
    ) -> Result<Operation, GcpError> {
        require_non_empty("name", &req.name)?;
        let name = req.name.clone();
        let operation = self.store.create_user(instance, req)?;
        debug!(instance, user = %name, "insert_user completed");
        Ok(operation)
    }

    pub(crate) fn handle_get_user(
        &self,
        instance: &str,
        name: &str,
        host: Option<&str>,
    ) -> Result<User, GcpError> {
        Ok(self.store.get_user(instance, name, host)?)
    }

    pub(crate) fn handle_update_user(
        &self,
        instance: &str,
        name: Option<&str>,
        host: Option<&str>,
        req: UserUpdateRequest,
    ) -> Result<Operation, GcpError> {
        let name = required_name(name)?;
        let operation = self.store.update_user(instance, name, host, req)?;
        debug!(instance, user = name, "update_user completed");
        Ok(operation)
    }

    pub(crate) fn handle_delete_user(
        &self,
        instance: &str,
        name: Option<&str>,
        host: Option<&str>,
    ) -> Result<Operation, GcpError> {
        let name = required_name(name)?;
        let operation = self.store.delete_user(instance, name, host)?;
        debug!(instance, user = name, "delete_user completed");
        Ok(operation)
    }
}
