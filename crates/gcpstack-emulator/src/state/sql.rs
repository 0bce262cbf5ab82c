//! Instances, databases, and users.
//!
//! Every successful mutation here appends one completed operation inside the
//! same write-lock critical section and returns it.

use std::collections::BTreeMap;

use gcpstack_model::sql::{
    DEFAULT_CHARSET, DEFAULT_COLLATION, DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_VERSION,
    DEFAULT_REGION, DEFAULT_USER_HOST, DEFAULT_USER_NAME, DEFAULT_USER_TYPE, Database,
    DatabaseInsertRequest, DatabaseInstance, DatabasePatch, InstanceInsertRequest, InstancePatch,
    InstanceState, IpMapping, Operation, OperationType, Settings, User, UserInsertRequest,
    UserUpdateRequest,
};
use tracing::debug;

use super::{GcpStore, StoreContext, StoreInner};
use crate::error::EmulatorError;
use crate::utils::{generate_etag, generate_numeric_suffix};

/// Users are keyed by `(name, host)`.
pub type UserKey = (String, String);

/// An instance with the databases and users it owns.
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    /// The instance resource.
    pub instance: DatabaseInstance,
    /// Internal lifecycle state. Clients always see `RUNNABLE`.
    pub state: InstanceState,
    /// Databases keyed by name.
    pub databases: BTreeMap<String, Database>,
    /// Users keyed by `(name, host)`.
    pub users: BTreeMap<UserKey, User>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn no_such_instance(instance: &str) -> EmulatorError {
    EmulatorError::NoSuchInstance {
        instance: instance.to_owned(),
    }
}

fn instance_mut<'a>(
    inner: &'a mut StoreInner,
    instance: &str,
) -> Result<&'a mut InstanceRecord, EmulatorError> {
    inner
        .instances
        .get_mut(instance)
        .ok_or_else(|| no_such_instance(instance))
}

fn new_database(ctx: &StoreContext, instance: &str, req: DatabaseInsertRequest) -> Database {
    Database {
        kind: Database::KIND.to_owned(),
        self_link: ctx.links.database(&ctx.project_id, instance, &req.name),
        name: req.name,
        instance: instance.to_owned(),
        project: ctx.project_id.clone(),
        charset: non_empty(req.charset).unwrap_or_else(|| DEFAULT_CHARSET.to_owned()),
        collation: non_empty(req.collation).unwrap_or_else(|| DEFAULT_COLLATION.to_owned()),
        etag: generate_etag(),
    }
}

fn new_user(ctx: &StoreContext, instance: &str, req: UserInsertRequest) -> User {
    User {
        kind: User::KIND.to_owned(),
        name: req.name,
        host: non_empty(req.host).unwrap_or_else(|| DEFAULT_USER_HOST.to_owned()),
        instance: instance.to_owned(),
        project: ctx.project_id.clone(),
        user_type: non_empty(req.user_type).unwrap_or_else(|| DEFAULT_USER_TYPE.to_owned()),
        etag: generate_etag(),
        password: req.password,
    }
}

/// Find the key of a user by name and optional host.
///
/// Without a host, the `%` wildcard entry is preferred, then the first host
/// in order.
fn resolve_user_key(
    users: &BTreeMap<UserKey, User>,
    instance: &str,
    name: &str,
    host: Option<&str>,
) -> Result<UserKey, EmulatorError> {
    let not_found = || EmulatorError::NoSuchUser {
        instance: instance.to_owned(),
        name: name.to_owned(),
        host: host.unwrap_or(DEFAULT_USER_HOST).to_owned(),
    };

    match host {
        Some(host) => {
            let key = (name.to_owned(), host.to_owned());
            users.contains_key(&key).then_some(key).ok_or_else(not_found)
        }
        None => {
            let wildcard = (name.to_owned(), DEFAULT_USER_HOST.to_owned());
            if users.contains_key(&wildcard) {
                return Ok(wildcard);
            }
            users
                .keys()
                .find(|(n, _)| n == name)
                .cloned()
                .ok_or_else(not_found)
        }
    }
}

impl GcpStore {
    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    /// Create an instance with its default database and root user.
    pub fn create_instance(&self, req: InstanceInsertRequest) -> Result<Operation, EmulatorError> {
        let ctx = &self.ctx;
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        if inner.instances.contains_key(&req.name) {
            return Err(EmulatorError::InstanceAlreadyExists { instance: req.name });
        }

        let tick = inner.clock.tick();
        let ip = inner.allocate_ip();

        let region = non_empty(req.region).unwrap_or_else(|| DEFAULT_REGION.to_owned());
        let mut settings = Settings::default();
        if let Some(patch) = req.settings {
            patch.apply_to(&mut settings);
        }

        let name = req.name;
        let instance = DatabaseInstance {
            kind: DatabaseInstance::KIND.to_owned(),
            name: name.clone(),
            project: ctx.project_id.clone(),
            database_version: non_empty(req.database_version)
                .unwrap_or_else(|| DEFAULT_DATABASE_VERSION.to_owned()),
            gce_zone: non_empty(req.gce_zone).unwrap_or_else(|| format!("{region}-a")),
            connection_name: format!("{}:{region}:{name}", ctx.project_id),
            region,
            // Provisioning completes synchronously.
            state: InstanceState::Runnable.external().to_owned(),
            backend_type: "SECOND_GEN".to_owned(),
            instance_type: "CLOUD_SQL_INSTANCE".to_owned(),
            ip_addresses: vec![IpMapping {
                ip_type: "PRIMARY".to_owned(),
                ip_address: ip.to_string(),
            }],
            settings,
            self_link: ctx.links.instance(&ctx.project_id, &name),
            service_account_email_address: format!(
                "p{}-{}@gcp-sa-cloud-sql.iam.gserviceaccount.com",
                ctx.project_number,
                generate_numeric_suffix()
            ),
            create_time: tick.time,
            etag: generate_etag(),
        };

        let database = new_database(
            ctx,
            &name,
            DatabaseInsertRequest {
                name: DEFAULT_DATABASE_NAME.to_owned(),
                ..Default::default()
            },
        );
        let root = new_user(
            ctx,
            &name,
            UserInsertRequest {
                name: DEFAULT_USER_NAME.to_owned(),
                password: req.root_password,
                ..Default::default()
            },
        );

        debug!(
            instance = %name,
            from = InstanceState::PendingCreate.as_str(),
            to = InstanceState::Runnable.as_str(),
            "instance provisioned"
        );
        inner.instances.insert(
            name.clone(),
            InstanceRecord {
                instance,
                state: InstanceState::Runnable,
                databases: BTreeMap::from([(database.name.clone(), database)]),
                users: BTreeMap::from([((root.name.clone(), root.host.clone()), root)]),
            },
        );

        Ok(inner
            .operations
            .record(&mut inner.clock, ctx, OperationType::Create, &name))
    }

    /// Get an instance.
    #[must_use]
    pub fn get_instance(&self, name: &str) -> Option<DatabaseInstance> {
        self.inner
            .read()
            .instances
            .get(name)
            .map(|record| record.instance.clone())
    }

    /// List instances sorted by name.
    #[must_use]
    pub fn list_instances(&self) -> Vec<DatabaseInstance> {
        self.inner
            .read()
            .instances
            .values()
            .map(|record| record.instance.clone())
            .collect()
    }

    /// Merge `patch` into an instance and bump its settings version.
    pub fn update_instance(
        &self,
        name: &str,
        patch: InstancePatch,
    ) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let instance = &mut instance_mut(inner, name)?.instance;

        if let Some(version) = non_empty(patch.database_version) {
            instance.database_version = version;
        }
        if let Some(settings) = patch.settings {
            settings.apply_to(&mut instance.settings);
        }
        instance.settings.settings_version += 1;
        instance.etag = generate_etag();

        Ok(inner
            .operations
            .record(&mut inner.clock, &self.ctx, OperationType::Update, name))
    }

    /// Delete an instance and everything it owns.
    pub fn delete_instance(&self, name: &str) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let record = instance_mut(inner, name)?;
        if record.instance.settings.deletion_protection_enabled {
            return Err(EmulatorError::DeletionProtected {
                instance: name.to_owned(),
            });
        }

        record.state = InstanceState::Deleting;
        if let Some(removed) = inner.instances.remove(name) {
            debug!(
                instance = %name,
                state = removed.state.as_str(),
                databases = removed.databases.len(),
                users = removed.users.len(),
                "instance removed"
            );
        }

        Ok(inner
            .operations
            .record(&mut inner.clock, &self.ctx, OperationType::Delete, name))
    }

    // -----------------------------------------------------------------------
    // Databases
    // -----------------------------------------------------------------------

    /// Create a database on an instance.
    pub fn create_database(
        &self,
        instance: &str,
        req: DatabaseInsertRequest,
    ) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let record = instance_mut(inner, instance)?;
        if record.databases.contains_key(&req.name) {
            return Err(EmulatorError::DatabaseAlreadyExists {
                instance: instance.to_owned(),
                database: req.name,
            });
        }

        let database = new_database(&self.ctx, instance, req);
        record.databases.insert(database.name.clone(), database);

        Ok(inner.operations.record(
            &mut inner.clock,
            &self.ctx,
            OperationType::CreateDatabase,
            instance,
        ))
    }

    /// Get a database.
    pub fn get_database(&self, instance: &str, name: &str) -> Result<Database, EmulatorError> {
        let inner = self.inner.read();
        let record = inner
            .instances
            .get(instance)
            .ok_or_else(|| no_such_instance(instance))?;
        record
            .databases
            .get(name)
            .cloned()
            .ok_or_else(|| EmulatorError::NoSuchDatabase {
                instance: instance.to_owned(),
                database: name.to_owned(),
            })
    }

    /// List an instance's databases sorted by name.
    pub fn list_databases(&self, instance: &str) -> Result<Vec<Database>, EmulatorError> {
        self.inner
            .read()
            .instances
            .get(instance)
            .map(|record| record.databases.values().cloned().collect())
            .ok_or_else(|| no_such_instance(instance))
    }

    /// Merge `patch` into a database.
    pub fn update_database(
        &self,
        instance: &str,
        name: &str,
        patch: DatabasePatch,
    ) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let database = instance_mut(inner, instance)?
            .databases
            .get_mut(name)
            .ok_or_else(|| EmulatorError::NoSuchDatabase {
                instance: instance.to_owned(),
                database: name.to_owned(),
            })?;

        if let Some(charset) = non_empty(patch.charset) {
            database.charset = charset;
        }
        if let Some(collation) = non_empty(patch.collation) {
            database.collation = collation;
        }
        database.etag = generate_etag();

        Ok(inner.operations.record(
            &mut inner.clock,
            &self.ctx,
            OperationType::UpdateDatabase,
            instance,
        ))
    }

    /// Delete a database.
    pub fn delete_database(&self, instance: &str, name: &str) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        instance_mut(inner, instance)?
            .databases
            .remove(name)
            .ok_or_else(|| EmulatorError::NoSuchDatabase {
                instance: instance.to_owned(),
                database: name.to_owned(),
            })?;

        Ok(inner.operations.record(
            &mut inner.clock,
            &self.ctx,
            OperationType::DeleteDatabase,
            instance,
        ))
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Create a user on an instance. The host defaults to `%`.
    pub fn create_user(
        &self,
        instance: &str,
        req: UserInsertRequest,
    ) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let record = instance_mut(inner, instance)?;

        let user = new_user(&self.ctx, instance, req);
        let key = (user.name.clone(), user.host.clone());
        if record.users.contains_key(&key) {
            return Err(EmulatorError::UserAlreadyExists {
                instance: instance.to_owned(),
                name: user.name,
                host: user.host,
            });
        }
        record.users.insert(key, user);

        Ok(inner.operations.record(
            &mut inner.clock,
            &self.ctx,
            OperationType::CreateUser,
            instance,
        ))
    }

    /// Get a user by name and optional host.
    pub fn get_user(
        &self,
        instance: &str,
        name: &str,
        host: Option<&str>,
    ) -> Result<User, EmulatorError> {
        let inner = self.inner.read();
        let record = inner
            .instances
            .get(instance)
            .ok_or_else(|| no_such_instance(instance))?;
        let key = resolve_user_key(&record.users, instance, name, host)?;
        record
            .users
            .get(&key)
            .cloned()
            .ok_or_else(|| EmulatorError::Internal(format!("user index out of sync for {name}")))
    }

    /// List an instance's users sorted by name, then host.
    pub fn list_users(&self, instance: &str) -> Result<Vec<User>, EmulatorError> {
        self.inner
            .read()
            .instances
            .get(instance)
            .map(|record| record.users.values().cloned().collect())
            .ok_or_else(|| no_such_instance(instance))
    }

    /// Update a user's password, type, or host. A host change re-keys the user.
    pub fn update_user(
        &self,
        instance: &str,
        name: &str,
        host: Option<&str>,
        req: UserUpdateRequest,
    ) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let record = instance_mut(inner, instance)?;
        let key = resolve_user_key(&record.users, instance, name, host)?;

        let new_host = non_empty(req.host).filter(|h| *h != key.1);
        if let Some(new_host) = &new_host {
            let new_key = (key.0.clone(), new_host.clone());
            if record.users.contains_key(&new_key) {
                return Err(EmulatorError::UserAlreadyExists {
                    instance: instance.to_owned(),
                    name: key.0,
                    host: new_host.clone(),
                });
            }
        }

        let Some(mut user) = record.users.remove(&key) else {
            return Err(EmulatorError::Internal(format!(
                "user index out of sync for {name}"
            )));
        };
        if let Some(new_host) = new_host {
            user.host = new_host;
        }
        if let Some(password) = req.password {
            user.password = Some(password);
        }
        if let Some(user_type) = non_empty(req.user_type) {
            user.user_type = user_type;
        }
        user.etag = generate_etag();
        record
            .users
            .insert((user.name.clone(), user.host.clone()), user);

        Ok(inner.operations.record(
            &mut inner.clock,
            &self.ctx,
            OperationType::UpdateUser,
            instance,
        ))
    }

    /// Delete a user by name and optional host.
    pub fn delete_user(
        &self,
        instance: &str,
        name: &str,
        host: Option<&str>,
    ) -> Result<Operation, EmulatorError> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        let record = instance_mut(inner, instance)?;
        let key = resolve_user_key(&record.users, instance, name, host)?;
        record.users.remove(&key);

        Ok(inner.operations.record(
            &mut inner.clock,
            &self.ctx,
            OperationType::DeleteUser,
            instance,
        ))
    }
}
