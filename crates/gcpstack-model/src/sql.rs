//! Database admin resources: instances, databases, users, and operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_util::{option_string_number, rfc3339, string_number};

/// Default engine version.
pub const DEFAULT_DATABASE_VERSION: &str = "MYSQL_8_0";

/// Default region.
pub const DEFAULT_REGION: &str = "us-central1";

/// Default machine tier.
pub const DEFAULT_TIER: &str = "db-f1-micro";

/// Name of the database every instance starts with.
pub const DEFAULT_DATABASE_NAME: &str = "mysql";

/// Default database charset.
pub const DEFAULT_CHARSET: &str = "utf8";

/// Default database collation.
pub const DEFAULT_COLLATION: &str = "utf8_general_ci";

/// Name of the user every instance starts with.
pub const DEFAULT_USER_NAME: &str = "root";

/// Host wildcard used when a user request omits the host.
pub const DEFAULT_USER_HOST: &str = "%";

/// Default user type.
pub const DEFAULT_USER_TYPE: &str = "BUILT_IN";

/// Instance lifecycle state.
///
/// Every state is tracked, but all work completes synchronously, so clients
/// only ever observe [`InstanceState::Runnable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstanceState {
    /// Being provisioned.
    #[default]
    PendingCreate,
    /// Serving.
    Runnable,
    /// Being torn down.
    Deleting,
}

impl InstanceState {
    /// The state string clients are shown.
    #[must_use]
    pub fn external(self) -> &'static str {
        match self {
            Self::PendingCreate | Self::Runnable | Self::Deleting => "RUNNABLE",
        }
    }

    /// The internal state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingCreate => "PENDING_CREATE",
            Self::Runnable => "RUNNABLE",
            Self::Deleting => "DELETING",
        }
    }
}

/// Operation status.
///
/// As with [`InstanceState`], only `DONE` is ever shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationStatus {
    /// Queued.
    #[default]
    Pending,
    /// In progress.
    Running,
    /// Finished.
    Done,
}

impl OperationStatus {
    /// The status string clients are shown.
    #[must_use]
    pub fn external(self) -> &'static str {
        match self {
            Self::Pending | Self::Running | Self::Done => "DONE",
        }
    }
}

/// Operation types recorded in the operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Instance created.
    Create,
    /// Instance updated.
    Update,
    /// Instance deleted.
    Delete,
    /// Database created.
    CreateDatabase,
    /// Database updated.
    UpdateDatabase,
    /// Database deleted.
    DeleteDatabase,
    /// User created.
    CreateUser,
    /// User updated.
    UpdateUser,
    /// User deleted.
    DeleteUser,
}

impl OperationType {
    /// The wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::CreateDatabase => "CREATE_DATABASE",
            Self::UpdateDatabase => "UPDATE_DATABASE",
            Self::DeleteDatabase => "DELETE_DATABASE",
            Self::CreateUser => "CREATE_USER",
            Self::UpdateUser => "UPDATE_USER",
            Self::DeleteUser => "DELETE_USER",
        }
    }
}

fn acl_entry_kind() -> String {
    AclEntry::KIND.to_owned()
}

/// An authorized network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    /// Always `sql#aclEntry`.
    #[serde(default = "acl_entry_kind")]
    pub kind: String,
    /// CIDR or address.
    pub value: String,
    /// Optional label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AclEntry {
    /// Resource kind.
    pub const KIND: &str = "sql#aclEntry";
}

/// A database flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseFlag {
    /// Flag name.
    pub name: String,
    /// Flag value.
    #[serde(default)]
    pub value: String,
}

/// An address assigned to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpMapping {
    /// `PRIMARY`.
    #[serde(rename = "type")]
    pub ip_type: String,
    /// The address.
    pub ip_address: String,
}

/// Network settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfiguration {
    /// Whether a public IPv4 address is assigned.
    pub ipv4_enabled: bool,
    /// Whether SSL is required.
    #[serde(default)]
    pub require_ssl: bool,
    /// Allowed client networks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorized_networks: Vec<AclEntry>,
}

/// Backup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfiguration {
    /// Always `sql#backupConfiguration`.
    pub kind: String,
    /// Whether backups are enabled.
    pub enabled: bool,
    /// Backup window start, `HH:MM`.
    pub start_time: String,
    /// Whether binary logging is enabled.
    pub binary_log_enabled: bool,
}

impl BackupConfiguration {
    /// Resource kind.
    pub const KIND: &str = "sql#backupConfiguration";
}

impl Default for BackupConfiguration {
    fn default() -> Self {
        Self {
            kind: Self::KIND.to_owned(),
            enabled: false,
            start_time: "00:00".to_owned(),
            binary_log_enabled: false,
        }
    }
}

/// Maintenance window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    /// Always `sql#maintenanceWindow`.
    pub kind: String,
    /// Day of week, 1-7 (0 means any).
    pub day: u8,
    /// Hour of day, 0-23.
    pub hour: u8,
}

impl MaintenanceWindow {
    /// Resource kind.
    pub const KIND: &str = "sql#maintenanceWindow";
}

impl Default for MaintenanceWindow {
    fn default() -> Self {
        Self {
            kind: Self::KIND.to_owned(),
            day: 0,
            hour: 0,
        }
    }
}

/// Instance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Always `sql#settings`.
    pub kind: String,
    /// Machine tier.
    pub tier: String,
    /// `ZONAL` or `REGIONAL`.
    pub availability_type: String,
    /// Disk size in GB.
    #[serde(with = "string_number")]
    pub data_disk_size_gb: i64,
    /// `PD_SSD` or `PD_HDD`.
    pub data_disk_type: String,
    /// `ALWAYS`, `NEVER`, `ON_DEMAND`.
    pub activation_policy: String,
    /// `PER_USE`.
    pub pricing_plan: String,
    /// Incremented on every settings change.
    #[serde(with = "string_number")]
    pub settings_version: i64,
    /// Backup window.
    pub backup_configuration: BackupConfiguration,
    /// Maintenance window.
    pub maintenance_window: MaintenanceWindow,
    /// Database flags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub database_flags: Vec<DatabaseFlag>,
    /// Blocks deletion while true.
    pub deletion_protection_enabled: bool,
    /// User labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_labels: BTreeMap<String, String>,
    /// Network settings.
    pub ip_configuration: IpConfiguration,
}

impl Settings {
    /// Resource kind.
    pub const KIND: &str = "sql#settings";
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kind: Self::KIND.to_owned(),
            tier: DEFAULT_TIER.to_owned(),
            availability_type: "ZONAL".to_owned(),
            data_disk_size_gb: 10,
            data_disk_type: "PD_SSD".to_owned(),
            activation_policy: "ALWAYS".to_owned(),
            pricing_plan: "PER_USE".to_owned(),
            settings_version: 1,
            backup_configuration: BackupConfiguration::default(),
            maintenance_window: MaintenanceWindow::default(),
            database_flags: Vec::new(),
            deletion_protection_enabled: false,
            user_labels: BTreeMap::new(),
            ip_configuration: IpConfiguration {
                ipv4_enabled: true,
                require_ssl: false,
                authorized_networks: Vec::new(),
            },
        }
    }
}

/// A database instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInstance {
    /// Always `sql#instance`.
    pub kind: String,
    /// Instance name.
    pub name: String,
    /// Owning project.
    pub project: String,
    /// Engine version.
    pub database_version: String,
    /// Region.
    pub region: String,
    /// Zone within the region.
    pub gce_zone: String,
    /// Lifecycle state, always `RUNNABLE` on the wire.
    pub state: String,
    /// `SECOND_GEN`.
    pub backend_type: String,
    /// `CLOUD_SQL_INSTANCE`.
    pub instance_type: String,
    /// `project:region:name`.
    pub connection_name: String,
    /// Assigned addresses.
    pub ip_addresses: Vec<IpMapping>,
    /// Settings.
    pub settings: Settings,
    /// Canonical URL of this resource.
    pub self_link: String,
    /// Service account the instance runs as.
    pub service_account_email_address: String,
    /// Creation time.
    #[serde(with = "rfc3339")]
    pub create_time: DateTime<Utc>,
    /// Entity tag, regenerated on every mutation.
    pub etag: String,
}

impl DatabaseInstance {
    /// Resource kind.
    pub const KIND: &str = "sql#instance";
}

/// A logical database inside an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /// Always `sql#database`.
    pub kind: String,
    /// Database name.
    pub name: String,
    /// Owning instance.
    pub instance: String,
    /// Owning project.
    pub project: String,
    /// Character set.
    pub charset: String,
    /// Collation.
    pub collation: String,
    /// Canonical URL of this resource.
    pub self_link: String,
    /// Entity tag, regenerated on every mutation.
    pub etag: String,
}

impl Database {
    /// Resource kind.
    pub const KIND: &str = "sql#database";
}

/// A database user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Always `sql#user`.
    pub kind: String,
    /// User name.
    pub name: String,
    /// Host the user may connect from, `%` for any.
    pub host: String,
    /// Owning instance.
    pub instance: String,
    /// Owning project.
    pub project: String,
    /// `BUILT_IN`, `CLOUD_IAM_USER`, ...
    #[serde(rename = "type")]
    pub user_type: String,
    /// Entity tag, regenerated on every mutation.
    pub etag: String,
    /// Accepted on write, never serialized.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl User {
    /// Resource kind.
    pub const KIND: &str = "sql#user";
}

/// A completed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Always `sql#operation`.
    pub kind: String,
    /// `operation-<nanos>`.
    pub name: String,
    /// What was done.
    pub operation_type: String,
    /// Always `DONE` on the wire.
    pub status: String,
    /// Target instance name.
    pub target_id: String,
    /// Target project.
    pub target_project: String,
    /// URL of the target instance.
    pub target_link: String,
    /// URL of this operation.
    pub self_link: String,
    /// Acting principal.
    pub user: String,
    /// Enqueue time.
    #[serde(with = "rfc3339")]
    pub insert_time: DateTime<Utc>,
    /// Start time.
    #[serde(with = "rfc3339")]
    pub start_time: DateTime<Utc>,
    /// Completion time.
    #[serde(with = "rfc3339")]
    pub end_time: DateTime<Utc>,
}

impl Operation {
    /// Resource kind.
    pub const KIND: &str = "sql#operation";
}

macro_rules! list_envelope {
    ($name:ident, $item:ty, $kind:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Resource kind.
            pub kind: String,
            /// The listed resources.
            #[serde(default, skip_serializing_if = "Vec::is_empty")]
            pub items: Vec<$item>,
        }

        impl $name {
            /// Resource kind.
            pub const KIND: &str = $kind;

            /// Wrap a list.
            #[must_use]
            pub fn new(items: Vec<$item>) -> Self {
                Self {
                    kind: Self::KIND.to_owned(),
                    items,
                }
            }
        }
    };
}

list_envelope!(
    InstancesList,
    DatabaseInstance,
    "sql#instancesList",
    "`sql#instancesList` envelope."
);
list_envelope!(
    DatabasesList,
    Database,
    "sql#databasesList",
    "`sql#databasesList` envelope."
);
list_envelope!(UsersList, User, "sql#usersList", "`sql#usersList` envelope.");
list_envelope!(
    OperationsList,
    Operation,
    "sql#operationsList",
    "`sql#operationsList` envelope."
);

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Partial backup settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfigurationPatch {
    /// Enable or disable backups.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Backup window start.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Enable or disable binary logging.
    #[serde(default)]
    pub binary_log_enabled: Option<bool>,
}

/// Partial maintenance window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindowPatch {
    /// Day of week.
    #[serde(default)]
    pub day: Option<u8>,
    /// Hour of day.
    #[serde(default)]
    pub hour: Option<u8>,
}

/// Partial network settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationPatch {
    /// Public IPv4 toggle.
    #[serde(default)]
    pub ipv4_enabled: Option<bool>,
    /// SSL requirement toggle.
    #[serde(default)]
    pub require_ssl: Option<bool>,
    /// Replacement list of authorized networks.
    #[serde(default)]
    pub authorized_networks: Option<Vec<AclEntry>>,
}

/// Partial settings, used by both insert and patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// Machine tier.
    #[serde(default)]
    pub tier: Option<String>,
    /// Availability type.
    #[serde(default)]
    pub availability_type: Option<String>,
    /// Disk size in GB.
    #[serde(default, with = "option_string_number")]
    pub data_disk_size_gb: Option<i64>,
    /// Disk type.
    #[serde(default)]
    pub data_disk_type: Option<String>,
    /// Activation policy.
    #[serde(default)]
    pub activation_policy: Option<String>,
    /// Pricing plan.
    #[serde(default)]
    pub pricing_plan: Option<String>,
    /// Backup settings.
    #[serde(default)]
    pub backup_configuration: Option<BackupConfigurationPatch>,
    /// Maintenance window.
    #[serde(default)]
    pub maintenance_window: Option<MaintenanceWindowPatch>,
    /// Replacement flag list.
    #[serde(default)]
    pub database_flags: Option<Vec<DatabaseFlag>>,
    /// Deletion protection toggle.
    #[serde(default)]
    pub deletion_protection_enabled: Option<bool>,
    /// Replacement label map.
    #[serde(default)]
    pub user_labels: Option<BTreeMap<String, String>>,
    /// Network settings.
    #[serde(default)]
    pub ip_configuration: Option<IpConfigurationPatch>,
}

fn set_if_present(target: &mut String, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        *target = v;
    }
}

impl SettingsPatch {
    /// Merge into `settings`. Absent and empty-string fields are preserved,
    /// as is a non-positive disk size.
    pub fn apply_to(self, settings: &mut Settings) {
        set_if_present(&mut settings.tier, self.tier);
        set_if_present(&mut settings.availability_type, self.availability_type);
        if let Some(size) = self.data_disk_size_gb.filter(|s| *s > 0) {
            settings.data_disk_size_gb = size;
        }
        set_if_present(&mut settings.data_disk_type, self.data_disk_type);
        set_if_present(&mut settings.activation_policy, self.activation_policy);
        set_if_present(&mut settings.pricing_plan, self.pricing_plan);

        if let Some(backup) = self.backup_configuration {
            let target = &mut settings.backup_configuration;
            if let Some(enabled) = backup.enabled {
                target.enabled = enabled;
            }
            set_if_present(&mut target.start_time, backup.start_time);
            if let Some(binlog) = backup.binary_log_enabled {
                target.binary_log_enabled = binlog;
            }
        }
        if let Some(window) = self.maintenance_window {
            if let Some(day) = window.day {
                settings.maintenance_window.day = day;
            }
            if let Some(hour) = window.hour {
                settings.maintenance_window.hour = hour;
            }
        }
        if let Some(flags) = self.database_flags {
            settings.database_flags = flags;
        }
        if let Some(protected) = self.deletion_protection_enabled {
            settings.deletion_protection_enabled = protected;
        }
        if let Some(labels) = self.user_labels {
            settings.user_labels = labels;
        }
        if let Some(ip) = self.ip_configuration {
            if let Some(v) = ip.ipv4_enabled {
                settings.ip_configuration.ipv4_enabled = v;
            }
            if let Some(v) = ip.require_ssl {
                settings.ip_configuration.require_ssl = v;
            }
            if let Some(networks) = ip.authorized_networks {
                settings.ip_configuration.authorized_networks = networks;
            }
        }
    }
}

/// Body of `POST .../instances`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInsertRequest {
    /// Instance name.
    #[serde(default)]
    pub name: String,
    /// Engine version.
    #[serde(default)]
    pub database_version: Option<String>,
    /// Region.
    #[serde(default)]
    pub region: Option<String>,
    /// Zone.
    #[serde(default)]
    pub gce_zone: Option<String>,
    /// Initial settings.
    #[serde(default)]
    pub settings: Option<SettingsPatch>,
    /// Password for the default `root` user.
    #[serde(default)]
    pub root_password: Option<String>,
}

/// Body of `PATCH`/`PUT .../instances/{instance}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancePatch {
    /// Engine version upgrade.
    #[serde(default)]
    pub database_version: Option<String>,
    /// Settings changes.
    #[serde(default)]
    pub settings: Option<SettingsPatch>,
}

/// Body of `POST .../databases`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInsertRequest {
    /// Database name.
    #[serde(default)]
    pub name: String,
    /// Character set.
    #[serde(default)]
    pub charset: Option<String>,
    /// Collation.
    #[serde(default)]
    pub collation: Option<String>,
}

/// Body of `PATCH`/`PUT .../databases/{database}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabasePatch {
    /// Character set.
    #[serde(default)]
    pub charset: Option<String>,
    /// Collation.
    #[serde(default)]
    pub collation: Option<String>,
}

/// Body of `POST .../users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInsertRequest {
    /// User name.
    #[serde(default)]
    pub name: String,
    /// Host, `%` when absent.
    #[serde(default)]
    pub host: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
    /// User type.
    #[serde(default, rename = "type")]
    pub user_type: Option<String>,
}

/// Body of `PUT .../users?name=&host=`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    /// New host; re-keys the user.
    #[serde(default)]
    pub host: Option<String>,
    /// New password.
    #[serde(default)]
    pub password: Option<String>,
    /// New user type.
    #[serde(default, rename = "type")]
    pub user_type: Option<String>,
}
