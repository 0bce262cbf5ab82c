//! The operations the router can resolve a request to.

use std::fmt;

/// The API family a request belongs to. Selects the error envelope flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiFamily {
    /// The object storage JSON API (`/storage/v1`, `/upload`, `/download`).
    #[default]
    Storage,
    /// The database admin API (`/sql/v1beta4`).
    Sql,
}

impl ApiFamily {
    /// Infer the family from a request path. Unknown paths fall back to storage.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        if path.starts_with("/sql/") {
            Self::Sql
        } else {
            Self::Storage
        }
    }
}

/// All supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcpOperation {
    // -- Buckets --
    /// `GET /storage/v1/b`
    ListBuckets,
    /// `POST /storage/v1/b`
    InsertBucket,
    /// `GET /storage/v1/b/{bucket}`
    GetBucket,
    /// `PATCH /storage/v1/b/{bucket}`
    PatchBucket,
    /// `PUT /storage/v1/b/{bucket}`
    UpdateBucket,
    /// `DELETE /storage/v1/b/{bucket}`
    DeleteBucket,

    // -- Objects --
    /// `GET /storage/v1/b/{bucket}/o`
    ListObjects,
    /// `POST /upload/storage/v1/b/{bucket}/o`
    InsertObject,
    /// `GET /storage/v1/b/{bucket}/o/{object...}`
    GetObject,
    /// `PATCH /storage/v1/b/{bucket}/o/{object...}`
    PatchObject,
    /// `PUT /storage/v1/b/{bucket}/o/{object...}`
    UpdateObject,
    /// `DELETE /storage/v1/b/{bucket}/o/{object...}`
    DeleteObject,
    /// `GET /download/storage/v1/b/{bucket}/o/{object...}`
    DownloadObject,

    // -- Instances --
    /// `GET .../instances`
    ListInstances,
    /// `POST .../instances`
    InsertInstance,
    /// `GET .../instances/{instance}`
    GetInstance,
    /// `PATCH .../instances/{instance}`
    PatchInstance,
    /// `PUT .../instances/{instance}`
    UpdateInstance,
    /// `DELETE .../instances/{instance}`
    DeleteInstance,

    // -- Databases --
    /// `GET .../instances/{instance}/databases`
    ListDatabases,
    /// `POST .../instances/{instance}/databases`
    InsertDatabase,
    /// `GET .../databases/{database}`
    GetDatabase,
    /// `PATCH .../databases/{database}`
    PatchDatabase,
    /// `PUT .../databases/{database}`
    UpdateDatabase,
    /// `DELETE .../databases/{database}`
    DeleteDatabase,

    // -- Users --
    /// `GET .../instances/{instance}/users`
    ListUsers,
    /// `POST .../instances/{instance}/users`
    InsertUser,
    /// `GET .../instances/{instance}/users/{user}`
    GetUser,
    /// `PUT .../instances/{instance}/users?name=&host=`
    UpdateUser,
    /// `DELETE .../instances/{instance}/users?name=&host=`
    DeleteUser,

    // -- Operations --
    /// `GET .../operations`
    ListOperations,
    /// `GET .../operations/{operation}`
    GetOperation,
}

impl GcpOperation {
    /// The API method name, as the live discovery documents spell it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListBuckets => "storage.buckets.list",
            Self::InsertBucket => "storage.buckets.insert",
            Self::GetBucket => "storage.buckets.get",
            Self::PatchBucket => "storage.buckets.patch",
            Self::UpdateBucket => "storage.buckets.update",
            Self::DeleteBucket => "storage.buckets.delete",
            Self::ListObjects => "storage.objects.list",
            Self::InsertObject => "storage.objects.insert",
            Self::GetObject => "storage.objects.get",
            Self::PatchObject => "storage.objects.patch",
            Self::UpdateObject => "storage.objects.update",
            Self::DeleteObject => "storage.objects.delete",
            Self::DownloadObject => "storage.objects.download",
            Self::ListInstances => "sql.instances.list",
            Self::InsertInstance => "sql.instances.insert",
            Self::GetInstance => "sql.instances.get",
            Self::PatchInstance => "sql.instances.patch",
            Self::UpdateInstance => "sql.instances.update",
            Self::DeleteInstance => "sql.instances.delete",
            Self::ListDatabases => "sql.databases.list",
            Self::InsertDatabase => "sql.databases.insert",
            Self::GetDatabase => "sql.databases.get",
            Self::PatchDatabase => "sql.databases.patch",
            Self::UpdateDatabase => "sql.databases.update",
            Self::DeleteDatabase => "sql.databases.delete",
            Self::ListUsers => "sql.users.list",
            Self::InsertUser => "sql.users.insert",
            Self::GetUser => "sql.users.get",
            Self::UpdateUser => "sql.users.update",
            Self::DeleteUser => "sql.users.delete",
            Self::ListOperations => "sql.operations.list",
            Self::GetOperation => "sql.operations.get",
        }
    }

    /// The API family this operation belongs to.
    #[must_use]
    pub fn family(&self) -> ApiFamily {
        if self.as_str().starts_with("sql.") {
            ApiFamily::Sql
        } else {
            ApiFamily::Storage
        }
    }

    /// Whether the operation changes the dataset.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Self::ListBuckets
                | Self::GetBucket
                | Self::ListObjects
                | Self::GetObject
                | Self::DownloadObject
                | Self::ListInstances
                | Self::GetInstance
                | Self::ListDatabases
                | Self::GetDatabase
                | Self::ListUsers
                | Self::GetUser
                | Self::ListOperations
                | Self::GetOperation
        )
    }
}

impl fmt::Display for GcpOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
