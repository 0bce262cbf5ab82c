//! Emulator domain errors.
//!
//! [`EmulatorError`] is what the validator and the store raise. Each variant
//! maps onto a wire [`GcpError`] through the [`From`] implementation, which
//! picks the error kind (and therefore the HTTP status and `reason`) and the
//! client-facing message.

use gcpstack_model::error::{GcpError, GcpErrorCode};

/// Emulator error type.
#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    // -----------------------------------------------------------------------
    // Validation errors
    // -----------------------------------------------------------------------
    /// The bucket name violates a naming rule.
    #[error("Invalid bucket name: '{name}'. {reason}")]
    InvalidBucketName {
        /// The rejected name.
        name: String,
        /// The first rule violated.
        reason: String,
    },

    /// A required field was missing or empty.
    #[error("Required field '{field}' is missing")]
    Required {
        /// The missing field.
        field: &'static str,
    },

    // -----------------------------------------------------------------------
    // Storage errors
    // -----------------------------------------------------------------------
    /// A bucket with this name already exists.
    #[error("Your previous request to create the named bucket succeeded and you already own it.")]
    BucketAlreadyExists {
        /// The bucket name.
        bucket: String,
    },

    /// The bucket does not exist.
    #[error("The specified bucket does not exist.")]
    NoSuchBucket {
        /// The bucket name.
        bucket: String,
    },

    /// The bucket still owns objects.
    #[error("The bucket you tried to delete is not empty.")]
    BucketNotEmpty {
        /// The bucket name.
        bucket: String,
    },

    /// The object does not exist.
    #[error("No such object: {bucket}/{object}")]
    NoSuchObject {
        /// The bucket name.
        bucket: String,
        /// The object name.
        object: String,
    },

    // -----------------------------------------------------------------------
    // Database admin errors
    // -----------------------------------------------------------------------
    /// An instance with this name already exists.
    #[error("The Cloud SQL instance already exists: {instance}")]
    InstanceAlreadyExists {
        /// The instance name.
        instance: String,
    },

    /// The instance does not exist.
    #[error("The Cloud SQL instance does not exist: {instance}")]
    NoSuchInstance {
        /// The instance name.
        instance: String,
    },

    /// Deletion protection is enabled on the instance.
    #[error(
        "The instance {instance} is protected from deletion. Disable deletion protection and try again."
    )]
    DeletionProtected {
        /// The instance name.
        instance: String,
    },

    /// A database with this name already exists on the instance.
    #[error("Database {database} already exists on instance {instance}")]
    DatabaseAlreadyExists {
        /// The instance name.
        instance: String,
        /// The database name.
        database: String,
    },

    /// The database does not exist on the instance.
    #[error("Database {database} does not exist on instance {instance}")]
    NoSuchDatabase {
        /// The instance name.
        instance: String,
        /// The database name.
        database: String,
    },

    /// A user with this name and host already exists on the instance.
    #[error("User {name}@{host} already exists on instance {instance}")]
    UserAlreadyExists {
        /// The instance name.
        instance: String,
        /// The user name.
        name: String,
        /// The user host.
        host: String,
    },

    /// The user does not exist on the instance.
    #[error("User {name}@{host} does not exist on instance {instance}")]
    NoSuchUser {
        /// The instance name.
        instance: String,
        /// The user name.
        name: String,
        /// The user host.
        host: String,
    },

    /// The operation does not exist.
    #[error("The operation does not exist: {operation}")]
    NoSuchOperation {
        /// The operation name.
        operation: String,
    },

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------
    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EmulatorError {
    /// The wire error kind for this error.
    #[must_use]
    pub fn code(&self) -> GcpErrorCode {
        match self {
            Self::InvalidBucketName { .. } => GcpErrorCode::Invalid,
            Self::Required { .. } => GcpErrorCode::Required,
            Self::BucketAlreadyExists { .. }
            | Self::InstanceAlreadyExists { .. }
            | Self::DatabaseAlreadyExists { .. }
            | Self::UserAlreadyExists { .. } => GcpErrorCode::Conflict,
            Self::BucketNotEmpty { .. } => GcpErrorCode::NotEmpty,
            Self::NoSuchBucket { .. }
            | Self::NoSuchObject { .. }
            | Self::NoSuchInstance { .. }
            | Self::NoSuchDatabase { .. }
            | Self::NoSuchUser { .. }
            | Self::NoSuchOperation { .. } => GcpErrorCode::NotFound,
            Self::DeletionProtected { .. } => GcpErrorCode::FailedPrecondition,
            Self::Internal(_) => GcpErrorCode::Internal,
        }
    }
}

impl From<EmulatorError> for GcpError {
    fn from(err: EmulatorError) -> Self {
        Self::with_message(err.code(), err.to_string())
    }
}
