//! Wire error types.
//!
//! Both API families nest errors under a top-level `error` object. The storage
//! flavor carries `{code, message, errors: [{domain, reason, message}]}`; the
//! database admin flavor additionally carries a canonical `status` string.
//! [`GcpError`] holds everything needed to render either flavor.

use std::fmt;

use crate::operations::ApiFamily;

/// Error kinds the emulator can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum GcpErrorCode {
    /// A field failed validation.
    #[default]
    Invalid,
    /// A required field was missing or empty.
    Required,
    /// The request body could not be decoded.
    ParseError,
    /// The addressed resource does not exist.
    NotFound,
    /// A resource with the same identity already exists.
    Conflict,
    /// The bucket still owns objects.
    NotEmpty,
    /// Deletion protection is enabled on the target.
    FailedPrecondition,
    /// The path exists but not for this method.
    MethodNotAllowed,
    /// Unexpected internal failure.
    Internal,
}

impl GcpErrorCode {
    /// The `reason` emitted inside `errors[]` for the given family.
    #[must_use]
    pub fn reason(&self, family: ApiFamily) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Required => "required",
            Self::ParseError => "parseError",
            Self::NotFound => "notFound",
            Self::Conflict | Self::NotEmpty => "conflict",
            Self::FailedPrecondition => "failedPrecondition",
            Self::MethodNotAllowed => "methodNotAllowed",
            Self::Internal => match family {
                ApiFamily::Storage => "backendError",
                ApiFamily::Sql => "internalError",
            },
        }
    }

    /// The canonical status string carried by the database admin envelope.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Invalid | Self::Required | Self::ParseError | Self::MethodNotAllowed => {
                "INVALID_ARGUMENT"
            }
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "ALREADY_EXISTS",
            Self::NotEmpty | Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Internal => "INTERNAL",
        }
    }

    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::Required => "Required",
            Self::ParseError => "ParseError",
            Self::NotFound => "NotFound",
            Self::Conflict => "Conflict",
            Self::NotEmpty => "NotEmpty",
            Self::FailedPrecondition => "FailedPrecondition",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::Internal => "Internal",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::Invalid | Self::Required | Self::ParseError | Self::FailedPrecondition => {
                http::StatusCode::BAD_REQUEST
            }
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::Conflict | Self::NotEmpty => http::StatusCode::CONFLICT,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for GcpErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error destined for the wire.
#[derive(Debug)]
pub struct GcpError {
    /// The error kind.
    pub code: GcpErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcpError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for GcpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl GcpError {
    /// Create a new `GcpError` from an error code.
    #[must_use]
    pub fn new(code: GcpErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new `GcpError` with a custom message.
    #[must_use]
    pub fn with_message(code: GcpErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// Field validation failure.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::with_message(GcpErrorCode::Invalid, message)
    }

    /// Missing required field.
    #[must_use]
    pub fn required(message: impl Into<String>) -> Self {
        Self::with_message(GcpErrorCode::Required, message)
    }

    /// Undecodable request body.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::with_message(GcpErrorCode::ParseError, message)
    }

    /// Resource not found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(GcpErrorCode::NotFound, message)
    }

    /// Resource already exists.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_message(GcpErrorCode::Conflict, message)
    }

    /// No route for this method on a known path.
    #[must_use]
    pub fn method_not_allowed(method: &str, path: &str) -> Self {
        Self::with_message(
            GcpErrorCode::MethodNotAllowed,
            format!("Method {method} is not allowed on {path}"),
        )
    }

    /// No route at all.
    #[must_use]
    pub fn no_route(method: &str, path: &str) -> Self {
        Self::with_message(
            GcpErrorCode::NotFound,
            format!("No such endpoint: {method} {path}"),
        )
    }

    /// Internal failure.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(GcpErrorCode::Internal, message)
    }
}

/// Create a `GcpError` from an error code.
///
/// # Examples
///
/// ```
/// use gcpstack_model::gcp_error;
/// use gcpstack_model::error::GcpErrorCode;
///
/// let err = gcp_error!(NotFound);
/// assert_eq!(err.code, GcpErrorCode::NotFound);
///
/// let err = gcp_error!(Conflict, "bucket exists");
/// assert_eq!(err.message, "bucket exists");
/// ```
#[macro_export]
macro_rules! gcp_error {
    ($code:ident) => {
        $crate::error::GcpError::new($crate::error::GcpErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::GcpError::with_message($crate::error::GcpErrorCode::$code, $msg)
    };
}
