//! Common type definitions shared across the emulator crates.

use std::fmt;

/// Project identifier the emulator is scoped to.
///
/// Any non-empty string without `/` or `:` is accepted; the live service's
/// stricter naming rules are not enforced so that local fixtures can use
/// short names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    /// Default project used when none is configured.
    pub const DEFAULT: &str = "playground";

    /// Create a new project ID.
    ///
    /// # Errors
    /// Returns an error if the ID is empty or contains a path or
    /// connection-name separator.
    pub fn new(id: impl Into<String>) -> Result<Self, crate::GcpStackError> {
        let id = id.into();
        if id.is_empty() || id.contains('/') || id.contains(':') {
            return Err(crate::GcpStackError::InvalidProjectId(id));
        }
        Ok(Self(id))
    }

    /// Get the project ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
