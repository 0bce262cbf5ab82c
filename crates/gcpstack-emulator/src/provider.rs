//! The emulator provider.
//!
//! [`GcpEmulator`] owns the store and the configuration. The per-family
//! operations live in the [`crate::ops`] submodules as inherent methods, and
//! [`crate::handler`] bridges them to the HTTP layer.

use std::sync::Arc;

use gcpstack_core::GcpStackConfig;

use crate::state::GcpStore;

/// The emulator: store plus configuration.
///
/// # Examples
///
/// ```
/// use gcpstack_core::GcpStackConfig;
/// use gcpstack_emulator::GcpEmulator;
///
/// let emulator = GcpEmulator::new(GcpStackConfig::default());
/// assert!(emulator.store().list_buckets(None).is_empty());
/// ```
#[derive(Debug)]
pub struct GcpEmulator {
    pub(crate) store: Arc<GcpStore>,
    pub(crate) config: Arc<GcpStackConfig>,
}

impl GcpEmulator {
    /// Create an emulator with an empty store.
    #[must_use]
    pub fn new(config: GcpStackConfig) -> Self {
        let store = GcpStore::from_config(&config);
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// The dataset, shared with any out-of-band consumer.
    #[must_use]
    pub fn store(&self) -> &Arc<GcpStore> {
        &self.store
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &GcpStackConfig {
        &self.config
    }

    /// The configured project id.
    #[must_use]
    pub fn project_id(&self) -> &str {
        self.config.project_id.as_str()
    }

    /// Drop all state.
    pub fn reset(&self) {
        self.store.reset();
    }
}
