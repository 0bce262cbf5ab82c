//! Operation handlers.
//!
//! Each submodule exposes `handle_*` methods on [`crate::provider::GcpEmulator`]
//! for one resource family. They validate their inputs, call the store, and
//! return typed results; [`crate::handler`] decodes requests into those inputs
//! and shapes the results into responses.

pub mod buckets;
pub mod databases;
pub mod instances;
pub mod objects;
pub mod operations;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use gcpstack_core::GcpStackConfig;

    use crate::provider::GcpEmulator;

    pub(crate) fn emulator() -> GcpEmulator {
        GcpEmulator::new(
            GcpStackConfig::builder()
                .external_url("http://localhost:9000".to_owned())
                .build(),
        )
    }
}
