//! Tracing and logging setup shared by the three service binaries.

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize logging and record which service this process runs.
pub fn init_service(service: &'static str) {
    tracing::init();
    ::tracing::info!(service, version = env!("CARGO_PKG_VERSION"), "service starting");
}

pub mod tracing;

pub use tracing::LogFormat;
