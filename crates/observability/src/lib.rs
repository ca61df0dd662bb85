//! Process-wide tracing setup shared by the server and tools.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize tracing/logging from the environment (`RUST_LOG`, `LOG_FORMAT`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init(LogFormat::from_env());
}
