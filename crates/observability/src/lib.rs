//! Process-wide tracing setup shared by the lithos binaries.

pub mod tracing;

pub use self::tracing::{LOG_FORMAT_VAR, LogFormat, TracingConfig};

/// Initialize tracing with `RUST_LOG` filtering (default `info`).
///
/// Output is JSON unless `LITHOS_LOG_FORMAT=pretty`. This is safe to call
/// multiple times; subsequent calls become no-ops.
pub fn init() {
    match TracingConfig::from_lookup(|key| std::env::var(key).ok()) {
        Ok(config) => self::tracing::init(&config),
        Err(rejected) => {
            self::tracing::init(&TracingConfig::default());
            ::tracing::warn!(
                key = LOG_FORMAT_VAR,
                value = %rejected,
                "ignoring invalid configuration value"
            );
        }
    }
}
