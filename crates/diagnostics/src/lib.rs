//! Logging for the cachegate workspace
//!
//! Every crate logs through the macros exported here so that one environment
//! variable controls output for the whole process.
//!
//! Usage:
//! - Set CACHEGATE_LOG=info (default) - request and cache events
//! - Set CACHEGATE_LOG=debug - lock, lookup and transfer detail
//! - Set CACHEGATE_LOG=warn or error - problems only
//! - Set CACHEGATE_LOG=off - no logs

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Name of the environment variable read by [`init_diagnostics`]
pub const LOG_ENV: &str = "CACHEGATE_LOG";

static INIT: Once = Once::new();

fn min_level(value: &str) -> Option<emit::Level> {
    match value {
        "debug" => Some(emit::Level::Debug),
        "info" => Some(emit::Level::Info),
        "warn" => Some(emit::Level::Warn),
        "error" => Some(emit::Level::Error),
        _ => None,
    }
}

/// Initialize diagnostics based on the CACHEGATE_LOG environment variable
///
/// This should be called once at application startup. It's safe to call
/// multiple times - subsequent calls will be ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
        if log_level == "off" {
            return;
        }

        let (level, known) = match min_level(&log_level) {
            Some(level) => (level, true),
            None => (emit::Level::Info, false),
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if !known {
            emit::warn!("unknown {env} value {value}, using info", env: LOG_ENV, value: log_level);
        }

        // The runtime lives for the whole process.
        std::mem::forget(rt);
    });
}

/// Log basic operations (requests served, cache fills, uploads)
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log detailed diagnostics (lookups, lock acquisition, poll iterations)
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log warning conditions (timeouts, rejected paths, cleanup trouble)
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log error conditions that fail a request or stop startup
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;
