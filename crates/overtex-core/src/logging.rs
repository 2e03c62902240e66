#![forbid(unsafe_code)]

//! Logging macros shared by the overtex crates.
//!
//! Call sites write `overtex_core::debug!(...)`, `overtex_core::trace_span!(...)`
//! and so on. With the `tracing` feature these are the `tracing` macros; without
//! it they expand to nothing (events) or to a [`NoopSpan`] (spans), so surfaces
//! and encoders carry no logging cost in default builds.
//!
//! With `tracing-json`, [`init_json_subscriber`] installs a JSON formatter whose
//! filter is read from `OVERTEX_LOG` (falling back to `warn`).

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, trace, trace_span, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// Discards its arguments.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Discards its arguments.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// Evaluates to a [`NoopSpan`](crate::logging::NoopSpan).
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }

    /// Evaluates to a [`NoopSpan`](crate::logging::NoopSpan).
    #[macro_export]
    macro_rules! trace_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }
}

/// Stand-in for `tracing::Span` when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Mirrors `Span::enter`; the guard does nothing.
    #[inline]
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }
}

/// Guard returned by [`NoopSpan::enter`].
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopGuard;

/// Environment variable holding the `tracing-subscriber` filter directive.
#[cfg(feature = "tracing-json")]
pub const ENV_LOG_FILTER: &str = "OVERTEX_LOG";

/// Install a global JSON subscriber for production logging.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_env(ENV_LOG_FILTER).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}


#[cfg(all(test, feature = "tracing-json"))]
mod json_tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        // Whichever call wins, the other one must report failure.
        let first = init_json_subscriber();
        let second = init_json_subscriber();
        assert!(!(first && second));
    }
}
