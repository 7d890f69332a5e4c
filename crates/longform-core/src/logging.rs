#![forbid(unsafe_code)]

//! Logging facade.
//!
//! With the `tracing` feature enabled this module re-exports the `tracing`
//! macros. Without it, the same macro names expand to nothing so call sites
//! never need their own `cfg` guards.
//!
//! The `tracing-json` feature adds [`init_json`], which installs a global
//! JSON subscriber filtered by `RUST_LOG` (default `info`).

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! __longform_log_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::__longform_log_noop as debug;
#[cfg(not(feature = "tracing"))]
pub use crate::__longform_log_noop as error;
#[cfg(not(feature = "tracing"))]
pub use crate::__longform_log_noop as info;
#[cfg(not(feature = "tracing"))]
pub use crate::__longform_log_noop as trace;
#[cfg(not(feature = "tracing"))]
pub use crate::__longform_log_noop as warn;

/// Install a global JSON subscriber.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
