#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! The crate root exports `debug!`, `debug_span!`, `trace!` and `warn!`.
//! With the `tracing` feature enabled they forward to the `tracing` macros;
//! without it they expand to nothing. Downstream crates import them
//! unconditionally:
//!
//! ```ignore
//! use reactree_core::{debug, trace};
//! ```
//!
//! and forward their own `tracing` feature to `reactree-core/tracing`.

#[cfg(feature = "tracing")]
#[doc(hidden)]
pub use tracing as __tracing;

#[cfg(feature = "tracing")]
mod forward_macros {
    /// Forwards to `tracing::debug!`.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {
            $crate::logging::__tracing::debug!($($arg)*)
        };
    }

    /// Forwards to `tracing::debug_span!`.
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::__tracing::debug_span!($($arg)*)
        };
    }

    /// Forwards to `tracing::trace!`.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {
            $crate::logging::__tracing::trace!($($arg)*)
        };
    }

    /// Forwards to `tracing::warn!`.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {
            $crate::logging::__tracing::warn!($($arg)*)
        };
    }
}

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op debug_span macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }

    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}

/// A no-op span for when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Enter the no-op span (does nothing).
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }
}

/// Guard returned by [`NoopSpan::enter`].
#[cfg(not(feature = "tracing"))]
pub struct NoopGuard;
