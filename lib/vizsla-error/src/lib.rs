//! Opaque error plumbing for application-level code.
//!
//! Library crates in this workspace expose typed errors; binaries mostly just need to bubble a failure up to `main`
//! with enough context to be actionable. `GenericError` is that bubble-up type.

use std::fmt::Display;

/// An opaque error that can represent any failure, with optional attached context.
pub type GenericError = anyhow::Error;

#[doc(hidden)]
pub use anyhow::anyhow as _anyhow;

/// Macro for constructing a [`GenericError`].
///
/// Accepts a string literal, a format string with arguments, or any value implementing `Debug` and `Display`. When
/// given an existing error value, its source chain is preserved.
#[macro_export]
macro_rules! generic_error {
    ($msg:literal $(,)?) => { $crate::_anyhow!($msg) };
    ($err:expr $(,)?) => { $crate::_anyhow!($err) };
    ($fmt:expr, $($arg:tt)*) => { $crate::_anyhow!($fmt, $($arg)*) };
}

mod private {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}

/// Extension trait for attaching context to the error variant of a `Result`.
///
/// This exists as a facade over the equivalent `anyhow` machinery so that callers only ever interact with
/// [`GenericError`] and the method name doesn't collide with other context-attachment extension traits in scope.
pub trait ErrorContext<T, E>: private::Sealed {
    /// Wraps the error value with additional context.
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    Result<T, E>: anyhow::Context<T, E>,
{
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
    {
        <Self as anyhow::Context<T, E>>::context(self, context)
    }
}
