//! Core error types for django-auxilium-rs.
//!
//! This module provides the [`AuxiliumError`] enum covering every failure the
//! decorator and caching machinery can report: structural configuration
//! errors, call-time binding errors, type errors, cache misses, and errors
//! raised by the wrapped callables themselves.

use std::error::Error as StdError;

use thiserror::Error;

/// A boxed error raised by user code inside a wrapped callable.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The moment in a decorator's lifecycle at which an error is raised.
///
/// Configuration problems surface before any caller is affected, binding and
/// type problems surface on each offending call, and cache misses surface on
/// lookups that assumed presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorPhase {
    /// Raised while a decorator is defined or configured.
    Definition,
    /// Raised by a call attempt with an offending argument set.
    Call,
    /// Raised by a cache lookup or eviction.
    Lookup,
    /// Raised by the wrapped callable and passed through untouched.
    Callable,
}

/// The primary error type for django-auxilium-rs.
#[derive(Error, Debug)]
pub enum AuxiliumError {
    // ── Definition time ──────────────────────────────────────────────

    /// A declared parameter specification or decorator option is malformed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Call time ────────────────────────────────────────────────────

    /// Call-time arguments do not match the declared parameters.
    #[error("Binding error: {0}")]
    BindingError(String),

    /// A value or target of the wrong type was supplied.
    #[error("Type error: {0}")]
    TypeError(String),

    /// An attribute cannot be assigned or deleted.
    #[error("Attribute error: {0}")]
    AttributeError(String),

    // ── Cache ────────────────────────────────────────────────────────

    /// No value is stored in the cache for the requested key.
    #[error("Value not in cache")]
    NotInCache,

    // ── Wrapped callables ────────────────────────────────────────────

    /// An error raised inside a wrapped callable.
    #[error(transparent)]
    Callable(BoxError),

    // ── IO ───────────────────────────────────────────────────────────

    /// A settings file could not be read.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AuxiliumError {
    /// Wraps an error raised by user code inside a decorated callable.
    pub fn callable(err: impl Into<BoxError>) -> Self {
        Self::Callable(err.into())
    }

    /// Returns the lifecycle phase this error belongs to.
    ///
    /// - `ConfigurationError`, `IoError` -> [`ErrorPhase::Definition`]
    /// - `BindingError`, `TypeError`, `AttributeError` -> [`ErrorPhase::Call`]
    /// - `NotInCache` -> [`ErrorPhase::Lookup`]
    /// - `Callable` -> [`ErrorPhase::Callable`]
    pub const fn phase(&self) -> ErrorPhase {
        match self {
            Self::ConfigurationError(_) | Self::IoError(_) => ErrorPhase::Definition,
            Self::BindingError(_) | Self::TypeError(_) | Self::AttributeError(_) => {
                ErrorPhase::Call
            }
            Self::NotInCache => ErrorPhase::Lookup,
            Self::Callable(_) => ErrorPhase::Callable,
        }
    }

    /// Returns `true` if this is a cache miss.
    pub const fn is_not_in_cache(&self) -> bool {
        matches!(self, Self::NotInCache)
    }

    /// Returns the original error raised by a wrapped callable, if it has type `E`.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Callable(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, AuxiliumError>`.
pub type AuxiliumResult<T> = Result<T, AuxiliumError>;
