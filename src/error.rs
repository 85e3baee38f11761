//! Error taxonomy for the exclusion index, per spec §7.
//!
//! Structural errors (everything but [`ExclusionError::Conflict`]) surface
//! to the caller unchanged. `Conflict` is reserved for a future
//! non-blocking entry point — the default blocking API never constructs it.
//! [`ExclusionError::Io`] is outside the spec's six-variant taxonomy: it
//! carries raw disk I/O failures (permission, disk-full, missing directory)
//! from the named-snapshot helpers, kept distinct from `BoundsOverflow` so a
//! façade mapping errors to HTTP status codes doesn't present a server-side
//! I/O failure as a client-side 4xx.

use crate::Handle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExclusionError {
    #[error("interval is invalid: {reason}")]
    InvalidInterval { reason: String },

    #[error("unknown handle: {0:?}")]
    UnknownHandle(Handle),

    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(String),

    #[error("corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    #[error("conflict: a write is already in progress")]
    Conflict,

    #[error("bounds overflow: {reason}")]
    BoundsOverflow { reason: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExclusionError>;
