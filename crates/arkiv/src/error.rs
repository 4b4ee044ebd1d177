use std::process::ExitStatus;

use reqwest::StatusCode;

/// Reasons an identity string is unusable as a local path component.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity is empty")]
    Empty,

    #[error("identity contains a path separator: {0:?}")]
    Separator(String),

    #[error("identity is a directory reference: {0:?}")]
    DirectoryRef(String),

    #[error("identity contains control characters")]
    Control,
}

// Custom error type for identity resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("Source URL has no usable path segment: {0}")]
    EmptySegment(String),

    #[error("Failed to invoke metadata probe: {0}")]
    ProbeSpawn(#[from] std::io::Error),

    #[error("Metadata probe exited with {status}: {stderr}")]
    ProbeFailed { status: ExitStatus, stderr: String },

    #[error("Resolved name is unsafe: {0}")]
    UnsafeIdentity(#[from] IdentityError),
}

// Custom error type for transfer operations
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status code {0}")]
    Status(StatusCode),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Downloader exited with {status}: {stderr}")]
    ExitStatus { status: ExitStatus, stderr: String },

    #[error("Invalid cookie data: {0}")]
    Cookies(String),
}

/// Errors from the archive store namespace.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unsafe identity: {0}")]
    UnsafeIdentity(#[from] IdentityError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No artifact for identity: {0}")]
    NotFound(String),
}

/// Errors surfaced to a caller of [`Coordinator::handle`](crate::Coordinator::handle).
///
/// Fetch failures never appear here; they happen on a detached task after the
/// caller has already been answered.
#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
