//! # Arkiv Engine
//!
//! On-demand media archiving: map a source URL to a stable local artifact,
//! serve it if it exists, otherwise launch at most one background fetch per
//! artifact and report progress to any number of concurrent callers.
//!
//! ## Components
//!
//! - Identity resolution (probe-based or path-derived)
//! - Single-flight fetch registry
//! - Live-queried archive store
//! - Interchangeable fetch backends (external downloader, generic HTTP)
//! - The coordinator tying them together per route

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod registry;
pub mod store;

pub use builder::FetcherConfigBuilder;
pub use config::FetcherConfig;
pub use coordinator::{Coordinator, Disposition};
pub use error::{CoordinateError, FetchError, IdentityError, ResolveError, StoreError};
pub use fetch::{CommandFetcher, FetchMedia, HttpFetcher};
pub use identity::{Identity, PathResolver, ProbeResolver, ResolveIdentity};
pub use registry::FetchRegistry;
pub use store::ArchiveStore;
