//! # Coordinator
//!
//! Ties resolver, store, registry and executor together for one route:
//! serve an existing artifact, report an in-flight fetch, or launch a new
//! one — at most one per identity, no matter how many callers race.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::error::CoordinateError;
use crate::fetch::FetchMedia;
use crate::identity::{Identity, ResolveIdentity};
use crate::registry::FetchRegistry;
use crate::store::ArchiveStore;

/// Outcome of coordinating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The artifact is complete; serve it.
    Ready { identity: Identity, path: PathBuf },
    /// A fetch is executing, launched by this request or an earlier one.
    Processing { identity: Identity },
}

/// Per-route orchestration over a shared registry and store.
///
/// The resolver/executor pair is pluggable: the media route pairs a metadata
/// probe with an external downloader, the direct route pairs path-derived
/// identities with a generic HTTP fetch. Both share one [`FetchRegistry`]
/// and one [`ArchiveStore`].
pub struct Coordinator {
    resolver: Arc<dyn ResolveIdentity>,
    executor: Arc<dyn FetchMedia>,
    registry: Arc<FetchRegistry>,
    store: ArchiveStore,
}

/// Clears the in-flight marker when the fetch task finishes, fails, or
/// panics. The registry must never be left with a dangling entry.
struct InFlightGuard {
    registry: Arc<FetchRegistry>,
    identity: Identity,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.end(&self.identity);
    }
}

impl Coordinator {
    pub fn new(
        resolver: Arc<dyn ResolveIdentity>,
        executor: Arc<dyn FetchMedia>,
        registry: Arc<FetchRegistry>,
        store: ArchiveStore,
    ) -> Self {
        Self {
            resolver,
            executor,
            registry,
            store,
        }
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Coordinate one request for `url`.
    ///
    /// The warm path (artifact already archived) never touches the registry.
    /// On a miss, [`FetchRegistry::begin`]'s atomic result is the only gate:
    /// losing the race degrades to `Processing` rather than double-launching.
    /// A launched fetch runs on a detached task; this call never waits for
    /// transfer completion.
    pub async fn handle(&self, url: &str) -> Result<Disposition, CoordinateError> {
        let identity = self.resolver.resolve(url).await?;

        if self.store.exists(&identity).await? {
            let path = self.store.path(&identity)?;
            return Ok(Disposition::Ready { identity, path });
        }

        if !self.registry.begin(&identity) {
            return Ok(Disposition::Processing { identity });
        }

        let dest = match self.store.path(&identity) {
            Ok(dest) => dest,
            Err(e) => {
                self.registry.end(&identity);
                return Err(e.into());
            }
        };

        let guard = InFlightGuard {
            registry: Arc::clone(&self.registry),
            identity: identity.clone(),
        };
        let executor = Arc::clone(&self.executor);
        let url = url.to_string();
        tokio::spawn(async move {
            match executor.fetch(&guard.identity, &url, &dest).await {
                Ok(()) => info!(identity = %guard.identity, "archive complete"),
                Err(e) => error!(identity = %guard.identity, error = %e, "archive failed"),
            }
        });

        Ok(Disposition::Processing { identity })
    }
}
