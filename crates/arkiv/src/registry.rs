//! # Fetch Registry
//!
//! The single-flight gate: a concurrency-safe set of identities that
//! currently have a fetch executing.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::identity::Identity;

/// Tracks which identities currently have a fetch in flight.
///
/// [`begin`](FetchRegistry::begin) is the sole serialization point for
/// launching fetches: presence check and insert happen as one operation under
/// the lock, so a race between concurrent callers yields exactly one winner.
#[derive(Debug, Default)]
pub struct FetchRegistry {
    in_flight: Mutex<HashSet<Identity>>,
}

impl FetchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically mark `identity` as in flight.
    ///
    /// Returns `true` if this call newly registered it; the caller must then
    /// launch the fetch and is responsible for eventually calling
    /// [`end`](FetchRegistry::end). Returns `false` if a fetch is already
    /// executing, in which case the caller must not launch another.
    pub fn begin(&self, identity: &Identity) -> bool {
        self.in_flight.lock().insert(identity.clone())
    }

    /// Clear the in-flight marker. Safe to call on an identity not present.
    pub fn end(&self, identity: &Identity) {
        self.in_flight.lock().remove(identity);
    }

    /// Point-in-time membership query, for reporting only.
    ///
    /// Launch decisions must use [`begin`](FetchRegistry::begin)'s atomic
    /// result instead; check-then-act on this value races.
    pub fn is_in_flight(&self, identity: &Identity) -> bool {
        self.in_flight.lock().contains(identity)
    }
}
