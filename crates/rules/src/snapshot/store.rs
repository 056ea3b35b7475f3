//! Atomically swappable snapshot holder for hot reload.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use super::{Snapshot, SnapshotConfig};
use crate::error::Result;

/// Holds the active [`Snapshot`] behind an atomic pointer.
///
/// Readers take an `Arc` and keep using that epoch until they drop it.
/// Writers build a complete snapshot first, then swap it in with a single
/// pointer store, so no reader ever sees a partially applied reload.
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Build the initial snapshot from loader output.
    pub fn from_config(config: SnapshotConfig) -> Result<Self> {
        Ok(Self::new(config.build()?))
    }

    /// The snapshot active right now.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Swap in a new snapshot. Returns `true` when it differs from the old one.
    pub fn replace(&self, snapshot: Snapshot) -> bool {
        let changed = **self.current.load() != snapshot;
        self.current.store(Arc::new(snapshot));
        if changed {
            info!("configuration changes detected, new snapshot active");
        } else {
            debug!("configuration reloaded, no changes detected");
        }
        changed
    }

    /// Build and swap in a new snapshot.
    ///
    /// On error the previous snapshot stays active.
    pub fn reload(&self, config: SnapshotConfig) -> Result<bool> {
        let snapshot = config.build()?;
        Ok(self.replace(snapshot))
    }
}
