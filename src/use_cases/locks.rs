use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

// Entries are pruned once the table grows past this many ids.
const PRUNE_THRESHOLD: usize = 1024;

// Per-entity async locks keyed by object id.
// Read-modify-write use cases hold the guard for one id across their awaits.
#[derive(Clone, Default)]
pub struct EntityLocks {
    entries: Arc<Mutex<HashMap<u64, Arc<AsyncMutex<()>>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: u64) -> OwnedMutexGuard<()> {
        let entry = {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            if entries.len() > PRUNE_THRESHOLD {
                // Only the table itself holds idle entries.
                entries.retain(|_, entry| Arc::strong_count(entry) > 1);
            }

            entries.entry(id).or_default().clone()
        };

        entry.lock_owned().await
    }
}
