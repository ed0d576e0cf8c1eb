use std::collections::HashMap;

use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::data::CacheEntry;
use crate::helpers::imagestore::ImageStore;

/// In-memory mirror of the persistent artist image store
///
/// Hydrated once at construction; the persisted store is the source of
/// truth at process start and is written through on every settled
/// resolution. Entries are `Some(payload)` for resolved images and `None`
/// for negative results; absence means never attempted.
pub struct CacheStore {
    entries: RwLock<HashMap<String, Option<String>>>,
    store: Box<dyn ImageStore>,
}

impl CacheStore {
    /// Build the cache by bulk-loading the persistent store
    pub fn new(store: Box<dyn ImageStore>) -> Self {
        let entries = match store.load_all() {
            Ok(entries) => {
                info!("Hydrated artist image cache with {} entries", entries.len());
                entries
            }
            Err(e) => {
                warn!("Failed to load artist image store, starting empty: {}", e);
                HashMap::new()
            }
        };

        CacheStore {
            entries: RwLock::new(entries),
            store,
        }
    }

    /// Pure read of the cached state for an artist
    pub fn lookup(&self, artist: &str) -> CacheEntry {
        match self.entries.read().get(artist) {
            Some(Some(payload)) => CacheEntry::Resolved(payload.clone()),
            Some(None) => CacheEntry::Negative,
            None => CacheEntry::Unknown,
        }
    }

    /// Record a settled resolution and write it through to the persistent
    /// store
    ///
    /// A persistence failure is logged but does not reverse the in-memory
    /// commit; durability is best-effort, the current session stays
    /// consistent.
    pub fn commit(&self, artist: &str, payload: Option<&str>) {
        self.entries
            .write()
            .insert(artist.to_string(), payload.map(|p| p.to_string()));

        if let Err(e) = self.store.save(artist, payload) {
            warn!("Failed to persist image cache entry for '{}': {}", artist, e);
        }
    }

    /// Delete a terminal entry, returning the artist to never-attempted
    /// state
    ///
    /// Returns true if an entry existed.
    pub fn force_forget(&self, artist: &str) -> bool {
        let existed = self.entries.write().remove(artist).is_some();

        if existed {
            debug!("Cleared cached image entry for '{}'", artist);
            if let Err(e) = self.store.delete(artist) {
                warn!("Failed to delete persisted entry for '{}': {}", artist, e);
            }
        }
        existed
    }

    /// Counts of terminal entries: (resolved, negative)
    pub fn counts(&self) -> (usize, usize) {
        let entries = self.entries.read();
        let resolved = entries.values().filter(|entry| entry.is_some()).count();
        (resolved, entries.len() - resolved)
    }
}
