use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::{Condvar, Mutex};

/// Shared settlement handle for one in-flight resolution
struct Pending {
    /// None until the resolution settles, then the final outcome
    outcome: Mutex<Option<Option<String>>>,
    settled: Condvar,
}

enum Flight {
    Leader(Arc<Pending>),
    Follower(Arc<Pending>),
}

/// Ensures at most one resolution is in flight per artist name
///
/// Concurrent callers for the same name subscribe to the in-flight outcome
/// instead of issuing redundant network calls. No retry or backoff logic
/// lives here: this only prevents duplicate concurrent starts, not
/// duplicate attempts over time.
pub struct Deduplicator {
    pending: Mutex<HashMap<String, Arc<Pending>>>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Deduplicator {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Number of resolutions currently in flight
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Run `start` for `key` unless a resolution for it is already in
    /// flight, in which case block until that one settles and return the
    /// shared outcome
    ///
    /// The registration is removed before the outcome is delivered to any
    /// subscriber, so a failed resolution never leaves a stuck entry. The
    /// map lock is never held while `start` runs.
    pub fn get_or_start<F>(&self, key: &str, start: F) -> Option<String>
    where
        F: FnOnce() -> Option<String>,
    {
        let flight = {
            let mut pending = self.pending.lock();
            if let Some(existing) = pending.get(key) {
                Flight::Follower(Arc::clone(existing))
            } else {
                let entry = Arc::new(Pending {
                    outcome: Mutex::new(None),
                    settled: Condvar::new(),
                });
                pending.insert(key.to_string(), Arc::clone(&entry));
                Flight::Leader(entry)
            }
        };

        match flight {
            Flight::Follower(entry) => {
                debug!("Resolution for '{}' already in flight, awaiting its outcome", key);
                let mut outcome = entry.outcome.lock();
                loop {
                    if let Some(result) = outcome.as_ref() {
                        return result.clone();
                    }
                    entry.settled.wait(&mut outcome);
                }
            }
            Flight::Leader(entry) => {
                let result = start();

                // Clear the registration first, then publish to subscribers
                self.pending.lock().remove(key);

                let mut outcome = entry.outcome.lock();
                *outcome = Some(result.clone());
                entry.settled.notify_all();
                result
            }
        }
    }
}
