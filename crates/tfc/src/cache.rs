//! Time-boxed cache for read-only responses

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::codec::Envelope;

/// Caches parsed GET responses for a fixed time.
///
/// Correctness never depends on the cache: the client clears it on every
/// mutating call, and entries simply expire after `ttl`.
///
/// Every [`clear`](Self::clear) starts a new generation. A read that began
/// before a write finished stores its response with
/// [`insert_if_current`](Self::insert_if_current), which drops it when the
/// generation has moved on.
#[derive(Debug)]
pub struct ReadCache {
    ttl: Duration,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    entries: HashMap<String, (Instant, Envelope)>,
}

impl ReadCache {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The current generation; bumped by every [`clear`](Self::clear).
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// A fresh entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Envelope> {
        let mut state = self.state();
        let entries = &mut state.entries;
        match entries.get(key) {
            Some((stored, envelope)) if stored.elapsed() < self.ttl => Some(envelope.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a response.
    pub fn insert(&self, key: impl Into<String>, envelope: Envelope) {
        self.state()
            .entries
            .insert(key.into(), (Instant::now(), envelope));
    }

    /// Store a response read during `generation`.
    ///
    /// Returns false, storing nothing, when the cache was cleared since.
    pub fn insert_if_current(
        &self,
        key: impl Into<String>,
        envelope: Envelope,
        generation: u64,
    ) -> bool {
        let mut state = self.state();
        if state.generation != generation {
            return false;
        }
        state.entries.insert(key.into(), (Instant::now(), envelope));
        true
    }

    /// Drop every entry and start a new generation.
    pub fn clear(&self) {
        let mut state = self.state();
        state.generation = state.generation.wrapping_add(1);
        state.entries.clear();
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    /// Returns true when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
