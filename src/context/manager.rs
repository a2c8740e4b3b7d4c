//! Context Memory Manager
//!
//! Bounded cache of built agent contexts. Entries are evicted least recently
//! used first once the total size exceeds the byte budget. A miss is not an
//! error: the context is rebuilt from the registry and the content store.

use super::bundle::AgentContext;
use crate::agent::AgentRegistry;
use crate::concurrency::KeyLockManager;
use crate::error::LoadError;
use crate::resolver::ResourceResolver;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub total_bytes: usize,
}

struct CacheEntry {
    context: Arc<AgentContext>,
    /// Logical access clock value; larger is more recent.
    last_tick: u64,
    inserted_seq: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    total_bytes: usize,
    clock: u64,
    next_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn remove(&mut self, name: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(name)?;
        self.total_bytes -= entry.context.size_bytes;
        Some(entry)
    }
}

/// LRU cache of agent contexts under a byte budget.
///
/// Safe to share between sessions behind an `Arc`.
pub struct ContextMemoryManager {
    max_bytes: usize,
    state: Mutex<CacheState>,
    build_locks: KeyLockManager,
}

impl ContextMemoryManager {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            state: Mutex::new(CacheState::default()),
            build_locks: KeyLockManager::new(),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Return the cached context for `name`, building it on a miss.
    ///
    /// Builds for the same agent are serialized so concurrent callers share one
    /// build. A failed build caches nothing.
    pub async fn acquire(
        &self,
        name: &str,
        registry: &AgentRegistry,
        resolver: &ResourceResolver,
    ) -> Result<Arc<AgentContext>, LoadError> {
        if let Some(context) = self.lookup(name) {
            return Ok(context);
        }

        let lock = self.build_locks.get_lock(name);
        let result = {
            let _guard = lock.lock().await;
            match self.lookup(name) {
                Some(context) => Ok(context),
                None => {
                    self.state.lock().misses += 1;
                    debug!("Context cache miss for agent {}", name);
                    AgentContext::build(name, registry, resolver)
                        .await
                        .map(|context| {
                            let context = Arc::new(context);
                            self.insert(name, Arc::clone(&context));
                            context
                        })
                }
            }
        };
        drop(lock);
        self.build_locks.prune_idle();
        result
    }

    /// Evict `name`. Does nothing if it is not cached.
    pub fn release(&self, name: &str) {
        if self.state.lock().remove(name).is_some() {
            debug!("Released context for agent {}", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.state.lock().total_bytes
    }

    /// Cached agent names, least recently used first.
    pub fn cached_agents(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut entries: Vec<(&String, &CacheEntry)> = state.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| (entry.last_tick, entry.inserted_seq));
        entries.into_iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            entries: state.entries.len(),
            total_bytes: state.total_bytes,
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<AgentContext>> {
        let mut state = self.state.lock();
        let tick = state.tick();
        let entry = state.entries.get_mut(name)?;
        entry.last_tick = tick;
        entry.context.touch();
        let context = Arc::clone(&entry.context);
        state.hits += 1;
        debug!("Context cache hit for agent {}", name);
        Some(context)
    }

    fn insert(&self, name: &str, context: Arc<AgentContext>) {
        let mut state = self.state.lock();
        let tick = state.tick();
        let inserted_seq = state.next_seq;
        state.next_seq += 1;

        state.remove(name);
        state.total_bytes += context.size_bytes;
        state.entries.insert(
            name.to_string(),
            CacheEntry {
                context,
                last_tick: tick,
                inserted_seq,
            },
        );

        while state.total_bytes > self.max_bytes && state.entries.len() > 1 {
            let victim = state
                .entries
                .iter()
                .filter(|(key, _)| key.as_str() != name)
                .min_by_key(|(_, entry)| (entry.last_tick, entry.inserted_seq))
                .map(|(key, _)| key.clone());
            let Some(victim) = victim else {
                break;
            };
            if let Some(evicted) = state.remove(&victim) {
                state.evictions += 1;
                info!(
                    "Evicted context for agent {} ({} bytes) to stay within {} bytes",
                    victim, evicted.context.size_bytes, self.max_bytes
                );
            }
        }

        if state.total_bytes > self.max_bytes {
            debug!(
                "Context for agent {} alone exceeds budget ({} > {} bytes)",
                name, state.total_bytes, self.max_bytes
            );
        }
    }
}
