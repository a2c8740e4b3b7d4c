use std::sync::Arc;

use jaegis::{AgentRegistry, ContextMemoryManager, MemoryContentStore, ResourceResolver};
use proptest::prelude::*;

use crate::integration::support::direct_agent;

const CONTEXT_BYTES: usize = 40;

/// Registry of `count` agents (`agent-0`, `agent-1`, ...) whose contexts are
/// exactly `CONTEXT_BYTES` each.
fn fixture(count: usize) -> (Vec<String>, AgentRegistry, Arc<MemoryContentStore>, ResourceResolver) {
    let names: Vec<String> = (0..count).map(|i| format!("agent-{}", i)).collect();
    let registry = AgentRegistry::load(names.iter().map(|n| direct_agent(n)).collect()).unwrap();
    let store = Arc::new(MemoryContentStore::new());
    for name in &names {
        store.insert(format!("{}.md", name), "p".repeat(CONTEXT_BYTES));
    }
    let resolver = ResourceResolver::new(store.clone());
    (names, registry, store, resolver)
}

#[tokio::test]
async fn third_agent_evicts_oldest() {
    let (names, registry, _store, resolver) = fixture(3);
    let (a, b, c) = (&names[0], &names[1], &names[2]);
    let manager = ContextMemoryManager::new(100);

    manager.acquire(a, &registry, &resolver).await.unwrap();
    manager.acquire(b, &registry, &resolver).await.unwrap();
    assert_eq!(manager.total_bytes(), 80);

    manager.acquire(c, &registry, &resolver).await.unwrap();
    assert_eq!(manager.cached_agents(), vec![b.clone(), c.clone()]);
    assert_eq!(manager.total_bytes(), 80);
}

#[tokio::test]
async fn evicted_agent_is_rebuilt_on_demand() {
    let (names, registry, store, resolver) = fixture(3);
    let manager = ContextMemoryManager::new(100);
    for name in &names {
        manager.acquire(name, &registry, &resolver).await.unwrap();
    }
    let reads = store.read_count();

    let rebuilt = manager.acquire(&names[0], &registry, &resolver).await.unwrap();
    assert_eq!(rebuilt.size_bytes, CONTEXT_BYTES);
    assert_eq!(store.read_count(), reads + 1);
    assert_eq!(manager.stats().misses, 4);
    assert!(!manager.contains(&names[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_cache_across_tasks() {
    let (names, registry, store, resolver) = fixture(4);
    let registry = Arc::new(registry);
    let resolver = Arc::new(resolver);
    let manager = Arc::new(ContextMemoryManager::new(1000));

    let mut handles = Vec::new();
    for round in 0..16 {
        let name = names[round % names.len()].clone();
        let (registry, resolver, manager) = (registry.clone(), resolver.clone(), manager.clone());
        handles.push(tokio::spawn(async move {
            manager.acquire(&name, &registry, &resolver).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.read_count(), names.len());
    assert_eq!(manager.len(), names.len());
    assert_eq!(manager.total_bytes(), names.len() * CONTEXT_BYTES);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn evicts_exactly_the_least_recently_used(
        capacity in 1usize..6,
        touches in prop::collection::vec(any::<prop::sample::Index>(), 0..12),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let (names, registry, store, resolver) = fixture(capacity + 1);
            let manager = ContextMemoryManager::new(capacity * CONTEXT_BYTES);

            // Model of recency: front is least recently used
            let mut recency: Vec<String> = Vec::new();
            for name in &names[..capacity] {
                manager.acquire(name, &registry, &resolver).await.unwrap();
                recency.push(name.clone());
            }
            for touch in &touches {
                let name = touch.get(&names[..capacity]).clone();
                manager.acquire(&name, &registry, &resolver).await.unwrap();
                recency.retain(|n| *n != name);
                recency.push(name);
            }
            prop_assert_eq!(manager.cached_agents(), recency.clone());

            let newcomer = &names[capacity];
            manager.acquire(newcomer, &registry, &resolver).await.unwrap();
            let evicted = recency.remove(0);
            recency.push(newcomer.clone());
            prop_assert!(!manager.contains(&evicted));
            prop_assert_eq!(manager.cached_agents(), recency);
            prop_assert_eq!(manager.stats().evictions, 1);

            let reads = store.read_count();
            let misses = manager.stats().misses;
            prop_assert!(manager.acquire(&evicted, &registry, &resolver).await.is_ok());
            prop_assert_eq!(store.read_count(), reads + 1);
            prop_assert_eq!(manager.stats().misses, misses + 1);
            Ok(())
        })?;
    }
}
