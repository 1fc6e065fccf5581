use cairn::{CacheBuilder, EvictionCause};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Values are `(score, weight)` pairs.
type Item = (i64, u64);

type EventLog = Arc<Mutex<Vec<(u32, EvictionCause)>>>;

fn scored_builder(capacity: u64) -> (CacheBuilder<u32, Item>, EventLog) {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let log2 = Arc::clone(&log);
    let builder = CacheBuilder::new(capacity)
        .scored(|v: &Item| v.0, |v: &Item| v.1)
        .eviction_listener(move |key: &u32, _val, cause| {
            log2.lock().unwrap().push((*key, cause));
        });
    (builder, log)
}

fn scored_cache(capacity: u64) -> (cairn::Cache<u32, Item>, EventLog) {
    let (builder, log) = scored_builder(capacity);
    (builder.build(), log)
}

/// Keys reported with `EvictionCause::Capacity`, in order.
fn victims(log: &EventLog) -> Vec<u32> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(_, cause)| *cause == EvictionCause::Capacity)
        .map(|(key, _)| *key)
        .collect()
}

#[test]
fn constant_weight_two_in_capacity_twenty() {
    let evictions = Arc::new(Mutex::new(0usize));
    let evictions2 = Arc::clone(&evictions);
    let cache: cairn::Cache<u32, u32> = CacheBuilder::new(20)
        .scored(|_: &u32| 1i64, |_: &u32| 2u64)
        .eviction_listener(move |_key, _val, _cause| *evictions2.lock().unwrap() += 1)
        .build();

    for k in 0..50 {
        cache.set(k, k);
    }
    assert_eq!(cache.len(), 10);
    assert_eq!(cache.weight(), 20);
    assert_eq!(*evictions.lock().unwrap(), 40);
    assert_eq!(cache.stats().evictions, 40);
}

#[test]
fn lowest_score_leaves_first() {
    let (cache, evicted) = scored_cache(3);
    cache.set(1, (50, 1));
    cache.set(2, (10, 1));
    cache.set(3, (90, 1));
    cache.set(4, (70, 1));
    cache.set(5, (80, 1));
    assert_eq!(victims(&evicted), vec![2, 1]);

    let mut keys = cache.keys();
    keys.sort_unstable();
    assert_eq!(keys, vec![3, 4, 5]);
}

#[test]
fn hits_do_not_change_eviction_order() {
    let (cache, evicted) = scored_cache(2);
    cache.set(1, (1, 1));
    cache.set(2, (2, 1));
    for _ in 0..10 {
        let _ = cache.get(&1);
    }
    cache.set(3, (3, 1));
    assert_eq!(victims(&evicted), vec![1]);
}

#[test]
fn heavy_value_evicts_several_entries() {
    let (cache, evicted) = scored_cache(10);
    for k in 0..5u32 {
        cache.set(k, (k as i64, 2));
    }
    cache.set(99, (100, 5));
    assert_eq!(victims(&evicted), vec![0, 1, 2]);
    assert_eq!(cache.weight(), 9);
}

#[test]
fn overweight_value_is_admitted_alone() {
    let (cache, evicted) = scored_cache(4);
    cache.set(1, (1, 2));
    cache.set(2, (2, 2));
    cache.set(3, (0, 40));
    assert_eq!(victims(&evicted).len(), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(*cache.get(&3).unwrap(), (0, 40));
}

#[test]
fn update_adjusts_weight_without_evicting() {
    let (cache, evicted) = scored_cache(4);
    cache.set(1, (1, 2));
    cache.set(2, (2, 2));
    cache.set(1, (1, 3));
    assert!(evicted.lock().unwrap().is_empty());
    assert_eq!(cache.weight(), 5);
    assert_eq!(cache.len(), 2);
}

#[test]
fn remove_releases_weight() {
    let (cache, log) = scored_cache(10);
    cache.set(1, (1, 6));
    cache.set(2, (1, 3));
    assert!(cache.remove(&1));
    assert_eq!(cache.weight(), 3);
    cache.set(3, (1, 7));
    assert_eq!(cache.len(), 2);
    assert_eq!(*log.lock().unwrap(), vec![(1, EvictionCause::Explicit)]);
}

#[test]
fn expired_entry_reads_as_miss_and_leaves_as_expired() {
    let (builder, log) = scored_builder(10);
    let cache = builder.time_to_live(Duration::from_millis(30)).build();

    cache.set(1, (0, 5));
    std::thread::sleep(Duration::from_millis(60));
    assert!(cache.get(&1).unwrap_err().is_not_found());
    assert_eq!(cache.len(), 0);
    assert!(cache.keys().is_empty());
    assert_eq!(cache.weight(), 5, "held until a write removes it");

    // Needs the room held by key 1, which goes out as expired.
    cache.set(2, (0, 8));
    assert_eq!(*log.lock().unwrap(), vec![(1, EvictionCause::Expired)]);
    assert_eq!((cache.len(), cache.weight()), (1, 8));
    assert_eq!(cache.stats().evictions, 0);
}

#[test]
fn growing_update_to_a_huge_weight_does_not_panic() {
    let (cache, _) = scored_cache(u64::MAX);
    cache.set(1, (0, 1));
    cache.set(2, (0, 1));
    cache.set(2, (0, u64::MAX));
    assert_eq!(cache.weight(), u64::MAX);
    assert_eq!(cache.len(), 2);
}

#[test]
fn set_then_get_round_trips() {
    let (cache, _) = scored_cache(10);
    cache.set(8, (3, 3));
    assert_eq!(*cache.get(&8).unwrap(), (3, 3));
}

proptest! {
    #[test]
    fn weight_within_capacity_or_single_entry(
        capacity in 1u64..100,
        writes in prop::collection::vec((0u32..50, -50i64..50, 0u64..30), 1..200),
    ) {
        let cache: cairn::Cache<u32, Item> = CacheBuilder::new(capacity)
            .scored(|v: &Item| v.0, |v: &Item| v.1)
            .build();
        for (key, score, weight) in writes {
            let fresh = !cache.contains(&key);
            cache.set(key, (score, weight));
            if fresh {
                prop_assert!(cache.weight() <= cache.capacity() || cache.len() == 1);
            }
            let live: u64 = cache.get_all().values().map(|v| v.1).sum();
            prop_assert_eq!(live, cache.weight());
        }
    }
}
