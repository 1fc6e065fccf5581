use cairn::{CacheBuilder, CacheError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable for key {0}")]
struct Unavailable(u64);

// ---------------------------------------------------------------------------
// Load on miss
// ---------------------------------------------------------------------------

#[test]
fn loader_populates_missing_keys() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = Arc::clone(&calls);
    let cache: cairn::Cache<u64, String> = CacheBuilder::new(10)
        .loader(move |key: &u64| {
            calls2.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Unavailable>(format!("v{key}"))
        })
        .build();

    assert_eq!(*cache.get(&3).unwrap(), "v3");
    assert_eq!(*cache.get(&3).unwrap(), "v3");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "second get is a hit");
    assert_eq!((cache.hit_count(), cache.miss_count()), (1, 1));
    assert_eq!(cache.stats().loads, 1);
}

#[test]
fn get_if_present_never_loads() {
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .loader(|key: &u64| Ok::<_, Unavailable>(*key))
        .build();
    assert!(cache.get_if_present(&1).unwrap_err().is_not_found());
    assert!(!cache.contains(&1));
}

#[test]
fn loader_error_reaches_the_caller_and_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = Arc::clone(&calls);
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .loader(move |key: &u64| {
            calls2.fetch_add(1, Ordering::SeqCst);
            Err::<u64, _>(Unavailable(*key))
        })
        .build();

    let err = cache.get(&5).unwrap_err();
    assert!(matches!(err, CacheError::Load(_)));
    assert_eq!(err.to_string(), "backend unavailable for key 5");
    assert_eq!(err.downcast_ref::<Unavailable>().map(|e| e.0), Some(5));

    assert!(cache.get(&5).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2, "failures are retried by the next caller");
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().load_failures, 2);
}

#[test]
fn expiring_loader_sets_entry_ttl() {
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .expiring_loader(|key: &u64| {
            Ok::<_, Unavailable>((*key * 2, Duration::from_millis(40)))
        })
        .build();

    assert_eq!(*cache.get(&4).unwrap(), 8);
    assert!(cache.contains(&4));
    thread::sleep(Duration::from_millis(80));
    assert!(!cache.contains(&4));
}

// ---------------------------------------------------------------------------
// At most one producer per key
// ---------------------------------------------------------------------------

#[test]
fn concurrent_misses_share_one_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = Arc::clone(&calls);
    let cache: cairn::Cache<&'static str, u64> = CacheBuilder::new(10)
        .loader(move |_key: &&'static str| {
            calls2.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            Ok::<_, Unavailable>(99)
        })
        .build();

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get(&"hot")
            })
        })
        .collect();

    let values: Vec<Arc<u64>> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    assert_eq!(cache.stats().loads, 1);
}

#[test]
fn concurrent_failure_is_shared_by_all_waiters() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = Arc::clone(&calls);
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .loader(move |key: &u64| {
            calls2.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            Err::<u64, _>(Unavailable(*key))
        })
        .build();

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.get(&1)
            })
        })
        .collect();

    for h in handles {
        let err = h.join().unwrap().unwrap_err();
        assert_eq!(err.downcast_ref::<Unavailable>().map(|e| e.0), Some(1));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn different_keys_load_in_parallel() {
    let barrier = Arc::new(Barrier::new(2));
    let barrier2 = Arc::clone(&barrier);
    // Each load waits for the other: this only finishes if both run at once.
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .loader(move |key: &u64| {
            barrier2.wait();
            Ok::<_, Unavailable>(*key)
        })
        .build();

    let other = {
        let cache = cache.clone();
        thread::spawn(move || cache.get(&1).map(|v| *v))
    };
    assert_eq!(*cache.get(&2).unwrap(), 2);
    assert_eq!(other.join().unwrap().unwrap(), 1);
}

#[test]
fn panicking_loader_does_not_strand_waiters() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = Arc::clone(&calls);
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .loader(move |key: &u64| {
            if calls2.fetch_add(1, Ordering::SeqCst) == 0 {
                thread::sleep(Duration::from_millis(50));
                panic!("loader blew up");
            }
            Ok::<_, Unavailable>(*key + 1)
        })
        .build();

    let first = {
        let cache = cache.clone();
        thread::spawn(move || cache.get(&10))
    };
    thread::sleep(Duration::from_millis(10));
    let second = {
        let cache = cache.clone();
        thread::spawn(move || cache.get(&10))
    };

    assert!(first.join().is_err(), "leader thread panicked");
    assert_eq!(*second.join().unwrap().unwrap(), 11);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ---------------------------------------------------------------------------
// Background refresh
// ---------------------------------------------------------------------------

#[test]
fn refresh_reloads_in_the_background() {
    let version = Arc::new(AtomicUsize::new(0));
    let version2 = Arc::clone(&version);
    let cache: cairn::Cache<u64, usize> = CacheBuilder::new(10)
        .loader(move |_key: &u64| Ok::<_, Unavailable>(version2.fetch_add(1, Ordering::SeqCst)))
        .build();

    assert_eq!(*cache.get(&1).unwrap(), 0);
    let handle = cache.refresh(1).expect("loader configured");
    assert_eq!(*handle.join().unwrap().unwrap(), 1);
    assert_eq!(*cache.get(&1).unwrap(), 1);
}

#[test]
fn refresh_without_loader_is_none() {
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10).build();
    cache.set(1, 1);
    assert!(cache.refresh(1).is_none());
}

#[test]
fn refresh_is_refused_while_a_load_is_running() {
    let gate = Arc::new(Barrier::new(2));
    let gate2 = Arc::clone(&gate);
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .loader(move |key: &u64| {
            gate2.wait();
            Ok::<_, Unavailable>(*key)
        })
        .build();

    let running = cache.refresh(3).expect("first refresh leads");
    assert!(cache.refresh(3).is_none());
    gate.wait();
    assert_eq!(*running.join().unwrap().unwrap(), 3);
    assert!(cache.contains(&3));
}

#[test]
fn miss_during_refresh_waits_for_it() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = Arc::clone(&calls);
    let cache: cairn::Cache<u64, u64> = CacheBuilder::new(10)
        .loader(move |key: &u64| {
            calls2.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            Ok::<_, Unavailable>(*key * 10)
        })
        .build();

    let refresh = cache.refresh(2).expect("leader");
    thread::sleep(Duration::from_millis(20));
    assert_eq!(*cache.get(&2).unwrap(), 20);
    refresh.join().unwrap().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
