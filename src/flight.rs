//! Per-key load de-duplication ("single flight").
//!
//! When several threads miss on the same key at once, exactly one of them (the
//! *leader*) runs the loader; the others (*waiters*) block until the leader
//! publishes its outcome and then return a clone of it.  Loads for different
//! keys are independent and run in parallel.
//!
//! ```text
//!   thread A ──miss──▶ join(k) ── Leader ──▶ load + commit ──▶ finish(result)
//!   thread B ──miss──▶ join(k) ── Waiter ──▶ wait ◀──────────── notify_all
//!   thread C ──miss──▶ join(k) ── Waiter ──▶ wait ◀──────────┘
//! ```
//!
//! The in-flight table has its own mutex and is never held across the loader
//! call, so the cache's structural lock and this table are never nested.
//!
//! A failed load is handed to every waiter of that attempt and then forgotten:
//! the next call for the key starts a fresh attempt.  If the leader unwinds
//! without publishing a result, the flight is *abandoned* and the waiters race
//! for leadership again.

use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::{Condvar, Mutex};

use crate::error::CacheError;

enum State<T> {
    Pending,
    Done(Result<T, CacheError>),
    Abandoned,
}

/// One in-flight load, shared by its leader and all of its waiters.
struct Call<T> {
    state: Mutex<State<T>>,
    done: Condvar,
}

impl<T: Clone> Call<T> {
    fn new() -> Self {
        Call {
            state: Mutex::new(State::Pending),
            done: Condvar::new(),
        }
    }

    /// Blocks until the leader finishes.  `None` means the flight was abandoned.
    fn wait(&self) -> Option<Result<T, CacheError>> {
        let mut state = self.state.lock();
        while matches!(*state, State::Pending) {
            self.done.wait(&mut state);
        }
        match &*state {
            State::Done(result) => Some(result.clone()),
            State::Abandoned | State::Pending => None,
        }
    }
}

type Calls<K, T> = Arc<Mutex<AHashMap<K, Arc<Call<T>>>>>;

enum Role<K: Hash + Eq, T> {
    Leader(Flight<K, T>),
    Waiter(Arc<Call<T>>),
}

/// Table of in-flight loads keyed by cache key.
pub struct LoadGroup<K, T> {
    calls: Calls<K, T>,
}

impl<K, T> LoadGroup<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone,
{
    pub fn new() -> Self {
        LoadGroup {
            calls: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Runs `f` for `key` unless a load for `key` is already in flight, in
    /// which case blocks for that load's outcome instead.
    ///
    /// Returns the outcome and whether this caller was the leader that ran `f`.
    pub fn work<F>(&self, key: &K, f: F) -> (Result<T, CacheError>, bool)
    where
        F: FnOnce() -> Result<T, CacheError>,
    {
        loop {
            match self.join(key) {
                Role::Leader(flight) => {
                    let result = f();
                    flight.finish(result.clone());
                    return (result, true);
                }
                Role::Waiter(call) => {
                    if let Some(result) = call.wait() {
                        return (result, false);
                    }
                    tracing::debug!("in-flight load abandoned, retrying");
                }
            }
        }
    }

    /// Claims leadership for `key` without blocking.
    ///
    /// Returns `None` if a load for `key` is already in flight.  The returned
    /// [`Flight`] may be moved to another thread; callers joining the key in
    /// the meantime wait for it.
    pub fn try_begin(&self, key: &K) -> Option<Flight<K, T>> {
        match self.join(key) {
            Role::Leader(flight) => Some(flight),
            Role::Waiter(_) => None,
        }
    }

    /// Number of loads currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    fn join(&self, key: &K) -> Role<K, T> {
        let mut calls = self.calls.lock();
        if let Some(call) = calls.get(key) {
            return Role::Waiter(Arc::clone(call));
        }
        let call = Arc::new(Call::new());
        calls.insert(key.clone(), Arc::clone(&call));
        Role::Leader(Flight {
            calls: Arc::clone(&self.calls),
            key: key.clone(),
            call,
            finished: false,
        })
    }
}

impl<K, T> Default for LoadGroup<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Leadership over one in-flight load.
///
/// Must be completed with [`finish`](Flight::finish).  Dropping it unfinished
/// (e.g. while unwinding from a panicking loader) abandons the flight and wakes
/// the waiters.
pub struct Flight<K: Hash + Eq, T> {
    calls: Calls<K, T>,
    key: K,
    call: Arc<Call<T>>,
    finished: bool,
}

impl<K: Hash + Eq, T> Flight<K, T> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Publishes the outcome to every waiter and retires the flight.
    pub fn finish(mut self, result: Result<T, CacheError>) {
        self.finished = true;
        self.retire(State::Done(result));
    }

    fn retire(&self, state: State<T>) {
        self.calls.lock().remove(&self.key);
        *self.call.state.lock() = state;
        self.call.done.notify_all();
    }
}

impl<K: Hash + Eq, T> Drop for Flight<K, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.retire(State::Abandoned);
        }
    }
}
