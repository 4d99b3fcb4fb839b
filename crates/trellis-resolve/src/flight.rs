//! Single-flight coordination.
//!
//! A [`SingleFlight`] maps a key to the slot of the one piece of work
//! currently running for it. The first caller for a key becomes the leader
//! and runs the work; callers arriving while it runs become followers and
//! block until the leader publishes its outcome, which they receive as a
//! clone.
//!
//! Slots exist only while work is in flight. The leader removes its slot
//! from the map on every exit path (success, failure, or unwinding) before
//! waking followers, so the next caller after completion starts fresh.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Which part a caller played in a flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Leader,
    Follower,
}

/// What a caller of [`SingleFlight::run`] observed.
#[derive(Debug)]
pub enum Flight<T, E> {
    /// This caller ran the work.
    Leader(Result<T, E>),
    /// Another caller ran the work; this is a clone of its outcome.
    Follower(Result<T, E>),
    /// The leader unwound without publishing an outcome.
    Abandoned,
}

impl<T, E> Flight<T, E> {
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Leader(_) => Some(Role::Leader),
            Self::Follower(_) => Some(Role::Follower),
            Self::Abandoned => None,
        }
    }

    /// The outcome, or `None` if the flight was abandoned.
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            Self::Leader(r) | Self::Follower(r) => Some(r),
            Self::Abandoned => None,
        }
    }
}

enum SlotState<T, E> {
    Pending,
    Done(Result<T, E>),
    Abandoned,
}

struct Slot<T, E> {
    state: Mutex<SlotState<T, E>>,
    done: Condvar,
}

impl<T: Clone, E: Clone> Slot<T, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            done: Condvar::new(),
        }
    }

    fn publish(&self, state: SlotState<T, E>) {
        *lock(&self.state) = state;
        self.done.notify_all();
    }

    fn wait(&self) -> Option<Result<T, E>> {
        let mut state = lock(&self.state);
        while matches!(*state, SlotState::Pending) {
            state = self
                .done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        match &*state {
            SlotState::Done(result) => Some(result.clone()),
            SlotState::Abandoned | SlotState::Pending => None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deduplicates concurrent work by key.
pub struct SingleFlight<K, T, E> {
    slots: Mutex<HashMap<K, Arc<Slot<T, E>>>>,
}

impl<K, T, E> SingleFlight<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key` unless it is already running, in which case wait
    /// for the running instance and share its outcome.
    pub fn run<F>(&self, key: K, work: F) -> Flight<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let (slot, leader) = {
            let mut slots = lock(&self.slots);
            match slots.get(&key) {
                Some(slot) => (Arc::clone(slot), false),
                None => {
                    let slot = Arc::new(Slot::new());
                    slots.insert(key.clone(), Arc::clone(&slot));
                    (slot, true)
                }
            }
        };

        if !leader {
            return match slot.wait() {
                Some(result) => Flight::Follower(result),
                None => Flight::Abandoned,
            };
        }

        let mut guard = LeaderGuard {
            flight: self,
            key: &key,
            slot,
            outcome: None,
        };
        let result = work();
        guard.outcome = Some(result.clone());
        drop(guard);
        Flight::Leader(result)
    }

    /// Number of keys with work currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.slots).len()
    }
}

impl<K, T, E> Default for SingleFlight<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T, E> fmt::Debug for SingleFlight<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &lock(&self.slots).len())
            .finish()
    }
}

/// Removes the leader's slot and wakes followers when dropped.
struct LeaderGuard<'a, K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    flight: &'a SingleFlight<K, T, E>,
    key: &'a K,
    slot: Arc<Slot<T, E>>,
    outcome: Option<Result<T, E>>,
}

impl<K, T, E> Drop for LeaderGuard<'_, K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        lock(&self.flight.slots).remove(self.key);
        let state = match self.outcome.take() {
            Some(result) => SlotState::Done(result),
            None => SlotState::Abandoned,
        };
        self.slot.publish(state);
    }
}
