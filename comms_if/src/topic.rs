//! # Topics
//!
//! Latest-value publish/subscribe plumbing. A subscriber never consumes messages, it polls
//! whether a newer message than the one it last copied has been published, and copies it out.
//! Stale data is not an error at this level, consumers check message timestamps themselves.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};
use log::trace;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Read side of a topic.
pub trait Subscription<T> {
    /// Returns `true` if a message has been published since the last `copy`.
    fn updated(&self) -> bool;

    /// Copy out the latest message, marking it as seen. Returns `None` if nothing has ever been
    /// published.
    fn copy(&mut self) -> Option<T>;
}

/// Write side of a topic.
pub trait Publication<T> {
    /// Publish a message, replacing any previous one.
    fn publish(&mut self, msg: T);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

struct Slot<T> {
    msg: Option<T>,

    /// Incremented on every publish
    generation: u64,
}

/// Publisher half of an in-process topic.
pub struct TopicPublisher<T> {
    slot: Arc<Mutex<Slot<T>>>
}

/// Subscriber half of an in-process topic.
pub struct TopicSubscriber<T> {
    slot: Arc<Mutex<Slot<T>>>,

    /// Generation of the last copied message
    last_generation: u64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new in-process topic.
pub fn topic<T: Clone>() -> (TopicPublisher<T>, TopicSubscriber<T>) {
    let slot = Arc::new(Mutex::new(Slot {
        msg: None,
        generation: 0
    }));

    (
        TopicPublisher { slot: slot.clone() },
        TopicSubscriber { slot, last_generation: 0 }
    )
}

/// Lock the slot, recovering the data if a previous holder panicked.
fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    match slot.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner()
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Clone> TopicPublisher<T> {
    /// Create another subscriber to this topic. The new subscriber sees the current message as
    /// unread.
    pub fn subscribe(&self) -> TopicSubscriber<T> {
        TopicSubscriber {
            slot: self.slot.clone(),
            last_generation: 0
        }
    }
}

impl<T: Clone> Publication<T> for TopicPublisher<T> {
    fn publish(&mut self, msg: T) {
        let mut slot = lock(&self.slot);
        slot.msg = Some(msg);
        slot.generation += 1;
        trace!("Topic published generation {}", slot.generation);
    }
}

impl<T: Clone> Subscription<T> for TopicSubscriber<T> {
    fn updated(&self) -> bool {
        lock(&self.slot).generation != self.last_generation
    }

    fn copy(&mut self) -> Option<T> {
        let slot = lock(&self.slot);
        self.last_generation = slot.generation;
        slot.msg.clone()
    }
}

/// Publishing into a `Vec` records every message, which is useful for collecting telemetry.
impl<T> Publication<T> for Vec<T> {
    fn publish(&mut self, msg: T) {
        self.push(msg);
    }
}
