//! Coalescing debounce timer
//!
//! Explicit timer state for collapsing rapid successive triggers into
//! one: a pending trigger is replaced, not queued, when superseded
//! within the window. The caller drives time, which keeps the type
//! free of any runtime dependency and directly testable.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Register a trigger, replacing any pending one and restarting
    /// the window.
    pub fn trigger(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.window);
    }

    /// Deadline of the pending trigger, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if the window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drop any pending trigger
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }
}
