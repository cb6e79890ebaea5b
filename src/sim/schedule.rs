//! Cancellable scheduled tasks on simulated time
//!
//! Delayed effects (the throw recovery, the AI's charge release) are queued
//! here instead of running on wall-clock timers. Every task can be cancelled
//! through its handle, and the owner decides at fire time whether the task
//! still applies.

use serde::{Deserialize, Serialize};

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled<T> {
    id: u64,
    due: f32,
    payload: T,
}

/// A queue of delayed payloads driven by `advance(dt)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<T> {
    clock: f32,
    next_id: u64,
    tasks: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            clock: 0.0,
            next_id: 1,
            tasks: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `payload` to fire `delay` seconds from now
    pub fn schedule(&mut self, delay: f32, payload: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Scheduled {
            id,
            due: self.clock + delay.max(0.0),
            payload,
        });
        TaskHandle(id)
    }

    /// Cancel a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != handle.0);
        self.tasks.len() != before
    }

    /// Cancel every pending task whose payload matches
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !pred(&t.payload));
        before - self.tasks.len()
    }

    /// Drop everything that is pending
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.id == handle.0)
    }

    pub fn any_pending(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.tasks.iter().any(|t| pred(&t.payload))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advance the clock and return the payloads that came due, earliest first
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        self.clock += dt;
        if !self.tasks.iter().any(|t| t.due <= self.clock) {
            return Vec::new();
        }

        let clock = self.clock;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due <= clock);
        self.tasks = pending;

        // Ties resolve in scheduling order
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter().map(|t| t.payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut sched = Scheduler::new();
        sched.schedule(0.3, "recover");

        assert!(sched.advance(0.1).is_empty());
        assert!(sched.advance(0.1).is_empty());
        assert_eq!(sched.advance(0.15), vec!["recover"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_due_order() {
        let mut sched = Scheduler::new();
        sched.schedule(1.0, 2);
        sched.schedule(0.5, 1);
        sched.schedule(1.0, 3);

        assert_eq!(sched.advance(2.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel() {
        let mut sched = Scheduler::new();
        let handle = sched.schedule(0.5, 'a');
        sched.schedule(0.5, 'b');

        assert!(sched.is_pending(handle));
        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));
        assert_eq!(sched.advance(1.0), vec!['b']);
    }

    #[test]
    fn test_cancel_where() {
        let mut sched = Scheduler::new();
        sched.schedule(0.1, 1);
        sched.schedule(0.1, 2);
        sched.schedule(0.1, 3);

        assert_eq!(sched.cancel_where(|n| n % 2 == 1), 2);
        assert!(sched.any_pending(|n| *n == 2));
        assert_eq!(sched.advance(0.2), vec![2]);
    }
}
