//! FIFO pool of idle sessions.
//!
//! A session lives in the pool only while it is ready and has no request in
//! flight; checking one out moves it to the caller, so exclusive ownership is
//! enforced by the type system rather than by bookkeeping.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

pub(crate) struct SessionPool<T> {
    idle: Mutex<VecDeque<T>>,
    created: AtomicU64,
}

impl<T> SessionPool<T> {
    pub(crate) fn new() -> Self {
        Self {
            idle: Mutex::new(VecDeque::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Pop the head of the queue, if any.
    pub(crate) fn checkout(&self) -> Option<T> {
        self.idle.lock().pop_front()
    }

    /// Return a session to the back of the queue. Callers only check in
    /// sessions they have verified to be healthy.
    pub(crate) fn checkin(&self, session: T) {
        self.idle.lock().push_back(session);
    }

    /// Empty the pool, handing the drained sessions back for teardown.
    pub(crate) fn drain(&self) -> Vec<T> {
        self.idle.lock().drain(..).collect()
    }

    /// Count a freshly-constructed session. Exposed so callers can observe
    /// connection reuse.
    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_is_first_in_first_out() {
        let pool = SessionPool::new();
        pool.checkin(1u32);
        pool.checkin(2);
        pool.checkin(3);
        assert_eq!(pool.checkout(), Some(1));
        assert_eq!(pool.checkout(), Some(2));
        pool.checkin(4);
        assert_eq!(pool.checkout(), Some(3));
        assert_eq!(pool.checkout(), Some(4));
        assert_eq!(pool.checkout(), None);
    }

    #[test]
    fn drain_empties_the_pool() {
        let pool = SessionPool::new();
        pool.checkin("a");
        pool.checkin("b");
        assert_eq!(pool.drain(), vec!["a", "b"]);
        assert_eq!(pool.checkout(), None);
    }

    #[test]
    fn created_counts_only_explicit_records() {
        let pool = SessionPool::<u32>::new();
        assert_eq!(pool.created(), 0);
        pool.record_created();
        pool.record_created();
        assert_eq!(pool.created(), 2);
        // Check-ins are reuse, not creation.
        pool.checkin(1);
        assert_eq!(pool.created(), 2);
    }
}
