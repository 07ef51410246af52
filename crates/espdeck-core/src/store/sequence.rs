// ── Per-kind request sequencing ──
//
// Each read kind numbers its requests. A response is applied only if its
// number is still the latest issued for that kind; issuing and the
// check-then-apply share one lock so they never interleave.

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    latest: Mutex<u64>,
}

impl Sequencer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve the next sequence number.
    pub(crate) fn issue(&self) -> u64 {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest += 1;
        *latest
    }

    /// Run `apply` if `seq` is still the latest issued. Returns whether it ran.
    pub(crate) fn commit(&self, seq: u64, apply: impl FnOnce()) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if *latest != seq {
            return false;
        }
        apply();
        true
    }

    /// The most recently issued number (0 before the first request).
    pub(crate) fn latest(&self) -> u64 {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_increase() {
        let seq = Sequencer::new();
        assert_eq!(seq.latest(), 0);
        assert_eq!(seq.issue(), 1);
        assert_eq!(seq.issue(), 2);
        assert_eq!(seq.latest(), 2);
    }

    #[test]
    fn latest_commits() {
        let seq = Sequencer::new();
        let n = seq.issue();
        let mut applied = false;
        assert!(seq.commit(n, || applied = true));
        assert!(applied);
    }

    #[test]
    fn superseded_response_is_discarded() {
        let seq = Sequencer::new();
        let older = seq.issue();
        let newer = seq.issue();

        let mut applied = Vec::new();
        assert!(seq.commit(newer, || applied.push(newer)));
        assert!(!seq.commit(older, || applied.push(older)));
        assert_eq!(applied, [newer]);
    }

    #[test]
    fn older_response_arriving_first_is_discarded_too() {
        let seq = Sequencer::new();
        let older = seq.issue();
        let _newer = seq.issue();

        let mut ran = false;
        assert!(!seq.commit(older, || ran = true));
        assert!(!ran);
    }
}
