//! The epoch word: the single point of total ordering between worker
//! threads.
//!
//! One atomic 64-bit value packs which of the two configuration buffers is
//! authoritative (bit 0) and how many threads have acknowledged the current
//! epoch (the remaining bits). Every mutation is a compare-and-swap, so the
//! selector and the quorum counter always change together.

use std::sync::atomic::{AtomicU64, Ordering};

const ACTIVE_BIT: u64 = 1;
const ACK_SHIFT: u32 = 1;

/// Decoded snapshot of the epoch word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    /// `false`: the first configuration buffer is active; `true`: the second.
    pub second_active: bool,
    /// No-update acknowledgments recorded for this epoch.
    pub acks: u32,
}

impl Epoch {
    fn pack(self) -> u64 {
        (self.second_active as u64) | ((self.acks as u64) << ACK_SHIFT)
    }

    fn unpack(word: u64) -> Self {
        Self {
            second_active: word & ACTIVE_BIT != 0,
            acks: (word >> ACK_SHIFT) as u32,
        }
    }
}

/// The shared atomic epoch.
#[derive(Debug, Default)]
pub struct EpochCell(AtomicU64);

impl EpochCell {
    /// First buffer active, zero acknowledgments.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Epoch {
        Epoch::unpack(self.0.load(Ordering::Acquire))
    }

    /// Record one no-update acknowledgment toward the current epoch.
    ///
    /// Counts only while the active-buffer bit still matches the caller's
    /// local view: a caller that lost the race to a flip must hand off
    /// first and acknowledge the new epoch on a later cycle. Returns
    /// whether the acknowledgment was recorded.
    pub fn try_ack(&self, local_second_active: bool) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let epoch = Epoch::unpack(current);
            if epoch.second_active != local_second_active {
                return false;
            }
            let next = Epoch {
                acks: epoch.acks + 1,
                ..epoch
            }
            .pack();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Publish the other buffer as active and reset the quorum counter.
    /// Fails without retrying when the word changed since `seen` was read;
    /// the caller retries on its next reshard interval.
    pub fn try_flip(&self, seen: Epoch) -> bool {
        let next = Epoch {
            second_active: !seen.second_active,
            acks: 0,
        }
        .pack();
        self.0
            .compare_exchange(seen.pack(), next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_on_first_buffer_with_no_acks() {
        let cell = EpochCell::new();
        assert_eq!(
            cell.load(),
            Epoch {
                second_active: false,
                acks: 0
            }
        );
    }

    #[test]
    fn acks_accumulate_for_a_matching_view() {
        let cell = EpochCell::new();
        assert!(cell.try_ack(false));
        assert!(cell.try_ack(false));
        assert_eq!(cell.load().acks, 2);
    }

    #[test]
    fn ack_with_stale_view_is_refused() {
        let cell = EpochCell::new();
        assert!(!cell.try_ack(true));
        assert_eq!(cell.load().acks, 0);
    }

    #[test]
    fn flip_switches_buffer_and_resets_acks() {
        let cell = EpochCell::new();
        assert!(cell.try_ack(false));
        let seen = cell.load();
        assert!(cell.try_flip(seen));
        assert_eq!(
            cell.load(),
            Epoch {
                second_active: true,
                acks: 0
            }
        );
    }

    #[test]
    fn flip_fails_when_the_word_moved() {
        let cell = EpochCell::new();
        let seen = cell.load();
        assert!(cell.try_ack(false));
        assert!(!cell.try_flip(seen), "a concurrent ack invalidates the CAS");
        assert_eq!(cell.load().acks, 1);
    }

    #[test]
    fn concurrent_acks_are_all_counted() {
        let cell = Arc::new(EpochCell::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    assert!(cell.try_ack(false));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cell.load().acks, 800);
    }
}
