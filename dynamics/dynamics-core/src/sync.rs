//! Per-body exclusive lock.
//!
//! Critical sections in the solver are a handful of vector operations, far
//! shorter than a parked-thread round trip, so the lock spins with bounded
//! backoff instead of suspending.

use std::sync::atomic::{AtomicBool, Ordering};

/// Number of busy spins before the spinner starts yielding its timeslice.
const SPINS_BEFORE_YIELD: u32 = 64;

/// A short-duration exclusive lock backed by a single atomic flag.
///
/// Acquisition spins with exponential backoff and falls back to
/// `thread::yield_now` under contention. Critical sections must never
/// suspend.
#[derive(Debug, Default)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    /// Create an unlocked lock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Acquire the lock, spinning until it is available.
    pub fn lock(&self) -> SpinLockGuard<'_> {
        let mut spins = 0_u32;
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            // Wait for the flag to look free before retrying the swap, so
            // contended acquisition doesn't ping-pong the cache line.
            while self.locked.load(Ordering::Relaxed) {
                if spins < SPINS_BEFORE_YIELD {
                    spins += 1;
                    for _ in 0..spins.min(16) {
                        std::hint::spin_loop();
                    }
                } else {
                    std::thread::yield_now();
                }
            }
        }
    }

    /// Try to acquire the lock without spinning.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinLockGuard { lock: self })
        } else {
            None
        }
    }

    /// Whether the lock is currently held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// RAII guard releasing the lock on drop.
#[must_use]
pub struct SpinLockGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for SpinLockGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinLockGuard").finish_non_exhaustive()
    }
}
