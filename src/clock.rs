use core::time::Duration;

/// Monotonic time source used to bound response waits.
pub trait Clock {
    /// Time since an arbitrary fixed point. Must never go backwards.
    fn now(&self) -> Duration;

    /// Called on every turn of a busy-wait loop.
    fn relax(&self) {
        core::hint::spin_loop();
    }
}

/// [`Clock`] backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn relax(&self) {
        std::thread::yield_now();
    }
}
