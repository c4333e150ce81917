//! Frame pacing.
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::{constants::*, vm::Hz};

/// Timer to synchronize a thread with a fixed rate software clock.
///
/// It is designed to work with the yielding cooperative pattern
/// of the runner loop. When control is handed back to the caller,
/// time elapses until it is resumed. Once resumed, the elapsed time
/// is taken into account when determining the next tick.
pub struct Clock {
    interval: Duration,
    last: Instant,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// Clock ticking at the delay and sound timer rate.
    pub fn timer() -> Self {
        Self::new(Duration::from_nanos(TIMER_TICK_TIME))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Check whether at least one interval has elapsed since the last tick.
    pub fn tick(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last) >= self.interval {
            // Reset back to now, rather than trying to catch up.
            //
            // If the VM was paused for debugging, and a large
            // amount of time has elapsed until it is resumed,
            // it should simply continue at its usual speed.
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Block the current thread until the next clock tick.
    pub fn wait(&mut self) {
        loop {
            let elapsed = self.last.elapsed();
            if elapsed < self.interval {
                // Sleep does not have enough resolution for short remainders,
                // and spinning a loop causes high CPU usage.
                //
                // Sleep through most of the wait, then yield.
                let remaining = self.interval - elapsed;
                if remaining > Duration::from_millis(2) {
                    thread::sleep(remaining - Duration::from_millis(1));
                } else {
                    thread::yield_now();
                }
            } else {
                self.reset();
                return;
            }
        }
    }
}

/// Spreads a CPU clock speed over 60 frames per second.
///
/// Clock speeds that are not a multiple of 60 leave a fractional number
/// of cycles per frame, which is carried over to following frames so that
/// exactly `clock_hz` cycles are executed every second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBudget {
    clock_hz: u64,
    /// Carried cycles, in units of 1/60th of a cycle.
    remainder: u64,
}

impl CycleBudget {
    pub fn new(clock_frequency: Hz) -> Self {
        Self {
            clock_hz: clock_frequency.0,
            remainder: 0,
        }
    }

    pub fn clock_frequency(&self) -> Hz {
        Hz(self.clock_hz)
    }

    /// Change the clock speed, dropping any carried fraction.
    pub fn set_clock_frequency(&mut self, clock_frequency: Hz) {
        self.clock_hz = clock_frequency.0;
        self.remainder = 0;
    }

    /// Number of cycles to execute in the next frame.
    pub fn next_frame(&mut self) -> usize {
        let total = self.clock_hz + self.remainder;
        self.remainder = total % TIMER_FREQUENCY;
        (total / TIMER_FREQUENCY) as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_budget_multiple_of_60() {
        let mut budget = CycleBudget::new(Hz(600));
        assert!((0..60).all(|_| budget.next_frame() == 10));
    }

    #[test]
    fn test_budget_carries_fraction() {
        let mut budget = CycleBudget::new(Hz(500));

        let frames: Vec<usize> = (0..6).map(|_| budget.next_frame()).collect();
        assert_eq!(frames, vec![8, 8, 9, 8, 8, 9]);

        // Exactly one second's worth of cycles over 60 frames.
        let mut budget = CycleBudget::new(Hz(500));
        let total: usize = (0..60).map(|_| budget.next_frame()).sum();
        assert_eq!(total, 500);
    }

    #[test]
    fn test_budget_slow_clock() {
        let mut budget = CycleBudget::new(Hz(30));
        let frames: Vec<usize> = (0..4).map(|_| budget.next_frame()).collect();
        assert_eq!(frames, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_clock_tick() {
        let mut clock = Clock::new(Duration::ZERO);
        assert!(clock.tick());

        let mut clock = Clock::new(Duration::from_secs(3600));
        assert!(!clock.tick());
    }
}
