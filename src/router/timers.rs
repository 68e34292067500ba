// Timer intervals and the schedule of pending timer events

use rand::Rng;

use crate::Ticks;

/// Timer intervals in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    /// Periodic full advertisement
    pub update_interval: Ticks,
    /// Age at which a route goes unreachable
    pub timeout: Ticks,
    /// Age at which a route is removed
    pub deletion: Ticks,
    /// Upper bound of the random triggered-update suppression delay
    pub triggered_max: Ticks,
    /// How often the aging sweep runs
    pub sweep_interval: Ticks,
}

impl Timers {
    pub fn from_secs(update: u64, timeout: u64, deletion: u64, triggered_max: u64, sweep: u64) -> Self {
        let ms = |secs: u64| secs.saturating_mul(1000) as Ticks;
        Timers {
            update_interval: ms(update),
            timeout: ms(timeout),
            deletion: ms(deletion),
            triggered_max: ms(triggered_max),
            sweep_interval: ms(sweep),
        }
    }
}

impl Default for Timers {
    fn default() -> Self {
        Timers::from_secs(30, 180, 300, 5, 5)
    }
}

/// Deadlines of the three timer-driven activities
#[derive(Debug, Clone)]
pub struct Schedule {
    next_update: Ticks,
    next_sweep: Ticks,
    triggered_ready_at: Ticks,
}

impl Schedule {
    pub fn new(now: Ticks, timers: &Timers) -> Self {
        Schedule {
            next_update: now + timers.update_interval,
            next_sweep: now + timers.sweep_interval,
            triggered_ready_at: now,
        }
    }

    pub fn update_due(&self, now: Ticks) -> bool {
        now >= self.next_update
    }

    pub fn sweep_due(&self, now: Ticks) -> bool {
        now >= self.next_sweep
    }

    pub fn triggered_allowed(&self, now: Ticks) -> bool {
        now >= self.triggered_ready_at
    }

    pub fn rearm_update(&mut self, now: Ticks, timers: &Timers) {
        self.next_update = now + timers.update_interval;
    }

    pub fn rearm_sweep(&mut self, now: Ticks, timers: &Timers) {
        self.next_sweep = now + timers.sweep_interval;
    }

    /// Suppresses further triggered updates for a random whole number of
    /// seconds in `1..=triggered_max`.
    pub fn suppress_triggered<R: Rng>(&mut self, now: Ticks, timers: &Timers, rng: &mut R) {
        let max_secs = (timers.triggered_max / 1000).max(1);
        let delay = rng.gen_range(1..=max_secs) * 1000;
        self.triggered_ready_at = now + delay;
    }

    /// Earliest time at which `poll` has work to do
    pub fn next_deadline(&self, changes_pending: bool) -> Ticks {
        let mut deadline = self.next_update.min(self.next_sweep);
        if changes_pending {
            deadline = deadline.min(self.triggered_ready_at);
        }
        deadline
    }
}
