// ============================================
// src/schedule.rs
// One-shot timers tagged with the generation they were scheduled in
// ============================================

use std::time::{Duration, Instant};

use log::debug;

/// Delay before the correct answer is read back after a right answer.
pub const SPEAK_ANSWER_DELAY: Duration = Duration::from_millis(300);
/// Delay between answer feedback and moving on.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(700);

#[derive(Debug)]
struct Timer<A> {
    due: Instant,
    generation: u64,
    action: A,
}

/// Pending delayed actions.
///
/// Every superseding state change calls [`Scheduler::invalidate`]; timers
/// scheduled before that are discarded when they come due instead of firing.
#[derive(Debug)]
pub struct Scheduler<A> {
    generation: u64,
    timers: Vec<Timer<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            generation: 0,
            timers: Vec::new(),
        }
    }
}

impl<A: std::fmt::Debug> Scheduler<A> {
    /// Makes every timer scheduled so far stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, action: A) {
        self.timers.push(Timer {
            due: now + delay,
            generation: self.generation,
            action,
        });
    }

    /// Removes the timers due at `now` and returns the live ones in due order.
    pub fn take_due(&mut self, now: Instant) -> Vec<A> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.due <= now);
        self.timers = rest;
        due.sort_by_key(|t| t.due);

        let current = self.generation;
        due.into_iter()
            .filter_map(|t| {
                if t.generation == current {
                    Some(t.action)
                } else {
                    debug!("[schedule] dropping stale {:?} from generation {}", t.action, t.generation);
                    None
                }
            })
            .collect()
    }

    /// Whether a live (current generation) timer matches `pred`.
    pub fn has_pending(&self, pred: impl Fn(&A) -> bool) -> bool {
        self.timers
            .iter()
            .any(|t| t.generation == self.generation && pred(&t.action))
    }

    /// Earliest due time among live timers.
    #[cfg(test)]
    pub fn next_due(&self) -> Option<Instant> {
        self.timers
            .iter()
            .filter(|t| t.generation == self.generation)
            .map(|t| t.due)
            .min()
    }
}
