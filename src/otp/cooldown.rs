use crate::schedule::{ScheduledTask, Scheduler};
use std::{
    ops::ControlFlow,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

/// Seconds the user waits before another OTP can be requested.
pub const RESEND_COOLDOWN_SECS: u64 = 30;

const TICK: Duration = Duration::from_secs(1);

/// Resend cooldown: a counter decremented once per second by a scheduled
/// task. The counter never goes below zero and the task stops at zero.
#[derive(Debug, Default)]
pub struct Cooldown {
    remaining: Arc<AtomicU64>,
    ticker: Option<ScheduledTask>,
}

impl Cooldown {
    /// Resets the counter to `window` seconds and replaces any running ticker.
    pub fn start(&mut self, scheduler: &dyn Scheduler, window: u64) {
        self.cancel();
        self.remaining.store(window, Ordering::SeqCst);
        if window == 0 {
            return;
        }

        let remaining = self.remaining.clone();
        self.ticker = Some(scheduler.schedule_repeating(
            TICK,
            Box::new(move || {
                let previous = remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                        Some(value.saturating_sub(1))
                    })
                    .unwrap_or(0);
                if previous <= 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }),
        ));
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining() > 0
    }

    /// Stops ticking; the counter keeps its current value.
    pub fn cancel(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualScheduler;

    #[test]
    fn counts_down_to_zero_and_stops() {
        let scheduler = ManualScheduler::new();
        let mut cooldown = Cooldown::default();
        cooldown.start(&scheduler, RESEND_COOLDOWN_SECS);
        assert_eq!(cooldown.remaining(), 30);

        scheduler.advance(Duration::from_secs(29));
        assert_eq!(cooldown.remaining(), 1);
        assert!(cooldown.is_active());

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(cooldown.remaining(), 0);
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance(Duration::from_secs(10));
        assert_eq!(cooldown.remaining(), 0);
    }

    #[test]
    fn restart_replaces_previous_ticker() {
        let scheduler = ManualScheduler::new();
        let mut cooldown = Cooldown::default();
        cooldown.start(&scheduler, 30);
        scheduler.advance(Duration::from_secs(10));
        cooldown.start(&scheduler, 30);
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(cooldown.remaining(), 29);
    }

    #[test]
    fn cancel_freezes_counter() {
        let scheduler = ManualScheduler::new();
        let mut cooldown = Cooldown::default();
        cooldown.start(&scheduler, 30);
        scheduler.advance(Duration::from_secs(5));
        cooldown.cancel();

        scheduler.advance(Duration::from_secs(60));
        assert_eq!(cooldown.remaining(), 25);
        assert_eq!(scheduler.pending(), 0);
    }
}
