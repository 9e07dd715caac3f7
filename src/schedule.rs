//! Repeating scheduled tasks behind an injectable scheduler. Production code
//! uses [`TokioScheduler`]; tests drive [`ManualScheduler`] by hand so timers
//! can be checked without a real clock.

use std::{
    ops::ControlFlow,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};
use tokio::{task::AbortHandle, time};
use tracing::trace;

/// Body of a repeating task. Returning `Break` stops further ticks.
pub type Tick = Box<dyn FnMut() -> ControlFlow<()> + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Runs `tick` every `period`, first after one full period.
    fn schedule_repeating(&self, period: Duration, tick: Tick) -> ScheduledTask;
}

/// Handle to a scheduled task. Cancelling or dropping it guarantees no
/// further ticks run.
#[derive(Debug)]
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl ScheduledTask {
    fn new(cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawns one tokio task per schedule. Must be used inside a runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, mut tick: Tick) -> ScheduledTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) || tick().is_break() {
                    break;
                }
            }
            trace!("scheduled task finished");
        });

        ScheduledTask::new(cancelled, Some(handle.abort_handle()))
    }
}

struct ManualEntry {
    period: Duration,
    next_due: Duration,
    cancelled: Arc<AtomicBool>,
    tick: Tick,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    entries: Vec<ManualEntry>,
}

/// Virtual-clock scheduler: nothing runs until [`ManualScheduler::advance`].
#[derive(Clone, Default)]
pub struct ManualScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the virtual clock forward, running every tick that falls due in
    /// order of its due time. Ticks run with the clock unlocked, so they may
    /// schedule or cancel tasks on this same scheduler.
    pub fn advance(&self, by: Duration) {
        let Some(target) = self.lock().map(|clock| clock.now + by) else {
            return;
        };

        while let Some(mut entry) = self.take_due(target) {
            if (entry.tick)().is_break() {
                entry.cancelled.store(true, Ordering::SeqCst);
                continue;
            }
            entry.next_due += entry.period;
            if let Some(mut clock) = self.lock() {
                clock.entries.push(entry);
            }
        }

        if let Some(mut clock) = self.lock() {
            clock.now = clock.now.max(target);
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, ManualClock>> {
        self.clock.lock().ok()
    }

    /// Removes the earliest live entry due at or before `target` and moves the
    /// clock to its due time.
    fn take_due(&self, target: Duration) -> Option<ManualEntry> {
        let mut clock = self.lock()?;
        clock
            .entries
            .retain(|entry| !entry.cancelled.load(Ordering::SeqCst));

        let index = clock
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.next_due <= target)
            .min_by_key(|(_, entry)| entry.next_due)
            .map(|(index, _)| index)?;

        let entry = clock.entries.swap_remove(index);
        clock.now = entry.next_due;
        Some(entry)
    }

    /// Live (not cancelled, not finished) tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.clock.lock().map_or(0, |clock| {
            clock
                .entries
                .iter()
                .filter(|entry| !entry.cancelled.load(Ordering::SeqCst))
                .count()
        })
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration, tick: Tick) -> ScheduledTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        if let Ok(mut clock) = self.clock.lock() {
            let next_due = clock.now + period;
            clock.entries.push(ManualEntry {
                period,
                next_due,
                cancelled: cancelled.clone(),
                tick,
            });
        }
        ScheduledTask::new(cancelled, None)
    }
}
