//! Cancellable timers and the trailing-edge debouncer built on them.
//!
//! The binder never sleeps or spawns on its own: debounced renders go
//! through a [`Scheduler`], so hosts can plug in their own event loop.
//! [`ManualScheduler`] runs on a virtual clock and is what tests and
//! single-threaded hosts use; [`ThreadScheduler`] is the default.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{trace, warn};

use crate::lock;

/// Work scheduled to run once after a delay.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Host timer facility.
pub trait Scheduler: Send + Sync + 'static {
    /// Run `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerId;

    /// Prevent a scheduled task from running. Returns false if it already
    /// ran or was cancelled before.
    fn cancel(&self, id: TimerId) -> bool;
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    // Ordered by (deadline, id), so equal deadlines run in scheduling order.
    queue: BTreeMap<(Duration, u64), TimerTask>,
    deadlines: HashMap<u64, Duration>,
}

/// Scheduler driven by an explicit virtual clock.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
/// use bindwork_client::{ManualScheduler, Scheduler};
///
/// let scheduler = ManualScheduler::new();
/// let fired = Arc::new(AtomicUsize::new(0));
/// let counter = fired.clone();
/// scheduler.schedule(Duration::from_millis(10), Box::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// scheduler.advance(Duration::from_millis(9));
/// assert_eq!(fired.load(Ordering::SeqCst), 0);
/// scheduler.advance(Duration::from_millis(1));
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        lock(&self.state).now
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Move the clock forward by `by`, running every task that falls due in
    /// deadline order. Tasks scheduled by those tasks run too if they fall
    /// due inside the window. Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = lock(&self.state).now + by;
        let mut ran = 0;

        loop {
            let task = {
                let mut state = lock(&self.state);
                let due = state
                    .queue
                    .first_key_value()
                    .map(|(&key, _)| key)
                    .filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        state.now = key.0;
                        state.deadlines.remove(&key.1);
                        state.queue.remove(&key)
                    }
                    None => None,
                }
            };

            // The lock is released before the task runs; tasks may schedule.
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }

        lock(&self.state).now = target;
        trace!("ManualScheduler advanced to {:?}, ran {} task(s)", target, ran);
        ran
    }

    /// Run every task that is already due without moving the clock.
    pub fn run_due(&self) -> usize {
        self.advance(Duration::ZERO)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerId {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.now + delay;
        state.queue.insert((deadline, id), task);
        state.deadlines.insert(id, deadline);
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = lock(&self.state);
        match state.deadlines.remove(&id.0) {
            Some(deadline) => state.queue.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

/// Scheduler that sleeps on a dedicated thread per task.
#[derive(Default)]
pub struct ThreadScheduler {
    next_id: AtomicU64,
    cancelled: Arc<Mutex<HashMap<u64, Arc<AtomicBool>>>>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let flag = Arc::new(AtomicBool::new(false));
        lock(&self.cancelled).insert(id, flag.clone());

        let registry = self.cancelled.clone();
        let spawned = thread::Builder::new()
            .name(format!("bindwork-timer-{}", id))
            .spawn(move || {
                thread::sleep(delay);
                lock(&registry).remove(&id);
                if !flag.load(Ordering::Acquire) {
                    task();
                }
            });

        if let Err(e) = spawned {
            warn!("Could not spawn timer thread, dropping task: {}", e);
            lock(&self.cancelled).remove(&id);
        }
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        match lock(&self.cancelled).remove(&id.0) {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadScheduler")
            .field("pending", &lock(&self.cancelled).len())
            .finish()
    }
}

/// Trailing-edge debouncer.
///
/// Every [`Debouncer::schedule`] call cancels the pending task and starts a
/// new window, so a burst of calls closer together than `wait` runs only the
/// last task, `wait` after the last call. Each scheduled task is tagged with
/// a generation number; [`Debouncer::settle`] tells a firing task whether it
/// is still the current one, which guards against a scheduler that could not
/// cancel in time.
pub struct Debouncer {
    wait: Duration,
    scheduler: Arc<dyn Scheduler>,
    pending: Option<(u64, TimerId)>,
    generation: u64,
}

impl Debouncer {
    pub fn new(wait: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            wait,
            scheduler,
            pending: None,
            generation: 0,
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Restart the window with a task built from its generation number.
    pub fn schedule<F>(&mut self, make_task: F) -> TimerId
    where
        F: FnOnce(u64) -> TimerTask,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let id = self.scheduler.schedule(self.wait, make_task(generation));
        self.pending = Some((generation, id));
        id
    }

    /// Called by a firing task: true (and clears the pending slot) only if
    /// `generation` is the task currently pending.
    pub fn settle(&mut self, generation: u64) -> bool {
        match self.pending {
            Some((current, _)) if current == generation => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((_, id)) => self.scheduler.cancel(id),
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.wait)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
