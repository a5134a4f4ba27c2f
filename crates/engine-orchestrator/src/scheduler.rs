//! Epoch-tagged task scheduling for per-mode work.
//!
//! Every task spawned here belongs to the generation that was current when it
//! started. Advancing the generation aborts all of its tasks, and anything
//! they already sent back carries the old [`Epoch`], so the receiver can
//! recognise and discard it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Generation token captured by a task when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

/// Owns the tasks of the current generation.
pub struct TaskScheduler {
    epoch: Epoch,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            epoch: Epoch(0),
            tasks: Vec::new(),
        }
    }

    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.epoch == epoch
    }

    /// Aborts every task of the current generation and opens the next one.
    ///
    /// Must be called before any task of the new generation is spawned.
    pub fn advance(&mut self) -> Epoch {
        for (name, handle) in self.tasks.drain(..) {
            if !handle.is_finished() {
                tracing::debug!("Aborting {} task of {}", name, self.epoch);
            }
            handle.abort();
        }
        self.epoch = self.epoch.next();
        tracing::trace!("Task scheduler advanced to {}", self.epoch);
        self.epoch
    }

    /// Spawns a one-shot task in the current generation.
    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.prune();
        self.tasks.push((name, tokio::spawn(task)));
    }

    /// Spawns a recurring task in the current generation.
    ///
    /// `tick` runs once per `period`, first after one full period. A tick is
    /// awaited before the next one is scheduled, so ticks of the same loop
    /// never overlap. The loop ends when `tick` returns `false`.
    pub fn spawn_interval<F, Fut>(&mut self, name: &'static str, period: Duration, mut tick: F)
    where
        F: FnMut(Epoch) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let epoch = self.epoch;
        let period = period.max(Duration::from_millis(1));

        self.spawn(name, async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !tick(epoch).await {
                    tracing::debug!("{} loop of {} exiting", name, epoch);
                    break;
                }
            }
        });
    }

    /// Number of tasks of the current generation still running.
    pub fn active_tasks(&mut self) -> usize {
        self.prune();
        self.tasks.len()
    }

    fn prune(&mut self) {
        self.tasks.retain(|(_, handle)| !handle.is_finished());
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for (_, handle) in &self.tasks {
            handle.abort();
        }
    }
}
