/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, trace};

use crate::actor::{AcquisitionStrategy, Philosopher};
use crate::common::banter;
use crate::common::{
    Chopstick, MealLedger, PhilosopherHandle, PhilosopherId, SymposiumConfig, SymposiumError,
    TableStatus, Vitals, Waiter,
};
use crate::traits::TableObserver;

/// A ring of philosophers and chopsticks, and the coordinator that runs it.
///
/// [`build`](Self::build) lays the ring out: philosopher `i` gets chopstick
/// `i` on its left and chopstick `(i + 1) % N` on its right, and every seat
/// gets its plan from the configured [`AcquisitionStrategy`].
/// [`start`](Self::start) lets everyone sit down at once,
/// [`stop`](Self::stop) asks everyone to leave, and
/// [`shutdown`](Self::shutdown) stops and waits for them.
///
/// `Table` is cheaply cloneable; clones share the same ring.
#[derive(Clone)]
pub struct Table(Arc<TableInner>);

struct TableInner {
    strategy: AcquisitionStrategy,
    chopsticks: Vec<Arc<Chopstick>>,
    handles: Vec<PhilosopherHandle>,
    waiter: Option<Arc<Waiter>>,
    seated: Mutex<Vec<Philosopher>>,
    tasks: Mutex<Vec<(PhilosopherId, JoinHandle<u64>)>>,
    started: AtomicBool,
    stop_requested: AtomicBool,
    cancellation_token: CancellationToken,
    start_gun: CancellationToken,
    ledger: Arc<MealLedger>,
    shutdown_timeout: Duration,
}

/// What [`Table::shutdown`] found when it collected the philosophers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Completed meals per seat.
    pub meals: Vec<u64>,
    /// Seats whose task did not finish within the shutdown timeout and was aborted.
    pub timed_out: Vec<PhilosopherId>,
    /// Seats whose task ended abnormally, with the join error.
    pub failed: Vec<(PhilosopherId, String)>,
}

impl ShutdownReport {
    /// Every philosopher left on its own within the timeout.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.timed_out.is_empty() && self.failed.is_empty()
    }

    /// Sum of all meals.
    #[must_use]
    pub fn total_meals(&self) -> u64 {
        self.meals.iter().sum()
    }
}

enum Departure {
    Left,
    Failed { seat: PhilosopherId, error: String },
    TimedOut { seat: PhilosopherId },
}

impl Table {
    /// Builds a table with a shuffled roster of stock names.
    ///
    /// # Errors
    ///
    /// [`SymposiumError::InvalidConfig`] if `config` fails validation.
    pub fn build(config: &SymposiumConfig, observer: Arc<dyn TableObserver>) -> Result<Self, SymposiumError> {
        let names = banter::roster(config.simulation.num_philosophers);
        Self::build_with_names(config, names, observer)
    }

    /// Builds a table seating `names[i]` at seat `i`.
    ///
    /// # Errors
    ///
    /// [`SymposiumError::InvalidConfig`] if `config` fails validation, or
    /// [`SymposiumError::NameCount`] if `names` does not have one entry per seat.
    pub fn build_with_names(
        config: &SymposiumConfig,
        names: Vec<String>,
        observer: Arc<dyn TableObserver>,
    ) -> Result<Self, SymposiumError> {
        config.validate()?;
        let simulation = &config.simulation;
        let seats = simulation.num_philosophers;
        if names.len() != seats {
            return Err(SymposiumError::NameCount {
                expected: seats,
                actual: names.len(),
            });
        }

        let chopsticks: Vec<Arc<Chopstick>> = (0..seats).map(|id| Arc::new(Chopstick::new(id))).collect();
        let waiter = (simulation.strategy == AcquisitionStrategy::AdmissionControlled)
            .then(|| Arc::new(Waiter::new(config.admission.capacity_for(seats))));
        let cancellation_token = CancellationToken::new();
        let start_gun = CancellationToken::new();
        let ledger = Arc::new(MealLedger::new(seats, simulation.termination, cancellation_token.clone()));

        let mut seated = Vec::with_capacity(seats);
        let mut handles = Vec::with_capacity(seats);
        for (id, name) in names.into_iter().enumerate() {
            let name: Arc<str> = name.into();
            let vitals = Arc::new(Vitals::default());
            let cancel = cancellation_token.child_token();
            let plan = simulation.strategy.plan_for(id, seats, config.admission.inner);
            trace!(seat = id, ?plan, "seating philosopher");

            handles.push(PhilosopherHandle::new(id, Arc::clone(&name), Arc::clone(&vitals), cancel.clone()));
            seated.push(Philosopher {
                id,
                name,
                left: Arc::clone(&chopsticks[id]),
                right: Arc::clone(&chopsticks[(id + 1) % seats]),
                plan,
                waiter: waiter.clone(),
                delays: config.delays.clone(),
                backoff: config.backoff,
                max_meals: simulation.max_meals,
                start_gun: start_gun.clone(),
                cancel,
                observer: Arc::clone(&observer),
                vitals,
                ledger: Arc::clone(&ledger),
            });
        }

        // Without a synchronized start nobody waits at the start line.
        if !simulation.synchronized_start {
            start_gun.cancel();
        }

        Ok(Self(Arc::new(TableInner {
            strategy: simulation.strategy,
            chopsticks,
            handles,
            waiter,
            seated: Mutex::new(seated),
            tasks: Mutex::new(Vec::with_capacity(seats)),
            started: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            cancellation_token,
            start_gun,
            ledger,
            shutdown_timeout: config.timeouts.shutdown_timeout(),
        })))
    }

    /// Spawns every philosopher on the current Tokio runtime.
    ///
    /// A second call, or a call after [`stop`](Self::stop), does nothing. A
    /// table runs at most once.
    ///
    /// # Errors
    ///
    /// [`SymposiumError::NoRuntime`] when called outside a Tokio runtime.
    #[instrument(skip(self), fields(strategy = %self.0.strategy, seats = self.len()))]
    pub fn start(&self) -> Result<(), SymposiumError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SymposiumError::NoRuntime)?;
        if self.0.started.swap(true, Ordering::AcqRel) {
            trace!("Table already started");
            return Ok(());
        }

        let seated = std::mem::take(&mut *self.0.seated.lock());
        {
            let mut tasks = self.0.tasks.lock();
            for philosopher in seated {
                let seat = philosopher.id;
                tasks.push((seat, runtime.spawn(philosopher.dine())));
            }
        }
        self.0.start_gun.cancel();
        info!("Philosophers are seated");
        Ok(())
    }

    /// Asks every philosopher to leave.
    ///
    /// Philosophers blocked on a chopstick or on the waiter are woken and
    /// unwind, putting down whatever they hold. Idempotent, and harmless for
    /// philosophers that already left. Stopping a table that never started
    /// dismisses its philosophers and prevents a later start.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        if self.0.stop_requested.swap(true, Ordering::AcqRel) {
            trace!("Stop already requested");
        } else {
            info!("Stopping the table");
        }
        if !self.0.started.swap(true, Ordering::AcqRel) {
            for philosopher in std::mem::take(&mut *self.0.seated.lock()) {
                philosopher.leave();
            }
        }
        self.0.cancellation_token.cancel();
    }

    /// Stops the table and waits for every philosopher to leave.
    ///
    /// Each philosopher gets the configured shutdown timeout. Philosophers
    /// that miss it are aborted and reported. Aborted and panicked
    /// philosophers still put their chopsticks down and report `Stopped`,
    /// so [`until_settled`](Self::until_settled) resolves afterwards.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> ShutdownReport {
        self.stop();
        let tasks = std::mem::take(&mut *self.0.tasks.lock());
        let timeout = self.0.shutdown_timeout;

        let departures = join_all(tasks.into_iter().map(|(seat, mut task)| async move {
            match tokio::time::timeout(timeout, &mut task).await {
                Ok(Ok(_meals)) => Departure::Left,
                Ok(Err(e)) => Departure::Failed {
                    seat,
                    error: e.to_string(),
                },
                Err(_) => {
                    task.abort();
                    // The aborted future is dropped on the runtime; wait so its
                    // grip and farewell have run before reporting.
                    let _ = task.await;
                    Departure::TimedOut { seat }
                }
            }
        }))
        .await;

        let mut report = ShutdownReport {
            meals: self.0.handles.iter().map(PhilosopherHandle::meals).collect(),
            ..ShutdownReport::default()
        };
        for departure in departures {
            match departure {
                Departure::Left => {}
                Departure::Failed { seat, error } => report.failed.push((seat, error)),
                Departure::TimedOut { seat } => report.timed_out.push(seat),
            }
        }

        if !report.timed_out.is_empty() {
            error!(
                "Shutdown timeout ({} ms) for {} philosopher(s): {:?}",
                timeout.as_millis(),
                report.timed_out.len(),
                report.timed_out
            );
        }
        if !report.failed.is_empty() {
            error!(
                "{} philosopher(s) ended abnormally: [{}]",
                report.failed.len(),
                report
                    .failed
                    .iter()
                    .map(|(seat, e)| format!("{seat}: {e}"))
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }
        info!(total_meals = report.total_meals(), "Table shut down");
        report
    }

    /// Resolves once every philosopher has left, for whatever reason.
    pub async fn until_settled(&self) {
        self.0.ledger.settled().await;
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> TableStatus {
        if !self.0.started.load(Ordering::Acquire) {
            TableStatus::Idle
        } else if self.0.ledger.policy_met() {
            TableStatus::Finished
        } else if self.0.stop_requested.load(Ordering::Acquire) {
            TableStatus::Stopped
        } else if self.0.ledger.is_settled() {
            TableStatus::Finished
        } else {
            TableStatus::Running
        }
    }

    /// Handles for every seat, indexed by seat number.
    #[must_use]
    pub fn philosophers(&self) -> &[PhilosopherHandle] {
        &self.0.handles
    }

    /// Chopsticks, indexed by position.
    #[must_use]
    pub fn chopsticks(&self) -> &[Arc<Chopstick>] {
        &self.0.chopsticks
    }

    /// The waiter, present under the admission-controlled strategy.
    #[must_use]
    pub fn waiter(&self) -> Option<&Waiter> {
        self.0.waiter.as_deref()
    }

    /// Strategy the table was built with.
    #[must_use]
    pub fn strategy(&self) -> AcquisitionStrategy {
        self.0.strategy
    }

    /// Number of seats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.handles.len()
    }

    /// Always `false`: a table has at least two seats.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.handles.is_empty()
    }

    /// Meals completed across the table.
    #[must_use]
    pub fn total_meals(&self) -> u64 {
        self.0.ledger.total_meals()
    }

    /// Whether every philosopher has completed at least one meal.
    #[must_use]
    pub fn all_fed(&self) -> bool {
        self.0.ledger.all_fed()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("strategy", &self.0.strategy)
            .field("seats", &self.len())
            .field("status", &self.status())
            .field("total_meals", &self.total_meals())
            .finish_non_exhaustive()
    }
}
