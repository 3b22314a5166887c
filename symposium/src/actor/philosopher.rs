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

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use crate::actor::{Protocol, SeatPlan};
use crate::common::banter;
use crate::common::{
    AdmissionPermit, Chopstick, DelayConfig, DelayRange, MealLedger, PhilosopherId,
    PhilosopherState, Vitals, Waiter,
};
use crate::traits::TableObserver;

/// One seat at the table and the task that dines there.
///
/// Built by the [`Table`](crate::common::Table) with its two neighbouring
/// chopsticks already wired in, then consumed by [`dine`](Self::dine).
pub(crate) struct Philosopher {
    pub(crate) id: PhilosopherId,
    pub(crate) name: Arc<str>,
    pub(crate) left: Arc<Chopstick>,
    pub(crate) right: Arc<Chopstick>,
    pub(crate) plan: SeatPlan,
    pub(crate) waiter: Option<Arc<Waiter>>,
    pub(crate) delays: DelayConfig,
    pub(crate) backoff: DelayRange,
    pub(crate) max_meals: Option<u64>,
    pub(crate) start_gun: CancellationToken,
    pub(crate) cancel: CancellationToken,
    pub(crate) observer: Arc<dyn TableObserver>,
    pub(crate) vitals: Arc<Vitals>,
    pub(crate) ledger: Arc<MealLedger>,
}

/// The chopsticks (and admission permit) a philosopher currently holds.
///
/// Everything still held is put down when the grip is dropped, so no exit
/// path, including task abort, can leave a chopstick taken.
struct Grip {
    observer: Arc<dyn TableObserver>,
    held: Vec<Arc<Chopstick>>,
    // Dropped after `Drop::drop` has put the chopsticks down.
    _permit: Option<AdmissionPermit>,
}

impl Grip {
    fn new(observer: Arc<dyn TableObserver>, permit: Option<AdmissionPermit>) -> Self {
        Self {
            observer,
            held: Vec::with_capacity(2),
            _permit: permit,
        }
    }

    /// Records a chopstick the caller has just acquired.
    fn hold(&mut self, chopstick: &Arc<Chopstick>) {
        debug_assert!(self.held.len() < 2, "a philosopher only has two hands");
        self.observer.on_chopstick_state_changed(chopstick.id(), true);
        self.held.push(Arc::clone(chopstick));
    }

    /// Puts down every chopstick, announcing each before it becomes free.
    fn put_down(&mut self) {
        while let Some(chopstick) = self.held.pop() {
            self.observer.on_chopstick_state_changed(chopstick.id(), false);
            chopstick.release();
        }
    }
}

impl Drop for Grip {
    fn drop(&mut self) {
        self.put_down();
    }
}

/// Reports `Stopped` and tells the ledger when dropped.
///
/// Owned by the dining task, so a philosopher that returns, panics or is
/// aborted still leaves the table exactly once.
struct Farewell {
    id: PhilosopherId,
    observer: Arc<dyn TableObserver>,
    vitals: Arc<Vitals>,
    ledger: Arc<MealLedger>,
}

impl Drop for Farewell {
    fn drop(&mut self) {
        trace!(philosopher = self.id, "leaving the table");
        self.vitals.set_state(PhilosopherState::Stopped);
        self.observer
            .on_philosopher_state_changed(self.id, PhilosopherState::Stopped, None);
        self.ledger.depart();
    }
}

impl Philosopher {
    /// Runs think / hungry / eat until told to stop, then reports `Stopped`.
    ///
    /// Returns the number of completed meals.
    #[instrument(skip(self), fields(philosopher = self.id, name = %self.name))]
    pub(crate) async fn dine(self) -> u64 {
        // Declared before any grip so it drops last, after chopsticks are down.
        let farewell = self.farewell();
        if !self.take_seat().await {
            drop(farewell);
            return self.vitals.meals();
        }

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.announce(PhilosopherState::Thinking, Some(banter::thought()));
            if !self.pause(self.delays.think.sample()).await {
                break;
            }

            self.announce(PhilosopherState::Hungry, None);
            let Some(mut grip) = self.pick_up().await else {
                break;
            };

            self.announce(PhilosopherState::Eating, Some(banter::food()));
            let finished = self.pause(self.delays.eat.sample()).await;
            let meals = if finished {
                let meals = self.vitals.record_meal();
                self.ledger.record_meal(self.id);
                meals
            } else {
                self.vitals.meals()
            };
            grip.put_down();
            drop(grip);

            if !finished {
                break;
            }
            if self.max_meals.is_some_and(|max| meals >= max) {
                debug!(meals, "had enough, leaving the table");
                break;
            }
        }

        drop(farewell);
        self.vitals.meals()
    }

    /// Dismisses a philosopher that never sat down.
    pub(crate) fn leave(&self) -> u64 {
        drop(self.farewell());
        self.vitals.meals()
    }

    fn farewell(&self) -> Farewell {
        Farewell {
            id: self.id,
            observer: Arc::clone(&self.observer),
            vitals: Arc::clone(&self.vitals),
            ledger: Arc::clone(&self.ledger),
        }
    }

    /// Waits at the start line until the table has seated everyone.
    async fn take_seat(&self) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = self.start_gun.cancelled() => !self.cancel.is_cancelled(),
        }
    }

    fn announce(&self, state: PhilosopherState, detail: Option<&str>) {
        trace!(%state, detail, "transition");
        self.vitals.set_state(state);
        self.observer.on_philosopher_state_changed(self.id, state, detail);
    }

    /// Sleeps for `duration` unless cancelled first. Returns whether the
    /// philosopher should carry on.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            tokio::task::yield_now().await;
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => !self.cancel.is_cancelled(),
        }
    }

    /// Obtains both chopsticks, passing the waiter first if the plan says so.
    ///
    /// Returns `None` when cancelled; anything partially acquired has been
    /// put down by then.
    async fn pick_up(&self) -> Option<Grip> {
        let permit = match &self.waiter {
            Some(waiter) if self.plan.gated => Some(waiter.acquire_permit(&self.cancel).await?),
            _ => None,
        };
        let mut grip = Grip::new(Arc::clone(&self.observer), permit);

        let acquired = match self.plan.protocol {
            Protocol::Blocking { reversed } => self.pick_up_in_order(&mut grip, reversed).await,
            Protocol::TryBackoff => self.pick_up_politely(&mut grip).await,
        };
        acquired.then_some(grip)
    }

    /// Blocks on the first chopstick, then on the second.
    async fn pick_up_in_order(&self, grip: &mut Grip, reversed: bool) -> bool {
        let (first, second) = if reversed {
            (&self.right, &self.left)
        } else {
            (&self.left, &self.right)
        };

        if !first.acquire(&self.cancel).await {
            return false;
        }
        grip.hold(first);

        if !self.pause(self.delays.reach.sample()).await {
            return false;
        }

        if !second.acquire(&self.cancel).await {
            return false;
        }
        grip.hold(second);
        true
    }

    /// Tries left then right without blocking. On a miss puts everything
    /// back and retries after a randomized pause.
    async fn pick_up_politely(&self, grip: &mut Grip) -> bool {
        let mut misses: u64 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }

            if self.left.try_acquire() {
                grip.hold(&self.left);
                if !self.pause(self.delays.reach.sample()).await {
                    return false;
                }
                if self.right.try_acquire() {
                    grip.hold(&self.right);
                    if misses > 0 {
                        trace!(misses, "picked up both chopsticks after retrying");
                    }
                    return true;
                }
            }

            grip.put_down();
            misses += 1;
            if misses == 1 {
                debug!("couldn't acquire both chopsticks, retrying");
            } else {
                trace!(misses, "still couldn't acquire both chopsticks");
            }

            if !self.pause(self.backoff.sample()).await {
                return false;
            }
        }
    }
}
