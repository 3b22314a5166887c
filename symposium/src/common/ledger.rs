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

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::common::{PhilosopherId, TerminationPolicy};

/// Table-owned bookkeeping of who has eaten and who has left.
///
/// Philosophers report here; the ledger applies the termination policy and
/// signals when the last philosopher has gone.
#[derive(Debug)]
pub(crate) struct MealLedger {
    policy: TerminationPolicy,
    fed: Vec<AtomicBool>,
    fed_count: AtomicUsize,
    total_meals: AtomicU64,
    departed: AtomicUsize,
    policy_met: AtomicBool,
    table: CancellationToken,
    settled: CancellationToken,
}

impl MealLedger {
    pub(crate) fn new(seats: usize, policy: TerminationPolicy, table: CancellationToken) -> Self {
        Self {
            policy,
            fed: (0..seats).map(|_| AtomicBool::new(false)).collect(),
            fed_count: AtomicUsize::new(0),
            total_meals: AtomicU64::new(0),
            departed: AtomicUsize::new(0),
            policy_met: AtomicBool::new(false),
            table,
            settled: CancellationToken::new(),
        }
    }

    /// Records a completed meal for `seat`.
    pub(crate) fn record_meal(&self, seat: PhilosopherId) {
        self.total_meals.fetch_add(1, Ordering::AcqRel);
        let Some(flag) = self.fed.get(seat) else {
            return;
        };
        if flag.swap(true, Ordering::AcqRel) {
            return;
        }
        let fed = self.fed_count.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(seat, fed, seats = self.fed.len(), "first meal");
        if fed == self.fed.len() {
            info!("Every philosopher has eaten at least once");
            if self.policy == TerminationPolicy::StopAfterFirstEatEach {
                self.policy_met.store(true, Ordering::Release);
                self.table.cancel();
            }
        }
    }

    /// Records that a philosopher has left the table.
    pub(crate) fn depart(&self) {
        let departed = self.departed.fetch_add(1, Ordering::AcqRel) + 1;
        if departed >= self.fed.len() {
            debug!("Last philosopher has left the table");
            self.settled.cancel();
        }
    }

    pub(crate) fn all_fed(&self) -> bool {
        self.fed_count.load(Ordering::Acquire) == self.fed.len()
    }

    pub(crate) fn total_meals(&self) -> u64 {
        self.total_meals.load(Ordering::Acquire)
    }

    /// The termination policy stopped the table.
    pub(crate) fn policy_met(&self) -> bool {
        self.policy_met.load(Ordering::Acquire)
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.settled.is_cancelled()
    }

    pub(crate) async fn settled(&self) {
        self.settled.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_meal_policy_cancels_once_everyone_ate() {
        let table = CancellationToken::new();
        let ledger = MealLedger::new(3, TerminationPolicy::StopAfterFirstEatEach, table.clone());

        ledger.record_meal(0);
        ledger.record_meal(0);
        ledger.record_meal(2);
        assert!(!table.is_cancelled());
        assert!(!ledger.all_fed());

        ledger.record_meal(1);
        assert!(ledger.all_fed());
        assert!(ledger.policy_met());
        assert!(table.is_cancelled());
        assert_eq!(ledger.total_meals(), 4);
    }

    #[test]
    fn run_until_stopped_never_cancels() {
        let table = CancellationToken::new();
        let ledger = MealLedger::new(2, TerminationPolicy::RunUntilStopped, table.clone());
        ledger.record_meal(0);
        ledger.record_meal(1);
        assert!(ledger.all_fed());
        assert!(!ledger.policy_met());
        assert!(!table.is_cancelled());
    }

    #[test]
    fn settles_when_the_last_philosopher_leaves() {
        let ledger = MealLedger::new(2, TerminationPolicy::RunUntilStopped, CancellationToken::new());
        ledger.depart();
        assert!(!ledger.is_settled());
        ledger.depart();
        assert!(ledger.is_settled());
    }
}
