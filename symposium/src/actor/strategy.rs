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

//! Acquisition strategies and the per-seat plan each one resolves to.
//!
//! The table picks one [`AcquisitionStrategy`] for the whole ring. Each seat
//! then turns it into a [`SeatPlan`]: which pickup [`Protocol`] to run and
//! whether to pass the waiter first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{PhilosopherId, SymposiumError};

/// Table-wide rule for how philosophers obtain their two chopsticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStrategy {
    /// Block on the left chopstick, then block on the right.
    ///
    /// Deadlocks as soon as every philosopher holds its left chopstick.
    NaiveBlocking,
    /// Try both chopsticks without blocking; on a miss put back whatever was
    /// picked up and retry after a randomized pause. Deadlock-free, but can
    /// livelock when everyone retries in step.
    #[default]
    TryBackoff,
    /// Blocking pickup, but the philosopher at the seam (highest seat) picks
    /// up right before left, which removes the circular wait.
    ResourceHierarchy,
    /// Take a permit from a waiter with at most `N - 1` permits before
    /// running the inner protocol; see [`AdmissionInner`].
    AdmissionControlled,
}

/// Pickup protocol run behind the waiter under
/// [`AcquisitionStrategy::AdmissionControlled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionInner {
    /// Ordered blocking pickup, safe because of the permit bound.
    #[default]
    NaiveBlocking,
    /// Non-blocking pickup with backoff.
    TryBackoff,
}

/// How a single philosopher reaches for its chopsticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Block on each chopstick in turn. `reversed` takes right before left.
    Blocking {
        /// Pick up the right chopstick first.
        reversed: bool,
    },
    /// Non-blocking attempt on both, release and back off on a miss.
    TryBackoff,
}

/// The strategy as resolved for one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatPlan {
    /// Pickup protocol for this seat.
    pub protocol: Protocol,
    /// Whether an admission permit is required before the pickup.
    pub gated: bool,
}

impl AcquisitionStrategy {
    /// Resolves the strategy for `seat` on a ring of `ring_size` philosophers.
    #[must_use]
    pub const fn plan_for(self, seat: PhilosopherId, ring_size: usize, inner: AdmissionInner) -> SeatPlan {
        match self {
            Self::NaiveBlocking => SeatPlan {
                protocol: Protocol::Blocking { reversed: false },
                gated: false,
            },
            Self::TryBackoff => SeatPlan {
                protocol: Protocol::TryBackoff,
                gated: false,
            },
            Self::ResourceHierarchy => SeatPlan {
                protocol: Protocol::Blocking {
                    reversed: seat + 1 == ring_size,
                },
                gated: false,
            },
            Self::AdmissionControlled => SeatPlan {
                protocol: match inner {
                    AdmissionInner::NaiveBlocking => Protocol::Blocking { reversed: false },
                    AdmissionInner::TryBackoff => Protocol::TryBackoff,
                },
                gated: true,
            },
        }
    }

    /// Whether the strategy can never deadlock on its own.
    #[must_use]
    pub const fn is_deadlock_free(self) -> bool {
        !matches!(self, Self::NaiveBlocking)
    }
}

impl fmt::Display for AcquisitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NaiveBlocking => "naive_blocking",
            Self::TryBackoff => "try_backoff",
            Self::ResourceHierarchy => "resource_hierarchy",
            Self::AdmissionControlled => "admission_controlled",
        };
        f.write_str(label)
    }
}

impl FromStr for AcquisitionStrategy {
    type Err = SymposiumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "naive_blocking" | "naive" => Ok(Self::NaiveBlocking),
            "try_backoff" | "backoff" => Ok(Self::TryBackoff),
            "resource_hierarchy" | "hierarchy" => Ok(Self::ResourceHierarchy),
            "admission_controlled" | "waiter" => Ok(Self::AdmissionControlled),
            _ => Err(SymposiumError::UnknownVariant {
                kind: "strategy",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_seam_seat_reverses_under_hierarchy() {
        let reversed: Vec<_> = (0..5)
            .map(|seat| AcquisitionStrategy::ResourceHierarchy.plan_for(seat, 5, AdmissionInner::default()))
            .map(|plan| plan.protocol == Protocol::Blocking { reversed: true })
            .collect();
        assert_eq!(reversed, vec![false, false, false, false, true]);
    }

    #[test]
    fn naive_blocking_never_reverses_or_gates() {
        for seat in 0..5 {
            let plan = AcquisitionStrategy::NaiveBlocking.plan_for(seat, 5, AdmissionInner::TryBackoff);
            assert_eq!(plan.protocol, Protocol::Blocking { reversed: false });
            assert!(!plan.gated);
        }
    }

    #[test]
    fn admission_gates_every_seat_with_the_inner_protocol() {
        let blocking = AcquisitionStrategy::AdmissionControlled.plan_for(4, 5, AdmissionInner::NaiveBlocking);
        assert!(blocking.gated);
        assert_eq!(blocking.protocol, Protocol::Blocking { reversed: false });

        let polite = AcquisitionStrategy::AdmissionControlled.plan_for(0, 5, AdmissionInner::TryBackoff);
        assert!(polite.gated);
        assert_eq!(polite.protocol, Protocol::TryBackoff);
    }

    #[test]
    fn strategy_names_parse_leniently() -> Result<(), SymposiumError> {
        assert_eq!("Naive-Blocking".parse::<AcquisitionStrategy>()?, AcquisitionStrategy::NaiveBlocking);
        assert_eq!("waiter".parse::<AcquisitionStrategy>()?, AcquisitionStrategy::AdmissionControlled);
        assert!("telepathy".parse::<AcquisitionStrategy>().is_err());
        Ok(())
    }
}
