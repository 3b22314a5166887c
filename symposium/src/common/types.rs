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

use serde::{Deserialize, Serialize};

/// Seat number of a philosopher, `0..N`.
pub type PhilosopherId = usize;

/// Position of a chopstick on the ring, `0..N`. Chopstick `i` lies between
/// philosophers `i - 1` and `i`.
pub type ChopstickId = usize;

/// Observable lifecycle state of a philosopher.
///
/// `Thinking -> Hungry -> Eating -> Thinking` repeats until the philosopher is
/// told to leave, at which point it reports `Stopped` exactly once and never
/// changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhilosopherState {
    /// Off the critical section, holding nothing.
    #[default]
    Thinking,
    /// Trying to obtain both chopsticks (and, if gated, an admission permit).
    Hungry,
    /// Holding both chopsticks.
    Eating,
    /// Left the table. Holds nothing.
    Stopped,
}

impl PhilosopherState {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::Thinking => 0,
            Self::Hungry => 1,
            Self::Eating => 2,
            Self::Stopped => 3,
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Thinking,
            1 => Self::Hungry,
            2 => Self::Eating,
            _ => Self::Stopped,
        }
    }

    /// Whether the state is terminal.
    #[inline]
    #[must_use]
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for PhilosopherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Thinking => "thinking",
            Self::Hungry => "hungry",
            Self::Eating => "eating",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Lifecycle of a [`Table`](crate::common::Table) as seen by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableStatus {
    /// Built but not started.
    Idle,
    /// Philosophers are dining.
    Running,
    /// Every philosopher left on its own: the termination policy was met or
    /// each reached its meal limit.
    Finished,
    /// `stop()` was called before the table finished.
    Stopped,
}

