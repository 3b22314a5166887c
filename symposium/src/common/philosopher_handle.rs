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

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::common::{PhilosopherId, PhilosopherState};

/// State and meal count published by a philosopher. Only the philosopher's
/// own task writes; everyone else reads.
#[derive(Debug, Default)]
pub(crate) struct Vitals {
    state: AtomicU8,
    meals: AtomicU64,
}

impl Vitals {
    pub(crate) fn state(&self) -> PhilosopherState {
        PhilosopherState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: PhilosopherState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn meals(&self) -> u64 {
        self.meals.load(Ordering::Acquire)
    }

    /// Counts a completed meal and returns the new total.
    pub(crate) fn record_meal(&self) -> u64 {
        self.meals.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// External, read-mostly view of one philosopher.
///
/// Handles are cheap to clone and stay valid after the philosopher has left.
#[derive(Debug, Clone)]
pub struct PhilosopherHandle {
    id: PhilosopherId,
    name: Arc<str>,
    vitals: Arc<Vitals>,
    cancel: CancellationToken,
}

impl PhilosopherHandle {
    pub(crate) fn new(id: PhilosopherId, name: Arc<str>, vitals: Arc<Vitals>, cancel: CancellationToken) -> Self {
        Self {
            id,
            name,
            vitals,
            cancel,
        }
    }

    /// Seat number.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PhilosopherId {
        self.id
    }

    /// Display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Most recently reported state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> PhilosopherState {
        self.vitals.state()
    }

    /// Completed meals so far. Never decreases.
    #[inline]
    #[must_use]
    pub fn meals(&self) -> u64 {
        self.vitals.meals()
    }

    /// Asks this philosopher alone to leave the table.
    ///
    /// Safe to call repeatedly and after the philosopher has stopped.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the philosopher has reported `Stopped`.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state().is_stopped()
    }
}
