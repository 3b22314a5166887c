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

use crate::common::{ChopstickId, PhilosopherId, PhilosopherState};

/// Receives every state transition a table produces.
///
/// Observers are called synchronously from philosopher tasks, so
/// implementations must be cheap and must not block. A display, a logger and
/// a test probe are all just observers.
///
/// For any single chopstick the calls arrive in order: `held == true` is
/// reported after the chopstick is taken and `held == false` before it is put
/// down, so a release is always observed before the next pickup.
pub trait TableObserver: Send + Sync {
    /// A philosopher entered `state`. `detail` carries the current thought or
    /// food, if any.
    fn on_philosopher_state_changed(
        &self,
        philosopher: PhilosopherId,
        state: PhilosopherState,
        detail: Option<&str>,
    );

    /// A chopstick was picked up (`held == true`) or is being put down.
    fn on_chopstick_state_changed(&self, chopstick: ChopstickId, held: bool);
}

impl<T: TableObserver + ?Sized> TableObserver for Arc<T> {
    fn on_philosopher_state_changed(
        &self,
        philosopher: PhilosopherId,
        state: PhilosopherState,
        detail: Option<&str>,
    ) {
        (**self).on_philosopher_state_changed(philosopher, state, detail);
    }

    fn on_chopstick_state_changed(&self, chopstick: ChopstickId, held: bool) {
        (**self).on_chopstick_state_changed(chopstick, held);
    }
}
