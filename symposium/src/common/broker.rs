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

use tokio::sync::broadcast;
use tracing::trace;

use crate::common::{ChopstickId, PhilosopherId, PhilosopherState};
use crate::traits::TableObserver;

/// Default number of events a lagging subscriber may fall behind by.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A transition published by the [`EventBroker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    /// A philosopher changed state.
    Philosopher {
        /// Seat
        id: PhilosopherId,
        /// New state
        state: PhilosopherState,
        /// Thought or food, if any
        detail: Option<String>,
    },
    /// A chopstick was picked up or put down.
    Chopstick {
        /// Position
        id: ChopstickId,
        /// `true` when picked up
        held: bool,
    },
}

/// Publishes table transitions to any number of subscribers.
///
/// The broker is itself a [`TableObserver`]: hand it to the table and call
/// [`subscribe`](Self::subscribe) from each consumer. Publishing never blocks
/// a philosopher; a subscriber that falls more than the channel capacity
/// behind receives `RecvError::Lagged` and skips ahead.
#[derive(Debug, Clone)]
pub struct EventBroker {
    sender: broadcast::Sender<TableEvent>,
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBroker {
    /// Creates a broker buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Starts receiving events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn publish(&self, event: TableEvent) {
        if self.sender.send(event).is_err() {
            trace!("No subscribers for table event");
        }
    }
}

impl TableObserver for EventBroker {
    fn on_philosopher_state_changed(
        &self,
        philosopher: PhilosopherId,
        state: PhilosopherState,
        detail: Option<&str>,
    ) {
        self.publish(TableEvent::Philosopher {
            id: philosopher,
            state,
            detail: detail.map(str::to_string),
        });
    }

    fn on_chopstick_state_changed(&self, chopstick: ChopstickId, held: bool) {
        self.publish(TableEvent::Chopstick { id: chopstick, held });
    }
}
