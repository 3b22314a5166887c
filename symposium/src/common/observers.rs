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

use tracing::{debug, trace};

use crate::common::{ChopstickId, PhilosopherId, PhilosopherState};
use crate::traits::TableObserver;

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TableObserver for NoopObserver {
    fn on_philosopher_state_changed(&self, _: PhilosopherId, _: PhilosopherState, _: Option<&str>) {}

    fn on_chopstick_state_changed(&self, _: ChopstickId, _: bool) {}
}

/// Logs every transition through `tracing`.
///
/// Philosopher transitions go out at `debug`, chopstick transitions at `trace`.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver {
    names: Option<Arc<[String]>>,
}

impl TracingObserver {
    /// Logs philosophers by seat number.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs philosophers by name, indexed by seat.
    #[must_use]
    pub fn with_names(names: Vec<String>) -> Self {
        Self {
            names: Some(names.into()),
        }
    }

    fn name(&self, philosopher: PhilosopherId) -> String {
        self.names
            .as_ref()
            .and_then(|names| names.get(philosopher).cloned())
            .unwrap_or_else(|| format!("philosopher {philosopher}"))
    }
}

impl TableObserver for TracingObserver {
    fn on_philosopher_state_changed(
        &self,
        philosopher: PhilosopherId,
        state: PhilosopherState,
        detail: Option<&str>,
    ) {
        let who = self.name(philosopher);
        match (state, detail) {
            (PhilosopherState::Thinking, Some(thought)) => {
                debug!(philosopher, "{who} is thinking about {thought}.");
            }
            (PhilosopherState::Eating, Some(food)) => debug!(philosopher, "{who} is eating {food}."),
            _ => debug!(philosopher, %state, "{who} is {state}."),
        }
    }

    fn on_chopstick_state_changed(&self, chopstick: ChopstickId, held: bool) {
        trace!(chopstick, held, "chopstick {}", if held { "held" } else { "available" });
    }
}

/// Forwards every transition to several observers in order.
#[derive(Default, Clone)]
pub struct FanOut {
    observers: Vec<Arc<dyn TableObserver>>,
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOut")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl FanOut {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer to the end of the chain.
    #[must_use]
    pub fn with(mut self, observer: Arc<dyn TableObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl TableObserver for FanOut {
    fn on_philosopher_state_changed(
        &self,
        philosopher: PhilosopherId,
        state: PhilosopherState,
        detail: Option<&str>,
    ) {
        for observer in &self.observers {
            observer.on_philosopher_state_changed(philosopher, state, detail);
        }
    }

    fn on_chopstick_state_changed(&self, chopstick: ChopstickId, held: bool) {
        for observer in &self.observers {
            observer.on_chopstick_state_changed(chopstick, held);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{EventBroker, TableEvent};

    use super::*;

    #[test]
    fn fan_out_reaches_every_observer() {
        let first = EventBroker::new(4);
        let second = EventBroker::new(4);
        let mut first_rx = first.subscribe();
        let mut second_rx = second.subscribe();

        let fan_out = FanOut::new()
            .with(Arc::new(first))
            .with(Arc::new(NoopObserver))
            .with(Arc::new(second));
        fan_out.on_chopstick_state_changed(1, true);

        let expected = TableEvent::Chopstick { id: 1, held: true };
        assert_eq!(first_rx.try_recv().ok(), Some(expected.clone()));
        assert_eq!(second_rx.try_recv().ok(), Some(expected));
    }

    #[test]
    fn tracing_observer_falls_back_to_seat_numbers() {
        let observer = TracingObserver::with_names(vec!["Plato".to_string()]);
        assert_eq!(observer.name(0), "Plato");
        assert_eq!(observer.name(4), "philosopher 4");
    }
}
