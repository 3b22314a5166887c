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
use std::collections::HashMap;
use std::sync::Once;
use std::time::Duration;

use parking_lot::Mutex;
use symposium::prelude::*;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Ensures tracing initialization happens only once across all tests.
static INIT: Once = Once::new();

/// Initializes the global tracing subscriber for tests.
///
/// Logs go to `logs/table_tests.txt`. `RUST_LOG` overrides the default filter.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        std::fs::create_dir_all("logs").expect("could not create logs dir");

        let file_appender = RollingFileAppender::new(Rotation::NEVER, "logs", "table_tests.txt");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leak the guard so the non-blocking writer outlives every test.
        Box::leak(Box::new(guard));

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info")
                .add_directive("symposium=debug".parse().unwrap())
                .add_directive("symposium::common::table=trace".parse().unwrap())
        });

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_max_level(Level::TRACE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// A configuration with short delays so tables make progress quickly.
pub fn brisk_config(strategy: AcquisitionStrategy) -> SymposiumConfig {
    let mut config = SymposiumConfig::default();
    config.simulation.num_philosophers = 5;
    config.simulation.strategy = strategy;
    config.delays.think = DelayRange::new(0, 5);
    config.delays.eat = DelayRange::new(1, 5);
    config.backoff = DelayRange::new(1, 5);
    config.timeouts.shutdown_timeout_ms = 2_000;
    config
}

/// Records every event in arrival order.
#[derive(Debug, Default)]
pub struct Probe {
    events: Mutex<Vec<TableEvent>>,
}

impl Probe {
    pub fn events(&self) -> Vec<TableEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Chopstick transitions for `id`, in order.
    pub fn chopstick_history(&self, id: ChopstickId) -> Vec<bool> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                TableEvent::Chopstick { id: c, held } if *c == id => Some(*held),
                _ => None,
            })
            .collect()
    }

    /// State transitions for philosopher `id`, in order.
    pub fn state_history(&self, id: PhilosopherId) -> Vec<PhilosopherState> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                TableEvent::Philosopher { id: p, state, .. } if *p == id => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// Replays the stream and checks that a philosopher only ever reports
    /// `Eating` while both of its chopsticks are held.
    pub fn assert_eating_holds_both(&self, seats: usize) {
        let mut held: HashMap<ChopstickId, bool> = HashMap::new();
        for event in self.events.lock().iter() {
            match event {
                TableEvent::Chopstick { id, held: now } => {
                    held.insert(*id, *now);
                }
                TableEvent::Philosopher {
                    id,
                    state: PhilosopherState::Eating,
                    ..
                } => {
                    let left = *id;
                    let right = (id + 1) % seats;
                    assert!(
                        held.get(&left).copied().unwrap_or(false) && held.get(&right).copied().unwrap_or(false),
                        "philosopher {id} ate without holding chopsticks {left} and {right}"
                    );
                }
                TableEvent::Philosopher { .. } => {}
            }
        }
    }
}

impl TableObserver for Probe {
    fn on_philosopher_state_changed(&self, id: PhilosopherId, state: PhilosopherState, detail: Option<&str>) {
        self.events.lock().push(TableEvent::Philosopher {
            id,
            state,
            detail: detail.map(str::to_owned),
        });
    }

    fn on_chopstick_state_changed(&self, id: ChopstickId, held: bool) {
        self.events.lock().push(TableEvent::Chopstick { id, held });
    }
}

/// Checks a philosopher's reported states follow
/// `Thinking -> Hungry -> Eating -> Thinking` and end in a single `Stopped`.
pub fn assert_lawful_states(history: &[PhilosopherState], id: PhilosopherId) {
    use symposium::prelude::PhilosopherState::{Eating, Hungry, Stopped, Thinking};

    assert_eq!(history.last(), Some(&Stopped), "philosopher {id} never stopped: {history:?}");
    let mut previous: Option<PhilosopherState> = None;
    for state in history {
        let lawful = matches!(
            (previous, state),
            (None, Thinking | Stopped)
                | (Some(Thinking), Hungry | Stopped)
                | (Some(Hungry), Eating | Stopped)
                | (Some(Eating), Thinking | Stopped)
        );
        assert!(lawful, "philosopher {id} went {previous:?} -> {state:?}: {history:?}");
        previous = Some(*state);
    }
}

/// Polls `condition` every few milliseconds until it holds or `limit` passes.
pub async fn wait_for(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Every pick-up is followed by a put-down, and no chopstick is held twice in a row.
pub fn assert_alternates(history: &[bool], id: ChopstickId) {
    for (i, held) in history.iter().enumerate() {
        assert_eq!(*held, i % 2 == 0, "chopstick {id} history does not alternate: {history:?}");
    }
}
