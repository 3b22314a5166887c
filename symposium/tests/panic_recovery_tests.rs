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

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use symposium::prelude::*;

use crate::setup::{brisk_config, initialize_tracing, wait_for, Probe};

mod setup;

/// Holds up the given seat's task whenever it sits down to eat.
struct SlowAt {
    seat: PhilosopherId,
    stall: Duration,
}

impl TableObserver for SlowAt {
    fn on_philosopher_state_changed(&self, id: PhilosopherId, state: PhilosopherState, _: Option<&str>) {
        if id == self.seat && state == PhilosopherState::Eating {
            std::thread::sleep(self.stall);
        }
    }

    fn on_chopstick_state_changed(&self, _: ChopstickId, _: bool) {}
}

/// Panics when the given seat sits down to eat.
struct ClumsyAt {
    seat: PhilosopherId,
    inner: Arc<Probe>,
}

impl TableObserver for ClumsyAt {
    fn on_philosopher_state_changed(&self, id: PhilosopherId, state: PhilosopherState, detail: Option<&str>) {
        self.inner.on_philosopher_state_changed(id, state, detail);
        if id == self.seat && state == PhilosopherState::Eating {
            panic!("seat {id} knocked the table over");
        }
    }

    fn on_chopstick_state_changed(&self, id: ChopstickId, held: bool) {
        self.inner.on_chopstick_state_changed(id, held);
    }
}

// Plain tokio::test: the panic here is expected, and this binary holds no
// `#[symposium_test]` whose panic hook would record it.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_panicking_philosopher_still_leaves_the_table() -> anyhow::Result<()> {
    initialize_tracing();
    let mut config = brisk_config(AcquisitionStrategy::ResourceHierarchy);
    config.simulation.max_meals = Some(1);

    let probe = Arc::new(Probe::default());
    let observer = ClumsyAt {
        seat: 0,
        inner: probe.clone(),
    };
    let table = Table::build(&config, Arc::new(observer))?;
    table.start()?;

    tokio::time::timeout(Duration::from_secs(10), table.until_settled())
        .await
        .map_err(|_| anyhow::anyhow!("table never settled: {table:?}"))?;

    assert!(table.philosophers().iter().all(PhilosopherHandle::is_stopped));
    assert_eq!(probe.state_history(0).last(), Some(&PhilosopherState::Stopped));
    assert_eq!(table.philosophers()[0].meals(), 0);
    assert!(table.chopsticks().iter().all(|c| !c.is_held()));

    let report = table.shutdown().await;
    assert_eq!(report.failed.len(), 1, "{report:?}");
    assert_eq!(report.failed[0].0, 0);
    assert!(report.timed_out.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_philosopher_missing_the_shutdown_timeout_still_leaves() -> anyhow::Result<()> {
    initialize_tracing();
    let mut config = brisk_config(AcquisitionStrategy::ResourceHierarchy);
    config.timeouts.shutdown_timeout_ms = 100;

    let observer = SlowAt {
        seat: 0,
        stall: Duration::from_millis(800),
    };
    let table = Table::build(&config, Arc::new(observer))?;
    table.start()?;

    let seat = table.philosophers()[0].clone();
    assert!(wait_for(Duration::from_secs(10), || seat.state() == PhilosopherState::Eating).await);

    let report = table.shutdown().await;
    assert!(report.timed_out.contains(&0), "{report:?}");
    assert!(report.failed.is_empty(), "{report:?}");

    // shutdown() has collected the straggler, so the table is already settled.
    assert!(seat.is_stopped());
    assert!(table.philosophers().iter().all(PhilosopherHandle::is_stopped));
    assert!(table.chopsticks().iter().all(|c| !c.is_held()));
    tokio::time::timeout(Duration::from_secs(1), table.until_settled()).await?;
    Ok(())
}
