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
use symposium_test::prelude::*;

use crate::setup::{assert_alternates, assert_lawful_states, brisk_config, initialize_tracing, wait_for, Probe};

mod setup;

/// Runs `strategy` until everyone has eaten a few times, then checks the
/// recorded stream: chopsticks alternate pick-up/put-down, every `Eating`
/// happens with both chopsticks in hand, and the table ends with nothing held.
async fn run_and_audit(strategy: AcquisitionStrategy) -> anyhow::Result<()> {
    let probe = Arc::new(Probe::default());
    let table = Table::build(&brisk_config(strategy), probe.clone())?;
    table.start()?;

    let fed = wait_for(Duration::from_secs(10), || {
        table.philosophers().iter().all(|p| p.meals() >= 3)
    })
    .await;
    assert!(fed, "{strategy}: not everyone ate three times: {table:?}");

    let report = table.shutdown().await;
    assert!(report.is_clean(), "{strategy}: unclean shutdown {report:?}");

    for chopstick in table.chopsticks() {
        assert!(!chopstick.is_held(), "{strategy}: chopstick {} left held", chopstick.id());
        let history = probe.chopstick_history(chopstick.id());
        assert!(!history.is_empty());
        assert_alternates(&history, chopstick.id());
        assert_eq!(history.len() % 2, 0, "chopstick {} ended held", chopstick.id());
    }
    probe.assert_eating_holds_both(table.len());
    for philosopher in table.philosophers() {
        let history = probe.state_history(philosopher.id());
        assert_lawful_states(&history, philosopher.id());

        // One meal per completed eating phase; only the last may be cut short.
        let eats = history.iter().filter(|s| **s == PhilosopherState::Eating).count() as u64;
        let meals = philosopher.meals();
        assert!(
            meals == eats || meals + 1 == eats,
            "seat {} ate {eats} times but counted {meals} meals",
            philosopher.id()
        );
    }
    Ok(())
}

#[symposium_test]
async fn try_backoff_keeps_chopsticks_exclusive() -> anyhow::Result<()> {
    initialize_tracing();
    run_and_audit(AcquisitionStrategy::TryBackoff).await
}

#[symposium_test]
async fn resource_hierarchy_keeps_chopsticks_exclusive() -> anyhow::Result<()> {
    initialize_tracing();
    run_and_audit(AcquisitionStrategy::ResourceHierarchy).await
}

#[symposium_test]
async fn admission_control_keeps_chopsticks_exclusive() -> anyhow::Result<()> {
    initialize_tracing();
    run_and_audit(AcquisitionStrategy::AdmissionControlled).await
}

/// Philosophers stopped while blocked mid-acquisition put down the single
/// chopstick they hold before reporting `Stopped`.
#[symposium_test]
async fn stopping_a_deadlocked_table_releases_everything() -> anyhow::Result<()> {
    initialize_tracing();
    let mut config = brisk_config(AcquisitionStrategy::NaiveBlocking);
    config.delays.think = DelayRange::ZERO;
    config.delays.reach = DelayRange::fixed(200);

    let probe = Arc::new(Probe::default());
    let table = Table::build(&config, probe.clone())?;
    table.start()?;

    let stuck = wait_for(Duration::from_secs(5), || {
        table.chopsticks().iter().all(|c| c.is_held())
    })
    .await;
    assert!(stuck, "the table never reached the all-left-held deadlock");

    let report = table.shutdown().await;
    assert!(report.is_clean(), "{report:?}");

    for chopstick in table.chopsticks() {
        assert!(!chopstick.is_held());
        assert_eq!(probe.chopstick_history(chopstick.id()), vec![true, false]);
    }
    for philosopher in table.philosophers() {
        assert_eq!(philosopher.state(), PhilosopherState::Stopped);
        let history = probe.state_history(philosopher.id());
        assert_eq!(history.last(), Some(&PhilosopherState::Stopped));
        assert_eq!(
            history.iter().filter(|s| s.is_stopped()).count(),
            1,
            "Stopped reported more than once for {}",
            philosopher.id()
        );
    }
    Ok(())
}

/// A running table shut down at an arbitrary moment ends with every chopstick
/// down and `Stopped` as each philosopher's final report.
#[symposium_test]
async fn shutdown_mid_run_leaves_nothing_held() -> anyhow::Result<()> {
    initialize_tracing();
    let probe = Arc::new(Probe::default());
    let table = Table::build(&brisk_config(AcquisitionStrategy::TryBackoff), probe.clone())?;
    table.start()?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    table.shutdown().await;

    let mut held = vec![false; table.len()];
    for event in probe.events() {
        if let TableEvent::Chopstick { id, held: now } = event {
            held[id] = now;
        }
    }
    assert!(held.iter().all(|h| !h), "chopsticks still held at the end: {held:?}");

    for philosopher in table.philosophers() {
        let history = probe.state_history(philosopher.id());
        assert_eq!(history.last(), Some(&PhilosopherState::Stopped));
    }
    Ok(())
}
