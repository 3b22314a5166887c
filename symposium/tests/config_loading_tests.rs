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

use std::fs;

use symposium::prelude::*;
use tempfile::TempDir;

/// Loading from the XDG config home picks up `symposium/config.toml`.
///
/// This is the only test in the binary that touches `XDG_CONFIG_HOME`.
#[test]
fn loads_from_xdg_config_home() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let config_dir = temp_dir.path().join("symposium");
    fs::create_dir_all(&config_dir)?;

    let config_content = r#"
        [simulation]
        num_philosophers = 7
        strategy = "admission_controlled"
        termination = "stop_after_first_eat_each"

        [admission]
        capacity = 3
        inner = "try_backoff"

        [timeouts]
        shutdown_timeout_ms = 750
    "#;
    fs::write(config_dir.join("config.toml"), config_content)?;
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    assert_eq!(SymposiumConfig::xdg_path(), Some(config_dir.join("config.toml")));
    let config = SymposiumConfig::load();
    assert_eq!(config.simulation.num_philosophers, 7);
    assert_eq!(config.simulation.strategy, AcquisitionStrategy::AdmissionControlled);
    assert_eq!(config.simulation.termination, TerminationPolicy::StopAfterFirstEatEach);
    assert_eq!(config.admission.capacity_for(7), 3);
    assert_eq!(config.admission.inner, AdmissionInner::TryBackoff);
    assert_eq!(config.timeouts.shutdown_timeout().as_millis(), 750);
    assert_eq!(config.delays, DelayConfig::default());

    temp_dir.close()?;
    Ok(())
}

#[test]
fn load_from_reports_unreadable_and_malformed_files() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;

    let missing = temp_dir.path().join("absent.toml");
    assert!(matches!(
        SymposiumConfig::load_from(&missing),
        Err(SymposiumError::ConfigRead { .. })
    ));

    let malformed = temp_dir.path().join("malformed.toml");
    fs::write(&malformed, "[simulation\nnum_philosophers = ")?;
    assert!(matches!(
        SymposiumConfig::load_from(&malformed),
        Err(SymposiumError::ConfigParse { .. })
    ));

    let invalid = temp_dir.path().join("invalid.toml");
    fs::write(
        &invalid,
        r#"
        [simulation]
        num_philosophers = 4
        strategy = "admission_controlled"

        [admission]
        capacity = 4
        "#,
    )?;
    assert!(matches!(
        SymposiumConfig::load_from(&invalid),
        Err(SymposiumError::InvalidConfig(_))
    ));

    temp_dir.close()?;
    Ok(())
}

#[test]
fn load_from_reads_delays_and_backoff() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("table.toml");
    fs::write(
        &path,
        r#"
        [simulation]
        num_philosophers = 3
        strategy = "naive_blocking"
        max_meals = 2
        synchronized_start = false

        [delays]
        think = { min_ms = 5, max_ms = 10 }
        reach = { min_ms = 100, max_ms = 100 }

        [backoff]
        min_ms = 2
        max_ms = 4
        "#,
    )?;

    let config = SymposiumConfig::load_from(&path)?;
    assert_eq!(config.simulation.strategy, AcquisitionStrategy::NaiveBlocking);
    assert_eq!(config.simulation.max_meals, Some(2));
    assert!(!config.simulation.synchronized_start);
    assert_eq!(config.delays.think, DelayRange::new(5, 10));
    assert_eq!(config.delays.reach, DelayRange::fixed(100));
    assert_eq!(config.backoff, DelayRange::new(2, 4));
    assert_eq!(config.tracing, TracingConfig::default());

    temp_dir.close()?;
    Ok(())
}
