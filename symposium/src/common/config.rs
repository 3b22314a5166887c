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
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::actor::{AcquisitionStrategy, AdmissionInner};
use crate::common::SymposiumError;

/// Configuration for a Symposium table.
///
/// Every section falls back to its defaults, so a configuration file only
/// needs to name the values it changes. Files are looked up in XDG-compliant
/// locations by [`SymposiumConfig::load`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymposiumConfig {
    /// Ring size, strategy and lifecycle policy
    pub simulation: SimulationConfig,
    /// Simulated-work pauses
    pub delays: DelayConfig,
    /// Retry pause for the try/backoff protocol
    pub backoff: DelayRange,
    /// Waiter settings for the admission-controlled strategy
    pub admission: AdmissionConfig,
    /// Shutdown timing
    pub timeouts: TimeoutConfig,
    /// Logging destination and level
    pub tracing: TracingConfig,
}

/// Ring size, strategy and lifecycle policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of philosophers, and of chopsticks. At least 2.
    pub num_philosophers: usize,
    /// How philosophers pick up chopsticks.
    pub strategy: AcquisitionStrategy,
    /// Whether the table stops by itself once everyone has eaten.
    pub termination: TerminationPolicy,
    /// Each philosopher leaves after this many meals.
    pub max_meals: Option<u64>,
    /// Hold every philosopher at a start line until all are seated.
    pub synchronized_start: bool,
}

/// Inclusive bounds for a randomized pause, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Shortest pause
    pub min_ms: u64,
    /// Longest pause
    pub max_ms: u64,
}

/// Bounds for the simulated-work pauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Time spent thinking between meals
    pub think: DelayRange,
    /// Time spent eating
    pub eat: DelayRange,
    /// Pause between picking up the first and the second chopstick
    pub reach: DelayRange,
}

/// Waiter settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Permits handed out by the waiter; `N - 1` when unset.
    pub capacity: Option<usize>,
    /// Pickup protocol run once a permit is held.
    pub inner: AdmissionInner,
}

/// Shutdown timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long `Table::shutdown` waits for each philosopher to leave.
    pub shutdown_timeout_ms: u64,
}

/// Logging destination and level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for log files.
    pub log_directory: String,
    /// Log file name inside `log_directory`.
    pub log_file: String,
}

/// Whether the table stops by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Dine until `stop()` is called.
    #[default]
    RunUntilStopped,
    /// Stop the whole table once every philosopher has finished one meal.
    StopAfterFirstEatEach,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_philosophers: 5,
            strategy: AcquisitionStrategy::default(),
            termination: TerminationPolicy::default(),
            max_meals: None,
            synchronized_start: true,
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            think: DelayRange::new(0, 5_000),
            eat: DelayRange::new(0, 4_000),
            reach: DelayRange::ZERO,
        }
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_ms: 5_000,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: "logs".to_string(),
            log_file: "symposium.log".to_string(),
        }
    }
}

impl DelayRange {
    /// A pause that never waits.
    pub const ZERO: Self = Self { min_ms: 0, max_ms: 0 };

    /// Creates a range from its bounds in milliseconds.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that always yields `ms`.
    #[must_use]
    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// Draws a pause uniformly from the range.
    #[must_use]
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    fn check(&self, name: &str) -> Result<(), SymposiumError> {
        if self.min_ms > self.max_ms {
            return Err(SymposiumError::InvalidConfig(format!(
                "{name}: min_ms ({}) exceeds max_ms ({})",
                self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }
}

impl AdmissionConfig {
    /// Permits for a ring of `ring_size`, defaulting to `ring_size - 1`.
    #[must_use]
    pub fn capacity_for(&self, ring_size: usize) -> usize {
        self.capacity.unwrap_or(ring_size.saturating_sub(1))
    }
}

impl TimeoutConfig {
    /// Shutdown timeout as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl SymposiumConfig {
    /// Checks the structural rules a table relies on.
    ///
    /// # Errors
    ///
    /// [`SymposiumError::InvalidConfig`] when the ring has fewer than two
    /// seats, a delay range is inverted, or the waiter's capacity is outside
    /// `1..=N-1`. A waiter admitting all `N` philosophers could let them all
    /// hold one chopstick each.
    pub fn validate(&self) -> Result<(), SymposiumError> {
        let n = self.simulation.num_philosophers;
        if n < 2 {
            return Err(SymposiumError::InvalidConfig(format!(
                "num_philosophers must be at least 2, got {n}"
            )));
        }
        self.delays.think.check("delays.think")?;
        self.delays.eat.check("delays.eat")?;
        self.delays.reach.check("delays.reach")?;
        self.backoff.check("backoff")?;
        if self.simulation.max_meals == Some(0) {
            return Err(SymposiumError::InvalidConfig(
                "simulation.max_meals must be at least 1 when set".to_string(),
            ));
        }
        if self.simulation.strategy == AcquisitionStrategy::AdmissionControlled {
            let capacity = self.admission.capacity_for(n);
            if capacity == 0 || capacity >= n {
                return Err(SymposiumError::InvalidConfig(format!(
                    "admission.capacity must be between 1 and {}, got {capacity}",
                    n - 1
                )));
            }
        }
        Ok(())
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SymposiumError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SymposiumError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| SymposiumError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Finds `symposium/config.toml` under `$XDG_CONFIG_HOME` and the XDG
    /// fallbacks, if one exists.
    #[must_use]
    pub fn xdg_path() -> Option<PathBuf> {
        match xdg::BaseDirectories::with_prefix("symposium") {
            Ok(dirs) => dirs.find_config_file("config.toml"),
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                None
            }
        }
    }

    /// Loads configuration from XDG-compliant locations.
    ///
    /// A missing file yields the defaults; a file that cannot be read,
    /// parsed or validated is logged and the defaults are used.
    #[must_use]
    pub fn load() -> Self {
        let Some(path) = Self::xdg_path() else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}; using defaults");
                Self::default()
            }
        }
    }
}

impl fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunUntilStopped => f.write_str("run_until_stopped"),
            Self::StopAfterFirstEatEach => f.write_str("stop_after_first_eat_each"),
        }
    }
}

impl FromStr for TerminationPolicy {
    type Err = SymposiumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "run_until_stopped" | "forever" => Ok(Self::RunUntilStopped),
            "stop_after_first_eat_each" | "first_meal" => Ok(Self::StopAfterFirstEatEach),
            _ => Err(SymposiumError::UnknownVariant {
                kind: "termination policy",
                value: s.to_string(),
            }),
        }
    }
}
