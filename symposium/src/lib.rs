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

#![forbid(unsafe_code)]
#![forbid(missing_docs)]

//! # Symposium
//!
//! Philosophers sit around a ring with one chopstick between each pair of
//! neighbours. Each needs both adjacent chopsticks to eat. The crate runs
//! that contention on Tokio and lets you swap how philosophers pick up
//! chopsticks, to watch each strategy deadlock, livelock or make progress.
//!
//! ## Key Concepts
//!
//! - **Chopsticks (`Chopstick`)**: exclusive resources with a non-blocking
//!   `try_acquire`, a cancellable blocking `acquire`, and an idempotent `release`.
//! - **Waiter (`Waiter`)**: an optional permit pool, `N - 1` permits by
//!   default, that guarantees someone can always eat.
//! - **Philosophers**: one Tokio task per seat cycling think, hungry, eat
//!   until stopped. Held chopsticks are always put down before the
//!   philosopher reports `Stopped`.
//! - **Strategies (`AcquisitionStrategy`)**: naive blocking (deadlocks),
//!   try/backoff (may livelock), resource hierarchy and admission control.
//! - **Table (`Table`)**: wires the ring, starts everyone at once, stops
//!   everyone cooperatively, and applies the termination policy.
//! - **Observers (`TableObserver`)**: the only window into a running table,
//!   used by displays, loggers and test probes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use symposium::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SymposiumError> {
//!     let mut config = SymposiumConfig::default();
//!     config.simulation.strategy = AcquisitionStrategy::ResourceHierarchy;
//!     config.simulation.termination = TerminationPolicy::StopAfterFirstEatEach;
//!
//!     let table = Table::build(&config, Arc::new(TracingObserver::new()))?;
//!     table.start()?;
//!     table.until_settled().await;
//!     let report = table.shutdown().await;
//!     println!("{} meals served", report.total_meals());
//!     Ok(())
//! }
//! ```

/// The table, shared resources, configuration and observers.
pub(crate) mod common;

/// The philosopher state machine and acquisition strategies.
pub(crate) mod actor;

/// Core traits.
pub(crate) mod traits;

/// Cosmetic names, thoughts and foods.
pub use common::banter;

/// Everything needed to build, run and watch a table.
///
/// # Re-exports
///
/// *   [`crate::common::Table`], [`crate::common::ShutdownReport`], [`crate::common::TableStatus`]
/// *   [`crate::common::Chopstick`], [`crate::common::Waiter`], [`crate::common::AdmissionPermit`]
/// *   [`crate::common::PhilosopherHandle`], [`crate::common::PhilosopherState`]
/// *   [`crate::actor::AcquisitionStrategy`], [`crate::actor::AdmissionInner`], [`crate::actor::SeatPlan`], [`crate::actor::Protocol`]
/// *   [`crate::traits::TableObserver`] and the stock observers
/// *   [`crate::common::SymposiumConfig`] and its sections
/// *   [`crate::common::SymposiumError`]
pub mod prelude {
    pub use crate::actor::{AcquisitionStrategy, AdmissionInner, Protocol, SeatPlan};
    pub use crate::common::{
        AdmissionConfig, AdmissionPermit, Chopstick, ChopstickId, DelayConfig, DelayRange,
        EventBroker, FanOut, NoopObserver, PhilosopherHandle, PhilosopherId, PhilosopherState,
        ShutdownReport, SimulationConfig, SymposiumConfig, SymposiumError, Table, TableEvent,
        TableStatus, TerminationPolicy, TimeoutConfig, TracingConfig, TracingObserver, Waiter,
        DEFAULT_EVENT_CAPACITY,
    };
    pub use crate::traits::TableObserver;
}
