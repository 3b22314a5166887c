//! Provides the table, its shared resources, and the types around them.
//!
//! # Key Re-exported Components:
//!
//! *   [`Table`]: builds the ring, starts and stops the philosophers.
//! *   [`Chopstick`]: exclusive resource with non-blocking and blocking acquire.
//! *   [`Waiter`]: admission control bounding concurrent contenders.
//! *   [`PhilosopherHandle`]: read-only view of one seat plus an individual stop.
//! *   [`EventBroker`], [`TracingObserver`], [`FanOut`], [`NoopObserver`]: stock observers.
//! *   [`SymposiumConfig`]: configuration loaded from TOML.
//! *   [`SymposiumError`]: everything that can go wrong while configuring or launching.

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

// --- Public Re-exports ---
pub use broker::{EventBroker, TableEvent, DEFAULT_EVENT_CAPACITY};
pub use chopstick::Chopstick;
pub use config::{
    AdmissionConfig, DelayConfig, DelayRange, SimulationConfig, SymposiumConfig,
    TerminationPolicy, TimeoutConfig, TracingConfig,
};
pub use error::SymposiumError;
pub use observers::{FanOut, NoopObserver, TracingObserver};
pub use philosopher_handle::PhilosopherHandle;
pub use table::{ShutdownReport, Table};
pub use types::*;
pub use waiter::{AdmissionPermit, Waiter};

// --- Crate-Internal Re-exports ---
pub(crate) use ledger::MealLedger;
pub(crate) use philosopher_handle::Vitals;

// --- Submodules ---

/// Seat and chopstick identifiers, philosopher and table states.
mod types;

/// Shuffled names, thoughts and foods.
pub mod banter;
/// The `EventBroker` publish-subscribe observer.
mod broker;
/// The `Chopstick` resource.
mod chopstick;
/// Configuration loading and validation.
pub mod config;
/// The `SymposiumError` type.
mod error;
/// Meal and departure bookkeeping behind the termination policy.
mod ledger;
/// Stock observers.
mod observers;
/// The `PhilosopherHandle` view.
mod philosopher_handle;
/// The `Table` coordinator.
mod table;
/// The `Waiter` admission controller.
mod waiter;
