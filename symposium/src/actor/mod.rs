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

//! The philosopher state machine and the acquisition strategies it runs.
//!
//! *   [`AcquisitionStrategy`]: the table-wide choice between naive blocking,
//!     try/backoff, resource hierarchy and admission control.
//! *   [`SeatPlan`] / [`Protocol`]: what that choice means for one seat.
//! *   `Philosopher`: the per-seat task looping think / hungry / eat until
//!     cancelled, always releasing what it holds before reporting `Stopped`.

pub use strategy::{AcquisitionStrategy, AdmissionInner, Protocol, SeatPlan};
pub(crate) use philosopher::Philosopher;

mod philosopher;

mod strategy;
