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

//! Test harness for Symposium.
//!
//! `#[symposium_test]` turns an `async fn` into a `#[test]` that runs on its
//! own multi-threaded Tokio runtime, inside a tracing span named after the
//! test, and fails if the body runs past its time limit. A table that
//! deadlocks under test therefore fails the test instead of hanging the run.
//!
//! ```rust,ignore
//! use symposium_test::prelude::*;
//!
//! #[symposium_test(timeout_secs = 20)]
//! async fn everyone_eats() -> anyhow::Result<()> {
//!     // ...
//!     Ok(())
//! }
//! ```

/// Default wall-clock limit for a `#[symposium_test]` body, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Items the generated test code refers to. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use parking_lot;
    pub use tokio;
    pub use tracing;
}

/// Imports for test modules.
pub mod prelude {
    pub use symposium_test_macro::symposium_test;
}
