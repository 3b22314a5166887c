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

use std::path::PathBuf;

/// Errors raised while configuring or launching a table.
///
/// Contention misses and cancellation are ordinary control flow for a
/// philosopher and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SymposiumError {
    /// The configuration violates a structural rule (ring size, delay bounds, admission capacity).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file exists but could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    ConfigRead {
        /// Location of the unreadable file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file was read but is not valid TOML for [`SymposiumConfig`](crate::common::SymposiumConfig).
    #[error("failed to parse configuration file {path}: {source}")]
    ConfigParse {
        /// Location of the malformed file.
        path: PathBuf,
        /// Parser diagnostic.
        #[source]
        source: toml::de::Error,
    },

    /// `Table::start` was called outside of a Tokio runtime.
    #[error("no Tokio runtime is available to seat the philosophers")]
    NoRuntime,

    /// The caller supplied a roster whose length differs from the ring size.
    #[error("expected {expected} philosopher names, got {actual}")]
    NameCount {
        /// Ring size.
        expected: usize,
        /// Names supplied.
        actual: usize,
    },

    /// A textual strategy or policy name was not recognized.
    #[error("unrecognized {kind} `{value}`")]
    UnknownVariant {
        /// What was being parsed, e.g. "strategy".
        kind: &'static str,
        /// The offending input.
        value: String,
    },
}
