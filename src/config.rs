// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Ledger configuration.
//!
//! Every field has a default, so a partial (or empty) JSON document is a
//! valid configuration:
//!
//! ```
//! use debt_ledger::LedgerConfig;
//!
//! let config = LedgerConfig::from_json(r#"{ "password": { "time_cost": 3 } }"#.as_bytes()).unwrap();
//! assert_eq!(config.password.time_cost, 3);
//! assert_eq!(config.password.memory_cost, 19_456);
//! ```

use serde::{Deserialize, Serialize};
use std::io::Read;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub password: PasswordConfig,
}

impl LedgerConfig {
    /// Reads a configuration from JSON.
    pub fn from_json<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}

/// Argon2id cost parameters for new password hashes.
///
/// Defaults follow the OWASP minimum (19 MiB, 2 iterations, 1 lane).
/// Existing hashes keep the parameters they were created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl PasswordConfig {
    /// Minimum-cost parameters for tests and benchmarks.
    pub fn fast() -> Self {
        Self {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19_456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}
