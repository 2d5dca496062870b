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

//! One-way password hashing with Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) that
//! carry their own salt and parameters, so verification needs nothing but the
//! stored string. Comparison is constant-time.

use crate::config::PasswordConfig;
use crate::error::CredentialError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Hashes new passwords and checks candidates against stored hashes.
#[derive(Debug, Clone, Default)]
pub struct CredentialVerifier {
    config: PasswordConfig,
}

impl CredentialVerifier {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hashes `plaintext` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// [`CredentialError::Hashing`] if the configured Argon2 parameters are
    /// out of range.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            None,
        )
        .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// See [`verify`].
    pub fn verify(&self, candidate: &str, stored_hash: &str) -> bool {
        verify(candidate, stored_hash)
    }
}

/// Returns whether `candidate` matches `stored_hash`.
///
/// Any mismatch, including a malformed or empty hash, yields `false`.
pub fn verify(candidate: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}
