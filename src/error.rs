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

//! Error types for ledger operations.

use crate::schema::{EntityKind, Rule};
use thiserror::Error;

/// A write violated a declared field rule. The record was not persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity}.{field} violates rule `{}`: {}", .rule.code(), .rule.message())]
pub struct ValidationError {
    /// Entity the offending record belongs to.
    pub entity: EntityKind,
    /// Name of the offending field.
    pub field: &'static str,
    /// Rule that was violated.
    pub rule: Rule,
}

impl ValidationError {
    pub fn new(entity: EntityKind, field: &'static str, rule: Rule) -> Self {
        Self {
            entity,
            field,
            rule,
        }
    }
}

/// Backing store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A filter named a field the entity does not have
    #[error("{entity} has no field `{field}`")]
    UnknownField { entity: EntityKind, field: String },

    /// No record exists under the given key
    #[error("{entity} `{key}` not found")]
    NotFound { entity: EntityKind, key: String },

    /// An update tried to move a record to a different key
    #[error("update of {entity} `{key}` changed its key")]
    KeyChanged { entity: EntityKind, key: String },
}

/// Password hashing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Argon2 rejected its parameters or failed to hash
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Errors surfaced by ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl LedgerError {
    /// Returns the validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            ValidationError::new(EntityKind::Debt, "value", Rule::NonNegative).to_string(),
            "debt.value violates rule `non_negative`: must not be negative"
        );
        assert_eq!(
            ValidationError::new(EntityKind::User, "email", Rule::Email).to_string(),
            "user.email violates rule `email`: must be a valid email address"
        );
        assert_eq!(
            StoreError::Unavailable("connection reset".to_string()).to_string(),
            "store unavailable: connection reset"
        );
        assert_eq!(
            StoreError::UnknownField {
                entity: EntityKind::Notification,
                field: "subject".to_string(),
            }
            .to_string(),
            "notification has no field `subject`"
        );
        assert_eq!(
            StoreError::NotFound {
                entity: EntityKind::Debt,
                key: "7".to_string(),
            }
            .to_string(),
            "debt `7` not found"
        );
        assert_eq!(
            CredentialError::Hashing("bad params".to_string()).to_string(),
            "password hashing failed: bad params"
        );
    }

    #[test]
    fn ledger_error_is_transparent() {
        let error: LedgerError =
            ValidationError::new(EntityKind::User, "first_name", Rule::NotEmpty).into();
        assert_eq!(
            error.to_string(),
            "user.first_name violates rule `not_empty`: must not be empty"
        );
        assert_eq!(error.as_validation().map(|e| e.field), Some("first_name"));
    }

    #[test]
    fn store_errors_are_not_validation_errors() {
        let error: LedgerError = StoreError::Unavailable("down".to_string()).into();
        assert!(error.as_validation().is_none());
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::from(StoreError::Unavailable("down".to_string()));
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
