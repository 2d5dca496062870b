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

//! Debt records and the lender/debtor relationship.
//!
//! A debt is created active and settles exactly once:
//!
//! ```text
//! Debt (active) ──resolve──► Debt (inactive)
//! ```
//!
//! There is no way back. Resolving an inactive debt leaves it inactive.
//!
//! # Example
//!
//! ```
//! use debt_ledger::{CurrencyId, Email, NewDebt, User};
//! use rust_decimal_macros::dec;
//! use chrono::Utc;
//!
//! let alice = User::new("Alice", "Smith", "alice@example.com");
//! let debt = NewDebt::new(dec!(100), "alice@example.com", "bob@example.com", CurrencyId(1))
//!     .into_debt(Utc::now());
//!
//! assert!(debt.active);
//! assert!(debt.lender_or_debtor(&alice));
//! assert_eq!(debt.partner_of(&alice), Some(&Email::from("bob@example.com")));
//! ```

use crate::base::{CurrencyId, DebtId, Email};
use crate::error::ValidationError;
use crate::schema::{EntityKind, FieldRule, Reference, Rule, Schema, Value, validate};
use crate::store::Entity;
use crate::user::User;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of a debt a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Is owed the value.
    Lender,
    /// Owes the value.
    Debtor,
}

/// An obligation of `debtor` to pay `value` to `lender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub id: Option<DebtId>,
    pub value: Decimal,
    pub comment: String,
    /// `true` while outstanding, `false` once resolved.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub lender: Email,
    pub debtor: Email,
    pub currency: CurrencyId,
}

impl Debt {
    /// Returns `true` if `user` is the lender or the debtor.
    ///
    /// Callers must check this before showing a debt fetched by id.
    pub fn lender_or_debtor(&self, user: &User) -> bool {
        self.lender == user.email || self.debtor == user.email
    }

    /// Returns the other party's email, or `None` if `user` is not a party.
    pub fn partner_of(&self, user: &User) -> Option<&Email> {
        match self.role_of(user)? {
            Role::Lender => Some(&self.debtor),
            Role::Debtor => Some(&self.lender),
        }
    }

    /// Returns the side `user` is on, or `None` if `user` is not a party.
    pub fn role_of(&self, user: &User) -> Option<Role> {
        if self.lender == user.email {
            Some(Role::Lender)
        } else if self.debtor == user.email {
            Some(Role::Debtor)
        } else {
            None
        }
    }
}

impl Schema for Debt {
    const ENTITY: EntityKind = EntityKind::Debt;
    const FIELDS: &'static [&'static str] = &[
        "id", "value", "comment", "active", "lender", "debtor", "currency",
    ];
    const RULES: &'static [FieldRule] = &[
        FieldRule::new("value", Rule::NonNegative),
        FieldRule::new("lender", Rule::Email),
        FieldRule::new("debtor", Rule::Email),
    ];

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => self.id.map(|id| Value::Id(id.0)),
            "value" => Some(self.value.into()),
            "comment" => Some(self.comment.as_str().into()),
            "active" => Some(self.active.into()),
            "lender" => Some((&self.lender).into()),
            "debtor" => Some((&self.debtor).into()),
            "currency" => Some(self.currency.into()),
            _ => None,
        }
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::User {
                field: "lender",
                email: self.lender.clone(),
            },
            Reference::User {
                field: "debtor",
                email: self.debtor.clone(),
            },
            Reference::Currency {
                field: "currency",
                id: self.currency,
            },
        ]
    }

    fn check(&self) -> Result<(), ValidationError> {
        if self.lender == self.debtor {
            return Err(ValidationError::new(EntityKind::Debt, "debtor", Rule::Distinct));
        }
        Ok(())
    }

    // Settlement is one-way.
    fn check_transition(&self, previous: &Self) -> Result<(), ValidationError> {
        if !previous.active && self.active {
            return Err(ValidationError::new(EntityKind::Debt, "active", Rule::Terminal));
        }
        Ok(())
    }
}

impl Entity for Debt {
    type Key = DebtId;
    const KEY_FIELD: &'static str = "id";

    fn key(&self) -> Option<DebtId> {
        self.id
    }

    fn assign_key(&mut self, sequence: u64) {
        self.id = Some(DebtId(sequence));
    }

    fn sequence_of(key: &DebtId) -> Option<u64> {
        Some(key.0)
    }
}

/// Input for creating a debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDebt {
    pub value: Decimal,
    #[serde(default)]
    pub comment: String,
    pub lender: Email,
    pub debtor: Email,
    pub currency: CurrencyId,
}

impl NewDebt {
    pub fn new(
        value: Decimal,
        lender: impl Into<Email>,
        debtor: impl Into<Email>,
        currency: CurrencyId,
    ) -> Self {
        Self {
            value,
            comment: String::new(),
            lender: lender.into(),
            debtor: debtor.into(),
            currency,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Checks the field rules of the debt this would create.
    ///
    /// Parties and currency are not looked up; the store checks them on
    /// insert.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(&self.clone().into_debt(Utc::now()))
    }

    /// Builds the active, keyless record created at `created_at`.
    pub fn into_debt(self, created_at: DateTime<Utc>) -> Debt {
        Debt {
            id: None,
            value: self.value,
            comment: self.comment,
            active: true,
            created_at,
            lender: self.lender,
            debtor: self.debtor,
            currency: self.currency,
        }
    }
}
