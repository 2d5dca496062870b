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

//! Record schemas, field rules and equality filters.
//!
//! Every persisted entity declares a static rule table mapping a field to a
//! [`Rule`]. Stores evaluate the table with [`validate`] before anything is
//! written, so a rejected record never reaches storage.
//!
//! | Entity | Field | Rule |
//! |--------|-------|------|
//! | user | `first_name`, `last_name` | `not_empty` |
//! | user | `email` | `email` |
//! | currency | `name`, `symbol` | `not_empty` |
//! | debt | `value` | `non_negative` |
//! | debt | `lender`, `debtor` | `email` |
//! | debt | `debtor` | `distinct` (cross-field) |
//! | debt | `active` | `terminal` (once `false`, stays `false`) |
//! | notification | `from`, `to` | `email` |
//! | notification | `text` | `not_empty` |

use crate::base::{CurrencyId, Email};
use crate::error::{StoreError, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four persisted entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Currency,
    Debt,
    Notification,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Currency => "currency",
            Self::Debt => "debt",
            Self::Notification => "notification",
        };
        f.write_str(name)
    }
}

/// A typed field value, as read by filters and rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(Decimal),
    Flag(bool),
    Id(u64),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&Email> for Value {
    fn from(value: &Email) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<CurrencyId> for Value {
    fn from(value: CurrencyId) -> Self {
        Self::Id(value.0)
    }
}

/// Field rules a store enforces at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Text must contain a non-whitespace character.
    NotEmpty,
    /// Number must be zero or greater.
    NonNegative,
    /// Text must be a well-formed email address.
    Email,
    /// Field must differ from its counterpart (lender vs. debtor).
    Distinct,
    /// Referenced record must exist.
    Exists,
    /// Key must not already be taken.
    Unique,
    /// State must not leave a terminal value once reached.
    Terminal,
}

impl Rule {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotEmpty => "not_empty",
            Self::NonNegative => "non_negative",
            Self::Email => "email",
            Self::Distinct => "distinct",
            Self::Exists => "exists",
            Self::Unique => "unique",
            Self::Terminal => "terminal",
        }
    }

    /// Human-readable message suitable for a field-level error.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotEmpty => "must not be empty",
            Self::NonNegative => "must not be negative",
            Self::Email => "must be a valid email address",
            Self::Distinct => "must differ from the other party",
            Self::Exists => "refers to a record that does not exist",
            Self::Unique => "is already taken",
            Self::Terminal => "cannot be reverted once settled",
        }
    }

    /// Evaluates the rule against a single field value.
    ///
    /// `Distinct`, `Exists`, `Unique` and `Terminal` depend on more than one
    /// value and are checked by [`Schema::check`],
    /// [`Schema::check_transition`] or the store itself; they always hold
    /// here.
    pub fn holds(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::NotEmpty, Value::Text(text)) => !text.trim().is_empty(),
            (Self::NonNegative, Value::Number(number)) => *number >= Decimal::ZERO,
            (Self::Email, Value::Text(text)) => Email::new(text.as_str()).is_well_formed(),
            (Self::NotEmpty | Self::NonNegative | Self::Email, _) => false,
            (Self::Distinct | Self::Exists | Self::Unique | Self::Terminal, _) => true,
        }
    }
}

/// One row of an entity's rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: Rule,
}

impl FieldRule {
    pub const fn new(field: &'static str, rule: Rule) -> Self {
        Self { field, rule }
    }
}

/// A foreign reference that must resolve at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    User { field: &'static str, email: Email },
    Currency { field: &'static str, id: CurrencyId },
}

impl Reference {
    pub fn field(&self) -> &'static str {
        match self {
            Self::User { field, .. } | Self::Currency { field, .. } => field,
        }
    }
}

/// Declarative description of a persisted record.
pub trait Schema {
    const ENTITY: EntityKind;

    /// Names accepted by [`Schema::field`] and by filters.
    const FIELDS: &'static [&'static str];

    /// Field rules, evaluated in order.
    const RULES: &'static [FieldRule];

    /// Reads a field by name, or `None` if the entity has no such field.
    fn field(&self, name: &str) -> Option<Value>;

    /// Foreign references the store must resolve before writing.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Cross-field checks that do not fit a single-field rule.
    fn check(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Checks a write that replaces `previous`, the stored version.
    fn check_transition(&self, _previous: &Self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Evaluates a record's rule table and cross-field checks.
///
/// Returns the first violation found.
pub fn validate<E: Schema>(record: &E) -> Result<(), ValidationError> {
    for entry in E::RULES {
        let holds = record
            .field(entry.field)
            .is_some_and(|value| entry.rule.holds(&value));
        if !holds {
            return Err(ValidationError::new(E::ENTITY, entry.field, entry.rule));
        }
    }
    record.check()
}

/// A conjunction of `field == value` criteria.
///
/// ```
/// use debt_ledger::{Email, Filter};
///
/// let filter = Filter::new()
///     .eq("lender", &Email::from("alice@example.com"))
///     .eq("active", true);
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    criteria: Vec<(&'static str, Value)>,
}

impl Filter {
    /// Creates a filter that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality criterion.
    pub fn eq(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.criteria.push((field, value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Fails if a criterion names a field `E` does not declare.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownField`] for the first unknown name.
    pub fn check<E: Schema>(&self) -> Result<(), StoreError> {
        match self
            .criteria
            .iter()
            .find(|(field, _)| !E::FIELDS.contains(field))
        {
            Some((field, _)) => Err(StoreError::UnknownField {
                entity: E::ENTITY,
                field: (*field).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Returns whether `record` satisfies every criterion.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownField`] if a criterion names a field the entity
    /// does not have.
    pub fn matches<E: Schema>(&self, record: &E) -> Result<bool, StoreError> {
        for (field, expected) in &self.criteria {
            let actual = record.field(field).ok_or_else(|| StoreError::UnknownField {
                entity: E::ENTITY,
                field: (*field).to_string(),
            })?;
            if actual != *expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Sample {
        name: String,
        amount: Decimal,
        contact: String,
    }

    impl Schema for Sample {
        const ENTITY: EntityKind = EntityKind::Currency;
        const FIELDS: &'static [&'static str] = &["name", "amount", "contact"];
        const RULES: &'static [FieldRule] = &[
            FieldRule::new("name", Rule::NotEmpty),
            FieldRule::new("amount", Rule::NonNegative),
            FieldRule::new("contact", Rule::Email),
        ];

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "name" => Some(self.name.as_str().into()),
                "amount" => Some(self.amount.into()),
                "contact" => Some(self.contact.as_str().into()),
                _ => None,
            }
        }
    }

    fn sample() -> Sample {
        Sample {
            name: "dollar".to_string(),
            amount: dec!(0),
            contact: "ops@example.com".to_string(),
        }
    }

    #[test]
    fn valid_record_passes() {
        assert_eq!(validate(&sample()), Ok(()));
    }

    #[test]
    fn blank_text_violates_not_empty() {
        let record = Sample {
            name: "   ".to_string(),
            ..sample()
        };
        let error = validate(&record).unwrap_err();
        assert_eq!(error.field, "name");
        assert_eq!(error.rule, Rule::NotEmpty);
    }

    #[test]
    fn first_violation_wins() {
        let record = Sample {
            amount: dec!(-1),
            contact: "nope".to_string(),
            ..sample()
        };
        let error = validate(&record).unwrap_err();
        assert_eq!(error.field, "amount");
        assert_eq!(error.rule, Rule::NonNegative);
    }

    #[test]
    fn rule_type_mismatch_fails() {
        assert!(!Rule::NonNegative.holds(&Value::Text("1".to_string())));
        assert!(!Rule::Email.holds(&Value::Flag(true)));
    }

    #[test]
    fn store_enforced_rules_hold_per_value() {
        assert!(Rule::Exists.holds(&Value::Id(1)));
        assert!(Rule::Unique.holds(&Value::Text(String::new())));
    }

    #[test]
    fn rule_codes_are_snake_case() {
        assert_eq!(Rule::NonNegative.code(), "non_negative");
        assert_eq!(Rule::NotEmpty.code(), "not_empty");
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(Filter::new().matches(&sample()), Ok(true));
    }

    #[test]
    fn composite_filter_requires_all_criteria() {
        let filter = Filter::new().eq("name", "dollar").eq("amount", dec!(0));
        assert_eq!(filter.matches(&sample()), Ok(true));

        let filter = Filter::new().eq("name", "dollar").eq("amount", dec!(1));
        assert_eq!(filter.matches(&sample()), Ok(false));
    }

    #[test]
    fn unknown_filter_field_is_an_error() {
        let filter = Filter::new().eq("colour", "red");
        assert_eq!(
            filter.matches(&sample()),
            Err(StoreError::UnknownField {
                entity: EntityKind::Currency,
                field: "colour".to_string(),
            })
        );
    }

    #[test]
    fn filter_check_needs_no_record() {
        let filter = Filter::new().eq("name", "dollar").eq("colour", "red");
        assert_eq!(
            filter.check::<Sample>(),
            Err(StoreError::UnknownField {
                entity: EntityKind::Currency,
                field: "colour".to_string(),
            })
        );
        assert_eq!(Filter::new().eq("contact", "x").check::<Sample>(), Ok(()));
    }

    #[test]
    fn terminal_rule_is_store_enforced() {
        assert_eq!(Rule::Terminal.code(), "terminal");
        assert!(Rule::Terminal.holds(&Value::Flag(true)));
    }
}
