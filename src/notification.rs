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

//! Messages between users, read back through [`Feed`](crate::Feed).
//!
//! Both addresses must be well formed; neither has to be registered.

use crate::base::{Email, NotificationId};
use crate::schema::{EntityKind, FieldRule, Rule, Schema, Value};
use crate::store::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbox entry. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Option<NotificationId>,
    pub from: Email,
    pub to: Email,
    pub created_at: DateTime<Utc>,
    pub text: String,
}

impl Notification {
    pub fn new(from: impl Into<Email>, to: impl Into<Email>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            from: from.into(),
            to: to.into(),
            created_at: Utc::now(),
            text: text.into(),
        }
    }
}

impl Schema for Notification {
    const ENTITY: EntityKind = EntityKind::Notification;
    const FIELDS: &'static [&'static str] = &["id", "from", "to", "text"];
    const RULES: &'static [FieldRule] = &[
        FieldRule::new("from", Rule::Email),
        FieldRule::new("to", Rule::Email),
        FieldRule::new("text", Rule::NotEmpty),
    ];

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => self.id.map(|id| Value::Id(id.0)),
            "from" => Some((&self.from).into()),
            "to" => Some((&self.to).into()),
            "text" => Some(self.text.as_str().into()),
            _ => None,
        }
    }
}

impl Entity for Notification {
    type Key = NotificationId;
    const KEY_FIELD: &'static str = "id";

    fn key(&self) -> Option<NotificationId> {
        self.id
    }

    fn assign_key(&mut self, sequence: u64) {
        self.id = Some(NotificationId(sequence));
    }

    fn sequence_of(key: &NotificationId) -> Option<u64> {
        Some(key.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::schema::{Filter, validate};

    fn reminder() -> Notification {
        Notification::new("alice@example.com", "bob@example.com", "you owe me 5$")
    }

    #[test]
    fn new_is_unsaved_and_stamped() {
        let before = Utc::now();
        let notification = reminder();
        assert_eq!(notification.id, None);
        assert!(notification.created_at >= before);
        assert!(validate(&notification).is_ok());
    }

    #[test]
    fn recipient_must_be_an_email() {
        let notification = Notification {
            to: Email::from("bob"),
            ..reminder()
        };
        assert_eq!(
            validate(&notification),
            Err(ValidationError::new(EntityKind::Notification, "to", Rule::Email))
        );
    }

    #[test]
    fn text_must_not_be_empty() {
        let notification = Notification::new("alice@example.com", "bob@example.com", "");
        assert_eq!(
            validate(&notification).map_err(|e| e.field),
            Err("text")
        );
    }

    #[test]
    fn key_comes_from_sequence() {
        let mut notification = reminder();
        notification.assign_key(7);
        assert_eq!(notification.key(), Some(NotificationId(7)));
        assert_eq!(Notification::sequence_of(&NotificationId(7)), Some(7));
        assert_eq!(notification.field("id"), Some(Value::Id(7)));
    }

    #[test]
    fn filters_by_recipient() {
        let notification = reminder();
        let to_bob = Filter::new().eq("to", &Email::from("bob@example.com"));
        let to_alice = Filter::new().eq("to", &Email::from("alice@example.com"));
        assert_eq!(to_bob.matches(&notification), Ok(true));
        assert_eq!(to_alice.matches(&notification), Ok(false));
    }
}
