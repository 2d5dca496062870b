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

//! Registered users.

use crate::base::Email;
use crate::credential;
use crate::schema::{EntityKind, FieldRule, Rule, Schema, Value};
use crate::store::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub registered_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// Argon2 PHC string. Never serialized.
    #[serde(default, skip_serializing)]
    pub password_hash: String,
}

impl User {
    /// Creates a user registered now, with no password set.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<Email>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            registered_at: Utc::now(),
            last_login: None,
            password_hash: String::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Checks `candidate` against the stored password hash.
    pub fn verify_password(&self, candidate: &str) -> bool {
        credential::verify(candidate, &self.password_hash)
    }
}

impl Schema for User {
    const ENTITY: EntityKind = EntityKind::User;
    const FIELDS: &'static [&'static str] = &["first_name", "last_name", "email"];
    const RULES: &'static [FieldRule] = &[
        FieldRule::new("first_name", Rule::NotEmpty),
        FieldRule::new("last_name", Rule::NotEmpty),
        FieldRule::new("email", Rule::Email),
    ];

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "first_name" => Some(self.first_name.as_str().into()),
            "last_name" => Some(self.last_name.as_str().into()),
            "email" => Some((&self.email).into()),
            _ => None,
        }
    }
}

impl Entity for User {
    type Key = Email;
    const KEY_FIELD: &'static str = "email";

    fn key(&self) -> Option<Email> {
        Some(self.email.clone())
    }

    // Users carry their natural key.
    fn assign_key(&mut self, _sequence: u64) {}

    fn sequence_of(_key: &Email) -> Option<u64> {
        None
    }
}
