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

//! Per-user notification inbox.

use crate::base::Email;
use crate::error::{LedgerError, StoreError};
use crate::notification::Notification;
use crate::schema::Filter;
use crate::store::EntityStore;
use crate::user::User;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Feed<S> {
    store: Arc<S>,
}

impl<S> Clone for Feed<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EntityStore<Notification>> Feed<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Stores a notification from `from` to `to`, created now.
    pub fn notify(
        &self,
        from: &Email,
        to: &Email,
        text: impl Into<String>,
    ) -> Result<Notification, LedgerError> {
        let notification = self
            .store
            .insert(Notification::new(from.clone(), to.clone(), text))?;
        info!(id = ?notification.id, %from, %to, "notification stored");
        Ok(notification)
    }

    /// Notifications addressed to `user`, oldest first.
    pub fn notifications_of(&self, user: &User) -> Result<Vec<Notification>, StoreError> {
        let notifications = self.store.find(&Filter::new().eq("to", &user.email))?;
        debug!(email = %user.email, count = notifications.len(), "notifications queried");
        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::schema::Rule;

    fn feed() -> Feed<MemoryStore> {
        Feed::new(Arc::new(MemoryStore::new()))
    }

    fn user(email: &str) -> User {
        User::new("Test", "User", email)
    }

    #[test]
    fn only_recipient_sees_notification() {
        let feed = feed();
        let alice = user("alice@example.com");
        let bob = user("bob@example.com");

        feed.notify(&alice.email, &bob.email, "you owe me 10$").unwrap();

        let inbox = feed.notifications_of(&bob).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].from, alice.email);
        assert_eq!(inbox[0].text, "you owe me 10$");
        assert!(feed.notifications_of(&alice).unwrap().is_empty());
    }

    #[test]
    fn inbox_keeps_insertion_order() {
        let feed = feed();
        let alice = user("alice@example.com");
        let bob = user("bob@example.com");

        for text in ["first", "second", "third"] {
            feed.notify(&alice.email, &bob.email, text).unwrap();
        }

        let texts: Vec<_> = feed
            .notifications_of(&bob)
            .unwrap()
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_text_is_rejected() {
        let feed = feed();
        let error = feed
            .notify(&Email::from("a@example.com"), &Email::from("b@example.com"), "")
            .unwrap_err();
        let violation = error.as_validation().unwrap();
        assert_eq!(violation.field, "text");
        assert_eq!(violation.rule, Rule::NotEmpty);
    }
}
