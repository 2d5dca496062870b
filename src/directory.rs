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

//! User registration, login and currency reference data.
//!
//! Registration hashes the password with the configured
//! [`CredentialVerifier`]; login checks it and stamps the login time.
//! Session handling is left to the caller.

use crate::base::{CurrencyId, Email};
use crate::config::PasswordConfig;
use crate::credential::CredentialVerifier;
use crate::currency::Currency;
use crate::error::{LedgerError, StoreError};
use crate::schema::{Filter, validate};
use crate::store::{EntityStore, LedgerStore};
use crate::user::User;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: String,
}

#[derive(Debug)]
pub struct Directory<S> {
    store: Arc<S>,
    verifier: CredentialVerifier,
    /// Verified against when the email is unknown, so that a miss costs
    /// the same as a wrong password.
    dummy_hash: String,
}

impl<S: LedgerStore> Directory<S> {
    pub fn new(store: Arc<S>, password: PasswordConfig) -> Self {
        let verifier = CredentialVerifier::new(password);
        let dummy_hash = verifier.hash("").unwrap_or_default();
        Self {
            store,
            verifier,
            dummy_hash,
        }
    }

    /// Registers a user. Emails are unique.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] for a missing name, a malformed email,
    ///   or an email that is already registered.
    /// - [`LedgerError::Credential`] if the password cannot be hashed.
    pub fn register(&self, new_user: NewUser) -> Result<User, LedgerError> {
        let mut user = User::new(new_user.first_name, new_user.last_name, new_user.email);

        // Reject bad input before paying for the hash.
        validate(&user)?;
        user.password_hash = self.verifier.hash(&new_user.password)?;

        let user = EntityStore::<User>::insert(self.store.as_ref(), user)?;
        info!(email = %user.email, "user registered");
        Ok(user)
    }

    /// Checks a login attempt.
    ///
    /// Returns the user with a fresh `last_login` on success, or `None` if the
    /// email is unknown or the password does not match.
    pub fn authenticate(&self, email: &Email, password: &str) -> Result<Option<User>, LedgerError> {
        let Some(user) = self.user(email)? else {
            self.verifier.verify(password, &self.dummy_hash);
            warn!(%email, "login for unknown user");
            return Ok(None);
        };

        if !self.verifier.verify(password, &user.password_hash) {
            warn!(%email, "login with wrong password");
            return Ok(None);
        }

        let user = EntityStore::<User>::update(self.store.as_ref(), email, |stored| {
            stored.last_login = Some(Utc::now());
        })?;
        info!(%email, "user logged in");
        Ok(Some(user))
    }

    /// Replaces a user's password.
    pub fn change_password(&self, email: &Email, new_password: &str) -> Result<User, LedgerError> {
        let password_hash = self.verifier.hash(new_password)?;
        let user = EntityStore::<User>::update(self.store.as_ref(), email, |stored| {
            stored.password_hash = password_hash;
        })?;
        info!(%email, "password changed");
        Ok(user)
    }

    pub fn user(&self, email: &Email) -> Result<Option<User>, StoreError> {
        EntityStore::<User>::get(self.store.as_ref(), email)
    }

    /// Adds a currency to the reference data.
    pub fn add_currency(
        &self,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Result<Currency, LedgerError> {
        let currency = EntityStore::<Currency>::insert(
            self.store.as_ref(),
            Currency::new(name, symbol),
        )?;
        info!(id = ?currency.id, symbol = %currency.symbol, "currency added");
        Ok(currency)
    }

    pub fn currency(&self, id: CurrencyId) -> Result<Option<Currency>, StoreError> {
        EntityStore::<Currency>::get(self.store.as_ref(), &id)
    }

    pub fn currencies(&self) -> Result<Vec<Currency>, StoreError> {
        EntityStore::<Currency>::find(self.store.as_ref(), &Filter::new())
    }
}
