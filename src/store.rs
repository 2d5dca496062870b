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

//! Entity store abstraction.
//!
//! The ledger never owns records itself. It reads and writes through an
//! [`EntityStore`] for each entity type, and anything returned from a store
//! is a snapshot, not a live handle.
//!
//! # Write contract
//!
//! Implementations must:
//!
//! - run [`validate`](crate::schema::validate) and resolve every
//!   [`Reference`](crate::schema::Reference) before persisting, failing with
//!   a [`ValidationError`](crate::ValidationError) and writing nothing;
//! - serialize writes to a single record, so that [`EntityStore::update`]
//!   observes and replaces the latest stored version without interleaving.

use crate::currency::Currency;
use crate::debt::Debt;
use crate::error::{LedgerError, StoreError};
use crate::notification::Notification;
use crate::schema::{Filter, Schema};
use crate::user::User;
use std::fmt;
use std::hash::Hash;

/// A record that can be kept in an [`EntityStore`].
pub trait Entity: Schema + Clone + Send + Sync + 'static {
    /// Primary key type.
    type Key: Clone + Eq + Ord + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    /// Name of the key field, used when reporting duplicates.
    const KEY_FIELD: &'static str;

    /// Returns the record's key, or `None` if the store has yet to assign one.
    fn key(&self) -> Option<Self::Key>;

    /// Gives a keyless record the key derived from a table sequence number.
    fn assign_key(&mut self, sequence: u64);

    /// Sequence number behind `key`, for tables whose keys are sequenced.
    fn sequence_of(key: &Self::Key) -> Option<u64>;
}

/// Typed persistence for one entity type.
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Returns every record matching `filter`, in store-native order.
    fn find(&self, filter: &Filter) -> Result<Vec<E>, StoreError>;

    /// Returns the record stored under `key`.
    fn get(&self, key: &E::Key) -> Result<Option<E>, StoreError>;

    /// Persists a new record, assigning a key if it has none.
    ///
    /// Fails with a `unique` [`ValidationError`](crate::ValidationError) if
    /// the key is already taken.
    fn insert(&self, record: E) -> Result<E, LedgerError>;

    /// Persists a record, replacing any previous version under its key.
    fn save(&self, record: E) -> Result<E, LedgerError>;

    /// Atomically applies `mutation` to the stored record under `key`.
    ///
    /// The mutated record is validated before it replaces the stored one.
    /// Fails with [`StoreError::NotFound`] if no record exists.
    fn update<F>(&self, key: &E::Key, mutation: F) -> Result<E, LedgerError>
    where
        F: FnOnce(&mut E);
}

/// A store holding every ledger entity.
pub trait LedgerStore:
    EntityStore<User> + EntityStore<Currency> + EntityStore<Debt> + EntityStore<Notification>
{
}

impl<S> LedgerStore for S where
    S: EntityStore<User> + EntityStore<Currency> + EntityStore<Debt> + EntityStore<Notification>
{
}
