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

//! In-process entity store.
//!
//! # Thread Safety
//!
//! Each entity type lives in its own [`DashMap`]. Writes go through the map's
//! entry guard, which holds the shard lock for the record's key, so two
//! writers of the same record are serialized while writers of different
//! records proceed in parallel. Reads return clones.

use crate::currency::Currency;
use crate::debt::Debt;
use crate::error::{LedgerError, StoreError, ValidationError};
use crate::notification::Notification;
use crate::schema::{Filter, Reference, Rule, Schema, validate};
use crate::store::{Entity, EntityStore};
use crate::user::User;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};

/// Records of one entity type, with the sequence used to assign new keys.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: DashMap<E::Key, E>,
    sequence: AtomicU64,
}

impl<E: Entity> Table<E> {
    fn new() -> Self {
        Self {
            rows: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    fn find(&self, filter: &Filter) -> Result<Vec<E>, StoreError> {
        filter.check::<E>()?;

        let mut matched = Vec::new();
        for row in self.rows.iter() {
            if filter.matches(row.value())? {
                matched.push((row.key().clone(), row.value().clone()));
            }
        }

        // Key order is insertion order for sequenced tables.
        matched.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(matched.into_iter().map(|(_, record)| record).collect())
    }

    fn get(&self, key: &E::Key) -> Option<E> {
        self.rows.get(key).map(|row| row.value().clone())
    }

    /// Assigns a key to a keyless record and keeps the sequence ahead of
    /// explicitly keyed ones.
    fn keyed(&self, mut record: E) -> Result<(E::Key, E), StoreError> {
        if record.key().is_none() {
            let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            record.assign_key(sequence);
        }

        let key = record.key().ok_or_else(|| {
            StoreError::Unavailable(format!("{} record was not assigned a key", E::ENTITY))
        })?;
        if let Some(sequence) = E::sequence_of(&key) {
            self.sequence.fetch_max(sequence, Ordering::SeqCst);
        }
        Ok((key, record))
    }

    fn insert<R>(&self, record: E, references: R) -> Result<E, LedgerError>
    where
        R: Fn(&E) -> Result<(), ValidationError>,
    {
        validate(&record)?;
        references(&record)?;
        let (key, record) = self.keyed(record)?;

        // Entry API gives an atomic check-and-insert on the key.
        match self.rows.entry(key) {
            Entry::Occupied(_) => {
                Err(ValidationError::new(E::ENTITY, E::KEY_FIELD, Rule::Unique).into())
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
                Ok(record)
            }
        }
    }

    fn save<R>(&self, record: E, references: R) -> Result<E, LedgerError>
    where
        R: Fn(&E) -> Result<(), ValidationError>,
    {
        validate(&record)?;
        references(&record)?;
        let (key, record) = self.keyed(record)?;

        match self.rows.entry(key) {
            Entry::Occupied(mut entry) => {
                record.check_transition(entry.get())?;
                entry.insert(record.clone());
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
            }
        }
        Ok(record)
    }

    fn update<F, R>(&self, key: &E::Key, mutation: F, references: R) -> Result<E, LedgerError>
    where
        F: FnOnce(&mut E),
        R: Fn(&E) -> Result<(), ValidationError>,
    {
        // The guard holds the shard lock until the new version is written.
        let mut row = self.rows.get_mut(key).ok_or_else(|| StoreError::NotFound {
            entity: E::ENTITY,
            key: key.to_string(),
        })?;

        let mut next = row.value().clone();
        mutation(&mut next);
        if next.key().as_ref() != Some(key) {
            return Err(StoreError::KeyChanged {
                entity: E::ENTITY,
                key: key.to_string(),
            }
            .into());
        }
        validate(&next)?;
        next.check_transition(row.value())?;
        references(&next)?;

        *row.value_mut() = next.clone();
        Ok(next)
    }
}

/// Thread-safe in-memory implementation of every [`EntityStore`].
///
/// # Example
///
/// ```
/// use debt_ledger::{Currency, EntityStore, Filter, MemoryStore};
///
/// let store = MemoryStore::new();
/// let dollar = store.insert(Currency::new("Dollar", "$")).unwrap();
/// assert!(dollar.id.is_some());
///
/// let found: Vec<Currency> = store.find(&Filter::new().eq("symbol", "$")).unwrap();
/// assert_eq!(found, vec![dollar]);
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    users: Table<User>,
    currencies: Table<Currency>,
    debts: Table<Debt>,
    notifications: Table<Notification>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            users: Table::new(),
            currencies: Table::new(),
            debts: Table::new(),
            notifications: Table::new(),
        }
    }

    /// Fails with an `exists` violation on the first reference that does not
    /// resolve to a stored record.
    fn resolve_references<E: Schema>(&self, record: &E) -> Result<(), ValidationError> {
        for reference in record.references() {
            let exists = match &reference {
                Reference::User { email, .. } => self.users.rows.contains_key(email),
                Reference::Currency { id, .. } => self.currencies.rows.contains_key(id),
            };
            if !exists {
                return Err(ValidationError::new(E::ENTITY, reference.field(), Rule::Exists));
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! memory_table {
    ($entity:ty, $table:ident) => {
        impl EntityStore<$entity> for MemoryStore {
            fn find(&self, filter: &Filter) -> Result<Vec<$entity>, StoreError> {
                self.$table.find(filter)
            }

            fn get(&self, key: &<$entity as Entity>::Key) -> Result<Option<$entity>, StoreError> {
                Ok(self.$table.get(key))
            }

            fn insert(&self, record: $entity) -> Result<$entity, LedgerError> {
                self.$table
                    .insert(record, |record| self.resolve_references(record))
            }

            fn save(&self, record: $entity) -> Result<$entity, LedgerError> {
                self.$table.save(record, |record| self.resolve_references(record))
            }

            fn update<F>(
                &self,
                key: &<$entity as Entity>::Key,
                mutation: F,
            ) -> Result<$entity, LedgerError>
            where
                F: FnOnce(&mut $entity),
            {
                self.$table
                    .update(key, mutation, |record| self.resolve_references(record))
            }
        }
    };
}

memory_table!(User, users);
memory_table!(Currency, currencies);
memory_table!(Debt, debts);
memory_table!(Notification, notifications);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{CurrencyId, DebtId, Email};
    use crate::debt::NewDebt;
    use crate::schema::EntityKind;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn seeded() -> (MemoryStore, CurrencyId) {
        let store = MemoryStore::new();
        store.insert(User::new("Alice", "Smith", "alice@example.com")).unwrap();
        store.insert(User::new("Bob", "Jones", "bob@example.com")).unwrap();
        let dollar = store.insert(Currency::new("Dollar", "$")).unwrap();
        (store, dollar.id.unwrap())
    }

    fn debt(currency: CurrencyId) -> Debt {
        NewDebt::new(dec!(10), "alice@example.com", "bob@example.com", currency)
            .into_debt(Utc::now())
    }

    #[test]
    fn insert_assigns_sequential_keys() {
        let (store, dollar) = seeded();
        let first = store.insert(debt(dollar)).unwrap();
        let second = store.insert(debt(dollar)).unwrap();
        assert_eq!(first.id, Some(DebtId(1)));
        assert_eq!(second.id, Some(DebtId(2)));
    }

    #[test]
    fn duplicate_user_email_is_rejected() {
        let (store, _) = seeded();
        let result = store.insert(User::new("Alice", "Other", "alice@example.com"));
        assert_eq!(
            result,
            Err(ValidationError::new(EntityKind::User, "email", Rule::Unique).into())
        );
    }

    #[test]
    fn invalid_record_is_not_persisted() {
        let (store, dollar) = seeded();
        let mut record = debt(dollar);
        record.value = dec!(-1);

        let error = store.insert(record).unwrap_err();
        assert_eq!(error.as_validation().map(|e| e.field), Some("value"));

        let all: Vec<Debt> = EntityStore::<Debt>::find(&store, &Filter::new()).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn unknown_party_is_rejected() {
        let (store, dollar) = seeded();
        let mut record = debt(dollar);
        record.debtor = Email::from("mallory@example.com");

        let error = store.insert(record).unwrap_err();
        assert_eq!(
            error,
            ValidationError::new(EntityKind::Debt, "debtor", Rule::Exists).into()
        );
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let (store, _) = seeded();
        let error = store.insert(debt(CurrencyId(99))).unwrap_err();
        assert_eq!(
            error,
            ValidationError::new(EntityKind::Debt, "currency", Rule::Exists).into()
        );
    }

    #[test]
    fn save_replaces_existing_record() {
        let (store, dollar) = seeded();
        let mut record = store.insert(debt(dollar)).unwrap();
        record.comment = "dinner".to_string();
        store.save(record.clone()).unwrap();

        let stored: Option<Debt> = EntityStore::<Debt>::get(&store, &DebtId(1)).unwrap();
        assert_eq!(stored, Some(record));
    }

    #[test]
    fn save_with_explicit_key_advances_sequence() {
        let (store, dollar) = seeded();
        let mut record = debt(dollar);
        record.id = Some(DebtId(10));
        store.save(record).unwrap();

        let next = store.insert(debt(dollar)).unwrap();
        assert_eq!(next.id, Some(DebtId(11)));
    }

    #[test]
    fn update_applies_mutation() {
        let (store, dollar) = seeded();
        store.insert(debt(dollar)).unwrap();

        let updated =
            EntityStore::<Debt>::update(&store, &DebtId(1), |debt| debt.active = false).unwrap();
        assert!(!updated.active);
        let stored: Option<Debt> = EntityStore::<Debt>::get(&store, &DebtId(1)).unwrap();
        assert!(!stored.unwrap().active);
    }

    #[test]
    fn update_rejects_invalid_mutation() {
        let (store, dollar) = seeded();
        store.insert(debt(dollar)).unwrap();

        let result = EntityStore::<Debt>::update(&store, &DebtId(1), |debt| debt.value = dec!(-5));
        assert!(result.unwrap_err().as_validation().is_some());

        let stored: Option<Debt> = EntityStore::<Debt>::get(&store, &DebtId(1)).unwrap();
        assert_eq!(stored.unwrap().value, dec!(10));
    }

    #[test]
    fn update_rejects_key_change() {
        let (store, dollar) = seeded();
        store.insert(debt(dollar)).unwrap();

        let result = EntityStore::<Debt>::update(&store, &DebtId(1), |debt| {
            debt.id = Some(DebtId(2));
        });
        assert_eq!(
            result,
            Err(StoreError::KeyChanged {
                entity: EntityKind::Debt,
                key: "1".to_string(),
            }
            .into())
        );
    }

    #[test]
    fn update_of_missing_record_is_not_found() {
        let (store, _) = seeded();
        let result = EntityStore::<Debt>::update(&store, &DebtId(42), |debt| debt.active = false);
        assert_eq!(
            result,
            Err(StoreError::NotFound {
                entity: EntityKind::Debt,
                key: "42".to_string(),
            }
            .into())
        );
    }

    #[test]
    fn find_returns_records_in_insertion_order() {
        let (store, dollar) = seeded();
        for _ in 0..20 {
            store.insert(debt(dollar)).unwrap();
        }

        let ids: Vec<_> = EntityStore::<Debt>::find(&store, &Filter::new())
            .unwrap()
            .into_iter()
            .filter_map(|debt| debt.id)
            .collect();
        let expected: Vec<_> = (1..=20).map(DebtId).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn find_with_unknown_field_fails() {
        let (store, _) = seeded();
        let result = EntityStore::<Debt>::find(&store, &Filter::new().eq("owner", "x"));
        assert!(matches!(result, Err(StoreError::UnknownField { .. })));
    }

    #[test]
    fn find_with_unknown_field_fails_on_populated_table() {
        let (store, dollar) = seeded();
        store.insert(debt(dollar)).unwrap();
        let result = EntityStore::<Debt>::find(&store, &Filter::new().eq("owner", "x"));
        assert!(matches!(result, Err(StoreError::UnknownField { .. })));
    }

    #[test]
    fn settled_debt_cannot_be_reactivated() {
        let (store, dollar) = seeded();
        let stored = store.insert(debt(dollar)).unwrap();
        let id = stored.id.unwrap();
        EntityStore::<Debt>::update(&store, &id, |d| d.active = false).unwrap();

        let expected: Result<Debt, LedgerError> =
            Err(ValidationError::new(EntityKind::Debt, "active", Rule::Terminal).into());
        assert_eq!(store.save(stored), expected);
        assert_eq!(
            EntityStore::<Debt>::update(&store, &id, |d| d.active = true),
            expected
        );

        let current: Option<Debt> = EntityStore::<Debt>::get(&store, &id).unwrap();
        assert!(!current.unwrap().active);
    }
}
