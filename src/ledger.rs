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

//! Debt lifecycle.
//!
//! The [`Ledger`] creates debts, answers lender-side and debtor-side queries
//! for a user, and settles debts.
//!
//! # Operations
//!
//! | Operation | Store access |
//! |-----------|--------------|
//! | [`create_debt`](Ledger::create_debt) | insert, active, stamped now |
//! | [`loans_of`](Ledger::loans_of) | find `lender == email` (and `active`) |
//! | [`debts_of`](Ledger::debts_of) | find `debtor == email` (and `active`) |
//! | [`resolve`](Ledger::resolve) | atomic update `active = false` |
//!
//! # Thread Safety
//!
//! The ledger holds no state of its own besides a shared handle to the
//! store, and can be used from any number of threads.

use crate::base::{DebtId, Email};
use crate::currency::Currency;
use crate::debt::{Debt, NewDebt};
use crate::display;
use crate::error::{LedgerError, StoreError};
use crate::schema::{EntityKind, Filter};
use crate::store::{EntityStore, LedgerStore};
use crate::user::User;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Debt operations over a shared store.
#[derive(Debug)]
pub struct Ledger<S> {
    store: Arc<S>,
}

impl<S> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Records a new, active debt created now.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] if the value is negative, a party is not
    ///   a well-formed email, lender and debtor are the same, or a party or
    ///   the currency does not exist.
    /// - [`LedgerError::Store`] on backing store failure.
    pub fn create_debt(&self, new_debt: NewDebt) -> Result<Debt, LedgerError> {
        let debt = new_debt.into_debt(Utc::now());
        let debt = EntityStore::<Debt>::insert(self.store.as_ref(), debt)?;
        info!(
            debt = ?debt.id,
            lender = %debt.lender,
            debtor = %debt.debtor,
            value = %debt.value,
            "debt created"
        );
        Ok(debt)
    }

    /// Fetches a debt by id.
    ///
    /// Check [`Debt::lender_or_debtor`] before showing the result to anyone.
    pub fn debt(&self, id: DebtId) -> Result<Option<Debt>, StoreError> {
        EntityStore::<Debt>::get(self.store.as_ref(), &id)
    }

    /// Debts in which `user` is the lender.
    ///
    /// Settled debts are included only when `include_inactive` is set.
    pub fn loans_of(&self, user: &User, include_inactive: bool) -> Result<Vec<Debt>, StoreError> {
        self.side_of("lender", &user.email, include_inactive)
    }

    /// Debts in which `user` is the debtor.
    ///
    /// Settled debts are included only when `include_inactive` is set.
    pub fn debts_of(&self, user: &User, include_inactive: bool) -> Result<Vec<Debt>, StoreError> {
        self.side_of("debtor", &user.email, include_inactive)
    }

    fn side_of(
        &self,
        side: &'static str,
        email: &Email,
        include_inactive: bool,
    ) -> Result<Vec<Debt>, StoreError> {
        let mut filter = Filter::new().eq(side, email);
        if !include_inactive {
            filter = filter.eq("active", true);
        }

        let debts = EntityStore::<Debt>::find(self.store.as_ref(), &filter)?;
        debug!(%email, side, include_inactive, count = debts.len(), "debts queried");
        Ok(debts)
    }

    /// Marks a debt as settled and returns the stored result.
    ///
    /// The flag is flipped on the latest stored version of the record, in a
    /// single store update, so concurrent writes to other fields are kept.
    /// Resolving a debt that is already settled leaves it settled.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the debt was never stored.
    pub fn resolve(&self, debt: &Debt) -> Result<Debt, LedgerError> {
        let id = debt.id.ok_or_else(|| StoreError::NotFound {
            entity: EntityKind::Debt,
            key: "<unsaved>".to_string(),
        })?;

        let resolved = EntityStore::<Debt>::update(self.store.as_ref(), &id, |stored| {
            if !stored.active {
                debug!(debt = %id, "debt already resolved");
            }
            stored.active = false;
        })?;
        info!(debt = %id, "debt resolved");
        Ok(resolved)
    }

    /// Formats a debt's value with its currency symbol, e.g. `42$`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the debt's currency does not exist.
    pub fn pretty_value(&self, debt: &Debt) -> Result<String, StoreError> {
        let currency = EntityStore::<Currency>::get(self.store.as_ref(), &debt.currency)?
            .ok_or_else(|| StoreError::NotFound {
                entity: EntityKind::Currency,
                key: debt.currency.to_string(),
            })?;
        Ok(display::pretty_value(debt, &currency))
    }
}
