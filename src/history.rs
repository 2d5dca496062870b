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

//! A user's unified timeline of debts and loans.
//!
//! The debtor-side and lender-side queries are independent reads, so they run
//! in parallel with [`rayon::join`] and meet at the join point. Nothing is
//! shared between them.

use crate::debt::Debt;
use crate::error::StoreError;
use crate::ledger::Ledger;
use crate::store::LedgerStore;
use crate::user::User;
use std::cmp::Ordering;
use tracing::debug;

impl<S: LedgerStore> Ledger<S> {
    /// Every debt `user` is a party to, settled or not, newest first.
    ///
    /// Debts created at the same instant are ordered by id, highest first.
    ///
    /// # Errors
    ///
    /// Fails if either query fails; the debtor-side error is reported when
    /// both do. Partial results are discarded.
    pub fn history_of(&self, user: &User) -> Result<Vec<Debt>, StoreError> {
        let (debts, loans) = rayon::join(
            || self.debts_of(user, true),
            || self.loans_of(user, true),
        );

        let timeline = merge_timeline(debts?, loans?);
        debug!(email = %user.email, count = timeline.len(), "history built");
        Ok(timeline)
    }
}

/// Newest-first order: creation time descending, then id descending.
fn newest_first(a: &Debt, b: &Debt) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn merge_timeline(debts: Vec<Debt>, loans: Vec<Debt>) -> Vec<Debt> {
    let mut timeline = debts;
    timeline.extend(loans);
    timeline.sort_by(newest_first);

    // A self-debt would sit on both sides.
    timeline.dedup_by(|a, b| a.id.is_some() && a.id == b.id);
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{CurrencyId, DebtId};
    use crate::debt::NewDebt;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    fn debt(id: u64, created_at: DateTime<Utc>) -> Debt {
        let mut debt = NewDebt::new(dec!(1), "alice@example.com", "bob@example.com", CurrencyId(1))
            .into_debt(created_at);
        debt.id = Some(DebtId(id));
        debt
    }

    fn ids(timeline: &[Debt]) -> Vec<u64> {
        timeline.iter().filter_map(|d| d.id).map(|id| id.0).collect()
    }

    #[test]
    fn merge_sorts_newest_first() {
        let timeline = merge_timeline(
            vec![debt(1, at(10)), debt(3, at(30))],
            vec![debt(2, at(20)), debt(4, at(5))],
        );
        assert_eq!(ids(&timeline), vec![3, 2, 1, 4]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let timeline = merge_timeline(
            vec![debt(1, at(10)), debt(4, at(10))],
            vec![debt(3, at(10)), debt(2, at(10))],
        );
        assert_eq!(ids(&timeline), vec![4, 3, 2, 1]);
    }

    #[test]
    fn merge_of_empty_sides_is_empty() {
        assert!(merge_timeline(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn merge_drops_record_seen_on_both_sides() {
        let timeline = merge_timeline(vec![debt(1, at(10))], vec![debt(1, at(10))]);
        assert_eq!(ids(&timeline), vec![1]);
    }
}
