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

//! Human-readable amounts.

use crate::currency::Currency;
use crate::debt::Debt;

/// Concatenates a debt's value and its currency symbol: `42` and `$` give
/// `42$`.
///
/// Trailing fractional zeros are dropped, so `42.50` renders as `42.5$`.
/// The symbol is taken from `currency` as given; [`Ledger::pretty_value`]
/// loads the debt's own currency first.
///
/// [`Ledger::pretty_value`]: crate::Ledger::pretty_value
pub fn pretty_value(debt: &Debt, currency: &Currency) -> String {
    format!("{}{}", debt.value.normalize(), currency.symbol)
}
