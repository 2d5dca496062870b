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

//! # Debt Ledger
//!
//! This library tracks money owed between registered users: who lent what to
//! whom, in which currency, and whether it has been settled.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Creates and settles debts, answers lender-side and
//!   debtor-side queries, and builds a user's chronological history
//! - [`Directory`]: Registers users, checks logins, manages currencies
//! - [`Feed`]: Per-user notification inbox
//! - [`EntityStore`]: Storage abstraction, with [`MemoryStore`] as the
//!   in-process implementation
//! - [`LedgerError`]: Validation, store and credential failures
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use debt_ledger::{Directory, Ledger, MemoryStore, NewDebt, NewUser, PasswordConfig};
//! use rust_decimal_macros::dec;
//!
//! let store = Arc::new(MemoryStore::new());
//! let directory = Directory::new(Arc::clone(&store), PasswordConfig::fast());
//! let ledger = Ledger::new(Arc::clone(&store));
//!
//! let register = |first: &str, email: &str| {
//!     directory.register(NewUser {
//!         first_name: first.to_string(),
//!         last_name: "Example".to_string(),
//!         email: email.into(),
//!         password: "secret".to_string(),
//!     })
//! };
//! let alice = register("Alice", "alice@example.com").unwrap();
//! let bob = register("Bob", "bob@example.com").unwrap();
//! let dollar = directory.add_currency("Dollar", "$").unwrap();
//!
//! // Alice lends Bob 100$
//! let debt = ledger
//!     .create_debt(NewDebt::new(dec!(100), "alice@example.com", "bob@example.com", dollar.id.unwrap()))
//!     .unwrap();
//! assert_eq!(ledger.pretty_value(&debt).unwrap(), "100$");
//! assert_eq!(ledger.history_of(&bob).unwrap(), vec![debt.clone()]);
//!
//! // Bob pays it back
//! ledger.resolve(&debt).unwrap();
//! assert!(ledger.loans_of(&alice, false).unwrap().is_empty());
//! assert_eq!(ledger.loans_of(&alice, true).unwrap().len(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! Stores are `Send + Sync` and serialize writes per record. Services hold
//! only an `Arc` to their store and can be cloned across threads.

mod base;
pub mod config;
pub mod credential;
mod currency;
mod debt;
mod directory;
pub mod display;
pub mod error;
mod feed;
mod history;
mod ledger;
mod memory_store;
mod notification;
pub mod schema;
pub mod store;
mod user;

pub use base::{CurrencyId, DebtId, Email, NotificationId};
pub use config::{LedgerConfig, PasswordConfig};
pub use credential::CredentialVerifier;
pub use currency::Currency;
pub use debt::{Debt, NewDebt, Role};
pub use directory::{Directory, NewUser};
pub use error::{CredentialError, LedgerError, StoreError, ValidationError};
pub use feed::Feed;
pub use ledger::Ledger;
pub use memory_store::MemoryStore;
pub use notification::Notification;
pub use schema::{EntityKind, Filter, Rule};
pub use store::{Entity, EntityStore, LedgerStore};
pub use user::User;
