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

use clap::Parser;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use debt_ledger::{
    CurrencyId, DebtId, Directory, Email, EntityKind, EntityStore, Ledger, LedgerConfig, LedgerError,
    MemoryStore, NewDebt, Role, StoreError, User,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Debt Ledger - Replay ledger events and print a user's history
///
/// Reads lend/resolve events from a CSV file and writes the chosen user's
/// history, newest first, to stdout. Set RUST_LOG to see skipped rows.
#[derive(Parser, Debug)]
#[command(name = "debt-ledger")]
#[command(about = "Replays a ledger event CSV and prints one user's history", long_about = None)]
struct Args {
    /// Path to CSV file with ledger events
    ///
    /// Expected format: type,id,lender,debtor,amount,currency,comment
    /// Example: cargo run -- events.csv --user alice@example.com > history.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Email of the user whose history is printed
    #[arg(short, long, value_name = "EMAIL")]
    user: String,

    /// Optional JSON configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match File::open(path).map(|f| LedgerConfig::from_json(BufReader::new(f))) {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                eprintln!("Error parsing config '{}': {}", path.display(), e);
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error opening config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => LedgerConfig::default(),
    };

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let replay = match process_events(BufReader::new(file), &config) {
        Ok(replay) => replay,
        Err(e) => {
            eprintln!("Error processing events: {}", e);
            process::exit(1);
        }
    };

    let email = Email::from(args.user);
    let user = match replay.directory.user(&email) {
        Ok(Some(user)) => user,
        Ok(None) => {
            eprintln!("Unknown user '{}'", email);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error looking up '{}': {}", email, e);
            process::exit(1);
        }
    };

    if let Err(e) = write_history(&replay.ledger, &user, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, id, lender, debtor, amount, currency, comment`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    event_type: String,
    id: u32,
    #[serde(default)]
    lender: Option<String>,
    #[serde(default)]
    debtor: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

/// A replayable ledger event. `reference` is the file-local debt number.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Lend {
        reference: u32,
        lender: Email,
        debtor: Email,
        amount: Decimal,
        symbol: String,
        comment: String,
    },
    Resolve {
        reference: u32,
    },
}

impl CsvRecord {
    /// Converts CSV record to an Event.
    ///
    /// Returns `None` for unknown event types or missing required fields.
    fn into_event(self) -> Option<Event> {
        match self.event_type.to_lowercase().as_str() {
            "lend" => Some(Event::Lend {
                reference: self.id,
                lender: Email::from(self.lender?),
                debtor: Email::from(self.debtor?),
                amount: self.amount?,
                symbol: self.currency?,
                comment: self.comment.unwrap_or_default(),
            }),
            "resolve" => Some(Event::Resolve { reference: self.id }),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
enum ReplayError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("debt reference {0} was already used")]
    DuplicateReference(u32),

    #[error("debt reference {0} is unknown")]
    UnknownReference(u32),
}

/// Ledger state built from a stream of events.
struct Replay {
    store: Arc<MemoryStore>,
    ledger: Ledger<MemoryStore>,
    directory: Directory<MemoryStore>,
    currencies: HashMap<String, CurrencyId>,
    references: HashMap<u32, DebtId>,
}

impl Replay {
    fn new(config: &LedgerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            ledger: Ledger::new(Arc::clone(&store)),
            directory: Directory::new(Arc::clone(&store), config.password),
            store,
            currencies: HashMap::new(),
            references: HashMap::new(),
        }
    }

    fn apply(&mut self, event: Event) -> Result<(), ReplayError> {
        match event {
            Event::Lend {
                reference,
                lender,
                debtor,
                amount,
                symbol,
                comment,
            } => {
                if self.references.contains_key(&reference) {
                    return Err(ReplayError::DuplicateReference(reference));
                }
                // The currency is assigned after the row passes its field rules,
                // so a rejected row enrolls nothing.
                let mut new_debt =
                    NewDebt::new(amount, lender, debtor, CurrencyId(0)).with_comment(comment);
                new_debt.validate().map_err(LedgerError::from)?;

                self.enroll(&new_debt.lender)?;
                self.enroll(&new_debt.debtor)?;
                new_debt.currency = self.currency(&symbol)?;

                let debt = self.ledger.create_debt(new_debt)?;
                if let Some(id) = debt.id {
                    self.references.insert(reference, id);
                }
            }
            Event::Resolve { reference } => {
                let id = self
                    .references
                    .get(&reference)
                    .copied()
                    .ok_or(ReplayError::UnknownReference(reference))?;
                let debt = self
                    .ledger
                    .debt(id)
                    .map_err(LedgerError::from)?
                    .ok_or(ReplayError::UnknownReference(reference))?;
                self.ledger.resolve(&debt)?;
            }
        }
        Ok(())
    }

    /// Adds a party seen for the first time. Enrolled users have no password.
    fn enroll(&self, email: &Email) -> Result<(), LedgerError> {
        if self.directory.user(email)?.is_some() {
            return Ok(());
        }

        let (local, domain) = email.as_str().split_once('@').unwrap_or((email.as_str(), ""));
        let user = User::new(local, domain, email.clone());
        EntityStore::<User>::insert(self.store.as_ref(), user)?;
        Ok(())
    }

    fn currency(&mut self, symbol: &str) -> Result<CurrencyId, LedgerError> {
        if let Some(id) = self.currencies.get(symbol) {
            return Ok(*id);
        }

        let currency = self.directory.add_currency(symbol, symbol)?;
        let id = currency.id.ok_or_else(|| StoreError::NotFound {
            entity: EntityKind::Currency,
            key: symbol.to_string(),
        })?;
        self.currencies.insert(symbol.to_string(), id);
        Ok(id)
    }
}

/// Replay ledger events from a CSV reader.
///
/// Rows are streamed, so the file is never held in memory. Malformed rows and
/// events the ledger rejects are skipped with a warning.
///
/// # CSV Format
///
/// Expected columns: `type, id, lender, debtor, amount, currency, comment`
/// - `type`: Event type (lend, resolve)
/// - `id`: File-local debt reference (u32)
/// - `lender`, `debtor`: Party emails (lend only)
/// - `amount`: Decimal amount (lend only)
/// - `currency`: Currency symbol (lend only)
/// - `comment`: Free text (optional)
///
/// # Example
///
/// ```csv
/// type,id,lender,debtor,amount,currency,comment
/// lend,1,alice@example.com,bob@example.com,100,$,rent
/// resolve,1,,,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails.
fn process_events<R: Read>(reader: R, config: &LedgerConfig) -> Result<Replay, csv::Error> {
    let mut replay = Replay::new(config);

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(event) = record.into_event() else {
                    warn!("skipping invalid event record");
                    continue;
                };

                if let Err(e) = replay.apply(event.clone()) {
                    warn!(?event, error = %e, "skipping rejected event");
                }
            }
            Err(e) => {
                if e.is_io_error() {
                    return Err(e);
                }
                warn!(error = %e, "skipping malformed row");
            }
        }
    }

    Ok(replay)
}

const HISTORY_HEADER: [&str; 7] = [
    "id", "created", "role", "partner", "amount", "active", "comment",
];

/// One line of history output.
#[derive(Debug, Serialize)]
struct HistoryRow {
    id: u64,
    created: String,
    role: Role,
    partner: String,
    amount: String,
    active: bool,
    comment: String,
}

#[derive(Debug, Error)]
enum OutputError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Write a user's history to a CSV writer, newest first.
///
/// # CSV Format
///
/// Columns: `id, created, role, partner, amount, active, comment`
///
/// # Example
///
/// ```csv
/// id,created,role,partner,amount,active,comment
/// 2,2025-01-02T10:00:00+00:00,debtor,bob@example.com,50$,true,
/// 1,2025-01-01T09:30:00+00:00,lender,bob@example.com,100$,false,rent
/// ```
fn write_history<W: Write>(
    ledger: &Ledger<MemoryStore>,
    user: &User,
    writer: W,
) -> Result<(), OutputError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HISTORY_HEADER)?;

    for debt in ledger.history_of(user)? {
        let (Some(id), Some(role), Some(partner)) =
            (debt.id, debt.role_of(user), debt.partner_of(user))
        else {
            continue;
        };

        wtr.serialize(HistoryRow {
            id: id.0,
            created: debt.created_at.to_rfc3339(),
            role,
            partner: partner.to_string(),
            amount: ledger.pretty_value(&debt)?,
            active: debt.active,
            comment: debt.comment.clone(),
        })?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
