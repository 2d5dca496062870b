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

//! Currency labels. No conversion between currencies takes place.

use crate::base::CurrencyId;
use crate::schema::{EntityKind, FieldRule, Rule, Schema, Value};
use crate::store::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: Option<CurrencyId>,
    pub name: String,
    /// Display glyph appended to amounts, e.g. `$`.
    pub symbol: String,
}

impl Currency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

impl Schema for Currency {
    const ENTITY: EntityKind = EntityKind::Currency;
    const FIELDS: &'static [&'static str] = &["id", "name", "symbol"];
    const RULES: &'static [FieldRule] = &[
        FieldRule::new("name", Rule::NotEmpty),
        FieldRule::new("symbol", Rule::NotEmpty),
    ];

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => self.id.map(Value::from),
            "name" => Some(self.name.as_str().into()),
            "symbol" => Some(self.symbol.as_str().into()),
            _ => None,
        }
    }
}

impl Entity for Currency {
    type Key = CurrencyId;
    const KEY_FIELD: &'static str = "id";

    fn key(&self) -> Option<CurrencyId> {
        self.id
    }

    fn assign_key(&mut self, sequence: u64) {
        self.id = Some(CurrencyId(sequence));
    }

    fn sequence_of(key: &CurrencyId) -> Option<u64> {
        Some(key.0)
    }
}
