// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// The side an order of this side trades against
	pub fn opposite(self) -> Self {
		match self {
			Side::Buy => Side::Sell,
			Side::Sell => Side::Buy,
		}
	}
}

/// Order status
///
/// There is no partially-filled state: a partially filled order stays
/// `Open` with a reduced pending quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
	Open,
	Closed,
}

/// Tradable instrument reference data
///
/// The price is display data only; matching never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
	/// Asset identifier (routing key for order books)
	pub id: String,
	/// Human readable name
	pub name: String,
	/// Reference price
	pub price: Decimal,
}

impl Asset {
	pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			price,
		}
	}
}

/// Quantity of one asset held by an investor
///
/// Shares are signed so that an oversell the caller failed to reject is
/// visible as a negative holding rather than a wrapped integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
	pub asset_id: String,
	pub shares: i64,
}

impl Position {
	pub fn new(asset_id: impl Into<String>, shares: i64) -> Self {
		Self {
			asset_id: asset_id.into(),
			shares,
		}
	}

	/// Add bought shares, saturating at `i64::MAX`
	pub fn credit(&mut self, shares: u64) {
		let shares = i64::try_from(shares).unwrap_or(i64::MAX);
		self.shares = self.shares.saturating_add(shares);
	}

	/// Remove sold shares, saturating at `i64::MIN`
	pub fn debit(&mut self, shares: u64) {
		let shares = i64::try_from(shares).unwrap_or(i64::MAX);
		self.shares = self.shares.saturating_sub(shares);
	}
}

/// Investor identity and its positions, keyed by asset id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
	pub id: String,
	positions: HashMap<String, Position>,
}

impl Investor {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			positions: HashMap::new(),
		}
	}

	/// Insert a position, replacing any existing one for the same asset
	pub fn add_position(&mut self, position: Position) {
		self.positions.insert(position.asset_id.clone(), position);
	}

	pub fn position(&self, asset_id: &str) -> Option<&Position> {
		self.positions.get(asset_id)
	}

	/// Get the position for an asset, creating an empty one on first use
	pub fn position_mut_or_default(&mut self, asset_id: &str) -> &mut Position {
		self.positions
			.entry(asset_id.to_string())
			.or_insert_with(|| Position::new(asset_id, 0))
	}

	pub fn positions(&self) -> impl Iterator<Item = &Position> {
		self.positions.values()
	}
}
