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

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradebook_sdk::types::{Asset, Investor, OrderStatus, Side};

/// Arrival sequence assigned by the matcher (time priority key)
pub type SequenceNumber = u64;

/// Order submission as it arrives from outside the process
///
/// This is the wire form read by the binary. It references the investor and
/// asset by id only; both are expected to be registered before submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCommand {
	/// Unique order ID
	pub order_id: String,
	pub investor_id: String,
	pub asset_id: String,
	/// Side of the order
	pub side: Side,
	/// Limit price
	pub price: Decimal,
	/// Original quantity
	pub shares: u64,
}

/// Order tracked by the matching engine
///
/// `shares` is the immutable original size. `pending_shares` only decreases,
/// and the order is `Closed` exactly when it reaches zero. The investor and
/// asset are held by id since both outlive the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	pub order_id: String,
	pub investor_id: String,
	pub asset_id: String,
	pub side: Side,
	/// Limit price
	pub price: Decimal,
	/// Original quantity
	pub shares: u64,
	/// Quantity still waiting to be matched
	pub pending_shares: u64,
	pub status: OrderStatus,
	/// Arrival sequence, zero until the matcher accepts the order
	pub sequence: SequenceNumber,
}

impl Order {
	pub fn new(
		order_id: impl Into<String>,
		investor: &Investor,
		asset: &Asset,
		shares: u64,
		price: Decimal,
		side: Side,
	) -> Self {
		Self {
			order_id: order_id.into(),
			investor_id: investor.id.clone(),
			asset_id: asset.id.clone(),
			side,
			price,
			shares,
			pending_shares: shares,
			status: OrderStatus::Open,
			sequence: 0,
		}
	}

	pub fn is_open(&self) -> bool {
		self.status == OrderStatus::Open
	}

	/// Quantity matched so far
	pub fn filled_shares(&self) -> u64 {
		self.shares - self.pending_shares
	}

	/// Apply a fill, closing the order once nothing is pending
	pub(crate) fn fill(&mut self, shares: u64) {
		debug_assert!(shares <= self.pending_shares);
		self.pending_shares -= shares;
		if self.pending_shares == 0 {
			self.status = OrderStatus::Closed;
		}
	}
}

impl From<OrderCommand> for Order {
	fn from(cmd: OrderCommand) -> Self {
		Self {
			order_id: cmd.order_id,
			investor_id: cmd.investor_id,
			asset_id: cmd.asset_id,
			side: cmd.side,
			price: cmd.price,
			shares: cmd.shares,
			pending_shares: cmd.shares,
			status: OrderStatus::Open,
			sequence: 0,
		}
	}
}

/// One executed match between a buy order and a sell order
///
/// The order snapshots are taken right after the fill was applied, so they
/// show the state each order was left in by this transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	pub transaction_id: String,
	pub asset_id: String,
	pub buy_order: Order,
	pub sell_order: Order,
	pub shares: u64,
	/// Execution price (the maker's limit price)
	pub price: Decimal,
	/// `shares * price`
	pub total: Decimal,
	/// Execution time in UTC milliseconds
	pub timestamp: i64,
}

/// Result of submitting one order to the matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
	/// The submitted order in its final state for this pass
	pub order: Order,
	/// Transactions executed during the pass, in execution order
	pub transactions: Vec<Transaction>,
}

impl MatchResult {
	pub fn fully_filled(&self) -> bool {
		self.order.pending_shares == 0
	}

	pub fn partially_filled(&self) -> bool {
		!self.transactions.is_empty() && self.order.pending_shares > 0
	}
}

/// Error types for matching operations
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
	#[error("Duplicate order id: {0}")]
	DuplicateOrder(String),
	#[error("Order book error: {0}")]
	OrderBookError(String),
}
