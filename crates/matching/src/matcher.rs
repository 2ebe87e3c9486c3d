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

use chrono::Utc;
use tracing::{debug, warn};
use tradebook_sdk::types::{Investor, OrderStatus, Position, Side};

use crate::{
	orderbook::OrderBook,
	types::{MatchResult, MatchingError, Order, SequenceNumber, Transaction},
};

/// Matcher that applies deterministic price-time priority
///
/// The matcher owns every piece of mutable matching state: the arena of
/// accepted orders, one order book per asset, the investor registry and the
/// trade log. It is a plain single-threaded structure; the engine runs it on
/// a dedicated worker so that all mutation happens in arrival order.
#[derive(Debug, Default)]
pub struct Matcher {
	/// Every accepted order by id. Orders are never removed.
	orders: HashMap<String, Order>,
	/// Asset id -> OrderBook
	order_books: HashMap<String, OrderBook>,
	/// Investor id -> Investor
	investors: HashMap<String, Investor>,
	/// Executed transactions in execution order
	transactions: Vec<Transaction>,
	next_sequence: SequenceNumber,
}

impl Matcher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register an investor, replacing any previous registration
	pub fn add_investor(&mut self, investor: Investor) {
		self.investors.insert(investor.id.clone(), investor);
	}

	/// Process an incoming order and match it against its asset's book
	///
	/// The order is queued first and then the book is crossed for as long
	/// as the best bid meets the best ask:
	/// - Price priority: better prices match first
	/// - Time priority: earlier orders at the same price match first
	/// - The execution price is the limit price of the order that arrived
	///   first, so a newly arrived taker gets the maker's price
	///
	/// Every fill settles positions and appends one transaction to the log.
	pub fn match_order(&mut self, mut order: Order) -> Result<MatchResult, MatchingError> {
		if self.orders.contains_key(&order.order_id) {
			return Err(MatchingError::DuplicateOrder(order.order_id));
		}

		self.next_sequence += 1;
		order.sequence = self.next_sequence;

		if !self.investors.contains_key(&order.investor_id) {
			debug!(
				"Registering unseen investor {} from order {}",
				order.investor_id, order.order_id
			);
			self.add_investor(Investor::new(order.investor_id.clone()));
		}

		let order_id = order.order_id.clone();
		let asset_id = order.asset_id.clone();

		if order.pending_shares == 0 {
			warn!(
				"Order {} arrived with nothing pending, closing without queueing",
				order_id
			);
			order.status = OrderStatus::Closed;
			self.orders.insert(order_id, order.clone());
			return Ok(MatchResult {
				order,
				transactions: Vec::new(),
			});
		}

		// Status follows the pending quantity, whatever the submitter set
		order.status = OrderStatus::Open;

		self.order_books
			.entry(asset_id.clone())
			.or_insert_with(|| OrderBook::new(asset_id.clone()))
			.add_order(order.side, order.price, order_id.clone(), order.pending_shares);
		self.orders.insert(order_id.clone(), order);

		let mut transactions = Vec::new();
		while let Some(transaction) = self.match_step(&asset_id)? {
			transactions.push(transaction);
		}

		let order = self
			.orders
			.get(&order_id)
			.cloned()
			.ok_or_else(|| MatchingError::OrderBookError(format!("order {order_id} vanished")))?;

		Ok(MatchResult {
			order,
			transactions,
		})
	}

	/// Execute one fill between the heads of an asset's book, if they cross
	fn match_step(&mut self, asset_id: &str) -> Result<Option<Transaction>, MatchingError> {
		let Some(book) = self.order_books.get_mut(asset_id) else {
			return Ok(None);
		};
		if !book.is_crossed() {
			return Ok(None);
		}

		let (buy_id, sell_id) = match (book.head(Side::Buy), book.head(Side::Sell)) {
			(Some(buy), Some(sell)) => (buy.to_string(), sell.to_string()),
			_ => return Ok(None),
		};

		let buy = Self::resting(&self.orders, &buy_id)?;
		let sell = Self::resting(&self.orders, &sell_id)?;

		let matched = buy.pending_shares.min(sell.pending_shares);
		let price = if buy.sequence < sell.sequence {
			buy.price
		} else {
			sell.price
		};

		let buy_order = Self::apply_fill(&mut self.orders, &buy_id, matched)?;
		let sell_order = Self::apply_fill(&mut self.orders, &sell_id, matched)?;

		book.reduce_head(Side::Buy, matched);
		if !buy_order.is_open() {
			book.pop_head(Side::Buy, 0);
		}
		book.reduce_head(Side::Sell, matched);
		if !sell_order.is_open() {
			book.pop_head(Side::Sell, 0);
		}

		self.settle(asset_id, &buy_order.investor_id, &sell_order.investor_id, matched);

		let transaction = Transaction {
			transaction_id: format!("tx_{}", uuid::Uuid::new_v4()),
			asset_id: asset_id.to_string(),
			shares: matched,
			price,
			total: price * rust_decimal::Decimal::from(matched),
			timestamp: Utc::now().timestamp_millis(),
			buy_order,
			sell_order,
		};

		debug!(
			"Executed {} x {} @ {} on {} (buy {}, sell {})",
			transaction.transaction_id,
			matched,
			price,
			asset_id,
			buy_id,
			sell_id
		);

		self.transactions.push(transaction.clone());
		Ok(Some(transaction))
	}

	fn resting<'a>(orders: &'a HashMap<String, Order>, order_id: &str) -> Result<&'a Order, MatchingError> {
		orders
			.get(order_id)
			.ok_or_else(|| MatchingError::OrderBookError(format!("resting order {order_id} not tracked")))
	}

	fn apply_fill(
		orders: &mut HashMap<String, Order>,
		order_id: &str,
		shares: u64,
	) -> Result<Order, MatchingError> {
		let order = orders
			.get_mut(order_id)
			.ok_or_else(|| MatchingError::OrderBookError(format!("resting order {order_id} not tracked")))?;
		order.fill(shares);
		Ok(order.clone())
	}

	/// Credit the buyer and debit the seller for one fill
	///
	/// Sellers are not checked for holdings; an oversell leaves a negative
	/// position and is reported.
	fn settle(&mut self, asset_id: &str, buyer_id: &str, seller_id: &str, shares: u64) {
		self.investor_mut(buyer_id)
			.position_mut_or_default(asset_id)
			.credit(shares);

		let position = self.investor_mut(seller_id).position_mut_or_default(asset_id);
		position.debit(shares);
		if position.shares < 0 {
			warn!(
				"Investor {} oversold {}: position is now {}",
				seller_id, asset_id, position.shares
			);
		}
	}

	fn investor_mut(&mut self, investor_id: &str) -> &mut Investor {
		self.investors
			.entry(investor_id.to_string())
			.or_insert_with(|| Investor::new(investor_id))
	}

	pub fn order(&self, order_id: &str) -> Option<&Order> {
		self.orders.get(order_id)
	}

	pub fn investor(&self, investor_id: &str) -> Option<&Investor> {
		self.investors.get(investor_id)
	}

	pub fn position(&self, investor_id: &str, asset_id: &str) -> Option<&Position> {
		self.investors.get(investor_id)?.position(asset_id)
	}

	/// Executed transactions, oldest first
	pub fn transactions(&self) -> &[Transaction] {
		&self.transactions
	}

	pub fn transaction(&self, index: usize) -> Option<&Transaction> {
		self.transactions.get(index)
	}

	pub fn order_book(&self, asset_id: &str) -> Option<&OrderBook> {
		self.order_books.get(asset_id)
	}

	pub fn order_books(&self) -> impl Iterator<Item = &OrderBook> {
		self.order_books.values()
	}
}
