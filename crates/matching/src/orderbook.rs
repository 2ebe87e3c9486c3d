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

use std::{
	cmp::Reverse,
	collections::{BTreeMap, VecDeque},
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradebook_sdk::types::Side;

/// Price level in the order book
///
/// A price level holds the ids of all resting orders at one price, in
/// time priority order (first-in-first-out). Partial fills reduce the
/// level's depth but never move an order within the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevel {
	price: Decimal,
	/// Order ids at this price level in time priority order
	orders: VecDeque<String>,
	/// Total pending shares of all orders at this level
	total_shares: u64,
}

impl PriceLevel {
	fn new(price: Decimal) -> Self {
		Self {
			price,
			orders: VecDeque::new(),
			total_shares: 0,
		}
	}

	pub fn price(&self) -> Decimal {
		self.price
	}

	fn push_back(&mut self, order_id: String, shares: u64) {
		self.total_shares += shares;
		self.orders.push_back(order_id);
	}

	pub fn front(&self) -> Option<&str> {
		self.orders.front().map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}

	pub fn total_shares(&self) -> u64 {
		self.total_shares
	}

	pub fn order_count(&self) -> usize {
		self.orders.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.orders.iter().map(String::as_str)
	}
}

/// Limit order book for one asset (single-threaded)
///
/// The book only stores order ids and depth; the orders themselves live in
/// the matcher's arena. All operations are called from the matching loop.
///
/// Design characteristics:
/// - No concurrent access (no locks, no Arc)
/// - Deterministic iteration order
/// - Buy side: highest price first (descending order via Reverse wrapper)
/// - Sell side: lowest price first (ascending order, natural BTreeMap order)
/// - Empty levels are pruned immediately, so the first entry on each side
///   is always a live order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
	asset_id: String,
	bids: BTreeMap<Reverse<Decimal>, PriceLevel>,
	asks: BTreeMap<Decimal, PriceLevel>,
}

impl OrderBook {
	/// Create an empty order book for an asset
	pub fn new(asset_id: String) -> Self {
		Self {
			asset_id,
			bids: BTreeMap::new(),
			asks: BTreeMap::new(),
		}
	}

	pub fn asset_id(&self) -> &str {
		&self.asset_id
	}

	/// Queue an order at the back of its price level
	pub fn add_order(&mut self, side: Side, price: Decimal, order_id: String, shares: u64) {
		match side {
			Side::Buy => self
				.bids
				.entry(Reverse(price))
				.or_insert_with(|| PriceLevel::new(price))
				.push_back(order_id, shares),
			Side::Sell => self
				.asks
				.entry(price)
				.or_insert_with(|| PriceLevel::new(price))
				.push_back(order_id, shares),
		}
	}

	/// Get the best bid price
	pub fn best_bid(&self) -> Option<Decimal> {
		self.bids.first_key_value().map(|(key, _)| key.0)
	}

	/// Get the best ask price
	pub fn best_ask(&self) -> Option<Decimal> {
		self.asks.first_key_value().map(|(key, _)| *key)
	}

	/// Id of the order with the highest priority on a side
	pub fn head(&self, side: Side) -> Option<&str> {
		match side {
			Side::Buy => self.bids.first_key_value().and_then(|(_, l)| l.front()),
			Side::Sell => self.asks.first_key_value().and_then(|(_, l)| l.front()),
		}
	}

	/// Whether the best bid meets or exceeds the best ask
	pub fn is_crossed(&self) -> bool {
		match (self.best_bid(), self.best_ask()) {
			(Some(bid), Some(ask)) => bid >= ask,
			_ => false,
		}
	}

	/// Reduce the depth of the best level after its head was partially filled
	pub fn reduce_head(&mut self, side: Side, shares: u64) {
		let level = match side {
			Side::Buy => self.bids.first_entry().map(|e| e.into_mut()),
			Side::Sell => self.asks.first_entry().map(|e| e.into_mut()),
		};
		if let Some(level) = level {
			level.total_shares = level.total_shares.saturating_sub(shares);
		}
	}

	/// Remove the head order of a side, pruning its level if now empty
	///
	/// `shares` is the pending quantity the order still carried in the
	/// level's depth (zero when it was fully filled via `reduce_head`).
	pub fn pop_head(&mut self, side: Side, shares: u64) -> Option<String> {
		match side {
			Side::Buy => {
				let mut entry = self.bids.first_entry()?;
				let level = entry.get_mut();
				let order_id = level.orders.pop_front();
				level.total_shares = level.total_shares.saturating_sub(shares);
				if level.is_empty() {
					entry.remove();
				}
				order_id
			}
			Side::Sell => {
				let mut entry = self.asks.first_entry()?;
				let level = entry.get_mut();
				let order_id = level.orders.pop_front();
				level.total_shares = level.total_shares.saturating_sub(shares);
				if level.is_empty() {
					entry.remove();
				}
				order_id
			}
		}
	}

	/// Get the level depth at a specific price level
	pub fn get_level_depth(&self, side: Side, price: Decimal) -> Option<u64> {
		match side {
			Side::Buy => self.bids.get(&Reverse(price)).map(|l| l.total_shares()),
			Side::Sell => self.asks.get(&price).map(|l| l.total_shares()),
		}
	}

	/// Price levels of one side, best first
	pub fn levels(&self, side: Side) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
		match side {
			Side::Buy => Box::new(self.bids.values()),
			Side::Sell => Box::new(self.asks.values()),
		}
	}

	/// Get total number of resting orders in the book
	pub fn order_count(&self) -> usize {
		let bid_count: usize = self.bids.values().map(|l| l.order_count()).sum();
		let ask_count: usize = self.asks.values().map(|l| l.order_count()).sum();
		bid_count + ask_count
	}

	pub fn is_empty(&self) -> bool {
		self.bids.is_empty() && self.asks.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	fn book() -> OrderBook {
		OrderBook::new("asset1".to_string())
	}

	#[test]
	fn test_add_and_pop_order() {
		let mut book = book();

		book.add_order(Side::Buy, dec!(5), "order_1".to_string(), 5);

		assert_eq!(book.best_bid(), Some(dec!(5)));
		assert_eq!(book.order_count(), 1);

		let removed = book.pop_head(Side::Buy, 5);
		assert_eq!(removed.as_deref(), Some("order_1"));
		assert_eq!(book.order_count(), 0);
		assert_eq!(book.best_bid(), None);
		assert!(book.is_empty());
	}

	#[test]
	fn test_price_priority() {
		let mut book = book();

		book.add_order(Side::Buy, dec!(5.0), "order_1".to_string(), 1);
		book.add_order(Side::Buy, dec!(5.1), "order_2".to_string(), 1);
		book.add_order(Side::Buy, dec!(4.9), "order_3".to_string(), 1);
		book.add_order(Side::Sell, dec!(6.2), "order_4".to_string(), 1);
		book.add_order(Side::Sell, dec!(6.1), "order_5".to_string(), 1);

		assert_eq!(book.best_bid(), Some(dec!(5.1)));
		assert_eq!(book.head(Side::Buy), Some("order_2"));
		assert_eq!(book.best_ask(), Some(dec!(6.1)));
		assert_eq!(book.head(Side::Sell), Some("order_5"));

		book.pop_head(Side::Buy, 1);
		assert_eq!(book.best_bid(), Some(dec!(5.0)));
	}

	#[test]
	fn test_time_priority_at_same_price() {
		let mut book = book();

		book.add_order(Side::Sell, dec!(5), "order_1".to_string(), 1);
		book.add_order(Side::Sell, dec!(5), "order_2".to_string(), 1);
		book.add_order(Side::Sell, dec!(5), "order_3".to_string(), 1);

		assert_eq!(book.head(Side::Sell), Some("order_1"));
		book.pop_head(Side::Sell, 1);
		assert_eq!(book.head(Side::Sell), Some("order_2"));
	}

	#[test]
	fn test_partial_fill_keeps_head_and_reduces_depth() {
		let mut book = book();

		book.add_order(Side::Buy, dec!(5), "order_1".to_string(), 5);
		book.add_order(Side::Buy, dec!(5), "order_2".to_string(), 3);
		assert_eq!(book.get_level_depth(Side::Buy, dec!(5)), Some(8));

		book.reduce_head(Side::Buy, 3);

		assert_eq!(book.head(Side::Buy), Some("order_1"));
		assert_eq!(book.get_level_depth(Side::Buy, dec!(5)), Some(5));
	}

	#[test]
	fn test_crossed_detection() {
		let mut book = book();
		assert!(!book.is_crossed());

		book.add_order(Side::Sell, dec!(6.0), "sell".to_string(), 3);
		book.add_order(Side::Buy, dec!(5.0), "buy".to_string(), 5);
		assert!(!book.is_crossed());

		book.add_order(Side::Buy, dec!(6.0), "buy_2".to_string(), 1);
		assert!(book.is_crossed());
	}
}
