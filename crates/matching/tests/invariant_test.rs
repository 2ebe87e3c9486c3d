//! Property tests for the matcher invariants
//!
//! Random order flows across two assets must always leave:
//! - every order `Closed` exactly when nothing is pending
//! - pending quantities that never grow
//! - uncrossed books
//! - executed prices equal to the earlier order's limit
//! - shares conserved between buyers, sellers and the trade log

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tradebook_matching::{Matcher, Order};
use tradebook_sdk::types::{Asset, Investor, OrderStatus, Side};

const ASSETS: [&str; 2] = ["asset1", "asset2"];

#[derive(Debug, Clone)]
struct Submission {
	side: Side,
	asset: usize,
	investor: usize,
	shares: u64,
	/// Price in half units
	ticks: i64,
}

fn submission() -> impl Strategy<Value = Submission> {
	(any::<bool>(), 0..ASSETS.len(), 0usize..4, 1u64..10, 8i64..14).prop_map(
		|(buy, asset, investor, shares, ticks)| Submission {
			side: if buy { Side::Buy } else { Side::Sell },
			asset,
			investor,
			shares,
			ticks,
		},
	)
}

proptest! {
	#[test]
	fn prop_matching_invariants(flow in prop::collection::vec(submission(), 1..80)) {
		let assets: Vec<_> = ASSETS
			.iter()
			.map(|id| Asset::new(*id, id.to_uppercase(), Decimal::from(100)))
			.collect();
		let investors: Vec<_> = (0..4).map(|i| Investor::new(format!("inv_{i}"))).collect();

		let mut matcher = Matcher::new();
		let mut last_pending: HashMap<String, u64> = HashMap::new();

		for (n, s) in flow.iter().enumerate() {
			let order_id = format!("order_{n}");
			let order = Order::new(
				order_id.clone(),
				&investors[s.investor],
				&assets[s.asset],
				s.shares,
				Decimal::new(s.ticks * 5, 1),
				s.side,
			);
			let result = matcher.match_order(order).unwrap();
			last_pending.insert(order_id, s.shares);

			for tx in &result.transactions {
				prop_assert!(tx.shares > 0);
				prop_assert_eq!(tx.total, tx.price * Decimal::from(tx.shares));
				let maker = if tx.buy_order.sequence < tx.sell_order.sequence {
					&tx.buy_order
				} else {
					&tx.sell_order
				};
				prop_assert_eq!(tx.price, maker.price);
				prop_assert!(tx.buy_order.price >= tx.sell_order.price);
			}

			for (id, previous) in last_pending.iter_mut() {
				let order = matcher.order(id).unwrap();
				prop_assert_eq!(order.status == OrderStatus::Closed, order.pending_shares == 0);
				prop_assert!(order.pending_shares <= *previous);
				*previous = order.pending_shares;
			}

			for book in matcher.order_books() {
				if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
					prop_assert!(bid < ask, "book {} left crossed", book.asset_id());
				}
			}
		}

		for asset in ASSETS {
			let traded: u64 = matcher
				.transactions()
				.iter()
				.filter(|tx| tx.asset_id == asset)
				.map(|tx| tx.shares)
				.sum();

			let (bought, sold) = (0..flow.len())
				.filter_map(|n| matcher.order(&format!("order_{n}")))
				.filter(|o| o.asset_id == asset)
				.fold((0u64, 0u64), |(b, s), o| match o.side {
					Side::Buy => (b + o.filled_shares(), s),
					Side::Sell => (b, s + o.filled_shares()),
				});
			prop_assert_eq!(bought, traded);
			prop_assert_eq!(sold, traded);

			let net: i64 = (0..4)
				.filter_map(|i| matcher.position(&format!("inv_{i}"), asset))
				.map(|p| p.shares)
				.sum();
			prop_assert_eq!(net, 0);
		}
	}
}
