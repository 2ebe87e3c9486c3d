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

use crossbeam::channel::Sender;
use tradebook_sdk::types::Investor;

use crate::{
	orderbook::OrderBook,
	types::{Order, Transaction},
};

/// Control messages for the matching engine
///
/// These messages let other threads register reference data and read
/// engine state without sharing mutable state with the matching loop.
///
/// The matching loop drains the order queue before handling each message,
/// so a reply always reflects every order that was handed over before the
/// request was sent. Each reply travels on its own single-slot channel.
#[derive(Debug)]
pub enum EngineControlMessage {
	/// Register (or replace) an investor and its positions
	RegisterInvestor {
		investor: Investor,
		respond_to: Sender<()>,
	},

	/// Look up the latest state of an order by id
	GetOrder {
		order_id: String,
		respond_to: Sender<Option<Order>>,
	},

	/// Look up an investor and its positions
	GetInvestor {
		investor_id: String,
		respond_to: Sender<Option<Investor>>,
	},

	/// Copy of the trade log, oldest first
	GetTransactions {
		respond_to: Sender<Vec<Transaction>>,
	},

	/// Copy of one asset's order book
	GetOrderBook {
		asset_id: String,
		respond_to: Sender<Option<OrderBook>>,
	},

	/// Request the engine to shut down gracefully
	Shutdown,
}
