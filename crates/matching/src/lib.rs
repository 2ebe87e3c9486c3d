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

//! Tradebook Matching Engine
//!
//! This crate provides the matching core of a securities exchange. It keeps
//! one price-time priority order book per asset, crosses buy and sell
//! limit orders as they arrive, settles investor positions and records
//! every executed transaction in an append-only trade log.
//!
//! Architecture:
//! - Single-threaded matching loop that owns all matching state
//! - MPSC inbound order queue (a synchronous handoff by default)
//! - Blocking outbound stream of order updates
//! - Trade counter that callers wait on for an expected number of trades
//! - Control messages for reads and investor registration

pub mod config;
pub mod counter;
pub mod engine;
pub mod logging;
pub mod matcher;
pub mod orderbook;
pub mod queue;
pub mod types;
pub mod updates;

pub use counter::TradeCounter;
pub use engine::{EngineConfig, EngineError, MatchingEngine};
pub use matcher::Matcher;
pub use orderbook::{OrderBook, PriceLevel};
pub use queue::{OrderQueue, OrderReceiver, OrderSender, QueueError};
pub use types::*;
pub use updates::{UpdateConsumer, UpdateError, UpdateProducer, UpdateStream};
