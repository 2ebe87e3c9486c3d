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

mod control;

pub use control::EngineControlMessage;

use std::{
	sync::Arc,
	thread::{self, JoinHandle},
};

use crossbeam::channel::{Receiver, RecvError, Sender, bounded, select, unbounded};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tradebook_sdk::types::{Investor, Position};

use crate::{
	counter::TradeCounter,
	matcher::Matcher,
	orderbook::OrderBook,
	queue::{OrderReceiver, QueueError},
	types::{Order, Transaction},
	updates::UpdateProducer,
};

/// Error types for matching engine operations
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Failed to spawn matching loop: {0}")]
	SpawnFailed(#[from] std::io::Error),
	#[error("Engine shutdown")]
	Shutdown,
}

/// What woke the matching loop up
enum Wakeup {
	Order(Order),
	OrdersClosed,
	Control(Result<EngineControlMessage, RecvError>),
}

/// Configuration for the matching engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
	pub verbose_logging: bool,
}

/// Main matching engine with single-threaded event loop
///
/// The MatchingEngine runs the matching loop in a dedicated thread that
/// owns the [`Matcher`]: every order book, every order's fill state, every
/// position and the trade log. Nothing else mutates them, so matching is
/// serialized in arrival order without locks around the books.
///
/// Other threads talk to the loop only through channels:
/// - orders arrive on the [`OrderReceiver`]
/// - touched orders leave on the [`UpdateProducer`] after each fill
/// - each executed transaction calls [`TradeCounter::done`] once
/// - reads and registrations go through [`EngineControlMessage`]s
///
/// Publication blocks until the update consumer takes the order. If no one
/// drains the update stream, the loop stops for every asset.
pub struct MatchingEngine {
	thread_handle: Option<JoinHandle<()>>,
	control: Sender<EngineControlMessage>,
}

impl MatchingEngine {
	/// Start the matching engine
	pub fn start(
		config: EngineConfig,
		matcher: Matcher,
		orders: OrderReceiver,
		updates: UpdateProducer,
		completion: Arc<TradeCounter>,
	) -> Result<Self, EngineError> {
		let (control, control_receiver) = unbounded();

		let thread_handle = thread::Builder::new()
			.name("matching-loop".to_string())
			.spawn(move || {
				info!("Matching engine started");
				Self::run_matching_loop(
					matcher,
					&config,
					&orders,
					&updates,
					&completion,
					&control_receiver,
				);
				info!("Matching engine stopped");
			})?;

		Ok(Self {
			thread_handle: Some(thread_handle),
			control,
		})
	}

	/// Main matching loop - the heart of the engine
	///
	/// This loop:
	/// 1. Waits for the next order or control message (blocking)
	/// 2. Matches the order against its asset's book
	/// 3. Signals the completion counter and publishes both orders per fill
	///
	/// Orders already accepted into the queue take priority over control
	/// messages: the queue is drained before each one is handled, including
	/// `Shutdown`. Once every order sender is gone the loop keeps answering
	/// control messages until it is told to shut down.
	fn run_matching_loop(
		mut matcher: Matcher,
		config: &EngineConfig,
		orders: &OrderReceiver,
		updates: &UpdateProducer,
		completion: &TradeCounter,
		control: &Receiver<EngineControlMessage>,
	) {
		let mut accepting_orders = true;

		loop {
			let wakeup = if accepting_orders {
				select! {
					recv(orders.channel()) -> order => match order {
						Ok(order) => Wakeup::Order(order),
						Err(_) => Wakeup::OrdersClosed,
					},
					recv(control) -> message => Wakeup::Control(message),
				}
			} else {
				Wakeup::Control(control.recv())
			};

			match wakeup {
				Wakeup::Order(order) => {
					Self::process_order(&mut matcher, order, config, updates, completion);
				}
				Wakeup::OrdersClosed => {
					info!("Order queue disconnected, no more orders will be accepted");
					accepting_orders = false;
				}
				Wakeup::Control(Ok(message)) => {
					if accepting_orders {
						accepting_orders =
							Self::drain_orders(&mut matcher, config, orders, updates, completion);
					}
					if matches!(message, EngineControlMessage::Shutdown) {
						break;
					}
					Self::handle_control(&mut matcher, message);
				}
				Wakeup::Control(Err(_)) => {
					debug!("Control channel closed");
					break;
				}
			}
		}
	}

	/// Match every order already waiting in the queue
	///
	/// Returns `false` once the queue is disconnected and empty.
	fn drain_orders(
		matcher: &mut Matcher,
		config: &EngineConfig,
		orders: &OrderReceiver,
		updates: &UpdateProducer,
		completion: &TradeCounter,
	) -> bool {
		loop {
			match orders.try_recv() {
				Ok(order) => Self::process_order(matcher, order, config, updates, completion),
				Err(QueueError::Disconnected) => {
					info!("Order queue disconnected, no more orders will be accepted");
					return false;
				}
				Err(_) => return true,
			}
		}
	}

	/// Process a single order
	fn process_order(
		matcher: &mut Matcher,
		order: Order,
		config: &EngineConfig,
		updates: &UpdateProducer,
		completion: &TradeCounter,
	) {
		if config.verbose_logging {
			debug!(
				"Processing order: {} {:?} {} {} @ {}",
				order.order_id, order.side, order.shares, order.asset_id, order.price
			);
		}

		let result = match matcher.match_order(order) {
			Ok(result) => result,
			Err(e) => {
				error!("Failed to process order: {}", e);
				return;
			}
		};

		if config.verbose_logging {
			debug!(
				"Order {} left with {} pending after {} trade(s)",
				result.order.order_id,
				result.order.pending_shares,
				result.transactions.len()
			);
		}

		for Transaction {
			buy_order,
			sell_order,
			..
		} in result.transactions
		{
			completion.done();

			for order in [buy_order, sell_order] {
				let order_id = order.order_id.clone();
				if let Err(e) = updates.publish(order) {
					warn!("Update for order {} not delivered: {}", order_id, e);
				}
			}
		}
	}

	fn handle_control(matcher: &mut Matcher, message: EngineControlMessage) {
		// A dropped receiver only means the requester stopped waiting.
		match message {
			EngineControlMessage::RegisterInvestor {
				investor,
				respond_to,
			} => {
				debug!("Registering investor {}", investor.id);
				matcher.add_investor(investor);
				let _ = respond_to.send(());
			}
			EngineControlMessage::GetOrder {
				order_id,
				respond_to,
			} => {
				let _ = respond_to.send(matcher.order(&order_id).cloned());
			}
			EngineControlMessage::GetInvestor {
				investor_id,
				respond_to,
			} => {
				let _ = respond_to.send(matcher.investor(&investor_id).cloned());
			}
			EngineControlMessage::GetTransactions { respond_to } => {
				let _ = respond_to.send(matcher.transactions().to_vec());
			}
			EngineControlMessage::GetOrderBook {
				asset_id,
				respond_to,
			} => {
				let _ = respond_to.send(matcher.order_book(&asset_id).cloned());
			}
			EngineControlMessage::Shutdown => {}
		}
	}

	/// Send a request to the matching loop and block for the reply
	fn request<T>(
		&self,
		build: impl FnOnce(Sender<T>) -> EngineControlMessage,
	) -> Result<T, EngineError> {
		let (respond_to, reply) = bounded(1);
		self.control
			.send(build(respond_to))
			.map_err(|_| EngineError::Shutdown)?;
		reply.recv().map_err(|_| EngineError::Shutdown)
	}

	/// Register an investor with the running engine
	pub fn register_investor(&self, investor: Investor) -> Result<(), EngineError> {
		self.request(|respond_to| EngineControlMessage::RegisterInvestor {
			investor,
			respond_to,
		})
	}

	pub fn order(&self, order_id: &str) -> Result<Option<Order>, EngineError> {
		self.request(|respond_to| EngineControlMessage::GetOrder {
			order_id: order_id.to_string(),
			respond_to,
		})
	}

	pub fn investor(&self, investor_id: &str) -> Result<Option<Investor>, EngineError> {
		self.request(|respond_to| EngineControlMessage::GetInvestor {
			investor_id: investor_id.to_string(),
			respond_to,
		})
	}

	pub fn position(
		&self,
		investor_id: &str,
		asset_id: &str,
	) -> Result<Option<Position>, EngineError> {
		Ok(self
			.investor(investor_id)?
			.and_then(|investor| investor.position(asset_id).cloned()))
	}

	/// Executed transactions, oldest first
	pub fn transactions(&self) -> Result<Vec<Transaction>, EngineError> {
		self.request(|respond_to| EngineControlMessage::GetTransactions { respond_to })
	}

	pub fn order_book(&self, asset_id: &str) -> Result<Option<OrderBook>, EngineError> {
		self.request(|respond_to| EngineControlMessage::GetOrderBook {
			asset_id: asset_id.to_string(),
			respond_to,
		})
	}

	/// Shutdown the matching engine gracefully
	///
	/// Blocks until the loop exits, which requires any publication in
	/// flight to be taken by the update consumer.
	pub fn shutdown(mut self) {
		info!("Shutting down matching engine");
		self.stop();
	}

	fn stop(&mut self) {
		let _ = self.control.send(EngineControlMessage::Shutdown);

		if let Some(handle) = self.thread_handle.take()
			&& let Err(e) = handle.join()
		{
			warn!("Matching engine thread panicked: {:?}", e);
		}
	}
}

impl Drop for MatchingEngine {
	fn drop(&mut self) {
		self.stop();
	}
}
