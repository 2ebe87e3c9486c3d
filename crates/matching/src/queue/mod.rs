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

use crossbeam::channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};

use crate::types::Order;

/// Inbound queue passing orders from submitters to the matching loop
///
/// The queue is the boundary between any number of submitting threads and
/// the single matching worker. It fixes the arrival order of orders
/// entering the engine.
///
/// Properties:
/// - Multiple Producers (order submitters)
/// - Single Consumer (matching loop)
/// - Capacity 0 is a rendezvous channel: `submit` returns only once the
///   worker has taken the order, so submitters can never run ahead of
///   matching
/// - A positive capacity lets submitters buffer that many orders
///
/// The queue does NOT:
/// - Validate orders
/// - Provide scheduling or prioritization
/// - Implement retry logic
pub struct OrderQueue {
	sender: Sender<Order>,
	receiver: Receiver<Order>,
}

impl OrderQueue {
	/// Create a new order queue with the specified capacity
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	/// Split the queue into sender and receiver ends
	///
	/// The sender can be cloned for multiple submitters.
	/// The receiver must remain unique for the single matching loop.
	pub fn split(self) -> (OrderSender, OrderReceiver) {
		(
			OrderSender {
				sender: self.sender,
			},
			OrderReceiver {
				receiver: self.receiver,
			},
		)
	}
}

impl Default for OrderQueue {
	fn default() -> Self {
		Self::new(0)
	}
}

/// Sender end of the order queue (used by submitters)
#[derive(Clone)]
pub struct OrderSender {
	sender: Sender<Order>,
}

impl OrderSender {
	/// Hand an order to the matching loop, blocking until it is accepted
	pub fn submit(&self, order: Order) -> Result<(), QueueError> {
		self.sender
			.send(order)
			.map_err(|_| QueueError::Disconnected)
	}

	/// Try to hand over an order without blocking
	///
	/// Returns `QueueError::Full` if the worker is busy (or the buffer is
	/// full for a buffered queue).
	pub fn try_submit(&self, order: Order) -> Result<(), QueueError> {
		self.sender.try_send(order).map_err(|e| match e {
			TrySendError::Full(_) => QueueError::Full,
			TrySendError::Disconnected(_) => QueueError::Disconnected,
		})
	}
}

/// Receiver end of the order queue (used by matching loop)
///
/// This should NOT be cloned - only one matching loop should consume.
pub struct OrderReceiver {
	receiver: Receiver<Order>,
}

impl OrderReceiver {
	/// Receive the next order (blocking)
	pub fn recv(&self) -> Result<Order, QueueError> {
		self.receiver.recv().map_err(|_| QueueError::Disconnected)
	}

	/// Try to receive an order (non-blocking)
	pub fn try_recv(&self) -> Result<Order, QueueError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => QueueError::Empty,
			TryRecvError::Disconnected => QueueError::Disconnected,
		})
	}

	pub(crate) fn channel(&self) -> &Receiver<Order> {
		&self.receiver
	}
}

/// Errors that can occur when interacting with the order queue
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
	#[error("Queue is full")]
	Full,
	#[error("Queue is empty")]
	Empty,
	#[error("Queue disconnected")]
	Disconnected,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;
	use std::thread;
	use tradebook_sdk::types::{Asset, Investor, Side};

	fn create_test_order(order_id: &str) -> Order {
		Order::new(
			order_id,
			&Investor::new("1"),
			&Asset::new("asset1", "Asset 1", dec!(100)),
			1,
			dec!(5),
			Side::Buy,
		)
	}

	#[test]
	fn test_submit_and_recv() {
		let queue = OrderQueue::new(10);
		let (sender, receiver) = queue.split();

		sender.submit(create_test_order("order_1")).unwrap();

		let received = receiver.recv().unwrap();
		assert_eq!(received.order_id, "order_1");
	}

	#[test]
	fn test_rendezvous_blocks_until_taken() {
		let (sender, receiver) = OrderQueue::default().split();

		let result = sender.try_submit(create_test_order("order_1"));
		assert!(matches!(result, Err(QueueError::Full)));

		let handle = thread::spawn(move || sender.submit(create_test_order("order_2")));
		let received = receiver.recv().unwrap();
		assert_eq!(received.order_id, "order_2");
		handle.join().unwrap().unwrap();
	}

	#[test]
	fn test_queue_full() {
		let queue = OrderQueue::new(2);
		let (sender, _receiver) = queue.split();

		sender.try_submit(create_test_order("order_1")).unwrap();
		sender.try_submit(create_test_order("order_2")).unwrap();

		let result = sender.try_submit(create_test_order("order_3"));
		assert!(matches!(result, Err(QueueError::Full)));
	}

	#[test]
	fn test_disconnected_when_receiver_dropped() {
		let (sender, receiver) = OrderQueue::new(1).split();
		drop(receiver);

		let result = sender.submit(create_test_order("order_1"));
		assert!(matches!(result, Err(QueueError::Disconnected)));
	}
}
