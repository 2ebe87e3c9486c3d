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

use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};

use crate::types::Order;

/// Outbound stream of order updates from the matching loop
///
/// After every fill the matching loop publishes the buy and sell orders it
/// touched. Publication blocks until a consumer takes the update; nothing is
/// ever dropped to keep the loop moving. A consumer that stops draining
/// therefore halts matching for every asset, so one must always be attached.
///
/// Properties:
/// - Single Producer (matching loop)
/// - Single Consumer (whoever observes order state changes)
/// - Capacity 0 (default) is an unbuffered handoff
pub struct UpdateStream {
	sender: Sender<Order>,
	receiver: Receiver<Order>,
}

impl UpdateStream {
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	/// Split the stream into producer and consumer ends
	pub fn split(self) -> (UpdateProducer, UpdateConsumer) {
		(
			UpdateProducer {
				sender: self.sender,
			},
			UpdateConsumer {
				receiver: self.receiver,
			},
		)
	}
}

impl Default for UpdateStream {
	fn default() -> Self {
		Self::new(0)
	}
}

/// Producer end of the update stream (used by matching loop)
pub struct UpdateProducer {
	sender: Sender<Order>,
}

impl UpdateProducer {
	/// Publish an order update, blocking until the consumer accepts it
	///
	/// Fails only when the consumer end has been dropped.
	pub fn publish(&self, order: Order) -> Result<(), UpdateError> {
		self.sender
			.send(order)
			.map_err(|_| UpdateError::Disconnected)
	}
}

/// Consumer end of the update stream
pub struct UpdateConsumer {
	receiver: Receiver<Order>,
}

impl UpdateConsumer {
	/// Receive the next update (blocking)
	pub fn recv(&self) -> Result<Order, UpdateError> {
		self.receiver.recv().map_err(|_| UpdateError::Disconnected)
	}

	/// Try to receive an update (non-blocking)
	pub fn try_recv(&self) -> Result<Order, UpdateError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => UpdateError::Empty,
			TryRecvError::Disconnected => UpdateError::Disconnected,
		})
	}

	pub fn recv_timeout(&self, timeout: Duration) -> Result<Order, UpdateError> {
		self.receiver.recv_timeout(timeout).map_err(|e| match e {
			RecvTimeoutError::Timeout => UpdateError::Timeout,
			RecvTimeoutError::Disconnected => UpdateError::Disconnected,
		})
	}

	/// Drain up to `max_count` updates that are ready right now
	pub fn drain(&self, max_count: usize) -> Vec<Order> {
		let mut orders = Vec::with_capacity(max_count);
		for _ in 0..max_count {
			match self.try_recv() {
				Ok(order) => orders.push(order),
				Err(_) => break,
			}
		}
		orders
	}

	/// Blocking iterator that ends once the matching loop has stopped
	pub fn iter(&self) -> impl Iterator<Item = Order> + '_ {
		self.receiver.iter()
	}
}

/// Errors that can occur when interacting with the update stream
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
	#[error("Update stream is empty")]
	Empty,
	#[error("Timed out waiting for an update")]
	Timeout,
	#[error("Update stream disconnected")]
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
			Side::Sell,
		)
	}

	#[test]
	fn test_publish_waits_for_consumer() {
		let (producer, consumer) = UpdateStream::default().split();

		let handle = thread::spawn(move || {
			producer.publish(create_test_order("order_1")).unwrap();
			producer.publish(create_test_order("order_2")).unwrap();
		});

		let received: Vec<_> = consumer.iter().map(|o| o.order_id).collect();
		handle.join().unwrap();
		assert_eq!(received, vec!["order_1", "order_2"]);
	}

	#[test]
	fn test_drain() {
		let (producer, consumer) = UpdateStream::new(10).split();

		for i in 0..5 {
			producer.publish(create_test_order(&format!("order_{i}"))).unwrap();
		}

		assert_eq!(consumer.drain(10).len(), 5);
		assert!(consumer.drain(10).is_empty());
		assert!(matches!(consumer.try_recv(), Err(UpdateError::Empty)));
		assert!(matches!(
			consumer.recv_timeout(Duration::from_millis(10)),
			Err(UpdateError::Timeout)
		));
	}

	#[test]
	fn test_publish_fails_without_consumer() {
		let (producer, consumer) = UpdateStream::default().split();
		drop(consumer);

		let result = producer.publish(create_test_order("order_1"));
		assert!(matches!(result, Err(UpdateError::Disconnected)));
	}
}
