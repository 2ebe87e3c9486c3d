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
	sync::{Condvar, Mutex, MutexGuard},
	time::{Duration, Instant},
};

/// Counts trades a caller is still waiting for
///
/// A caller registers how many trades it expects with [`expect`] before
/// submitting the orders that should produce them, then blocks in [`wait`]
/// until the matching loop has called [`done`] that many times. The loop
/// calls `done` exactly once per executed transaction, in execution order.
///
/// `done` saturates at zero: a trade nobody was waiting for does not count
/// towards a later expectation.
///
/// [`expect`]: TradeCounter::expect
/// [`wait`]: TradeCounter::wait
/// [`done`]: TradeCounter::done
#[derive(Debug, Default)]
pub struct TradeCounter {
	pending: Mutex<u64>,
	zero: Condvar,
}

impl TradeCounter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `n` more expected trades
	pub fn expect(&self, n: u64) {
		*self.lock() += n;
	}

	/// Signal one executed trade
	pub fn done(&self) {
		let mut pending = self.lock();
		*pending = pending.saturating_sub(1);
		if *pending == 0 {
			self.zero.notify_all();
		}
	}

	/// Number of expected trades not yet signalled
	pub fn pending(&self) -> u64 {
		*self.lock()
	}

	/// Block until every expected trade has been signalled
	pub fn wait(&self) {
		let mut pending = self.lock();
		while *pending > 0 {
			pending = self
				.zero
				.wait(pending)
				.unwrap_or_else(|poisoned| poisoned.into_inner());
		}
	}

	/// Like [`wait`](TradeCounter::wait) but gives up after `timeout`
	///
	/// Returns `true` if the count reached zero in time.
	pub fn wait_timeout(&self, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let mut pending = self.lock();
		while *pending > 0 {
			let now = Instant::now();
			if now >= deadline {
				return false;
			}
			pending = match self.zero.wait_timeout(pending, deadline - now) {
				Ok((guard, _)) => guard,
				Err(poisoned) => poisoned.into_inner().0,
			};
		}
		true
	}

	// The count is a plain integer, so a panic elsewhere cannot leave it
	// half-updated.
	fn lock(&self) -> MutexGuard<'_, u64> {
		self.pending
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{sync::Arc, thread};

	#[test]
	fn test_wait_returns_immediately_when_nothing_expected() {
		let counter = TradeCounter::new();
		counter.wait();
		assert!(counter.wait_timeout(Duration::from_millis(1)));
	}

	#[test]
	fn test_wait_for_signals_from_another_thread() {
		let counter = Arc::new(TradeCounter::new());
		counter.expect(2);

		let signaller = counter.clone();
		let handle = thread::spawn(move || {
			signaller.done();
			signaller.done();
		});

		assert!(counter.wait_timeout(Duration::from_secs(5)));
		assert_eq!(counter.pending(), 0);
		handle.join().unwrap();
	}

	#[test]
	fn test_wait_timeout_expires() {
		let counter = TradeCounter::new();
		counter.expect(1);
		assert!(!counter.wait_timeout(Duration::from_millis(20)));
		assert_eq!(counter.pending(), 1);
	}

	#[test]
	fn test_done_saturates_at_zero() {
		let counter = TradeCounter::new();
		counter.done();
		counter.expect(1);
		assert_eq!(counter.pending(), 1);
	}
}
