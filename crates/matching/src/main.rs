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

//! Matching engine entry point
//!
//! This binary wires up the matching core for local use:
//! - Order Queue (stdin reader -> matching loop)
//! - Matching Loop (single-threaded core)
//! - Update Stream (matching loop -> stdout printer)
//!
//! Orders are read from stdin as one JSON `OrderCommand` per line, and every
//! order touched by a fill is written to stdout as one JSON line.

use std::{
	io::{self, BufRead, Write},
	sync::Arc,
	thread,
};

use anyhow::{Context, Result};
use tokio::{signal, sync::oneshot};
use tracing::{info, warn};

use tradebook_matching::{
	Matcher, MatchingEngine, Order, OrderCommand, OrderQueue, OrderSender, TradeCounter,
	UpdateConsumer, UpdateStream, config::MatchingConfig, logging,
};

#[tokio::main]
async fn main() -> Result<()> {
	logging::init_logging()?;

	let config = MatchingConfig::from_env().unwrap_or_else(|e| {
		info!(target: "server", "Using default configuration ({})", e);
		MatchingConfig::default()
	});

	info!(target: "server", "Starting Tradebook Matching Engine");
	info!(target: "server", "Order queue capacity: {}", config.order_queue_capacity);
	info!(target: "server", "Update stream capacity: {}", config.update_stream_capacity);

	let (order_sender, order_receiver) = OrderQueue::new(config.order_queue_capacity).split();
	let (update_producer, update_consumer) =
		UpdateStream::new(config.update_stream_capacity).split();

	let engine = MatchingEngine::start(
		config.engine_config(),
		Matcher::new(),
		order_receiver,
		update_producer,
		Arc::new(TradeCounter::new()),
	)
	.context("Failed to start matching engine")?;

	// The matching loop stalls unless someone drains the update stream.
	let printer = thread::Builder::new()
		.name("update-printer".to_string())
		.spawn(move || print_updates(update_consumer))
		.context("Failed to spawn update printer")?;

	let (input_done, input_closed) = oneshot::channel();
	thread::Builder::new()
		.name("order-reader".to_string())
		.spawn(move || {
			let _ = input_done.send(read_orders(order_sender));
		})
		.context("Failed to spawn order reader")?;

	tokio::select! {
		result = input_closed => {
			let submitted = result.context("Order reader exited without reporting")??;
			info!(target: "server", "Input closed after {} orders", submitted);
		}
		_ = signal::ctrl_c() => {
			info!(target: "server", "Shutting down...");
		}
	}

	tokio::task::spawn_blocking(move || engine.shutdown())
		.await
		.context("Matching engine shutdown failed")?;

	match printer.join() {
		Ok(result) => result?,
		Err(_) => warn!(target: "server", "Update printer panicked"),
	}

	info!(target: "server", "Shutdown complete");
	Ok(())
}

/// Submit every order read from stdin, returning how many were submitted
fn read_orders(sender: OrderSender) -> Result<usize> {
	let mut submitted = 0;

	for line in io::stdin().lock().lines() {
		let line = line.context("Failed to read stdin")?;
		if line.trim().is_empty() {
			continue;
		}

		let cmd: OrderCommand = match serde_json::from_str(&line) {
			Ok(cmd) => cmd,
			Err(e) => {
				warn!("Skipping malformed order line: {}", e);
				continue;
			}
		};

		sender
			.submit(Order::from(cmd))
			.context("Matching engine stopped accepting orders")?;
		submitted += 1;
	}

	Ok(submitted)
}

fn print_updates(updates: UpdateConsumer) -> Result<()> {
	let stdout = io::stdout();
	let mut out = stdout.lock();

	for order in updates.iter() {
		serde_json::to_writer(&mut out, &order).context("Failed to encode order update")?;
		writeln!(out)?;
		out.flush()?;
	}

	Ok(())
}
