// Copyright 2025 chenjjiaa
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

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;

// Logging configuration constants
/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory component name
pub const LOG_COMPONENT_NAME: &str = "matching";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Matching engine configuration
///
/// A capacity of 0 makes the corresponding channel a synchronous handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
	/// Inbound order queue capacity (MATCHING_ORDER_QUEUE_CAPACITY)
	pub order_queue_capacity: usize,
	/// Outbound update stream capacity (MATCHING_UPDATE_STREAM_CAPACITY)
	pub update_stream_capacity: usize,
	/// Log every order processed by the matching loop (MATCHING_VERBOSE_LOGGING)
	pub verbose_logging: bool,
}

impl Default for MatchingConfig {
	fn default() -> Self {
		Self {
			order_queue_capacity: 0,
			update_stream_capacity: 0,
			verbose_logging: false,
		}
	}
}

impl MatchingConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("MATCHING"))
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(config::Environment::with_prefix("MATCHING"))
			.build()?;

		cfg.try_deserialize()
	}

	pub fn engine_config(&self) -> EngineConfig {
		EngineConfig {
			verbose_logging: self.verbose_logging,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_defaults_are_synchronous_handoffs() {
		let config = MatchingConfig::default();
		assert_eq!(config.order_queue_capacity, 0);
		assert_eq!(config.update_stream_capacity, 0);
		assert!(!config.engine_config().verbose_logging);
	}

	#[test]
	fn test_from_file_fills_missing_fields_with_defaults() {
		let path = std::env::temp_dir().join(format!("matching-config-{}.toml", std::process::id()));
		let mut file = std::fs::File::create(&path).unwrap();
		writeln!(file, "update_stream_capacity = 16").unwrap();
		writeln!(file, "verbose_logging = true").unwrap();
		drop(file);

		let config = MatchingConfig::from_file(path.to_str().unwrap()).unwrap();
		std::fs::remove_file(&path).ok();

		assert_eq!(config.order_queue_capacity, 0);
		assert_eq!(config.update_stream_capacity, 16);
		assert!(config.verbose_logging);
	}
}
