use std::{path::Path, time::Duration};

use serde::{Serialize, Deserialize};
use tokio::fs;

use crate::{error::ConfigError, ring::Ring};

pub const MIN_BITS: u32 = 2;
pub const MAX_BITS: u32 = 48;

/// Settings shared by every node of one ring. Changing `bits` means
/// rebuilding the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
	/// Identifier width `m`; the ring holds `2^m` ids and each node `m` fingers.
	pub bits: u32,
	pub request_timeout_ms: u64,
	/// Extra attempts after a request times out.
	pub request_retries: u32,
	pub inbox_capacity: usize,
	/// Number of ids a leaving node sweeps for stale fingers, counted from
	/// `id - 2^(m-1)`. `None` sweeps up to `id + M`.
	pub leave_sweep: Option<u64>,
}

impl Default for RingConfig {
	fn default() -> Self {
		RingConfig {
			bits: 4,
			request_timeout_ms: 1000,
			request_retries: 2,
			inbox_capacity: 50,
			leave_sweep: None,
		}
	}
}

impl RingConfig {
	pub fn with_bits(bits: u32) -> Self {
		RingConfig { bits, ..Default::default() }
	}

	pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let text = fs::read_to_string(&path).await?;
		let config: RingConfig = serde_json::from_str(&text)?;
		config.validate()?;
		Ok(config)
	}

	pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
		let text = serde_json::to_string_pretty(self)?;
		fs::write(path, text).await?;
		Ok(())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(MIN_BITS..=MAX_BITS).contains(&self.bits) {
			return Err(ConfigError::InvalidBits { bits: self.bits, min: MIN_BITS, max: MAX_BITS });
		}
		if self.inbox_capacity == 0 {
			return Err(ConfigError::ZeroInboxCapacity);
		}
		if self.request_timeout_ms == 0 {
			return Err(ConfigError::ZeroRequestTimeout);
		}
		Ok(())
	}

	pub fn ring(&self) -> Result<Ring, ConfigError> {
		self.validate()?;
		Ok(Ring::new(self.bits))
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}
