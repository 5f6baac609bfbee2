use rand::Rng;

use crate::{error::ChordError, NodeId};

/// Modular arithmetic over the identifier space `[0, 2^bits)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
	bits: u32,
	modulus: u64,
}

impl Ring {
	/// Callers are expected to have validated `bits`, see [`crate::RingConfig::ring`].
	pub(crate) fn new(bits: u32) -> Self {
		Ring {
			bits,
			modulus: 1u64 << bits,
		}
	}

	/// The bit width `m`, which is also the number of fingers per node.
	pub fn bits(&self) -> u32 {
		self.bits
	}

	/// The number of identifiers `M = 2^m`.
	pub fn modulus(&self) -> u64 {
		self.modulus
	}

	pub fn wrap(&self, id: u64) -> u64 {
		id % self.modulus
	}

	pub fn add(&self, id: u64, offset: u64) -> u64 {
		(self.wrap(id) + self.wrap(offset)) % self.modulus
	}

	pub fn sub(&self, id: u64, offset: u64) -> u64 {
		(self.wrap(id) + self.modulus - self.wrap(offset)) % self.modulus
	}

	/// `2^exponent` reduced onto the ring.
	pub fn power(&self, exponent: u32) -> u64 {
		if exponent >= self.bits {
			0
		} else {
			1u64 << exponent
		}
	}

	/// Tests if `point` is in the half-open arc `[start, end)`.
	///
	/// The arc wraps past zero when `end < start`. An arc with `start == end`
	/// covers the whole ring, so a lone node still owns a well-defined
	/// interval.
	pub fn in_range(&self, point: u64, start: u64, end: u64) -> bool {
		let (point, start, end) = (self.wrap(point), self.wrap(start), self.wrap(end));
		if start == end {
			true
		} else if start < end {
			start <= point && point < end
		} else {
			point >= start || point < end
		}
	}

	pub fn contains(&self, id: u64) -> bool {
		id < self.modulus
	}

	pub fn check(&self, id: u64) -> Result<u64, ChordError> {
		if self.contains(id) {
			Ok(id)
		} else {
			Err(ChordError::IdOutOfRange { id, modulus: self.modulus })
		}
	}

	pub fn random_id(&self) -> NodeId {
		rand::thread_rng().gen_range(0..self.modulus)
	}
}
