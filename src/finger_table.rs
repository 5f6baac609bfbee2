use serde::{Serialize, Deserialize};

use crate::{ring::Ring, NodeId};

/// A routing shortcut covering the arc `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finger {
	pub start: u64,
	pub end: u64,
	/// The node believed to be responsible for `start`.
	pub node: NodeId,
}

/// The `m` fingers of one node. Slot `i` covers `[id + 2^i, id + 2^(i+1))`.
///
/// Slot 1 holds the immediate successor. Slot 0 only provides the start
/// (`id + 1`) used to look the successor up when joining; its target stays
/// the owning node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTable {
	id: NodeId,
	fingers: Vec<Finger>,
}

pub const SUCCESSOR: usize = 1;

impl FingerTable {
	/// Builds the table for `id` with every finger pointing back at `id`.
	pub fn build(id: NodeId, ring: &Ring) -> Self {
		let fingers = (0..ring.bits())
			.map(|i| Finger {
				start: ring.add(id, ring.power(i)),
				end: ring.add(id, ring.power(i + 1)),
				node: id,
			})
			.collect();
		FingerTable { id, fingers }
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn len(&self) -> usize {
		self.fingers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fingers.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&Finger> {
		self.fingers.get(index)
	}

	pub fn successor(&self) -> NodeId {
		self.fingers.get(SUCCESSOR).map_or(self.id, |f| f.node)
	}

	/// Returns false if `index` is out of range.
	pub fn set(&mut self, index: usize, node: NodeId) -> bool {
		match self.fingers.get_mut(index) {
			Some(finger) => {
				finger.node = node;
				true
			},
			None => false,
		}
	}

	/// Routing slots, highest first. Slot 0 is never used for routing.
	pub fn routing_slots(&self) -> impl Iterator<Item = (usize, &Finger)> {
		self.fingers.iter().enumerate().skip(SUCCESSOR).rev()
	}

	/// Retargets every routing slot pointing at `old`. Returns how many changed.
	pub fn replace(&mut self, old: NodeId, new: NodeId) -> usize {
		let mut replaced = 0;
		for finger in self.fingers.iter_mut().skip(SUCCESSOR) {
			if finger.node == old {
				finger.node = new;
				replaced += 1;
			}
		}
		replaced
	}

	pub fn targets(&self) -> Vec<NodeId> {
		self.fingers.iter().map(|f| f.node).collect()
	}

	pub fn fingers(&self) -> &[Finger] {
		&self.fingers
	}
}
