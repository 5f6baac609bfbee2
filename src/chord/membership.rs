use tracing::{debug, info, instrument, warn};

use crate::{
	adaptor::ChordAdaptor,
	error::Result,
	finger_table::{FingerTable, SUCCESSOR},
	NodeId,
};

use super::{message::{Request, Response}, Chord};


impl<ADAPTOR: ChordAdaptor> Chord<ADAPTOR>{

	/// Joins the ring that `bootstrap` belongs to.
	#[instrument(skip(self), fields(node = self.self_id))]
	pub async fn join(&self, bootstrap: NodeId) -> Result<()> {
		info!("node {} joining through {}", self.self_id, bootstrap);
		self.init_finger_table(bootstrap).await?;
		self.update_others(bootstrap).await?;
		info!("node {} joined", self.self_id);
		Ok(())
	}

	/// Fills this node's fingers using lookups started at `bootstrap`, and
	/// links it between its successor and that successor's old predecessor.
	async fn init_finger_table(&self, bootstrap: NodeId) -> Result<()> {
		let remote = self.at(bootstrap);
		let mut table = FingerTable::build(self.self_id, &self.ring);

		let seed = table.get(0).map_or(self.ring.add(self.self_id, 1), |f| f.start);
		let successor = remote.find_successor(seed).await?;
		table.set(SUCCESSOR, successor);
		self.set_finger_of(self.self_id, SUCCESSOR, successor).await?;

		let predecessor = self.predecessor_of(successor).await?;
		self.set_predecessor_of(self.self_id, predecessor).await?;
		self.set_predecessor_of(successor, self.self_id).await?;
		debug!("node {} sits between {} and {}", self.self_id, predecessor, successor);

		let just_before = self.ring.sub(self.self_id, 1);
		for i in SUCCESSOR..table.len().saturating_sub(1) {
			let (previous, start) = match (table.get(i), table.get(i + 1)) {
				(Some(previous), Some(next)) => (previous.node, next.start),
				_ => break,
			};
			// consecutive fingers often share an owner
			let target = if self.ring.in_range(start, just_before, previous) {
				previous
			} else {
				remote.find_successor(start).await?
			};
			table.set(i + 1, target);
			self.set_finger_of(self.self_id, i + 1, target).await?;
		}
		Ok(())
	}

	/// Tells every node whose finger `i` may now belong to this node.
	async fn update_others(&self, bootstrap: NodeId) -> Result<()> {
		let remote = self.at(bootstrap);
		for i in 1..self.ring.bits() {
			let point = self.ring.sub(self.self_id, self.ring.power(i - 1));
			let first = remote.find_predecessor(point).await?;
			self.propagate_finger(first, self.self_id, i as usize).await?;
		}
		Ok(())
	}

	/// Offers `candidate` for finger `index` of this node, walking on to
	/// predecessors while they accept it.
	pub async fn update_fingers(&self, candidate: NodeId, index: usize) -> Result<()> {
		self.propagate_finger(self.self_id, candidate, index).await
	}

	async fn propagate_finger(&self, first: NodeId, candidate: NodeId, index: usize) -> Result<()> {
		let mut next = Some(first);
		let mut steps = 0;
		while let Some(node) = next {
			if steps == self.ring.modulus() {
				warn!("finger {} update for {} still travelling after {} nodes", index, candidate, steps);
				break;
			}
			next = match self.request(node, Request::UpdateFinger { candidate, index }).await? {
				Response::FingerUpdated { forward_to } => forward_to,
				other => return Err(self.unexpected(node, "UpdateFinger", other)),
			};
			steps += 1;
		}
		Ok(())
	}

	/// Leaves the ring: repairs fingers that point here, relinks the
	/// successor and hands it this node's keys.
	///
	/// The repair sweeps ids from `self - 2^(m-1)` and retargets fingers on
	/// the owner of each id. That reaches the nodes whose fingers can point
	/// here on a consistent ring, but it is not a guarantee.
	#[instrument(skip(self), fields(node = self.self_id))]
	pub async fn leave(&self) -> Result<()> {
		let successor = self.successor().await?;
		let predecessor = self.predecessor().await?;

		let first = self.ring.sub(self.self_id, self.ring.power(self.ring.bits() - 1));
		let span = self
			.leave_sweep
			.unwrap_or(self.ring.modulus() + self.self_id - first);

		let mut repaired = 0;
		for offset in 0..span {
			let point = self.ring.add(first, offset);
			let holder = self.successor_of(self.find_predecessor(point).await?).await?;
			let request = Request::ReplaceFinger { old: self.self_id, new: successor };
			match self.request(holder, request).await? {
				Response::Replaced { count } => repaired += count,
				other => return Err(self.unexpected(holder, "ReplaceFinger", other)),
			}
		}
		debug!("node {} retargeted {} fingers to {}", self.self_id, repaired, successor);

		if successor == self.self_id {
			let entries = self.entries_of(self.self_id).await?;
			if !entries.is_empty() {
				warn!("last node {} leaving, dropping {} keys", self.self_id, entries.len());
			}
			return Ok(());
		}

		self.set_predecessor_of(successor, predecessor).await?;
		let entries = self.entries_of(self.self_id).await?;
		let moved = entries.len();
		self.absorb_into(successor, entries).await?;
		info!("node {} left, {} keys moved to {}", self.self_id, moved, successor);
		Ok(())
	}
}
