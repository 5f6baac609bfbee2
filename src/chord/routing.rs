use tracing::{debug, instrument, warn};

use crate::{adaptor::ChordAdaptor, error::Result, Key, NodeId};

use super::{Chord, Route, RouteOutcome};


impl<ADAPTOR: ChordAdaptor> Chord<ADAPTOR>{

	/// The node owning `key`.
	#[instrument(skip(self), fields(from = self.self_id))]
	pub async fn find_successor(&self, key: Key) -> Result<NodeId> {
		let predecessor = self.find_predecessor(key).await?;
		if predecessor == key {
			return Ok(predecessor);
		}
		self.successor_of(predecessor).await
	}

	/// The node `n` with `key` in `[n, n.successor]`, as a best effort: see
	/// [`Chord::route_to_predecessor`] for how the walk ended.
	pub async fn find_predecessor(&self, key: Key) -> Result<NodeId> {
		Ok(self.route_to_predecessor(key).await?.node)
	}

	/// Walks the finger tables from this node towards `key`, at most `M` hops.
	#[instrument(skip(self), fields(from = self.self_id))]
	pub async fn route_to_predecessor(&self, key: Key) -> Result<Route> {
		let key = self.ring.check(key)?;
		let mut current = self.self_id;
		let mut hops = 0;
		loop {
			let successor = self.successor_of(current).await?;
			if self.ring.in_range(key, current, self.ring.add(successor, 1)) {
				return Ok(Route { node: current, hops, outcome: RouteOutcome::Converged });
			}
			if hops == self.ring.modulus() {
				warn!("lookup of {} did not converge, settling on node {} after {} hops", key, current, hops);
				return Ok(Route { node: current, hops, outcome: RouteOutcome::Exhausted });
			}

			let next = self.closest_preceding_finger_of(current, key).await?;
			if next == current {
				debug!("node {} has no finger closer to {}", current, key);
				return Ok(Route { node: current, hops, outcome: RouteOutcome::Stalled });
			}
			debug!("hop {} -> {}", current, next);
			current = next;
			hops += 1;
		}
	}

	pub async fn closest_preceding_finger(&self, key: Key) -> Result<NodeId> {
		self.closest_preceding_finger_of(self.self_id, self.ring.check(key)?).await
	}
}
