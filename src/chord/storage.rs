use tracing::{debug, instrument};

use crate::{adaptor::ChordAdaptor, error::Result, Key, Value};

use super::Chord;


impl<ADAPTOR: ChordAdaptor> Chord<ADAPTOR>{

	/// Stores `value` on the predecessor of `key` and on that node's successor.
	///
	/// The replica pair is anchored at `find_predecessor`, one node earlier
	/// than the owner `find_successor` reports. Reads still find the value
	/// because [`Chord::get`] walks forward from the owner.
	#[instrument(skip(self, value), fields(from = self.self_id))]
	pub async fn put(&self, key: Key, value: Value) -> Result<()> {
		let key = self.ring.check(key)?;
		let primary = self.find_predecessor(key).await?;
		self.store_at(primary, key, value.clone()).await?;
		let backup = self.successor_of(primary).await?;
		self.store_at(backup, key, value).await?;
		debug!("stored {} on {} and {}", key, primary, backup);
		Ok(())
	}

	/// Looks `key` up on its owner, then on up to `M` successors after it.
	#[instrument(skip(self), fields(from = self.self_id))]
	pub async fn get(&self, key: Key) -> Result<Option<Value>> {
		let owner = self.find_successor(key).await?;
		let mut node = owner;
		let mut value = self.fetch_from(node, key).await?;
		let mut remaining = self.ring.modulus();
		while value.is_none() && remaining > 0 {
			node = self.successor_of(node).await?;
			if node == owner {
				break;
			}
			value = self.fetch_from(node, key).await?;
			remaining -= 1;
		}
		if value.is_none() {
			debug!("no replica of {} found from {}", key, owner);
		}
		Ok(value)
	}
}
