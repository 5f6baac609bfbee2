use crate::{
	adaptor::ChordAdaptor,
	config::RingConfig,
	error::{ChordError, Result},
	finger_table::Finger,
	ring::Ring,
	Key, NodeId, Value,
};

use std::{collections::BTreeMap, ops::Deref};

use tokio::task::JoinHandle;
use tracing::{info, warn};


pub mod message;
pub mod node;

mod membership;
mod routing;
mod storage;

use self::message::{Request, Response};

/// How a walk towards a key's predecessor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
	/// The key lies between the returned node and its successor.
	Converged,
	/// No finger of the returned node gets closer to the key.
	Stalled,
	/// The hop bound ran out; the returned node may be stale.
	Exhausted,
}

/// The node a predecessor lookup settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
	pub node: NodeId,
	pub hops: u64,
	pub outcome: RouteOutcome,
}

/// The protocol operations of one ring member. A Chord holds no node state of
/// its own: every step is a request to exactly one node through the adaptor,
/// so the same type also serves as a view of any other member (see [`Chord::at`]).
#[derive(Debug, Clone)]
pub struct Chord<ADAPTOR: ChordAdaptor>{
	self_id: NodeId,
	ring: Ring,
	leave_sweep: Option<u64>,
	adaptor: ADAPTOR,
}

impl<ADAPTOR: ChordAdaptor> Chord<ADAPTOR>{

	pub fn new(self_id: NodeId, config: &RingConfig, adaptor: ADAPTOR) -> Result<Self> {
		let ring = config.ring()?;
		Ok(Chord {
			self_id: ring.check(self_id)?,
			ring,
			leave_sweep: config.leave_sweep,
			adaptor,
		})
	}

	pub fn id(&self) -> NodeId {
		self.self_id
	}

	pub fn ring(&self) -> &Ring {
		&self.ring
	}

	pub fn adaptor(&self) -> &ADAPTOR {
		&self.adaptor
	}

	/// The same operations, started from node `id`.
	pub fn at(&self, id: NodeId) -> Self {
		Chord {
			self_id: id,
			ring: self.ring,
			leave_sweep: self.leave_sweep,
			adaptor: self.adaptor.clone(),
		}
	}

	pub async fn successor(&self) -> Result<NodeId> {
		self.successor_of(self.self_id).await
	}

	pub async fn predecessor(&self) -> Result<NodeId> {
		self.predecessor_of(self.self_id).await
	}

	pub async fn fingers(&self) -> Result<Vec<Finger>> {
		self.fingers_of(self.self_id).await
	}

	/// The value held in this node's own store, without any routing.
	pub async fn local_value(&self, key: Key) -> Result<Option<Value>> {
		self.fetch_from(self.self_id, key).await
	}

	pub async fn local_keys(&self) -> Result<Vec<Key>> {
		match self.request(self.self_id, Request::Keys).await? {
			Response::Keys { keys } => Ok(keys),
			other => Err(self.unexpected(self.self_id, "Keys", other)),
		}
	}


	async fn request(&self, to: NodeId, request: Request) -> Result<Response> {
		self.adaptor.send(to, request).await
	}

	fn unexpected(&self, node: NodeId, request: &'static str, response: Response) -> ChordError {
		ChordError::UnexpectedResponse { node, request, response: format!("{:?}", response) }
	}

	async fn node_reply(&self, to: NodeId, request: Request) -> Result<NodeId> {
		let name = request.name();
		match self.request(to, request).await? {
			Response::Node { id } => Ok(id),
			other => Err(self.unexpected(to, name, other)),
		}
	}

	async fn ack_reply(&self, to: NodeId, request: Request) -> Result<()> {
		let name = request.name();
		match self.request(to, request).await? {
			Response::Ack => Ok(()),
			other => Err(self.unexpected(to, name, other)),
		}
	}

	pub(crate) async fn successor_of(&self, node: NodeId) -> Result<NodeId> {
		self.node_reply(node, Request::GetSuccessor).await
	}

	pub(crate) async fn predecessor_of(&self, node: NodeId) -> Result<NodeId> {
		self.node_reply(node, Request::GetPredecessor).await
	}

	pub(crate) async fn closest_preceding_finger_of(&self, node: NodeId, key: Key) -> Result<NodeId> {
		self.node_reply(node, Request::ClosestPrecedingFinger { key }).await
	}

	pub(crate) async fn set_predecessor_of(&self, node: NodeId, predecessor: NodeId) -> Result<()> {
		self.ack_reply(node, Request::SetPredecessor { node: predecessor }).await
	}

	pub(crate) async fn set_finger_of(&self, node: NodeId, index: usize, target: NodeId) -> Result<()> {
		self.ack_reply(node, Request::SetFinger { index, node: target }).await
	}

	pub(crate) async fn fingers_of(&self, node: NodeId) -> Result<Vec<Finger>> {
		match self.request(node, Request::GetFingers).await? {
			Response::Fingers { fingers } => Ok(fingers),
			other => Err(self.unexpected(node, "GetFingers", other)),
		}
	}

	pub(crate) async fn store_at(&self, node: NodeId, key: Key, value: Value) -> Result<()> {
		self.ack_reply(node, Request::Store { key, value }).await
	}

	pub(crate) async fn fetch_from(&self, node: NodeId, key: Key) -> Result<Option<Value>> {
		match self.request(node, Request::Fetch { key }).await? {
			Response::Value { value } => Ok(value),
			other => Err(self.unexpected(node, "Fetch", other)),
		}
	}

	pub(crate) async fn entries_of(&self, node: NodeId) -> Result<BTreeMap<Key, Value>> {
		match self.request(node, Request::Entries).await? {
			Response::Entries { entries } => Ok(entries),
			other => Err(self.unexpected(node, "Entries", other)),
		}
	}

	pub(crate) async fn absorb_into(&self, node: NodeId, entries: BTreeMap<Key, Value>) -> Result<()> {
		self.ack_reply(node, Request::Absorb { entries }).await
	}
}



/// A ChordHandle represents a started node: its protocol operations plus the
/// task serving its requests.
pub struct ChordHandle<ADAPTOR: ChordAdaptor>{
	chord: Chord<ADAPTOR>,
	processor_handle: JoinHandle<()>,
}

impl<ADAPTOR: ChordAdaptor> ChordHandle<ADAPTOR> {
	pub(crate) fn new(chord: Chord<ADAPTOR>, processor_handle: JoinHandle<()>) -> Self {
		ChordHandle { chord, processor_handle }
	}

	pub fn chord(&self) -> &Chord<ADAPTOR> {
		&self.chord
	}

	/// Leave the ring cooperatively, handing keys to the successor, then stop
	/// serving requests.
	pub async fn leave(self) -> Result<()> {
		self.chord.leave().await?;
		self.shutdown().await;
		Ok(())
	}

	/// Force the node to stop without repairing the ring.
	pub async fn stop(self) {
		self.processor_handle.abort();
		self.shutdown().await;
	}

	async fn shutdown(self) {
		let id = self.chord.id();
		self.chord.adaptor().deregister(id).await;
		match self.processor_handle.await {
			Ok(()) => info!("node {} stopped", id),
			Err(e) if e.is_cancelled() => info!("node {} aborted", id),
			Err(e) => warn!("node {} processor failed: {}", id, e),
		}
	}
}

impl<ADAPTOR: ChordAdaptor> Deref for ChordHandle<ADAPTOR> {
	type Target = Chord<ADAPTOR>;

	fn deref(&self) -> &Self::Target {
		&self.chord
	}
}
