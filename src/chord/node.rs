use std::collections::BTreeMap;

use tokio::sync::mpsc::channel;
use tracing::{debug, info};

use crate::{
	adaptor::ChordAdaptor,
	config::RingConfig,
	error::Result,
	finger_table::FingerTable,
	ring::Ring,
	Key, NodeId, Value,
};

use super::{message::{Request, Response}, Chord, ChordHandle};

/// The state owned by one ring member. Only the node itself mutates it, by
/// applying requests in [`ChordNode::process`].
#[derive(Debug, Clone)]
pub struct ChordNode {
	id: NodeId,
	ring: Ring,
	predecessor: NodeId,
	fingers: FingerTable,
	store: BTreeMap<Key, Value>,

	config: RingConfig,
}

impl ChordNode {
	/// Creates an isolated node: its own predecessor, every finger pointing at itself.
	pub fn new(id: NodeId, config: &RingConfig) -> Result<Self> {
		let ring = config.ring()?;
		let id = ring.check(id)?;
		Ok(ChordNode {
			id,
			ring,
			predecessor: id,
			fingers: FingerTable::build(id, &ring),
			store: BTreeMap::new(),
			config: config.clone(),
		})
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	pub fn predecessor(&self) -> NodeId {
		self.predecessor
	}

	pub fn successor(&self) -> NodeId {
		self.fingers.successor()
	}

	pub fn fingers(&self) -> &FingerTable {
		&self.fingers
	}

	pub fn store(&self) -> &BTreeMap<Key, Value> {
		&self.store
	}

	/// Registers the node with `adaptor` and spawns the task that serves its
	/// requests. The node then lives in that task until it is deregistered.
	pub async fn start<ADAPTOR: ChordAdaptor>(mut self, adaptor: ADAPTOR) -> Result<ChordHandle<ADAPTOR>> {
		let (inbox_tx, mut inbox_rx) = channel(self.config.inbox_capacity);
		let chord = Chord::new(self.id, &self.config, adaptor)?;
		chord.adaptor().register(self.id, inbox_tx).await?;

		let id = self.id;
		let processor_handle = tokio::spawn(async move {
			info!("node {} processing requests", id);
			while let Some((request, reply)) = inbox_rx.recv().await {
				debug!("node {} processing {:?}", id, request);
				let response = self.process(request);
				// The caller may have timed out and dropped its receiver.
				let _ = reply.send(response);
			}
			info!("node {} processor terminating", id);
		});

		Ok(ChordHandle::new(chord, processor_handle))
	}

	/// Applies one request to this node's own state.
	pub fn process(&mut self, request: Request) -> Response {
		match request {
			// State Operations
			Request::GetSuccessor => Response::Node { id: self.successor() },
			Request::GetPredecessor => Response::Node { id: self.predecessor },
			Request::SetPredecessor { node } => {
				self.predecessor = node;
				Response::Ack
			},
			Request::GetFingers => Response::Fingers { fingers: self.fingers.fingers().to_vec() },
			Request::SetFinger { index, node } => {
				if self.fingers.set(index, node) {
					Response::Ack
				} else {
					self.bad_index(index)
				}
			},

			// Routing Operations
			Request::ClosestPrecedingFinger { key } => Response::Node { id: self.closest_preceding_finger(key) },
			Request::UpdateFinger { candidate, index } => self.update_finger(candidate, index),
			Request::ReplaceFinger { old, new } => Response::Replaced { count: self.fingers.replace(old, new) },

			// Storage Operations
			Request::Store { key, value } => {
				self.store.insert(key, value);
				Response::Ack
			},
			Request::Fetch { key } => Response::Value { value: self.store.get(&key).cloned() },
			Request::Keys => Response::Keys { keys: self.store.keys().copied().collect() },
			Request::Entries => Response::Entries { entries: self.store.clone() },
			Request::Absorb { mut entries } => {
				self.store.append(&mut entries);
				Response::Ack
			},
		}
	}

	/// The highest routing finger whose target lies in `[self, key)`, or self
	/// when no finger gets closer.
	fn closest_preceding_finger(&self, key: Key) -> NodeId {
		self.fingers
			.routing_slots()
			.find(|(_, finger)| self.ring.in_range(finger.node, self.id, key))
			.map_or(self.id, |(_, finger)| finger.node)
	}

	/// Points slot `index` at `candidate` if the candidate falls in
	/// `[self - 1, current target)`. A node at the origin whose slot also
	/// targets the origin always takes the candidate. A slot that already
	/// targets the candidate answers as if it had just taken it, so a
	/// repeated request forwards the same way.
	fn update_finger(&mut self, candidate: NodeId, index: usize) -> Response {
		let current = match self.fingers.get(index) {
			Some(finger) => finger.node,
			None => return self.bad_index(index),
		};

		let at_origin = self.id == 0 && current == 0;
		let accepts = at_origin || self.ring.in_range(candidate, self.ring.sub(self.id, 1), current);
		if current != candidate && !accepts {
			return Response::FingerUpdated { forward_to: None };
		}

		if current != candidate {
			self.fingers.set(index, candidate);
			debug!("node {} finger {} now targets {}", self.id, index, candidate);
		}
		let forward_to = (self.predecessor != candidate).then_some(self.predecessor);
		Response::FingerUpdated { forward_to }
	}

	fn bad_index(&self, index: usize) -> Response {
		Response::Error { msg: format!("finger index {} out of range 0..{}", index, self.fingers.len()) }
	}
}
