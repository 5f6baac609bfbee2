use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tokio::sync::oneshot;

use crate::{finger_table::Finger, Key, NodeId, Value};

/// A request together with the channel its response goes back on.
pub type Envelope = (Request, oneshot::Sender<Response>);

/// Everything one node can be asked to do. A node only ever applies these
/// to its own state; multi-hop work is driven by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
	// State Operations
	GetSuccessor,
	GetPredecessor,
	SetPredecessor{node: NodeId},
	GetFingers,
	SetFinger{index: usize, node: NodeId},

	// Routing Operations
	ClosestPrecedingFinger{key: Key},
	UpdateFinger{candidate: NodeId, index: usize},
	ReplaceFinger{old: NodeId, new: NodeId},

	// Storage Operations
	Store{key: Key, value: Value},
	Fetch{key: Key},
	Keys,
	Entries,
	Absorb{entries: BTreeMap<Key, Value>},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
	Node{id: NodeId},
	Fingers{fingers: Vec<Finger>},
	/// Answer to `UpdateFinger`: where the update should travel next, if anywhere.
	FingerUpdated{forward_to: Option<NodeId>},
	Replaced{count: usize},
	Value{value: Option<Value>},
	Keys{keys: Vec<Key>},
	Entries{entries: BTreeMap<Key, Value>},
	Ack,
	Error{msg: String},
}

impl Request {
	pub fn name(&self) -> &'static str {
		match self {
			Request::GetSuccessor => "GetSuccessor",
			Request::GetPredecessor => "GetPredecessor",
			Request::SetPredecessor { .. } => "SetPredecessor",
			Request::GetFingers => "GetFingers",
			Request::SetFinger { .. } => "SetFinger",
			Request::ClosestPrecedingFinger { .. } => "ClosestPrecedingFinger",
			Request::UpdateFinger { .. } => "UpdateFinger",
			Request::ReplaceFinger { .. } => "ReplaceFinger",
			Request::Store { .. } => "Store",
			Request::Fetch { .. } => "Fetch",
			Request::Keys => "Keys",
			Request::Entries => "Entries",
			Request::Absorb { .. } => "Absorb",
		}
	}
}
