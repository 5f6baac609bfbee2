use std::future::Future;

use tokio::sync::mpsc::Sender;

use crate::{chord::message::{Envelope, Request, Response}, error::Result, NodeId};


pub mod local_adaptor;


/// Carries requests between ring members. Node references are plain ids;
/// the adaptor resolves them to whatever reaches the node.
pub trait ChordAdaptor: Clone + Send + Sync + 'static {

	/// Make `inbox` reachable as node `id`.
	fn register(&self, id: NodeId, inbox: Sender<Envelope>) -> impl Future<Output = Result<()>> + Send;

	/// Stop routing to node `id`. Returns false if it was not registered.
	fn deregister(&self, id: NodeId) -> impl Future<Output = bool> + Send;

	/// Deliver `request` to node `to` and wait for its response.
	fn send(&self, to: NodeId, request: Request) -> impl Future<Output = Result<Response>> + Send;

	/// Ids of every registered node, in ring order.
	fn members(&self) -> impl Future<Output = Vec<NodeId>> + Send;
}
