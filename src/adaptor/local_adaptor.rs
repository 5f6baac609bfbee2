use std::{collections::BTreeMap, sync::Arc, time::Duration};

use tokio::{sync::{mpsc::Sender, oneshot, RwLock}, time::timeout};
use tracing::{instrument, warn};

use super::ChordAdaptor;
use crate::{
	chord::message::{Envelope, Request, Response},
	config::RingConfig,
	error::{ChordError, Result},
	NodeId,
};

/// An in-process implementation of ChordAdaptor: an arena of node inboxes
/// addressed by id. Cloning shares the arena.
#[derive(Debug, Clone)]
pub struct LocalAdaptor {
	members: Arc<RwLock<BTreeMap<NodeId, Sender<Envelope>>>>,
	request_timeout: Duration,
	retries: u32,
}

impl LocalAdaptor {
	pub fn new(config: &RingConfig) -> Self {
		LocalAdaptor {
			members: Arc::new(RwLock::new(BTreeMap::new())),
			request_timeout: config.request_timeout(),
			retries: config.request_retries,
		}
	}

	async fn inbox(&self, id: NodeId) -> Result<Sender<Envelope>> {
		self.members
			.read()
			.await
			.get(&id)
			.cloned()
			.ok_or(ChordError::Unreachable(id))
	}
}

impl ChordAdaptor for LocalAdaptor {

	async fn register(&self, id: NodeId, inbox: Sender<Envelope>) -> Result<()> {
		let mut members = self.members.write().await;
		if members.contains_key(&id) {
			return Err(ChordError::DuplicateId(id));
		}
		members.insert(id, inbox);
		Ok(())
	}

	async fn deregister(&self, id: NodeId) -> bool {
		self.members.write().await.remove(&id).is_some()
	}

	#[instrument(skip(self, request), fields(request = request.name()))]
	async fn send(&self, to: NodeId, request: Request) -> Result<Response> {
		let inbox = self.inbox(to).await?;
		let mut attempts = 0;
		loop {
			attempts += 1;
			let (reply_tx, reply_rx) = oneshot::channel();
			// the deadline covers waiting for room in a full inbox too
			let exchange = async {
				inbox.send((request.clone(), reply_tx)).await.map_err(|_| ChordError::Unreachable(to))?;
				// the node dropped the request without answering
				reply_rx.await.map_err(|_| ChordError::Unreachable(to))
			};

			match timeout(self.request_timeout, exchange).await {
				Ok(result) => return result,
				Err(_) if attempts <= self.retries => {
					warn!("request to node {} timed out, retrying ({}/{})", to, attempts, self.retries);
				},
				Err(_) => return Err(ChordError::Timeout { node: to, attempts }),
			}
		}
	}

	async fn members(&self) -> Vec<NodeId> {
		self.members.read().await.keys().copied().collect()
	}
}
