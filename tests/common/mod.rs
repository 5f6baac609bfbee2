#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use chord_ring::{ChordHandle, ChordNode, LocalAdaptor, NodeId, RingConfig};

pub type Nodes = BTreeMap<NodeId, ChordHandle<LocalAdaptor>>;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub async fn start_node(id: NodeId, config: &RingConfig, adaptor: &LocalAdaptor) -> ChordHandle<LocalAdaptor> {
	ChordNode::new(id, config)
		.expect("node id should fit the ring")
		.start(adaptor.clone())
		.await
		.expect("node should start")
}

/// Starts the nodes in order; every node after the first joins through the first.
pub async fn make_ring(ids: &[NodeId], config: &RingConfig) -> (LocalAdaptor, Nodes) {
	init_tracing();
	let adaptor = LocalAdaptor::new(config);
	let mut nodes = BTreeMap::new();
	for (i, &id) in ids.iter().enumerate() {
		let handle = start_node(id, config, &adaptor).await;
		if i != 0 {
			handle.join(ids[0]).await.expect("join should succeed");
		}
		nodes.insert(id, handle);
	}
	(adaptor, nodes)
}

/// The first live id at or after `key`, wrapping around.
pub fn expected_owner(ids: &BTreeSet<NodeId>, key: u64) -> NodeId {
	*ids.range(key..).next().or_else(|| ids.iter().next()).expect("ring should not be empty")
}

pub async fn targets(handle: &ChordHandle<LocalAdaptor>) -> Vec<NodeId> {
	handle
		.fingers()
		.await
		.expect("fingers should be readable")
		.iter()
		.map(|f| f.node)
		.collect()
}

pub fn value(text: &str) -> Vec<u8> {
	text.as_bytes().to_vec()
}
