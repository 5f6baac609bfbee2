mod common;

use std::collections::BTreeSet;

use rand::seq::SliceRandom;

use chord_ring::{ChordAdaptor, ChordError, ChordNode, LocalAdaptor, RingConfig, RouteOutcome};

use common::{expected_owner, make_ring, start_node, targets, value};


#[tokio::test]
async fn four_node_join_sequence() {
	common::init_tracing();
	let config = RingConfig::with_bits(4);
	let adaptor = LocalAdaptor::new(&config);

	let n0 = start_node(0, &config, &adaptor).await;

	let n6 = start_node(6, &config, &adaptor).await;
	n6.join(0).await.unwrap();
	assert_eq!(n0.find_successor(3).await.unwrap(), 6);
	assert_eq!(n0.find_successor(6).await.unwrap(), 6);
	assert_eq!(n6.find_successor(3).await.unwrap(), 6);
	assert_eq!(n6.find_successor(6).await.unwrap(), 6);
	assert_eq!(n6.find_successor(8).await.unwrap(), 0);
	assert_eq!(n0.find_successor(8).await.unwrap(), 0);
	assert_eq!(n0.find_successor(5).await.unwrap(), 6);
	assert_eq!(n6.find_successor(5).await.unwrap(), 6);
	assert_eq!(n0.find_successor(0).await.unwrap(), 0);
	assert_eq!(n0.find_successor(15).await.unwrap(), 0);

	let n8 = start_node(8, &config, &adaptor).await;
	n8.join(0).await.unwrap();
	assert_eq!(n0.find_successor(7).await.unwrap(), 8);
	assert_eq!(n0.find_successor(9).await.unwrap(), 0);

	let n3 = start_node(3, &config, &adaptor).await;
	n3.join(0).await.unwrap();
	assert_eq!(n0.find_successor(3).await.unwrap(), 6);
	assert_eq!(n0.find_successor(8).await.unwrap(), 0);
	assert_eq!(n0.find_successor(2).await.unwrap(), 3);
	assert_eq!(n0.find_successor(4).await.unwrap(), 6);

	n0.put(2, value("obj1")).await.unwrap();
	assert_eq!(n3.local_value(2).await.unwrap(), Some(value("obj1")));

	n3.put(9, value("obj2")).await.unwrap();
	assert_eq!(n0.local_value(9).await.unwrap(), Some(value("obj2")));

	n3.put(3, value("obj3")).await.unwrap();
	assert_eq!(n3.local_value(3).await.unwrap(), Some(value("obj3")));

	let n2 = start_node(2, &config, &adaptor).await;
	n2.join(0).await.unwrap();
	let n4 = start_node(4, &config, &adaptor).await;
	n4.join(0).await.unwrap();
	n4.leave().await.unwrap();

	assert_eq!(n0.fingers().await.unwrap().last().map(|f| f.node), Some(6));
	assert_eq!(n2.fingers().await.unwrap()[2].node, 6);
}

#[tokio::test]
async fn finger_tables_after_joins() {
	let (_adaptor, nodes) = make_ring(&[0, 6, 8, 3], &RingConfig::with_bits(4)).await;

	let expected = [
		(0, vec![0, 3, 3, 6], 8),
		(3, vec![3, 6, 8, 0], 0),
		(6, vec![6, 8, 0, 0], 3),
		(8, vec![8, 0, 0, 0], 6),
	];
	for (id, fingers, predecessor) in expected {
		let node = &nodes[&id];
		assert_eq!(targets(node).await, fingers, "fingers of {id}");
		assert_eq!(node.predecessor().await.unwrap(), predecessor, "predecessor of {id}");
		assert_eq!(node.successor().await.unwrap(), fingers[1], "successor of {id}");
	}
}

#[tokio::test]
async fn closest_preceding_finger_from_each_node() {
	let (_adaptor, nodes) = make_ring(&[0, 6, 8, 3], &RingConfig::with_bits(4)).await;

	assert_eq!(nodes[&0].closest_preceding_finger(7).await.unwrap(), 6);
	assert_eq!(nodes[&0].closest_preceding_finger(5).await.unwrap(), 3);
	assert_eq!(nodes[&0].closest_preceding_finger(2).await.unwrap(), 0);
	// [8, 5) wraps past the origin
	assert_eq!(nodes[&8].closest_preceding_finger(5).await.unwrap(), 0);
	assert!(matches!(
		nodes[&0].closest_preceding_finger(16).await,
		Err(ChordError::IdOutOfRange { id: 16, modulus: 16 }),
	));
}

#[tokio::test]
async fn finger_updates_travel_to_predecessors() {
	let (_adaptor, nodes) = make_ring(&[0, 6, 8, 3], &RingConfig::with_bits(4)).await;

	// 6 and 3 take 12 for their last finger, 0 already has a closer one
	nodes[&6].update_fingers(12, 3).await.unwrap();
	assert_eq!(targets(&nodes[&6]).await, vec![6, 8, 0, 12]);
	assert_eq!(targets(&nodes[&3]).await, vec![3, 6, 8, 12]);
	assert_eq!(targets(&nodes[&0]).await, vec![0, 3, 3, 6]);
	assert_eq!(targets(&nodes[&8]).await, vec![8, 0, 0, 0]);

	// offering it again leaves the same tables
	nodes[&6].update_fingers(12, 3).await.unwrap();
	assert_eq!(targets(&nodes[&3]).await, vec![3, 6, 8, 12]);
	assert_eq!(targets(&nodes[&0]).await, vec![0, 3, 3, 6]);
}

#[tokio::test]
async fn every_node_agrees_on_ownership() {
	let ids = [0, 6, 8, 3, 2];
	let (_adaptor, nodes) = make_ring(&ids, &RingConfig::with_bits(4)).await;
	let live: BTreeSet<u64> = ids.iter().copied().collect();

	for (id, node) in &nodes {
		assert_eq!(node.find_successor(*id).await.unwrap(), *id);
		for key in 0..16 {
			assert_eq!(
				node.find_successor(key).await.unwrap(),
				expected_owner(&live, key),
				"owner of {key} as seen from {id}",
			);
		}
	}
}

#[tokio::test]
async fn successor_links_close_the_ring() {
	let ids = [0, 6, 8, 3, 2];
	let (_adaptor, nodes) = make_ring(&ids, &RingConfig::with_bits(4)).await;

	for (start, node) in &nodes {
		let mut current = *start;
		let mut seen = BTreeSet::new();
		for _ in 0..ids.len() {
			seen.insert(current);
			current = node.at(current).successor().await.unwrap();
		}
		assert_eq!(current, *start);
		assert_eq!(seen.len(), ids.len());

		let predecessor = node.predecessor().await.unwrap();
		assert_eq!(node.at(predecessor).successor().await.unwrap(), *start);
	}
}

#[tokio::test]
async fn joined_node_owns_its_own_id() {
	common::init_tracing();
	let config = RingConfig::with_bits(4);
	let adaptor = LocalAdaptor::new(&config);
	let bootstrap = start_node(0, &config, &adaptor).await;

	let mut joined = Vec::new();
	for id in [6, 8, 3, 2] {
		let node = start_node(id, &config, &adaptor).await;
		node.join(0).await.unwrap();
		assert_eq!(bootstrap.find_successor(id).await.unwrap(), id);
		assert_eq!(node.find_successor(id).await.unwrap(), id);
		joined.push(node);
	}
}

#[tokio::test]
async fn lone_node_owns_everything() {
	let (_adaptor, nodes) = make_ring(&[5], &RingConfig::with_bits(4)).await;
	let lone = &nodes[&5];

	for key in 0..16 {
		assert_eq!(lone.find_successor(key).await.unwrap(), 5);
	}
	let own = lone.route_to_predecessor(5).await.unwrap();
	assert_eq!((own.node, own.outcome), (5, RouteOutcome::Converged));
	let other = lone.route_to_predecessor(11).await.unwrap();
	assert_eq!((other.node, other.hops, other.outcome), (5, 0, RouteOutcome::Stalled));

	lone.put(11, value("eleven")).await.unwrap();
	assert_eq!(lone.get(11).await.unwrap(), Some(value("eleven")));
	assert_eq!(lone.get(12).await.unwrap(), None);
	assert_eq!(lone.local_keys().await.unwrap(), vec![11]);
}

#[tokio::test]
async fn values_are_replicated_on_two_nodes() {
	let ids = [0, 6, 8, 3];
	let (_adaptor, nodes) = make_ring(&ids, &RingConfig::with_bits(4)).await;

	for key in 0..16 {
		nodes[&3].put(key, value(&format!("v{key}"))).await.unwrap();
	}

	let mut holders = vec![0; 16];
	for node in nodes.values() {
		for key in node.local_keys().await.unwrap() {
			holders[key as usize] += 1;
		}
	}
	for (key, count) in holders.iter().enumerate() {
		assert_eq!(*count, 2, "key {key} held {count} times");
	}
	assert_eq!(nodes[&6].local_keys().await.unwrap(), vec![3, 4, 5, 6, 7, 8]);

	for (id, node) in &nodes {
		for key in 0..16 {
			assert_eq!(node.get(key).await.unwrap(), Some(value(&format!("v{key}"))), "get {key} from {id}");
		}
	}
}

#[tokio::test]
async fn lookups_are_repeatable_on_random_rings() {
	common::init_tracing();
	let config = RingConfig::with_bits(6);
	let ring = config.ring().unwrap();
	let mut rng = rand::thread_rng();

	for _ in 0..10 {
		let mut ids: Vec<u64> = (0..ring.modulus()).collect();
		ids.shuffle(&mut rng);
		ids.truncate(8);
		let (_adaptor, nodes) = make_ring(&ids, &config).await;

		for (id, node) in &nodes {
			assert_eq!(node.find_successor(*id).await.unwrap(), *id);

			let key = ring.random_id();
			let first = node.route_to_predecessor(key).await.unwrap();
			let second = node.route_to_predecessor(key).await.unwrap();
			assert_eq!(first, second);
			assert!(first.hops <= ring.modulus());
			assert_eq!(node.find_successor(key).await.unwrap(), node.find_successor(key).await.unwrap());

			// put and get from the same node resolve the same anchor
			node.put(key, value("payload")).await.unwrap();
			assert_eq!(node.get(key).await.unwrap(), Some(value("payload")));
		}
	}
}

#[tokio::test]
async fn ids_and_keys_outside_the_ring_are_rejected() {
	let config = RingConfig::with_bits(4);
	let (adaptor, nodes) = make_ring(&[0, 8], &config).await;
	let n0 = &nodes[&0];

	assert!(matches!(n0.find_successor(16).await, Err(ChordError::IdOutOfRange { id: 16, modulus: 16 })));
	assert!(matches!(n0.put(40, value("x")).await, Err(ChordError::IdOutOfRange { id: 40, .. })));
	assert!(ChordNode::new(16, &config).is_err());

	let duplicate = ChordNode::new(8, &config).unwrap().start(adaptor.clone()).await;
	assert!(matches!(duplicate, Err(ChordError::DuplicateId(8))));
}

#[tokio::test]
async fn join_through_missing_bootstrap_fails() {
	let config = RingConfig::with_bits(4);
	let (adaptor, _nodes) = make_ring(&[0], &config).await;
	let newcomer = start_node(9, &config, &adaptor).await;
	assert!(matches!(newcomer.join(4).await, Err(ChordError::Unreachable(4))));
}

#[tokio::test]
async fn stopped_node_is_unreachable() {
	let config = RingConfig::with_bits(4);
	let (adaptor, mut nodes) = make_ring(&[0, 8], &config).await;
	let n8 = nodes.remove(&8).unwrap();
	n8.stop().await;

	assert!(matches!(nodes[&0].at(8).successor().await, Err(ChordError::Unreachable(8))));
	assert_eq!(adaptor.members().await, vec![0]);
}
