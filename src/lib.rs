//! A Chord ring: modular identifier arithmetic, finger tables, and the
//! join/lookup/leave protocol, with every node-to-node interaction carried
//! as a request through a [`ChordAdaptor`].

pub mod chord;
pub use chord::{Chord, ChordHandle, Route, RouteOutcome};
pub use chord::node::ChordNode;
pub use chord::message::{Request, Response};

pub mod adaptor;
pub use adaptor::{ChordAdaptor, local_adaptor::LocalAdaptor};

pub mod config;
pub use config::RingConfig;

pub mod error;
pub use error::{ChordError, ConfigError, Result};

pub mod finger_table;
pub use finger_table::{Finger, FingerTable};

pub mod ring;
pub use ring::Ring;


/// A position on the ring occupied by a node.
pub type NodeId = u64;

/// A position on the ring naming a stored value.
pub type Key = u64;

/// Opaque stored data.
pub type Value = Vec<u8>;
