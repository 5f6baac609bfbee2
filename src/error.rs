use thiserror::Error;

use crate::NodeId;

pub type Result<T> = std::result::Result<T, ChordError>;

#[derive(Error, Debug)]
pub enum ChordError {
	/// No inbox is registered for the node, or its task has stopped.
	#[error("node {0} is unreachable")]
	Unreachable(NodeId),

	#[error("request to node {node} timed out after {attempts} attempts")]
	Timeout { node: NodeId, attempts: u32 },

	#[error("node {node} answered {request} with {response}")]
	UnexpectedResponse {
		node: NodeId,
		request: &'static str,
		response: String,
	},

	#[error("id {id} is outside of the ring [0, {modulus})")]
	IdOutOfRange { id: u64, modulus: u64 },

	#[error("node {0} is already registered")]
	DuplicateId(NodeId),

	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("ring bit width must be between {min} and {max}, got {bits}")]
	InvalidBits { bits: u32, min: u32, max: u32 },

	#[error("inbox capacity must be non-zero")]
	ZeroInboxCapacity,

	#[error("request timeout must be non-zero")]
	ZeroRequestTimeout,

	#[error("failed to read configuration: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse configuration: {0}")]
	Parse(#[from] serde_json::Error),
}
