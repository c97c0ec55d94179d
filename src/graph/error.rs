//! Error types for graph construction and highlighting.

use thiserror::Error;

/// Errors raised while building or decoding a [`Graph`](super::Graph).
#[derive(Debug, Error)]
pub enum GraphError {
	/// Two nodes share the same id.
	#[error("duplicate node id: '{id}'")]
	DuplicateNode {
		/// The repeated id.
		id: String,
	},

	/// An edge references a node id that was never added.
	#[error("edge {from} -> {to} references unknown node '{missing}'")]
	UnknownEndpoint {
		/// Source id of the edge.
		from: String,
		/// Target id of the edge.
		to: String,
		/// The endpoint that does not exist.
		missing: String,
	},

	/// The serialized graph document could not be decoded.
	#[error("invalid graph document: {0}")]
	Decode(#[from] serde_json::Error),
}

/// Errors raised by [`compute_highlight`](super::compute_highlight) and by
/// the conversions that produce its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
	/// The requested start node does not exist in the graph.
	#[error("node not found: '{id}'")]
	NotFound {
		/// Id or display name that was looked up.
		id: String,
	},

	/// A generation count was negative or not a number.
	#[error("invalid argument: {reason}")]
	InvalidArgument {
		/// What was wrong with the value.
		reason: String,
	},
}
