//! Serialized graph document in the cytoscape elements layout written by the
//! layered-layout exporter.
//!
//! ```json
//! {"elements": {
//!     "nodes": [{"data": {"id": "a", "name": "a", "is_dummy": false, "href": "", "x": 0, "y": 1}}],
//!     "edges": [{"data": {"source": "a", "target": "b"}}]
//! }}
//! ```
//!
//! Records are grouped. A group is either a list of records or an object
//! whose values are records (the exporter wraps each record as `{"data": ..}`).
//! The groups themselves form a list, or an object keyed by group index.
//! Everything is flattened in document order.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::GraphError;
use super::model::{EdgeOrientation, Graph, Node};

/// Top-level document. Fields besides `elements` are ignored.
#[derive(Debug, Deserialize)]
pub struct GraphDocument {
	/// Node and edge groups.
	pub elements: Elements,
}

/// Grouped node and edge records.
#[derive(Debug, Deserialize)]
pub struct Elements {
	/// Node records.
	#[serde(default)]
	pub nodes: Groups<NodeRecord>,
	/// Edge records.
	#[serde(default)]
	pub edges: Groups<EdgeRecord>,
}

/// Nested grouping of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Groups<T> {
	/// `[[record, ..], ..]`
	List(Vec<Vec<T>>),
	/// `[{"data": record}, ..]`, one wrapper object per element.
	Wrapped(Vec<BTreeMap<String, T>>),
	/// `{"0": [record, ..], ..}`
	Keyed(BTreeMap<String, Vec<T>>),
}

impl<T> Default for Groups<T> {
	fn default() -> Self {
		Groups::List(Vec::new())
	}
}

impl<T> Groups<T> {
	/// Records in group order. Keyed groups with numeric keys come first in
	/// numeric order, then the remaining keys in string order.
	pub fn flatten(self) -> Vec<T> {
		match self {
			Groups::List(groups) => groups.into_iter().flatten().collect(),
			Groups::Wrapped(groups) => groups.into_iter().flat_map(BTreeMap::into_values).collect(),
			Groups::Keyed(groups) => {
				let mut groups: Vec<(String, Vec<T>)> = groups.into_iter().collect();
				// Stable sort over string-ordered keys keeps non-numeric keys in
				// string order.
				groups.sort_by_key(|(key, _)| {
					let index = key.parse::<u64>().ok();
					(index.is_none(), index)
				});
				groups.into_iter().flat_map(|(_, records)| records).collect()
			}
		}
	}
}

/// Serialized node. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct NodeRecord {
	/// Unique id.
	pub id: String,
	/// Display name, the id when absent.
	#[serde(default)]
	pub name: Option<String>,
	/// Routing placeholder flag.
	#[serde(default, alias = "dummy")]
	pub is_dummy: bool,
	/// External link, empty for none.
	#[serde(default)]
	pub href: Option<String>,
	/// Layout x coordinate.
	#[serde(default)]
	pub x: Option<f64>,
	/// Layout y coordinate.
	#[serde(default)]
	pub y: Option<f64>,
}

/// Serialized edge between two node ids.
#[derive(Debug, Deserialize)]
pub struct EdgeRecord {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
}

impl From<NodeRecord> for Node {
	fn from(record: NodeRecord) -> Self {
		Node {
			name: record.name.unwrap_or_else(|| record.id.clone()),
			id: record.id,
			dummy: record.is_dummy,
			href: record.href.filter(|href| !href.is_empty()),
			position: record.x.zip(record.y),
		}
	}
}

impl GraphDocument {
	/// Builds the graph, flattening groups in document order.
	pub fn into_graph(self, orientation: EdgeOrientation) -> Result<Graph, GraphError> {
		let mut builder = Graph::builder().orientation(orientation);
		for record in self.elements.nodes.flatten() {
			builder.add_node(record.into());
		}
		for edge in self.elements.edges.flatten() {
			builder.add_edge(edge.source, edge.target);
		}
		builder.build()
	}
}

impl Graph {
	/// Decodes a serialized graph document with the default orientation.
	pub fn from_json(json: &str) -> Result<Graph, GraphError> {
		let document: GraphDocument = serde_json::from_str(json)?;
		document.into_graph(EdgeOrientation::default())
	}
}
