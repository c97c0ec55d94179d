//! Immutable article graph: nodes, directed edges and adjacency in both
//! directions.

use std::collections::HashMap;
use std::fmt;

use super::error::GraphError;

/// Position of a node in the graph's node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeIdx(pub u32);

/// Position of an edge in the graph's edge list. Parallel edges get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

impl NodeIdx {
	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}
}

impl EdgeId {
	pub(crate) fn index(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for NodeIdx {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// How an edge relates the generations of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeOrientation {
	/// `source -> target` means target is the ancestor (the article the
	/// source depends on). Ancestors are found along outgoing edges.
	#[default]
	PointsToAncestor,
	/// `source -> target` means target is the descendant. Ancestors are found
	/// along incoming edges.
	PointsToDescendant,
}

/// An article, or a dummy node routing a long edge through a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Unique id.
	pub id: String,
	/// Display name, also the search key.
	pub name: String,
	/// Routing placeholder, never drawn and never tagged.
	pub dummy: bool,
	/// External link opened on right click.
	pub href: Option<String>,
	/// Precomputed layout position in producer units.
	pub position: Option<(f64, f64)>,
}

impl Node {
	/// Real article node with the display name equal to its id.
	pub fn article(id: impl Into<String>) -> Self {
		let id = id.into();
		Self {
			name: id.clone(),
			id,
			dummy: false,
			href: None,
			position: None,
		}
	}

	/// Placeholder node with no real-world referent.
	pub fn dummy(id: impl Into<String>) -> Self {
		Self {
			dummy: true,
			..Self::article(id)
		}
	}

	/// Sets the display name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Sets the external link.
	pub fn with_href(mut self, href: impl Into<String>) -> Self {
		self.href = Some(href.into());
		self
	}

	/// Sets the precomputed layout position.
	pub fn with_position(mut self, x: f64, y: f64) -> Self {
		self.position = Some((x, y));
		self
	}
}

/// Directed edge `source -> target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
	/// Tail of the edge.
	pub source: NodeIdx,
	/// Head of the edge.
	pub target: NodeIdx,
}

/// Read-only topology. Built once through [`GraphBuilder`].
#[derive(Clone, Debug)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	outgoing: Vec<Vec<EdgeId>>,
	incoming: Vec<Vec<EdgeId>>,
	by_id: HashMap<String, NodeIdx>,
	orientation: EdgeOrientation,
}

impl Graph {
	/// Empty builder with the default orientation.
	pub fn builder() -> GraphBuilder {
		GraphBuilder::default()
	}

	/// Number of nodes, dummies included.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges, parallel edges counted separately.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Node at `idx`.
	///
	/// # Panics
	///
	/// Panics if `idx` does not belong to this graph.
	pub fn node(&self, idx: NodeIdx) -> &Node {
		&self.nodes[idx.index()]
	}

	/// Edge with id `id`.
	///
	/// # Panics
	///
	/// Panics if `id` does not belong to this graph.
	pub fn edge(&self, id: EdgeId) -> Edge {
		self.edges[id.index()]
	}

	/// Index of the node with the given id.
	pub fn index_of(&self, id: &str) -> Option<NodeIdx> {
		self.by_id.get(id).copied()
	}

	/// First real node whose display name equals `name`.
	pub fn find_by_name(&self, name: &str) -> Option<NodeIdx> {
		self.nodes()
			.find(|(_, node)| !node.dummy && node.name == name)
			.map(|(idx, _)| idx)
	}

	/// All nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
		self.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (NodeIdx(i as u32), node))
	}

	/// All edges in insertion order.
	pub fn edges(&self) -> impl Iterator<Item = (EdgeId, Edge)> + '_ {
		self.edges
			.iter()
			.enumerate()
			.map(|(i, edge)| (EdgeId(i as u32), *edge))
	}

	/// Edges leaving `idx`.
	pub fn outgoing(&self, idx: NodeIdx) -> &[EdgeId] {
		&self.outgoing[idx.index()]
	}

	/// Edges entering `idx`.
	pub fn incoming(&self, idx: NodeIdx) -> &[EdgeId] {
		&self.incoming[idx.index()]
	}

	/// How edges relate generations.
	pub fn orientation(&self) -> EdgeOrientation {
		self.orientation
	}

	/// Sorted display names of all real nodes.
	pub fn article_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self
			.nodes
			.iter()
			.filter(|node| !node.dummy)
			.map(|node| node.name.clone())
			.collect();
		names.sort();
		names
	}

	/// External link of a node, if it has a non-empty one.
	pub fn link_target(&self, idx: NodeIdx) -> Option<&str> {
		self.node(idx).href.as_deref().filter(|href| !href.is_empty())
	}
}

/// Collects nodes and edges, then validates them into a [`Graph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
	nodes: Vec<Node>,
	edges: Vec<(String, String)>,
	orientation: EdgeOrientation,
}

impl GraphBuilder {
	/// Adds a node.
	pub fn node(mut self, node: Node) -> Self {
		self.add_node(node);
		self
	}

	/// Adds an edge between two node ids.
	pub fn edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
		self.add_edge(source, target);
		self
	}

	/// Sets the edge orientation.
	pub fn orientation(mut self, orientation: EdgeOrientation) -> Self {
		self.orientation = orientation;
		self
	}

	/// Adds a node in place.
	pub fn add_node(&mut self, node: Node) {
		self.nodes.push(node);
	}

	/// Adds an edge in place. Endpoints are resolved by [`build`](Self::build).
	pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
		self.edges.push((source.into(), target.into()));
	}

	/// Checks id uniqueness and edge endpoints, then builds the adjacency.
	pub fn build(self) -> Result<Graph, GraphError> {
		let mut by_id = HashMap::with_capacity(self.nodes.len());
		for (i, node) in self.nodes.iter().enumerate() {
			if by_id.insert(node.id.clone(), NodeIdx(i as u32)).is_some() {
				return Err(GraphError::DuplicateNode {
					id: node.id.clone(),
				});
			}
		}

		let mut outgoing = vec![Vec::new(); self.nodes.len()];
		let mut incoming = vec![Vec::new(); self.nodes.len()];
		let mut edges = Vec::with_capacity(self.edges.len());

		for (source, target) in self.edges {
			let lookup = |id: &String| {
				by_id.get(id).copied().ok_or_else(|| GraphError::UnknownEndpoint {
					from: source.clone(),
					to: target.clone(),
					missing: id.clone(),
				})
			};
			let (src, tgt) = (lookup(&source)?, lookup(&target)?);
			let id = EdgeId(edges.len() as u32);
			outgoing[src.index()].push(id);
			incoming[tgt.index()].push(id);
			edges.push(Edge {
				source: src,
				target: tgt,
			});
		}

		Ok(Graph {
			nodes: self.nodes,
			edges,
			outgoing,
			incoming,
			by_id,
			orientation: self.orientation,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_adjacency_in_both_directions() {
		let graph = Graph::builder()
			.node(Node::article("a"))
			.node(Node::article("b"))
			.node(Node::article("c"))
			.edge("a", "b")
			.edge("a", "c")
			.edge("b", "c")
			.build()
			.unwrap();

		let (a, b, c) = (
			graph.index_of("a").unwrap(),
			graph.index_of("b").unwrap(),
			graph.index_of("c").unwrap(),
		);
		assert_eq!(graph.node_count(), 3);
		assert_eq!(graph.edge_count(), 3);
		assert_eq!(graph.outgoing(a), &[EdgeId(0), EdgeId(1)]);
		assert_eq!(graph.incoming(c), &[EdgeId(1), EdgeId(2)]);
		assert!(graph.incoming(a).is_empty());
		assert_eq!(graph.edge(EdgeId(2)), Edge { source: b, target: c });
	}

	#[test]
	fn parallel_edges_stay_distinct() {
		let graph = Graph::builder()
			.node(Node::article("a"))
			.node(Node::article("b"))
			.edge("a", "b")
			.edge("a", "b")
			.build()
			.unwrap();
		assert_eq!(graph.outgoing(NodeIdx(0)).len(), 2);
	}

	#[test]
	fn rejects_duplicate_ids() {
		let err = Graph::builder()
			.node(Node::article("a"))
			.node(Node::dummy("a"))
			.build()
			.unwrap_err();
		assert!(matches!(err, GraphError::DuplicateNode { id } if id == "a"));
	}

	#[test]
	fn rejects_edges_to_unknown_nodes() {
		let err = Graph::builder()
			.node(Node::article("a"))
			.edge("a", "ghost")
			.build()
			.unwrap_err();
		match err {
			GraphError::UnknownEndpoint { from, to, missing } => {
				assert_eq!((from.as_str(), to.as_str()), ("a", "ghost"));
				assert_eq!(missing, "ghost");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn article_names_skip_dummies_and_sort() {
		let graph = Graph::builder()
			.node(Node::article("2").with_name("beta"))
			.node(Node::dummy("d1"))
			.node(Node::article("1").with_name("alpha"))
			.build()
			.unwrap();
		assert_eq!(graph.article_names(), vec!["alpha", "beta"]);
		assert_eq!(graph.find_by_name("alpha"), Some(NodeIdx(2)));
		assert_eq!(graph.find_by_name("d1"), None);
	}

	#[test]
	fn empty_href_is_not_a_link() {
		let graph = Graph::builder()
			.node(Node::article("a").with_href(""))
			.node(Node::article("b").with_href("https://example.org/b"))
			.build()
			.unwrap();
		assert_eq!(graph.link_target(NodeIdx(0)), None);
		assert_eq!(graph.link_target(NodeIdx(1)), Some("https://example.org/b"));
	}
}
