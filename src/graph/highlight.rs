//! Generation-limited ancestor/descendant highlighting.
//!
//! Starting from a selected node, the engine walks ancestors first and then
//! descendants, one generation per step, marking every edge and node it
//! reaches. Both walks share the marks, so nothing is visited twice and
//! cyclic graphs terminate. Dummy nodes are walked through without spending
//! a generation: only the real node at the end of a dummy chain counts.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use log::debug;

use super::error::HighlightError;
use super::model::{EdgeId, EdgeOrientation, Graph, NodeIdx};

/// Highest generation tier. Deeper generations share this tier.
pub const MAX_TIER: u8 = 9;

/// Number of generations to walk in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generations(pub u32);

impl Generations {
	/// Walk no generations in this direction.
	pub const NONE: Generations = Generations(0);

	/// Raw generation count.
	pub fn get(self) -> u32 {
		self.0
	}
}

impl TryFrom<i64> for Generations {
	type Error = HighlightError;

	fn try_from(value: i64) -> Result<Self, Self::Error> {
		u32::try_from(value)
			.map(Generations)
			.map_err(|_| HighlightError::InvalidArgument {
				reason: format!("generation count must be between 0 and {}, got {value}", u32::MAX),
			})
	}
}

impl FromStr for Generations {
	type Err = HighlightError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let value: i64 = s
			.trim()
			.parse()
			.map_err(|_| HighlightError::InvalidArgument {
				reason: format!("generation count is not a number: '{s}'"),
			})?;
		Generations::try_from(value)
	}
}

impl fmt::Display for Generations {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Side of the selected node a highlighted node was reached on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
	/// Reached by the ancestor walk.
	Ancestor,
	/// Reached by the descendant walk.
	Descendant,
}

/// Presentation tier of a highlighted node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationTag {
	/// Which walk reached the node.
	pub direction: Direction,
	/// Clamped to `0..=MAX_TIER`.
	pub generation: u8,
}

/// Arguments of [`compute_highlight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRequest<'a> {
	/// Id of the selected node.
	pub start: &'a str,
	/// Generations to walk towards ancestors.
	pub ancestors: Generations,
	/// Generations to walk towards descendants.
	pub descendants: Generations,
}

impl<'a> HighlightRequest<'a> {
	/// Request starting at the node with id `start`.
	pub fn new(start: &'a str, ancestors: Generations, descendants: Generations) -> Self {
		Self {
			start,
			ancestors,
			descendants,
		}
	}
}

/// Presentation state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
	/// Nothing is selected.
	Default,
	/// The selected node itself.
	Selected,
	/// Reached by traversal. Dummy nodes carry no tag.
	Highlighted(Option<GenerationTag>),
	/// Outside the highlighted lineage.
	Faded,
}

/// Partition of a graph into highlighted and faded elements for one
/// selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightResult {
	selected: Option<NodeIdx>,
	nodes: BTreeSet<NodeIdx>,
	edges: BTreeSet<EdgeId>,
	tags: BTreeMap<NodeIdx, GenerationTag>,
	faded_nodes: BTreeSet<NodeIdx>,
	faded_edges: BTreeSet<EdgeId>,
}

impl HighlightResult {
	/// Nothing selected, nothing highlighted, nothing faded.
	pub fn cleared() -> Self {
		Self::default()
	}

	/// Whether a node is selected.
	pub fn is_active(&self) -> bool {
		self.selected.is_some()
	}

	/// The selected node, if any.
	pub fn selected(&self) -> Option<NodeIdx> {
		self.selected
	}

	/// Selected node plus every node reached by either walk, dummies included.
	pub fn highlighted_nodes(&self) -> &BTreeSet<NodeIdx> {
		&self.nodes
	}

	/// Edges traversed by either walk.
	pub fn highlighted_edges(&self) -> &BTreeSet<EdgeId> {
		&self.edges
	}

	/// Complement of [`highlighted_nodes`](Self::highlighted_nodes) while a
	/// node is selected.
	pub fn faded_nodes(&self) -> &BTreeSet<NodeIdx> {
		&self.faded_nodes
	}

	/// Complement of [`highlighted_edges`](Self::highlighted_edges) while a
	/// node is selected.
	pub fn faded_edges(&self) -> &BTreeSet<EdgeId> {
		&self.faded_edges
	}

	/// Tier of a real node reached by traversal.
	pub fn generation_of(&self, node: NodeIdx) -> Option<GenerationTag> {
		self.tags.get(&node).copied()
	}

	/// Whether `node` is part of the highlighted lineage.
	pub fn is_node_highlighted(&self, node: NodeIdx) -> bool {
		self.nodes.contains(&node)
	}

	/// Whether `edge` is part of the highlighted lineage.
	pub fn is_edge_highlighted(&self, edge: EdgeId) -> bool {
		self.edges.contains(&edge)
	}

	/// Whether `node` is drawn faded.
	pub fn is_node_faded(&self, node: NodeIdx) -> bool {
		self.faded_nodes.contains(&node)
	}

	/// How `node` should be drawn.
	pub fn node_state(&self, node: NodeIdx) -> NodeState {
		if !self.is_active() {
			NodeState::Default
		} else if self.selected == Some(node) {
			NodeState::Selected
		} else if self.nodes.contains(&node) {
			NodeState::Highlighted(self.generation_of(node))
		} else {
			NodeState::Faded
		}
	}
}

/// Computes the highlight for selecting `request.start`.
pub fn compute_highlight(
	graph: &Graph,
	request: &HighlightRequest<'_>,
) -> Result<HighlightResult, HighlightError> {
	let start = graph
		.index_of(request.start)
		.ok_or_else(|| HighlightError::NotFound {
			id: request.start.to_string(),
		})?;

	let mut marks = Marks::default();
	marks.nodes.insert(start);
	marks.walk(graph, start, Direction::Ancestor, request.ancestors);
	marks.walk(graph, start, Direction::Descendant, request.descendants);

	let faded_nodes = graph
		.nodes()
		.map(|(idx, _)| idx)
		.filter(|idx| !marks.nodes.contains(idx))
		.collect();
	let faded_edges = graph
		.edges()
		.map(|(id, _)| id)
		.filter(|id| !marks.edges.contains(id))
		.collect();

	debug!(
		"highlight of '{}': {} nodes, {} edges",
		request.start,
		marks.nodes.len(),
		marks.edges.len()
	);

	Ok(HighlightResult {
		selected: Some(start),
		nodes: marks.nodes,
		edges: marks.edges,
		tags: marks.tags,
		faded_nodes,
		faded_edges,
	})
}

#[derive(Default)]
struct Marks {
	nodes: BTreeSet<NodeIdx>,
	edges: BTreeSet<EdgeId>,
	tags: BTreeMap<NodeIdx, GenerationTag>,
}

impl Marks {
	fn walk(&mut self, graph: &Graph, start: NodeIdx, direction: Direction, depth: Generations) {
		let mut frontier = vec![start];
		for generation in 0..depth.get() {
			let tag = GenerationTag {
				direction,
				generation: generation.min(u32::from(MAX_TIER)) as u8,
			};
			let mut next = Vec::new();
			for &node in &frontier {
				self.step(graph, node, tag, &mut next);
			}
			frontier = next;
			if frontier.is_empty() {
				break;
			}
		}
	}

	/// Marks the unmarked edges leaving `node` in the tag's direction and
	/// pushes the newly reached real nodes onto `next`. Dummy nodes are
	/// expanded in place.
	fn step(&mut self, graph: &Graph, node: NodeIdx, tag: GenerationTag, next: &mut Vec<NodeIdx>) {
		let mut pending = VecDeque::from([node]);
		while let Some(current) = pending.pop_front() {
			for &edge in neighbours(graph, current, tag.direction) {
				if !self.edges.insert(edge) {
					continue;
				}
				let far = far_end(graph, edge, tag.direction);
				if !self.nodes.insert(far) {
					continue;
				}
				if graph.node(far).dummy {
					pending.push_back(far);
				} else {
					self.tags.insert(far, tag);
					next.push(far);
				}
			}
		}
	}
}

/// Edges to follow from `node` when walking in `direction`.
fn neighbours(graph: &Graph, node: NodeIdx, direction: Direction) -> &[EdgeId] {
	if follows_outgoing(graph.orientation(), direction) {
		graph.outgoing(node)
	} else {
		graph.incoming(node)
	}
}

fn far_end(graph: &Graph, edge: EdgeId, direction: Direction) -> NodeIdx {
	let edge = graph.edge(edge);
	if follows_outgoing(graph.orientation(), direction) {
		edge.target
	} else {
		edge.source
	}
}

fn follows_outgoing(orientation: EdgeOrientation, direction: Direction) -> bool {
	matches!(
		(orientation, direction),
		(EdgeOrientation::PointsToAncestor, Direction::Ancestor)
			| (EdgeOrientation::PointsToDescendant, Direction::Descendant)
	)
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use proptest::prelude::*;

	use super::*;
	use crate::graph::Node;

	fn chain(orientation: EdgeOrientation, ids: &[&str], edges: &[(&str, &str)]) -> Graph {
		let mut builder = Graph::builder().orientation(orientation);
		for id in ids {
			let node = if id.starts_with("dummy") {
				Node::dummy(*id)
			} else {
				Node::article(*id)
			};
			builder.add_node(node);
		}
		for (source, target) in edges {
			builder.add_edge(*source, *target);
		}
		builder.build().unwrap()
	}

	fn highlight(graph: &Graph, start: &str, ancestors: u32, descendants: u32) -> HighlightResult {
		compute_highlight(
			graph,
			&HighlightRequest::new(start, Generations(ancestors), Generations(descendants)),
		)
		.unwrap()
	}

	fn ids(graph: &Graph, nodes: &BTreeSet<NodeIdx>) -> Vec<String> {
		let mut ids: Vec<String> = nodes.iter().map(|&n| graph.node(n).id.clone()).collect();
		ids.sort();
		ids
	}

	fn idx(graph: &Graph, id: &str) -> NodeIdx {
		graph.index_of(id).unwrap()
	}

	fn xyz(orientation: EdgeOrientation) -> Graph {
		chain(orientation, &["X", "Y", "Z"], &[("X", "Y"), ("Y", "Z")])
	}

	#[test]
	fn zero_generations_highlight_only_the_selection() {
		let graph = xyz(EdgeOrientation::PointsToAncestor);
		let result = highlight(&graph, "Y", 0, 0);
		assert_eq!(ids(&graph, result.highlighted_nodes()), vec!["Y"]);
		assert!(result.highlighted_edges().is_empty());
		assert_eq!(result.faded_edges().len(), 2);
		assert_eq!(result.node_state(idx(&graph, "Y")), NodeState::Selected);
		assert_eq!(result.node_state(idx(&graph, "X")), NodeState::Faded);
	}

	#[test]
	fn one_generation_each_way_covers_the_middle_of_a_chain() {
		for orientation in [
			EdgeOrientation::PointsToAncestor,
			EdgeOrientation::PointsToDescendant,
		] {
			let graph = xyz(orientation);
			let result = highlight(&graph, "Y", 1, 1);
			assert_eq!(ids(&graph, result.highlighted_nodes()), vec!["X", "Y", "Z"]);
			assert_eq!(result.highlighted_edges().len(), 2);
			assert!(result.faded_nodes().is_empty());
			assert!(result.faded_edges().is_empty());
		}
	}

	#[test]
	fn a_root_has_no_ancestors() {
		let graph = xyz(EdgeOrientation::PointsToDescendant);
		let result = highlight(&graph, "X", 1, 0);
		assert_eq!(ids(&graph, result.highlighted_nodes()), vec!["X"]);
		assert_eq!(ids(&graph, result.faded_nodes()), vec!["Y", "Z"]);
		assert_eq!(result.faded_edges().len(), 2);
	}

	#[test]
	fn ancestors_follow_outgoing_edges_by_default() {
		let graph = xyz(EdgeOrientation::PointsToAncestor);
		let result = highlight(&graph, "X", 1, 0);
		assert_eq!(ids(&graph, result.highlighted_nodes()), vec!["X", "Y"]);
		assert_eq!(
			result.generation_of(idx(&graph, "Y")),
			Some(GenerationTag {
				direction: Direction::Ancestor,
				generation: 0,
			})
		);
		assert_eq!(result.generation_of(idx(&graph, "X")), None);
	}

	#[test]
	fn generations_are_tagged_per_direction() {
		let graph = chain(
			EdgeOrientation::PointsToDescendant,
			&["a2", "a1", "s", "d1", "d2"],
			&[("a2", "a1"), ("a1", "s"), ("s", "d1"), ("d1", "d2")],
		);
		let result = highlight(&graph, "s", 2, 2);
		let tag = |id: &str| result.generation_of(idx(&graph, id)).unwrap();
		assert_eq!((tag("a1").direction, tag("a1").generation), (Direction::Ancestor, 0));
		assert_eq!((tag("a2").direction, tag("a2").generation), (Direction::Ancestor, 1));
		assert_eq!((tag("d1").direction, tag("d1").generation), (Direction::Descendant, 0));
		assert_eq!((tag("d2").direction, tag("d2").generation), (Direction::Descendant, 1));
	}

	#[test]
	fn dummy_chains_do_not_consume_generations() {
		let graph = chain(
			EdgeOrientation::PointsToDescendant,
			&["A", "dummy1", "dummy2", "B", "C"],
			&[("A", "dummy1"), ("dummy1", "dummy2"), ("dummy2", "B"), ("B", "C")],
		);
		let result = highlight(&graph, "A", 0, 1);
		assert_eq!(
			ids(&graph, result.highlighted_nodes()),
			vec!["A", "B", "dummy1", "dummy2"]
		);
		assert_eq!(result.highlighted_edges().len(), 3);
		assert_eq!(
			result.generation_of(idx(&graph, "B")),
			Some(GenerationTag {
				direction: Direction::Descendant,
				generation: 0,
			})
		);
		assert_eq!(result.generation_of(idx(&graph, "dummy1")), None);
		assert_eq!(
			result.node_state(idx(&graph, "dummy2")),
			NodeState::Highlighted(None)
		);
		assert!(result.is_node_faded(idx(&graph, "C")));
	}

	#[test]
	fn branching_dummy_chains_reach_every_real_end() {
		let graph = chain(
			EdgeOrientation::PointsToAncestor,
			&["s", "dummy1", "dummy2", "dummy3", "p", "q"],
			&[
				("s", "dummy1"),
				("dummy1", "dummy2"),
				("dummy1", "dummy3"),
				("dummy2", "p"),
				("dummy3", "q"),
			],
		);
		let result = highlight(&graph, "s", 1, 0);
		assert_eq!(graph.node_count(), result.highlighted_nodes().len());
		for id in ["p", "q"] {
			assert_eq!(result.generation_of(idx(&graph, id)).unwrap().generation, 0);
		}
	}

	#[test]
	fn generation_tags_saturate() {
		let ids: Vec<String> = (0..=16).map(|i| format!("n{i}")).collect();
		let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
		let edges: Vec<(&str, &str)> = refs.windows(2).map(|w| (w[0], w[1])).collect();
		let graph = chain(EdgeOrientation::PointsToDescendant, &refs, &edges);

		let result = highlight(&graph, "n0", 0, 20);
		assert_eq!(result.highlighted_nodes().len(), 17);
		// n16 is reached at raw generation 15
		assert_eq!(result.generation_of(idx(&graph, "n16")).unwrap().generation, MAX_TIER);
		assert_eq!(result.generation_of(idx(&graph, "n9")).unwrap().generation, 8);
	}

	#[test]
	fn cycles_terminate_and_tag_once() {
		let graph = chain(
			EdgeOrientation::PointsToDescendant,
			&["X", "Y", "Z"],
			&[("X", "Y"), ("Y", "Z"), ("Z", "X")],
		);
		let result = highlight(&graph, "X", 0, 50);
		assert_eq!(result.highlighted_nodes().len(), 3);
		assert_eq!(result.highlighted_edges().len(), 3);
		assert_eq!(result.generation_of(idx(&graph, "Y")).unwrap().generation, 0);
		assert_eq!(result.generation_of(idx(&graph, "Z")).unwrap().generation, 1);
		assert_eq!(result.generation_of(idx(&graph, "X")), None);
	}

	#[test]
	fn ancestor_marks_block_the_descendant_pass() {
		// a -> s and s -> a: the ancestor pass takes a first
		let graph = chain(
			EdgeOrientation::PointsToDescendant,
			&["a", "s"],
			&[("a", "s"), ("s", "a")],
		);
		let result = highlight(&graph, "s", 1, 1);
		let tag = result.generation_of(idx(&graph, "a")).unwrap();
		assert_eq!(tag.direction, Direction::Ancestor);
		assert_eq!(result.highlighted_edges().len(), 2);
	}

	#[test]
	fn unknown_start_is_not_found() {
		let graph = xyz(EdgeOrientation::PointsToAncestor);
		let err = compute_highlight(
			&graph,
			&HighlightRequest::new("W", Generations(1), Generations(1)),
		)
		.unwrap_err();
		assert_eq!(err, HighlightError::NotFound { id: "W".into() });
	}

	#[test]
	fn negative_generations_are_rejected() {
		assert!(matches!(
			Generations::try_from(-1_i64),
			Err(HighlightError::InvalidArgument { .. })
		));
		assert!(matches!(
			"-3".parse::<Generations>(),
			Err(HighlightError::InvalidArgument { .. })
		));
		assert!(matches!(
			"many".parse::<Generations>(),
			Err(HighlightError::InvalidArgument { .. })
		));
		assert_eq!(" 4 ".parse::<Generations>(), Ok(Generations(4)));
		assert_eq!(Generations::try_from(0_i64), Ok(Generations::NONE));
	}

	#[test]
	fn cleared_result_is_neutral() {
		let cleared = HighlightResult::cleared();
		assert!(!cleared.is_active());
		assert!(cleared.highlighted_nodes().is_empty());
		assert!(cleared.faded_nodes().is_empty());
		assert_eq!(cleared.node_state(NodeIdx(0)), NodeState::Default);
	}

	// Minimum number of real hops from `start` to every node, walking in
	// `direction`. Entering a dummy node is free.
	fn real_hops(graph: &Graph, start: NodeIdx, direction: Direction) -> HashMap<NodeIdx, u32> {
		let mut dist = HashMap::from([(start, 0)]);
		let mut queue = VecDeque::from([start]);
		while let Some(node) = queue.pop_front() {
			let here = dist[&node];
			for &edge in neighbours(graph, node, direction) {
				let far = far_end(graph, edge, direction);
				let cost = here + u32::from(!graph.node(far).dummy);
				if dist.get(&far).is_none_or(|&d| cost < d) {
					dist.insert(far, cost);
					if graph.node(far).dummy {
						queue.push_front(far);
					} else {
						queue.push_back(far);
					}
				}
			}
		}
		dist
	}

	fn arb_graph() -> impl Strategy<Value = Graph> {
		(1usize..12)
			.prop_flat_map(|n| {
				(
					prop::collection::vec(any::<bool>(), n),
					prop::collection::vec((0..n, 0..n), 0..(n * 3)),
					any::<bool>(),
				)
			})
			.prop_map(|(dummies, edges, flip)| {
				let mut builder = Graph::builder().orientation(if flip {
					EdgeOrientation::PointsToDescendant
				} else {
					EdgeOrientation::PointsToAncestor
				});
				for (i, dummy) in dummies.iter().enumerate() {
					let id = format!("n{i}");
					builder.add_node(if *dummy { Node::dummy(id) } else { Node::article(id) });
				}
				for (s, t) in edges {
					builder.add_edge(format!("n{s}"), format!("n{t}"));
				}
				builder.build().unwrap()
			})
	}

	proptest! {
		#[test]
		fn zero_depth_is_the_selection_alone(graph in arb_graph(), pick in any::<prop::sample::Index>()) {
			let start = NodeIdx(pick.index(graph.node_count()) as u32);
			let id = graph.node(start).id.clone();
			let result = highlight(&graph, &id, 0, 0);
			prop_assert_eq!(result.highlighted_nodes().iter().copied().collect::<Vec<_>>(), vec![start]);
			prop_assert!(result.highlighted_edges().is_empty());
			prop_assert_eq!(result.faded_nodes().len(), graph.node_count() - 1);
		}

		#[test]
		fn highlight_stays_within_depth(
			graph in arb_graph(),
			pick in any::<prop::sample::Index>(),
			ancestors in 0u32..5,
			descendants in 0u32..5,
		) {
			let start = NodeIdx(pick.index(graph.node_count()) as u32);
			let id = graph.node(start).id.clone();
			let result = highlight(&graph, &id, ancestors, descendants);
			let up = real_hops(&graph, start, Direction::Ancestor);
			let down = real_hops(&graph, start, Direction::Descendant);

			for &node in result.highlighted_nodes() {
				if node == start {
					continue;
				}
				let within = |dist: &HashMap<NodeIdx, u32>, depth: u32| {
					dist.get(&node).is_some_and(|&d| {
						if graph.node(node).dummy { d < depth } else { d <= depth }
					})
				};
				prop_assert!(within(&up, ancestors) || within(&down, descendants));
			}
			for (&node, tag) in &result.tags {
				prop_assert!(tag.generation <= MAX_TIER);
				prop_assert!(!graph.node(node).dummy);
			}
			prop_assert_eq!(
				result.highlighted_nodes().len() + result.faded_nodes().len(),
				graph.node_count()
			);
			prop_assert_eq!(
				result.highlighted_edges().len() + result.faded_edges().len(),
				graph.edge_count()
			);
		}

		#[test]
		fn highlight_is_deterministic(
			graph in arb_graph(),
			pick in any::<prop::sample::Index>(),
			ancestors in 0u32..20,
			descendants in 0u32..20,
		) {
			let id = graph.node(NodeIdx(pick.index(graph.node_count()) as u32)).id.clone();
			let first = highlight(&graph, &id, ancestors, descendants);
			let second = highlight(&graph, &id, ancestors, descendants);
			prop_assert_eq!(first, second);
		}
	}
}
