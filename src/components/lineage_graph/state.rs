use std::f64::consts::PI;
use std::sync::Arc;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{info, warn};

use crate::graph::{
	Generations, Graph, HighlightError, HighlightRequest, HighlightResult, NodeIdx,
	compute_highlight,
};

pub const NODE_RADIUS: f64 = 5.0;
pub const HIT_RADIUS: f64 = 12.0;
/// World units per unit of a precomputed layout position.
pub const LAYOUT_SCALE: f64 = 60.0;
/// Pointer travel (screen pixels) that turns a press into a drag.
const CLICK_SLOP: f64 = 3.0;
const FOCUS_ZOOM: f64 = 2.5;
const FOCUS_SPEED: f64 = 6.0;

/// Generation counts used for the next selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlightSettings {
	/// Generations walked towards ancestors.
	pub ancestors: Generations,
	/// Generations walked towards descendants.
	pub descendants: Generations,
}

impl Default for HighlightSettings {
	fn default() -> Self {
		Self {
			ancestors: Generations(1),
			descendants: Generations(1),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub node: NodeIdx,
	pub label: String,
	pub dummy: bool,
	pub linked: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Press position and whether the pointer travelled far enough to stop
/// counting as a click.
#[derive(Clone, Debug, Default)]
struct PressState {
	origin: Option<(f64, f64)>,
	moved: bool,
}

/// What a click did to the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
	Selected(NodeIdx),
	Cleared,
	/// The press turned into a drag or pan.
	Ignored,
}

pub struct LineageGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub model: Arc<Graph>,
	pub highlight: HighlightResult,
	pub settings: HighlightSettings,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	/// Eased 0..1 progress of the current highlight.
	pub highlight_t: f64,
	press: PressState,
	focus: Option<ViewTransform>,
	layout: Vec<DefaultNodeIdx>,
}

impl LineageGraphState {
	pub fn new(model: Arc<Graph>, settings: HighlightSettings, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut layout = Vec::with_capacity(model.node_count());
		let count = model.node_count().max(1) as f64;

		for (idx, node) in model.nodes() {
			// Precomputed positions stay put; the rest are seeded on a circle
			// and settled by the simulation.
			let (x, y, is_anchor) = match node.position {
				Some((px, py)) => ((px * LAYOUT_SCALE) as f32, (py * LAYOUT_SCALE) as f32, true),
				None => {
					let angle = f64::from(idx.0) * 2.0 * PI / count;
					(
						(width / 2.0 + 100.0 * angle.cos()) as f32,
						(height / 2.0 + 100.0 * angle.sin()) as f32,
						false,
					)
				}
			};
			layout.push(graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor,
				user_data: NodeInfo {
					node: idx,
					label: node.name.clone(),
					dummy: node.dummy,
					linked: model.link_target(idx).is_some(),
				},
			}));
		}

		for (_, edge) in model.edges() {
			if edge.source != edge.target {
				graph.add_edge(
					layout[edge.source.0 as usize],
					layout[edge.target.0 as usize],
					EdgeData::default(),
				);
			}
		}

		let mut state = Self {
			graph,
			model,
			highlight: HighlightResult::cleared(),
			settings,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
			highlight_t: 0.0,
			press: PressState::default(),
			focus: None,
			layout,
		};
		state.fit_all();
		state
	}

	/// Current world positions indexed by [`NodeIdx`].
	pub fn positions(&self) -> Vec<(f64, f64)> {
		let mut positions = vec![(0.0, 0.0); self.layout.len()];
		self.graph.visit_nodes(|node| {
			let idx = node.data.user_data.node.0 as usize;
			positions[idx] = (node.x() as f64, node.y() as f64);
		});
		positions
	}

	pub fn node_position(&self, idx: NodeIdx) -> Option<(f64, f64)> {
		let target = *self.layout.get(idx.0 as usize)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == target {
				found = Some((node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	/// Scales and centres the view on every visible node.
	pub fn fit_all(&mut self) {
		let visible: Vec<(f64, f64)> = self
			.positions()
			.into_iter()
			.zip(self.model.nodes())
			.filter(|(_, (_, node))| !node.dummy)
			.map(|(position, _)| position)
			.collect();
		if visible.is_empty() {
			return;
		}
		let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
		let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
		for &(x, y) in &visible {
			min_x = min_x.min(x);
			min_y = min_y.min(y);
			max_x = max_x.max(x);
			max_y = max_y.max(y);
		}
		let padding = HIT_RADIUS * 4.0;
		let k = (self.width / (max_x - min_x + padding))
			.min(self.height / (max_y - min_y + padding))
			.clamp(0.1, 10.0);
		self.transform = ViewTransform {
			x: self.width / 2.0 - (min_x + max_x) / 2.0 * k,
			y: self.height / 2.0 - (min_y + max_y) / 2.0 * k,
			k,
		};
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost visible node under a screen position. Dummy nodes are never hit.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.data.user_data.dummy {
				return;
			}
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.data.user_data.node);
			}
		});
		found
	}

	/// Faded nodes stay where they are until the selection is cleared.
	pub fn is_locked(&self, idx: NodeIdx) -> bool {
		self.highlight.is_node_faded(idx)
	}

	pub fn selected_name(&self) -> Option<String> {
		self.highlight
			.selected()
			.map(|idx| self.model.node(idx).name.clone())
	}

	pub fn select(&mut self, idx: NodeIdx) -> Result<(), HighlightError> {
		self.apply_selection(idx)?;
		self.focus_on(idx);
		Ok(())
	}

	/// Selects the real node with the given display name.
	pub fn select_by_name(&mut self, name: &str) -> Result<NodeIdx, HighlightError> {
		let idx = self
			.model
			.find_by_name(name)
			.ok_or_else(|| HighlightError::NotFound {
				id: name.to_string(),
			})?;
		self.select(idx)?;
		Ok(idx)
	}

	pub fn clear_selection(&mut self) {
		if self.highlight.is_active() {
			info!("selection cleared");
		}
		self.highlight = HighlightResult::cleared();
		self.highlight_t = 0.0;
		self.focus = None;
	}

	/// Changes the generation counts and recomputes the current selection.
	pub fn set_generations(&mut self, ancestors: Generations, descendants: Generations) {
		self.settings = HighlightSettings {
			ancestors,
			descendants,
		};
		if let Some(idx) = self.highlight.selected() {
			if let Err(err) = self.apply_selection(idx) {
				warn!("could not refresh highlight: {err}");
			}
		}
	}

	fn apply_selection(&mut self, idx: NodeIdx) -> Result<(), HighlightError> {
		let node = self.model.node(idx);
		let request = HighlightRequest::new(
			&node.id,
			self.settings.ancestors,
			self.settings.descendants,
		);
		let result = compute_highlight(&self.model, &request)?;
		info!(
			"selected '{}': {} nodes and {} edges highlighted",
			node.name,
			result.highlighted_nodes().len(),
			result.highlighted_edges().len()
		);
		self.highlight = result;
		self.highlight_t = 0.0;
		Ok(())
	}

	fn focus_on(&mut self, idx: NodeIdx) {
		let Some((x, y)) = self.node_position(idx) else {
			return;
		};
		let k = self.transform.k.max(FOCUS_ZOOM);
		self.focus = Some(ViewTransform {
			x: self.width / 2.0 - x * k,
			y: self.height / 2.0 - y * k,
			k,
		});
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		self.press = PressState {
			origin: Some((x, y)),
			moved: false,
		};
		match self.node_at_position(x, y) {
			Some(idx) if self.is_locked(idx) => {}
			Some(idx) => {
				let layout_idx = self.layout[idx.0 as usize];
				self.drag.active = true;
				self.drag.node_idx = Some(layout_idx);
				self.drag.start_x = x;
				self.drag.start_y = y;
				let drag = &mut self.drag;
				self.graph.visit_nodes(|node| {
					if node.index() == layout_idx {
						drag.node_start_x = node.x();
						drag.node_start_y = node.y();
					}
				});
			}
			None => {
				self.focus = None;
				self.pan.active = true;
				self.pan.start_x = x;
				self.pan.start_y = y;
				self.pan.transform_start_x = self.transform.x;
				self.pan.transform_start_y = self.transform.y;
			}
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if let Some((ox, oy)) = self.press.origin {
			if ((x - ox).powi(2) + (y - oy).powi(2)).sqrt() > CLICK_SLOP {
				self.press.moved = true;
			}
		}

		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				let (dx, dy) = (
					(x - self.drag.start_x) / self.transform.k,
					(y - self.drag.start_y) / self.transform.k,
				);
				let (nx, ny) = (
					self.drag.node_start_x + dx as f32,
					self.drag.node_start_y + dy as f32,
				);
				self.graph.visit_nodes_mut(|node| {
					if node.index() == idx {
						node.data.x = nx;
						node.data.y = ny;
						node.data.is_anchor = true;
					}
				});
			}
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	pub fn pointer_up(&mut self) {
		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				self.graph.visit_nodes_mut(|node| {
					if node.index() == idx {
						node.data.is_anchor = true;
					}
				});
			}
		}
		self.drag.active = false;
		self.drag.node_idx = None;
		self.pan.active = false;
	}

	/// Left click: select the node under the pointer, or clear the selection
	/// when the background was clicked.
	pub fn click(&mut self, x: f64, y: f64) -> ClickOutcome {
		let press = std::mem::take(&mut self.press);
		if press.moved {
			return ClickOutcome::Ignored;
		}
		match self.node_at_position(x, y) {
			Some(idx) => match self.select(idx) {
				Ok(()) => ClickOutcome::Selected(idx),
				Err(err) => {
					warn!("selection failed: {err}");
					ClickOutcome::Ignored
				}
			},
			None => {
				self.clear_selection();
				ClickOutcome::Cleared
			}
		}
	}

	/// Link of the node under the pointer, for right clicks.
	pub fn link_at_position(&self, x: f64, y: f64) -> Option<String> {
		let idx = self.node_at_position(x, y)?;
		self.model.link_target(idx).map(str::to_string)
	}

	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		self.focus = None;
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let target = if self.highlight.is_active() { 1.0 } else { 0.0 };
		self.highlight_t += (target - self.highlight_t) * (1.8 * dt as f64).min(1.0);

		if let Some(goal) = self.focus.clone() {
			let step = (FOCUS_SPEED * dt as f64).min(1.0);
			self.transform.x += (goal.x - self.transform.x) * step;
			self.transform.y += (goal.y - self.transform.y) * step;
			self.transform.k += (goal.k - self.transform.k) * step;
			if (goal.x - self.transform.x).abs() < 0.5
				&& (goal.y - self.transform.y).abs() < 0.5
				&& (goal.k - self.transform.k).abs() < 1e-3
			{
				self.transform = goal;
				self.focus = None;
			}
		}
	}

	pub fn is_focusing(&self) -> bool {
		self.focus.is_some()
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
