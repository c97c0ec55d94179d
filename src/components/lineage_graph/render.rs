use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{LineageGraphState, NODE_RADIUS};
use crate::graph::{Direction, GenerationTag, NodeState};

const LINKED_COLOR: &str = "#e23b3b";
const UNLINKED_COLOR: &str = "#a9a9a9";
const SELECTED_COLOR: &str = "#fff100";
const FADED_COLOR: &str = "#808080";

const ANCESTOR_TIERS: [&str; 10] = [
	"#fcc800", "#f39800", "#eb6100", "#e60012", "#ff4477", "#ff6699", "#cc4499", "#be0081",
	"#920783", "#601986",
];
const DESCENDANT_TIERS: [&str; 10] = [
	"#cfdb00", "#8fc31f", "#22ac38", "#009944", "#009b6b", "#009e96", "#00a0c1", "#00a0e9",
	"#0086d1", "#0068b7",
];

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn tier_color(tag: GenerationTag) -> &'static str {
	let tiers = match tag.direction {
		Direction::Ancestor => &ANCESTOR_TIERS,
		Direction::Descendant => &DESCENDANT_TIERS,
	};
	tiers[usize::from(tag.generation).min(tiers.len() - 1)]
}

pub fn render(state: &LineageGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	let positions = state.positions();
	draw_edges(state, &positions, ctx);
	draw_nodes(state, &positions, ctx);
	ctx.restore();
}

fn draw_edges(state: &LineageGraphState, positions: &[(f64, f64)], ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.highlight_t);
	let active = state.highlight.is_active();

	for (id, edge) in state.model.edges() {
		let ((x1, y1), (x2, y2)) = (
			positions[edge.source.0 as usize],
			positions[edge.target.0 as usize],
		);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		// Dummy endpoints are invisible, so the line runs into their centre.
		let source_gap = if state.model.node(edge.source).dummy { 0.0 } else { NODE_RADIUS };
		let into_dummy = state.model.node(edge.target).dummy;
		let target_gap = if into_dummy { 0.0 } else { NODE_RADIUS };
		let highlighted = state.highlight.is_edge_highlighted(id);

		// t=0: every edge at base (0.3); t=1: highlighted at 1.0, faded at 0.12
		let (edge_alpha, width) = if !active {
			(0.3, line_width)
		} else if highlighted {
			(0.3 + 0.7 * t, line_width * (1.0 + 1.5 * t))
		} else {
			(0.3 - 0.18 * t, line_width)
		};
		let color = if highlighted { "0, 200, 90" } else { "100, 180, 255" };

		ctx.set_stroke_style_str(&format!("rgba({}, {})", color, edge_alpha));
		ctx.set_line_width(width);
		if highlighted {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let tip_room = if into_dummy { 0.0 } else { arrow_size };
		ctx.begin_path();
		ctx.move_to(x1 + ux * source_gap, y1 + uy * source_gap);
		ctx.line_to(
			x2 - ux * (target_gap + tip_room),
			y2 - uy * (target_gap + tip_room),
		);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		if into_dummy {
			continue;
		}
		ctx.set_fill_style_str(&format!("rgba({}, {})", color, (edge_alpha + 0.2).min(1.0)));
		let (tip_x, tip_y) = (x2 - ux * target_gap, y2 - uy * target_gap);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(state: &LineageGraphState, positions: &[(f64, f64)], ctx: &CanvasRenderingContext2d) {
	let (t, k) = (ease_out_cubic(state.highlight_t), state.transform.k);

	// Faded and default nodes first so the highlighted lineage is drawn on top.
	for pass_highlighted in [false, true] {
		for (idx, node) in state.model.nodes() {
			if node.dummy {
				continue;
			}
			let node_state = state.highlight.node_state(idx);
			let is_highlighted = matches!(
				node_state,
				NodeState::Selected | NodeState::Highlighted(_)
			);
			if is_highlighted != pass_highlighted {
				continue;
			}

			let base = if state.model.link_target(idx).is_some() {
				LINKED_COLOR
			} else {
				UNLINKED_COLOR
			};
			let (color, alpha, radius) = match node_state {
				NodeState::Default => (base, 1.0, NODE_RADIUS),
				NodeState::Faded => (FADED_COLOR, 1.0 - 0.6 * t, NODE_RADIUS),
				NodeState::Selected => (SELECTED_COLOR, 1.0, NODE_RADIUS * (1.0 + 0.8 * t)),
				NodeState::Highlighted(tag) => (
					tag.map(tier_color).unwrap_or(base),
					1.0,
					NODE_RADIUS * (1.0 + 0.5 * t),
				),
			};
			let (x, y) = positions[idx.0 as usize];

			if node_state == NodeState::Selected && t > 0.01 {
				let gradient = ctx
					.create_radial_gradient(x, y, radius * 0.3, x, y, radius * 2.5)
					.ok();
				if let Some(gradient) = gradient {
					let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 241, 0, {})", 0.4 * t));
					let _ = gradient.add_color_stop(1.0, "rgba(255, 241, 0, 0)");
					ctx.begin_path();
					let _ = ctx.arc(x, y, radius * 2.5, 0.0, 2.0 * PI);
					#[allow(deprecated)]
					ctx.set_fill_style(&gradient);
					ctx.fill();
				}
			}

			ctx.set_global_alpha(alpha);
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
			ctx.set_fill_style_str(color);
			ctx.fill();
			ctx.set_global_alpha(1.0);

			let font = if is_highlighted { 13.0 } else { 10.0 };
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.9));
			ctx.set_font(&format!("{}px sans-serif", font / k.max(0.5)));
			let _ = ctx.fill_text(&node.name, x + radius + 3.0, y + 3.0);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tiers_follow_direction_and_generation() {
		let tag = |direction, generation| GenerationTag {
			direction,
			generation,
		};
		assert_eq!(tier_color(tag(Direction::Ancestor, 0)), "#fcc800");
		assert_eq!(tier_color(tag(Direction::Descendant, 9)), "#0068b7");
		assert_eq!(tier_color(tag(Direction::Descendant, 200)), "#0068b7");
	}
}
