use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::{ClickOutcome, HighlightSettings, LineageGraphState};
use crate::graph::{Generations, Graph};

type SharedState = Rc<RefCell<Option<LineageGraphState>>>;

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> (f64, f64) {
	let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Opens `href` in a new window, or navigates there when popups are blocked.
fn open_link(href: &str) {
	let Some(window) = web_sys::window() else {
		return;
	};
	match window.open_with_url(href) {
		Ok(Some(_)) => {}
		_ => {
			if let Err(err) = window.location().set_href(href) {
				warn!("could not open {href}: {err:?}");
			}
		}
	}
}

fn viewport_size(window: &Window) -> (f64, f64) {
	let dimension = |value: Result<JsValue, JsValue>, fallback: f64| {
		value.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		dimension(window.inner_width(), 800.0),
		dimension(window.inner_height(), 600.0),
	)
}

/// Client size of the canvas' parent, 800x600 when detached.
fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((800.0, 600.0))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn alert(message: &str) {
	if let Some(window) = web_sys::window() {
		let _ = window.alert_with_message(message);
	}
}

/// Canvas view of an article graph. Clicking a node highlights its lineage
/// with the current generation counts; clicking the background resets it.
///
/// `search` carries article names to select; it is reset to `None` once
/// handled. `selection` reports the name of the selected article.
#[component]
pub fn LineageGraphCanvas(
	graph: Arc<Graph>,
	#[prop(into)] ancestors: Signal<Generations>,
	#[prop(into)] descendants: Signal<Generations>,
	search: RwSignal<Option<String>>,
	selection: RwSignal<Option<String>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = match (fullscreen, width, height) {
			(true, _, _) => viewport_size(&window),
			(false, w, h) => {
				let (pw, ph) = parent_size(&canvas);
				(w.unwrap_or(pw), h.unwrap_or(ph))
			}
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context_2d(&canvas) else {
			warn!("canvas has no 2d context");
			return;
		};
		let settings = HighlightSettings {
			ancestors: ancestors.get_untracked(),
			descendants: descendants.get_untracked(),
		};
		info!(
			"rendering {} nodes and {} edges",
			graph.node_count(),
			graph.edge_count()
		);
		*state_init.borrow_mut() = Some(LineageGraphState::new(graph.clone(), settings, w, h));

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = viewport_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &ctx);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Generation counts apply to the current selection as well as the next one.
	let state_gen = state.clone();
	Effect::new(move |_| {
		let (a, d) = (ancestors.get(), descendants.get());
		let name = match *state_gen.borrow_mut() {
			Some(ref mut s) => {
				s.set_generations(a, d);
				s.selected_name()
			}
			None => return,
		};
		selection.set(name);
	});

	let state_search = state.clone();
	Effect::new(move |_| {
		let Some(name) = search.get() else {
			return;
		};
		let outcome = state_search
			.borrow_mut()
			.as_mut()
			.map(|s| s.select_by_name(&name));
		match outcome {
			Some(Ok(_)) => selection.set(Some(name)),
			Some(Err(err)) => {
				warn!("search failed: {err}");
				alert(&format!(
					"ERROR: Don't have '{name}' node. Please select existing nodes."
				));
			}
			None => {}
		}
		search.set(None);
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = local_point(canvas_ref, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = local_point(canvas_ref, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_click = state.clone();
	let on_click = move |ev: MouseEvent| {
		let (x, y) = local_point(canvas_ref, &ev);
		let outcome = match *state_click.borrow_mut() {
			Some(ref mut s) => match s.click(x, y) {
				ClickOutcome::Ignored => return,
				ClickOutcome::Selected(_) | ClickOutcome::Cleared => s.selected_name(),
			},
			None => return,
		};
		selection.set(outcome);
	};

	let state_ctx = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		let (x, y) = local_point(canvas_ref, &ev);
		let link = state_ctx
			.borrow()
			.as_ref()
			.and_then(|s| s.link_at_position(x, y));
		if let Some(href) = link {
			ev.prevent_default();
			open_link(&href);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let (x, y) = local_point(canvas_ref, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom_at(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="lineage-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:contextmenu=on_contextmenu
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
