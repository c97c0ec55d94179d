use std::sync::Arc;

use leptos::prelude::*;
use log::{info, warn};

use crate::components::lineage_graph::{HighlightSettings, LineageGraphCanvas};
use crate::graph::{Generations, Graph, GraphError, Node};

/// Id of the `<script type="application/json">` element holding the graph.
const GRAPH_ELEMENT_ID: &str = "graph_elements";
/// Largest generation count offered by the selectors.
const GENERATION_CHOICES: u32 = 12;
const SAMPLE_LAYERS: usize = 7;

/// Layered sample lineage: articles depend on articles in earlier layers, and
/// dependencies that skip layers are routed through dummy nodes, one per
/// skipped layer.
fn sample_graph() -> Result<Graph, GraphError> {
	let mut builder = Graph::builder();
	let mut layers: Vec<Vec<(String, f64)>> = Vec::with_capacity(SAMPLE_LAYERS);
	let (mut article, mut dummies) = (0usize, 0usize);

	for layer in 0..SAMPLE_LAYERS {
		let width = 2 + layer % 3 + layer / 2;
		let mut row = Vec::with_capacity(width);
		for slot in 0..width {
			let id = format!("a{article}");
			let x = slot as f64 * 1.5 - (width as f64 - 1.0) * 0.75;
			let mut node = Node::article(&id)
				.with_name(format!("Article {article}"))
				.with_position(x, layer as f64);
			if article % 3 != 2 {
				node = node.with_href(format!("https://example.org/articles/{article}"));
			}
			builder.add_node(node);

			let mut dependencies: Vec<(usize, usize)> = Vec::new();
			if layer > 0 {
				for pick in 0..2 {
					let r = rand_simple(article * 2 + pick);
					if pick == 1 && r > 0.5 {
						continue;
					}
					let dep_layer = if r < 0.6 {
						layer - 1
					} else {
						(rand_simple(article * 7 + pick) * layer as f64) as usize
					};
					let dep_slot =
						(rand_simple(article * 13 + pick) * layers[dep_layer].len() as f64) as usize;
					if !dependencies.contains(&(dep_layer, dep_slot)) {
						dependencies.push((dep_layer, dep_slot));
					}
				}
			}

			for (dep_layer, dep_slot) in dependencies {
				let (dep_id, dep_x) = layers[dep_layer][dep_slot].clone();
				let mut from = id.clone();
				for level in (dep_layer + 1..layer).rev() {
					let dummy = format!("dummy{dummies}");
					dummies += 1;
					let t = (layer - level) as f64 / (layer - dep_layer) as f64;
					builder.add_node(
						Node::dummy(&dummy).with_position(x + (dep_x - x) * t, level as f64),
					);
					builder.add_edge(from, dummy.clone());
					from = dummy;
				}
				builder.add_edge(from, dep_id);
			}

			row.push((id, x));
			article += 1;
		}
		layers.push(row);
	}
	builder.build()
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn embedded_graph_json() -> Option<String> {
	web_sys::window()?
		.document()?
		.get_element_by_id(GRAPH_ELEMENT_ID)?
		.text_content()
}

/// Graph embedded in the host page, or the sample lineage when there is none.
fn load_graph() -> Result<Graph, GraphError> {
	match embedded_graph_json() {
		Some(json) => {
			let graph = Graph::from_json(&json)?;
			info!(
				"loaded {} nodes and {} edges from #{GRAPH_ELEMENT_ID}",
				graph.node_count(),
				graph.edge_count()
			);
			Ok(graph)
		}
		None => {
			info!("no #{GRAPH_ELEMENT_ID} element, showing the sample lineage");
			sample_graph()
		}
	}
}

fn reload() {
	if let Some(window) = web_sys::window() {
		let _ = window.location().reload();
	}
}

fn set_generations_from(target: RwSignal<Generations>, ev: &leptos::ev::Event) {
	match event_target_value(ev).parse::<Generations>() {
		Ok(generations) => target.set(generations),
		Err(err) => warn!("{err}"),
	}
}

fn generation_options(current: Generations) -> impl IntoView {
	(0..=GENERATION_CHOICES)
		.map(|n| {
			view! {
				<option value=n.to_string() selected={n == current.get()}>
					{n}
				</option>
			}
		})
		.collect_view()
}

/// Canvas plus the selection controls.
#[component]
fn LineageExplorer(graph: Arc<Graph>) -> impl IntoView {
	let defaults = HighlightSettings::default();
	let ancestors = RwSignal::new(defaults.ancestors);
	let descendants = RwSignal::new(defaults.descendants);
	let search = RwSignal::new(None::<String>);
	let selection = RwSignal::new(None::<String>);
	let query = RwSignal::new(String::new());
	let names = graph.article_names();

	view! {
		<div class="fullscreen-graph">
			<LineageGraphCanvas
				graph=graph
				ancestors=ancestors
				descendants=descendants
				search=search
				selection=selection
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Article Lineage"</h1>
				<p class="subtitle">
					"Click an article to highlight its ancestors and descendants. Right-click to open it. Click the background to reset."
				</p>
				<p class="select-article">
					{move || selection.get().map(|name| format!("SELECT: {name}")).unwrap_or_default()}
				</p>
				<label>
					"Ancestors "
					<select on:change=move |ev| set_generations_from(ancestors, &ev)>
						{generation_options(defaults.ancestors)}
					</select>
				</label>
				<label>
					"Descendants "
					<select on:change=move |ev| set_generations_from(descendants, &ev)>
						{generation_options(defaults.descendants)}
					</select>
				</label>
				<div class="search">
					<input
						type="text"
						list="article_list"
						placeholder="Article name"
						prop:value=move || query.get()
						on:input=move |ev| query.set(event_target_value(&ev))
					/>
					<datalist id="article_list">
						{names
							.into_iter()
							.map(|name| {
								let value = name.clone();
								view! { <option value=value>{name}</option> }
							})
							.collect_view()}
					</datalist>
					<button on:click=move |_| search.set(Some(query.get_untracked()))>"Search"</button>
					<button on:click=move |_| reload()>"Reload"</button>
				</div>
			</div>
		</div>
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph = load_graph().map(Arc::new);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{graph.map(|graph| view! { <LineageExplorer graph=graph /> })}
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;
	use crate::graph::{HighlightRequest, NodeIdx, compute_highlight};

	#[test]
	fn sample_graph_is_layered_with_linear_dummy_chains() {
		let graph = sample_graph().unwrap();
		let dummies: Vec<_> = graph.nodes().filter(|(_, node)| node.dummy).collect();
		assert!(!dummies.is_empty());
		for (idx, node) in dummies {
			assert_eq!(graph.outgoing(idx).len(), 1, "{}", node.id);
			assert_eq!(graph.incoming(idx).len(), 1, "{}", node.id);
		}
		for (idx, node) in graph.nodes() {
			let (_, y) = node.position.unwrap();
			if !node.dummy && y > 0.0 {
				assert!(!graph.outgoing(idx).is_empty(), "{} has no dependency", node.id);
			}
		}
	}

	#[test]
	fn sample_articles_are_searchable() {
		let graph = sample_graph().unwrap();
		let names = graph.article_names();
		assert!(names.contains(&"Article 0".to_string()));
		assert!(names.iter().all(|name| name.starts_with("Article ")));
	}

	#[test]
	fn one_generation_reaches_the_ends_of_dummy_chains() {
		let graph = sample_graph().unwrap();
		for (idx, node) in graph.nodes().filter(|(_, node)| !node.dummy) {
			let mut expected = BTreeSet::new();
			for &edge in graph.outgoing(idx) {
				let mut target = graph.edge(edge).target;
				while graph.node(target).dummy {
					target = graph.edge(graph.outgoing(target)[0]).target;
				}
				expected.insert(target);
			}

			let request = HighlightRequest::new(&node.id, Generations(1), Generations::NONE);
			let result = compute_highlight(&graph, &request).unwrap();
			let reached: BTreeSet<NodeIdx> = result
				.highlighted_nodes()
				.iter()
				.copied()
				.filter(|&n| n != idx && !graph.node(n).dummy)
				.collect();
			assert_eq!(reached, expected, "{}", node.id);
		}
	}
}
