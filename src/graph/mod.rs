//! Article graph model and the highlight engine. Nothing in here touches the
//! browser.

mod error;
mod highlight;
mod model;
mod transport;

pub use error::{GraphError, HighlightError};
pub use highlight::{
	Direction, GenerationTag, Generations, HighlightRequest, HighlightResult, MAX_TIER, NodeState,
	compute_highlight,
};
pub use model::{Edge, EdgeId, EdgeOrientation, Graph, GraphBuilder, Node, NodeIdx};
pub use transport::{EdgeRecord, Elements, GraphDocument, Groups, NodeRecord};
