mod parser;
mod render;
mod types;

pub use parser::{DiagramFormat, load_diagram, parse_diagram, parse_text};
pub use render::{
    DiagramStyle, OverlayPlacement, RenderedDiagram, render_at_width, render_diagram,
    render_overlay,
};
pub use types::{Cardinality, Diagram, EntityBox, Relationship, Unresolved};
