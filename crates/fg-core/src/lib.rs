pub mod component;
pub mod config;
pub mod emitter;
pub mod geometry;
pub mod id;
pub mod model;
pub mod parser;
pub mod sanitize;
pub mod snapshot;
pub mod style;

pub use component::{ComponentMarkup, PlacedComponent, default_name};
pub use config::CanvasConfig;
pub use emitter::{KEY_ATTRIBUTE, SELECTED_ATTRIBUTE, emit_children, emit_markup, emit_markup_keyed};
pub use geometry::{Frame, ResizeDirection, SizeBounds, drag, resize};
pub use id::{ComponentId, ElementKey};
pub use model::*;
pub use parser::parse_fragment;
pub use sanitize::{SanitizePolicy, SanitizeReport, clean_tree, sanitize, sanitize_tree, sanitize_with};
pub use snapshot::SnapshotError;

// Re-export petgraph and kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Size, Vec2};
pub use petgraph::graph::NodeIndex;
