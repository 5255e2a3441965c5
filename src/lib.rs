pub mod config;
pub mod ir;
pub mod layout;

pub use config::{BackendConfig, Direction, LayoutConfig};
pub use ir::{Anchor, CurveStyle, Edge, EdgePath, Node, Point, Side, Waypoint};
pub use layout::backend::{Backend, EngineError, LayoutEngine};
pub use layout::error::LayoutError;
pub use layout::{LayoutRequest, LayoutService, LayoutUpdate};
