pub mod actions;
pub mod annotations;
pub mod backend;
pub mod builder;
pub mod effects;
pub mod gesture;
pub mod highlight;
pub mod layout;
pub mod model;
pub mod scan;
pub mod search;
pub mod settings;
pub mod state;
pub mod store;

pub use actions::Action;
pub use annotations::AnnotationEdit;
pub use backend::{Backend, BackendError, Viewport};
pub use builder::{build_graph, BuiltGraph};
pub use effects::Effect;
pub use layout::apply_layout;
pub use model::{
    Bounds, EdgeKind, GraphEdge, GraphNode, NodeKind, Point, Size, Tag,
};
pub use scan::{Annotation, AnnotationEcho, FileTree, ScanResult};
pub use search::NavKey;
pub use settings::{BuilderSettings, LayoutSettings};
pub use state::State;
pub use store::GraphStore;
