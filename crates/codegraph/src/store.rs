use crate::builder::BuiltGraph;
use crate::gesture::ClickGesture;
use crate::model::{bounds_of, Bounds, EdgeKind, GraphEdge, GraphNode};
use crate::scan::Annotation;
use crate::search::SearchState;
use crate::settings::{BuilderSettings, LayoutSettings};
use std::collections::HashSet;
use std::path::PathBuf;

/// Source text shown in the modal opened by a double click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceView {
    pub label: String,
    pub code: String,
}

/// The one mutable graph store. Only `actions::update` writes to it.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,

    // File being shown
    pub source_path: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
    pub display_name: String,

    // Interaction
    pub gesture: ClickGesture,
    pub search: SearchState,
    pub highlighted: HashSet<String>,
    pub active_signature: Option<String>,
    pub source_view: Option<SourceView>,

    // Persistence
    /// Last canonical annotation list echoed by the collaborator.
    pub saved_annotations: Vec<Annotation>,
    pub notification: Option<String>,
    pub auto_update: bool,

    pub builder_settings: BuilderSettings,
    pub layout_settings: LayoutSettings,

    comment_seq: u64,
}

impl GraphStore {
    pub fn new(
        builder_settings: BuilderSettings,
        layout_settings: LayoutSettings,
    ) -> Self {
        Self {
            builder_settings,
            layout_settings,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Node slice for in-place position updates. Ids and count cannot be
    /// changed through a slice.
    pub fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    /// Nodes and edges at once, for the layout pass.
    pub fn split_mut(&mut self) -> (&mut [GraphNode], &[GraphEdge]) {
        (&mut self.nodes, &self.edges)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Replace the whole graph and drop interaction state that referred to
    /// the old one.
    pub fn replace_graph(&mut self, graph: BuiltGraph) {
        self.nodes = graph.nodes;
        self.edges = graph.edges;
        self.comment_seq = 0;
        self.gesture = ClickGesture::Idle;
        self.highlighted.clear();
        self.active_signature = None;
        self.source_view = None;
    }

    /// Insert a node; refused when the id is taken.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Insert an edge; refused when an endpoint is missing, the id is
    /// taken, or it would be a call from a node to itself.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if !self.contains(&edge.source) || !self.contains(&edge.target) {
            return false;
        }
        if edge.kind == EdgeKind::CallDependency && edge.source == edge.target {
            return false;
        }
        if self.edges.iter().any(|e| e.id == edge.id) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);
        self.edges.retain(|e| !e.touches(id));
        self.highlighted.remove(id);
        Some(node)
    }

    /// The node plus everything one edge away, in either direction.
    pub fn one_hop_component(&self, id: &str) -> HashSet<String> {
        let mut component = HashSet::new();
        if !self.contains(id) {
            return component;
        }
        component.insert(id.to_string());
        for edge in &self.edges {
            if edge.source == id {
                component.insert(edge.target.clone());
            } else if edge.target == id {
                component.insert(edge.source.clone());
            }
        }
        component
    }

    pub fn bounds(&self) -> Option<Bounds> {
        bounds_of(&self.nodes)
    }

    /// Fresh id for a comment node.
    pub fn next_comment_id(&mut self) -> String {
        loop {
            self.comment_seq += 1;
            let id = format!("comment:{}", self.comment_seq);
            if !self.contains(&id) {
                return id;
            }
        }
    }
}
