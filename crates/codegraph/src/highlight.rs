use crate::store::GraphStore;

pub const FULL_OPACITY: f32 = 1.0;
/// Nodes outside a highlighted component.
pub const COMPONENT_DIMMED_OPACITY: f32 = 0.1;
/// Nodes that do not match an active search.
pub const SEARCH_DIMMED_OPACITY: f32 = 0.25;

/// Which overlay rule is in force. Earlier variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    Component,
    Search,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    /// Member of the highlighted component.
    Component,
    CurrentMatch,
    Match,
    Dimmed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeOverlay {
    pub emphasis: Emphasis,
    pub opacity: f32,
}

impl NodeOverlay {
    const PLAIN: Self = Self {
        emphasis: Emphasis::None,
        opacity: FULL_OPACITY,
    };
}

pub fn overlay_mode(store: &GraphStore) -> OverlayMode {
    if !store.highlighted.is_empty() {
        OverlayMode::Component
    } else if store.search.is_active() {
        OverlayMode::Search
    } else {
        OverlayMode::Plain
    }
}

/// Styling for every node, parallel to `store.nodes()`.
pub fn node_overlays(store: &GraphStore) -> Vec<NodeOverlay> {
    let nodes = store.nodes();
    match overlay_mode(store) {
        OverlayMode::Component => nodes
            .iter()
            .map(|n| {
                if store.highlighted.contains(&n.id) {
                    NodeOverlay {
                        emphasis: Emphasis::Component,
                        opacity: FULL_OPACITY,
                    }
                } else {
                    NodeOverlay {
                        emphasis: Emphasis::Dimmed,
                        opacity: COMPONENT_DIMMED_OPACITY,
                    }
                }
            })
            .collect(),
        OverlayMode::Search => {
            let matches = store.search.matches(nodes);
            let current = store
                .search
                .current_index(matches.len())
                .map(|i| matches[i]);
            nodes
                .iter()
                .map(|n| {
                    if current == Some(n.id.as_str()) {
                        NodeOverlay {
                            emphasis: Emphasis::CurrentMatch,
                            opacity: FULL_OPACITY,
                        }
                    } else if matches.contains(&n.id.as_str()) {
                        NodeOverlay {
                            emphasis: Emphasis::Match,
                            opacity: FULL_OPACITY,
                        }
                    } else {
                        NodeOverlay {
                            emphasis: Emphasis::Dimmed,
                            opacity: SEARCH_DIMMED_OPACITY,
                        }
                    }
                })
                .collect()
        }
        OverlayMode::Plain => vec![NodeOverlay::PLAIN; nodes.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphNode, NodeKind, Point};

    fn store() -> GraphStore {
        let mut store = GraphStore::default();
        for id in ["alpha", "beta", "alphabet"] {
            store.add_node(GraphNode::new(id, NodeKind::Function, id, Point::default()));
        }
        store
    }

    #[test]
    fn no_overlay_without_search_or_component() {
        let store = store();
        assert_eq!(overlay_mode(&store), OverlayMode::Plain);
        assert!(node_overlays(&store)
            .iter()
            .all(|o| o.emphasis == Emphasis::None && o.opacity == FULL_OPACITY));
    }

    #[test]
    fn search_ranks_current_match_above_other_matches() {
        let mut store = store();
        store.search.set_query("ALPHA");
        let overlays = node_overlays(&store);
        assert_eq!(overlays[0].emphasis, Emphasis::CurrentMatch);
        assert_eq!(overlays[1].emphasis, Emphasis::Dimmed);
        assert_eq!(overlays[1].opacity, SEARCH_DIMMED_OPACITY);
        assert_eq!(overlays[2].emphasis, Emphasis::Match);
    }

    #[test]
    fn highlighted_component_overrides_search() {
        let mut store = store();
        store.search.set_query("alpha");
        store.highlighted.insert("beta".into());
        assert_eq!(overlay_mode(&store), OverlayMode::Component);
        let overlays = node_overlays(&store);
        assert_eq!(overlays[1].emphasis, Emphasis::Component);
        assert_eq!(overlays[0].opacity, COMPONENT_DIMMED_OPACITY);
        assert_eq!(overlays[2].emphasis, Emphasis::Dimmed);
    }
}
