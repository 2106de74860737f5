//! Left-to-right layered layout.
//!
//! The phases are the usual ones for layered drawing:
//!   1. cycle breaking (DFS back edges are reversed),
//!   2. ranking (longest path, then sources pulled toward their successors),
//!   3. virtual nodes on edges spanning more than one rank,
//!   4. ordering within ranks (median sweeps, best crossing count kept),
//!   5. coordinates (rank -> x, order -> y, ranks centred vertically).
//!
//! Every phase iterates in store order, so identical input gives identical
//! positions.

use crate::model::{GraphEdge, GraphNode, Point, Size};
use crate::settings::LayoutSettings;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Recompute positions of `nodes` in place. Ids, count and edges are
/// untouched.
pub fn apply_layout(
    nodes: &mut [GraphNode],
    edges: &[GraphEdge],
    settings: &LayoutSettings,
) {
    let positions = compute_positions(nodes, edges, settings);
    for (node, position) in nodes.iter_mut().zip(positions) {
        node.position = position;
    }
}

/// Top-left position for each node, in the order of `nodes`.
pub fn compute_positions(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    settings: &LayoutSettings,
) -> Vec<Point> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let sizes: Vec<Size> = nodes.iter().map(GraphNode::footprint).collect();
    let dag = acyclic_graph(nodes, edges);
    let ranks = assign_ranks(&dag);
    let mut layered = LayeredGraph::new(&dag, &ranks);
    layered.minimize_crossings(settings.ordering_passes);
    let centers = layered.centers(&sizes, settings);

    log::debug!(
        "layout: {} nodes over {} ranks, {} crossings",
        nodes.len(),
        layered.layers.len(),
        layered.total_crossings()
    );

    centers
        .into_iter()
        .zip(&sizes)
        .map(|(c, size)| {
            Point::new(c.x - size.width / 2.0, c.y - size.height / 2.0)
        })
        .collect()
}

// ── Phase 1: cycle breaking ──────────────────────────────────────────

/// Directed graph over node indices with every cycle broken.
fn acyclic_graph(nodes: &[GraphNode], edges: &[GraphEdge]) -> DiGraph<(), ()> {
    let index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut graph: DiGraph<(), ()> =
        DiGraph::with_capacity(nodes.len(), edges.len());
    for _ in nodes {
        graph.add_node(());
    }

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for edge in edges {
        let (Some(&u), Some(&v)) =
            (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        else {
            continue;
        };
        if u != v && seen.insert((u, v)) {
            pairs.push((u, v));
            graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }
    }

    let mut back_edges = HashSet::new();
    depth_first_search(&graph, graph.node_indices(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back_edges.insert((u.index(), v.index()));
        }
    });

    let mut dag: DiGraph<(), ()> =
        DiGraph::with_capacity(nodes.len(), pairs.len());
    for _ in nodes {
        dag.add_node(());
    }
    let mut dag_pairs = HashSet::new();
    for (u, v) in pairs {
        let (u, v) = if back_edges.contains(&(u, v)) { (v, u) } else { (u, v) };
        if dag_pairs.insert((u, v)) {
            dag.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }
    }
    dag
}

// ── Phase 2: ranking ─────────────────────────────────────────────────

fn assign_ranks(dag: &DiGraph<(), ()>) -> Vec<usize> {
    let n = dag.node_count();
    let order: Vec<NodeIndex> = match toposort(dag, None) {
        Ok(order) => order,
        // Unreachable after cycle breaking; fall back to store order.
        Err(_) => dag.node_indices().collect(),
    };

    let mut ranks = vec![0usize; n];
    for &u in &order {
        for v in dag.neighbors_directed(u, Direction::Outgoing) {
            ranks[v.index()] = ranks[v.index()].max(ranks[u.index()] + 1);
        }
    }

    // Pull each source next to its nearest successor to shorten edges.
    for &u in order.iter().rev() {
        let has_preds = dag
            .neighbors_directed(u, Direction::Incoming)
            .next()
            .is_some();
        if has_preds {
            continue;
        }
        if let Some(nearest) = dag
            .neighbors_directed(u, Direction::Outgoing)
            .map(|v| ranks[v.index()])
            .min()
        {
            ranks[u.index()] = nearest.saturating_sub(1);
        }
    }

    let lowest = ranks.iter().copied().min().unwrap_or(0);
    for rank in &mut ranks {
        *rank -= lowest;
    }
    ranks
}

// ── Phases 3-5: layered graph ────────────────────────────────────────

/// Real nodes keep their store index; virtual nodes follow them.
struct LayeredGraph {
    real_count: usize,
    rank_of: Vec<usize>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
    layers: Vec<Vec<usize>>,
}

impl LayeredGraph {
    fn new(dag: &DiGraph<(), ()>, ranks: &[usize]) -> Self {
        let real_count = ranks.len();
        let mut graph = Self {
            real_count,
            rank_of: ranks.to_vec(),
            preds: vec![Vec::new(); real_count],
            succs: vec![Vec::new(); real_count],
            layers: Vec::new(),
        };

        let mut dag_edges: Vec<(usize, usize)> = dag
            .edge_indices()
            .filter_map(|e| dag.edge_endpoints(e))
            .map(|(u, v)| (u.index(), v.index()))
            .collect();
        dag_edges.sort_unstable();

        for (u, v) in dag_edges {
            let mut prev = u;
            for rank in ranks[u] + 1..ranks[v] {
                let dummy = graph.add_virtual(rank);
                graph.link(prev, dummy);
                prev = dummy;
            }
            graph.link(prev, v);
        }

        let depth = graph.rank_of.iter().copied().max().map_or(0, |r| r + 1);
        graph.layers = vec![Vec::new(); depth];
        for (vertex, &rank) in graph.rank_of.iter().enumerate() {
            graph.layers[rank].push(vertex);
        }
        graph
    }

    fn add_virtual(&mut self, rank: usize) -> usize {
        self.rank_of.push(rank);
        self.preds.push(Vec::new());
        self.succs.push(Vec::new());
        self.rank_of.len() - 1
    }

    fn link(&mut self, u: usize, v: usize) {
        self.succs[u].push(v);
        self.preds[v].push(u);
    }

    fn positions(&self) -> Vec<usize> {
        let mut pos = vec![0usize; self.rank_of.len()];
        for layer in &self.layers {
            for (i, &v) in layer.iter().enumerate() {
                pos[v] = i;
            }
        }
        pos
    }

    /// Reorder `layers[r]` by the median position of each vertex's
    /// neighbours in the adjacent, already-fixed layer.
    fn median_sweep(&mut self, r: usize, downward: bool) {
        let pos = self.positions();
        let mut keyed: Vec<(f64, usize, usize)> = self.layers[r]
            .iter()
            .enumerate()
            .map(|(current, &v)| {
                let neighbours =
                    if downward { &self.preds[v] } else { &self.succs[v] };
                let key = median(neighbours.iter().map(|&u| pos[u]))
                    .unwrap_or(current as f64);
                (key, current, v)
            })
            .collect();
        // Ties keep the current relative order.
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        self.layers[r] = keyed.into_iter().map(|(_, _, v)| v).collect();
    }

    fn crossings_between(&self, r: usize, pos: &[usize]) -> usize {
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for &u in &self.layers[r] {
            for &v in &self.succs[u] {
                segments.push((pos[u], pos[v]));
            }
        }
        let mut crossings = 0;
        for i in 0..segments.len() {
            for j in i + 1..segments.len() {
                let (a1, b1) = segments[i];
                let (a2, b2) = segments[j];
                if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                    crossings += 1;
                }
            }
        }
        crossings
    }

    fn total_crossings(&self) -> usize {
        let pos = self.positions();
        (0..self.layers.len().saturating_sub(1))
            .map(|r| self.crossings_between(r, &pos))
            .sum()
    }

    fn minimize_crossings(&mut self, passes: usize) {
        if self.layers.len() <= 1 {
            return;
        }
        let mut best = self.layers.clone();
        let mut best_crossings = self.total_crossings();

        for _ in 0..passes {
            if best_crossings == 0 {
                break;
            }
            for r in 1..self.layers.len() {
                self.median_sweep(r, true);
            }
            for r in (0..self.layers.len() - 1).rev() {
                self.median_sweep(r, false);
            }
            let crossings = self.total_crossings();
            if crossings < best_crossings {
                best_crossings = crossings;
                best = self.layers.clone();
            }
        }
        self.layers = best;
    }

    /// Centre of each real node.
    fn centers(&self, sizes: &[Size], settings: &LayoutSettings) -> Vec<Point> {
        let size_of = |v: usize| {
            if v < self.real_count {
                sizes[v]
            } else {
                Size::new(0.0, 0.0)
            }
        };

        let rank_widths: Vec<f32> = self
            .layers
            .iter()
            .map(|layer| {
                layer.iter().map(|&v| size_of(v).width).fold(0.0, f32::max)
            })
            .collect();
        let rank_heights: Vec<f32> = self
            .layers
            .iter()
            .map(|layer| {
                let total: f32 = layer.iter().map(|&v| size_of(v).height).sum();
                let gaps = layer.len().saturating_sub(1) as f32;
                total + gaps * settings.node_separation
            })
            .collect();
        let tallest = rank_heights.iter().copied().fold(0.0, f32::max);

        let mut centers = vec![Point::default(); self.real_count];
        let mut x = settings.margin;
        for (r, layer) in self.layers.iter().enumerate() {
            let center_x = x + rank_widths[r] / 2.0;
            let mut y = settings.margin + (tallest - rank_heights[r]) / 2.0;
            for &v in layer {
                let size = size_of(v);
                if v < self.real_count {
                    centers[v] = Point::new(center_x, y + size.height / 2.0);
                }
                y += size.height + settings.node_separation;
            }
            x += rank_widths[r] + settings.rank_separation;
        }
        centers
    }
}

fn median(values: impl Iterator<Item = usize>) -> Option<f64> {
    let mut values: Vec<usize> = values.collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 1 {
        values[mid] as f64
    } else {
        (values[mid - 1] + values[mid]) as f64 / 2.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, NodeKind, COMMENT_NODE_SIZE};

    fn node(id: &str, kind: NodeKind) -> GraphNode {
        GraphNode::new(id, kind, id, Point::new(-1.0, -1.0))
    }

    fn edge(kind: EdgeKind, s: &str, t: &str) -> GraphEdge {
        GraphEdge::between(kind, s, t)
    }

    fn sample() -> (Vec<GraphNode>, Vec<GraphEdge>) {
        let nodes = vec![
            node("file", NodeKind::File),
            node("A", NodeKind::Class),
            node("A.run", NodeKind::Method),
            node("main", NodeKind::Function),
            node("note", NodeKind::Comment),
        ];
        let edges = vec![
            edge(EdgeKind::Containment, "file", "A"),
            edge(EdgeKind::Containment, "A", "A.run"),
            edge(EdgeKind::Reference, "file", "main"),
            edge(EdgeKind::CallDependency, "main", "A.run"),
            edge(EdgeKind::AnnotationLink, "A", "note"),
        ];
        (nodes, edges)
    }

    fn by_id<'a>(nodes: &'a [GraphNode], id: &str) -> &'a GraphNode {
        nodes.iter().find(|n| n.id == id).unwrap()
    }

    #[test]
    fn layout_keeps_ids_and_edges() {
        let (mut nodes, edges) = sample();
        let ids_before: Vec<_> = nodes.iter().map(|n| n.id.clone()).collect();
        let edges_before = edges.clone();
        apply_layout(&mut nodes, &edges, &LayoutSettings::default());
        let ids_after: Vec<_> = nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids_before, ids_after);
        assert_eq!(edges_before, edges);
    }

    #[test]
    fn layout_is_deterministic() {
        let (nodes, edges) = sample();
        let settings = LayoutSettings::default();
        assert_eq!(
            compute_positions(&nodes, &edges, &settings),
            compute_positions(&nodes, &edges, &settings)
        );
    }

    #[test]
    fn edges_point_left_to_right() {
        let (mut nodes, edges) = sample();
        apply_layout(&mut nodes, &edges, &LayoutSettings::default());
        for e in &edges {
            let s = by_id(&nodes, &e.source).center();
            let t = by_id(&nodes, &e.target).center();
            assert!(s.x < t.x, "{} should be left of {}", e.source, e.target);
        }
    }

    #[test]
    fn first_rank_starts_at_margin() {
        let (mut nodes, edges) = sample();
        let settings = LayoutSettings::default();
        apply_layout(&mut nodes, &edges, &settings);
        let file = by_id(&nodes, "file");
        assert_eq!(file.position.x, settings.margin);
        // Next rank is one code-node width plus ranksep further right.
        let class = by_id(&nodes, "A");
        assert_eq!(class.position.x, settings.margin + 150.0 + 100.0);
    }

    #[test]
    fn comment_nodes_are_centred_with_their_default_footprint() {
        let (mut nodes, edges) = sample();
        apply_layout(&mut nodes, &edges, &LayoutSettings::default());
        let note = by_id(&nodes, "note");
        let a = by_id(&nodes, "A");
        // Same rank as A.run; the rank is as wide as the comment.
        let run = by_id(&nodes, "A.run");
        assert_eq!(note.center().x, run.center().x);
        assert!(note.position.x < run.position.x);
        assert_eq!(note.footprint(), COMMENT_NODE_SIZE);
        assert!(a.center().x < note.center().x);
    }

    #[test]
    fn cycles_and_self_loops_still_lay_out() {
        let nodes = vec![
            node("a", NodeKind::Function),
            node("b", NodeKind::Function),
            node("c", NodeKind::Function),
        ];
        let edges = vec![
            edge(EdgeKind::CallDependency, "a", "b"),
            edge(EdgeKind::CallDependency, "b", "c"),
            edge(EdgeKind::CallDependency, "c", "a"),
            edge(EdgeKind::CallDependency, "b", "b"),
        ];
        let positions =
            compute_positions(&nodes, &edges, &LayoutSettings::default());
        assert_eq!(positions.len(), 3);
        let xs: HashSet<i64> = positions.iter().map(|p| p.x as i64).collect();
        assert_eq!(xs.len(), 3, "a cycle of three spreads over three ranks");
    }

    #[test]
    fn isolated_nodes_and_dangling_edges_are_tolerated() {
        let nodes = vec![node("solo", NodeKind::Comment), node("x", NodeKind::Class)];
        let edges = vec![edge(EdgeKind::Containment, "x", "ghost")];
        let positions =
            compute_positions(&nodes, &edges, &LayoutSettings::default());
        assert_eq!(positions.len(), 2);
        assert!(positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn median_sweeps_remove_a_simple_crossing() {
        // a -> d and b -> c drawn in store order cross once.
        let nodes = vec![
            node("a", NodeKind::Function),
            node("b", NodeKind::Function),
            node("c", NodeKind::Function),
            node("d", NodeKind::Function),
        ];
        let edges = vec![
            edge(EdgeKind::CallDependency, "a", "d"),
            edge(EdgeKind::CallDependency, "b", "c"),
        ];
        let dag = acyclic_graph(&nodes, &edges);
        let ranks = assign_ranks(&dag);
        let mut layered = LayeredGraph::new(&dag, &ranks);
        assert_eq!(layered.total_crossings(), 1);
        layered.minimize_crossings(4);
        assert_eq!(layered.total_crossings(), 0);
    }

    #[test]
    fn long_edges_get_virtual_nodes() {
        let nodes = vec![
            node("a", NodeKind::Function),
            node("b", NodeKind::Function),
            node("c", NodeKind::Function),
        ];
        let edges = vec![
            edge(EdgeKind::CallDependency, "a", "b"),
            edge(EdgeKind::CallDependency, "b", "c"),
            edge(EdgeKind::CallDependency, "a", "c"),
        ];
        let dag = acyclic_graph(&nodes, &edges);
        let ranks = assign_ranks(&dag);
        assert_eq!(ranks, vec![0, 1, 2]);
        let layered = LayeredGraph::new(&dag, &ranks);
        assert_eq!(layered.rank_of.len(), 4);
        assert_eq!(layered.layers[1].len(), 2);
    }

    #[test]
    fn sources_are_pulled_toward_their_successors() {
        // x only feeds c, which sits at rank 2; x should land on rank 1.
        let nodes = vec![
            node("a", NodeKind::Function),
            node("b", NodeKind::Function),
            node("c", NodeKind::Function),
            node("x", NodeKind::Function),
        ];
        let edges = vec![
            edge(EdgeKind::CallDependency, "a", "b"),
            edge(EdgeKind::CallDependency, "b", "c"),
            edge(EdgeKind::CallDependency, "x", "c"),
        ];
        let ranks = assign_ranks(&acyclic_graph(&nodes, &edges));
        assert_eq!(ranks, vec![0, 1, 2, 1]);
    }
}
