use crate::model::{EdgeKind, GraphEdge, GraphNode, NodeKind, Point};
use crate::scan::ScanResult;
use crate::settings::BuilderSettings;
use std::collections::HashSet;

// ------------------------------------------------------------------
// Default placement
// ------------------------------------------------------------------

pub const FILE_ANCHOR: Point = Point::new(50.0, 50.0);
const TOP_Y: f32 = 50.0;
const CLASS_COLUMN_X: f32 = 300.0;
const METHOD_COLUMN_X: f32 = 550.0;
const FUNCTION_COLUMN_X: f32 = 850.0;
const MIN_CLASS_ADVANCE: f32 = 100.0;

/// Nodes and edges produced from one scan result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Turn a scan result into the initial graph.
///
/// The output is a pure function of `scan`, `display_name` and
/// `settings`: ids are derived from kinds and names only, so a rebuild
/// from the same scan produces the same ids and positions.
pub fn build_graph(
    scan: &ScanResult,
    display_name: &str,
    settings: &BuilderSettings,
) -> BuiltGraph {
    let pitch = settings.vertical_pitch();
    let mut ids = IdAllocator::default();
    let mut graph = BuiltGraph::default();
    // Qualified name of each node, parallel to `graph.nodes`.
    let mut qualified: Vec<String> = Vec::new();

    let file_id = ids.unique(format!("file:{display_name}"));
    graph.nodes.push(GraphNode::new(
        file_id.clone(),
        NodeKind::File,
        display_name,
        FILE_ANCHOR,
    ));
    qualified.push(display_name.to_string());

    let mut class_y = TOP_Y;
    for class in scan.all_classes() {
        let class_id = ids.unique(format!("class:{}", class.name));
        let mut class_node = GraphNode::new(
            class_id.clone(),
            NodeKind::Class,
            class.name.clone(),
            Point::new(CLASS_COLUMN_X, class_y),
        );
        class_node.metadata.signature =
            scan.signatures.get(&class.name).cloned();
        class_node.metadata.source_code =
            scan.sources.get(&class.name).cloned();
        graph.nodes.push(class_node);
        qualified.push(class.name.clone());
        graph.edges.push(GraphEdge::between(
            EdgeKind::Containment,
            file_id.clone(),
            class_id.clone(),
        ));

        for (i, method) in class.methods.iter().enumerate() {
            let full_name = format!("{}.{}", class.name, method.name);
            let method_id = ids.unique(format!("method:{full_name}"));
            let mut method_node = GraphNode::new(
                method_id.clone(),
                NodeKind::Method,
                method.name.clone(),
                Point::new(METHOD_COLUMN_X, class_y + i as f32 * pitch),
            );
            method_node.metadata.signature = method
                .signature
                .clone()
                .or_else(|| scan.signatures.get(&full_name).cloned())
                .or_else(|| scan.signatures.get(&method.name).cloned());
            method_node.metadata.source_code = scan
                .sources
                .get(&full_name)
                .or_else(|| scan.sources.get(&method.name))
                .cloned();
            graph.nodes.push(method_node);
            qualified.push(full_name);
            graph.edges.push(GraphEdge::between(
                EdgeKind::Containment,
                class_id.clone(),
                method_id,
            ));
        }

        let stack_height = class.methods.len() as f32 * pitch;
        class_y += stack_height.max(MIN_CLASS_ADVANCE);
    }

    for (i, name) in scan.functions.iter().enumerate() {
        let function_id = ids.unique(format!("function:{name}"));
        let mut node = GraphNode::new(
            function_id.clone(),
            NodeKind::Function,
            name.clone(),
            Point::new(FUNCTION_COLUMN_X, TOP_Y + i as f32 * pitch),
        );
        node.metadata.signature = scan.signatures.get(name).cloned();
        node.metadata.source_code = scan.sources.get(name).cloned();
        graph.nodes.push(node);
        qualified.push(name.clone());
        graph.edges.push(GraphEdge::between(
            EdgeKind::Reference,
            file_id.clone(),
            function_id,
        ));
    }

    let resolver = Resolver {
        nodes: &graph.nodes,
        qualified: &qualified,
    };
    let mut edge_ids: HashSet<String> =
        graph.edges.iter().map(|e| e.id.clone()).collect();
    let mut call_edges = Vec::new();
    for (caller, callees) in &scan.dependencies {
        let Some(caller_id) = resolver.resolve(caller) else {
            log::trace!("dropping calls from unresolved caller {caller:?}");
            continue;
        };
        for callee in callees {
            let Some(callee_id) = resolver.resolve(callee) else {
                log::trace!("dropping call {caller:?} -> {callee:?}");
                continue;
            };
            if callee_id == caller_id {
                continue;
            }
            let edge = GraphEdge::between(
                EdgeKind::CallDependency,
                caller_id,
                callee_id,
            );
            if edge_ids.insert(edge.id.clone()) {
                call_edges.push(edge);
            }
        }
    }
    graph.edges.extend(call_edges);

    log::debug!(
        "built graph for {display_name}: {} nodes, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    graph
}

#[derive(Default)]
struct IdAllocator {
    taken: HashSet<String>,
}

impl IdAllocator {
    /// `base`, or `base#n` for the n-th repeat.
    fn unique(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}#{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Matches scanner identifiers (bare or dotted) against emitted nodes.
struct Resolver<'a> {
    nodes: &'a [GraphNode],
    qualified: &'a [String],
}

impl<'a> Resolver<'a> {
    fn candidates(&self) -> impl Iterator<Item = (&'a GraphNode, &'a str)> {
        self.nodes
            .iter()
            .zip(self.qualified.iter().map(String::as_str))
            .filter(|(node, _)| {
                !matches!(node.kind, NodeKind::File | NodeKind::Comment)
            })
    }

    fn resolve(&self, key: &str) -> Option<&'a str> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let dotted_suffix = format!(".{key}");
        let last_segment = key.rsplit('.').next().unwrap_or(key);

        self.candidates()
            .find(|(node, _)| node.id == key)
            .or_else(|| self.candidates().find(|(_, q)| *q == key))
            .or_else(|| self.candidates().find(|(node, _)| node.label == key))
            .or_else(|| {
                self.candidates().find(|(_, q)| q.ends_with(&dotted_suffix))
            })
            .or_else(|| {
                self.candidates()
                    .find(|(node, _)| node.label == last_segment)
            })
            .map(|(node, _)| node.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{ClassDetail, MethodDetail};
    use std::collections::{BTreeMap, BTreeSet};

    fn deps(pairs: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
        pairs
            .iter()
            .map(|(caller, callees)| {
                (
                    caller.to_string(),
                    callees.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect()
    }

    fn sample_scan() -> ScanResult {
        ScanResult {
            functions: vec!["main".into(), "helper".into()],
            class_details: vec![
                ClassDetail {
                    name: "Parser".into(),
                    methods: vec![
                        MethodDetail {
                            name: "parse".into(),
                            signature: Some("def parse(self, text)".into()),
                        },
                        MethodDetail {
                            name: "reset".into(),
                            signature: None,
                        },
                    ],
                },
                ClassDetail {
                    name: "Empty".into(),
                    methods: vec![],
                },
            ],
            dependencies: deps(&[
                ("main", &["Parser.parse", "helper", "missing"]),
                ("parse", &["reset"]),
            ]),
            signatures: [("main".to_string(), "def main()".to_string())]
                .into_iter()
                .collect(),
            ..ScanResult::default()
        }
    }

    fn call_pairs(graph: &BuiltGraph) -> Vec<(String, String)> {
        graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::CallDependency)
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect()
    }

    #[test]
    fn rebuilding_is_deterministic() {
        let scan = sample_scan();
        let settings = BuilderSettings::new(30.0);
        let a = build_graph(&scan, "demo.py", &settings);
        let b = build_graph(&scan, "demo.py", &settings);
        assert_eq!(a, b);
    }

    #[test]
    fn methods_stack_with_spacing_pitch() {
        let graph =
            build_graph(&sample_scan(), "demo.py", &BuilderSettings::new(30.0));
        let parse = graph
            .nodes
            .iter()
            .find(|n| n.id == "method:Parser.parse")
            .unwrap();
        let reset = graph
            .nodes
            .iter()
            .find(|n| n.id == "method:Parser.reset")
            .unwrap();
        assert_eq!(reset.position.y - parse.position.y, 80.0);
        assert_eq!(parse.metadata.signature.as_deref(), Some("def parse(self, text)"));

        // Two methods at pitch 80 occupy 160 > 100, so the next class
        // starts 160 below the first.
        let parser = graph.nodes.iter().find(|n| n.id == "class:Parser").unwrap();
        let empty = graph.nodes.iter().find(|n| n.id == "class:Empty").unwrap();
        assert_eq!(empty.position.y - parser.position.y, 160.0);
    }

    #[test]
    fn structural_edges_link_file_classes_and_functions() {
        let graph =
            build_graph(&sample_scan(), "demo.py", &BuilderSettings::default());
        let file_id = "file:demo.py";
        assert_eq!(graph.nodes[0].id, file_id);
        assert_eq!(graph.nodes[0].kind, NodeKind::File);
        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::Containment
            && e.source == file_id
            && e.target == "class:Parser"));
        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::Containment
            && e.source == "class:Parser"
            && e.target == "method:Parser.reset"));
        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::Reference
            && e.target == "function:helper"));
        let main = graph.nodes.iter().find(|n| n.id == "function:main").unwrap();
        assert_eq!(main.metadata.signature.as_deref(), Some("def main()"));
    }

    #[test]
    fn dependencies_resolve_by_label_and_dotted_name() {
        let graph =
            build_graph(&sample_scan(), "demo.py", &BuilderSettings::default());
        let calls = call_pairs(&graph);
        assert!(calls.contains(&(
            "function:main".into(),
            "method:Parser.parse".into()
        )));
        assert!(calls.contains(&("function:main".into(), "function:helper".into())));
        assert!(calls.contains(&(
            "method:Parser.parse".into(),
            "method:Parser.reset".into()
        )));
        // "missing" resolves nowhere and is dropped.
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn self_calls_are_dropped() {
        let scan = ScanResult {
            functions: vec!["foo".into()],
            dependencies: deps(&[("foo", &["foo"])]),
            ..ScanResult::default()
        };
        let graph = build_graph(&scan, "f.py", &BuilderSettings::default());
        assert!(call_pairs(&graph).is_empty());
    }

    #[test]
    fn duplicate_names_get_distinct_ids() {
        let scan = ScanResult {
            functions: vec!["dup".into(), "dup".into()],
            ..ScanResult::default()
        };
        let graph = build_graph(&scan, "f.py", &BuilderSettings::default());
        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["file:f.py", "function:dup", "function:dup#2"]);
        let edge_ids: HashSet<_> = graph.edges.iter().map(|e| &e.id).collect();
        assert_eq!(edge_ids.len(), graph.edges.len());
    }

    #[test]
    fn empty_scan_yields_only_the_file_node() {
        let graph = build_graph(
            &ScanResult::default(),
            "empty.m",
            &BuilderSettings::default(),
        );
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes[0].position, FILE_ANCHOR);
    }
}
