use crate::annotations::{self, AnnotationEdit};
use crate::builder::build_graph;
use crate::effects::Effect;
use crate::gesture::{FiredGesture, Gesture};
use crate::layout::apply_layout;
use crate::model::{Point, Size};
use crate::scan::{Annotation, ScanResult};
use crate::search::NavKey;
use crate::settings::BuilderSettings;
use crate::store::{GraphStore, SourceView};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Actions that can be dispatched to modify the store
#[derive(Debug, Clone)]
pub enum Action {
    // Loading
    /// Ask the scanner for a file
    OpenFile {
        path: PathBuf,
        project_root: Option<PathBuf>,
    },
    /// Scan the file currently shown again
    Rescan,
    /// Scanner answered; replaces the graph
    ScanLoaded {
        path: PathBuf,
        project_root: Option<PathBuf>,
        scan: ScanResult,
    },
    /// Scanner failed; the current graph stays
    ScanFailed { path: PathBuf, message: String },
    /// Rebuild the graph from a scan result
    Rebuild {
        scan: ScanResult,
        display_name: String,
        spacing: f32,
    },

    // Layout
    /// Recompute every position ("clean workspace")
    CleanWorkspace,
    /// Footprints measured by the surface
    NodesMeasured { sizes: Vec<(String, Size)> },
    /// Node dragged to a new place
    MoveNode { id: String, position: Point },

    // Pointer and timers
    NodeClicked { id: String, at: Instant },
    /// Native double clicks are ignored; the gesture counter decides
    NativeDoubleClick { id: String },
    CanvasClicked,
    Tick { now: Instant },

    // Search
    SetQuery { query: String },
    KeyPressed { key: NavKey },

    // Annotations
    /// Right click on a code node
    CreateAnnotation { parent_id: String },
    /// Blur of the text/title editor or a tag pick
    CommitAnnotation { id: String, edit: AnnotationEdit },
    DeleteAnnotation { id: String },
    /// Single-step comment with text, saved through the append call
    QuickAnnotate { parent_id: String, text: String },
    /// Canonical list echoed after a write
    AnnotationsSaved { comments: Vec<Annotation> },
    SaveFailed { message: String },

    // UI State
    SetAutoUpdate { enabled: bool },
    SetSpacing { spacing: f32 },
    CloseSourceView,
    ClearNotification,
}

/// Apply a single action to the store
pub fn update(store: &mut GraphStore, action: Action) -> Vec<Effect> {
    match action {
        // Loading
        Action::OpenFile { path, project_root } => {
            vec![Effect::Scan { path, project_root }]
        }
        Action::Rescan => match &store.source_path {
            Some(path) => vec![Effect::Scan {
                path: path.clone(),
                project_root: store.project_root.clone(),
            }],
            None => vec![],
        },
        Action::ScanLoaded {
            path,
            project_root,
            scan,
        } => {
            let display_name = display_name_of(&path);
            store.source_path = Some(path);
            store.project_root = project_root;
            rebuild(store, &scan, display_name);
            vec![Effect::FitView]
        }
        Action::ScanFailed { path, message } => {
            store.notification =
                Some(format!("Could not scan {}: {message}", path.display()));
            vec![]
        }
        Action::Rebuild {
            scan,
            display_name,
            spacing,
        } => {
            store.builder_settings = BuilderSettings::new(spacing);
            rebuild(store, &scan, display_name);
            vec![Effect::FitView]
        }

        // Layout
        Action::CleanWorkspace => {
            let settings = store.layout_settings;
            let (nodes, edges) = store.split_mut();
            apply_layout(nodes, edges, &settings);
            vec![Effect::FitView]
        }
        Action::NodesMeasured { sizes } => {
            for (id, size) in sizes {
                if let Some(node) = store.node_mut(&id) {
                    node.size = Some(size);
                }
            }
            vec![]
        }
        Action::MoveNode { id, position } => {
            if let Some(node) = store.node_mut(&id) {
                node.position = position;
            }
            vec![]
        }

        // Pointer and timers
        Action::NodeClicked { id, at } => {
            let counts = store.node(&id).is_some_and(|n| !n.kind.is_comment());
            if counts {
                if let Some(fired) = store.gesture.click(&id, at) {
                    fire_gesture(store, fired);
                }
            }
            vec![]
        }
        Action::NativeDoubleClick { .. } => vec![],
        Action::CanvasClicked => {
            store.active_signature = None;
            store.highlighted.clear();
            vec![]
        }
        Action::Tick { now } => {
            if let Some(fired) = store.gesture.poll(now) {
                fire_gesture(store, fired);
            }
            vec![]
        }

        // Search
        Action::SetQuery { query } => {
            store.search.set_query(query);
            vec![]
        }
        Action::KeyPressed { key } => navigate(store, key),

        // Annotations
        Action::CreateAnnotation { parent_id } => {
            if annotations::create(store, &parent_id).is_none() {
                log::debug!("cannot annotate {parent_id:?}");
            }
            vec![]
        }
        Action::CommitAnnotation { id, edit } => {
            if annotations::apply_edit(store, &id, edit) {
                save_all(store)
            } else {
                vec![]
            }
        }
        Action::DeleteAnnotation { id } => {
            if annotations::delete(store, &id) {
                save_all(store)
            } else {
                vec![]
            }
        }
        Action::QuickAnnotate { parent_id, text } => {
            let Some(record) = annotations::quick_add(store, &parent_id, &text)
            else {
                return vec![];
            };
            match &store.source_path {
                Some(path) => vec![Effect::AddAnnotation {
                    path: path.clone(),
                    project_root: store.project_root.clone(),
                    node_label: record.node_label,
                    text: record.text,
                }],
                None => vec![],
            }
        }
        Action::AnnotationsSaved { comments } => {
            store.saved_annotations = comments;
            vec![]
        }
        Action::SaveFailed { message } => {
            store.notification = Some(message);
            vec![]
        }

        // UI State
        Action::SetAutoUpdate { enabled } => {
            store.auto_update = enabled;
            vec![]
        }
        Action::SetSpacing { spacing } => {
            store.builder_settings = BuilderSettings::new(spacing);
            vec![]
        }
        Action::CloseSourceView => {
            store.source_view = None;
            vec![]
        }
        Action::ClearNotification => {
            store.notification = None;
            vec![]
        }
    }
}

fn display_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn rebuild(store: &mut GraphStore, scan: &ScanResult, display_name: String) {
    let graph = build_graph(scan, &display_name, &store.builder_settings);
    store.display_name = display_name;
    store.replace_graph(graph);
    annotations::restore(store, &scan.comments);
    store.saved_annotations = scan.comments.clone();
}

/// Project every comment node and schedule one full-list save.
fn save_all(store: &GraphStore) -> Vec<Effect> {
    match &store.source_path {
        Some(path) => vec![Effect::SaveAnnotations {
            path: path.clone(),
            project_root: store.project_root.clone(),
            annotations: annotations::project(store),
        }],
        None => {
            log::debug!("no file loaded; annotations kept in memory only");
            vec![]
        }
    }
}

fn fire_gesture(store: &mut GraphStore, fired: FiredGesture) {
    let Some(node) = store.node(&fired.node_id) else {
        return;
    };
    match fired.gesture {
        Gesture::Single => {
            store.active_signature = node.metadata.signature.clone();
        }
        Gesture::Double => {
            if let Some(code) = &node.metadata.source_code {
                store.source_view = Some(SourceView {
                    label: node.label.clone(),
                    code: code.clone(),
                });
            }
        }
        Gesture::Triple => {
            store.highlighted = store.one_hop_component(&fired.node_id);
        }
    }
}

fn navigate(store: &mut GraphStore, key: NavKey) -> Vec<Effect> {
    if key == NavKey::Escape {
        store.search.clear();
        store.active_signature = None;
        store.highlighted.clear();
        store.source_view = None;
        return vec![];
    }

    let count = store.search.matches(store.nodes()).len();
    let moved = match key {
        NavKey::Down | NavKey::Enter => store.search.advance(count),
        NavKey::Up => store.search.retreat(count),
        NavKey::Escape => None,
    };
    if moved.is_none() {
        return vec![];
    }
    match store.search.current_match(store.nodes()) {
        Some(id) => vec![Effect::CenterOn {
            node_id: id.to_string(),
        }],
        None => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Tag};
    use crate::scan::{ClassDetail, MethodDetail};
    use std::time::Duration;

    fn scan() -> ScanResult {
        ScanResult {
            functions: vec!["main".into()],
            class_details: vec![ClassDetail {
                name: "Foo".into(),
                methods: vec![MethodDetail {
                    name: "run".into(),
                    signature: Some("def run(self)".into()),
                }],
            }],
            sources: [("Foo.run".to_string(), "def run(self):\n    pass".to_string())]
                .into_iter()
                .collect(),
            ..ScanResult::default()
        }
    }

    fn loaded_store() -> GraphStore {
        let mut store = GraphStore::default();
        update(
            &mut store,
            Action::ScanLoaded {
                path: PathBuf::from("/p/foo.py"),
                project_root: Some(PathBuf::from("/p")),
                scan: scan(),
            },
        );
        store
    }

    fn click_n(store: &mut GraphStore, id: &str, n: u64) -> Instant {
        let t0 = Instant::now();
        for i in 0..n {
            update(
                store,
                Action::NodeClicked {
                    id: id.into(),
                    at: t0 + Duration::from_millis(i * 100),
                },
            );
        }
        let end = t0 + Duration::from_millis((n - 1) * 100 + 400);
        update(store, Action::Tick { now: end });
        end
    }

    #[test]
    fn scan_loaded_sets_file_and_fits_view() {
        let mut store = GraphStore::default();
        let effects = update(
            &mut store,
            Action::ScanLoaded {
                path: PathBuf::from("/p/foo.py"),
                project_root: None,
                scan: scan(),
            },
        );
        assert!(matches!(effects.as_slice(), [Effect::FitView]));
        assert_eq!(store.display_name, "foo.py");
        assert_eq!(store.nodes()[0].id, "file:foo.py");
    }

    #[test]
    fn scan_failure_keeps_the_previous_graph() {
        let mut store = loaded_store();
        let before = store.nodes().to_vec();
        update(
            &mut store,
            Action::ScanFailed {
                path: PathBuf::from("/p/other.py"),
                message: "boom".into(),
            },
        );
        assert_eq!(store.nodes(), before.as_slice());
        assert!(store.notification.as_deref().unwrap().contains("boom"));
    }

    #[test]
    fn one_click_shows_the_signature() {
        let mut store = loaded_store();
        click_n(&mut store, "method:Foo.run", 1);
        assert_eq!(store.active_signature.as_deref(), Some("def run(self)"));
        assert!(store.source_view.is_none());
        assert!(store.highlighted.is_empty());
    }

    #[test]
    fn a_late_click_fires_the_sequence_it_outlived() {
        let mut store = loaded_store();
        let t0 = Instant::now();
        update(
            &mut store,
            Action::NodeClicked {
                id: "method:Foo.run".into(),
                at: t0,
            },
        );
        // No tick ran before the next click arrived.
        update(
            &mut store,
            Action::NodeClicked {
                id: "function:main".into(),
                at: t0 + Duration::from_millis(500),
            },
        );
        assert_eq!(store.active_signature.as_deref(), Some("def run(self)"));
        assert_eq!(store.gesture.count(), 1);

        update(
            &mut store,
            Action::Tick {
                now: t0 + Duration::from_millis(900),
            },
        );
        assert_eq!(store.active_signature, None);
        assert!(store.source_view.is_none());
    }

    #[test]
    fn one_click_on_a_node_without_signature_clears_it() {
        let mut store = loaded_store();
        store.active_signature = Some("stale".into());
        click_n(&mut store, "function:main", 1);
        assert_eq!(store.active_signature, None);
    }

    #[test]
    fn two_clicks_open_the_source() {
        let mut store = loaded_store();
        click_n(&mut store, "method:Foo.run", 2);
        let view = store.source_view.clone().unwrap();
        assert_eq!(view.label, "run");
        assert!(view.code.starts_with("def run"));
        assert_eq!(store.active_signature, None);

        // No source text: nothing opens.
        update(&mut store, Action::CloseSourceView);
        click_n(&mut store, "function:main", 2);
        assert!(store.source_view.is_none());
    }

    #[test]
    fn three_clicks_highlight_only() {
        let mut store = loaded_store();
        click_n(&mut store, "class:Foo", 3);
        assert!(store.active_signature.is_none());
        assert!(store.source_view.is_none());
        let mut ids: Vec<_> = store.highlighted.iter().cloned().collect();
        ids.sort();
        assert_eq!(ids, vec!["class:Foo", "file:foo.py", "method:Foo.run"]);
    }

    #[test]
    fn comment_clicks_do_not_count() {
        let mut store = loaded_store();
        update(
            &mut store,
            Action::CreateAnnotation {
                parent_id: "class:Foo".into(),
            },
        );
        let comment = store
            .nodes()
            .iter()
            .find(|n| n.kind == NodeKind::Comment)
            .unwrap()
            .id
            .clone();
        update(
            &mut store,
            Action::NodeClicked {
                id: comment,
                at: Instant::now(),
            },
        );
        assert_eq!(store.gesture.count(), 0);
    }

    #[test]
    fn canvas_click_clears_signature_and_component() {
        let mut store = loaded_store();
        click_n(&mut store, "class:Foo", 3);
        store.active_signature = Some("x".into());
        update(&mut store, Action::CanvasClicked);
        assert!(store.highlighted.is_empty());
        assert!(store.active_signature.is_none());
    }

    #[test]
    fn native_double_click_is_ignored() {
        let mut store = loaded_store();
        let effects = update(
            &mut store,
            Action::NativeDoubleClick {
                id: "method:Foo.run".into(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(store.gesture.count(), 0);
        assert!(store.source_view.is_none());
    }

    #[test]
    fn escape_resets_everything_transient() {
        let mut store = loaded_store();
        click_n(&mut store, "method:Foo.run", 2);
        store.highlighted.insert("class:Foo".into());
        store.active_signature = Some("sig".into());
        update(&mut store, Action::SetQuery { query: "run".into() });
        update(&mut store, Action::KeyPressed { key: NavKey::Escape });
        assert!(!store.search.is_active());
        assert!(store.highlighted.is_empty());
        assert!(store.active_signature.is_none());
        assert!(store.source_view.is_none());
    }

    #[test]
    fn navigation_centres_on_the_new_match() {
        let mut store = loaded_store();
        update(&mut store, Action::SetQuery { query: "o".into() });
        // foo.py, Foo match; run and main do not.
        let effects = update(&mut store, Action::KeyPressed { key: NavKey::Down });
        assert!(matches!(
            effects.as_slice(),
            [Effect::CenterOn { node_id }] if node_id == "class:Foo"
        ));
        let effects = update(&mut store, Action::KeyPressed { key: NavKey::Enter });
        assert!(matches!(
            effects.as_slice(),
            [Effect::CenterOn { node_id }] if node_id == "file:foo.py"
        ));
        update(&mut store, Action::SetQuery { query: "zzz".into() });
        assert!(update(&mut store, Action::KeyPressed { key: NavKey::Up }).is_empty());
    }

    #[test]
    fn commits_schedule_a_full_list_save() {
        let mut store = loaded_store();
        update(
            &mut store,
            Action::CreateAnnotation {
                parent_id: "class:Foo".into(),
            },
        );
        let id = store.nodes().last().unwrap().id.clone();
        let effects = update(
            &mut store,
            Action::CommitAnnotation {
                id,
                edit: AnnotationEdit::Tag(Tag::Todo),
            },
        );
        match effects.as_slice() {
            [Effect::SaveAnnotations {
                path, annotations, ..
            }] => {
                assert_eq!(path, &PathBuf::from("/p/foo.py"));
                assert_eq!(annotations.len(), 1);
                assert_eq!(annotations[0].tag, Tag::Todo);
                assert_eq!(annotations[0].node_label, "Foo");
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn creating_does_not_persist() {
        let mut store = loaded_store();
        let effects = update(
            &mut store,
            Action::CreateAnnotation {
                parent_id: "class:Foo".into(),
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn clean_workspace_moves_nodes_and_fits() {
        let mut store = loaded_store();
        let ids: Vec<_> = store.nodes().iter().map(|n| n.id.clone()).collect();
        let edge_count = store.edges().len();
        let effects = update(&mut store, Action::CleanWorkspace);
        assert!(matches!(effects.as_slice(), [Effect::FitView]));
        let after: Vec<_> = store.nodes().iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids, after);
        assert_eq!(store.edges().len(), edge_count);
        assert_eq!(store.nodes()[0].position.x, store.layout_settings.margin);
    }

    #[test]
    fn rebuild_uses_the_given_spacing() {
        let mut store = GraphStore::default();
        update(
            &mut store,
            Action::Rebuild {
                scan: ScanResult {
                    functions: vec!["a".into(), "b".into()],
                    ..ScanResult::default()
                },
                display_name: "x.py".into(),
                spacing: 10.0,
            },
        );
        let a = store.node("function:a").unwrap().position.y;
        let b = store.node("function:b").unwrap().position.y;
        assert_eq!(b - a, 60.0);
    }
}
