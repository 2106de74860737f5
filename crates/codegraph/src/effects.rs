use crate::actions::Action;
use crate::backend::{Backend, Viewport};
use crate::scan::Annotation;
use crate::store::GraphStore;
use std::path::PathBuf;

/// Work deferred out of `actions::update`: collaborator calls and camera
/// moves. Results come back as actions.
#[derive(Debug, Clone)]
pub enum Effect {
    Scan {
        path: PathBuf,
        project_root: Option<PathBuf>,
    },
    /// Replace the persisted set with the full current projection
    SaveAnnotations {
        path: PathBuf,
        project_root: Option<PathBuf>,
        annotations: Vec<Annotation>,
    },
    AddAnnotation {
        path: PathBuf,
        project_root: Option<PathBuf>,
        node_label: String,
        text: String,
    },
    FitView,
    CenterOn {
        node_id: String,
    },
}

/// Execute an effect. The store is read, never written; follow-up actions
/// are returned for dispatch.
pub fn run(
    store: &GraphStore,
    backend: &mut dyn Backend,
    viewport: &mut dyn Viewport,
    effect: Effect,
) -> Vec<Action> {
    match effect {
        Effect::Scan { path, project_root } => {
            match backend.scan(&path, project_root.as_deref()) {
                Ok(scan) => vec![Action::ScanLoaded {
                    path,
                    project_root,
                    scan,
                }],
                Err(e) => {
                    log::warn!("scan of {} failed: {e}", path.display());
                    vec![Action::ScanFailed {
                        path,
                        message: e.to_string(),
                    }]
                }
            }
        }
        Effect::SaveAnnotations {
            path,
            project_root,
            annotations,
        } => {
            let result = backend.save_annotations(
                &path,
                &annotations,
                project_root.as_deref(),
            );
            match result {
                Ok(echo) => vec![Action::AnnotationsSaved {
                    comments: echo.comments,
                }],
                Err(e) => {
                    log::warn!("saving annotations failed: {e}");
                    vec![Action::SaveFailed {
                        message: format!("Could not save annotations: {e}"),
                    }]
                }
            }
        }
        Effect::AddAnnotation {
            path,
            project_root,
            node_label,
            text,
        } => {
            let result = backend.add_annotation(
                &path,
                &node_label,
                &text,
                project_root.as_deref(),
            );
            match result {
                Ok(echo) => vec![Action::AnnotationsSaved {
                    comments: echo.comments,
                }],
                Err(e) => {
                    log::warn!("adding annotation to {node_label:?} failed: {e}");
                    vec![Action::SaveFailed {
                        message: format!("Could not add annotation: {e}"),
                    }]
                }
            }
        }
        Effect::FitView => {
            if let Some(bounds) = store.bounds() {
                viewport.fit_bounds(bounds, store.layout_settings.fit_padding, true);
            }
            vec![]
        }
        Effect::CenterOn { node_id } => {
            match store.node(&node_id) {
                Some(node) => viewport.center_on(
                    node.center(),
                    store.layout_settings.focus_zoom,
                    true,
                ),
                None => log::debug!("cannot centre on missing node {node_id:?}"),
            }
            vec![]
        }
    }
}
