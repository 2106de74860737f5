use crate::model::{Bounds, Point};
use crate::scan::{Annotation, AnnotationEcho, FileTree, ScanResult};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no scan cache for {0}; scan the file first")]
    MissingCache(PathBuf),
    #[error("unsupported file type: {0}")]
    Unsupported(PathBuf),
}

/// Request/response collaborators: the scanner and the annotation store.
pub trait Backend {
    fn scan(
        &mut self,
        path: &Path,
        project_root: Option<&Path>,
    ) -> Result<ScanResult, BackendError>;

    fn scan_folder(&mut self, path: &Path) -> Result<FileTree, BackendError>;

    /// Replace the whole annotation set of `path`.
    fn save_annotations(
        &mut self,
        path: &Path,
        annotations: &[Annotation],
        project_root: Option<&Path>,
    ) -> Result<AnnotationEcho, BackendError>;

    /// Append one annotation.
    fn add_annotation(
        &mut self,
        path: &Path,
        node_label: &str,
        text: &str,
        project_root: Option<&Path>,
    ) -> Result<AnnotationEcho, BackendError>;
}

/// Camera operations the rendering surface exposes.
pub trait Viewport {
    /// Show all of `bounds`, leaving `padding` (fraction of the view) free.
    fn fit_bounds(&mut self, bounds: Bounds, padding: f32, animate: bool);

    fn center_on(&mut self, point: Point, zoom: f32, animate: bool);
}
