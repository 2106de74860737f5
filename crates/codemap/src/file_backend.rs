use codegraph::scan::EntryKind;
use codegraph::{
    Annotation, AnnotationEcho, Backend, BackendError, FileTree, ScanResult,
};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the project root where the scanner leaves its caches.
pub const CACHE_DIR: &str = ".codemap";

const SUPPORTED_EXTENSIONS: &[&str] = &["py", "m", "cpp", "h"];
const IGNORED_ENTRIES: &[&str] =
    &[".git", "node_modules", "__pycache__", ".DS_Store", "venv", ".next"];

/// Backend over the JSON scan caches written by the external scanner.
///
/// One cache per source file, at `<root>/.codemap/jsonScript<STEM>.json`.
/// Annotations live under the cache's `comments` key; every other key is
/// the scanner's and is written back untouched.
#[derive(Debug, Clone, Default)]
pub struct JsonFileBackend {
    default_root: Option<PathBuf>,
}

impl JsonFileBackend {
    pub fn new(default_root: Option<PathBuf>) -> Self {
        Self { default_root }
    }

    /// Cache location for `file`. Without a root, the file's own directory
    /// is used.
    pub fn cache_path(&self, file: &Path, project_root: Option<&Path>) -> PathBuf {
        let root = project_root
            .map(Path::to_path_buf)
            .or_else(|| self.default_root.clone())
            .or_else(|| file.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_default();
        root.join(CACHE_DIR).join(format!("jsonScript{stem}.json"))
    }

    fn read_cache(
        &self,
        file: &Path,
        project_root: Option<&Path>,
    ) -> Result<(PathBuf, Map<String, Value>), BackendError> {
        let cache = self.cache_path(file, project_root);
        if !cache.exists() {
            return Err(BackendError::MissingCache(file.to_path_buf()));
        }
        let text = fs::read_to_string(&cache).map_err(|source| BackendError::Io {
            path: cache.clone(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&text).map_err(|source| BackendError::Json {
                path: cache.clone(),
                source,
            })?;
        match value {
            Value::Object(map) => Ok((cache, map)),
            _ => {
                log::warn!("{} is not a JSON object, treating as empty", cache.display());
                Ok((cache, Map::new()))
            }
        }
    }

    fn write_cache(
        cache: &Path,
        data: Map<String, Value>,
    ) -> Result<AnnotationEcho, BackendError> {
        let value = Value::Object(data);
        let text = serde_json::to_string_pretty(&value).map_err(|source| {
            BackendError::Json {
                path: cache.to_path_buf(),
                source,
            }
        })?;
        fs::write(cache, text).map_err(|source| BackendError::Io {
            path: cache.to_path_buf(),
            source,
        })?;
        serde_json::from_value(value).map_err(|source| BackendError::Json {
            path: cache.to_path_buf(),
            source,
        })
    }
}

impl Backend for JsonFileBackend {
    fn scan(
        &mut self,
        path: &Path,
        project_root: Option<&Path>,
    ) -> Result<ScanResult, BackendError> {
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext));
        if !supported {
            return Err(BackendError::Unsupported(path.to_path_buf()));
        }
        let (cache, data) = self.read_cache(path, project_root)?;
        let scan: ScanResult = serde_json::from_value(Value::Object(data))
            .map_err(|source| BackendError::Json {
                path: cache.clone(),
                source,
            })?;
        log::debug!(
            "loaded {} ({} functions, {} comments)",
            cache.display(),
            scan.functions.len(),
            scan.comments.len()
        );
        Ok(scan)
    }

    fn scan_folder(&mut self, path: &Path) -> Result<FileTree, BackendError> {
        if !path.is_dir() {
            return Err(BackendError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not a directory",
                ),
            });
        }
        Ok(build_hierarchy(path))
    }

    fn save_annotations(
        &mut self,
        path: &Path,
        annotations: &[Annotation],
        project_root: Option<&Path>,
    ) -> Result<AnnotationEcho, BackendError> {
        let (cache, mut data) = self.read_cache(path, project_root)?;
        let comments =
            serde_json::to_value(annotations).map_err(|source| {
                BackendError::Json {
                    path: cache.clone(),
                    source,
                }
            })?;
        data.insert("comments".to_string(), comments);
        Self::write_cache(&cache, data)
    }

    fn add_annotation(
        &mut self,
        path: &Path,
        node_label: &str,
        text: &str,
        project_root: Option<&Path>,
    ) -> Result<AnnotationEcho, BackendError> {
        let (cache, mut data) = self.read_cache(path, project_root)?;
        let record = Annotation {
            node_label: node_label.to_string(),
            text: text.to_string(),
            ..Annotation::default()
        };
        let record =
            serde_json::to_value(record).map_err(|source| BackendError::Json {
                path: cache.clone(),
                source,
            })?;
        let comments = data
            .entry("comments")
            .or_insert_with(|| Value::Array(Vec::new()));
        match comments {
            Value::Array(list) => list.push(record),
            other => *other = Value::Array(vec![record]),
        }
        Self::write_cache(&cache, data)
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_hierarchy(path: &Path) -> FileTree {
    let name = entry_name(path);
    if !path.is_dir() {
        return FileTree {
            name,
            kind: EntryKind::File,
            path: path.to_path_buf(),
            children: Vec::new(),
        };
    }

    let mut entries: Vec<PathBuf> = match fs::read_dir(path) {
        Ok(dir) => dir.filter_map(Result::ok).map(|e| e.path()).collect(),
        Err(e) => {
            log::debug!("skipping unreadable {}: {e}", path.display());
            Vec::new()
        }
    };
    entries.retain(|p| {
        let name = entry_name(p);
        !name.starts_with('.') && !IGNORED_ENTRIES.contains(&name.as_str())
    });
    entries.sort_by_key(|p| entry_name(p).to_lowercase());

    FileTree {
        name,
        kind: EntryKind::Folder,
        path: path.to_path_buf(),
        children: entries.iter().map(|p| build_hierarchy(p)).collect(),
    }
}
