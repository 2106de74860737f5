pub mod app;
pub mod camera;
pub mod config;
pub mod file_backend;
pub mod native;

use app::CodeMapApp;
use config::{AppConfig, CONFIG_FILE};
use std::path::{Path, PathBuf};

/// Build the app from `codemap.json` in the working directory, opening
/// `initial_file` once the first frame runs.
pub fn create_app(
    _cc: &eframe::CreationContext<'_>,
    initial_file: Option<PathBuf>,
) -> CodeMapApp {
    let config = AppConfig::load_or_default(Path::new(CONFIG_FILE));
    CodeMapApp::new(config, initial_file)
}
