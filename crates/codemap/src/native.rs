use crate::create_app;
use std::path::PathBuf;

/// Entry point used by the native executable.
///
/// The first command-line argument, if any, is a source file to open.
pub fn run() -> eframe::Result<()> {
    env_logger::init();

    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);
    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "Code Map",
        native_options,
        Box::new(move |cc| Ok(Box::new(create_app(cc, initial_file)))),
    )
}
