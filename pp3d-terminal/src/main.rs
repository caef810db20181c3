/// PP3D Terminal Viewer
///
/// Flies a camera through a small scene of cubes, picks objects with the mouse and
/// drags the selection with a translation gizmo.
/// Usage: pp3d-terminal [config.json]
///
/// Logs go to `pp3d-terminal.log` in the system temp directory; the terminal
/// itself belongs to the renderer.
use anyhow::{Context, Result};
use pp3d_core::ViewerConfig;
use pp3d_terminal::{demo_scene, TerminalApp};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

fn load_config(path: &Path) -> Result<ViewerConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level
        .parse()
        .with_context(|| format!("unknown log level {level:?}"))?;
    let log_path = std::env::temp_dir().join("pp3d-terminal.log");
    let file = File::create(&log_path).with_context(|| format!("creating {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => ViewerConfig::default(),
    };
    init_logging(&config.log_level)?;
    tracing::info!(?config, "starting viewer");

    let mut app = TerminalApp::new(config, demo_scene())?;
    app.run()?;

    println!("Thank you for using PP3D Terminal Viewer!");
    Ok(())
}
