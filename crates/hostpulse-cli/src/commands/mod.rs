pub mod monitor;
pub mod replay;
pub mod summary;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hostpulse_core::{ConfigError, DashboardConfig, JsonLinesSource};

/// Config file (if any) with command-line overrides applied.
pub fn build_config(
    path: Option<&Path>,
    history: Option<f64>,
) -> Result<DashboardConfig, ConfigError> {
    let mut config = match path {
        Some(p) => DashboardConfig::load(p)?,
        None => DashboardConfig::default(),
    };
    if let Some(h) = history {
        config.history_seconds = h;
    }
    config.validate()?;
    Ok(config)
}

/// Like [`build_config`], but exits on failure.
pub fn load_config(path: Option<&Path>, history: Option<f64>) -> DashboardConfig {
    match build_config(path, history) {
        Ok(c) => {
            log::debug!("config: {c:?}");
            c
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Open a capture file as a message source, or exit.
pub fn open_capture(path: &Path) -> JsonLinesSource<BufReader<File>> {
    match File::open(path) {
        Ok(f) => JsonLinesSource::new(BufReader::new(f)),
        Err(e) => {
            eprintln!("Error: cannot open capture {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}
