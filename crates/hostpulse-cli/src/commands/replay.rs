use std::path::Path;

use hostpulse_core::DashboardConfig;

use crate::tui::app::App;
use crate::tui::feed::{Feed, Pacing};

pub fn run(config: DashboardConfig, file: &Path, speed: f64) {
    if !speed.is_finite() || speed <= 0.0 {
        eprintln!("Error: --speed must be a positive number, got {speed}");
        std::process::exit(1);
    }
    let source = super::open_capture(file);
    let pacing = Pacing::Replay {
        speed,
        fallback_period: config.fallback_sample_period,
    };
    let feed = Feed::spawn(source, pacing);
    let origin = match file.file_name() {
        Some(name) => format!("replay {} x{speed}", name.to_string_lossy()),
        None => format!("replay x{speed}"),
    };
    let mut app = App::new(config, feed, origin);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
