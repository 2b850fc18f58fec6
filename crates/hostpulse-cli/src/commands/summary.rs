use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use hostpulse_core::source::drain;
use hostpulse_core::{
    DashboardConfig, EventSource, FamilyKind, HostInfo, RecordingSurface, Redraw, Session,
    WireError,
};

#[derive(Debug, Serialize)]
pub struct GhostLine {
    pub family: FamilyKind,
    pub ghost: String,
}

/// Final dashboard state after a whole capture.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub messages: usize,
    pub redraws: usize,
    pub dropped: u64,
    pub host: Option<HostInfo>,
    pub uptime: Option<String>,
    pub ghosts: Vec<GhostLine>,
    pub frame: Option<Redraw>,
}

pub fn run(config: DashboardConfig, file: &Path, json: bool) {
    let mut source = super::open_capture(file);
    let summary = match summarize(&mut source, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: reading {}: {e}", file.display());
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", render_text(&summary));
    }
}

/// Drive every message of `source` through a headless session.
pub fn summarize<S: EventSource>(
    source: &mut S,
    config: DashboardConfig,
) -> Result<Summary, WireError> {
    let mut session = Session::new(config);
    let mut surface = RecordingSurface::new();
    let messages = drain(source, |msg| {
        session.handle(msg, &mut surface);
    })?;

    let dashboard = session.dashboard();
    Ok(Summary {
        messages,
        redraws: surface.frames().len(),
        dropped: session.dropped(),
        host: dashboard.map(|d| d.host().clone()),
        uptime: dashboard.map(|d| d.host().uptime_label()),
        ghosts: dashboard
            .map(|d| {
                d.ghosts()
                    .into_iter()
                    .map(|(family, ghost)| GhostLine {
                        family,
                        ghost: ghost.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        frame: dashboard.map(|d| d.frame()),
    })
}

pub fn render_text(summary: &Summary) -> String {
    let mut out = String::new();
    let Some(host) = &summary.host else {
        let _ = writeln!(
            out,
            "No session: {} messages, none of them a status_init.",
            summary.messages
        );
        return out;
    };

    let clients = host
        .clients
        .map(|c| c.to_string())
        .unwrap_or_else(|| "—".into());
    let _ = writeln!(
        out,
        "{}  up {}  clients {}  ({} messages, {} redraws, {} dropped)",
        host.hostname,
        summary.uptime.as_deref().unwrap_or("0s"),
        clients,
        summary.messages,
        summary.redraws,
        summary.dropped
    );
    out.push('\n');

    for (i, line) in summary.ghosts.iter().enumerate() {
        let _ = writeln!(out, "  {} {:<16} {}", i + 1, line.family.label(), line.ghost);
    }

    if let Some(frame) = &summary.frame {
        out.push('\n');
        let _ = writeln!(out, "{}", frame.layout.chart_title);
        let _ = writeln!(
            out,
            "  {}, axis 0..{:.1}, last {:.0}s",
            frame.layout.y_title, frame.layout.y_max, frame.layout.x_span
        );
        for label in frame.legend() {
            let _ = writeln!(out, "  {label}");
        }
        for note in &frame.notes {
            let _ = writeln!(out, "  {note}");
        }
    }
    out
}
