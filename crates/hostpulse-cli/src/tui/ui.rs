//! TUI rendering: one chart at a time.
//!
//! ┌──────────────────────────────────────────────────────┐
//! │ ● hostpulse  pi  up 3d 4h  clients 2   tcp pi:5000   │
//! ├────────────────────────────────────────┬─────────────┤
//! │  CPU utilization                       │ Disks       │
//! │  ⣀⡠⠤⠒⠉⠉⠒⠤⢄⣀   CPU avg: 43%            │ ▸ sda       │
//! │                                        │   sdb       │
//! │  -30s            -15s            now   │ Total …     │
//! ├────────────────────────────────────────┴─────────────┤
//! │ 1 CPU 43%  2 Temp 51°C  3 Mem 3.1 GB  4 Net Tx 2 KB/s│
//! ├──────────────────────────────────────────────────────┤
//! │ 1-6 family   tab next   ←→ entity   q quit           │
//! └──────────────────────────────────────────────────────┘

use super::app::App;
use hostpulse_core::{DisplaySeries, FamilyKind, Highlight, LegendOrder, LineWeight, Redraw};
use ratatui::{prelude::*, widgets::*};

const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightGreen,
];

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // host
            Constraint::Min(10),   // chart + side panel
            Constraint::Length(3), // ghosts
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_main(f, rows[1], app);
    draw_ghosts(f, rows[2], app);
    draw_keys(f, rows[3]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let dashboard = app.session().dashboard();
    let host = dashboard.map(|d| d.host());

    let pulse = match host {
        Some(h) if h.pulse => Span::styled(" ● ", Style::default().fg(Color::Green).bold()),
        _ => Span::styled(" ○ ", Style::default().fg(Color::DarkGray)),
    };
    let hostname = host.map(|h| h.hostname.as_str()).unwrap_or("waiting");
    let uptime = host.map(|h| h.uptime_label()).unwrap_or_else(|| "—".into());
    let clients = app
        .session()
        .clients()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "—".into());

    let mut spans = vec![
        pulse,
        Span::styled("hostpulse ", Style::default().bold().fg(Color::Cyan)),
        Span::styled(hostname.to_string(), Style::default().bold().fg(Color::Yellow)),
        Span::raw(format!("  up {uptime}  clients {clients}  ")),
        Span::styled(format!("{} ", app.origin()), Style::default().fg(Color::DarkGray)),
    ];
    if let Some(note) = app.last_note() {
        let color = if app.is_closed() { Color::Red } else { Color::DarkGray };
        spans.push(Span::styled(format!(" {note} "), Style::default().fg(color)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(spans));
    f.render_widget(block, area);
}

fn draw_main(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(74), Constraint::Percentage(26)])
        .split(area);

    match app.frame() {
        Some(frame) => draw_chart(f, cols[0], frame),
        None => {
            let block = Block::default().borders(Borders::ALL).title(" hostpulse ");
            let p = Paragraph::new(format!("Waiting for status_init from {}…", app.origin()))
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(p, cols[0]);
        }
    }
    draw_side(f, cols[1], app);
}

/// Contiguous runs of present samples, as `(-elapsed, value)` points.
pub fn segments(series: &DisplaySeries) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for (x, y) in series.x.iter().zip(&series.y) {
        match y {
            Some(v) => run.push((-x, *v)),
            None if !run.is_empty() => out.push(std::mem::take(&mut run)),
            None => {}
        }
    }
    if !run.is_empty() {
        out.push(run);
    }
    out
}

pub fn series_style(series: &DisplaySeries, index: usize) -> Style {
    let color = match series.highlight {
        Some(Highlight::Contrast) => Color::White,
        None => PALETTE[index % PALETTE.len()],
    };
    let style = Style::default().fg(color);
    match series.weight {
        LineWeight::Bold => style.add_modifier(Modifier::BOLD),
        LineWeight::Thin => style.add_modifier(Modifier::DIM),
    }
}

fn draw_chart(f: &mut Frame, area: Rect, frame: &Redraw) {
    let mut order: Vec<usize> = (0..frame.series.len()).collect();
    if frame.layout.legend_order == LegendOrder::Reversed {
        order.reverse();
    }

    let runs: Vec<(usize, Vec<Vec<(f64, f64)>>)> = order
        .iter()
        .map(|&i| (i, segments(&frame.series[i])))
        .collect();

    let mut datasets = Vec::new();
    for (i, segs) in &runs {
        let series = &frame.series[*i];
        let style = series_style(series, *i);
        for (n, seg) in segs.iter().enumerate() {
            let graph = if seg.len() == 1 {
                GraphType::Scatter
            } else {
                GraphType::Line
            };
            let mut ds = Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(graph)
                .style(style)
                .data(seg);
            if n == 0 && series.show_legend {
                ds = ds.name(series.label.clone());
            }
            datasets.push(ds);
        }
    }

    let span = frame.layout.x_span.max(1.0);
    let y_max = frame.layout.y_max;
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", frame.layout.chart_title)),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .x_axis(
            Axis::default()
                .bounds([-span, 0.0])
                .style(Style::default().fg(Color::DarkGray))
                .labels(vec![
                    Line::from(format!("-{span:.0}s")),
                    Line::from(format!("-{:.0}s", span / 2.0)),
                    Line::from("now"),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(frame.layout.y_title.clone())
                .bounds([0.0, y_max])
                .style(Style::default().fg(Color::DarkGray))
                .labels(vec![
                    Line::from("0"),
                    Line::from(format!("{:.1}", y_max / 2.0)),
                    Line::from(format!("{y_max:.1}")),
                ]),
        );
    f.render_widget(chart, area);
}

fn draw_side(f: &mut Frame, area: Rect, app: &App) {
    let Some(dashboard) = app.session().dashboard() else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let active = dashboard.active_family();
    let mut lines = Vec::new();

    if let Some(tracker) = dashboard.tracker(active) {
        if tracker.is_empty() {
            lines.push(Line::styled("none reported", Style::default().fg(Color::DarkGray)));
        }
        for name in tracker.entities() {
            if app.active_entity() == Some(name.as_str()) {
                lines.push(Line::styled(
                    format!("▸ {name}"),
                    Style::default().fg(Color::Yellow).bold(),
                ));
            } else {
                lines.push(Line::from(format!("  {name}")));
            }
        }
        lines.push(Line::from(""));
    }

    if let Some(frame) = app.frame() {
        for note in &frame.notes {
            lines.push(Line::styled(note.clone(), Style::default().fg(Color::Gray)));
        }
    }

    let title = match active {
        FamilyKind::CpuTemp => " Sensors ",
        FamilyKind::DiskIo => " Disks ",
        FamilyKind::AuxPower => " Outlets ",
        _ => " Details ",
    };
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_ghosts(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    if let Some(dashboard) = app.session().dashboard() {
        let active = dashboard.active_family();
        for (kind, ghost) in dashboard.ghosts() {
            let style = if kind == active {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(format!("{} ", kind.index() + 1), style.dim()));
            spans.push(Span::styled(format!("{} {ghost}", short_label(kind)), style));
            spans.push(Span::raw("   "));
        }
    }
    let p = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Now "));
    f.render_widget(p, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " 1-6 family (again: next entity)   tab/` next   ~ prev   ←→ [] entity   q quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

fn short_label(kind: FamilyKind) -> &'static str {
    match kind {
        FamilyKind::CpuUtil => "CPU",
        FamilyKind::CpuTemp => "Temp",
        FamilyKind::Memory => "Mem",
        FamilyKind::NetworkIo => "Net",
        FamilyKind::DiskIo => "Disk",
        FamilyKind::AuxPower => "Power",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::feed::{Feed, FeedEvent, Pacing};
    use hostpulse_core::{DashboardConfig, Message, ScriptedSource};
    use std::time::Instant;
    use ratatui::backend::TestBackend;

    fn series(y: Vec<Option<f64>>) -> DisplaySeries {
        let x = (0..y.len()).rev().map(|i| i as f64).collect();
        DisplaySeries::new("s", x, y)
    }

    #[test]
    fn gaps_split_segments() {
        let s = series(vec![None, Some(1.0), Some(2.0), None, Some(3.0)]);
        let segs = segments(&s);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0], vec![(-3.0, 1.0), (-2.0, 2.0)]);
        assert_eq!(segs[1], vec![(-0.0, 3.0)]);
    }

    #[test]
    fn all_gaps_no_segments() {
        assert!(segments(&series(vec![None, None])).is_empty());
    }

    #[test]
    fn contrast_series_is_white_and_bold() {
        let s = series(vec![Some(1.0)]).bold().highlight(Highlight::Contrast);
        let style = series_style(&s, 3);
        assert_eq!(style.fg, Some(Color::White));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        let thin = series_style(&series(vec![]), 1);
        assert_eq!(thin.fg, Some(PALETTE[1]));
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn draws_before_and_after_init() {
        let feed = Feed::spawn(ScriptedSource::default(), Pacing::Live);
        let mut app = App::new(DashboardConfig::default(), feed, "test".into());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(screen(&terminal).contains("Waiting for status_init"));

        let init = r#"{"event":"status_init","data":{"Hostname":"rack7","CPU_Util":[0,0],"Refresh_Period":1}}"#;
        let tick = r#"{"event":"status_update","data":{"CPU_Util":[50,50]}}"#;
        for text in [init, tick] {
            let msg = Message::from_json(text).unwrap();
            app.apply(FeedEvent::Message(msg), Instant::now());
        }
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = screen(&terminal);
        assert!(!text.contains("Waiting for status_init"));
        assert!(text.contains("rack7"), "host in title bar");
        assert!(text.contains("CPU utilization"), "chart title");
        assert!(text.contains("CPU 50.0%"), "ghost bar");
    }
}
