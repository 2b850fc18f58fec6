//! Host identity panel: hostname, uptime, connected clients, alive pulse.

use serde::Serialize;

const MINUTE: f64 = 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
/// 52 weeks plus the leftover days of an average year.
const YEAR: f64 = WEEK * 52.0 + DAY * 2.2475;

/// Render an uptime as its two most significant non-zero components.
///
/// `format_uptime(273_600.0) == "3d 4h"`, `format_uptime(12.0) == "12s"`.
pub fn format_uptime(secs: f64) -> String {
    if !secs.is_finite() || secs < 1.0 {
        return "0s".to_string();
    }
    let mut rest = secs.floor();
    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in [
        (YEAR, "y"),
        (WEEK, "w"),
        (DAY, "d"),
        (HOUR, "h"),
        (MINUTE, "m"),
        (1.0, "s"),
    ] {
        let n = (rest / size).floor();
        rest -= n * size;
        if n >= 1.0 {
            parts.push(format!("{n:.0}{suffix}"));
        }
        if parts.len() == 2 {
            break;
        }
    }
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostInfo {
    pub hostname: String,
    pub uptime_secs: f64,
    pub clients: Option<u64>,
    /// Lit on every status update, cleared half a period later.
    pub pulse: bool,
    pub ticks: u64,
}

impl HostInfo {
    pub fn new(hostname: impl Into<String>, uptime_secs: f64) -> Self {
        Self {
            hostname: hostname.into(),
            uptime_secs: if uptime_secs.is_finite() { uptime_secs.max(0.0) } else { 0.0 },
            ..Default::default()
        }
    }

    /// Advance uptime by one sample period and light the pulse.
    pub fn tick(&mut self, period_secs: f64) {
        self.uptime_secs += period_secs;
        self.ticks += 1;
        self.pulse = true;
    }

    pub fn fade(&mut self) {
        self.pulse = false;
    }

    pub fn set_clients(&mut self, count: u64) {
        self.clients = Some(count);
    }

    pub fn uptime_label(&self) -> String {
        format_uptime(self.uptime_secs)
    }
}
