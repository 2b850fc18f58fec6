//! The dashboard aggregate and its session lifecycle.
//!
//! [`Dashboard`] is built once per session from the init message. Each
//! status update runs every family (so background histories stay warm) and
//! then redraws only the active one. [`Session`] sits in front of it and
//! routes raw [`Message`]s: updates before the first init are dropped, and a
//! later init starts over.

use serde::Serialize;

use crate::config::DashboardConfig;
use crate::families::{self, FamilyKind, MetricFamily, SampleClock};
use crate::host::HostInfo;
use crate::series::{ChartLayout, PlotSurface, Redraw};
use crate::tracker::EntityTracker;
use crate::view::{EntityStep, Navigation, Transition, ViewController};
use crate::wire::{Message, SessionInit, StatusUpdate};

/// Which families consumed a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub applied: Vec<FamilyKind>,
    /// Families whose field was missing from the update.
    pub skipped: Vec<FamilyKind>,
}

pub struct Dashboard {
    clock: SampleClock,
    families: Vec<Box<dyn MetricFamily>>,
    view: ViewController,
    host: HostInfo,
    period_warned: bool,
}

impl Dashboard {
    /// Size every window from the advertised period and allocate all state.
    pub fn bootstrap(init: &SessionInit, config: &DashboardConfig) -> Self {
        let period = config.effective_period(init.sample_period_secs);
        let capacity = config.window_capacity(period);
        let clock = SampleClock::new(capacity, period);
        log::debug!(
            "bootstrap {}: period={period}s capacity={capacity} cores={} disks={}",
            init.hostname,
            init.cpu_util.len(),
            init.disk_io.len()
        );
        Self {
            clock,
            families: families::bootstrap_all(init, clock),
            view: ViewController::new(config.initial_family),
            host: HostInfo::new(init.hostname.clone(), init.up_time_secs),
            period_warned: false,
        }
    }

    /// Run one tick through every family and redraw the active one.
    pub fn apply_update(&mut self, update: &StatusUpdate, surface: &mut dyn PlotSurface) -> TickReport {
        if let Some(p) = update.sample_period_secs {
            if (p - self.clock.period_secs).abs() > f64::EPSILON && !self.period_warned {
                log::warn!(
                    "sample period changed to {p}s mid-session; keeping {}s",
                    self.clock.period_secs
                );
                self.period_warned = true;
            }
        }

        let mut report = TickReport::default();
        for family in &mut self.families {
            if family.update(update) {
                report.applied.push(family.kind());
            } else {
                report.skipped.push(family.kind());
            }
        }
        if !report.skipped.is_empty() {
            log::debug!("tick skipped {:?}", report.skipped);
        }

        self.host.tick(self.clock.period_secs);
        self.redraw(surface);
        report
    }

    /// Apply a navigation request and redraw.
    pub fn navigate(&mut self, nav: Navigation, surface: &mut dyn PlotSurface) -> Transition {
        let transition = self.view.navigate(nav);
        if let Some(step) = &transition.entity {
            let family = self.family_mut(transition.family);
            let changed = match family.tracker_mut() {
                Some(tracker) => match step {
                    EntityStep::Next => tracker.next(),
                    EntityStep::Previous => tracker.previous(),
                    EntityStep::Select(name) => tracker.select(name),
                },
                None => false,
            };
            if changed {
                family.refresh();
            }
        }
        self.redraw(surface);
        transition
    }

    pub fn redraw(&self, surface: &mut dyn PlotSurface) {
        surface.redraw(&self.frame());
    }

    /// Redraw payload for the active family.
    pub fn frame(&self) -> Redraw {
        self.frame_for(self.view.active())
    }

    pub fn frame_for(&self, kind: FamilyKind) -> Redraw {
        let view = self.family(kind).view();
        Redraw {
            family: kind,
            layout: ChartLayout {
                chart_title: view.chart_title.clone(),
                y_title: view.y_title.clone(),
                y_max: view.axis_max,
                legend_order: kind.legend_order(),
                x_span: self.clock.span_secs(),
            },
            series: view.series.clone(),
            notes: view.notes.clone(),
        }
    }

    pub fn family(&self, kind: FamilyKind) -> &dyn MetricFamily {
        self.families[kind.index()].as_ref()
    }

    fn family_mut(&mut self, kind: FamilyKind) -> &mut dyn MetricFamily {
        self.families[kind.index()].as_mut()
    }

    /// Ghost label of every family, in navigation order.
    pub fn ghosts(&self) -> Vec<(FamilyKind, &str)> {
        self.families
            .iter()
            .map(|f| (f.kind(), f.view().ghost.as_str()))
            .collect()
    }

    pub fn ghost(&self, kind: FamilyKind) -> &str {
        &self.family(kind).view().ghost
    }

    pub fn tracker(&self, kind: FamilyKind) -> Option<&EntityTracker> {
        self.family(kind).tracker()
    }

    pub fn active_family(&self) -> FamilyKind {
        self.view.active()
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut HostInfo {
        &mut self.host
    }

    pub fn capacity(&self) -> usize {
        self.clock.capacity
    }

    pub fn period_secs(&self) -> f64 {
        self.clock.period_secs
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// What a message did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    Connected,
    Bootstrapped,
    Tick(TickReport),
    Clients(u64),
    /// A status update arrived before any init.
    Dropped,
}

/// Message router in front of a [`Dashboard`].
pub struct Session {
    config: DashboardConfig,
    dashboard: Option<Dashboard>,
    clients: Option<u64>,
    dropped: u64,
}

impl Session {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dashboard: None,
            clients: None,
            dropped: 0,
        }
    }

    pub fn handle(&mut self, msg: Message, surface: &mut dyn PlotSurface) -> Handled {
        match msg {
            Message::Connect => {
                log::debug!("connected");
                Handled::Connected
            }
            Message::SessionInit(init) => {
                let active = self.dashboard.as_ref().map(Dashboard::active_family);
                if active.is_some() {
                    log::debug!("re-initialising session");
                }
                let mut dashboard = Dashboard::bootstrap(&init, &self.config);
                if let Some(kind) = active {
                    dashboard.view = ViewController::new(kind);
                }
                if let Some(n) = self.clients {
                    dashboard.host.set_clients(n);
                }
                dashboard.redraw(surface);
                self.dashboard = Some(dashboard);
                Handled::Bootstrapped
            }
            Message::StatusUpdate(update) => match self.dashboard.as_mut() {
                Some(d) => Handled::Tick(d.apply_update(&update, surface)),
                None => {
                    self.dropped += 1;
                    log::warn!("status update before init, dropped");
                    Handled::Dropped
                }
            },
            Message::ClientCount(c) => {
                self.clients = Some(c.count);
                if let Some(d) = self.dashboard.as_mut() {
                    d.host.set_clients(c.count);
                }
                Handled::Clients(c.count)
            }
        }
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        self.dashboard.as_mut()
    }

    pub fn navigate(&mut self, nav: Navigation, surface: &mut dyn PlotSurface) -> Option<Transition> {
        self.dashboard.as_mut().map(|d| d.navigate(nav, surface))
    }

    pub fn clients(&self) -> Option<u64> {
        self.clients
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::RecordingSurface;
    use crate::wire::ClientCount;

    fn init() -> SessionInit {
        SessionInit {
            hostname: "box".into(),
            cpu_util: vec![Some(0.0); 2],
            sample_period_secs: Some(1.0),
            ..Default::default()
        }
    }

    fn cpu(values: &[f64]) -> StatusUpdate {
        StatusUpdate {
            cpu_util: Some(values.iter().map(|v| Some(*v)).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn bootstrap_sizes_windows() {
        let d = Dashboard::bootstrap(&init(), &DashboardConfig::default());
        assert_eq!(d.capacity(), 31);
        for kind in FamilyKind::ALL {
            for key in d.family(kind).store().channels() {
                let len = d.family(kind).store().window(key).map(|w| w.capacity());
                assert_eq!(len, Some(31), "{kind} {key}");
            }
        }
    }

    #[test]
    fn only_active_family_is_redrawn() {
        let mut d = Dashboard::bootstrap(&init(), &DashboardConfig::default());
        let mut rec = RecordingSurface::new();
        let report = d.apply_update(&cpu(&[20.0, 40.0]), &mut rec);
        assert_eq!(report.applied, vec![FamilyKind::CpuUtil]);
        assert_eq!(report.skipped.len(), 5);
        assert_eq!(rec.frames().len(), 1);
        assert_eq!(rec.last().unwrap().family, FamilyKind::CpuUtil);
    }

    #[test]
    fn background_families_stay_warm() {
        let mut d = Dashboard::bootstrap(&init(), &DashboardConfig::default());
        let mut rec = RecordingSurface::new();
        d.navigate(Navigation::SelectFamily(FamilyKind::Memory), &mut rec);
        d.apply_update(&cpu(&[10.0, 30.0]), &mut rec);
        assert_eq!(rec.last().unwrap().family, FamilyKind::Memory);
        assert_eq!(d.ghost(FamilyKind::CpuUtil), "20.0%");
        let frame = d.frame_for(FamilyKind::CpuUtil);
        assert_eq!(frame.series.last().unwrap().latest(), Some(20.0));
    }

    #[test]
    fn period_change_keeps_capacity() {
        let mut d = Dashboard::bootstrap(&init(), &DashboardConfig::default());
        let mut rec = RecordingSurface::new();
        let mut u = cpu(&[1.0, 1.0]);
        u.sample_period_secs = Some(2.0);
        d.apply_update(&u, &mut rec);
        d.apply_update(&u, &mut rec);
        assert_eq!(d.capacity(), 31);
        assert_eq!(d.period_secs(), 1.0);
    }

    #[test]
    fn host_ticks_with_updates() {
        let mut d = Dashboard::bootstrap(&init(), &DashboardConfig::default());
        let mut rec = RecordingSurface::new();
        d.apply_update(&StatusUpdate::default(), &mut rec);
        assert!(d.host().pulse);
        assert_eq!(d.host().uptime_secs, 1.0);
        d.host_mut().fade();
        assert!(!d.host().pulse);
    }

    #[test]
    fn session_drops_updates_before_init() {
        let mut s = Session::new(DashboardConfig::default());
        let mut rec = RecordingSurface::new();
        assert_eq!(s.handle(Message::Connect, &mut rec), Handled::Connected);
        let h = s.handle(Message::StatusUpdate(Box::new(cpu(&[1.0]))), &mut rec);
        assert_eq!(h, Handled::Dropped);
        assert_eq!(s.dropped(), 1);
        assert!(s.dashboard().is_none());
        assert!(rec.frames().is_empty());
    }

    #[test]
    fn session_bootstraps_and_remembers_clients() {
        let mut s = Session::new(DashboardConfig::default());
        let mut rec = RecordingSurface::new();
        s.handle(Message::ClientCount(ClientCount { count: 3 }), &mut rec);
        let h = s.handle(Message::SessionInit(Box::new(init())), &mut rec);
        assert_eq!(h, Handled::Bootstrapped);
        assert_eq!(rec.frames().len(), 1, "init draws the first view");
        assert_eq!(s.dashboard().unwrap().host().clients, Some(3));
    }

    #[test]
    fn second_init_starts_over_but_keeps_view() {
        let mut s = Session::new(DashboardConfig::default());
        let mut rec = RecordingSurface::new();
        s.handle(Message::SessionInit(Box::new(init())), &mut rec);
        s.handle(Message::StatusUpdate(Box::new(cpu(&[50.0, 50.0]))), &mut rec);
        s.navigate(Navigation::SelectFamily(FamilyKind::NetworkIo), &mut rec);
        s.handle(Message::SessionInit(Box::new(init())), &mut rec);
        let d = s.dashboard().unwrap();
        assert_eq!(d.active_family(), FamilyKind::NetworkIo);
        assert_eq!(d.ghost(FamilyKind::CpuUtil), "—");
    }
}
