//! Auxiliary power outlets (smart plugs), one gauge per outlet.

use super::{FamilyKind, FamilyView, MetricFamily, SampleClock, axis_max};
use crate::series::DisplaySeries;
use crate::tracker::EntityTracker;
use crate::units::{Unit, WATTS, clip10_opt, format_scaled};
use crate::window::{Sample, Window, WindowStore};
use crate::wire::StatusUpdate;

fn outlet_channels(outlet: &str) -> Vec<String> {
    vec![outlet.to_string()]
}

fn watts_label(v: Sample) -> String {
    match v {
        Some(v) => format_scaled(v, &WATTS),
        None => "—".to_string(),
    }
}

pub struct PowerFamily {
    clock: SampleClock,
    store: WindowStore,
    tracker: EntityTracker,
    unit: Unit,
    view: FamilyView,
}

impl PowerFamily {
    pub fn new<'a, I>(clock: SampleClock, outlets: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tracker = EntityTracker::with_entities(outlets);
        let mut store = WindowStore::new(clock.capacity);
        for outlet in tracker.entities() {
            store.create_channel(outlet);
        }
        let mut family = Self {
            clock,
            store,
            tracker,
            unit: WATTS.smallest(),
            view: FamilyView::default(),
        };
        family.refresh();
        family
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    fn latest(&self, outlet: &str) -> Sample {
        self.store.window(outlet).and_then(Window::latest)
    }

    /// Sum of every outlet's newest reading.
    pub fn total(&self) -> Sample {
        self.tracker
            .entities()
            .iter()
            .filter_map(|o| self.latest(o))
            .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
    }
}

impl MetricFamily for PowerFamily {
    fn kind(&self) -> FamilyKind {
        FamilyKind::AuxPower
    }

    fn update(&mut self, update: &StatusUpdate) -> bool {
        let Some(outlets) = update.aux_power.as_ref() else {
            return false;
        };
        let rec = self.tracker.reconcile(outlets.keys().cloned());
        rec.apply(&mut self.store, outlet_channels);
        for (outlet, watts) in outlets {
            self.store.push(outlet, *watts);
        }
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let notes = self
            .tracker
            .entities()
            .iter()
            .map(|o| format!("{o}: {}", watts_label(self.latest(o))))
            .collect();
        let ghost = if self.tracker.is_empty() {
            "No outlets".to_string()
        } else {
            watts_label(self.total())
        };

        let Some(outlet) = self.tracker.selected().map(str::to_string) else {
            self.unit = WATTS.smallest();
            self.view = FamilyView {
                chart_title: FamilyKind::AuxPower.label().to_string(),
                y_title: format!("Power ({})", self.unit),
                axis_max: axis_max(None),
                series: Vec::new(),
                ghost,
                notes,
            };
            return;
        };

        let observed = self.store.max_over([outlet.as_str()]);
        self.unit = WATTS.select_with_headroom(observed.unwrap_or(0.0));
        let unit = self.unit;
        let y = self
            .store
            .window(&outlet)
            .map(|w| w.scaled(unit.factor))
            .unwrap_or_default();
        let latest = self.latest(&outlet).map(|v| unit.scale(v));
        let series = vec![
            DisplaySeries::new(
                format!("{outlet}: {} {unit}", clip10_opt(latest, 1)),
                self.clock.x_axis(),
                y,
            )
            .bold(),
        ];

        self.view = FamilyView {
            chart_title: format!("{}: {outlet}", FamilyKind::AuxPower.label()),
            y_title: format!("Power ({unit})"),
            axis_max: axis_max(observed.map(|m| unit.scale(m))),
            series,
            ghost,
            notes,
        };
    }

    fn view(&self) -> &FamilyView {
        &self.view
    }

    fn store(&self) -> &WindowStore {
        &self.store
    }

    fn tracker(&self) -> Option<&EntityTracker> {
        Some(&self.tracker)
    }

    fn tracker_mut(&mut self) -> Option<&mut EntityTracker> {
        Some(&mut self.tracker)
    }
}
