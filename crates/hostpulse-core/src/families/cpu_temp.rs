//! Temperatures grouped by sensor chip.
//!
//! History is kept per reading (`{group}/{i}`) plus synthetic `{group}/max`
//! and `{group}/avg` channels, so switching the displayed group only
//! rebuilds series; nothing is lost.

use std::collections::BTreeMap;

use super::{
    FamilyKind, FamilyView, MetricFamily, SampleClock, axis_max, max_present, mean,
};
use crate::series::{DisplaySeries, Highlight};
use crate::tracker::EntityTracker;
use crate::units::clip10_opt;
use crate::window::{Sample, Window, WindowStore};
use crate::wire::StatusUpdate;

/// Groups with more readings than this are summarized by max and average.
const DETAIL_LIMIT: usize = 2;

fn reading_key(group: &str, i: usize) -> String {
    format!("{group}/{i}")
}

fn max_key(group: &str) -> String {
    format!("{group}/max")
}

fn avg_key(group: &str) -> String {
    format!("{group}/avg")
}

fn celsius(v: Sample) -> String {
    format!("{}°C", clip10_opt(v, 1))
}

pub struct CpuTempFamily {
    clock: SampleClock,
    store: WindowStore,
    tracker: EntityTracker,
    /// Readings per group, never shrinking while the group lives.
    readings: BTreeMap<String, usize>,
    view: FamilyView,
}

impl CpuTempFamily {
    /// `groups` yields each sensor group with its reading count.
    pub fn new<'a, I>(clock: SampleClock, groups: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let readings: BTreeMap<String, usize> =
            groups.into_iter().map(|(g, n)| (g.to_string(), n)).collect();
        let mut store = WindowStore::new(clock.capacity);
        for (group, n) in &readings {
            for key in channel_keys(group, *n) {
                store.create_channel(&key);
            }
        }
        let tracker = EntityTracker::with_entities(readings.keys().cloned());
        let mut family = Self {
            clock,
            store,
            tracker,
            readings,
            view: FamilyView::default(),
        };
        family.refresh();
        family
    }

    fn latest_readings(&self, group: &str) -> Vec<Sample> {
        let n = self.readings.get(group).copied().unwrap_or(0);
        (0..n)
            .map(|i| self.store.window(&reading_key(group, i)).and_then(Window::latest))
            .collect()
    }

    /// Hottest newest reading over every group.
    pub fn hottest(&self) -> Sample {
        let all: Vec<Sample> = self
            .readings
            .keys()
            .flat_map(|g| self.latest_readings(g))
            .collect();
        max_present(&all)
    }
}

fn channel_keys(group: &str, readings: usize) -> Vec<String> {
    let mut keys: Vec<String> = (0..readings).map(|i| reading_key(group, i)).collect();
    keys.push(max_key(group));
    keys.push(avg_key(group));
    keys
}

impl MetricFamily for CpuTempFamily {
    fn kind(&self) -> FamilyKind {
        FamilyKind::CpuTemp
    }

    fn update(&mut self, update: &StatusUpdate) -> bool {
        let Some(groups) = update.cpu_temp.as_ref() else {
            return false;
        };

        let rec = self.tracker.reconcile(groups.keys().cloned());
        let mut counts = self.readings.clone();
        for (group, values) in groups {
            let known = counts.entry(group.clone()).or_insert(0);
            *known = (*known).max(values.len());
        }
        rec.apply(&mut self.store, |g| {
            channel_keys(g, counts.get(g).copied().unwrap_or(0))
        });
        for gone in &rec.removed {
            counts.remove(gone);
        }
        self.readings = counts;

        for (group, values) in groups {
            let n = self.readings.get(group).copied().unwrap_or(0);
            for i in 0..n {
                let v = values.get(i).copied().flatten();
                self.store.push(&reading_key(group, i), v);
            }
            self.store.push(&max_key(group), max_present(values));
            self.store.push(&avg_key(group), mean(values));
        }

        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let x = self.clock.x_axis();
        let mut series = Vec::new();
        let mut keys = Vec::new();
        let title;

        if let Some(group) = self.tracker.selected() {
            title = format!("{}: {group}", FamilyKind::CpuTemp.label());
            let latest = self.latest_readings(group);
            let detailed = latest.len() <= DETAIL_LIMIT;

            for (i, last) in latest.iter().enumerate() {
                let key = reading_key(group, i);
                let name = if latest.len() == 1 {
                    group.to_string()
                } else {
                    format!("{group} {i}")
                };
                let y = self.store.snapshot(&key).unwrap_or_default();
                let s = DisplaySeries::new(format!("{name}: {}", celsius(*last)), x.clone(), y);
                series.push(if detailed { s.bold() } else { s.legend(false) });
                keys.push(key);
            }

            if !detailed {
                let max_last = self.store.window(&max_key(group)).and_then(Window::latest);
                let avg_last = self.store.window(&avg_key(group)).and_then(Window::latest);
                series.push(
                    DisplaySeries::new(
                        format!("Max: {}", celsius(max_last)),
                        x.clone(),
                        self.store.snapshot(&max_key(group)).unwrap_or_default(),
                    )
                    .bold()
                    .highlight(Highlight::Contrast),
                );
                series.push(
                    DisplaySeries::new(
                        format!("Avg: {}", celsius(avg_last)),
                        x,
                        self.store.snapshot(&avg_key(group)).unwrap_or_default(),
                    )
                    .bold(),
                );
            }
        } else {
            title = FamilyKind::CpuTemp.label().to_string();
        }

        let notes = self
            .readings
            .keys()
            .map(|g| {
                let max_last = self.store.window(&max_key(g)).and_then(Window::latest);
                format!("{g}: max {}", celsius(max_last))
            })
            .collect();

        self.view = FamilyView {
            chart_title: title,
            y_title: "Temp (°C)".to_string(),
            axis_max: axis_max(self.store.max_over(keys.iter().map(String::as_str))),
            series,
            ghost: if self.readings.is_empty() {
                "No sensors".to_string()
            } else {
                celsius(self.hottest())
            },
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

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(groups: &[(&str, Vec<f64>)]) -> StatusUpdate {
        StatusUpdate {
            cpu_temp: Some(
                groups
                    .iter()
                    .map(|(g, v)| (g.to_string(), v.iter().map(|x| Some(*x)).collect()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn big_group_shows_max_and_avg() {
        let clock = SampleClock::new(4, 1.0);
        let mut f = CpuTempFamily::new(clock, [("coretemp", 4)]);
        f.update(&tick(&[("coretemp", vec![40.0, 50.0, 60.0, 70.0])]));
        let legend: Vec<_> = f
            .view()
            .series
            .iter()
            .filter(|s| s.show_legend)
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(legend, vec!["Max: 70°C", "Avg: 55°C"]);
        assert_eq!(f.view().series.len(), 6);
        assert_eq!(f.view().ghost, "70°C");
        assert_eq!(f.view().axis_max, 70.0 * 1.25);
    }

    #[test]
    fn small_group_charts_each_reading() {
        let clock = SampleClock::new(4, 1.0);
        let mut f = CpuTempFamily::new(clock, [("acpitz", 1)]);
        f.update(&tick(&[("acpitz", vec![27.8])]));
        let s = &f.view().series;
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].label, "acpitz: 28°C");
        assert!(s[0].show_legend);
    }

    #[test]
    fn switching_group_keeps_history() {
        let clock = SampleClock::new(3, 1.0);
        let mut f = CpuTempFamily::new(clock, [("a", 1), ("b", 1)]);
        f.update(&tick(&[("a", vec![1.0]), ("b", vec![2.0])]));
        f.update(&tick(&[("a", vec![3.0]), ("b", vec![4.0])]));
        assert_eq!(f.tracker().unwrap().selected(), Some("a"));
        f.tracker_mut().unwrap().next();
        f.refresh();
        assert_eq!(f.view().series[0].y, vec![None, Some(2.0), Some(4.0)]);
        assert_eq!(f.view().chart_title, "CPU temperature: b");
    }

    #[test]
    fn vanished_group_is_dropped() {
        let clock = SampleClock::new(3, 1.0);
        let mut f = CpuTempFamily::new(clock, [("a", 2), ("b", 1)]);
        f.update(&tick(&[("b", vec![30.0])]));
        assert_eq!(f.tracker().unwrap().entities(), ["b".to_string()]);
        assert!(!f.store().contains("a/0"));
        assert!(!f.store().contains("a/max"));
        assert_eq!(f.tracker().unwrap().selected(), Some("b"));
    }

    #[test]
    fn new_group_gets_fresh_windows() {
        let clock = SampleClock::new(3, 1.0);
        let mut f = CpuTempFamily::new(clock, Vec::<(&str, usize)>::new());
        assert_eq!(f.view().ghost, "No sensors");
        f.update(&tick(&[("nvme", vec![35.0, 36.0])]));
        assert_eq!(f.store().snapshot("nvme/1"), Some(vec![None, None, Some(36.0)]));
        assert_eq!(f.tracker().unwrap().selected(), Some("nvme"));
    }
}
