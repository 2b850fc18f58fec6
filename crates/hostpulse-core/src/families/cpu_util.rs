//! Per-core CPU utilization plus a synthetic average line.

use super::{FamilyKind, FamilyView, MetricFamily, SampleClock, axis_max, legend_leader, mean};
use crate::series::{DisplaySeries, Highlight};
use crate::window::{Sample, Window, WindowStore};
use crate::wire::StatusUpdate;

const AVG: &str = "avg";

fn core_key(i: usize) -> String {
    format!("core{i}")
}

/// Percentages are bounded, so they always keep one decimal.
fn percent(v: Sample) -> String {
    match v {
        Some(v) => format!("{v:.1}%"),
        None => "—".to_string(),
    }
}

pub struct CpuUtilFamily {
    clock: SampleClock,
    store: WindowStore,
    cores: usize,
    view: FamilyView,
}

impl CpuUtilFamily {
    pub fn new(clock: SampleClock, cores: usize) -> Self {
        let mut store = WindowStore::new(clock.capacity);
        for i in 0..cores {
            store.create_channel(&core_key(i));
        }
        store.create_channel(AVG);
        let mut family = Self {
            clock,
            store,
            cores,
            view: FamilyView::default(),
        };
        family.refresh();
        family
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    /// Newest value of the average channel.
    pub fn average(&self) -> Sample {
        self.store.window(AVG).and_then(Window::latest)
    }
}

impl MetricFamily for CpuUtilFamily {
    fn kind(&self) -> FamilyKind {
        FamilyKind::CpuUtil
    }

    fn update(&mut self, update: &StatusUpdate) -> bool {
        let Some(values) = update.cpu_util.as_ref() else {
            return false;
        };
        if values.len() > self.cores {
            log::debug!("cpu: core count grew {} -> {}", self.cores, values.len());
            self.cores = values.len();
        }
        for i in 0..self.cores {
            let v = values.get(i).copied().flatten();
            self.store.push(&core_key(i), v);
        }
        self.store.push(AVG, mean(values));
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let x = self.clock.x_axis();
        let latest: Vec<Sample> = (0..self.cores)
            .map(|i| self.store.window(&core_key(i)).and_then(Window::latest))
            .collect();
        let leader = legend_leader(&latest);

        let mut series = Vec::with_capacity(self.cores + 1);
        for (i, last) in latest.iter().enumerate() {
            let y = self.store.snapshot(&core_key(i)).unwrap_or_default();
            series.push(
                DisplaySeries::new(format!("Core {i}: {}", percent(*last)), x.clone(), y)
                    .legend(leader == Some(i)),
            );
        }

        let avg = self.average();
        let avg_y = self.store.snapshot(AVG).unwrap_or_default();
        series.push(
            DisplaySeries::new(format!("CPU avg: {}", percent(avg)), x, avg_y)
                .bold()
                .highlight(Highlight::Contrast),
        );

        self.view = FamilyView {
            chart_title: FamilyKind::CpuUtil.label().to_string(),
            y_title: "Util (%)".to_string(),
            axis_max: axis_max(self.store.max_over(self.store.channels())),
            series,
            ghost: percent(avg),
            notes: Vec::new(),
        };
    }

    fn view(&self) -> &FamilyView {
        &self.view
    }

    fn store(&self) -> &WindowStore {
        &self.store
    }
}
