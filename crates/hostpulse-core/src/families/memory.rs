//! RAM and swap in use, on one byte-scaled chart.

use super::{FamilyKind, FamilyView, MetricFamily, SampleClock, axis_max};
use crate::series::DisplaySeries;
use crate::units::{BYTES, Unit, clip10_opt};
use crate::window::{Window, WindowStore};
use crate::wire::StatusUpdate;

const RAM: &str = "ram";
const SWAP: &str = "swap";

pub struct MemoryFamily {
    clock: SampleClock,
    store: WindowStore,
    unit: Unit,
    view: FamilyView,
}

impl MemoryFamily {
    pub fn new(clock: SampleClock) -> Self {
        let mut store = WindowStore::new(clock.capacity);
        store.create_channel(RAM);
        store.create_channel(SWAP);
        let mut family = Self {
            clock,
            store,
            unit: BYTES.smallest(),
            view: FamilyView::default(),
        };
        family.refresh();
        family
    }

    /// Unit the chart is currently drawn in.
    pub fn unit(&self) -> Unit {
        self.unit
    }
}

impl MetricFamily for MemoryFamily {
    fn kind(&self) -> FamilyKind {
        FamilyKind::Memory
    }

    fn update(&mut self, update: &StatusUpdate) -> bool {
        let Some(mem) = update.memory else {
            return false;
        };
        self.store.push(RAM, mem.ram);
        self.store.push(SWAP, mem.swap);
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let observed = self.store.max_over([RAM, SWAP]);
        self.unit = BYTES.select_with_headroom(observed.unwrap_or(0.0));
        let unit = self.unit;
        let x = self.clock.x_axis();

        let line = |name: &str, key: &str, x: Vec<f64>| {
            let window = self.store.window(key);
            let latest = window.and_then(Window::latest).map(|v| unit.scale(v));
            let y = window.map(|w| w.scaled(unit.factor)).unwrap_or_default();
            DisplaySeries::new(format!("{name}: {} {unit}", clip10_opt(latest, 1)), x, y).bold()
        };
        let ram = line("RAM", RAM, x.clone());
        let swap = line("Swap", SWAP, x);
        let ghost = format!("{} {unit}", clip10_opt(ram.latest(), 1));

        self.view = FamilyView {
            chart_title: FamilyKind::Memory.label().to_string(),
            y_title: format!("Util ({unit})"),
            axis_max: axis_max(observed.map(|m| unit.scale(m))),
            series: vec![ram, swap],
            ghost,
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
