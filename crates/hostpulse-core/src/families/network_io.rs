//! Network throughput, transmit and receive.
//!
//! Windows hold bytes moved per tick; the chart shows bytes per second.
//! Cumulative totals are seeded from the session init and advanced by each
//! tick's deltas.

use super::{FamilyKind, FamilyView, MetricFamily, SampleClock, axis_max};
use crate::series::DisplaySeries;
use crate::units::{BYTES, Unit, clip10_opt, format_scaled};
use crate::window::{Sample, Window, WindowStore};
use crate::wire::{NetworkReading, StatusUpdate};

const TX: &str = "tx";
const RX: &str = "rx";

/// `"1.5 MB/s"`, or a dash with no reading.
pub(crate) fn rate_label(rate: Sample) -> String {
    match rate {
        Some(r) => format!("{}/s", format_scaled(r, &BYTES)),
        None => "—".to_string(),
    }
}

pub struct NetworkIoFamily {
    clock: SampleClock,
    store: WindowStore,
    unit: Unit,
    total_tx: f64,
    total_rx: f64,
    view: FamilyView,
}

impl NetworkIoFamily {
    pub fn new(clock: SampleClock, totals: Option<NetworkReading>) -> Self {
        let mut store = WindowStore::new(clock.capacity);
        store.create_channel(TX);
        store.create_channel(RX);
        let totals = totals.unwrap_or_default();
        let mut family = Self {
            clock,
            store,
            unit: BYTES.smallest(),
            total_tx: totals.tx.unwrap_or(0.0),
            total_rx: totals.rx.unwrap_or(0.0),
            view: FamilyView::default(),
        };
        family.refresh();
        family
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Cumulative `(tx, rx)` bytes.
    pub fn totals(&self) -> (f64, f64) {
        (self.total_tx, self.total_rx)
    }

    fn rate(&self, key: &str) -> Sample {
        self.store
            .window(key)
            .and_then(Window::latest)
            .map(|v| v / self.clock.period_secs)
    }
}

impl MetricFamily for NetworkIoFamily {
    fn kind(&self) -> FamilyKind {
        FamilyKind::NetworkIo
    }

    fn update(&mut self, update: &StatusUpdate) -> bool {
        let Some(net) = update.network_io else {
            return false;
        };
        self.store.push(TX, net.tx);
        self.store.push(RX, net.rx);
        self.total_tx += net.tx.filter(|v| v.is_finite()).unwrap_or(0.0);
        self.total_rx += net.rx.filter(|v| v.is_finite()).unwrap_or(0.0);
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let period = self.clock.period_secs;
        let observed = self.store.max_over([TX, RX]).map(|m| m / period);
        self.unit = BYTES.select_with_headroom(observed.unwrap_or(0.0));
        let unit = self.unit;
        let divisor = unit.factor * period;
        let x = self.clock.x_axis();

        let tx_rate = self.rate(TX);
        let rx_rate = self.rate(RX);
        let scaled = |key: &str| {
            self.store
                .window(key)
                .map(|w| w.scaled(divisor))
                .unwrap_or_default()
        };
        let series = vec![
            DisplaySeries::new(format!("Tx: {}", rate_label(tx_rate)), x.clone(), scaled(TX)).bold(),
            DisplaySeries::new(format!("Rx: {}", rate_label(rx_rate)), x, scaled(RX)).bold(),
        ];

        let ghost = match (tx_rate, rx_rate) {
            (Some(tx), Some(rx)) if tx >= rx => format!("Tx {}", rate_label(Some(tx))),
            (_, Some(rx)) => format!("Rx {}", rate_label(Some(rx))),
            (Some(tx), None) => format!("Tx {}", rate_label(Some(tx))),
            (None, None) => "—".to_string(),
        };

        self.view = FamilyView {
            chart_title: FamilyKind::NetworkIo.label().to_string(),
            y_title: format!("Net IO ({unit}/s)"),
            axis_max: axis_max(observed.map(|m| unit.scale(m))),
            series,
            ghost,
            notes: vec![
                format!("Total sent: {}", format_scaled(self.total_tx, &BYTES)),
                format!("Total received: {}", format_scaled(self.total_rx, &BYTES)),
                format!("Peak: {} {unit}/s", clip10_opt(observed.map(|m| unit.scale(m)), 1)),
            ],
        };
    }

    fn view(&self) -> &FamilyView {
        &self.view
    }

    fn store(&self) -> &WindowStore {
        &self.store
    }
}
