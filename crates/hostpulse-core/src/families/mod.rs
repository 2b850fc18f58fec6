//! Metric families.
//!
//! Each family owns its windows, turns one field of a [`StatusUpdate`] into
//! new samples, and keeps a ready-to-draw [`FamilyView`] with series, axis
//! bound and ghost label. Families never read each other's state.
//!
//! | # | Family | Field | Entities |
//! |---|--------|-------|----------|
//! | 1 | CPU utilization | `CPU_Util` | - |
//! | 2 | CPU temperature | `CPU_Temp` | sensor groups |
//! | 3 | Memory | `Memory` | - |
//! | 4 | Network I/O | `Network_IO` | - |
//! | 5 | Disk I/O | `Disk_IO` | disks |
//! | 6 | Aux power | `Meross_Power` | outlets |

pub mod cpu_temp;
pub mod cpu_util;
pub mod disk_io;
pub mod memory;
pub mod network_io;
pub mod power;

use serde::{Deserialize, Serialize};

use crate::series::{DisplaySeries, LegendOrder, elapsed_axis};
use crate::tracker::EntityTracker;
use crate::units::{HEADROOM, MIN_MAGNITUDE};
use crate::window::{Sample, WindowStore};
use crate::wire::{SessionInit, StatusUpdate};

pub use cpu_temp::CpuTempFamily;
pub use cpu_util::CpuUtilFamily;
pub use disk_io::DiskIoFamily;
pub use memory::MemoryFamily;
pub use network_io::NetworkIoFamily;
pub use power::PowerFamily;

// ---------------------------------------------------------------------------
// FamilyKind
// ---------------------------------------------------------------------------

/// The closed set of chartable families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyKind {
    #[default]
    CpuUtil,
    CpuTemp,
    Memory,
    NetworkIo,
    DiskIo,
    AuxPower,
}

impl FamilyKind {
    /// All families in navigation order.
    pub const ALL: [FamilyKind; 6] = [
        Self::CpuUtil,
        Self::CpuTemp,
        Self::Memory,
        Self::NetworkIo,
        Self::DiskIo,
        Self::AuxPower,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::CpuUtil => 0,
            Self::CpuTemp => 1,
            Self::Memory => 2,
            Self::NetworkIo => 3,
            Self::DiskIo => 4,
            Self::AuxPower => 5,
        }
    }

    /// Family for a 1-based menu number.
    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CpuUtil => "CPU utilization",
            Self::CpuTemp => "CPU temperature",
            Self::Memory => "Memory",
            Self::NetworkIo => "Network I/O",
            Self::DiskIo => "Disk I/O",
            Self::AuxPower => "Power",
        }
    }

    /// Stable machine name, as used in config files and JSON output.
    pub fn key(self) -> &'static str {
        match self {
            Self::CpuUtil => "cpu_util",
            Self::CpuTemp => "cpu_temp",
            Self::Memory => "memory",
            Self::NetworkIo => "network_io",
            Self::DiskIo => "disk_io",
            Self::AuxPower => "aux_power",
        }
    }

    /// Parse a key or label, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.key().eq_ignore_ascii_case(name) || k.label().eq_ignore_ascii_case(name))
    }

    pub fn legend_order(self) -> LegendOrder {
        match self {
            Self::CpuUtil => LegendOrder::Reversed,
            _ => LegendOrder::Normal,
        }
    }

    /// Whether the family has a user-selectable entity.
    pub fn is_multi_entity(self) -> bool {
        matches!(self, Self::CpuTemp | Self::DiskIo | Self::AuxPower)
    }
}

impl std::fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Window capacity and sample spacing fixed at bootstrap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleClock {
    pub capacity: usize,
    pub period_secs: f64,
}

impl SampleClock {
    pub fn new(capacity: usize, period_secs: f64) -> Self {
        Self {
            capacity: capacity.max(1),
            period_secs,
        }
    }

    pub fn x_axis(&self) -> Vec<f64> {
        elapsed_axis(self.capacity, self.period_secs)
    }

    pub fn span_secs(&self) -> f64 {
        (self.capacity.saturating_sub(1)) as f64 * self.period_secs
    }
}

/// Derived, ready-to-draw state of one family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyView {
    pub chart_title: String,
    pub y_title: String,
    pub axis_max: f64,
    pub series: Vec<DisplaySeries>,
    /// Compact current-value summary.
    pub ghost: String,
    pub notes: Vec<String>,
}

/// One metric family.
pub trait MetricFamily {
    fn kind(&self) -> FamilyKind;

    /// Push this family's field of `update`. Returns `false` when the field
    /// is absent, in which case nothing changed.
    fn update(&mut self, update: &StatusUpdate) -> bool;

    /// Rebuild the view from the windows, e.g. after a selection change.
    fn refresh(&mut self);

    fn view(&self) -> &FamilyView;

    fn store(&self) -> &WindowStore;

    fn tracker(&self) -> Option<&EntityTracker> {
        None
    }

    fn tracker_mut(&mut self) -> Option<&mut EntityTracker> {
        None
    }
}

/// Build every family for a new session, in [`FamilyKind::ALL`] order.
pub fn bootstrap_all(init: &SessionInit, clock: SampleClock) -> Vec<Box<dyn MetricFamily>> {
    FamilyKind::ALL
        .into_iter()
        .map(|kind| -> Box<dyn MetricFamily> {
            match kind {
                FamilyKind::CpuUtil => Box::new(CpuUtilFamily::new(clock, init.cpu_util.len())),
                FamilyKind::CpuTemp => {
                    Box::new(CpuTempFamily::new(clock, init.cpu_temp.iter().map(|(g, r)| (g.as_str(), r.len()))))
                }
                FamilyKind::Memory => Box::new(MemoryFamily::new(clock)),
                FamilyKind::NetworkIo => Box::new(NetworkIoFamily::new(clock, init.network_totals)),
                FamilyKind::DiskIo => Box::new(DiskIoFamily::new(
                    clock,
                    init.disk_io.keys().map(String::as_str),
                    &init.disk_usage,
                    &init.mount_points,
                )),
                FamilyKind::AuxPower => Box::new(PowerFamily::new(clock, init.aux_power.keys().map(String::as_str))),
            }
        })
        .collect()
}

/// Chart upper bound: observed maximum with headroom, never below one unit.
pub fn axis_max(observed: Option<f64>) -> f64 {
    let m = observed.filter(|v| v.is_finite()).unwrap_or(0.0);
    m.max(MIN_MAGNITUDE) * HEADROOM
}

/// Index of the series whose newest value is largest.
pub fn legend_leader(latest: &[Sample]) -> Option<usize> {
    latest
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Mean of the present values, `None` if there are none.
pub fn mean(values: &[Sample]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

/// Max of the present values.
pub fn max_present(values: &[Sample]) -> Option<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::max)
}
