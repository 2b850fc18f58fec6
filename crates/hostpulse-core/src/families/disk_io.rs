//! Per-disk read/write throughput with a selectable disk.
//!
//! Every disk keeps its own `{disk}/read` and `{disk}/write` windows, so
//! disks coming and going never shift anyone else's history. Only the
//! selected disk is charted, and its unit is chosen from its own maxima.

use std::collections::BTreeMap;

use super::{FamilyKind, FamilyView, MetricFamily, SampleClock, axis_max};
use crate::families::network_io::rate_label;
use crate::series::DisplaySeries;
use crate::tracker::EntityTracker;
use crate::units::{BYTES, Unit, clip10, format_scaled};
use crate::window::{Sample, Window, WindowStore};
use crate::wire::{DiskUsage, StatusUpdate};

fn read_key(disk: &str) -> String {
    format!("{disk}/read")
}

fn write_key(disk: &str) -> String {
    format!("{disk}/write")
}

fn disk_channels(disk: &str) -> Vec<String> {
    vec![read_key(disk), write_key(disk)]
}

/// Whether `device` (e.g. `/dev/nvme0n1p2`) is a partition of, or is, `disk`.
pub fn device_belongs_to(device: &str, disk: &str) -> bool {
    let name = device.rsplit('/').next().unwrap_or(device);
    let Some(rest) = name.strip_prefix(disk) else {
        return false;
    };
    let digits = rest.strip_prefix('p').unwrap_or(rest);
    rest.is_empty() || (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// One mount point and its capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct MountUsage {
    pub mount_point: String,
    pub device: String,
    pub usage: DiskUsage,
}

pub struct DiskIoFamily {
    clock: SampleClock,
    store: WindowStore,
    tracker: EntityTracker,
    mounts: Vec<MountUsage>,
    unit: Unit,
    view: FamilyView,
}

impl DiskIoFamily {
    pub fn new<'a, I>(
        clock: SampleClock,
        disks: I,
        usage: &BTreeMap<String, DiskUsage>,
        mount_points: &BTreeMap<String, String>,
    ) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tracker = EntityTracker::with_entities(disks);
        let mut store = WindowStore::new(clock.capacity);
        for disk in tracker.entities() {
            for key in disk_channels(disk) {
                store.create_channel(&key);
            }
        }
        let mounts = mount_points
            .iter()
            .filter_map(|(mount, device)| {
                usage.get(mount).map(|u| MountUsage {
                    mount_point: mount.clone(),
                    device: device.clone(),
                    usage: *u,
                })
            })
            .collect();
        let mut family = Self {
            clock,
            store,
            tracker,
            mounts,
            unit: BYTES.smallest(),
            view: FamilyView::default(),
        };
        family.refresh();
        family
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Mounts living on `disk`.
    pub fn mounts_of<'a>(&'a self, disk: &'a str) -> impl Iterator<Item = &'a MountUsage> + 'a {
        self.mounts
            .iter()
            .filter(move |m| device_belongs_to(&m.device, disk))
    }

    fn rate(&self, key: &str) -> Sample {
        self.store
            .window(key)
            .and_then(Window::latest)
            .map(|v| v / self.clock.period_secs)
    }
}

impl MetricFamily for DiskIoFamily {
    fn kind(&self) -> FamilyKind {
        FamilyKind::DiskIo
    }

    fn update(&mut self, update: &StatusUpdate) -> bool {
        let Some(disks) = update.disk_io.as_ref() else {
            return false;
        };
        let rec = self.tracker.reconcile(disks.keys().cloned());
        rec.apply(&mut self.store, disk_channels);
        for (disk, reading) in disks {
            self.store.push(&read_key(disk), reading.read);
            self.store.push(&write_key(disk), reading.write);
        }
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let Some(disk) = self.tracker.selected().map(str::to_string) else {
            self.unit = BYTES.smallest();
            self.view = FamilyView {
                chart_title: FamilyKind::DiskIo.label().to_string(),
                y_title: format!("Disk IO ({}/s)", self.unit),
                axis_max: axis_max(None),
                series: Vec::new(),
                ghost: "No disks".to_string(),
                notes: Vec::new(),
            };
            return;
        };

        let period = self.clock.period_secs;
        let (rk, wk) = (read_key(&disk), write_key(&disk));
        let observed = self
            .store
            .max_over([rk.as_str(), wk.as_str()])
            .map(|m| m / period);
        self.unit = BYTES.select_with_headroom(observed.unwrap_or(0.0));
        let unit = self.unit;
        let divisor = unit.factor * period;
        let x = self.clock.x_axis();

        let read = self.rate(&rk);
        let write = self.rate(&wk);
        let scaled = |key: &str| {
            self.store
                .window(key)
                .map(|w| w.scaled(divisor))
                .unwrap_or_default()
        };
        let series = vec![
            DisplaySeries::new(format!("Read: {}", rate_label(read)), x.clone(), scaled(&rk)).bold(),
            DisplaySeries::new(format!("Write: {}", rate_label(write)), x, scaled(&wk)).bold(),
        ];

        let ghost = match (read, write) {
            (Some(r), Some(w)) if r == 0.0 && w == 0.0 => "Idle".to_string(),
            (Some(r), Some(w)) if r >= w => format!("R {}", rate_label(Some(r))),
            (_, Some(w)) => format!("W {}", rate_label(Some(w))),
            (Some(r), None) => format!("R {}", rate_label(Some(r))),
            (None, None) => "—".to_string(),
        };

        let notes = self
            .mounts_of(&disk)
            .map(|m| {
                format!(
                    "{} ({}): {}% of {}",
                    m.mount_point,
                    m.device,
                    clip10(m.usage.percent, 1),
                    format_scaled(m.usage.total, &BYTES)
                )
            })
            .collect();

        self.view = FamilyView {
            chart_title: format!("{}: {disk}", FamilyKind::DiskIo.label()),
            y_title: format!("Disk IO ({unit}/s)"),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::DiskReading;

    const MB: f64 = 1024.0 * 1024.0;

    fn family(disks: &[&str]) -> DiskIoFamily {
        DiskIoFamily::new(
            SampleClock::new(3, 1.0),
            disks.iter().copied(),
            &BTreeMap::new(),
            &BTreeMap::new(),
        )
    }

    fn tick(disks: &[(&str, f64, f64)]) -> StatusUpdate {
        StatusUpdate {
            disk_io: Some(
                disks
                    .iter()
                    .map(|(d, r, w)| {
                        (
                            d.to_string(),
                            DiskReading {
                                read: Some(*r),
                                write: Some(*w),
                            },
                        )
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn partitions_belong_to_their_disk() {
        assert!(device_belongs_to("/dev/sda1", "sda"));
        assert!(device_belongs_to("/dev/sda", "sda"));
        assert!(device_belongs_to("/dev/nvme0n1p2", "nvme0n1"));
        assert!(device_belongs_to("mmcblk0p1", "mmcblk0"));
        assert!(!device_belongs_to("/dev/sdab1", "sda"));
        assert!(!device_belongs_to("/dev/sdb1", "sda"));
        assert!(!device_belongs_to("/dev/sdap", "sda"));
    }

    #[test]
    fn idle_when_both_zero() {
        let mut f = family(&["sda"]);
        f.update(&tick(&[("sda", 0.0, 0.0)]));
        assert_eq!(f.view().ghost, "Idle");
    }

    #[test]
    fn ghost_shows_dominant_direction() {
        let mut f = family(&["sda"]);
        f.update(&tick(&[("sda", 1024.0, 5.0 * MB)]));
        assert_eq!(f.view().ghost, "W 5.0 MB/s");
        assert_eq!(f.view().series[0].label, "Read: 1.0 KB/s");
        assert_eq!(f.view().series[1].label, "Write: 5.0 MB/s");
        assert_eq!(f.unit().name, "MB");
    }

    #[test]
    fn no_disks_renders_empty() {
        let f = family(&[]);
        assert!(f.view().series.is_empty());
        assert_eq!(f.view().ghost, "No disks");
    }

    #[test]
    fn unit_follows_selected_disk_only() {
        let mut f = family(&["sda", "sdb"]);
        f.update(&tick(&[("sda", 10.0, 10.0), ("sdb", 900.0 * MB, 0.0)]));
        assert_eq!(f.unit().name, "B");
        f.tracker_mut().unwrap().next();
        f.refresh();
        assert_eq!(f.unit().name, "GB");
    }

    #[test]
    fn removal_moves_selection() {
        let mut f = family(&["sda", "sdb"]);
        f.update(&tick(&[("sda", 1.0, 1.0), ("sdb", 2.0, 2.0)]));
        f.update(&tick(&[("sdb", 3.0, 3.0)]));
        let t = f.tracker().unwrap();
        assert_eq!(t.entities(), ["sdb".to_string()]);
        assert_eq!(t.selected(), Some("sdb"));
        assert!(!f.store().contains("sda/read"));
        assert_eq!(f.store().snapshot("sdb/read"), Some(vec![None, Some(2.0), Some(3.0)]));
    }

    #[test]
    fn mount_notes_for_selected_disk() {
        let usage = BTreeMap::from([
            (
                "/".to_string(),
                DiskUsage {
                    total: 100.0 * MB * 1024.0,
                    used: 40.0 * MB * 1024.0,
                    free: 60.0 * MB * 1024.0,
                    percent: 40.0,
                },
            ),
            (
                "/data".to_string(),
                DiskUsage {
                    total: 2.0 * MB,
                    used: 1.0 * MB,
                    free: 1.0 * MB,
                    percent: 50.0,
                },
            ),
        ]);
        let mounts = BTreeMap::from([
            ("/".to_string(), "/dev/sda1".to_string()),
            ("/data".to_string(), "/dev/sdb1".to_string()),
        ]);
        let f = DiskIoFamily::new(SampleClock::new(3, 1.0), ["sda", "sdb"], &usage, &mounts);
        assert_eq!(f.view().notes, vec!["/ (/dev/sda1): 40% of 100 GB".to_string()]);
        assert_eq!(f.mounts_of("sdb").count(), 1);
    }
}
