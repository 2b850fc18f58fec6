//! Integration tests for hostpulse-core.
//!
//! These drive the public API end to end:
//! wire text → session bootstrap → status updates → redraws on a surface.

use std::collections::BTreeMap;
use std::io::Cursor;

use hostpulse_core::source::drain;
use hostpulse_core::wire::DiskReading;
use hostpulse_core::{
    DashboardConfig, FamilyKind, Handled, JsonLinesSource, LegendOrder, Message, Navigation,
    RecordingSurface, Session, SessionInit, StatusUpdate, Window,
};

fn init_with_disks(disks: &[&str]) -> SessionInit {
    SessionInit {
        hostname: "testhost".into(),
        cpu_util: vec![Some(0.0), Some(0.0)],
        disk_io: disks
            .iter()
            .map(|d| (d.to_string(), DiskReading::default()))
            .collect(),
        sample_period_secs: Some(1.0),
        ..Default::default()
    }
}

fn disk_tick(disks: &[(&str, f64, f64)]) -> StatusUpdate {
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
                .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    }
}

fn start(init: SessionInit) -> (Session, RecordingSurface) {
    let mut session = Session::new(DashboardConfig::default());
    let mut surface = RecordingSurface::new();
    assert_eq!(
        session.handle(Message::SessionInit(Box::new(init)), &mut surface),
        Handled::Bootstrapped
    );
    (session, surface)
}

#[test]
fn cpu_average_scenario() {
    let (mut session, mut surface) = start(init_with_disks(&[]));
    let d = session.dashboard().unwrap();
    assert_eq!(d.capacity(), 31, "31s of history at 1s per sample");

    let update = StatusUpdate {
        cpu_util: Some(vec![Some(50.0), Some(50.0)]),
        ..Default::default()
    };
    session.handle(Message::StatusUpdate(Box::new(update)), &mut surface);

    let d = session.dashboard().unwrap();
    let avg = d.family(FamilyKind::CpuUtil).store().window("avg").and_then(Window::latest);
    assert_eq!(avg, Some(50.0));

    let frame = surface.last().unwrap();
    assert_eq!(frame.family, FamilyKind::CpuUtil);
    assert!(frame.layout.y_max >= 50.0 * 1.25, "axis {}", frame.layout.y_max);
    assert_eq!(frame.layout.legend_order, LegendOrder::Reversed);
    assert_eq!(d.ghost(FamilyKind::CpuUtil), "50.0%");
    assert_eq!(frame.legend()[0], "CPU avg: 50.0%");
}

#[test]
fn disk_removal_scenario() {
    let (mut session, mut surface) = start(init_with_disks(&["sda", "sdb"]));
    session.navigate(Navigation::SelectFamily(FamilyKind::DiskIo), &mut surface);
    {
        let d = session.dashboard().unwrap();
        let t = d.tracker(FamilyKind::DiskIo).unwrap();
        assert_eq!(t.selected(), Some("sda"));
    }

    session.handle(
        Message::StatusUpdate(Box::new(disk_tick(&[("sdb", 2048.0, 0.0)]))),
        &mut surface,
    );

    let d = session.dashboard().unwrap();
    let t = d.tracker(FamilyKind::DiskIo).unwrap();
    assert_eq!(t.entities(), ["sdb".to_string()]);
    assert_eq!(t.selected(), Some("sdb"));
    let store = d.family(FamilyKind::DiskIo).store();
    assert!(!store.contains("sda/read"));
    assert!(!store.contains("sda/write"));
    assert_eq!(store.len(), 2);

    let frame = surface.last().unwrap();
    assert_eq!(frame.family, FamilyKind::DiskIo);
    assert_eq!(frame.layout.chart_title, "Disk I/O: sdb");
    assert_eq!(frame.series.len(), 2);
    assert_eq!(frame.series[0].latest(), Some(2.0), "2 KB/s read on sdb");
}

#[test]
fn every_window_keeps_its_length() {
    let (mut session, mut surface) = start(init_with_disks(&["sda"]));
    let mut update = disk_tick(&[("sda", 1.0, 1.0)]);
    update.cpu_util = Some(vec![Some(1.0), Some(2.0)]);
    for i in 0..100 {
        if i == 40 {
            update = disk_tick(&[("sdb", 5.0, 5.0)]);
        }
        session.handle(Message::StatusUpdate(Box::new(update.clone())), &mut surface);
    }
    let d = session.dashboard().unwrap();
    for kind in FamilyKind::ALL {
        let store = d.family(kind).store();
        for key in store.channels() {
            assert_eq!(store.window(key).unwrap().capacity(), 31, "{kind} {key}");
        }
    }
}

#[test]
fn small_window_evicts_oldest() {
    let config = DashboardConfig {
        history_seconds: 5.0,
        ..Default::default()
    };
    let mut session = Session::new(config);
    let mut surface = RecordingSurface::new();
    session.handle(
        Message::SessionInit(Box::new(init_with_disks(&[]))),
        &mut surface,
    );
    for v in [10.0, 20.0, 30.0, 40.0, 50.0, 60.0] {
        let u = StatusUpdate {
            cpu_util: Some(vec![Some(v), Some(v)]),
            ..Default::default()
        };
        session.handle(Message::StatusUpdate(Box::new(u)), &mut surface);
    }
    let store = session.dashboard().unwrap().family(FamilyKind::CpuUtil).store();
    assert_eq!(
        store.snapshot("avg").unwrap(),
        vec![Some(20.0), Some(30.0), Some(40.0), Some(50.0), Some(60.0)]
    );
}

#[test]
fn family_key_repress_cycles_disks() {
    let (mut session, mut surface) = start(init_with_disks(&["sdb", "sda", "nvme0n1"]));
    session.navigate(Navigation::FamilyKey(FamilyKind::DiskIo), &mut surface);
    let selected = |s: &Session| {
        s.dashboard()
            .unwrap()
            .tracker(FamilyKind::DiskIo)
            .unwrap()
            .selected()
            .map(str::to_string)
    };
    assert_eq!(selected(&session).as_deref(), Some("nvme0n1"));
    session.navigate(Navigation::FamilyKey(FamilyKind::DiskIo), &mut surface);
    assert_eq!(selected(&session).as_deref(), Some("sda"));
    session.navigate(Navigation::PreviousEntity, &mut surface);
    assert_eq!(selected(&session).as_deref(), Some("nvme0n1"));
    assert_eq!(surface.last().unwrap().layout.chart_title, "Disk I/O: nvme0n1");
}

#[test]
fn missing_fields_leave_stale_families() {
    let (mut session, mut surface) = start(init_with_disks(&["sda"]));
    session.handle(
        Message::StatusUpdate(Box::new(disk_tick(&[("sda", 0.0, 0.0)]))),
        &mut surface,
    );
    let report = session.handle(
        Message::StatusUpdate(Box::new(StatusUpdate {
            cpu_util: Some(vec![Some(5.0), Some(5.0)]),
            ..Default::default()
        })),
        &mut surface,
    );
    let report = match report {
        Handled::Tick(r) => r,
        other => panic!("expected a tick, got {other:?}"),
    };
    assert!(report.skipped.contains(&FamilyKind::DiskIo));
    let d = session.dashboard().unwrap();
    assert_eq!(d.ghost(FamilyKind::DiskIo), "Idle");
    let read = d.family(FamilyKind::DiskIo).store().snapshot("sda/read").unwrap();
    assert_eq!(read.iter().filter(|c| c.is_some()).count(), 1);
}

#[test]
fn json_lines_capture_end_to_end() {
    let capture = concat!(
        r#"{"event":"connect"}"#, "\n",
        r#"{"event":"client_count","data":{"count":2}}"#, "\n",
        r#"{"event":"status_init","data":{"Hostname":"pi","Up_Time":90061,"CPU_Util":[1,1],"CPU_Temp":{"cpu_thermal":[41.2]},"Disk_IO":{"mmcblk0":{"read":0,"write":0}},"Total_Network_IO":{"tx":0,"rx":0},"Refresh_Period":1}}"#, "\n",
        "garbage line\n",
        r#"{"event":"status_update","data":{"CPU_Util":[10,30],"CPU_Temp":{"cpu_thermal":[43.0]},"Memory":{"RAM":536870912,"Swap":0},"Network_IO":{"tx":2048,"rx":1024},"Disk_IO":{"mmcblk0":{"read":0,"write":4096}}}}"#, "\n",
    );
    let mut source = JsonLinesSource::new(Cursor::new(capture));
    let mut session = Session::new(DashboardConfig::default());
    let mut surface = RecordingSurface::new();
    let delivered = drain(&mut source, |msg| {
        session.handle(msg, &mut surface);
    })
    .unwrap();
    assert_eq!(delivered, 4);

    let d = session.dashboard().unwrap();
    assert_eq!(d.host().hostname, "pi");
    assert_eq!(d.host().clients, Some(2));
    assert_eq!(d.host().uptime_label(), "1d 1h");

    let ghosts: BTreeMap<FamilyKind, &str> = d.ghosts().into_iter().collect();
    assert_eq!(ghosts[&FamilyKind::CpuUtil], "20.0%");
    assert_eq!(ghosts[&FamilyKind::CpuTemp], "43°C");
    assert_eq!(ghosts[&FamilyKind::Memory], "512 MB");
    assert_eq!(ghosts[&FamilyKind::NetworkIo], "Tx 2.0 KB/s");
    assert_eq!(ghosts[&FamilyKind::DiskIo], "W 4.0 KB/s");
    assert_eq!(ghosts[&FamilyKind::AuxPower], "No outlets");
}

#[test]
fn tiny_advertised_period_bootstraps_with_fallback() {
    let capture = r#"{"event":"status_init","data":{"Hostname":"x","CPU_Util":[0],"Refresh_Period":1e-18}}"#;
    let mut session = Session::new(DashboardConfig::default());
    let mut surface = RecordingSurface::new();
    let handled = session.handle(Message::from_json(capture).unwrap(), &mut surface);
    assert_eq!(handled, Handled::Bootstrapped);
    let d = session.dashboard().unwrap();
    assert_eq!(d.period_secs(), 1.0);
    assert_eq!(d.capacity(), 31);
}

#[test]
fn bad_power_reading_keeps_cpu_tick() {
    let mut session = Session::new(DashboardConfig::default());
    let mut surface = RecordingSurface::new();
    let lines = concat!(
        r#"{"event":"status_init","data":{"Hostname":"x","CPU_Util":[0,0],"Meross_Power":{"desk":1},"Refresh_Period":1}}"#,
        "\n",
        r#"{"event":"status_update","data":{"CPU_Util":[50,50],"Meross_Power":{"desk":"timeout"}}}"#,
        "\n",
    );
    let mut source = JsonLinesSource::new(Cursor::new(lines));
    let mut reports = Vec::new();
    drain(&mut source, |msg| reports.push(session.handle(msg, &mut surface))).unwrap();

    let tick = match reports.last() {
        Some(Handled::Tick(r)) => r.clone(),
        other => panic!("expected a tick, got {other:?}"),
    };
    assert!(tick.applied.contains(&FamilyKind::CpuUtil));
    assert!(tick.skipped.contains(&FamilyKind::AuxPower));
    assert_eq!(session.dashboard().unwrap().ghost(FamilyKind::CpuUtil), "50.0%");
}
