//! Unit tests for receive-side state tracking.

use antpower::sensors::ant::tracker::{PowerSnapshot, StateTracker, TrackerMode};
use antpower::sensors::ant::WILDCARD_DEVICE_ID;

/// Crank torque frequency payload with the trailing frame byte.
fn ctf(event_count: u8, slope: u16, time_stamp: u16, torque_ticks: u16) -> Vec<u8> {
    let mut data = vec![0x20, event_count, 0xFF];
    data.extend_from_slice(&slope.to_le_bytes());
    data.extend_from_slice(&time_stamp.to_le_bytes());
    data.extend_from_slice(&torque_ticks.to_le_bytes());
    data
}

#[test]
fn test_duplicate_ctf_page_publishes_unchanged_state() {
    let mut tracker = StateTracker::attach(55);
    let mut rx = tracker.subscribe();

    tracker.dispatch(55, &ctf(1, 200, 0, 0)).unwrap();
    let first = tracker.dispatch(55, &ctf(2, 200, 2_000, 500)).unwrap();
    let calculated = first.state().rollover.calculated_power;
    assert!(calculated.is_some());

    // Same counters again: recognized, published, nothing recalculated
    let repeat = tracker.dispatch(55, &ctf(2, 200, 2_000, 500)).unwrap();
    assert_eq!(repeat, first);

    let mut published = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        published.push(snapshot);
    }
    assert_eq!(published.len(), 3);
    let powers: Vec<_> = published
        .iter()
        .map(|s| s.state().rollover.calculated_power)
        .collect();
    assert_eq!(powers, vec![None, calculated, calculated]);
}

#[test]
fn test_calibration_then_ctf_in_scan_mode() {
    let mut tracker = StateTracker::scanner();
    tracker.dispatch(9, &[0x01, 0x10, 0x01, 0xFF, 0xFF, 0xFF, 0x64, 0x00]);
    tracker.dispatch(9, &ctf(1, 200, 0, 0));
    let snapshot = tracker.dispatch(9, &ctf(2, 200, 2_000, 500)).unwrap();

    assert!(matches!(snapshot, PowerSnapshot::Scan(_)));
    let state = snapshot.state();
    assert_eq!(state.calibration_offset, 100);
    assert_eq!(state.rollover.calculated_cadence, Some(60));
    let torque = state.rollover.calculated_torque.unwrap();
    assert!((torque - 20.0).abs() < 1e-9);
}

#[test]
fn test_scan_ignores_unknown_page_for_new_device() {
    let mut tracker = StateTracker::scanner();
    assert!(tracker.dispatch(3, &[0x52, 0xFF, 0, 0, 0, 0, 0, 0]).is_none());
    assert_eq!(tracker.device_count(), 0);
}

#[test]
fn test_devices_tracked_independently() {
    let mut tracker = StateTracker::scanner();
    tracker.dispatch(1, &[0x10, 1, 0xB2, 90, 0, 0, 200, 0]);
    tracker.dispatch(2, &[0x10, 1, 0xFF, 0xFF, 0, 0, 100, 0]);
    tracker.update_signal(2, -40, -80);

    let one = tracker.entry(1).unwrap();
    let two = tracker.entry(2).unwrap();
    assert_eq!(one.state.right_pedal_power, Some(50));
    assert_eq!(one.rssi, None);
    assert_eq!(two.state.right_pedal_power, None);
    assert_eq!(two.rssi, Some(-40));
}

#[test]
fn test_signal_update_creates_entry() {
    let mut tracker = StateTracker::scanner();
    assert!(tracker.update_signal(77, -70, -90));

    let entry = tracker.entry(77).unwrap();
    assert_eq!(entry.device_id(), 77);
    assert_eq!(entry.state.power, None);
}

#[test]
fn test_wildcard_mode_reports_bound_device() {
    let mut tracker = StateTracker::attach(WILDCARD_DEVICE_ID);
    assert_eq!(tracker.mode(), TrackerMode::Single { device_id: 0 });

    let snapshot = tracker
        .dispatch(31_098, &[0x10, 1, 0xFF, 0xFF, 0, 0, 0, 0])
        .unwrap();
    assert_eq!(snapshot.device_id(), 31_098);
    assert_eq!(tracker.sensor().unwrap().device_id(), 31_098);
}

#[test]
fn test_snapshot_json_shape() {
    let mut tracker = StateTracker::attach(5);
    let snapshot = tracker
        .dispatch(5, &[0x10, 1, 0xB2, 90, 0x10, 0x00, 0xFA, 0x00])
        .unwrap();

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["mode"], "sensor");
    assert_eq!(json["device_id"], 5);
    assert_eq!(json["power"], 250);
    assert_eq!(json["left_pedal_power"], 50);
}
