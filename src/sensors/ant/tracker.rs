//! Receive-side state tracking.
//!
//! A [`StateTracker`] follows either one attached power sensor or every
//! power sensor heard while scanning. Each recognized page produces a full
//! snapshot of the affected device, published on a broadcast channel.

use crate::sensors::ant::profiles::power::PowerPage;
use crate::sensors::ant::rollover::RolloverOutcome;
use crate::sensors::ant::state::{ScanEntry, SensorState};
use crate::sensors::ant::WILDCARD_DEVICE_ID;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Default number of snapshots buffered per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// How the tracker binds to devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerMode {
    /// One sensor; device id 0 binds to the first sensor heard
    Single { device_id: u16 },
    /// Every sensor heard, keyed by device id
    Scan,
}

/// Published state of one device
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PowerSnapshot {
    Sensor(SensorState),
    Scan(ScanEntry),
}

impl PowerSnapshot {
    pub fn state(&self) -> &SensorState {
        match self {
            PowerSnapshot::Sensor(state) => state,
            PowerSnapshot::Scan(entry) => &entry.state,
        }
    }

    pub fn device_id(&self) -> u16 {
        self.state().device_id()
    }
}

#[derive(Debug)]
struct ScannedDevice {
    entry: ScanEntry,
    last_seen: Instant,
}

impl ScannedDevice {
    fn new(device_id: u16) -> Self {
        tracing::info!("Discovered power sensor {}", device_id);
        Self {
            entry: ScanEntry::new(device_id),
            last_seen: Instant::now(),
        }
    }
}

#[derive(Debug)]
enum Tracked {
    Single(SensorState),
    Scan(HashMap<u16, ScannedDevice>),
}

/// Decodes inbound payloads into per-device state and publishes snapshots
pub struct StateTracker {
    tracked: Tracked,
    event_tx: broadcast::Sender<PowerSnapshot>,
}

impl StateTracker {
    /// Create a tracker buffering up to `capacity` snapshots per subscriber.
    pub fn new(mode: TrackerMode, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        let tracked = match mode {
            TrackerMode::Single { device_id } => {
                tracing::info!("Attached power sensor tracker to device {}", device_id);
                Tracked::Single(SensorState::new(device_id))
            }
            TrackerMode::Scan => {
                tracing::info!("Scanning for power sensors");
                Tracked::Scan(HashMap::new())
            }
        };

        Self { tracked, event_tx }
    }

    /// Track a single sensor.
    pub fn attach(device_id: u16) -> Self {
        Self::new(TrackerMode::Single { device_id }, DEFAULT_EVENT_CAPACITY)
    }

    /// Track every sensor heard.
    pub fn scanner() -> Self {
        Self::new(TrackerMode::Scan, DEFAULT_EVENT_CAPACITY)
    }

    pub fn mode(&self) -> TrackerMode {
        match &self.tracked {
            Tracked::Single(state) => TrackerMode::Single {
                device_id: state.device_id(),
            },
            Tracked::Scan(_) => TrackerMode::Scan,
        }
    }

    /// Subscribe to published snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<PowerSnapshot> {
        self.event_tx.subscribe()
    }

    /// Handle one inbound payload from `device_id`.
    ///
    /// Pages that carry no state are ignored: nothing changes and nothing
    /// is published. Otherwise the updated snapshot is published and
    /// returned.
    pub fn dispatch(&mut self, device_id: u16, data: &[u8]) -> Option<PowerSnapshot> {
        let Some(page) = PowerPage::parse(data) else {
            tracing::debug!(
                "Ignoring page {:#04x} from device {}",
                data.first().copied().unwrap_or_default(),
                device_id
            );
            return None;
        };

        let snapshot = match &mut self.tracked {
            Tracked::Single(state) => {
                if state.device_id() == WILDCARD_DEVICE_ID && device_id != WILDCARD_DEVICE_ID {
                    tracing::info!("Paired with power sensor {}", device_id);
                    *state = SensorState::new(device_id);
                } else if state.device_id() != device_id {
                    tracing::warn!(
                        "Ignoring payload from device {} while attached to {}",
                        device_id,
                        state.device_id()
                    );
                    return None;
                }
                log_outcome(device_id, state.apply(&page));
                PowerSnapshot::Sensor(state.clone())
            }
            Tracked::Scan(devices) => {
                let device = devices
                    .entry(device_id)
                    .or_insert_with(|| ScannedDevice::new(device_id));
                device.last_seen = Instant::now();
                log_outcome(device_id, device.entry.state.apply(&page));
                PowerSnapshot::Scan(device.entry.clone())
            }
        };

        self.publish(snapshot.clone());
        Some(snapshot)
    }

    /// Record signal quality reported alongside a payload (scan mode).
    ///
    /// Decoded fields are left alone. Returns `false` in single-sensor mode.
    pub fn update_signal(&mut self, device_id: u16, rssi: i8, threshold: i8) -> bool {
        let Tracked::Scan(devices) = &mut self.tracked else {
            return false;
        };

        let device = devices
            .entry(device_id)
            .or_insert_with(|| ScannedDevice::new(device_id));
        device.entry.rssi = Some(rssi);
        device.entry.threshold = Some(threshold);
        device.last_seen = Instant::now();
        true
    }

    /// State of the attached sensor (single-sensor mode)
    pub fn sensor(&self) -> Option<&SensorState> {
        match &self.tracked {
            Tracked::Single(state) => Some(state),
            Tracked::Scan(_) => None,
        }
    }

    /// Entry for one scanned device
    pub fn entry(&self, device_id: u16) -> Option<&ScanEntry> {
        match &self.tracked {
            Tracked::Scan(devices) => devices.get(&device_id).map(|d| &d.entry),
            Tracked::Single(_) => None,
        }
    }

    /// All scanned devices, ordered by device id
    pub fn entries(&self) -> Vec<&ScanEntry> {
        let mut entries: Vec<&ScanEntry> = match &self.tracked {
            Tracked::Scan(devices) => devices.values().map(|d| &d.entry).collect(),
            Tracked::Single(_) => Vec::new(),
        };
        entries.sort_by_key(|e| e.device_id());
        entries
    }

    /// Number of tracked devices
    pub fn device_count(&self) -> usize {
        match &self.tracked {
            Tracked::Single(_) => 1,
            Tracked::Scan(devices) => devices.len(),
        }
    }

    /// Drop a scanned device
    pub fn forget(&mut self, device_id: u16) -> Option<ScanEntry> {
        match &mut self.tracked {
            Tracked::Scan(devices) => devices.remove(&device_id).map(|d| d.entry),
            Tracked::Single(_) => None,
        }
    }

    /// Drop scanned devices not heard from within `max_age`.
    ///
    /// Returns the removed device ids. Entries are otherwise kept forever.
    pub fn prune_stale(&mut self, max_age: Duration) -> Vec<u16> {
        let Tracked::Scan(devices) = &mut self.tracked else {
            return Vec::new();
        };

        let now = Instant::now();
        let mut removed: Vec<u16> = devices
            .iter()
            .filter(|(_, d)| now.duration_since(d.last_seen) >= max_age)
            .map(|(&id, _)| id)
            .collect();
        removed.sort_unstable();

        for id in &removed {
            devices.remove(id);
        }
        if !removed.is_empty() {
            tracing::info!("Pruned stale power sensors {:?}", removed);
        }
        removed
    }

    fn publish(&self, snapshot: PowerSnapshot) {
        // No subscribers is not an error
        let _ = self.event_tx.send(snapshot);
    }
}

fn log_outcome(device_id: u16, outcome: Option<RolloverOutcome>) {
    match outcome {
        Some(RolloverOutcome::Sample(sample)) => tracing::debug!(
            "Device {} CTF sample: {} rpm, {:.2} Nm, {:.1} W",
            device_id,
            sample.cadence,
            sample.torque,
            sample.power
        ),
        Some(RolloverOutcome::NoNewEvent) => {
            tracing::debug!("Device {} CTF page without new event", device_id)
        }
        _ => {}
    }
}
