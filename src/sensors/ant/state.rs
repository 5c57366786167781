//! Per-device state of a bicycle power sensor.

use crate::sensors::ant::profiles::power::{PowerOnlyPage, PowerPage};
use crate::sensors::ant::rollover::{RolloverOutcome, RolloverState};
use serde::{Deserialize, Serialize};

pub use crate::sensors::ant::profiles::power::PedalBalance;

/// Last decoded values of one power sensor.
///
/// Fields that the sensor reported as unknown (0xFF) or that have not been
/// received yet are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    device_id: u16,
    /// Pedal power percentage, side may be unknown
    pub pedal_power: Option<u8>,
    /// Right pedal percentage, set together with `left_pedal_power`
    pub right_pedal_power: Option<u8>,
    pub left_pedal_power: Option<u8>,
    /// Instantaneous cadence in RPM
    pub cadence: Option<u8>,
    /// Raw accumulated power counter (wraps at 65536)
    pub accumulated_power: Option<u16>,
    /// Instantaneous power in watts
    pub power: Option<u16>,
    /// CTF zero offset in Hz, from the last offset calibration response
    pub calibration_offset: u16,
    /// CTF counters and calculated cadence, torque and power
    pub rollover: RolloverState,
}

impl SensorState {
    pub fn new(device_id: u16) -> Self {
        Self {
            device_id,
            pedal_power: None,
            right_pedal_power: None,
            left_pedal_power: None,
            cadence: None,
            accumulated_power: None,
            power: None,
            calibration_offset: 0,
            rollover: RolloverState::default(),
        }
    }

    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    /// Apply a decoded page.
    ///
    /// Returns the rollover outcome for CTF pages, `None` for the others.
    pub fn apply(&mut self, page: &PowerPage) -> Option<RolloverOutcome> {
        match page {
            PowerPage::Calibration(calibration) => {
                if let Some(offset) = calibration.ctf_offset() {
                    tracing::debug!("Device {} calibration offset {}", self.device_id, offset);
                    self.calibration_offset = offset;
                }
                None
            }
            PowerPage::PowerOnly(power_only) => {
                self.apply_power_only(power_only);
                None
            }
            PowerPage::CrankTorqueFrequency(ctf) => {
                Some(self.rollover.accumulate(ctf, self.calibration_offset))
            }
        }
    }

    /// Snapshot of this state with `page` applied.
    pub fn with_page(&self, page: &PowerPage) -> Self {
        let mut next = self.clone();
        next.apply(page);
        next
    }

    fn apply_power_only(&mut self, page: &PowerOnlyPage) {
        self.pedal_power = page.pedal_balance.percent();
        match page.pedal_balance.right_left() {
            Some((right, left)) => {
                self.right_pedal_power = Some(right);
                self.left_pedal_power = Some(left);
            }
            None => {
                self.right_pedal_power = None;
                self.left_pedal_power = None;
            }
        }
        self.cadence = page.cadence;
        self.accumulated_power = Some(page.accumulated_power);
        self.power = Some(page.instantaneous_power);
    }
}

/// State of a sensor seen while scanning, with signal quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    #[serde(flatten)]
    pub state: SensorState,
    /// Received signal strength in dBm
    pub rssi: Option<i8>,
    /// Proximity threshold reported with the RSSI
    pub threshold: Option<i8>,
}

impl ScanEntry {
    pub fn new(device_id: u16) -> Self {
        Self {
            state: SensorState::new(device_id),
            rssi: None,
            threshold: None,
        }
    }

    pub fn device_id(&self) -> u16 {
        self.state.device_id()
    }
}
