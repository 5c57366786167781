//! Virtual power meter.
//!
//! The application reports power through the `set_*` methods as often as it
//! has data; the transport calls [`PowerEmitter::next_page`] once per channel
//! period and broadcasts whatever payload comes back.

use crate::sensors::ant::profiles::power::{PedalBalance, PowerOnlyPage};
use crate::sensors::ant::profiles::{EncodablePage, ManufacturerInfo, ProductInfo};
use crate::sensors::ant::{Payload, PowerError, PowerResult};
use crate::storage::config::EmitterSettings;
use serde::{Deserialize, Serialize};

/// Length of the interleave cycle in transmitted pages
pub const INTERLEAVE_CYCLE: u8 = 121;

/// Message count at which the manufacturer information page is sent
pub const MANUFACTURER_INFO_SLOT: u8 = 60;

/// Message count at which the product information page is sent
pub const PRODUCT_INFO_SLOT: u8 = 120;

/// Largest cadence that does not collide with the "unknown" sentinel
const MAX_CADENCE: f64 = 254.0;

/// What the emitter reports and the counters it broadcasts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterState {
    /// Watts to report; nothing is sent until this is set
    pub pending_power: Option<u16>,
    /// Pedal contribution; `Unknown` when only total power is known
    pub pending_pedal_power: PedalBalance,
    /// Crank cadence in RPM
    pub pending_cadence: Option<u8>,
    /// Bumped on every update
    pub power_event_count: u8,
    /// Sum of reported watts, bumped on every update
    pub accumulated_power: u16,
    /// Position in the interleave cycle, bumped on every transmitted page
    pub message_count: u8,
}

/// Schedules the pages of a virtual bicycle power sensor
#[derive(Debug, Clone)]
pub struct PowerEmitter {
    device_id: u16,
    state: EmitterState,
    manufacturer_info: ManufacturerInfo,
    product_info: ProductInfo,
}

impl PowerEmitter {
    /// Create an emitter with development manufacturer and product pages.
    pub fn new(device_id: u16) -> Self {
        Self::from_settings(&EmitterSettings {
            device_id,
            ..EmitterSettings::default()
        })
    }

    pub fn from_settings(settings: &EmitterSettings) -> Self {
        Self {
            device_id: settings.device_id,
            state: EmitterState::default(),
            manufacturer_info: ManufacturerInfo {
                hw_revision: settings.hw_revision,
                manufacturer_id: settings.manufacturer_id,
                model_number: settings.model_number,
            },
            product_info: ProductInfo::from_revision(
                settings.sw_revision,
                settings.serial_number,
            ),
        }
    }

    pub fn device_id(&self) -> u16 {
        self.device_id
    }

    pub fn state(&self) -> &EmitterState {
        &self.state
    }

    /// Report power measured on each pedal.
    pub fn set_pedal_power(
        &mut self,
        left: f64,
        right: f64,
        cadence: Option<f64>,
    ) -> PowerResult<()> {
        let left = validate_watts("left pedal power", left)?;
        let right = validate_watts("right pedal power", right)?;
        let power = round_power(left + right)?;
        let cadence = round_cadence(cadence)?;

        let balance = match share_percent(right, power) {
            Some(percent) => PedalBalance::Right(percent),
            None => PedalBalance::Unknown,
        };
        self.commit(power, balance, cadence);
        Ok(())
    }

    /// Report power measured on two pedals whose sides are not known.
    pub fn set_unknown_pedal_power(
        &mut self,
        first: f64,
        second: f64,
        cadence: Option<f64>,
    ) -> PowerResult<()> {
        let first = validate_watts("first pedal power", first)?;
        let second = validate_watts("second pedal power", second)?;
        let power = round_power(first + second)?;
        let cadence = round_cadence(cadence)?;

        let balance = match share_percent(first, power) {
            Some(percent) => PedalBalance::Unattributed(percent),
            None => PedalBalance::Unknown,
        };
        self.commit(power, balance, cadence);
        Ok(())
    }

    /// Report total power only.
    pub fn set_power(&mut self, power: f64, cadence: Option<f64>) -> PowerResult<()> {
        let power = round_power(validate_watts("power", power)?)?;
        let cadence = round_cadence(cadence)?;

        self.commit(power, PedalBalance::Unknown, cadence);
        Ok(())
    }

    /// Build the payload for this transmit tick.
    ///
    /// Returns `None` until power has been reported once. The manufacturer
    /// and product information pages each take one slot of the cycle; every
    /// other slot carries the power-only page.
    pub fn next_page(&mut self) -> Option<Payload> {
        let power = self.state.pending_power?;

        let payload = match self.state.message_count {
            MANUFACTURER_INFO_SLOT => self.manufacturer_info.encode(),
            PRODUCT_INFO_SLOT => self.product_info.encode(),
            _ => PowerOnlyPage {
                event_count: self.state.power_event_count,
                pedal_balance: self.state.pending_pedal_power,
                cadence: self.state.pending_cadence,
                accumulated_power: self.state.accumulated_power,
                instantaneous_power: power,
            }
            .encode(),
        };

        self.state.message_count = (self.state.message_count + 1) % INTERLEAVE_CYCLE;
        Some(payload)
    }

    fn commit(&mut self, power: u16, balance: PedalBalance, cadence: Option<u8>) {
        self.state.pending_power = Some(power);
        self.state.pending_pedal_power = balance;
        self.state.pending_cadence = cadence;
        self.state.power_event_count = self.state.power_event_count.wrapping_add(1);
        self.state.accumulated_power = self.state.accumulated_power.wrapping_add(power);

        tracing::trace!(
            "Emitter {} power {} W, event {}, accumulated {}",
            self.device_id,
            power,
            self.state.power_event_count,
            self.state.accumulated_power
        );
    }
}

fn validate_watts(name: &str, value: f64) -> PowerResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(PowerError::InvalidArgument(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(value)
}

fn round_power(watts: f64) -> PowerResult<u16> {
    let rounded = watts.round();
    if rounded > u16::MAX as f64 {
        return Err(PowerError::InvalidArgument(format!(
            "power {} W exceeds {} W",
            rounded,
            u16::MAX
        )));
    }
    Ok(rounded as u16)
}

fn round_cadence(cadence: Option<f64>) -> PowerResult<Option<u8>> {
    let Some(cadence) = cadence else {
        return Ok(None);
    };
    let rounded = cadence.round();
    if !rounded.is_finite() || !(0.0..=MAX_CADENCE).contains(&rounded) {
        return Err(PowerError::InvalidArgument(format!(
            "cadence must be between 0 and {} rpm, got {}",
            MAX_CADENCE, cadence
        )));
    }
    Ok(Some(rounded as u8))
}

/// Share of `part` in the rounded total, `None` when the total is zero.
fn share_percent(part: f64, total: u16) -> Option<u8> {
    if total == 0 {
        return None;
    }
    Some((part / total as f64 * 100.0).round().min(100.0) as u8)
}
