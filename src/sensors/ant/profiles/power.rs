//! ANT+ Bicycle Power Profile
//!
//! Page codec for the ANT+ Bicycle Power device profile (device type 11).
//! Three pages carry state: calibration (0x01), power-only (0x10) and crank
//! torque frequency (0x20). Every other page is ignored by the receiver.

use super::{read_u16_le, AntProfilePage, EncodablePage};
use crate::sensors::ant::{Payload, PAYLOAD_LEN};
use serde::{Deserialize, Serialize};

/// Calibration ID of a crank torque frequency defined message
pub const CALIBRATION_ID_CTF: u8 = 0x10;

/// CTF calibration parameter announcing the zero offset
pub const CTF_PARAMETER_OFFSET: u8 = 0x01;

/// Sentinel for "unknown" in 8-bit fields
pub const UNKNOWN_BYTE: u8 = 0xFF;

/// Bit 7 of the pedal power byte: the percentage is the right pedal's
const PEDAL_RIGHT_FLAG: u8 = 0x80;

/// Lower 7 bits of the pedal power byte
const PEDAL_PERCENT_MASK: u8 = 0x7F;

/// Data page numbers of the Bicycle Power profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PageNumber {
    Calibration = 0x01,
    GetSetParameters = 0x02,
    MeasurementOutput = 0x03,
    PowerOnly = 0x10,
    WheelTorque = 0x11,
    CrankTorque = 0x12,
    TorqueEffectivenessPedalSmoothness = 0x13,
    TorqueBarycentre = 0x14,
    CrankTorqueFrequency = 0x20,
    RightPedalForceAngle = 0xE0,
    LeftPedalForceAngle = 0xE1,
    PedalPosition = 0xE2,
}

impl PageNumber {
    /// Look up a page byte, `None` when the profile does not define it
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => PageNumber::Calibration,
            0x02 => PageNumber::GetSetParameters,
            0x03 => PageNumber::MeasurementOutput,
            0x10 => PageNumber::PowerOnly,
            0x11 => PageNumber::WheelTorque,
            0x12 => PageNumber::CrankTorque,
            0x13 => PageNumber::TorqueEffectivenessPedalSmoothness,
            0x14 => PageNumber::TorqueBarycentre,
            0x20 => PageNumber::CrankTorqueFrequency,
            0xE0 => PageNumber::RightPedalForceAngle,
            0xE1 => PageNumber::LeftPedalForceAngle,
            0xE2 => PageNumber::PedalPosition,
            _ => return None,
        })
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Pedal power contribution carried in byte 2 of the power-only page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum PedalBalance {
    /// Pedal power not reported (0xFF)
    #[default]
    Unknown,
    /// Percentage of total power from the right pedal
    Right(u8),
    /// Percentage from one pedal, side not known
    Unattributed(u8),
}

impl PedalBalance {
    pub fn from_byte(byte: u8) -> Self {
        if byte == UNKNOWN_BYTE {
            PedalBalance::Unknown
        } else if byte & PEDAL_RIGHT_FLAG != 0 {
            PedalBalance::Right(byte & PEDAL_PERCENT_MASK)
        } else {
            PedalBalance::Unattributed(byte & PEDAL_PERCENT_MASK)
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            PedalBalance::Unknown => UNKNOWN_BYTE,
            PedalBalance::Right(percent) => PEDAL_RIGHT_FLAG | (percent & PEDAL_PERCENT_MASK),
            PedalBalance::Unattributed(percent) => percent & PEDAL_PERCENT_MASK,
        }
    }

    /// Reported percentage regardless of side
    pub fn percent(self) -> Option<u8> {
        match self {
            PedalBalance::Unknown => None,
            PedalBalance::Right(percent) | PedalBalance::Unattributed(percent) => Some(percent),
        }
    }

    /// `(right, left)` percentages, only when the side is known.
    ///
    /// Both halves always sum to 100; a right percentage above 100 cannot
    /// be split and yields `None`.
    pub fn right_left(self) -> Option<(u8, u8)> {
        match self {
            PedalBalance::Right(right) if right <= 100 => Some((right, 100 - right)),
            _ => None,
        }
    }
}

fn optional_byte(byte: u8) -> Option<u8> {
    if byte == UNKNOWN_BYTE {
        None
    } else {
        Some(byte)
    }
}

/// Calibration page (Page 0x01)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationPage {
    pub calibration_id: u8,
    pub calibration_parameter: u8,
    /// Little-endian value in bytes 6-7
    pub value: u16,
}

impl CalibrationPage {
    /// Zero offset announced by a CTF sensor, if this page carries one
    pub fn ctf_offset(&self) -> Option<u16> {
        (self.calibration_id == CALIBRATION_ID_CTF
            && self.calibration_parameter == CTF_PARAMETER_OFFSET)
            .then_some(self.value)
    }
}

impl AntProfilePage for CalibrationPage {
    const PAGE_NUMBER: u8 = 0x01;

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PAYLOAD_LEN || data[0] != Self::PAGE_NUMBER {
            return None;
        }

        Some(Self {
            calibration_id: data[1],
            calibration_parameter: data[2],
            value: read_u16_le(data, 6),
        })
    }
}

impl EncodablePage for CalibrationPage {
    fn encode(&self) -> Payload {
        let [lo, hi] = self.value.to_le_bytes();
        [
            Self::PAGE_NUMBER,
            self.calibration_id,
            self.calibration_parameter,
            UNKNOWN_BYTE,
            UNKNOWN_BYTE,
            UNKNOWN_BYTE,
            lo,
            hi,
        ]
    }
}

/// Power-only data page (Page 0x10 / 16)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerOnlyPage {
    /// Update event count (wraps at 255)
    pub event_count: u8,
    /// Pedal power contribution
    pub pedal_balance: PedalBalance,
    /// Instantaneous cadence (if available)
    pub cadence: Option<u8>,
    /// Accumulated power (wraps at 65535)
    pub accumulated_power: u16,
    /// Instantaneous power in watts
    pub instantaneous_power: u16,
}

impl AntProfilePage for PowerOnlyPage {
    const PAGE_NUMBER: u8 = 0x10;

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PAYLOAD_LEN || data[0] != Self::PAGE_NUMBER {
            return None;
        }

        Some(Self {
            event_count: data[1],
            pedal_balance: PedalBalance::from_byte(data[2]),
            cadence: optional_byte(data[3]),
            accumulated_power: u16::from_le_bytes([data[4], data[5]]),
            instantaneous_power: u16::from_le_bytes([data[6], data[7]]),
        })
    }
}

impl EncodablePage for PowerOnlyPage {
    fn encode(&self) -> Payload {
        let [acc_lo, acc_hi] = self.accumulated_power.to_le_bytes();
        let [power_lo, power_hi] = self.instantaneous_power.to_le_bytes();
        [
            Self::PAGE_NUMBER,
            self.event_count,
            self.pedal_balance.to_byte(),
            self.cadence.unwrap_or(UNKNOWN_BYTE),
            acc_lo,
            acc_hi,
            power_lo,
            power_hi,
        ]
    }
}

/// Crank torque frequency page (Page 0x20 / 32)
///
/// Fields are read little-endian at odd offsets; the torque ticks field
/// starts in the last payload byte, so its high byte comes from whatever
/// trailing frame byte the transport delivers (zero if none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrankTorqueFrequencyPage {
    /// Update event count
    pub event_count: u8,
    /// Slope (1/10 Nm/Hz)
    pub slope: u16,
    /// Time stamp (1/2000 second)
    pub time_stamp: u16,
    /// Accumulated torque ticks
    pub torque_ticks_stamp: u16,
}

impl AntProfilePage for CrankTorqueFrequencyPage {
    const PAGE_NUMBER: u8 = 0x20;

    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PAYLOAD_LEN || data[0] != Self::PAGE_NUMBER {
            return None;
        }

        Some(Self {
            event_count: data[1],
            slope: read_u16_le(data, 3),
            time_stamp: read_u16_le(data, 5),
            torque_ticks_stamp: read_u16_le(data, 7),
        })
    }
}

/// A decoded page that changes sensor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerPage {
    Calibration(CalibrationPage),
    PowerOnly(PowerOnlyPage),
    CrankTorqueFrequency(CrankTorqueFrequencyPage),
}

impl PowerPage {
    /// Decode a payload by its page byte.
    ///
    /// Returns `None` for pages that carry no state and for short buffers.
    pub fn parse(data: &[u8]) -> Option<Self> {
        match PageNumber::from_byte(*data.first()?)? {
            PageNumber::Calibration => CalibrationPage::parse(data).map(PowerPage::Calibration),
            PageNumber::PowerOnly => PowerOnlyPage::parse(data).map(PowerPage::PowerOnly),
            PageNumber::CrankTorqueFrequency => {
                CrankTorqueFrequencyPage::parse(data).map(PowerPage::CrankTorqueFrequency)
            }
            _ => None,
        }
    }

    pub fn page_number(&self) -> PageNumber {
        match self {
            PowerPage::Calibration(_) => PageNumber::Calibration,
            PowerPage::PowerOnly(_) => PageNumber::PowerOnly,
            PowerPage::CrankTorqueFrequency(_) => PageNumber::CrankTorqueFrequency,
        }
    }
}
