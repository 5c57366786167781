//! ANT+ Bicycle Power Support
//!
//! This module decodes pages received from ANT+ power meters and builds the
//! pages a virtual power meter broadcasts. The radio channel itself (dongle,
//! framing, checksum) is owned by the transport; everything here works on the
//! 8-byte payload of a broadcast message.

pub mod emitter;
pub mod profiles;
pub mod rollover;
pub mod state;
pub mod tracker;

use thiserror::Error;

// Re-export main types
pub use emitter::{EmitterState, PowerEmitter};
pub use profiles::power::{PageNumber, PowerPage};
pub use rollover::{CrankTorqueSample, RolloverState};
pub use state::{PedalBalance, ScanEntry, SensorState};
pub use tracker::{PowerSnapshot, StateTracker, TrackerMode};

/// ANT+ device type of a bicycle power sensor
pub const DEVICE_TYPE_BICYCLE_POWER: u8 = 0x0B;

/// Channel period in 32768 Hz ticks (~4.00 Hz)
pub const CHANNEL_PERIOD: u16 = 8182;

/// ANT+ RF frequency offset from 2400 MHz
pub const RF_FREQUENCY: u8 = 57;

/// Transmission type used when searching (wildcard)
pub const RECEIVE_TRANSMISSION_TYPE: u8 = 0;

/// Transmission type broadcast by the virtual power meter
pub const EMITTER_TRANSMISSION_TYPE: u8 = 0x05;

/// Device number 0 matches any sensor during search
pub const WILDCARD_DEVICE_ID: u16 = 0;

/// Length of an ANT+ broadcast payload
pub const PAYLOAD_LEN: usize = 8;

/// One ANT+ broadcast payload
pub type Payload = [u8; PAYLOAD_LEN];

/// Duration of one channel period, i.e. the transmit tick of the emitter.
pub fn channel_period() -> std::time::Duration {
    std::time::Duration::from_micros(CHANNEL_PERIOD as u64 * 1_000_000 / 32_768)
}

/// Errors that can occur in the bicycle power profile
#[derive(Debug, Error, PartialEq)]
pub enum PowerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Payload too short: expected {expected} bytes, got {actual}")]
    PayloadTooShort { expected: usize, actual: usize },

    #[error("Unexpected page number: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedPage { expected: u8, actual: u8 },
}

/// Result type for bicycle power operations
pub type PowerResult<T> = Result<T, PowerError>;
