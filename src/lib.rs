//! AntPower - ANT+ Bicycle Power Profile
//!
//! Decodes the data pages broadcast by ANT+ power meters into per-sensor
//! state, and schedules the pages of a virtual power meter. The ANT radio
//! channel is left to the transport: this crate consumes and produces the
//! 8-byte payloads of broadcast messages.

pub mod sensors;
pub mod storage;

// Re-export commonly used types
pub use sensors::ant::{PowerEmitter, PowerSnapshot, SensorState, StateTracker};
pub use storage::config::AppConfig;
