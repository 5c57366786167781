//! Sensor module for ANT+ device communication.

pub mod ant;

pub use ant::{
    EmitterState, PageNumber, PedalBalance, PowerEmitter, PowerError, PowerPage, PowerSnapshot,
    ScanEntry, SensorState, StateTracker, TrackerMode,
};
