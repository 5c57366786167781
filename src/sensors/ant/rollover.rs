//! Rollover handling for the crank torque frequency page.
//!
//! The CTF page reports free-running counters. Cadence, torque and power are
//! derived from the difference between two consecutive pages, which needs
//! the previous counters and the rollover point of each one.

use crate::sensors::ant::profiles::power::CrankTorqueFrequencyPage;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Added to the event count when it wraps
pub const EVENT_COUNT_ROLLOVER: u32 = 255;

/// Added to the time stamp when it wraps (tick epoch of the CTF time base)
pub const TIME_STAMP_ROLLOVER: u32 = 65_400;

/// Added to the torque ticks stamp when it wraps
pub const TORQUE_TICKS_ROLLOVER: u32 = 65_535;

/// Seconds per time stamp tick (1/2000 s)
pub const TIME_STAMP_RESOLUTION_S: f64 = 0.0005;

/// Counter value after undoing a rollover between `old` and `new`.
pub fn unwrap_counter(old: u32, new: u32, rollover: u32) -> u32 {
    if old > new {
        new + rollover
    } else {
        new
    }
}

/// Last seen CTF counters and the values derived from them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolloverState {
    pub event_count: Option<u8>,
    pub time_stamp: Option<u16>,
    pub torque_ticks_stamp: Option<u16>,
    pub slope: Option<u16>,
    /// Cadence in RPM
    pub calculated_cadence: Option<u32>,
    /// Torque in Nm
    pub calculated_torque: Option<f64>,
    /// Power in watts
    pub calculated_power: Option<f64>,
}

/// One physical sample derived from two consecutive CTF pages
#[derive(Debug, Clone, PartialEq)]
pub struct CrankTorqueSample {
    pub elapsed_time_s: f64,
    pub event_delta: u32,
    pub torque_tick_delta: u32,
    pub cadence: u32,
    pub torque: f64,
    pub power: f64,
}

/// What a CTF page did to the rollover state
#[derive(Debug, Clone, PartialEq)]
pub enum RolloverOutcome {
    /// First page seen, counters stored
    Baseline,
    /// Event count or time stamp unchanged, nothing recalculated
    NoNewEvent,
    /// New event, calculated values updated
    Sample(CrankTorqueSample),
    /// Counters moved but cannot produce a sample; calculated values cleared
    Degenerate,
}

impl RolloverState {
    /// Fold a CTF page into the state.
    ///
    /// The page counters always become the new baseline. A sample is only
    /// computed when both the event count and the time stamp changed.
    pub fn accumulate(
        &mut self,
        page: &CrankTorqueFrequencyPage,
        calibration_offset: u16,
    ) -> RolloverOutcome {
        let previous = (self.event_count, self.time_stamp, self.torque_ticks_stamp);

        self.event_count = Some(page.event_count);
        self.time_stamp = Some(page.time_stamp);
        self.torque_ticks_stamp = Some(page.torque_ticks_stamp);
        self.slope = Some(page.slope);

        let (Some(old_events), Some(old_time), Some(old_ticks)) = previous else {
            return RolloverOutcome::Baseline;
        };

        if page.time_stamp == old_time || page.event_count == old_events {
            return RolloverOutcome::NoNewEvent;
        }

        match compute_sample(old_events, old_time, old_ticks, page, calibration_offset) {
            Some(sample) => {
                self.calculated_cadence = Some(sample.cadence);
                self.calculated_torque = Some(sample.torque);
                self.calculated_power = Some(sample.power);
                RolloverOutcome::Sample(sample)
            }
            None => {
                tracing::warn!(
                    "Discarding CTF sample: events {} -> {}, time stamp {} -> {}, slope {}",
                    old_events,
                    page.event_count,
                    old_time,
                    page.time_stamp,
                    page.slope
                );
                self.calculated_cadence = None;
                self.calculated_torque = None;
                self.calculated_power = None;
                RolloverOutcome::Degenerate
            }
        }
    }
}

/// Derive cadence, torque and power, or `None` when the deltas would
/// divide by zero or run backwards.
fn compute_sample(
    old_events: u8,
    old_time: u16,
    old_ticks: u16,
    page: &CrankTorqueFrequencyPage,
    calibration_offset: u16,
) -> Option<CrankTorqueSample> {
    let events = unwrap_counter(old_events as u32, page.event_count as u32, EVENT_COUNT_ROLLOVER);
    let time = unwrap_counter(old_time as u32, page.time_stamp as u32, TIME_STAMP_ROLLOVER);
    let ticks = unwrap_counter(
        old_ticks as u32,
        page.torque_ticks_stamp as u32,
        TORQUE_TICKS_ROLLOVER,
    );

    // Stamps above the time epoch can unwrap to a non-positive delta
    let elapsed_ticks = time.checked_sub(old_time as u32).filter(|&t| t > 0)?;
    let event_delta = events.checked_sub(old_events as u32).filter(|&e| e > 0)?;
    let torque_tick_delta = ticks.checked_sub(old_ticks as u32)?;
    if page.slope == 0 {
        return None;
    }

    let elapsed_time_s = elapsed_ticks as f64 * TIME_STAMP_RESOLUTION_S;
    let cadence_period = elapsed_time_s / event_delta as f64;
    let cadence = (60.0 / cadence_period).round() as u32;

    // No torque ticks means zero frequency
    let tick_frequency = if torque_tick_delta == 0 {
        0.0
    } else {
        1.0 / (elapsed_time_s / torque_tick_delta as f64)
    };
    let torque_frequency = tick_frequency - calibration_offset as f64;
    let torque = torque_frequency / (page.slope as f64 / 10.0);
    let power = torque * cadence as f64 * PI / 30.0;

    Some(CrankTorqueSample {
        elapsed_time_s,
        event_delta,
        torque_tick_delta,
        cadence,
        torque,
        power,
    })
}
