//! Unit tests for the Bicycle Power page codec.
//!
//! Tests cover power-only, calibration and crank torque frequency pages,
//! plus the common manufacturer and product pages.

use antpower::sensors::ant::profiles::power::{
    CalibrationPage, CrankTorqueFrequencyPage, PageNumber, PedalBalance, PowerOnlyPage, PowerPage,
};
use antpower::sensors::ant::profiles::{
    AntProfilePage, EncodablePage, ManufacturerInfo, ProductInfo,
};
use antpower::sensors::ant::{PowerError, SensorState};

// =============================================================================
// Power-Only Page Tests
// =============================================================================

#[test]
fn test_power_only_page_complete_data() {
    let data = [0x10, 0x0A, 0xB2, 0x5A, 0xE8, 0x03, 0x64, 0x00];
    let page = PowerOnlyPage::parse(&data).unwrap();

    assert_eq!(page.event_count, 10);
    assert_eq!(page.pedal_balance, PedalBalance::Right(50));
    assert_eq!(page.cadence, Some(90));
    assert_eq!(page.accumulated_power, 1000);
    assert_eq!(page.instantaneous_power, 100);
}

#[test]
fn test_right_and_left_always_sum_to_100() {
    for percent in 0..=100u8 {
        let data = [0x10, 0x01, 0x80 | percent, 0x5A, 0, 0, 0, 0];
        let state = SensorState::new(1).with_page(&PowerPage::parse(&data).unwrap());

        let right = state.right_pedal_power.unwrap();
        let left = state.left_pedal_power.unwrap();
        assert_eq!(right as u16 + left as u16, 100, "pedal byte {:#04x}", data[2]);
        assert_eq!(state.pedal_power, Some(percent));
    }
}

#[test]
fn test_unknown_pedal_power_clears_all_three() {
    let data = [0x10, 0x01, 0xFF, 0x5A, 0, 0, 0, 0];
    let state = SensorState::new(1).with_page(&PowerPage::parse(&data).unwrap());

    assert_eq!(state.pedal_power, None);
    assert_eq!(state.right_pedal_power, None);
    assert_eq!(state.left_pedal_power, None);
    assert_eq!(state.cadence, Some(90));
}

#[test]
fn test_unknown_cadence() {
    let data = [0x10, 0x01, 0x32, 0xFF, 0, 0, 0xC8, 0x00];
    let page = PowerOnlyPage::parse(&data).unwrap();

    assert_eq!(page.cadence, None);
    assert_eq!(page.pedal_balance, PedalBalance::Unattributed(50));
    assert_eq!(page.instantaneous_power, 200);
}

#[test]
fn test_power_only_short_buffer() {
    assert!(PowerOnlyPage::parse(&[0x10, 0x01, 0x32]).is_none());
    assert_eq!(
        PowerOnlyPage::try_parse(&[0x10, 0x01, 0x32]),
        Err(PowerError::PayloadTooShort {
            expected: 8,
            actual: 3
        })
    );
}

// =============================================================================
// Calibration Page Tests
// =============================================================================

#[test]
fn test_calibration_offset_response() {
    let page = CalibrationPage {
        calibration_id: 0x10,
        calibration_parameter: 0x01,
        value: 0x0203,
    };
    let data = page.encode();
    assert_eq!(&data[6..], &[0x03, 0x02]);

    let state = SensorState::new(1).with_page(&PowerPage::parse(&data).unwrap());
    assert_eq!(state.calibration_offset, 0x0203);
}

#[test]
fn test_other_calibration_pages_are_no_ops() {
    for (id, parameter) in [(0xAA, 0x01), (0x10, 0x02), (0xAC, 0x00)] {
        let data = [0x01, id, parameter, 0xFF, 0xFF, 0xFF, 0x34, 0x12];
        let state = SensorState::new(1).with_page(&PowerPage::parse(&data).unwrap());
        assert_eq!(state, SensorState::new(1));
    }
}

// =============================================================================
// Crank Torque Frequency Page Tests
// =============================================================================

#[test]
fn test_ctf_page_offsets() {
    let data = [0x20, 0xFE, 0x00, 0x34, 0x12, 0x78, 0x56, 0xBC, 0x9A];
    let page = CrankTorqueFrequencyPage::parse(&data).unwrap();

    assert_eq!(page.event_count, 0xFE);
    assert_eq!(page.slope, 0x1234);
    assert_eq!(page.time_stamp, 0x5678);
    assert_eq!(page.torque_ticks_stamp, 0x9ABC);
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_only_state_pages_dispatch() {
    for byte in 0..=u8::MAX {
        let data = [byte, 0x01, 0x32, 0x5A, 0, 0, 0, 0, 0];
        let parsed = PowerPage::parse(&data);
        match byte {
            0x01 | 0x10 | 0x20 => {
                assert_eq!(parsed.unwrap().page_number().as_byte(), byte)
            }
            _ => assert!(parsed.is_none(), "page {:#04x}", byte),
        }
    }
}

#[test]
fn test_profile_page_numbers() {
    assert_eq!(PageNumber::from_byte(0x11), Some(PageNumber::WheelTorque));
    assert_eq!(PageNumber::from_byte(0xE0), Some(PageNumber::RightPedalForceAngle));
    assert_eq!(PageNumber::from_byte(0x00), None);
}

// =============================================================================
// Common Page Tests
// =============================================================================

#[test]
fn test_common_pages_round_trip() {
    let manufacturer = ManufacturerInfo {
        hw_revision: 3,
        manufacturer_id: 89, // Favero
        model_number: 12,
    };
    assert_eq!(
        ManufacturerInfo::parse(&manufacturer.encode()),
        Some(manufacturer)
    );

    let product = ProductInfo {
        sw_revision_supplemental: 0xFF,
        sw_revision_main: 21,
        serial_number: 0xDEADBEEF,
    };
    assert_eq!(ProductInfo::parse(&product.encode()), Some(product));
}
