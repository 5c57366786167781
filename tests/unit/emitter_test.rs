//! Unit tests for the virtual power meter page schedule.

use antpower::sensors::ant::emitter::{
    PowerEmitter, INTERLEAVE_CYCLE, MANUFACTURER_INFO_SLOT, PRODUCT_INFO_SLOT,
};
use antpower::sensors::ant::profiles::power::{PedalBalance, PowerOnlyPage};
use antpower::sensors::ant::profiles::{AntProfilePage, ManufacturerInfo, ProductInfo};
use antpower::storage::config::EmitterSettings;

#[test]
fn test_full_interleave_cycle() {
    let mut emitter = PowerEmitter::new(1337);
    let mut manufacturer = Vec::new();
    let mut product = Vec::new();
    let mut power_only = 0;

    for tick in 0..INTERLEAVE_CYCLE as usize {
        emitter.set_power(150.0, Some(85.0)).unwrap();
        let payload = emitter.next_page().unwrap();
        if ManufacturerInfo::parse(&payload).is_some() {
            manufacturer.push(tick);
        } else if ProductInfo::parse(&payload).is_some() {
            product.push(tick);
        } else {
            assert!(PowerOnlyPage::parse(&payload).is_some());
            power_only += 1;
        }
    }

    assert_eq!(manufacturer, vec![MANUFACTURER_INFO_SLOT as usize]);
    assert_eq!(product, vec![PRODUCT_INFO_SLOT as usize]);
    assert_eq!(power_only, 119);
}

#[test]
fn test_cycle_repeats() {
    let mut emitter = PowerEmitter::new(1);
    emitter.set_power(100.0, None).unwrap();

    let pages: Vec<u8> = (0..3 * INTERLEAVE_CYCLE as usize)
        .map(|_| emitter.next_page().unwrap()[0])
        .collect();
    let manufacturer_ticks: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, &p)| p == 0x50)
        .map(|(i, _)| i)
        .collect();

    assert_eq!(manufacturer_ticks, vec![60, 181, 302]);
}

#[test]
fn test_auxiliary_pages_use_settings() {
    let settings = EmitterSettings {
        device_id: 7,
        hw_revision: 2,
        manufacturer_id: 52,
        model_number: 9,
        sw_revision: 2.3,
        serial_number: 123_456,
        ..EmitterSettings::default()
    };
    let mut emitter = PowerEmitter::from_settings(&settings);
    emitter.set_power(10.0, None).unwrap();

    let payloads: Vec<_> = (0..INTERLEAVE_CYCLE)
        .map(|_| emitter.next_page().unwrap())
        .collect();

    let manufacturer = ManufacturerInfo::parse(&payloads[60]).unwrap();
    assert_eq!(manufacturer.hw_revision, 2);
    assert_eq!(manufacturer.manufacturer_id, 52);
    assert_eq!(manufacturer.model_number, 9);

    let product = ProductInfo::parse(&payloads[120]).unwrap();
    assert_eq!(product.sw_revision_main, 23);
    assert_eq!(product.serial_number, 123_456);
}

#[test]
fn test_power_only_payload_layout() {
    let mut emitter = PowerEmitter::new(1);
    emitter.set_pedal_power(120.0, 180.0, Some(92.4)).unwrap();
    emitter.set_pedal_power(120.0, 180.0, Some(92.4)).unwrap();

    let payload = emitter.next_page().unwrap();
    // 600 accumulated watts = 0x0258, 300 W = 0x012C
    assert_eq!(payload, [0x10, 0x02, 0x80 | 60, 92, 0x58, 0x02, 0x2C, 0x01]);

    let page = PowerOnlyPage::parse(&payload).unwrap();
    assert_eq!(page.pedal_balance, PedalBalance::Right(60));
}

#[test]
fn test_emitter_state_serializes() {
    let mut emitter = PowerEmitter::new(1);
    emitter.set_unknown_pedal_power(100.0, 200.0, None).unwrap();

    let json = serde_json::to_value(emitter.state()).unwrap();
    assert_eq!(json["pending_power"], 300);
    assert_eq!(json["pending_pedal_power"]["kind"], "unattributed");
    assert_eq!(json["pending_pedal_power"]["percent"], 33);
}
