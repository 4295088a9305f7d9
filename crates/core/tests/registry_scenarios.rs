// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! End-to-end registry behavior: allocation, conflicts, auto-assignment, and
//! the flat record round-trip.

#![allow(clippy::unwrap_used)]

use wirekit_core::{
    allocate, detect_conflicts, Device, DeviceId, DeviceKind, DevicePatch, DeviceRecord,
    DeviceRegistry, PlugType, WireMode,
};

fn analog(channel: u8, mode: WireMode) -> DeviceKind {
    DeviceKind::from_parts(PlugType::Inputs, "0-10v", Some(channel), None, None, Some(mode))
}

#[test]
fn allocation_is_deterministic() {
    let kinds = [
        analog(2, WireMode::ThreeWire),
        DeviceKind::from_parts(PlugType::Communications, "pulse", None, None, Some(2), None),
        DeviceKind::from_parts(PlugType::Outputs, "latching", None, Some(3), None, None),
        DeviceKind::from_parts(PlugType::Outputs, "servo", None, Some(1), None, None),
    ];
    for kind in &kinds {
        assert_eq!(allocate(kind), allocate(&kind.clone()));
    }
}

#[test]
fn wire_mode_toggles_only_the_ground_pin() {
    for channel in 1..=4 {
        let three = allocate(&analog(channel, WireMode::ThreeWire));
        let two = allocate(&analog(channel, WireMode::TwoWire));
        assert_eq!(three.signal_pins, two.signal_pins);
        assert!(three.power_pins.contains(&4));
        assert!(!two.power_pins.contains(&4));
        assert_eq!(allocate(&analog(channel, WireMode::ThreeWire)), three);
    }
}

#[test]
fn channels_run_backwards_for_every_analog_type() {
    for ty in ["0-10v", "4-20ma", "voltage-sensing"] {
        let pin_for = |channel| {
            let kind =
                DeviceKind::from_parts(PlugType::Inputs, ty, Some(channel), None, None, None);
            allocate(&kind).signal_pins.to_vec()
        };
        assert_eq!(pin_for(1), vec![8], "{ty}");
        assert_eq!(pin_for(4), vec![5], "{ty}");
    }
}

#[test]
fn latching_relays_take_output_pairs() {
    let pins = |output| {
        let kind =
            DeviceKind::from_parts(PlugType::Outputs, "latching", None, Some(output), None, None);
        allocate(&kind).signal_pins.to_vec()
    };
    assert_eq!(pins(1), vec![5, 6]);
    assert_eq!(pins(3), vec![7, 8]);
    assert!(pins(2).is_empty());
    assert!(pins(4).is_empty());
}

#[test]
fn bus_devices_share_while_analog_sensors_collide() {
    let rs485 = |n| {
        Device::new(
            DeviceId::from_sequence(n),
            "Modbus",
            DeviceKind::from_parts(PlugType::Communications, "rs485", None, None, None, None),
        )
    };
    assert!(detect_conflicts(&[rs485(1), rs485(2)]).is_empty());

    let a = Device::new(DeviceId::from("a"), "A", analog(1, WireMode::ThreeWire));
    let b = Device::new(DeviceId::from("b"), "B", analog(1, WireMode::ThreeWire));
    let conflicts = detect_conflicts(&[a, b]);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].plug_type, PlugType::Inputs);
    assert_eq!(conflicts[0].pin, 8);
    assert_eq!(conflicts[0].devices, [DeviceId::from("a"), DeviceId::from("b")]);
}

#[test]
fn earliest_device_keeps_its_pin() {
    let mut registry = DeviceRegistry::new();
    let a = registry.add_device_of_type(PlugType::Outputs, "relay").unwrap().device;
    let b = registry.add_device_of_type(PlugType::Outputs, "relay").unwrap().device;
    registry.update_device(&b.id, DevicePatch { selector: Some(1), ..DevicePatch::default() });

    let conflicts = registry.list_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].owner(), &a.id);
    assert_eq!(conflicts[0].claimant(), &b.id);
    assert_eq!(registry.get(&a.id).and_then(|d| d.kind.selector()), Some(1));
}

#[test]
fn records_round_trip_through_json() {
    let mut registry = DeviceRegistry::new();
    registry.add_device_of_type(PlugType::Inputs, "4-20ma").unwrap();
    let sensor = registry.add_device_of_type(PlugType::Inputs, "0-10v").unwrap().device;
    registry.add_device_of_type(PlugType::Communications, "pulse").unwrap();
    registry.add_device_of_type(PlugType::Communications, "sdi12").unwrap();
    registry.add_device_of_type(PlugType::Outputs, "latching").unwrap();
    registry.update_device(
        &sensor.id,
        DevicePatch {
            selector: Some(1),
            wire_mode: Some(WireMode::TwoWire),
            wire_numbers: Some([("signal".to_string(), "W3".to_string())].into()),
            ..DevicePatch::default()
        },
    );

    let json = serde_json::to_string(&registry.to_records()).unwrap();
    let records: Vec<DeviceRecord> = serde_json::from_str(&json).unwrap();
    let reimported = DeviceRegistry::from_records(records);

    let before: Vec<&Device> = registry.devices().collect();
    let after: Vec<&Device> = reimported.devices().collect();
    assert_eq!(before, after);
    assert_eq!(registry.list_conflicts(), reimported.list_conflicts());
    assert_eq!(reimported.list_conflicts().len(), 1);
}

#[test]
fn removal_drops_every_conflict_mentioning_the_device() {
    let mut registry = DeviceRegistry::new();
    let first = registry.add_device_of_type(PlugType::Inputs, "0-10v").unwrap().device;
    let second = registry.add_device_of_type(PlugType::Inputs, "0-10v").unwrap().device;
    let third = registry.add_device_of_type(PlugType::Inputs, "0-10v").unwrap().device;
    for id in [&second.id, &third.id] {
        registry.update_device(id, DevicePatch { selector: Some(1), ..DevicePatch::default() });
    }
    assert_eq!(registry.list_conflicts().len(), 2);

    registry.remove_device(&first.id);
    assert!(registry.list_conflicts().iter().all(|c| !c.involves(&first.id)));
    assert!(registry.pin_usage(&first.id).is_none());
    // The second sensor now owns pin 8; the third still collides with it.
    assert_eq!(registry.list_conflicts().len(), 1);
    assert_eq!(registry.list_conflicts()[0].owner(), &second.id);
}

#[test]
fn auto_assignment_then_manual_collision() {
    let mut registry = DeviceRegistry::new();

    let first = registry.add_device_of_type(PlugType::Inputs, "0-10v").unwrap();
    assert_eq!(first.device.kind.selector(), Some(1));
    let usage = registry.pin_usage(&first.device.id).unwrap();
    assert_eq!(usage.signal_pins.as_slice(), &[8]);
    assert_eq!(usage.power_pins.as_slice(), &[3, 4]);
    assert_eq!(usage.solar_pins.as_slice(), &[1, 2]);

    let second = registry.add_device_of_type(PlugType::Inputs, "0-10v").unwrap();
    assert_eq!(second.device.kind.selector(), Some(2));
    assert!(second.conflicts.is_empty());
    assert!(registry.list_conflicts().is_empty());

    registry.update_device(
        &second.device.id,
        DevicePatch { selector: Some(1), ..DevicePatch::default() },
    );
    let conflicts = registry.list_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].pin, 8);
    assert_eq!(conflicts[0].plug_type, PlugType::Inputs);
    assert_eq!(conflicts[0].devices, [first.device.id.clone(), second.device.id.clone()]);
}

#[test]
fn legacy_records_gain_a_wire_mode() {
    let json = r#"[
        {"id": "device-1700000000001", "plugType": "inputs", "type": "voltage-sensing",
         "channel": 4, "output": null, "input": null, "label": "Battery volts"},
        {"id": "device-1700000000002", "plugType": "inputs", "type": "power-input",
         "channel": 1, "label": "Solar"}
    ]"#;
    let records: Vec<DeviceRecord> = serde_json::from_str(json).unwrap();
    let registry = DeviceRegistry::from_records(records);
    let modes: Vec<Option<WireMode>> = registry.devices().map(|d| d.kind.wire_mode()).collect();
    assert_eq!(modes, vec![Some(WireMode::ThreeWire), None]);
}
