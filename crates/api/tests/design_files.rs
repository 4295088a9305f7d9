// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Design files on disk: JSON save/load, YAML authoring, and the projections
//! derived from a loaded design.

#![allow(clippy::unwrap_used)]

use std::fs;
use wirekit_api::design::{load_design_file, save_design_file};
use wirekit_api::schedule::{schedule_csv, ScheduleOptions};
use wirekit_api::{diagram, DeviceId, DevicePatch, DeviceRegistry, PlugType};

const PUMP_STATION: &str = r"
name: Pump station
description: Two tank sensors, a flow meter, and the pump relay
devices:
  - type: 4-20ma
    plug: inputs
    label: Tank A
  - type: 4-20ma
    plug: inputs
    label: Tank B
    wireMode: 2-wire
  - communications/pulse
  - type: relay
    plug: outputs
    label: Pump
    output: 2
    wireNumbers: { a1: W14 }
  - outputs/power-input
";

#[test]
fn json_design_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("design.json");

    let mut registry = DeviceRegistry::new();
    registry.add_device_of_type(PlugType::Inputs, "voltage-sensing");
    let relay = registry.add_device_of_type(PlugType::Outputs, "relay").unwrap().device;
    registry.update_device(
        &relay.id,
        DevicePatch {
            wire_numbers: Some([("a1".to_string(), "W3".to_string())].into()),
            ..DevicePatch::default()
        },
    );
    save_design_file(&registry, &path, true).unwrap();

    let mut loaded = DeviceRegistry::new();
    assert_eq!(load_design_file(&mut loaded, &path).unwrap(), 2);
    assert_eq!(loaded.to_records(), registry.to_records());

    // New ids continue after the loaded ones.
    let next = loaded.add_device_of_type(PlugType::Communications, "rs485").unwrap().device;
    assert_eq!(next.id, DeviceId::from("device-3"));
}

#[test]
fn yaml_design_compiles_into_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pump.yaml");
    fs::write(&path, PUMP_STATION).unwrap();

    let mut registry = DeviceRegistry::new();
    assert_eq!(load_design_file(&mut registry, &path).unwrap(), 5);
    assert!(registry.list_conflicts().is_empty());

    let labels: Vec<&str> = registry.devices().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, ["Tank A", "Tank B", "Pulse Counter", "Pump", "Power Input"]);

    let csv = schedule_csv(&registry, ScheduleOptions { quote_all: false }).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[1], "Tank A,4-20ma,inputs,Pin 8 (Red); Pin 3 (Green); Pin 4 (Yellow)");
    assert_eq!(lines[2], "Tank B,4-20ma,inputs,Pin 7 (Blue); Pin 3 (Green)");
    assert_eq!(
        lines[3],
        "Pulse Counter,pulse,communications,Pin 6 (Pink); Pin 3 (Green); Pin 4 (Yellow)"
    );
    assert_eq!(lines[4], "Pump,relay,outputs,Pin 6 (Pink); Pin 4 (Yellow)");
    assert_eq!(lines[5], "Power Input,power-input,outputs,Pin 1 (White); Pin 2 (Brown)");

    let diagram = diagram::project(&registry);
    assert_eq!(diagram.nodes.len(), 8);
    let tank_b = registry.devices().nth(1).unwrap().id.to_string();
    assert_eq!(diagram.edges_of(&tank_b).count(), 2);
}

#[test]
fn rejected_yaml_keeps_previous_design() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yml");
    fs::write(&path, "devices:\n  - inputs/0-10v\n  - type: relay\n    plug: inputs\n").unwrap();

    let mut registry = DeviceRegistry::new();
    registry.add_device_of_type(PlugType::Outputs, "latching");
    let before = registry.to_records();

    assert!(load_design_file(&mut registry, &path).is_err());
    assert_eq!(registry.to_records(), before);
}

#[test]
fn legacy_export_with_conflicts_loads_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    fs::write(
        &path,
        r#"[
  {"id":"device-1","plugType":"inputs","type":"0-10v","channel":1,
   "label":"0-10V Sensor","wireNumbers":{}},
  {"id":"device-4","plugType":"inputs","type":"4-20ma","channel":1,"wireMode":"2-wire",
   "label":"4-20mA Sensor","wireNumbers":{}},
  {"id":"device-5","plugType":"outputs","type":"servo","output":2,
   "label":"Servo","wireNumbers":{}}
]"#,
    )
    .unwrap();

    let mut registry = DeviceRegistry::new();
    assert_eq!(load_design_file(&mut registry, &path).unwrap(), 3);
    let conflicts = registry.list_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].pin, 8);
    assert_eq!(conflicts[0].devices, [DeviceId::from("device-1"), DeviceId::from("device-4")]);

    // The unknown type is kept and occupies nothing.
    let servo = registry.get(&DeviceId::from("device-5")).unwrap();
    assert_eq!(servo.type_name(), "servo");
    assert!(registry.pin_usage(&servo.id).unwrap().is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_design_file(&mut DeviceRegistry::new(), &dir.path().join("nope.json"));
    assert!(matches!(err, Err(wirekit_api::WireKitError::Io(_))));
}
