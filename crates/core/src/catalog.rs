// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Static connector catalog: pin maps, device legends, and the add-device palette.
//!
//! The catalog is reference data. It is built once ([`Catalog::builtin`]) and
//! shared by the registry and every projection through an `Arc`.

use crate::connector::{PinColor, PinNumber, PlugType, PIN_COUNT};
use crate::device::{SelectorKind, SelectorValue};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use ts_rs::TS;

/// How a pin relates to a device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PinRole {
    /// The device type never uses this pin.
    NotConnected,
    /// Always wired for this device type.
    Fixed,
    /// Wired only for some channel/output/input values.
    Parametric,
}

/// One row of a device type's pin map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct PinDescriptor {
    pub pin: PinNumber,
    pub color: PinColor,
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub device_terminal: Option<String>,
    pub role: PinRole,
}

/// One wiring instruction from a device type's legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct ConnectionLegend {
    pub color: PinColor,
    pub device_terminal: String,
    pub description: String,
}

/// General information about a class of physical device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct DeviceInfo {
    /// Class key, e.g. `sensor-2wire`, `rs485-module`.
    pub class: String,
    pub name: String,
    pub terminals: Vec<String>,
    pub description: String,
}

/// A device type offered on one plug, with its full 8-pin map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct DeviceTypeDescriptor {
    pub value: String,
    pub label: String,
    pub plug_type: PlugType,
    /// Key into [`Catalog::device_info`].
    pub device_class: String,
    pub pins: Vec<PinDescriptor>,
    pub connections: Vec<ConnectionLegend>,
}

impl DeviceTypeDescriptor {
    pub fn pin(&self, pin: PinNumber) -> Option<&PinDescriptor> {
        self.pins.iter().find(|p| p.pin == pin)
    }
}

/// A connector and the device types it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct PlugDescriptor {
    pub plug_type: PlugType,
    pub label: String,
    pub types: Vec<DeviceTypeDescriptor>,
}

/// The selector a template offers and its valid values, in preference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct SelectorSlot {
    pub kind: SelectorKind,
    pub values: Vec<SelectorValue>,
}

/// An entry in the add-device palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct DeviceTemplate {
    #[serde(rename = "type")]
    pub type_name: String,
    pub label: String,
    pub plug_type: PlugType,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub selector: Option<SelectorSlot>,
}

impl DeviceTemplate {
    /// Valid selector values, empty for fixed-pin device types.
    pub fn selector_values(&self) -> &[SelectorValue] {
        self.selector.as_ref().map_or(&[], |s| s.values.as_slice())
    }

    pub fn first_selector(&self) -> Option<SelectorValue> {
        self.selector_values().first().copied()
    }
}

/// Immutable catalog shared by the registry and all projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct Catalog {
    pub plugs: Vec<PlugDescriptor>,
    pub templates: Vec<DeviceTemplate>,
    pub device_info: Vec<DeviceInfo>,
}

impl Catalog {
    /// The built-in catalog. Cheap to call; the data is built once per process.
    pub fn builtin() -> Arc<Self> {
        static CATALOG: OnceLock<Arc<Catalog>> = OnceLock::new();
        CATALOG.get_or_init(|| Arc::new(build_builtin())).clone()
    }

    pub fn plug(&self, plug_type: PlugType) -> Option<&PlugDescriptor> {
        self.plugs.iter().find(|p| p.plug_type == plug_type)
    }

    pub fn descriptor(
        &self,
        plug_type: PlugType,
        type_name: &str,
    ) -> Option<&DeviceTypeDescriptor> {
        self.plug(plug_type)?.types.iter().find(|t| t.value == type_name)
    }

    pub fn template(&self, plug_type: PlugType, type_name: &str) -> Option<&DeviceTemplate> {
        self.templates.iter().find(|t| t.plug_type == plug_type && t.type_name == type_name)
    }

    pub fn templates_for(&self, plug_type: PlugType) -> impl Iterator<Item = &DeviceTemplate> {
        self.templates.iter().filter(move |t| t.plug_type == plug_type)
    }

    pub fn info(&self, class: &str) -> Option<&DeviceInfo> {
        self.device_info.iter().find(|i| i.class == class)
    }
}

struct PinSpec {
    function: &'static str,
    terminal: Option<&'static str>,
    role: PinRole,
}

const fn nc(function: &'static str) -> PinSpec {
    PinSpec { function, terminal: None, role: PinRole::NotConnected }
}

const fn fixed(function: &'static str, terminal: &'static str) -> PinSpec {
    PinSpec { function, terminal: Some(terminal), role: PinRole::Fixed }
}

const fn param(function: &'static str, terminal: Option<&'static str>) -> PinSpec {
    PinSpec { function, terminal, role: PinRole::Parametric }
}

fn pin_map(specs: [PinSpec; PIN_COUNT as usize]) -> Vec<PinDescriptor> {
    PinColor::BY_PIN
        .iter()
        .zip(specs)
        .zip(1..=PIN_COUNT)
        .map(|((color, spec), pin)| PinDescriptor {
            pin,
            color: *color,
            function: spec.function.to_string(),
            device_terminal: spec.terminal.map(str::to_string),
            role: spec.role,
        })
        .collect()
}

fn legend(entries: &[(PinColor, &str, &str)]) -> Vec<ConnectionLegend> {
    entries
        .iter()
        .map(|(color, terminal, description)| ConnectionLegend {
            color: *color,
            device_terminal: (*terminal).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}

fn descriptor(
    plug_type: PlugType,
    value: &str,
    label: &str,
    device_class: &str,
    pins: [PinSpec; PIN_COUNT as usize],
    connections: &[(PinColor, &str, &str)],
) -> DeviceTypeDescriptor {
    DeviceTypeDescriptor {
        value: value.to_string(),
        label: label.to_string(),
        plug_type,
        device_class: device_class.to_string(),
        pins: pin_map(pins),
        connections: legend(connections),
    }
}

const SENSOR_POWER: &str = "Sensor power out (5v/6v/12v/24v)";
const ACTUATOR_POWER: &str = "Actuator Power out (5v/6v/12v/24v)";
const SOLAR_INPUT: &str = "Solar Input (5 to 24v)";

fn analog_descriptor(value: &str, label: &str) -> DeviceTypeDescriptor {
    descriptor(
        PlugType::Inputs,
        value,
        label,
        "sensor-2wire",
        [
            nc("Not connected"),
            nc("Not connected"),
            fixed(SENSOR_POWER, "Power+"),
            fixed("Ground", "Power-"),
            param("Analog Input 4", None),
            param("Analog Input 3", None),
            param("Analog Input 2", None),
            param("Analog Input 1", Some("Signal")),
        ],
        &[
            (PinColor::Red, "Signal", "Connect sensor signal wire to Red (Pin 8)"),
            (PinColor::Green, "Power+", "Connect sensor power wire to Green (Pin 3)"),
            (PinColor::Yellow, "Power-", "Connect sensor ground to Yellow (Pin 4)"),
        ],
    )
}

fn power_input_descriptor(plug_type: PlugType) -> DeviceTypeDescriptor {
    descriptor(
        plug_type,
        "power-input",
        "Power Input",
        "power-supply",
        [
            fixed(SOLAR_INPUT, "VCC+"),
            fixed("Ground", "GND"),
            nc("Not connected"),
            nc("Not connected"),
            nc("Not connected"),
            nc("Not connected"),
            nc("Not connected"),
            nc("Not connected"),
        ],
        &[
            (PinColor::White, "VCC+", "Connect supply positive to White (Pin 1)"),
            (PinColor::Brown, "GND", "Connect supply ground to Brown (Pin 2)"),
        ],
    )
}

fn comms_descriptor(
    value: &str,
    label: &str,
    device_class: &str,
    pins: [PinSpec; PIN_COUNT as usize],
    connections: &[(PinColor, &str, &str)],
) -> DeviceTypeDescriptor {
    descriptor(PlugType::Communications, value, label, device_class, pins, connections)
}

fn output_descriptor(
    value: &str,
    label: &str,
    device_class: &str,
    terminals: [&'static str; 6],
) -> DeviceTypeDescriptor {
    let [v_plus, gnd, a1, a2, a3, a4] = terminals;
    descriptor(
        PlugType::Outputs,
        value,
        label,
        device_class,
        [
            fixed(SOLAR_INPUT, "Power"),
            fixed("Ground", "GND"),
            nc_with_terminal(ACTUATOR_POWER, v_plus),
            fixed("Ground", gnd),
            param("Actuator Output 1", Some(a1)),
            param("Actuator Output 2", Some(a2)),
            param("Actuator Output 3", Some(a3)),
            param("Actuator Output 4", Some(a4)),
        ],
        &[],
    )
}

// The actuator supply (pin 3) is labelled on output pin maps but no output
// device claims it.
const fn nc_with_terminal(function: &'static str, terminal: &'static str) -> PinSpec {
    PinSpec { function, terminal: Some(terminal), role: PinRole::NotConnected }
}

fn build_plugs() -> Vec<PlugDescriptor> {
    let inputs = PlugDescriptor {
        plug_type: PlugType::Inputs,
        label: PlugType::Inputs.label().to_string(),
        types: vec![
            analog_descriptor("0-10v", "0-10V"),
            analog_descriptor("4-20ma", "4-20mA"),
            analog_descriptor("voltage-sensing", "Voltage Sensing Input"),
            power_input_descriptor(PlugType::Inputs),
        ],
    };

    let communications = PlugDescriptor {
        plug_type: PlugType::Communications,
        label: PlugType::Communications.label().to_string(),
        types: vec![
            comms_descriptor(
                "rs485",
                "RS485",
                "rs485-module",
                [
                    fixed(SENSOR_POWER, "Power+"),
                    fixed("Ground", "GND"),
                    fixed("RS485 B", "B"),
                    fixed("RS485 A", "A"),
                    nc("Digital Input 2"),
                    nc("Digital Input 1"),
                    nc("SDI-12 Data"),
                    nc("Ground"),
                ],
                &[
                    (PinColor::Green, "B", "Connect RS485 B to Green (Pin 3)"),
                    (PinColor::Yellow, "A", "Connect RS485 A to Yellow (Pin 4)"),
                ],
            ),
            comms_descriptor(
                "wiegand",
                "Wiegand",
                "wiegand-module",
                [
                    fixed(SENSOR_POWER, "Power+"),
                    fixed("Ground", "GND"),
                    nc("RS485 B"),
                    nc("RS485 A"),
                    fixed("Wiegand Data 1 / D1", "D1"),
                    fixed("Wiegand Data 0 / D0", "D0"),
                    nc("SDI-12 Data"),
                    nc("Ground"),
                ],
                &[
                    (PinColor::Pink, "D0", "Connect Wiegand D0 to Pink (Pin 6)"),
                    (PinColor::Grey, "D1", "Connect Wiegand D1 to Grey (Pin 5)"),
                ],
            ),
            comms_descriptor(
                "sdi12",
                "SDI-12",
                "sdi12-module",
                [
                    fixed(SENSOR_POWER, "Power+"),
                    fixed("Ground", "GND"),
                    nc("RS485 B"),
                    nc("RS485 A"),
                    nc("Digital Input 2"),
                    nc("Digital Input 1"),
                    fixed("SDI-12 Data", "Data"),
                    fixed("Ground", "GND"),
                ],
                &[(PinColor::Blue, "Data", "Connect SDI-12 Data to Blue (Pin 7)")],
            ),
            comms_descriptor(
                "pulse",
                "Pulse Counter",
                "pulse-counter",
                [
                    fixed(SENSOR_POWER, "Power+"),
                    fixed("Ground", "GND"),
                    fixed(SENSOR_POWER, "Power+"),
                    fixed("Ground", "GND"),
                    param("Digital Input 2", Some("Signal")),
                    param("Pulse input 1", Some("Signal")),
                    nc("SDI-12 Data"),
                    nc("Ground"),
                ],
                &[
                    (PinColor::Green, "Power+", "Connect sensor power to Green (Pin 3)"),
                    (PinColor::Yellow, "GND", "Connect ground to Yellow (Pin 4)"),
                    (
                        PinColor::Pink,
                        "Signal",
                        "Connect pulse signal to Pink (Pin 6 - Digital Input 1)",
                    ),
                ],
            ),
            power_input_descriptor(PlugType::Communications),
        ],
    };

    let outputs = PlugDescriptor {
        plug_type: PlugType::Outputs,
        label: PlugType::Outputs.label().to_string(),
        types: vec![
            output_descriptor(
                "latching",
                "Latching",
                "relay",
                ["V+ for Relay", "GND for Relay", "A1", "A2", "A3", "A4"],
            ),
            output_descriptor(
                "relay",
                "Relay",
                "relay",
                ["V+ for Relay", "GND for Relay", "A1", "A2", "A3", "A4"],
            ),
            output_descriptor(
                "transistor",
                "Transistor",
                "transistor",
                [
                    "Base/Driver",
                    "Emitter",
                    "Collector 1",
                    "Collector 2",
                    "Collector 3",
                    "Collector 4",
                ],
            ),
            power_input_descriptor(PlugType::Outputs),
        ],
    };

    vec![inputs, communications, outputs]
}

fn template(
    plug_type: PlugType,
    type_name: &str,
    label: &str,
    selector: Option<(SelectorKind, &[SelectorValue])>,
) -> DeviceTemplate {
    DeviceTemplate {
        type_name: type_name.to_string(),
        label: label.to_string(),
        plug_type,
        selector: selector.map(|(kind, values)| SelectorSlot { kind, values: values.to_vec() }),
    }
}

fn build_templates() -> Vec<DeviceTemplate> {
    use PlugType::{Communications, Inputs, Outputs};
    use SelectorKind::{Channel, Input, Output};

    const FOUR: &[SelectorValue] = &[1, 2, 3, 4];
    const ONE: &[SelectorValue] = &[1];

    vec![
        template(Inputs, "0-10v", "0-10V Sensor", Some((Channel, FOUR))),
        template(Inputs, "4-20ma", "4-20mA Sensor", Some((Channel, FOUR))),
        template(Inputs, "voltage-sensing", "Input Voltage Sensing", Some((Channel, FOUR))),
        template(Inputs, "power-input", "Power Input", Some((Channel, ONE))),
        template(Communications, "rs485", "RS485 Device", None),
        template(Communications, "wiegand", "Wiegand Reader", None),
        template(Communications, "sdi12", "SDI-12 Sensor", None),
        template(Communications, "pulse", "Pulse Counter", Some((Input, &[1, 2]))),
        template(Communications, "power-input", "Power Input", Some((Channel, ONE))),
        template(Outputs, "relay", "Relay", Some((Output, FOUR))),
        template(Outputs, "latching", "Latching Relay", Some((Output, &[1, 3]))),
        template(Outputs, "transistor", "Transistor Output", Some((Output, FOUR))),
        template(Outputs, "power-input", "Power Input", Some((Channel, ONE))),
    ]
}

fn info(class: &str, name: &str, terminals: &[&str], description: &str) -> DeviceInfo {
    DeviceInfo {
        class: class.to_string(),
        name: name.to_string(),
        terminals: terminals.iter().map(|t| (*t).to_string()).collect(),
        description: description.to_string(),
    }
}

fn build_device_info() -> Vec<DeviceInfo> {
    vec![
        info("relay", "Relay", &["A1", "A2", "V+", "GND"], "Standard relay with coil terminals"),
        info(
            "sensor-2wire",
            "2-Wire Sensor",
            &["Signal", "Power+"],
            "2-wire analog sensor (power + signal combined)",
        ),
        info("rs485-module", "RS485 Module", &["A", "B"], "RS485 communication module"),
        info("wiegand-module", "Wiegand Reader", &["D0", "D1"], "Wiegand communication device"),
        info("sdi12-module", "SDI-12 Device", &["Data"], "SDI-12 sensor or device"),
        info(
            "transistor",
            "Transistor Output",
            &["Base/Driver", "Emitter", "Collector"],
            "Transistor output driver",
        ),
        info(
            "pulse-counter",
            "Pulse Counter",
            &["Power+", "GND", "Signal"],
            "Pulse counter sensor using digital inputs",
        ),
        info(
            "power-supply",
            "Power Input",
            &["VCC+", "GND"],
            "Battery or solar supply feeding the plug",
        ),
    ]
}

fn build_builtin() -> Catalog {
    Catalog { plugs: build_plugs(), templates: build_templates(), device_info: build_device_info() }
}
