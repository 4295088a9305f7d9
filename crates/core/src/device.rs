// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Configured devices and their flat persisted form.
//!
//! A [`Device`] is the unit the registry owns. Its [`DeviceKind`] is a tagged
//! variant per connector, and each variant carries only the selector that is
//! meaningful for it (an analog sensor has a channel and a wire mode, a pulse
//! counter has an input, an RS485 module has nothing).
//!
//! On disk and over the wire a device is a [`DeviceRecord`]: a flat object with
//! `id, plugType, type, channel|output|input, wireMode, label, wireNumbers`.
//! `Device` serializes through `DeviceRecord`, so both shapes stay in lockstep.

use crate::connector::PlugType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;

/// A selector value: channel, output, or input index (normally 1–4).
pub type SelectorValue = u8;

/// Stable identifier assigned when a device is created.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, TS,
)]
#[ts(export)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub const PREFIX: &'static str = "device-";

    /// Builds the canonical id for the `n`th device created by a registry.
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{}{n}", Self::PREFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric tail of a `device-<n>` id, if it has one.
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX).and_then(|tail| tail.parse().ok())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DeviceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Whether an analog sensor also takes the shared ground (pin 4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema, TS,
)]
#[ts(export)]
pub enum WireMode {
    /// Signal and power only; ground is not wired.
    #[serde(rename = "2-wire")]
    TwoWire,
    /// Signal, power, and ground.
    #[default]
    #[serde(rename = "3-wire")]
    ThreeWire,
}

impl WireMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TwoWire => "2-wire",
            Self::ThreeWire => "3-wire",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2-wire" | "2wire" | "2" => Some(Self::TwoWire),
            "3-wire" | "3wire" | "3" => Some(Self::ThreeWire),
            _ => None,
        }
    }
}

impl fmt::Display for WireMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which selector field a device kind uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    Channel,
    Output,
    Input,
}

impl SelectorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Output => "output",
            Self::Input => "input",
        }
    }

    /// Capitalized label ("Channel 1", "Output 3").
    pub const fn label(self) -> &'static str {
        match self {
            Self::Channel => "Channel",
            Self::Output => "Output",
            Self::Input => "Input",
        }
    }
}

/// Analog sensor families on the inputs connector. All share one pin template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogSensor {
    ZeroToTenVolt,
    FourToTwentyMilliamp,
    VoltageSensing,
}

impl AnalogSensor {
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::ZeroToTenVolt => "0-10v",
            Self::FourToTwentyMilliamp => "4-20ma",
            Self::VoltageSensing => "voltage-sensing",
        }
    }
}

/// Single-output drivers on the outputs connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputDriver {
    Relay,
    Transistor,
}

impl OutputDriver {
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::Transistor => "transistor",
        }
    }
}

/// Devices attached to the inputs connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputsDevice {
    Analog { sensor: AnalogSensor, channel: Option<SelectorValue>, wire_mode: WireMode },
    /// Supply feeding the connector rail. The channel is nominal and occupies no pin.
    PowerInput { channel: Option<SelectorValue> },
}

/// Devices attached to the communications connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommunicationsDevice {
    Rs485,
    Wiegand,
    Sdi12,
    /// `None` means digital input 1.
    Pulse { input: Option<SelectorValue> },
    PowerInput { channel: Option<SelectorValue> },
}

/// Devices attached to the outputs connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputsDevice {
    Switched { driver: OutputDriver, output: Option<SelectorValue> },
    /// Occupies an output pair; only outputs 1 and 3 are valid.
    Latching { output: Option<SelectorValue> },
    PowerInput { channel: Option<SelectorValue> },
}

/// A device type string the catalog does not offer on the given plug.
///
/// Kept verbatim so designs round-trip, and allocated to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnrecognizedDevice {
    pub plug_type: PlugType,
    pub type_name: String,
    pub channel: Option<SelectorValue>,
    pub output: Option<SelectorValue>,
    pub input: Option<SelectorValue>,
    pub wire_mode: Option<WireMode>,
}

impl UnrecognizedDevice {
    /// The first selector field that carries a value.
    pub const fn selector_slot(&self) -> Option<SelectorKind> {
        if self.channel.is_some() {
            Some(SelectorKind::Channel)
        } else if self.output.is_some() {
            Some(SelectorKind::Output)
        } else if self.input.is_some() {
            Some(SelectorKind::Input)
        } else {
            None
        }
    }
}

/// What a device is and where it sits, with only the fields relevant to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Inputs(InputsDevice),
    Communications(CommunicationsDevice),
    Outputs(OutputsDevice),
    Unrecognized(UnrecognizedDevice),
}

impl DeviceKind {
    /// Builds a kind from the flat `(plugType, type, selectors, wireMode)` tuple.
    ///
    /// Unknown type strings, or a type offered on a different plug, become
    /// [`DeviceKind::Unrecognized`]. A missing wire mode on an analog sensor
    /// defaults to 3-wire.
    pub fn from_parts(
        plug_type: PlugType,
        type_name: &str,
        channel: Option<SelectorValue>,
        output: Option<SelectorValue>,
        input: Option<SelectorValue>,
        wire_mode: Option<WireMode>,
    ) -> Self {
        let analog = |sensor| {
            Self::Inputs(InputsDevice::Analog {
                sensor,
                channel,
                wire_mode: wire_mode.unwrap_or_default(),
            })
        };
        let switched = |driver| Self::Outputs(OutputsDevice::Switched { driver, output });

        match (plug_type, type_name) {
            (PlugType::Inputs, "0-10v") => analog(AnalogSensor::ZeroToTenVolt),
            (PlugType::Inputs, "4-20ma") => analog(AnalogSensor::FourToTwentyMilliamp),
            (PlugType::Inputs, "voltage-sensing") => analog(AnalogSensor::VoltageSensing),
            (PlugType::Inputs, "power-input") => Self::Inputs(InputsDevice::PowerInput { channel }),
            (PlugType::Communications, "rs485") => {
                Self::Communications(CommunicationsDevice::Rs485)
            },
            (PlugType::Communications, "wiegand") => {
                Self::Communications(CommunicationsDevice::Wiegand)
            },
            (PlugType::Communications, "sdi12") => {
                Self::Communications(CommunicationsDevice::Sdi12)
            },
            (PlugType::Communications, "pulse") => {
                Self::Communications(CommunicationsDevice::Pulse { input })
            },
            (PlugType::Communications, "power-input") => {
                Self::Communications(CommunicationsDevice::PowerInput { channel })
            },
            (PlugType::Outputs, "relay") => switched(OutputDriver::Relay),
            (PlugType::Outputs, "transistor") => switched(OutputDriver::Transistor),
            (PlugType::Outputs, "latching") => Self::Outputs(OutputsDevice::Latching { output }),
            (PlugType::Outputs, "power-input") => {
                Self::Outputs(OutputsDevice::PowerInput { channel })
            },
            _ => Self::Unrecognized(UnrecognizedDevice {
                plug_type,
                type_name: type_name.to_string(),
                channel,
                output,
                input,
                wire_mode,
            }),
        }
    }

    pub const fn plug_type(&self) -> PlugType {
        match self {
            Self::Inputs(_) => PlugType::Inputs,
            Self::Communications(_) => PlugType::Communications,
            Self::Outputs(_) => PlugType::Outputs,
            Self::Unrecognized(u) => u.plug_type,
        }
    }

    /// The device type string used in design files and the catalog.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Inputs(InputsDevice::Analog { sensor, .. }) => sensor.type_name(),
            Self::Inputs(InputsDevice::PowerInput { .. })
            | Self::Communications(CommunicationsDevice::PowerInput { .. })
            | Self::Outputs(OutputsDevice::PowerInput { .. }) => "power-input",
            Self::Communications(CommunicationsDevice::Rs485) => "rs485",
            Self::Communications(CommunicationsDevice::Wiegand) => "wiegand",
            Self::Communications(CommunicationsDevice::Sdi12) => "sdi12",
            Self::Communications(CommunicationsDevice::Pulse { .. }) => "pulse",
            Self::Outputs(OutputsDevice::Switched { driver, .. }) => driver.type_name(),
            Self::Outputs(OutputsDevice::Latching { .. }) => "latching",
            Self::Unrecognized(u) => &u.type_name,
        }
    }

    /// Multi-drop bus devices may share signal pins without raising conflicts.
    pub const fn is_bus_shared(&self) -> bool {
        matches!(
            self,
            Self::Communications(
                CommunicationsDevice::Rs485
                    | CommunicationsDevice::Wiegand
                    | CommunicationsDevice::Sdi12
            )
        )
    }

    pub const fn is_power_input(&self) -> bool {
        matches!(
            self,
            Self::Inputs(InputsDevice::PowerInput { .. })
                | Self::Communications(CommunicationsDevice::PowerInput { .. })
                | Self::Outputs(OutputsDevice::PowerInput { .. })
        )
    }

    /// Which selector field this kind uses, if any.
    pub const fn selector_kind(&self) -> Option<SelectorKind> {
        match self {
            Self::Inputs(_)
            | Self::Communications(CommunicationsDevice::PowerInput { .. })
            | Self::Outputs(OutputsDevice::PowerInput { .. }) => Some(SelectorKind::Channel),
            Self::Communications(CommunicationsDevice::Pulse { .. }) => Some(SelectorKind::Input),
            Self::Outputs(_) => Some(SelectorKind::Output),
            Self::Communications(_) => None,
            Self::Unrecognized(u) => u.selector_slot(),
        }
    }

    /// The currently selected channel/output/input, if any.
    pub const fn selector(&self) -> Option<SelectorValue> {
        match self {
            Self::Inputs(
                InputsDevice::Analog { channel, .. } | InputsDevice::PowerInput { channel },
            )
            | Self::Communications(CommunicationsDevice::PowerInput { channel })
            | Self::Outputs(OutputsDevice::PowerInput { channel }) => *channel,
            Self::Communications(CommunicationsDevice::Pulse { input }) => *input,
            Self::Communications(_) => None,
            Self::Outputs(
                OutputsDevice::Switched { output, .. } | OutputsDevice::Latching { output },
            ) => *output,
            Self::Unrecognized(u) => match (u.channel, u.output, u.input) {
                (Some(v), _, _) | (None, Some(v), _) | (None, None, Some(v)) => Some(v),
                (None, None, None) => None,
            },
        }
    }

    /// Replaces the selector value. Kinds without a selector ignore it.
    pub fn set_selector(&mut self, value: Option<SelectorValue>) {
        match self {
            Self::Inputs(
                InputsDevice::Analog { channel, .. } | InputsDevice::PowerInput { channel },
            )
            | Self::Communications(CommunicationsDevice::PowerInput { channel })
            | Self::Outputs(OutputsDevice::PowerInput { channel }) => *channel = value,
            Self::Communications(CommunicationsDevice::Pulse { input }) => *input = value,
            Self::Outputs(
                OutputsDevice::Switched { output, .. } | OutputsDevice::Latching { output },
            ) => *output = value,
            Self::Communications(
                CommunicationsDevice::Rs485
                | CommunicationsDevice::Wiegand
                | CommunicationsDevice::Sdi12,
            ) => {},
            Self::Unrecognized(u) => match u.selector_slot() {
                Some(SelectorKind::Output) => u.output = value,
                Some(SelectorKind::Input) => u.input = value,
                Some(SelectorKind::Channel) | None => u.channel = value,
            },
        }
    }

    /// The wire mode, for kinds where it applies.
    pub const fn wire_mode(&self) -> Option<WireMode> {
        match self {
            Self::Inputs(InputsDevice::Analog { wire_mode, .. }) => Some(*wire_mode),
            Self::Unrecognized(u) => u.wire_mode,
            _ => None,
        }
    }

    /// Sets the wire mode. Returns false when the kind has no wire mode.
    pub fn set_wire_mode(&mut self, mode: WireMode) -> bool {
        match self {
            Self::Inputs(InputsDevice::Analog { wire_mode, .. }) => {
                *wire_mode = mode;
                true
            },
            _ => false,
        }
    }
}

/// A configured device owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "DeviceRecord", from = "DeviceRecord")]
pub struct Device {
    pub id: DeviceId,
    pub label: String,
    pub kind: DeviceKind,
    /// Terminal name (e.g. `signal`, `vcc`, `a1`) to user wire label. Display only.
    pub wire_numbers: BTreeMap<String, String>,
}

impl Device {
    pub fn new(id: DeviceId, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self { id, label: label.into(), kind, wire_numbers: BTreeMap::new() }
    }

    pub const fn plug_type(&self) -> PlugType {
        self.kind.plug_type()
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    pub fn to_record(&self) -> DeviceRecord {
        DeviceRecord::from(self.clone())
    }
}

/// Flat persisted form of a device, as found in exported design files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    pub plug_type: PlugType,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub channel: Option<SelectorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub output: Option<SelectorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub input: Option<SelectorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub wire_mode: Option<WireMode>,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub wire_numbers: BTreeMap<String, String>,
}

impl From<Device> for DeviceRecord {
    fn from(device: Device) -> Self {
        let Device { id, label, kind, wire_numbers } = device;
        let plug_type = kind.plug_type();
        let device_type = kind.type_name().to_string();
        let wire_mode = kind.wire_mode();

        let (channel, output, input) = match &kind {
            DeviceKind::Unrecognized(u) => (u.channel, u.output, u.input),
            other => {
                let value = other.selector();
                match other.selector_kind() {
                    Some(SelectorKind::Channel) => (value, None, None),
                    Some(SelectorKind::Output) => (None, value, None),
                    Some(SelectorKind::Input) => (None, None, value),
                    None => (None, None, None),
                }
            },
        };

        Self {
            id: id.as_str().to_string(),
            plug_type,
            device_type,
            channel,
            output,
            input,
            wire_mode,
            label,
            wire_numbers,
        }
    }
}

impl From<DeviceRecord> for Device {
    fn from(record: DeviceRecord) -> Self {
        let kind = DeviceKind::from_parts(
            record.plug_type,
            &record.device_type,
            record.channel,
            record.output,
            record.input,
            record.wire_mode,
        );
        if let DeviceKind::Unrecognized(u) = &kind {
            tracing::debug!(
                device_id = %record.id,
                plug = %u.plug_type,
                device_type = %u.type_name,
                "Device type not offered on this plug; it will not occupy any pins"
            );
        }
        Self {
            id: DeviceId::from(record.id),
            label: record.label,
            kind,
            wire_numbers: record.wire_numbers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_bindings_declare_wire_numbers_map() {
        let decl = DeviceRecord::decl();
        assert!(decl.contains("wireNumbers:"), "{decl}");
        assert!(decl.contains("channel?:"), "{decl}");
    }

    #[test]
    fn from_parts_builds_tagged_variants() {
        let kind = DeviceKind::from_parts(PlugType::Inputs, "4-20ma", Some(2), None, None, None);
        assert_eq!(
            kind,
            DeviceKind::Inputs(InputsDevice::Analog {
                sensor: AnalogSensor::FourToTwentyMilliamp,
                channel: Some(2),
                wire_mode: WireMode::ThreeWire,
            })
        );
        assert_eq!(kind.selector_kind(), Some(SelectorKind::Channel));

        let kind =
            DeviceKind::from_parts(PlugType::Communications, "pulse", None, None, Some(2), None);
        assert_eq!(kind.selector(), Some(2));
        assert_eq!(kind.selector_kind(), Some(SelectorKind::Input));

        let kind =
            DeviceKind::from_parts(PlugType::Communications, "rs485", None, None, None, None);
        assert!(kind.is_bus_shared());
        assert_eq!(kind.selector_kind(), None);
    }

    #[test]
    fn type_on_wrong_plug_is_unrecognized() {
        let kind = DeviceKind::from_parts(PlugType::Inputs, "relay", None, Some(1), None, None);
        assert!(matches!(kind, DeviceKind::Unrecognized(_)));
        assert_eq!(kind.type_name(), "relay");
        assert_eq!(kind.plug_type(), PlugType::Inputs);
    }

    #[test]
    fn set_selector_ignores_fixed_pin_devices() {
        let mut kind = DeviceKind::Communications(CommunicationsDevice::Sdi12);
        kind.set_selector(Some(3));
        assert_eq!(kind.selector(), None);

        let mut kind =
            DeviceKind::from_parts(PlugType::Outputs, "latching", None, Some(1), None, None);
        kind.set_selector(Some(3));
        assert_eq!(kind.selector(), Some(3));
    }

    #[test]
    fn wire_mode_only_applies_to_analog_sensors() {
        let mut relay =
            DeviceKind::from_parts(PlugType::Outputs, "relay", None, Some(1), None, None);
        assert!(!relay.set_wire_mode(WireMode::TwoWire));
        assert_eq!(relay.wire_mode(), None);

        let mut sensor =
            DeviceKind::from_parts(PlugType::Inputs, "0-10v", Some(1), None, None, None);
        assert!(sensor.set_wire_mode(WireMode::TwoWire));
        assert_eq!(sensor.wire_mode(), Some(WireMode::TwoWire));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn legacy_record_without_wire_mode_defaults_to_three_wire() {
        let json = concat!(
            r#"{"id":"device-1","plugType":"inputs","type":"0-10v","channel":1,"#,
            r#""output":null,"input":null,"label":"Tank"}"#
        );
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.kind.wire_mode(), Some(WireMode::ThreeWire));

        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["wireMode"], "3-wire");
        assert_eq!(value["channel"], 1);
        assert!(value.get("output").is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn power_input_has_no_wire_mode() {
        let json = concat!(
            r#"{"id":"device-2","plugType":"inputs","type":"power-input","#,
            r#""channel":1,"label":"Battery"}"#
        );
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.kind.wire_mode(), None);
        let value = serde_json::to_value(&device).unwrap();
        assert!(value.get("wireMode").is_none());
        assert_eq!(value["channel"], 1);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn unrecognized_record_round_trips_verbatim() {
        let json = concat!(
            r#"{"id":"x","plugType":"outputs","type":"servo","output":2,"#,
            r#""label":"Gate","wireNumbers":{"a1":"W12"}}"#
        );
        let device: Device = serde_json::from_str(json).unwrap();
        let back: DeviceRecord = device.to_record();
        assert_eq!(back.device_type, "servo");
        assert_eq!(back.output, Some(2));
        assert_eq!(back.wire_numbers.get("a1").map(String::as_str), Some("W12"));
    }

    #[test]
    fn device_id_sequence() {
        assert_eq!(DeviceId::from_sequence(7).as_str(), "device-7");
        assert_eq!(DeviceId::from("device-12").sequence(), Some(12));
        assert_eq!(DeviceId::from("device-1700000000000").sequence(), Some(1_700_000_000_000));
        assert_eq!(DeviceId::from("pump").sequence(), None);
    }
}
