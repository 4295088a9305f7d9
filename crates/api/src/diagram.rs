// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Wiring diagram projection.
//!
//! Derives the node/edge graph a diagram renderer draws: three fixed system
//! nodes (one per connector), one node per device, and one colored edge per
//! wire. The graph is recomputed from the registry on every call, so a removed
//! device takes its node and every edge touching it with it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use wirekit_core::allocation::{analog_channel_pin, latching_pins, output_pin, pulse_input_pin};
use wirekit_core::device::{CommunicationsDevice, InputsDevice, OutputsDevice};
use wirekit_core::{Device, DeviceKind, DeviceRegistry, PinColor, PinNumber, PlugType, WireMode};

/// Color used when a terminal has no pin assigned yet.
pub const UNASSIGNED_COLOR: &str = "#999";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[ts(export)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Renderer node type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    NeoDevice,
    Sensor,
    Relay,
    Battery,
}

/// A connection point on a node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
pub struct Handle {
    pub id: String,
    pub color: String,
}

/// A device-side terminal with its display name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
pub struct Terminal {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    pub label: String,
    /// Device type string; absent on system nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub device_type: Option<String>,
    /// Outgoing handles of a system node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handles: Vec<Handle>,
    /// Terminals of a device node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terminals: Vec<Terminal>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiagramEdge {
    /// `e-<deviceId>-<terminal>`, stable across recomputation.
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
    pub label: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[ts(export)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

impl Diagram {
    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges with `id` as source or target.
    pub fn edges_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a DiagramEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id || e.target == id)
    }
}

/// Id of the system node for a connector.
pub const fn system_node_id(plug: PlugType) -> &'static str {
    match plug {
        PlugType::Inputs => "neo-inputs",
        PlugType::Communications => "neo-comms",
        PlugType::Outputs => "neo-outputs",
    }
}

const fn system_node_label(plug: PlugType) -> &'static str {
    match plug {
        PlugType::Inputs => "Neo Device (Inputs)",
        PlugType::Communications => "Neo Device (Coms)",
        PlugType::Outputs => "Neo Device (Outputs)",
    }
}

const fn system_node_y(plug: PlugType) -> i32 {
    match plug {
        PlugType::Inputs => 50,
        PlugType::Communications => 450,
        PlugType::Outputs => 850,
    }
}

const fn device_base_y(plug: PlugType) -> i32 {
    match plug {
        PlugType::Inputs => 50,
        PlugType::Communications => 350,
        PlugType::Outputs => 650,
    }
}

/// Position of the `index`th device on `plug`.
pub fn device_position(plug: PlugType, index: usize) -> Position {
    let n = i32::try_from(index).unwrap_or(i32::MAX);
    Position {
        x: 400_i32.saturating_add(n.saturating_mul(50)),
        y: device_base_y(plug).saturating_add(n.saturating_mul(30)),
    }
}

fn hex(color: PinColor) -> String {
    color.hex().to_string()
}

fn pin_hex(pin: PinNumber) -> String {
    PinColor::for_pin(pin).map_or_else(|| UNASSIGNED_COLOR.to_string(), hex)
}

fn pin_handle(pin: PinNumber) -> String {
    format!("pin-{pin}")
}

fn terminal(id: &str, name: &str, color: String) -> Terminal {
    Terminal { id: id.to_string(), name: name.to_string(), color }
}

pub const fn node_kind(device: &Device) -> NodeKind {
    if device.kind.is_power_input() {
        NodeKind::Battery
    } else if matches!(device.plug_type(), PlugType::Outputs) {
        NodeKind::Relay
    } else {
        NodeKind::Sensor
    }
}

/// Terminals drawn on a device node.
pub fn device_terminals(device: &Device) -> Vec<Terminal> {
    let white = || hex(PinColor::White);
    let brown = || hex(PinColor::Brown);
    let green = || hex(PinColor::Green);
    let yellow = || hex(PinColor::Yellow);

    match &device.kind {
        kind if kind.is_power_input() => {
            vec![terminal("vcc+", "VCC+", white()), terminal("gnd", "GND", brown())]
        },
        DeviceKind::Inputs(InputsDevice::Analog { channel, wire_mode, .. }) => {
            let signal = channel
                .and_then(analog_channel_pin)
                .map_or_else(|| UNASSIGNED_COLOR.into(), pin_hex);
            let mut terminals = vec![
                terminal("signal", "Signal", signal),
                terminal("power+", "Power+", green()),
            ];
            if *wire_mode == WireMode::ThreeWire {
                terminals.push(terminal("gnd", "GND", yellow()));
            }
            terminals
        },
        DeviceKind::Outputs(OutputsDevice::Latching { output }) => {
            let [a1, a2] = output.and_then(latching_pins).map_or_else(
                || [UNASSIGNED_COLOR.into(), UNASSIGNED_COLOR.into()],
                |p| p.map(pin_hex),
            );
            vec![terminal("a1", "A1", a1), terminal("a2", "A2", a2)]
        },
        DeviceKind::Outputs(OutputsDevice::Switched { output, .. }) => {
            let a1 = output.and_then(output_pin).map_or_else(|| UNASSIGNED_COLOR.into(), pin_hex);
            vec![terminal("a1", "A1", a1), terminal("a2", "A2", yellow())]
        },
        DeviceKind::Communications(CommunicationsDevice::Rs485) => {
            vec![terminal("b", "B", green()), terminal("a", "A", yellow())]
        },
        DeviceKind::Communications(CommunicationsDevice::Wiegand) => vec![
            terminal("d0", "D0", hex(PinColor::Pink)),
            terminal("d1", "D1", hex(PinColor::Grey)),
        ],
        DeviceKind::Communications(CommunicationsDevice::Sdi12) => vec![
            terminal("data", "Data", hex(PinColor::Blue)),
            terminal("gnd", "GND", hex(PinColor::Red)),
        ],
        DeviceKind::Communications(CommunicationsDevice::Pulse { input }) => {
            let signal = pulse_input_pin(input.unwrap_or(1))
                .map_or_else(|| UNASSIGNED_COLOR.into(), pin_hex);
            vec![
                terminal("signal", "Signal", signal),
                terminal("power", "Power+", green()),
                terminal("gnd", "GND", yellow()),
            ]
        },
        _ => Vec::new(),
    }
}

struct EdgeBuilder<'a> {
    device: &'a Device,
}

impl EdgeBuilder<'_> {
    /// Edge label, with the recorded wire number for `terminal` appended.
    fn label(&self, terminal: &str, base: &str) -> String {
        match self.device.wire_numbers.get(terminal) {
            Some(wire) if !wire.trim().is_empty() => format!("{base} [{}]", wire.trim()),
            _ => base.to_string(),
        }
    }

    /// Wire from a system node into the device.
    fn inbound(
        &self,
        suffix: &str,
        from: PlugType,
        source_handle: &str,
        target_handle: &str,
        label: &str,
        color: String,
    ) -> DiagramEdge {
        DiagramEdge {
            id: format!("e-{}-{suffix}", self.device.id),
            source: system_node_id(from).to_string(),
            target: self.device.id.to_string(),
            source_handle: source_handle.to_string(),
            target_handle: target_handle.to_string(),
            label: self.label(target_handle, label),
            color,
        }
    }

    /// Wire from the device into its system node (power inputs feed the plug).
    fn supply(
        &self,
        suffix: &str,
        handle: (&str, &str),
        label: &str,
        color: String,
    ) -> DiagramEdge {
        DiagramEdge {
            id: format!("e-{}-{suffix}", self.device.id),
            source: self.device.id.to_string(),
            target: system_node_id(self.device.plug_type()).to_string(),
            source_handle: handle.0.to_string(),
            target_handle: handle.1.to_string(),
            label: self.label(handle.0, label),
            color,
        }
    }
}

/// Edges drawn for one device.
pub fn device_edges(device: &Device) -> Vec<DiagramEdge> {
    let b = EdgeBuilder { device };
    let plug = device.plug_type();
    let green = || hex(PinColor::Green);
    let yellow = || hex(PinColor::Yellow);

    match &device.kind {
        kind if kind.is_power_input() => vec![
            b.supply("vcc", ("vcc+", "vcc"), "VCC+ (Pin 1)", hex(PinColor::White)),
            b.supply("gnd", ("gnd", "gnd"), "GND (Pin 2)", hex(PinColor::Brown)),
        ],
        DeviceKind::Inputs(InputsDevice::Analog { channel, wire_mode, .. }) => {
            let mut edges = Vec::new();
            if let Some(pin) = channel.and_then(analog_channel_pin) {
                let handle = pin_handle(pin);
                edges.push(b.inbound("signal", plug, &handle, "signal", "Signal", pin_hex(pin)));
            }
            edges.push(b.inbound("power", plug, "power", "power+", "Power", green()));
            if *wire_mode == WireMode::ThreeWire {
                edges.push(b.inbound("gnd", plug, "gnd", "gnd", "GND", yellow()));
            }
            edges
        },
        DeviceKind::Outputs(OutputsDevice::Latching { output }) => output
            .and_then(latching_pins)
            .map(|[p1, p2]| {
                vec![
                    b.inbound("a1", plug, &pin_handle(p1), "a1", "A1", pin_hex(p1)),
                    b.inbound("a2", plug, &pin_handle(p2), "a2", "A2", pin_hex(p2)),
                ]
            })
            .unwrap_or_default(),
        DeviceKind::Outputs(OutputsDevice::Switched { output, .. }) => {
            let mut edges = Vec::new();
            if let Some((n, pin)) = output.and_then(|n| output_pin(n).map(|p| (n, p))) {
                let (handle, label) = (pin_handle(pin), format!("Out {n}"));
                edges.push(b.inbound("a1", plug, &handle, "a1", &label, pin_hex(pin)));
            }
            edges.push(b.inbound("a2", plug, "gnd", "a2", "GND", yellow()));
            edges
        },
        DeviceKind::Communications(CommunicationsDevice::Rs485) => vec![
            b.inbound("b", plug, "b", "b", "B", green()),
            b.inbound("a", plug, "a", "a", "A", yellow()),
        ],
        DeviceKind::Communications(CommunicationsDevice::Wiegand) => vec![
            b.inbound("d0", plug, "d0", "d0", "D0", hex(PinColor::Pink)),
            b.inbound("d1", plug, "d1", "d1", "D1", hex(PinColor::Grey)),
        ],
        DeviceKind::Communications(CommunicationsDevice::Sdi12) => vec![
            b.inbound("data", plug, "data", "data", "Data", hex(PinColor::Blue)),
            b.inbound("gnd", plug, "gnd", "gnd", "GND", hex(PinColor::Red)),
        ],
        DeviceKind::Communications(CommunicationsDevice::Pulse { input }) => {
            let mut edges = Vec::new();
            if let Some(pin) = pulse_input_pin(input.unwrap_or(1)) {
                let handle = pin_handle(pin);
                edges.push(b.inbound("signal", plug, &handle, "signal", "Signal", pin_hex(pin)));
            }
            // Pulse counters draw sensor power from the inputs connector.
            edges.push(b.inbound("power", PlugType::Inputs, "power", "power", "Power", green()));
            edges.push(b.inbound("gnd", PlugType::Inputs, "gnd", "gnd", "GND", yellow()));
            edges
        },
        _ => Vec::new(),
    }
}

fn push_handle(handles: &mut Vec<Handle>, id: String, color: String) {
    if !handles.iter().any(|h| h.id == id) {
        handles.push(Handle { id, color });
    }
}

/// Handles a system node exposes, given the devices attached to its plug.
pub fn system_handles<'a>(
    plug: PlugType,
    devices: impl IntoIterator<Item = &'a Device>,
) -> Vec<Handle> {
    let mut handles = Vec::new();
    match plug {
        PlugType::Inputs => {
            push_handle(&mut handles, "power".into(), hex(PinColor::Green));
            push_handle(&mut handles, "gnd".into(), hex(PinColor::Yellow));
        },
        PlugType::Outputs => push_handle(&mut handles, "gnd".into(), hex(PinColor::Yellow)),
        PlugType::Communications => {},
    }

    for device in devices {
        match &device.kind {
            kind if kind.is_power_input() => {
                push_handle(&mut handles, pin_handle(1), hex(PinColor::White));
                push_handle(&mut handles, pin_handle(2), hex(PinColor::Brown));
            },
            DeviceKind::Communications(CommunicationsDevice::Rs485) => {
                push_handle(&mut handles, "b".into(), hex(PinColor::Green));
                push_handle(&mut handles, "a".into(), hex(PinColor::Yellow));
            },
            DeviceKind::Communications(CommunicationsDevice::Wiegand) => {
                push_handle(&mut handles, "d0".into(), hex(PinColor::Pink));
                push_handle(&mut handles, "d1".into(), hex(PinColor::Grey));
            },
            DeviceKind::Communications(CommunicationsDevice::Sdi12) => {
                push_handle(&mut handles, "data".into(), hex(PinColor::Blue));
                push_handle(&mut handles, "gnd".into(), hex(PinColor::Red));
            },
            kind => {
                for &pin in &wirekit_core::allocate(kind).signal_pins {
                    push_handle(&mut handles, pin_handle(pin), pin_hex(pin));
                }
            },
        }
    }
    handles
}

/// Projects the whole registry into a diagram.
pub fn project(registry: &DeviceRegistry) -> Diagram {
    let mut nodes: Vec<DiagramNode> = PlugType::ALL
        .iter()
        .map(|&plug| DiagramNode {
            id: system_node_id(plug).to_string(),
            kind: NodeKind::NeoDevice,
            position: Position { x: 50, y: system_node_y(plug) },
            label: system_node_label(plug).to_string(),
            device_type: None,
            handles: system_handles(plug, registry.devices_on(plug)),
            terminals: Vec::new(),
        })
        .collect();

    let mut edges = Vec::new();
    let mut per_plug = [0_usize; 3];

    for device in registry.devices() {
        let plug = device.plug_type();
        let slot = match plug {
            PlugType::Inputs => 0,
            PlugType::Communications => 1,
            PlugType::Outputs => 2,
        };
        let index = per_plug[slot];
        per_plug[slot] += 1;

        nodes.push(DiagramNode {
            id: device.id.to_string(),
            kind: node_kind(device),
            position: device_position(plug, index),
            label: device.label.clone(),
            device_type: Some(device.type_name().to_string()),
            handles: Vec::new(),
            terminals: device_terminals(device),
        });
        edges.extend(device_edges(device));
    }

    Diagram { nodes, edges }
}
