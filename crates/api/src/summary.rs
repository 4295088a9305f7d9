// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Pin usage summary: which pins of each plug are in use, and by whom.

use crate::connection_pins;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use wirekit_core::{
    color_name, is_power_bus_pin, DeviceId, DeviceRegistry, PinColor, PinNumber, PlugType,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PinSummaryEntry {
    pub pin: PinNumber,
    pub color: String,
    pub hex: String,
    pub devices: Vec<DeviceId>,
    /// Pin 3 or 4, the shared power bus.
    pub shared: bool,
    pub conflict: bool,
}

impl PinSummaryEntry {
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlugSummary {
    pub plug_type: PlugType,
    pub label: String,
    pub pins: Vec<PinSummaryEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PinSummary {
    pub device_count: usize,
    /// Only plugs with at least one used pin.
    pub plugs: Vec<PlugSummary>,
}

impl PinSummary {
    pub fn plug(&self, plug_type: PlugType) -> Option<&PlugSummary> {
        self.plugs.iter().find(|p| p.plug_type == plug_type)
    }
}

pub fn summarize(registry: &DeviceRegistry) -> PinSummary {
    let conflicts = registry.list_conflicts();
    let mut plugs = Vec::new();

    for plug_type in PlugType::ALL {
        let mut used: BTreeMap<PinNumber, Vec<DeviceId>> = BTreeMap::new();
        for device in registry.devices_on(plug_type) {
            for pin in connection_pins(device) {
                let holders = used.entry(pin).or_default();
                if !holders.contains(&device.id) {
                    holders.push(device.id.clone());
                }
            }
        }
        if used.is_empty() {
            continue;
        }

        let pins = used
            .into_iter()
            .map(|(pin, devices)| PinSummaryEntry {
                pin,
                color: color_name(pin).to_string(),
                hex: PinColor::for_pin(pin).map_or("", PinColor::hex).to_string(),
                devices,
                shared: is_power_bus_pin(pin),
                conflict: conflicts.iter().any(|c| c.plug_type == plug_type && c.pin == pin),
            })
            .collect();

        plugs.push(PlugSummary {
            plug_type,
            label: plug_type.plug_label().to_string(),
            pins,
        });
    }

    PinSummary { device_count: registry.len(), plugs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirekit_core::DevicePatch;

    #[test]
    fn empty_registry_has_no_plugs() {
        let summary = summarize(&DeviceRegistry::new());
        assert_eq!(summary.device_count, 0);
        assert!(summary.plugs.is_empty());
    }

    #[test]
    fn shared_power_pins_list_every_device() {
        let mut registry = DeviceRegistry::new();
        registry.add_device_of_type(PlugType::Inputs, "0-10v");
        registry.add_device_of_type(PlugType::Inputs, "4-20ma");

        let summary = summarize(&registry);
        assert_eq!(summary.device_count, 2);
        let inputs = summary.plug(PlugType::Inputs).map(|p| &p.pins);
        let pins: Vec<(PinNumber, usize, bool)> = inputs
            .into_iter()
            .flatten()
            .map(|e| (e.pin, e.device_count(), e.shared))
            .collect();
        assert_eq!(pins, [(3, 2, true), (4, 2, true), (7, 1, false), (8, 1, false)]);
        assert!(summary.plug(PlugType::Outputs).is_none());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn conflicting_pins_are_flagged() {
        let mut registry = DeviceRegistry::new();
        registry.add_device_of_type(PlugType::Outputs, "relay");
        let second = registry.add_device_of_type(PlugType::Outputs, "relay").unwrap().device;
        registry
            .update_device(&second.id, DevicePatch { selector: Some(1), ..DevicePatch::default() });

        let summary = summarize(&registry);
        let outputs = summary.plug(PlugType::Outputs).unwrap();
        let five = outputs.pins.iter().find(|e| e.pin == 5).unwrap();
        assert!(five.conflict);
        assert_eq!(five.color, "Grey");
        assert_eq!(five.device_count(), 2);
        let four = outputs.pins.iter().find(|e| e.pin == 4).unwrap();
        assert!(!four.conflict);
    }
}
