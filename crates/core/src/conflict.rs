// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Conflict detection over a list of devices.
//!
//! Signal pins are exclusive per connector. Devices are visited in registry
//! order and the first claimant of a `(plug, pin)` owns it; every later
//! claimant yields one [`Conflict`] naming `[owner, claimant]`.
//!
//! Multi-drop bus devices (RS485, SDI-12, Wiegand) are skipped entirely.
//! Power pins never conflict; pins claimed by two or more devices on the same
//! connector are reported as [`PowerShare`] advisories.

use crate::allocation::allocate;
use crate::connector::{PinNumber, PlugType};
use crate::device::{Device, DeviceId};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Two devices claiming the same exclusive pin on one connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub plug_type: PlugType,
    pub pin: PinNumber,
    /// `[owner, claimant]`: the earlier device first.
    pub devices: [DeviceId; 2],
}

impl Conflict {
    pub fn involves(&self, id: &DeviceId) -> bool {
        self.devices.iter().any(|d| d == id)
    }

    pub const fn owner(&self) -> &DeviceId {
        &self.devices[0]
    }

    pub const fn claimant(&self) -> &DeviceId {
        &self.devices[1]
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Pin {}", self.plug_type, self.pin)
    }
}

/// A power pin shared by several devices on the same connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PowerShare {
    pub plug_type: PlugType,
    pub pin: PinNumber,
    pub devices: Vec<DeviceId>,
}

/// Result of a full detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
    pub power_shares: Vec<PowerShare>,
}

impl ConflictReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// The user-facing warning line for these conflicts, if there are any.
    pub fn alert(&self) -> Option<String> {
        conflict_alert(&self.conflicts)
    }
}

/// `Pin conflict detected on: inputs Pin 8, outputs Pin 5`, or `None` when empty.
pub fn conflict_alert(conflicts: &[Conflict]) -> Option<String> {
    if conflicts.is_empty() {
        return None;
    }
    let pins: Vec<String> = conflicts.iter().map(ToString::to_string).collect();
    Some(format!("Pin conflict detected on: {}", pins.join(", ")))
}

/// Runs signal-pin conflict detection and power-sharing analysis.
pub fn detect<'a>(devices: impl IntoIterator<Item = &'a Device>) -> ConflictReport {
    let mut signal_owner: IndexMap<(PlugType, PinNumber), &'a DeviceId> = IndexMap::new();
    let mut power_users: IndexMap<(PlugType, PinNumber), Vec<DeviceId>> = IndexMap::new();
    let mut conflicts = Vec::new();

    for device in devices {
        if device.kind.is_bus_shared() {
            continue;
        }
        let plug = device.plug_type();
        let usage = allocate(&device.kind);

        for &pin in &usage.signal_pins {
            match signal_owner.get(&(plug, pin)) {
                Some(owner) => conflicts.push(Conflict {
                    plug_type: plug,
                    pin,
                    devices: [(*owner).clone(), device.id.clone()],
                }),
                None => {
                    signal_owner.insert((plug, pin), &device.id);
                },
            }
        }

        for &pin in &usage.power_pins {
            power_users.entry((plug, pin)).or_default().push(device.id.clone());
        }
    }

    let power_shares: Vec<PowerShare> = power_users
        .into_iter()
        .filter(|(_, users)| users.len() > 1)
        .map(|((plug_type, pin), devices)| PowerShare { plug_type, pin, devices })
        .collect();

    for share in &power_shares {
        tracing::debug!(
            plug = %share.plug_type,
            pin = share.pin,
            devices = share.devices.len(),
            "Power pin shared by multiple devices"
        );
    }

    ConflictReport { conflicts, power_shares }
}

/// Signal-pin conflicts only.
pub fn detect_conflicts(devices: &[Device]) -> Vec<Conflict> {
    detect(devices).conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceKind, WireMode};

    fn device(n: u64, plug: PlugType, ty: &str, selector: Option<u8>) -> Device {
        let mut kind =
            DeviceKind::from_parts(plug, ty, None, None, None, Some(WireMode::ThreeWire));
        kind.set_selector(selector);
        Device::new(DeviceId::from_sequence(n), ty, kind)
    }

    #[test]
    fn empty_list_has_no_conflicts() {
        let report = detect(&Vec::<Device>::new());
        assert!(report.conflicts.is_empty());
        assert!(report.power_shares.is_empty());
        assert_eq!(report.alert(), None);
    }

    #[test]
    fn later_claimant_is_flagged() {
        let devices = vec![
            device(1, PlugType::Inputs, "0-10v", Some(1)),
            device(2, PlugType::Inputs, "4-20ma", Some(1)),
        ];
        let conflicts = detect_conflicts(&devices);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].pin, 8);
        assert_eq!(conflicts[0].plug_type, PlugType::Inputs);
        assert_eq!(conflicts[0].owner(), &DeviceId::from("device-1"));
        assert_eq!(conflicts[0].claimant(), &DeviceId::from("device-2"));
    }

    #[test]
    fn same_pin_on_different_plugs_is_fine() {
        let devices = vec![
            device(1, PlugType::Outputs, "relay", Some(4)),
            device(2, PlugType::Inputs, "0-10v", Some(1)),
        ];
        assert!(detect_conflicts(&devices).is_empty());
    }

    #[test]
    fn bus_devices_never_conflict() {
        let devices = vec![
            device(1, PlugType::Communications, "rs485", None),
            device(2, PlugType::Communications, "rs485", None),
            device(3, PlugType::Communications, "sdi12", None),
            device(4, PlugType::Communications, "sdi12", None),
            device(5, PlugType::Communications, "wiegand", None),
            device(6, PlugType::Communications, "pulse", Some(1)),
        ];
        assert!(detect_conflicts(&devices).is_empty());
    }

    #[test]
    fn third_claimant_references_the_first_owner() {
        let devices = vec![
            device(1, PlugType::Outputs, "relay", Some(1)),
            device(2, PlugType::Outputs, "transistor", Some(1)),
            device(3, PlugType::Outputs, "latching", Some(1)),
        ];
        let conflicts = detect_conflicts(&devices);
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts.iter().all(|c| c.owner().as_str() == "device-1"));
        assert_eq!(conflicts[1].claimant().as_str(), "device-3");
        assert_eq!(conflicts[1].pin, 5);
    }

    #[test]
    fn shared_power_is_advisory() {
        let devices = vec![
            device(1, PlugType::Inputs, "0-10v", Some(1)),
            device(2, PlugType::Inputs, "0-10v", Some(2)),
        ];
        let report = detect(&devices);
        assert!(!report.has_conflicts());
        assert_eq!(report.power_shares.len(), 2);
        assert_eq!(report.power_shares[0].pin, 3);
        assert_eq!(report.power_shares[1].devices.len(), 2);
    }

    #[test]
    fn alert_lists_every_conflict() {
        let devices = vec![
            device(1, PlugType::Outputs, "latching", Some(3)),
            device(2, PlugType::Outputs, "relay", Some(3)),
            device(3, PlugType::Outputs, "relay", Some(4)),
        ];
        let alert = detect(&devices).alert();
        assert_eq!(
            alert.as_deref(),
            Some("Pin conflict detected on: outputs Pin 7, outputs Pin 8")
        );
    }
}
