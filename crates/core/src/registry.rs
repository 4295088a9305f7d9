// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The device registry: canonical configuration state.
//!
//! [`DeviceRegistry`] owns the ordered list of configured devices and mediates
//! every mutation. Conflict detection runs eagerly after each add, update,
//! remove, or import, so [`DeviceRegistry::list_conflicts`] is always current.
//!
//! The registry is a plain owned value mutated through `&mut self`. Hosts that
//! share it between threads wrap it in a single `Mutex` so that allocation,
//! detection, and commit happen as one step.

use crate::allocation::{allocate, PinUsage};
use crate::catalog::{Catalog, DeviceTemplate};
use crate::conflict::{detect, Conflict, ConflictReport, PowerShare};
use crate::connector::PlugType;
use crate::device::{
    Device, DeviceId, DeviceKind, DeviceRecord, SelectorKind, SelectorValue, WireMode,
};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use ts_rs::TS;

/// Fields an update may change. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DevicePatch {
    /// New channel, output, or input, whichever the device uses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub selector: Option<SelectorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub wire_mode: Option<WireMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub label: Option<String>,
    /// Replaces the whole wire-number map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub wire_numbers: Option<BTreeMap<String, String>>,
}

impl DevicePatch {
    pub fn is_empty(&self) -> bool {
        self.selector.is_none()
            && self.wire_mode.is_none()
            && self.label.is_none()
            && self.wire_numbers.is_none()
    }
}

/// Outcome of adding a device: the new record and every conflict it is part of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAdded {
    pub device: Device,
    pub conflicts: Vec<Conflict>,
}

/// Ordered, owned collection of configured devices.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    catalog: Arc<Catalog>,
    devices: IndexMap<DeviceId, Device>,
    next_id: u64,
    default_wire_mode: WireMode,
    report: ConflictReport,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    /// Creates an empty registry over the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    pub fn with_catalog(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            devices: IndexMap::new(),
            next_id: 1,
            default_wire_mode: WireMode::default(),
            report: ConflictReport::default(),
        }
    }

    /// Wire mode given to analog sensors created by [`Self::add_device`].
    #[must_use]
    pub const fn with_default_wire_mode(mut self, mode: WireMode) -> Self {
        self.default_wire_mode = mode;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in insertion order.
    pub fn devices(&self) -> impl ExactSizeIterator<Item = &Device> {
        self.devices.values()
    }

    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Devices attached to one connector, in insertion order.
    pub fn devices_on(&self, plug_type: PlugType) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(move |d| d.plug_type() == plug_type)
    }

    /// Adds a device from a palette template.
    ///
    /// Bus devices take the first selector value. Other devices take the first
    /// value that adds no conflict, falling back to the first value when every
    /// option collides. The device is added either way.
    pub fn add_device(&mut self, template: &DeviceTemplate) -> DeviceAdded {
        let id = self.allocate_id();
        let mut device = Device::new(id, template.label.clone(), self.kind_for(template));

        let selector = if device.kind.is_bus_shared() {
            template.first_selector()
        } else {
            self.first_conflict_free(&device, template.selector_values())
                .or_else(|| template.first_selector())
        };
        device.kind.set_selector(selector);

        tracing::debug!(
            device_id = %device.id,
            plug = %template.plug_type,
            device_type = %template.type_name,
            selector = ?selector,
            "Adding device"
        );

        self.devices.insert(device.id.clone(), device.clone());
        self.refresh();

        let conflicts = self.conflicts_for(&device.id);
        if !conflicts.is_empty() {
            tracing::warn!(
                device_id = %device.id,
                conflicts = conflicts.len(),
                "New device collides with existing devices"
            );
        }
        DeviceAdded { device, conflicts }
    }

    /// Adds a device by catalog lookup. `None` if the plug does not offer `type_name`.
    pub fn add_device_of_type(
        &mut self,
        plug_type: PlugType,
        type_name: &str,
    ) -> Option<DeviceAdded> {
        let template = self.catalog.template(plug_type, type_name)?.clone();
        Some(self.add_device(&template))
    }

    /// Merges `patch` into an existing device and re-runs detection.
    pub fn update_device(&mut self, id: &DeviceId, patch: DevicePatch) -> Option<Device> {
        let Some(device) = self.devices.get_mut(id) else {
            tracing::warn!(device_id = %id, "Update for unknown device ignored");
            return None;
        };

        if let Some(value) = patch.selector {
            device.kind.set_selector(Some(value));
        }
        if let Some(mode) = patch.wire_mode {
            if !device.kind.set_wire_mode(mode) {
                tracing::debug!(device_id = %id, "Wire mode does not apply to this device type");
            }
        }
        if let Some(label) = patch.label {
            device.label = label;
        }
        if let Some(wire_numbers) = patch.wire_numbers {
            device.wire_numbers = wire_numbers;
        }

        let updated = device.clone();
        self.refresh();
        Some(updated)
    }

    /// Removes a device. Projections derived from the registry drop it on their next read.
    pub fn remove_device(&mut self, id: &DeviceId) -> Option<Device> {
        let removed = self.devices.shift_remove(id);
        if removed.is_none() {
            tracing::warn!(device_id = %id, "Remove for unknown device ignored");
        }
        self.refresh();
        removed
    }

    pub fn clear(&mut self) {
        self.devices.clear();
        self.next_id = 1;
        self.refresh();
    }

    /// Current signal-pin conflicts, in detection order.
    pub fn list_conflicts(&self) -> &[Conflict] {
        &self.report.conflicts
    }

    /// Power pins shared by more than one device.
    pub fn power_shares(&self) -> &[PowerShare] {
        &self.report.power_shares
    }

    pub const fn conflict_report(&self) -> &ConflictReport {
        &self.report
    }

    /// Conflicts that name `id` as owner or claimant.
    pub fn conflicts_for(&self, id: &DeviceId) -> Vec<Conflict> {
        self.report.conflicts.iter().filter(|c| c.involves(id)).cloned().collect()
    }

    pub fn pin_usage(&self, id: &DeviceId) -> Option<PinUsage> {
        self.devices.get(id).map(|d| allocate(&d.kind))
    }

    /// The flat persisted form of every device, in order.
    pub fn to_records(&self) -> Vec<DeviceRecord> {
        self.devices.values().map(Device::to_record).collect()
    }

    /// Replaces the registry contents with imported records.
    ///
    /// Ids are kept. The id counter resumes past the highest `device-<n>`
    /// suffix. A repeated id keeps its first record.
    pub fn load_records(&mut self, records: Vec<DeviceRecord>) {
        self.devices.clear();
        for record in records {
            let device = Device::from(record);
            if self.devices.contains_key(&device.id) {
                tracing::warn!(device_id = %device.id, "Duplicate device id in import skipped");
                continue;
            }
            self.devices.insert(device.id.clone(), device);
        }
        self.next_id = self
            .devices
            .keys()
            .filter_map(DeviceId::sequence)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.refresh();
        tracing::info!(devices = self.devices.len(), "Loaded device records");
    }

    /// Builds a registry over the built-in catalog from imported records.
    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        let mut registry = Self::new();
        registry.load_records(records);
        registry
    }

    fn refresh(&mut self) {
        self.report = detect(self.devices.values());
    }

    fn allocate_id(&mut self) -> DeviceId {
        while let Some(following) = self.next_id.checked_add(1) {
            let id = DeviceId::from_sequence(self.next_id);
            self.next_id = following;
            if !self.devices.contains_key(&id) {
                return id;
            }
        }

        // Counter exhausted by an imported id: reuse the smallest free sequence.
        // Among `len + 1` candidates at least one is free.
        let limit = u64::try_from(self.devices.len()).unwrap_or(u64::MAX).saturating_add(1);
        (1..=limit)
            .map(DeviceId::from_sequence)
            .find(|id| !self.devices.contains_key(id))
            .unwrap_or_else(|| DeviceId::from_sequence(limit))
    }

    fn kind_for(&self, template: &DeviceTemplate) -> DeviceKind {
        let mut kind = DeviceKind::from_parts(
            template.plug_type,
            &template.type_name,
            None,
            None,
            None,
            Some(self.default_wire_mode),
        );
        if let (DeviceKind::Unrecognized(u), Some(slot)) = (&mut kind, &template.selector) {
            // Unknown types have no fixed slot; honor the template's.
            match slot.kind {
                SelectorKind::Channel => u.channel = slot.values.first().copied(),
                SelectorKind::Output => u.output = slot.values.first().copied(),
                SelectorKind::Input => u.input = slot.values.first().copied(),
            }
        }
        kind
    }

    fn first_conflict_free(
        &self,
        candidate: &Device,
        values: &[SelectorValue],
    ) -> Option<SelectorValue> {
        let mut trial: Vec<Device> = self.devices.values().cloned().collect();
        trial.push(candidate.clone());

        values.iter().copied().find(|&value| {
            if let Some(last) = trial.last_mut() {
                last.kind.set_selector(Some(value));
            }
            !detect(&trial).conflicts.iter().any(|c| c.claimant() == &candidate.id)
        })
    }
}

/// First selector value not already taken by a device of the same plug and type.
///
/// Falls back to the first valid value when all are taken, and to `None`
/// when the template has no selector.
pub fn find_next_available(
    template: &DeviceTemplate,
    devices: &[Device],
) -> Option<SelectorValue> {
    let used: Vec<SelectorValue> = devices
        .iter()
        .filter(|d| d.plug_type() == template.plug_type && d.type_name() == template.type_name)
        .filter_map(|d| d.kind.selector())
        .collect();

    template
        .selector_values()
        .iter()
        .copied()
        .find(|v| !used.contains(v))
        .or_else(|| template.first_selector())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(registry: &DeviceRegistry, plug: PlugType, ty: &str) -> DeviceTemplate {
        registry.catalog().template(plug, ty).cloned().unwrap_or_else(|| DeviceTemplate {
            type_name: ty.to_string(),
            label: ty.to_string(),
            plug_type: plug,
            selector: None,
        })
    }

    #[test]
    fn ids_are_sequential() {
        let mut registry = DeviceRegistry::new();
        let t = template(&registry, PlugType::Inputs, "0-10v");
        let a = registry.add_device(&t).device.id;
        let b = registry.add_device(&t).device.id;
        assert_eq!(a.as_str(), "device-1");
        assert_eq!(b.as_str(), "device-2");
    }

    #[test]
    fn add_probes_for_a_free_channel() {
        let mut registry = DeviceRegistry::new();
        let sensor = template(&registry, PlugType::Inputs, "4-20ma");
        let voltage = template(&registry, PlugType::Inputs, "voltage-sensing");
        assert_eq!(registry.add_device(&sensor).device.kind.selector(), Some(1));
        // Different type, same plug: channel 1 is still taken on the connector.
        let added = registry.add_device(&voltage);
        assert_eq!(added.device.kind.selector(), Some(2));
        assert!(added.conflicts.is_empty());
    }

    #[test]
    fn add_falls_back_to_first_value_when_full() {
        let mut registry = DeviceRegistry::new();
        let latching = template(&registry, PlugType::Outputs, "latching");
        registry.add_device(&latching);
        registry.add_device(&latching);
        let third = registry.add_device(&latching);
        assert_eq!(third.device.kind.selector(), Some(1));
        assert_eq!(third.conflicts.len(), 2);
        assert_eq!(registry.list_conflicts().len(), 2);
    }

    #[test]
    fn bus_devices_take_first_value_without_probing() {
        let mut registry = DeviceRegistry::new();
        let rs485 = template(&registry, PlugType::Communications, "rs485");
        let first = registry.add_device(&rs485);
        let second = registry.add_device(&rs485);
        assert_eq!(first.device.kind.selector(), None);
        assert_eq!(second.device.kind.selector(), None);
        assert!(registry.list_conflicts().is_empty());
    }

    #[test]
    fn update_unknown_device_returns_none() {
        let mut registry = DeviceRegistry::new();
        let patch = DevicePatch { label: Some("x".into()), ..DevicePatch::default() };
        assert!(registry.update_device(&DeviceId::from("device-99"), patch).is_none());
        assert!(registry.remove_device(&DeviceId::from("device-99")).is_none());
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut registry = DeviceRegistry::new();
        let t = template(&registry, PlugType::Inputs, "0-10v");
        let id = registry.add_device(&t).device.id;

        let patch = DevicePatch { wire_mode: Some(WireMode::TwoWire), ..DevicePatch::default() };
        let updated = registry.update_device(&id, patch);
        let updated = updated.as_ref();
        assert_eq!(updated.map(|d| d.kind.selector()), Some(Some(1)));
        assert_eq!(updated.map(|d| d.label.as_str()), Some("0-10V Sensor"));
        assert_eq!(
            registry.pin_usage(&id).map(|u| u.power_pins.to_vec()),
            Some(vec![3])
        );
    }

    #[test]
    fn default_wire_mode_applies_to_new_analog_devices() {
        let mut registry = DeviceRegistry::new().with_default_wire_mode(WireMode::TwoWire);
        let t = template(&registry, PlugType::Inputs, "0-10v");
        let added = registry.add_device(&t);
        assert_eq!(added.device.kind.wire_mode(), Some(WireMode::TwoWire));
    }

    #[test]
    fn find_next_available_only_counts_same_type() {
        let mut registry = DeviceRegistry::new();
        let relay = template(&registry, PlugType::Outputs, "relay");
        let transistor = template(&registry, PlugType::Outputs, "transistor");
        registry.add_device(&relay);
        let devices: Vec<Device> = registry.devices().cloned().collect();
        assert_eq!(find_next_available(&relay, &devices), Some(2));
        assert_eq!(find_next_available(&transistor, &devices), Some(1));

        let rs485 = template(&registry, PlugType::Communications, "rs485");
        assert_eq!(find_next_available(&rs485, &devices), None);
    }

    #[test]
    fn find_next_available_returns_first_when_exhausted() {
        let mut registry = DeviceRegistry::new();
        let power = template(&registry, PlugType::Inputs, "power-input");
        registry.add_device(&power);
        let devices: Vec<Device> = registry.devices().cloned().collect();
        assert_eq!(find_next_available(&power, &devices), Some(1));
    }

    #[test]
    fn load_records_resumes_id_counter() {
        let records = vec![
            DeviceRecord {
                id: "device-7".into(),
                plug_type: PlugType::Outputs,
                device_type: "relay".into(),
                channel: None,
                output: Some(2),
                input: None,
                wire_mode: None,
                label: "Pump".into(),
                wire_numbers: BTreeMap::new(),
            },
            DeviceRecord {
                id: "legacy".into(),
                plug_type: PlugType::Inputs,
                device_type: "0-10v".into(),
                channel: Some(1),
                output: None,
                input: None,
                wire_mode: None,
                label: "Level".into(),
                wire_numbers: BTreeMap::new(),
            },
        ];
        let mut registry = DeviceRegistry::from_records(records);
        assert_eq!(registry.len(), 2);
        let t = template(&registry, PlugType::Inputs, "4-20ma");
        assert_eq!(registry.add_device(&t).device.id.as_str(), "device-8");
    }

    #[test]
    fn add_after_importing_largest_id_reuses_free_sequence() {
        let records = vec![DeviceRecord {
            id: format!("device-{}", u64::MAX),
            plug_type: PlugType::Communications,
            device_type: "sdi12".into(),
            channel: None,
            output: None,
            input: None,
            wire_mode: None,
            label: "Soil moisture".into(),
            wire_numbers: BTreeMap::new(),
        }];
        let mut registry = DeviceRegistry::from_records(records);
        let first = registry.add_device_of_type(PlugType::Inputs, "0-10v").map(|a| a.device.id);
        let second = registry.add_device_of_type(PlugType::Inputs, "0-10v").map(|a| a.device.id);
        assert_eq!(first.as_ref().map(DeviceId::as_str), Some("device-1"));
        assert_eq!(second.as_ref().map(DeviceId::as_str), Some("device-2"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn add_device_of_type_rejects_unknown_types() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.add_device_of_type(PlugType::Inputs, "relay").is_none());
        assert!(registry.add_device_of_type(PlugType::Outputs, "relay").is_some());
    }
}
