// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! YAML design format parsing and compilation.
//!
//! A hand-written design lists devices by plug and type. Selectors may be
//! omitted, in which case the registry auto-assigns them exactly as the
//! add-device palette does:
//!
//! ```yaml
//! name: Pump station
//! devices:
//!   - inputs/0-10v            # short form: plug/type
//!   - type: 4-20ma
//!     plug: inputs
//!     label: Tank level
//!     channel: 3
//!     wireMode: 2-wire
//!   - type: relay
//!     plug: outputs
//!     output: 2
//!     wireNumbers: { a1: W14, a2: W15 }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use wirekit_core::{
    DeviceId, DevicePatch, DeviceRegistry, PlugType, Result, SelectorKind, SelectorValue,
    WireKitError, WireMode,
};

/// A fully spelled-out device entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserDevice {
    #[serde(rename = "type")]
    pub device_type: String,
    pub plug: PlugType,
    pub label: Option<String>,
    pub channel: Option<SelectorValue>,
    pub output: Option<SelectorValue>,
    pub input: Option<SelectorValue>,
    #[serde(rename = "wireMode", alias = "wire_mode")]
    pub wire_mode: Option<WireMode>,
    #[serde(rename = "wireNumbers", alias = "wire_numbers", default)]
    pub wire_numbers: IndexMap<String, String>,
}

/// One entry of the `devices` list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserDeviceEntry {
    /// `plug/type`, everything else auto-assigned.
    Short(String),
    Full(UserDevice),
}

/// The top-level structure of a YAML design.
#[derive(Debug, Deserialize)]
pub struct UserDesign {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub devices: Vec<UserDeviceEntry>,
}

/// Name and description carried by a compiled design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub devices: Vec<DeviceId>,
}

/// Parses YAML text into a [`UserDesign`].
///
/// # Errors
///
/// Returns [`WireKitError::Configuration`] if the YAML is malformed.
pub fn parse(text: &str) -> Result<UserDesign> {
    serde_saphyr::from_str(text)
        .map_err(|e| WireKitError::Configuration(format!("Invalid YAML design: {e}")))
}

impl UserDeviceEntry {
    fn into_device(self, position: usize) -> Result<UserDevice> {
        match self {
            Self::Full(device) => Ok(device),
            Self::Short(spec) => {
                let Some((plug, device_type)) = spec.split_once('/') else {
                    return Err(WireKitError::Configuration(format!(
                        "Device #{position}: expected 'plug/type', got '{spec}'"
                    )));
                };
                Ok(UserDevice {
                    device_type: device_type.trim().to_string(),
                    plug: plug.parse()?,
                    label: None,
                    channel: None,
                    output: None,
                    input: None,
                    wire_mode: None,
                    wire_numbers: IndexMap::new(),
                })
            },
        }
    }
}

impl UserDevice {
    /// The explicit selector, checked against the slot the template uses.
    fn selector(
        &self,
        slot: Option<SelectorKind>,
        position: usize,
    ) -> Result<Option<SelectorValue>> {
        let given = [
            (SelectorKind::Channel, self.channel),
            (SelectorKind::Output, self.output),
            (SelectorKind::Input, self.input),
        ];
        let mut selected = None;
        for (kind, value) in given {
            let Some(value) = value else { continue };
            if slot != Some(kind) {
                let expected = slot.map_or("no selector", SelectorKind::as_str);
                return Err(WireKitError::Configuration(format!(
                    "Device #{position} ({}): '{}' is not valid here (uses {expected})",
                    self.device_type,
                    kind.as_str()
                )));
            }
            selected = Some(value);
        }
        Ok(selected)
    }
}

/// "Compiles" a user design into `registry`, appending its devices in order.
///
/// Each device is added through the registry's auto-assignment first, then any
/// explicit selector, wire mode, label, or wire numbers are applied as an update.
///
/// # Errors
///
/// Returns [`WireKitError::Configuration`] if an entry names a type its plug
/// does not offer, or uses a selector field the type does not have.
pub fn compile(design: UserDesign, registry: &mut DeviceRegistry) -> Result<DesignInfo> {
    let mut ids = Vec::with_capacity(design.devices.len());

    for (idx, entry) in design.devices.into_iter().enumerate() {
        let position = idx + 1;
        let device = entry.into_device(position)?;

        let Some(template) = registry.catalog().template(device.plug, &device.device_type).cloned()
        else {
            return Err(WireKitError::Configuration(format!(
                "Device #{position}: plug '{}' does not offer device type '{}'",
                device.plug, device.device_type
            )));
        };

        let slot = template.selector.as_ref().map(|s| s.kind);
        let selector = device.selector(slot, position)?;
        if let Some(value) = selector {
            if !template.selector_values().contains(&value) {
                tracing::warn!(
                    position,
                    device_type = %device.device_type,
                    value,
                    "Selector is outside the valid range; the device will not occupy any pins"
                );
            }
        }

        let added = registry.add_device(&template);
        let patch = DevicePatch {
            selector,
            wire_mode: device.wire_mode,
            label: device.label,
            wire_numbers: (!device.wire_numbers.is_empty())
                .then(|| device.wire_numbers.into_iter().collect()),
        };
        if !patch.is_empty() {
            registry.update_device(&added.device.id, patch);
        }
        ids.push(added.device.id);
    }

    Ok(DesignInfo { name: design.name, description: design.description, devices: ids })
}
