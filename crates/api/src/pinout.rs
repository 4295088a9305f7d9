// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Static pinout view for a device type and selector.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use wirekit_core::device::CommunicationsDevice;
use wirekit_core::{
    allocate, Catalog, DeviceKind, DeviceTypeDescriptor, PinNumber, PinUsage, PlugType,
    SelectorValue, POWER_BUS_PINS,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PinoutRow {
    pub pin: PinNumber,
    /// Color name (`White`, `Brown`, ...).
    pub color: String,
    pub hex: String,
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub device_terminal: Option<String>,
    pub highlighted: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
pub struct PinoutSection {
    pub title: String,
    pub rows: Vec<PinoutRow>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PinoutView {
    pub plug_type: PlugType,
    #[serde(rename = "type")]
    pub device_type: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub selector: Option<SelectorValue>,
    pub sections: Vec<PinoutSection>,
}

impl PinoutView {
    /// Pins highlighted in any section, in display order.
    pub fn highlighted_pins(&self) -> Vec<PinNumber> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .filter(|r| r.highlighted)
            .map(|r| r.pin)
            .collect()
    }
}

fn row(descriptor: &DeviceTypeDescriptor, pin: PinNumber, highlighted: bool) -> Option<PinoutRow> {
    let entry = descriptor.pin(pin)?;
    Some(PinoutRow {
        pin,
        color: entry.color.name().to_string(),
        hex: entry.color.hex().to_string(),
        function: entry.function.clone(),
        device_terminal: entry.device_terminal.clone(),
        highlighted,
    })
}

/// Pins the selection lights up: its signal pins, or the supply pins for a
/// power input.
fn occupied(kind: &DeviceKind, usage: &PinUsage) -> Vec<PinNumber> {
    if kind.is_power_input() {
        usage.solar_pins.to_vec()
    } else {
        usage.signal_pins.to_vec()
    }
}

/// Builds the pinout for `device_type` on `plug_type` with `selector` applied.
///
/// Returns `None` when the plug does not offer the device type. Pulse counters
/// get two sections, since their sensor power comes from the inputs plug.
pub fn pinout(
    catalog: &Catalog,
    plug_type: PlugType,
    device_type: &str,
    selector: Option<SelectorValue>,
) -> Option<PinoutView> {
    let descriptor = catalog.descriptor(plug_type, device_type)?;

    let mut kind = DeviceKind::from_parts(plug_type, device_type, None, None, None, None);
    let selector = selector.or_else(|| {
        catalog.template(plug_type, device_type).and_then(|t| t.first_selector())
    });
    kind.set_selector(selector);
    let usage = allocate(&kind);
    let lit = occupied(&kind, &usage);

    let is_pulse = matches!(kind, DeviceKind::Communications(CommunicationsDevice::Pulse { .. }));
    let sections = if is_pulse {
        let power: Vec<PinoutRow> =
            POWER_BUS_PINS.iter().filter_map(|&p| row(descriptor, p, true)).collect();
        let comms: Vec<PinoutRow> = POWER_BUS_PINS
            .iter()
            .map(|&p| (p, false))
            .chain(lit.iter().map(|&p| (p, true)))
            .filter_map(|(p, h)| row(descriptor, p, h))
            .collect();
        vec![
            PinoutSection { title: PlugType::Inputs.plug_label().to_string(), rows: power },
            PinoutSection { title: PlugType::Communications.plug_label().to_string(), rows: comms },
        ]
    } else {
        let rows = descriptor
            .pins
            .iter()
            .filter_map(|p| row(descriptor, p.pin, lit.contains(&p.pin)))
            .collect();
        vec![PinoutSection { title: "Plug View".to_string(), rows }]
    };

    Some(PinoutView {
        plug_type,
        device_type: descriptor.value.clone(),
        label: descriptor.label.clone(),
        selector,
        sections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(plug: PlugType, device_type: &str, selector: Option<SelectorValue>) -> PinoutView {
        pinout(&Catalog::builtin(), plug, device_type, selector).unwrap_or_else(|| {
            panic!("no pinout for {plug}/{device_type}");
        })
    }

    #[test]
    fn analog_channel_highlights_inverted_pin() {
        let v = view(PlugType::Inputs, "0-10v", Some(2));
        assert_eq!(v.sections.len(), 1);
        assert_eq!(v.sections[0].title, "Plug View");
        assert_eq!(v.sections[0].rows.len(), 8);
        assert_eq!(v.highlighted_pins(), vec![7]);
        assert_eq!(v.sections[0].rows[6].color, "Blue");
    }

    #[test]
    fn missing_selector_uses_first_palette_value() {
        let v = view(PlugType::Outputs, "latching", None);
        assert_eq!(v.selector, Some(1));
        assert_eq!(v.highlighted_pins(), vec![5, 6]);
    }

    #[test]
    fn pulse_counter_shows_borrowed_power() {
        let v = view(PlugType::Communications, "pulse", Some(2));
        let titles: Vec<&str> = v.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Inputs Plug", "Communications Plug"]);
        let comms: Vec<(PinNumber, bool)> =
            v.sections[1].rows.iter().map(|r| (r.pin, r.highlighted)).collect();
        assert_eq!(comms, [(3, false), (4, false), (5, true)]);
        assert!(v.sections[0].rows.iter().all(|r| r.highlighted));
    }

    #[test]
    fn power_input_highlights_supply() {
        let v = view(PlugType::Outputs, "power-input", None);
        assert_eq!(v.highlighted_pins(), vec![1, 2]);
    }

    #[test]
    fn unknown_type_has_no_pinout() {
        assert!(pinout(&Catalog::builtin(), PlugType::Inputs, "relay", None).is_none());
    }
}
