// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Plain-text tables for terminal output.

use wirekit_api::pinout::PinoutView;
use wirekit_api::summary::PinSummary;
use wirekit_api::PinUsageView;
use wirekit_core::{Catalog, Device, DeviceRegistry, PinNumber, PlugType};

fn pin_list(pins: &[PinNumber]) -> String {
    if pins.is_empty() {
        return "-".to_string();
    }
    pins.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn selector_text(device: &Device) -> String {
    match (device.kind.selector_kind(), device.kind.selector()) {
        (Some(kind), Some(value)) => format!("{} {value}", kind.label()),
        (Some(kind), None) => format!("{} ?", kind.label()),
        (None, _) => "-".to_string(),
    }
}

/// The add-device palette, optionally for one plug, with wiring legends.
pub fn templates(catalog: &Catalog, plug: Option<PlugType>) -> String {
    let mut lines = Vec::new();
    for plug_type in PlugType::ALL {
        if plug.is_some_and(|p| p != plug_type) {
            continue;
        }
        lines.push(format!("{}:", plug_type.plug_label()));
        for template in catalog.templates_for(plug_type) {
            let selector = template.selector.as_ref().map_or_else(String::new, |s| {
                format!("  [{} {}]", s.kind.as_str(), pin_list(&s.values))
            });
            lines.push(format!("  {:<16} {}{selector}", template.type_name, template.label));
            if let Some(descriptor) = catalog.descriptor(plug_type, &template.type_name) {
                for legend in &descriptor.connections {
                    lines.push(format!("      - {}", legend.description));
                }
            }
        }
    }
    lines.join("\n")
}

/// A pinout view; highlighted pins are marked with `*`.
pub fn pinout(view: &PinoutView) -> String {
    let mut lines = vec![match view.selector {
        Some(value) => {
            format!("{} ({}) on {} [{value}]", view.label, view.device_type, view.plug_type)
        },
        None => format!("{} ({}) on {}", view.label, view.device_type, view.plug_type),
    }];
    for section in &view.sections {
        lines.push(String::new());
        lines.push(section.title.clone());
        lines.push(format!("  {:<4} {:<7} {:<38} TERMINAL", "PIN", "COLOR", "FUNCTION"));
        for row in &section.rows {
            let mark = if row.highlighted { '*' } else { ' ' };
            lines.push(format!(
                "{mark} {:<4} {:<7} {:<38} {}",
                row.pin,
                row.color,
                row.function,
                row.device_terminal.as_deref().unwrap_or("-")
            ));
        }
    }
    lines.join("\n")
}

fn wire_text(device: &Device) -> String {
    device
        .wire_numbers
        .iter()
        .filter(|(_, wire)| !wire.trim().is_empty())
        .map(|(terminal, wire)| format!("{terminal}={}", wire.trim()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per device with its selector, occupied pins and any wire numbers.
pub fn devices(registry: &DeviceRegistry) -> String {
    if registry.is_empty() {
        return "No devices.".to_string();
    }
    let mut lines = vec![format!(
        "{:<12} {:<24} {:<15} {:<16} {:<10} PINS",
        "ID", "LABEL", "PLUG", "TYPE", "SELECTOR"
    )];
    for device in registry.devices() {
        let usage = wirekit_core::allocate(&device.kind);
        let mut line = format!(
            "{:<12} {:<24} {:<15} {:<16} {:<10} {}",
            device.id,
            device.label,
            device.plug_type(),
            device.type_name(),
            selector_text(device),
            pin_list(&usage.all())
        );
        let wires = wire_text(device);
        if !wires.is_empty() {
            line.push_str("  wires: ");
            line.push_str(&wires);
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn usage(view: &PinUsageView) -> String {
    format!(
        "signal: {}  power: {}  solar: {}  all: {}",
        pin_list(&view.signal_pins),
        pin_list(&view.power_pins),
        pin_list(&view.solar_pins),
        pin_list(&view.all)
    )
}

/// Conflict alert and power-sharing advisories.
pub fn conflicts(registry: &DeviceRegistry) -> String {
    let mut lines = Vec::new();
    match registry.conflict_report().alert() {
        Some(alert) => {
            lines.push(alert);
            for conflict in registry.list_conflicts() {
                lines.push(format!(
                    "  {conflict}: {} claimed by {}",
                    conflict.owner(),
                    conflict.claimant()
                ));
            }
        },
        None => lines.push("No pin conflicts.".to_string()),
    }
    for share in registry.power_shares() {
        let ids: Vec<String> = share.devices.iter().map(ToString::to_string).collect();
        lines.push(format!(
            "  note: {} Pin {} power shared by {}",
            share.plug_type,
            share.pin,
            ids.join(", ")
        ));
    }
    lines.join("\n")
}

pub fn summary(summary: &PinSummary) -> String {
    let mut lines = vec![format!("Devices: {}", summary.device_count)];
    for plug in &summary.plugs {
        lines.push(format!("{}:", plug.label));
        for entry in &plug.pins {
            let mut flags = Vec::new();
            if entry.shared {
                flags.push("shared");
            }
            if entry.conflict {
                flags.push("CONFLICT");
            }
            let ids: Vec<String> = entry.devices.iter().map(ToString::to_string).collect();
            lines.push(format!(
                "  Pin {} ({:<6}) {} device(s): {}{}",
                entry.pin,
                entry.color,
                entry.device_count(),
                ids.join(", "),
                if flags.is_empty() { String::new() } else { format!("  [{}]", flags.join(", ")) }
            ));
        }
    }
    lines.join("\n")
}
