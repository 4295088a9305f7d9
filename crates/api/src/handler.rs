// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Request dispatch.
//!
//! One handler function per request type. Handlers never fail: problems come
//! back as [`ResponsePayload::Error`].

use crate::schedule::{schedule_csv, ScheduleOptions};
use crate::{design, diagram, pinout, summary, PinUsageView, RequestPayload, ResponsePayload};
use tracing::{debug, warn};
use wirekit_core::{conflict_alert, DeviceId, DevicePatch, DeviceRegistry, PlugType, SelectorValue};

/// Applies `payload` to `registry` and returns the response to send back.
pub fn handle_request(registry: &mut DeviceRegistry, payload: RequestPayload) -> ResponsePayload {
    match payload {
        RequestPayload::AddDevice { plug_type, device_type } => {
            handle_add_device(registry, plug_type, &device_type)
        },
        RequestPayload::UpdateDevice { id, patch } => handle_update_device(registry, &id, patch),
        RequestPayload::RemoveDevice { id } => handle_remove_device(registry, id),
        RequestPayload::ListDevices => {
            ResponsePayload::DevicesListed { devices: registry.to_records() }
        },
        RequestPayload::GetPinUsage { id } => handle_get_pin_usage(registry, id),
        RequestPayload::ListConflicts => ResponsePayload::ConflictsListed {
            conflicts: registry.list_conflicts().to_vec(),
            power_shares: registry.power_shares().to_vec(),
        },
        RequestPayload::GetPinSummary => {
            ResponsePayload::PinSummary { summary: summary::summarize(registry) }
        },
        RequestPayload::ListTemplates { plug_type } => handle_list_templates(registry, plug_type),
        RequestPayload::GetPinout { plug_type, device_type, selector } => {
            handle_get_pinout(registry, plug_type, &device_type, selector)
        },
        RequestPayload::GetDiagram => {
            ResponsePayload::Diagram { diagram: diagram::project(registry) }
        },
        RequestPayload::ExportDesign => {
            ResponsePayload::DesignExported { devices: registry.to_records() }
        },
        RequestPayload::ImportDesign { devices } => handle_import_design(registry, devices),
        RequestPayload::ExportCsv => match schedule_csv(registry, ScheduleOptions::default()) {
            Ok(csv) => ResponsePayload::CsvExported { csv },
            Err(e) => ResponsePayload::error(e.to_string()),
        },
    }
}

fn handle_add_device(
    registry: &mut DeviceRegistry,
    plug_type: PlugType,
    device_type: &str,
) -> ResponsePayload {
    let Some(added) = registry.add_device_of_type(plug_type, device_type) else {
        return ResponsePayload::error(format!(
            "Plug '{plug_type}' does not offer device type '{device_type}'"
        ));
    };
    let alert = conflict_alert(&added.conflicts);
    ResponsePayload::DeviceAdded {
        device: added.device.to_record(),
        conflicts: added.conflicts,
        alert,
    }
}

fn handle_update_device(
    registry: &mut DeviceRegistry,
    id: &DeviceId,
    patch: DevicePatch,
) -> ResponsePayload {
    if patch.is_empty() {
        debug!(device_id = %id, "Empty update");
    }
    match registry.update_device(id, patch) {
        Some(device) => ResponsePayload::DeviceUpdated {
            device: device.to_record(),
            conflicts: registry.conflicts_for(id),
        },
        None => ResponsePayload::error(format!("Device '{id}' not found")),
    }
}

fn handle_remove_device(registry: &mut DeviceRegistry, id: DeviceId) -> ResponsePayload {
    if registry.remove_device(&id).is_some() {
        ResponsePayload::DeviceRemoved { id }
    } else {
        ResponsePayload::error(format!("Device '{id}' not found"))
    }
}

fn handle_get_pin_usage(registry: &DeviceRegistry, id: DeviceId) -> ResponsePayload {
    match registry.pin_usage(&id) {
        Some(usage) => {
            let usage = PinUsageView::from(&usage);
            ResponsePayload::PinUsage { id, usage }
        },
        None => ResponsePayload::error(format!("Device '{id}' not found")),
    }
}

fn handle_list_templates(
    registry: &DeviceRegistry,
    plug_type: Option<PlugType>,
) -> ResponsePayload {
    let templates = registry
        .catalog()
        .templates
        .iter()
        .filter(|t| plug_type.is_none_or(|p| t.plug_type == p))
        .cloned()
        .collect();
    ResponsePayload::TemplatesListed { templates }
}

fn handle_get_pinout(
    registry: &DeviceRegistry,
    plug_type: PlugType,
    device_type: &str,
    selector: Option<SelectorValue>,
) -> ResponsePayload {
    pinout::pinout(registry.catalog(), plug_type, device_type, selector).map_or_else(
        || {
            ResponsePayload::error(format!(
                "Plug '{plug_type}' does not offer device type '{device_type}'"
            ))
        },
        |pinout| ResponsePayload::Pinout { pinout },
    )
}

fn handle_import_design(
    registry: &mut DeviceRegistry,
    devices: serde_json::Value,
) -> ResponsePayload {
    match design::records_from_value(devices) {
        Ok(records) => {
            let count = records.len();
            registry.load_records(records);
            ResponsePayload::DesignImported {
                devices: count,
                conflicts: registry.list_conflicts().to_vec(),
            }
        },
        Err(e) => {
            warn!(error = %e, "Rejected design import");
            ResponsePayload::error(e.to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(registry: &mut DeviceRegistry, plug: PlugType, device_type: &str) -> ResponsePayload {
        handle_request(
            registry,
            RequestPayload::AddDevice { plug_type: plug, device_type: device_type.to_string() },
        )
    }

    #[test]
    fn add_reports_alert_only_on_conflict() {
        let mut registry = DeviceRegistry::new();
        for _ in 0..4 {
            match add(&mut registry, PlugType::Inputs, "0-10v") {
                ResponsePayload::DeviceAdded { alert, conflicts, .. } => {
                    assert!(alert.is_none());
                    assert!(conflicts.is_empty());
                },
                other => panic!("unexpected response: {other:?}"),
            }
        }
        match add(&mut registry, PlugType::Inputs, "4-20ma") {
            ResponsePayload::DeviceAdded { alert, conflicts, .. } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(alert.as_deref(), Some("Pin conflict detected on: inputs Pin 8"));
            },
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn unknown_device_type_is_an_error() {
        let mut registry = DeviceRegistry::new();
        assert!(add(&mut registry, PlugType::Communications, "relay").is_error());
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut registry = DeviceRegistry::new();
        let id = DeviceId::from("device-9");
        let response = handle_request(
            &mut registry,
            RequestPayload::UpdateDevice { id: id.clone(), patch: DevicePatch::default() },
        );
        assert!(response.is_error());
        let remove = RequestPayload::RemoveDevice { id: id.clone() };
        assert!(handle_request(&mut registry, remove).is_error());
        assert!(handle_request(&mut registry, RequestPayload::GetPinUsage { id }).is_error());
    }

    #[test]
    fn import_rejects_non_arrays() {
        let mut registry = DeviceRegistry::new();
        let response = handle_request(
            &mut registry,
            RequestPayload::ImportDesign { devices: serde_json::json!({"devices": []}) },
        );
        match response {
            ResponsePayload::Error { message } => {
                assert!(message.contains("Expected an array of devices"), "{message}");
            },
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn templates_can_be_filtered_by_plug() {
        let mut registry = DeviceRegistry::new();
        let response = handle_request(
            &mut registry,
            RequestPayload::ListTemplates { plug_type: Some(PlugType::Communications) },
        );
        let ResponsePayload::TemplatesListed { templates } = response else {
            panic!("unexpected response: {response:?}");
        };
        let types: Vec<&str> = templates.iter().map(|t| t.type_name.as_str()).collect();
        assert_eq!(types, ["rs485", "wiegand", "sdi12", "pulse", "power-input"]);
    }
}
