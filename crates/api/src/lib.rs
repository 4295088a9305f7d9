// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! api: The collaborator contract for WireKit.
//!
//! Everything that consumes the core registry lives here: the tagged
//! request/response payloads, design file import/export, the CSV wiring
//! schedule, the node/edge diagram projection, the static pinout view, the
//! pin usage summary, and the YAML design format.
//!
//! All projections are pure functions of a [`DeviceRegistry`]; none of them
//! keep their own copy of device state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod design;
pub mod diagram;
pub mod pinout;
pub mod schedule;
pub mod summary;
pub mod yaml;

mod handler;

pub use handler::handle_request;

// Re-export core types so clients only need this crate.
pub use wirekit_core::{
    Catalog, Conflict, Device, DeviceId, DevicePatch, DeviceRecord, DeviceRegistry,
    DeviceTemplate, PinNumber, PinUsage, PlugType, PowerShare, SelectorValue, WireMode,
    WireKitError,
};

use diagram::Diagram;
use pinout::PinoutView;
use summary::PinSummary;

// --- Message Types ---

/// The type of message being sent or received.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Client-initiated request that expects a response
    Request,
    /// Reply to a specific request (matched by correlation_id)
    Response,
}

/// Envelope for requests and responses on line-oriented transports.
///
/// # Example (Request)
/// ```json
/// {
///   "type": "request",
///   "correlation_id": "7",
///   "payload": { "action": "adddevice", "plugType": "inputs", "type": "0-10v" }
/// }
/// ```
///
/// # Example (Response)
/// ```json
/// {
///   "type": "response",
///   "correlation_id": "7",
///   "payload": {
///     "action": "deviceadded",
///     "device": { "id": "device-1", "...": "..." },
///     "conflicts": []
///   }
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message<T> {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub payload: T,
}

impl Message<ResponsePayload> {
    /// Wraps `payload` as the response to a request with `correlation_id`.
    pub const fn response(correlation_id: Option<String>, payload: ResponsePayload) -> Self {
        Self { message_type: MessageType::Response, correlation_id, payload }
    }
}

pub type Request = Message<RequestPayload>;
pub type Response = Message<ResponsePayload>;

// --- Views ---

/// Pin usage of one device as seen by collaborators.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PinUsageView {
    pub signal_pins: Vec<PinNumber>,
    pub power_pins: Vec<PinNumber>,
    pub solar_pins: Vec<PinNumber>,
    /// Union of the three sets, ascending, no duplicates.
    pub all: Vec<PinNumber>,
}

impl From<&PinUsage> for PinUsageView {
    fn from(usage: &PinUsage) -> Self {
        Self {
            signal_pins: usage.signal_pins.to_vec(),
            power_pins: usage.power_pins.to_vec(),
            solar_pins: usage.solar_pins.to_vec(),
            all: usage.all(),
        }
    }
}

/// The pins listed for a device in schedules and summaries.
///
/// Signal then power pins. Power inputs list their supply pins instead, since
/// that is all they connect to.
pub fn connection_pins(device: &Device) -> Vec<PinNumber> {
    let usage = wirekit_core::allocate(&device.kind);
    if device.kind.is_power_input() {
        usage.solar_pins.to_vec()
    } else {
        usage.wired_pins().collect()
    }
}

// --- Client-to-Server Payloads (Requests) ---

/// Request payloads.
///
/// # Devices
/// - `AddDevice`: Add a device from the palette, auto-assigning its selector
/// - `UpdateDevice`: Merge selector, wire mode, label, or wire numbers
/// - `RemoveDevice`: Remove a device
/// - `ListDevices`: All devices in insertion order
///
/// # Analysis
/// - `GetPinUsage`: Pins one device occupies
/// - `ListConflicts`: Signal-pin conflicts and power-sharing advisories
/// - `GetPinSummary`: Used pins per plug with device counts
///
/// # Catalog
/// - `ListTemplates`: The add-device palette
/// - `GetPinout`: Static pin map with the selection highlighted
///
/// # Projections
/// - `GetDiagram`: Nodes and edges for the wiring diagram
/// - `ExportDesign` / `ImportDesign`: Flat device record list
/// - `ExportCsv`: Wiring schedule
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
#[serde(tag = "action")]
#[serde(rename_all = "lowercase")]
pub enum RequestPayload {
    AddDevice {
        #[serde(rename = "plugType")]
        plug_type: PlugType,
        #[serde(rename = "type")]
        device_type: String,
    },
    UpdateDevice {
        id: DeviceId,
        patch: DevicePatch,
    },
    RemoveDevice {
        id: DeviceId,
    },
    ListDevices,
    GetPinUsage {
        id: DeviceId,
    },
    ListConflicts,
    GetPinSummary,
    ListTemplates {
        /// Restrict to one plug.
        #[serde(default, rename = "plugType", skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        plug_type: Option<PlugType>,
    },
    GetPinout {
        #[serde(rename = "plugType")]
        plug_type: PlugType,
        #[serde(rename = "type")]
        device_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        selector: Option<SelectorValue>,
    },
    GetDiagram,
    ExportDesign,
    /// Replaces the registry with the given document, which must be an array of device records.
    ImportDesign {
        #[ts(type = "unknown")]
        devices: serde_json::Value,
    },
    ExportCsv,
}

// --- Server-to-Client Payloads (Responses) ---

#[derive(Serialize, Deserialize, Debug, Clone, TS)]
#[ts(export)]
#[serde(tag = "action")]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    DeviceAdded {
        device: DeviceRecord,
        /// Conflicts the new device is part of. Advisory: the device was added.
        conflicts: Vec<Conflict>,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        alert: Option<String>,
    },
    DeviceUpdated {
        device: DeviceRecord,
        conflicts: Vec<Conflict>,
    },
    DeviceRemoved {
        id: DeviceId,
    },
    DevicesListed {
        devices: Vec<DeviceRecord>,
    },
    PinUsage {
        id: DeviceId,
        usage: PinUsageView,
    },
    ConflictsListed {
        conflicts: Vec<Conflict>,
        #[serde(rename = "powerShares")]
        power_shares: Vec<PowerShare>,
    },
    PinSummary {
        summary: PinSummary,
    },
    TemplatesListed {
        templates: Vec<DeviceTemplate>,
    },
    Pinout {
        pinout: PinoutView,
    },
    Diagram {
        diagram: Diagram,
    },
    DesignExported {
        devices: Vec<DeviceRecord>,
    },
    DesignImported {
        devices: usize,
        conflicts: Vec<Conflict>,
    },
    CsvExported {
        csv: String,
    },
    Error {
        message: String,
    },
}

impl ResponsePayload {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
