// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! WireKit Core - pin allocation and conflict detection for connector wiring.
//!
//! A host device exposes three 8-pin connectors (inputs, communications,
//! outputs). This crate decides which physical pins each configured device
//! occupies and flags devices that collide on an exclusive pin.
//!
//! ## Core Modules
//!
//! - [`connector`]: The three plugs, pin numbers, and the fixed pin color order
//! - [`catalog`]: Static pin maps, device legends, and the add-device palette
//! - [`device`]: Device records and the tagged per-plug device kinds
//! - [`allocation`]: Pure mapping from a device to its signal/power/solar pins
//! - [`conflict`]: Signal-pin conflict detection and power-sharing advisories
//! - [`registry`]: Owned device list with add/update/remove and auto-assignment
//! - [`error`]: Error types for the I/O boundaries built on top of the core
//!
//! ## Quick Start
//!
//! ```
//! use wirekit_core::{DeviceRegistry, DevicePatch, PlugType};
//!
//! let mut registry = DeviceRegistry::new();
//! let first = registry.add_device_of_type(PlugType::Inputs, "0-10v");
//! let second = registry.add_device_of_type(PlugType::Inputs, "0-10v");
//! assert!(registry.list_conflicts().is_empty());
//!
//! if let (Some(first), Some(second)) = (first, second) {
//!     let patch = DevicePatch { selector: Some(1), ..DevicePatch::default() };
//!     registry.update_device(&second.device.id, patch);
//!     assert_eq!(registry.list_conflicts()[0].devices, [first.device.id, second.device.id]);
//! }
//! ```

pub mod allocation;
pub mod catalog;
pub mod conflict;
pub mod connector;
pub mod device;
pub mod error;
pub mod registry;

// Error handling
pub use error::{Result, WireKitError};

// Connectors and pins
pub use connector::{
    all_pins, color_name, is_power_bus_pin, PinColor, PinNumber, PlugType, PIN_COUNT,
    POWER_BUS_PINS, SOLAR_PINS,
};

// Catalog
pub use catalog::{
    Catalog, DeviceInfo, DeviceTemplate, DeviceTypeDescriptor, PinDescriptor, PinRole,
    PlugDescriptor, SelectorSlot,
};

// Devices
pub use device::{Device, DeviceId, DeviceKind, DeviceRecord, SelectorKind, SelectorValue, WireMode};

// Allocation and conflicts
pub use allocation::{allocate, allocate_device, PinSet, PinUsage};
pub use conflict::{conflict_alert, detect, detect_conflicts, Conflict, ConflictReport, PowerShare};

// Registry
pub use registry::{find_next_available, DeviceAdded, DevicePatch, DeviceRegistry};
