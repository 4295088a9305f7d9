// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! CSV wiring schedule: one row per device with the pins to wire.

use crate::connection_pins;
use serde::Serialize;
use std::io::Write;
use wirekit_core::{color_name, Device, DeviceRegistry, Result, WireKitError};

/// Column header line, always written unquoted.
pub const SCHEDULE_HEADER: &str = "Device Name,Type,Plug,Connections";

/// One line of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub device_name: String,
    pub device_type: String,
    pub plug: String,
    /// `Pin 8 (Red); Pin 3 (Green); Pin 4 (Yellow)`
    pub connections: String,
}

impl ScheduleRow {
    pub fn for_device(device: &Device) -> Self {
        let connections: Vec<String> = connection_pins(device)
            .into_iter()
            .map(|pin| format!("Pin {pin} ({})", color_name(pin)))
            .collect();
        Self {
            device_name: device.label.clone(),
            device_type: device.type_name().to_string(),
            plug: device.plug_type().to_string(),
            connections: connections.join("; "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    /// Quote every field, not just those that need it.
    pub quote_all: bool,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self { quote_all: true }
    }
}

pub fn schedule_rows(registry: &DeviceRegistry) -> Vec<ScheduleRow> {
    registry.devices().map(ScheduleRow::for_device).collect()
}

/// Writes the schedule for every device in registry order.
///
/// # Errors
///
/// Returns [`WireKitError::Export`] if a row cannot be written.
pub fn write_schedule<W: Write>(
    registry: &DeviceRegistry,
    mut writer: W,
    options: ScheduleOptions,
) -> Result<()> {
    writeln!(writer, "{SCHEDULE_HEADER}")?;

    let quote_style =
        if options.quote_all { csv::QuoteStyle::Always } else { csv::QuoteStyle::Necessary };
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(quote_style)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for row in schedule_rows(registry) {
        csv_writer.serialize(&row).map_err(|e| WireKitError::Export(e.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// The schedule as a string.
///
/// # Errors
///
/// See [`write_schedule`].
pub fn schedule_csv(registry: &DeviceRegistry, options: ScheduleOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_schedule(registry, &mut buffer, options)?;
    String::from_utf8(buffer).map_err(|e| WireKitError::Export(e.to_string()))
}
