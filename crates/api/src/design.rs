// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Design file import and export.
//!
//! A design is persisted as a JSON array of flat device records. YAML designs
//! ([`crate::yaml`]) are an authoring format only; saving always writes JSON.

use std::fs;
use std::path::Path;
use wirekit_core::{DeviceRecord, DeviceRegistry, Result, WireKitError};

/// Shown when a document parses but is not a list of devices.
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid file format: Expected an array of devices.";

/// Prefix of the message shown when a document cannot be parsed.
pub const PARSE_ERROR_MESSAGE: &str = "Error parsing JSON file";

/// On-disk design formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignFormat {
    Json,
    Yaml,
}

impl DesignFormat {
    /// `.yaml`/`.yml` are YAML; everything else is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Validates an already-parsed document and converts it to device records.
///
/// # Errors
///
/// Returns [`WireKitError::Import`] if the document is not an array or an
/// element is not a device record.
pub fn records_from_value(value: serde_json::Value) -> Result<Vec<DeviceRecord>> {
    let serde_json::Value::Array(items) = value else {
        return Err(WireKitError::Import(INVALID_FORMAT_MESSAGE.to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item).map_err(|e| {
                WireKitError::Import(format!("{PARSE_ERROR_MESSAGE}: device #{}: {e}", idx + 1))
            })
        })
        .collect()
}

/// Parses a JSON design document.
///
/// # Errors
///
/// Returns [`WireKitError::Import`] if the text is not JSON, or not an array
/// of device records.
pub fn parse_design(text: &str) -> Result<Vec<DeviceRecord>> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| WireKitError::Import(format!("{PARSE_ERROR_MESSAGE}: {e}")))?;
    records_from_value(value)
}

/// Serializes the registry as a JSON design document.
///
/// # Errors
///
/// Returns [`WireKitError::Serialization`] if serialization fails.
pub fn export_design(registry: &DeviceRegistry, pretty: bool) -> Result<String> {
    let records = registry.to_records();
    let json = if pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    Ok(json)
}

/// Replaces the registry contents with the devices in a JSON design document.
///
/// The registry is left untouched when the document is rejected.
///
/// # Errors
///
/// See [`parse_design`].
pub fn import_design(registry: &mut DeviceRegistry, text: &str) -> Result<usize> {
    let records = parse_design(text)?;
    let count = records.len();
    registry.load_records(records);
    Ok(count)
}

/// Loads a JSON or YAML design file into `registry`, replacing its contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its contents are rejected.
pub fn load_design_file(registry: &mut DeviceRegistry, path: &Path) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    let count = match DesignFormat::from_path(path) {
        DesignFormat::Json => import_design(registry, &text)?,
        DesignFormat::Yaml => {
            let design = crate::yaml::parse(&text)?;
            let mut staged = registry.clone();
            staged.clear();
            crate::yaml::compile(design, &mut staged)?;
            *registry = staged;
            registry.len()
        },
    };
    tracing::info!(path = %path.display(), devices = count, "Loaded design");
    Ok(count)
}

/// Writes the registry to `path` as a JSON design document.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_design_file(registry: &DeviceRegistry, path: &Path, pretty: bool) -> Result<()> {
    let json = export_design(registry, pretty)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), devices = registry.len(), "Saved design");
    Ok(())
}
