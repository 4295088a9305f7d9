// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use clap::ValueEnum;
use std::path::Path;
use wirekit_api::design::export_design;
use wirekit_api::diagram;
use wirekit_api::schedule::{schedule_csv, ScheduleOptions};
use wirekit_core::DeviceRegistry;

use crate::config::ExportConfig;

/// Artifacts `wkit export` and the shell can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Flat device list (importable)
    Json,
    /// Wiring schedule
    Csv,
    /// Diagram nodes and edges
    Diagram,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "diagram" => Some(Self::Diagram),
            _ => None,
        }
    }
}

/// Renders `format` for the current registry contents.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(
    registry: &DeviceRegistry,
    format: ExportFormat,
    options: &ExportConfig,
) -> anyhow::Result<String> {
    let text = match format {
        ExportFormat::Json => export_design(registry, options.pretty_json)?,
        ExportFormat::Csv => {
            schedule_csv(registry, ScheduleOptions { quote_all: options.csv_quote_all })?
        },
        ExportFormat::Diagram => {
            let diagram = diagram::project(registry);
            if options.pretty_json {
                serde_json::to_string_pretty(&diagram)?
            } else {
                serde_json::to_string(&diagram)?
            }
        },
    };
    Ok(text)
}

/// Renders `format` and writes it to `path`.
///
/// # Errors
///
/// Returns an error if rendering or the write fails.
pub fn write(
    registry: &DeviceRegistry,
    format: ExportFormat,
    options: &ExportConfig,
    path: &Path,
) -> anyhow::Result<()> {
    let text = render(registry, format, options)?;
    std::fs::write(path, text)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        format = ?format,
        devices = registry.len(),
        "Exported design"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirekit_core::PlugType;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn diagram_export_is_json() {
        let mut registry = DeviceRegistry::new();
        registry.add_device_of_type(PlugType::Communications, "sdi12");
        let options = ExportConfig { pretty_json: false, ..ExportConfig::default() };
        let text = render(&registry, ExportFormat::Diagram, &options).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["edges"][0]["id"], "e-device-1-data");
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("png"), None);
    }
}
