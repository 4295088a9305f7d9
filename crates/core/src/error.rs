// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Structured error types for WireKit.
//!
//! The allocation, conflict, and registry operations never fail: partially
//! configured devices are valid intermediate states and degrade to empty
//! allocations instead. Errors only surface at the collaborator boundaries
//! (design import/export, wiring schedules, configuration files).

use thiserror::Error;

/// Main error type for WireKit operations.
#[derive(Debug, Error)]
pub enum WireKitError {
    /// Configuration or parameter validation error.
    ///
    /// Examples:
    /// - Unknown plug name on the command line
    /// - A YAML design referencing a device type the catalog does not offer
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A design file could not be imported.
    ///
    /// Examples:
    /// - The document is not a JSON array of device records
    /// - The document is not valid JSON at all
    #[error("Import error: {0}")]
    Import(String),

    /// An export artifact could not be produced.
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error (reading or writing design files and schedules).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results using `WireKitError`.
pub type Result<T> = std::result::Result<T, WireKitError>;

impl From<WireKitError> for String {
    fn from(err: WireKitError) -> Self {
        err.to_string()
    }
}

// Generic string errors are configuration problems in practice (bad CLI input, bad YAML).
impl From<String> for WireKitError {
    fn from(s: String) -> Self {
        Self::Configuration(s)
    }
}

impl From<&str> for WireKitError {
    fn from(s: &str) -> Self {
        Self::Configuration(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WireKitError::Import("Expected an array of devices.".to_string());
        assert_eq!(err.to_string(), "Import error: Expected an array of devices.");

        let err = WireKitError::Configuration("unknown plug 'aux'".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown plug 'aux'");
    }

    #[test]
    fn test_string_to_error_conversion() {
        let err: WireKitError = "Something went wrong".into();
        assert_eq!(err.to_string(), "Configuration error: Something went wrong");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: WireKitError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(err.to_string().contains("File not found"));
    }
}
