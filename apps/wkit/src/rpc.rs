// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! JSON-lines request loop: one request envelope per input line, one response
//! envelope per output line.

use std::io::{BufRead, Write};
use tracing::{debug, warn};
use wirekit_api::{handle_request, Message, Request, ResponsePayload};
use wirekit_core::DeviceRegistry;

/// Handles one line. Blank lines produce no response.
pub fn handle_line(registry: &mut DeviceRegistry, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            debug!(correlation_id = ?request.correlation_id, "Handling request");
            Message::response(request.correlation_id, handle_request(registry, request.payload))
        },
        Err(e) => {
            warn!(error = %e, "Malformed request");
            Message::response(None, ResponsePayload::error(format!("Invalid request: {e}")))
        },
    };

    match serde_json::to_string(&response) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize response");
            Some(
                concat!(
                    r#"{"type":"response","payload":"#,
                    r#"{"action":"error","message":"Failed to serialize response"}}"#
                )
                .to_string(),
            )
        },
    }
}

/// Serves requests until `reader` reaches end of input. Returns the number of
/// responses written.
///
/// # Errors
///
/// Returns an error if reading a line or writing a response fails.
pub fn serve<R: BufRead, W: Write>(
    registry: &mut DeviceRegistry,
    reader: R,
    mut writer: W,
) -> std::io::Result<usize> {
    let mut count = 0;
    for line in reader.lines() {
        let line = line?;
        if let Some(response) = handle_line(registry, &line) {
            writeln!(writer, "{response}")?;
            writer.flush()?;
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn serves_one_response_per_request_line() {
        let input = concat!(
            r#"{"type":"request","correlation_id":"a","payload":"#,
            r#"{"action":"adddevice","plugType":"inputs","type":"0-10v"}}"#,
            "\n\n",
            r#"{"type":"request","correlation_id":"b","payload":{"action":"listconflicts"}}"#,
            "\n",
            "not json\n",
        );
        let mut registry = DeviceRegistry::new();
        let mut output = Vec::new();
        let count = serve(&mut registry, input.as_bytes(), &mut output).unwrap();
        assert_eq!(count, 3);

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["correlation_id"], "a");
        assert_eq!(lines[0]["payload"]["action"], "deviceadded");
        assert_eq!(lines[1]["payload"]["action"], "conflictslisted");
        assert_eq!(lines[2]["payload"]["action"], "error");
        assert!(lines[2].get("correlation_id").is_none());
        assert_eq!(registry.len(), 1);
    }
}
