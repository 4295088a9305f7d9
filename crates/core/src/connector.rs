// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! The three physical connectors and their fixed 8-pin layout.
//!
//! Every connector has eight pins numbered 1–8. Pin colors are the same on
//! all three connectors, so color lookup only needs the pin number.

use crate::error::WireKitError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// A physical pin number, 1–8.
pub type PinNumber = u8;

/// Number of pins on every connector.
pub const PIN_COUNT: PinNumber = 8;

/// The connector's own supply rail (pin 1 supply, pin 2 ground).
pub const SOLAR_PINS: [PinNumber; 2] = [1, 2];

/// Pins that carry the shared sensor/actuator power bus.
pub const POWER_BUS_PINS: [PinNumber; 2] = [3, 4];

/// Iterates over every valid pin number in ascending order.
pub fn all_pins() -> impl Iterator<Item = PinNumber> {
    1..=PIN_COUNT
}

/// Returns true if `pin` is one of the shared power bus pins (3 or 4).
pub const fn is_power_bus_pin(pin: PinNumber) -> bool {
    pin == POWER_BUS_PINS[0] || pin == POWER_BUS_PINS[1]
}

/// One of the three physical connectors on the device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
    TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PlugType {
    Inputs,
    Communications,
    Outputs,
}

impl PlugType {
    /// All connectors, in the order they are presented to users.
    pub const ALL: [Self; 3] = [Self::Inputs, Self::Communications, Self::Outputs];

    /// Wire name used in design files (`inputs`, `communications`, `outputs`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inputs => "inputs",
            Self::Communications => "communications",
            Self::Outputs => "outputs",
        }
    }

    /// Short human label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inputs => "Inputs",
            Self::Communications => "Communications",
            Self::Outputs => "Outputs",
        }
    }

    /// Heading used in pin usage summaries.
    pub const fn plug_label(self) -> &'static str {
        match self {
            Self::Inputs => "Inputs Plug",
            Self::Communications => "Communications Plug",
            Self::Outputs => "Outputs Plug",
        }
    }
}

impl fmt::Display for PlugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlugType {
    type Err = WireKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inputs" | "input" | "in" => Ok(Self::Inputs),
            "communications" | "comms" | "coms" | "comm" => Ok(Self::Communications),
            "outputs" | "output" | "out" => Ok(Self::Outputs),
            other => Err(WireKitError::Configuration(format!(
                "unknown plug '{other}' (expected inputs, communications or outputs)"
            ))),
        }
    }
}

/// Wire color of a pin. Fixed per pin number across all connectors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
    TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PinColor {
    White,
    Brown,
    Green,
    Yellow,
    Grey,
    Pink,
    Blue,
    Red,
}

impl PinColor {
    /// Colors in pin order: index 0 is pin 1.
    pub const BY_PIN: [Self; PIN_COUNT as usize] = [
        Self::White,
        Self::Brown,
        Self::Green,
        Self::Yellow,
        Self::Grey,
        Self::Pink,
        Self::Blue,
        Self::Red,
    ];

    /// Color of `pin`, or `None` when the pin number is outside 1–8.
    pub const fn for_pin(pin: PinNumber) -> Option<Self> {
        if pin == 0 || pin > PIN_COUNT {
            return None;
        }
        Some(Self::BY_PIN[(pin - 1) as usize])
    }

    /// Lowercase wire name (`white`, `brown`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Brown => "brown",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Grey => "grey",
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    /// Capitalized display name (`White`, `Brown`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Brown => "Brown",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Grey => "Grey",
            Self::Pink => "Pink",
            Self::Blue => "Blue",
            Self::Red => "Red",
        }
    }

    /// Hex color used by renderers.
    pub const fn hex(self) -> &'static str {
        match self {
            Self::White => "#FFFFFF",
            Self::Brown => "#8B4513",
            Self::Green => "#00FF00",
            Self::Yellow => "#FFFF00",
            Self::Grey => "#808080",
            Self::Pink => "#FFC0CB",
            Self::Blue => "#0000FF",
            Self::Red => "#FF0000",
        }
    }
}

impl fmt::Display for PinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for a pin's color, `Unknown` for out-of-range pins.
pub fn color_name(pin: PinNumber) -> &'static str {
    PinColor::for_pin(pin).map_or("Unknown", PinColor::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_colors_follow_fixed_order() {
        let names: Vec<&str> = all_pins().map(color_name).collect();
        assert_eq!(names, ["White", "Brown", "Green", "Yellow", "Grey", "Pink", "Blue", "Red"]);
        assert_eq!(PinColor::for_pin(0), None);
        assert_eq!(PinColor::for_pin(9), None);
        assert_eq!(color_name(9), "Unknown");
    }

    #[test]
    fn plug_type_parses_aliases() {
        assert_eq!("inputs".parse::<PlugType>().ok(), Some(PlugType::Inputs));
        assert_eq!("Comms".parse::<PlugType>().ok(), Some(PlugType::Communications));
        assert_eq!(" out ".parse::<PlugType>().ok(), Some(PlugType::Outputs));
        assert!("aux".parse::<PlugType>().is_err());
    }

    #[test]
    fn plug_type_serializes_lowercase() {
        let json = serde_json::to_string(&PlugType::Communications).unwrap_or_default();
        assert_eq!(json, "\"communications\"");
    }

    #[test]
    fn power_bus_pins_are_three_and_four() {
        let bus: Vec<PinNumber> = all_pins().filter(|p| is_power_bus_pin(*p)).collect();
        assert_eq!(bus, vec![3, 4]);
    }
}
