// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Pin allocation rules.
//!
//! [`allocate`] maps a device kind onto the physical pins it occupies on its
//! connector. The result is split three ways:
//!
//! - `signal_pins`: exclusive per connector; two non-bus devices on the same
//!   signal pin are a conflict.
//! - `power_pins`: the shared sensor/actuator power bus (pins 3 and 4). Sharing
//!   is expected and only ever reported as an advisory.
//! - `solar_pins`: the connector's own supply rail (pins 1 and 2).
//!
//! Allocation is pure and never fails. A kind the rules cannot place (unknown
//! type, missing or out-of-range selector) allocates to an empty [`PinUsage`].

use crate::connector::{PinNumber, SOLAR_PINS};
use crate::device::{
    CommunicationsDevice, Device, DeviceKind, InputsDevice, OutputsDevice, SelectorValue,
    WireMode,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use ts_rs::TS;

/// Ordered pins with room for the common case inline.
pub type PinSet = SmallVec<[PinNumber; 4]>;

/// Pins a single device occupies on its connector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PinUsage {
    #[ts(type = "Array<number>")]
    #[schemars(with = "Vec<PinNumber>")]
    pub signal_pins: PinSet,
    #[ts(type = "Array<number>")]
    #[schemars(with = "Vec<PinNumber>")]
    pub power_pins: PinSet,
    #[ts(type = "Array<number>")]
    #[schemars(with = "Vec<PinNumber>")]
    pub solar_pins: PinSet,
}

impl PinUsage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.signal_pins.is_empty() && self.power_pins.is_empty() && self.solar_pins.is_empty()
    }

    /// Union of all three sets, ascending and deduplicated.
    pub fn all(&self) -> Vec<PinNumber> {
        let mut pins: Vec<PinNumber> = self
            .signal_pins
            .iter()
            .chain(&self.power_pins)
            .chain(&self.solar_pins)
            .copied()
            .collect();
        pins.sort_unstable();
        pins.dedup();
        pins
    }

    /// Signal followed by power pins, in allocation order. Solar pins excluded.
    pub fn wired_pins(&self) -> impl Iterator<Item = PinNumber> + '_ {
        self.signal_pins.iter().chain(&self.power_pins).copied()
    }

    pub fn contains(&self, pin: PinNumber) -> bool {
        self.signal_pins.contains(&pin)
            || self.power_pins.contains(&pin)
            || self.solar_pins.contains(&pin)
    }

    fn placed(signal: &[PinNumber], power: &[PinNumber]) -> Self {
        Self {
            signal_pins: PinSet::from_slice(signal),
            power_pins: PinSet::from_slice(power),
            solar_pins: PinSet::from_slice(&SOLAR_PINS),
        }
    }

    fn supply_only() -> Self {
        Self::placed(&[], &[])
    }
}

/// Inputs-plug analog channels run backwards: channel 1 is pin 8.
pub const fn analog_channel_pin(channel: SelectorValue) -> Option<PinNumber> {
    match channel {
        1 => Some(8),
        2 => Some(7),
        3 => Some(6),
        4 => Some(5),
        _ => None,
    }
}

/// Outputs-plug switched outputs: output 1 is pin 5.
pub const fn output_pin(output: SelectorValue) -> Option<PinNumber> {
    match output {
        1 => Some(5),
        2 => Some(6),
        3 => Some(7),
        4 => Some(8),
        _ => None,
    }
}

/// Latching relays take an output pair; only outputs 1 and 3 are valid.
pub const fn latching_pins(output: SelectorValue) -> Option<[PinNumber; 2]> {
    match output {
        1 => Some([5, 6]),
        3 => Some([7, 8]),
        _ => None,
    }
}

/// Pulse counter digital input: input 1 is pin 6, input 2 is pin 5.
pub const fn pulse_input_pin(input: SelectorValue) -> Option<PinNumber> {
    match input {
        1 => Some(6),
        2 => Some(5),
        _ => None,
    }
}

/// Computes the pins a device kind occupies.
pub fn allocate(kind: &DeviceKind) -> PinUsage {
    match kind {
        DeviceKind::Inputs(InputsDevice::Analog { channel, wire_mode, .. }) => {
            let Some(signal) = channel.and_then(analog_channel_pin) else {
                return PinUsage::empty();
            };
            let power: &[PinNumber] = match wire_mode {
                WireMode::ThreeWire => &[3, 4],
                WireMode::TwoWire => &[3],
            };
            PinUsage::placed(&[signal], power)
        },
        DeviceKind::Inputs(InputsDevice::PowerInput { .. })
        | DeviceKind::Communications(CommunicationsDevice::PowerInput { .. })
        | DeviceKind::Outputs(OutputsDevice::PowerInput { .. }) => PinUsage::supply_only(),

        DeviceKind::Communications(CommunicationsDevice::Rs485) => PinUsage::placed(&[3, 4], &[]),
        DeviceKind::Communications(CommunicationsDevice::Wiegand) => {
            // D0 on pin 6, D1 on pin 5.
            PinUsage::placed(&[6, 5], &[])
        },
        DeviceKind::Communications(CommunicationsDevice::Sdi12) => PinUsage::placed(&[7, 8], &[]),
        DeviceKind::Communications(CommunicationsDevice::Pulse { input }) => {
            match pulse_input_pin(input.unwrap_or(1)) {
                Some(signal) => PinUsage::placed(&[signal], &[3, 4]),
                None => PinUsage::empty(),
            }
        },

        DeviceKind::Outputs(OutputsDevice::Switched { output, .. }) => {
            match output.and_then(output_pin) {
                Some(signal) => PinUsage::placed(&[signal], &[4]),
                None => PinUsage::empty(),
            }
        },
        DeviceKind::Outputs(OutputsDevice::Latching { output }) => {
            match output.and_then(latching_pins) {
                Some(pair) => PinUsage::placed(&pair, &[4]),
                None => PinUsage::empty(),
            }
        },

        DeviceKind::Unrecognized(_) => PinUsage::empty(),
    }
}

/// Convenience wrapper over [`allocate`] for a whole device.
pub fn allocate_device(device: &Device) -> PinUsage {
    let usage = allocate(&device.kind);
    if usage.is_empty() {
        tracing::debug!(
            device_id = %device.id,
            plug = %device.plug_type(),
            device_type = %device.type_name(),
            "Device is not fully configured; no pins allocated"
        );
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::PlugType;

    fn kind(
        plug: PlugType,
        ty: &str,
        channel: Option<u8>,
        output: Option<u8>,
        input: Option<u8>,
        wire_mode: Option<WireMode>,
    ) -> DeviceKind {
        DeviceKind::from_parts(plug, ty, channel, output, input, wire_mode)
    }

    #[test]
    fn analog_three_wire_claims_power_and_ground() {
        let usage = allocate(&kind(PlugType::Inputs, "0-10v", Some(1), None, None, None));
        assert_eq!(usage.signal_pins.as_slice(), &[8]);
        assert_eq!(usage.power_pins.as_slice(), &[3, 4]);
        assert_eq!(usage.solar_pins.as_slice(), &[1, 2]);
        assert_eq!(usage.all(), vec![1, 2, 3, 4, 8]);
    }

    #[test]
    fn analog_two_wire_drops_ground() {
        let usage = allocate(&kind(
            PlugType::Inputs,
            "4-20ma",
            Some(3),
            None,
            None,
            Some(WireMode::TwoWire),
        ));
        assert_eq!(usage.signal_pins.as_slice(), &[6]);
        assert_eq!(usage.power_pins.as_slice(), &[3]);
    }

    #[test]
    fn analog_without_channel_is_empty() {
        assert!(allocate(&kind(PlugType::Inputs, "voltage-sensing", None, None, None, None))
            .is_empty());
        assert!(allocate(&kind(PlugType::Inputs, "0-10v", Some(5), None, None, None)).is_empty());
    }

    #[test]
    fn power_input_uses_only_supply_pins() {
        for plug in PlugType::ALL {
            let usage = allocate(&kind(plug, "power-input", Some(1), None, None, None));
            assert!(usage.signal_pins.is_empty());
            assert!(usage.power_pins.is_empty());
            assert_eq!(usage.all(), vec![1, 2]);
        }
    }

    #[test]
    fn communications_fixed_pins() {
        let rs485 = allocate(&kind(PlugType::Communications, "rs485", None, None, None, None));
        assert_eq!(rs485.signal_pins.as_slice(), &[3, 4]);
        assert!(rs485.power_pins.is_empty());

        let wiegand = allocate(&kind(PlugType::Communications, "wiegand", None, None, None, None));
        assert_eq!(wiegand.signal_pins.as_slice(), &[6, 5]);

        let sdi12 = allocate(&kind(PlugType::Communications, "sdi12", None, None, None, None));
        assert_eq!(sdi12.signal_pins.as_slice(), &[7, 8]);
    }

    #[test]
    fn pulse_defaults_to_input_one() {
        let default = allocate(&kind(PlugType::Communications, "pulse", None, None, None, None));
        assert_eq!(default.signal_pins.as_slice(), &[6]);
        assert_eq!(default.power_pins.as_slice(), &[3, 4]);

        let second = allocate(&kind(PlugType::Communications, "pulse", None, None, Some(2), None));
        assert_eq!(second.signal_pins.as_slice(), &[5]);

        let bogus = allocate(&kind(PlugType::Communications, "pulse", None, None, Some(3), None));
        assert!(bogus.is_empty());
    }

    #[test]
    fn switched_outputs_share_ground() {
        for (output, pin) in [(1, 5), (2, 6), (3, 7), (4, 8)] {
            let usage =
                allocate(&kind(PlugType::Outputs, "transistor", None, Some(output), None, None));
            assert_eq!(usage.signal_pins.as_slice(), &[pin]);
            assert_eq!(usage.power_pins.as_slice(), &[4]);
        }
    }

    #[test]
    fn latching_only_accepts_odd_outputs() {
        let one = allocate(&kind(PlugType::Outputs, "latching", None, Some(1), None, None));
        assert_eq!(one.signal_pins.as_slice(), &[5, 6]);
        let three = allocate(&kind(PlugType::Outputs, "latching", None, Some(3), None, None));
        assert_eq!(three.signal_pins.as_slice(), &[7, 8]);
        for bad in [2, 4, 0] {
            let usage = allocate(&kind(PlugType::Outputs, "latching", None, Some(bad), None, None));
            assert!(usage.signal_pins.is_empty(), "output {bad}");
        }
    }

    #[test]
    fn unrecognized_type_is_empty() {
        let usage = allocate(&kind(PlugType::Outputs, "servo", None, Some(1), None, None));
        assert!(usage.is_empty());
    }

    #[test]
    fn wired_pins_skip_solar() {
        let usage = allocate(&kind(PlugType::Outputs, "relay", None, Some(2), None, None));
        assert_eq!(usage.wired_pins().collect::<Vec<_>>(), vec![6, 4]);
        assert!(usage.contains(1));
    }
}
