// PinLab - GPIO Controller Simulation Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{SimResult, SimulationError};
use std::str::FromStr;

/// Capabilities of one register set (a bank of up to 32 pins).
///
/// `input`/`output` mark which bits exist and can be configured in each
/// direction. `groups` holds the four 8-pin group labels used to build pin
/// property names; narrower sets leave trailing labels empty.
#[derive(Debug, Clone, Copy)]
pub struct SetCapabilities {
    pub input: u32,
    pub output: u32,
    pub groups: [&'static str; 4],
}

impl SetCapabilities {
    /// Union of both capability masks: the bits a bus write may touch at all.
    pub fn writable(&self) -> u32 {
        self.input | self.output
    }
}

/// Immutable descriptor for one hardware revision of the controller.
///
/// Constructed once, shared by every instance of that revision. `gap` marks a
/// 4-pin numbering discontinuity some revisions use to keep set boundaries
/// aligned to 32 despite a physically narrower group.
#[derive(Debug)]
pub struct Variant {
    pub name: &'static str,
    pub nr_pins: u32,
    pub nr_sets: usize,
    /// Reduced-voltage (1.8V) sets reached through the secondary address bank.
    pub nr_secondary_sets: usize,
    pub gap: Option<u32>,
    pub sets: &'static [SetCapabilities],
}

impl Variant {
    pub fn total_sets(&self) -> usize {
        self.nr_sets + self.nr_secondary_sets
    }

    /// Construction-time consistency check: every set index the dispatch
    /// tables will reference must have a capability entry.
    pub fn validate(&self) -> SimResult<()> {
        if self.sets.len() != self.total_sets() {
            return Err(SimulationError::InvalidVariant {
                variant: self.name,
                reason: format!(
                    "{} capability entries for {} register sets",
                    self.sets.len(),
                    self.total_sets()
                ),
            });
        }
        if let Some(gap) = self.gap {
            if gap >= self.nr_pins {
                return Err(SimulationError::InvalidVariant {
                    variant: self.name,
                    reason: format!("gap {} beyond pin count {}", gap, self.nr_pins),
                });
            }
        }
        Ok(())
    }

    fn adjust_pin(&self, pin: u32) -> u32 {
        match self.gap {
            Some(gap) if pin >= gap => pin + 4,
            _ => pin,
        }
    }

    /// Map a linear pin index to `(set_index, bit_index)`.
    ///
    /// Single source of truth for both the external pin-level interface and
    /// property-name generation, so a pin resolves identically on every path.
    pub fn pin_to_set_bit(&self, pin: u32) -> (usize, u32) {
        let adjusted = self.adjust_pin(pin);
        ((adjusted >> 5) as usize, adjusted & 31)
    }

    /// Inverse of [`pin_to_set_bit`](Self::pin_to_set_bit). Bits inside the
    /// 4-wide numbering hole, and bits past the pin count, have no pin.
    pub fn pin_from_set_bit(&self, set: usize, bit: u32) -> Option<u32> {
        let linear = (set as u32) * 32 + bit;
        let pin = match self.gap {
            Some(gap) if linear >= gap + 4 => linear - 4,
            Some(gap) if linear >= gap => return None,
            _ => linear,
        };
        (pin < self.nr_pins).then_some(pin)
    }

    /// Property name for a pin: `gpio<GroupLabel><IndexWithinGroup>`.
    /// Returns `None` for pins in a group with no label.
    pub fn pin_name(&self, pin: u32) -> Option<String> {
        if pin >= self.nr_pins {
            return None;
        }
        let (set, bit) = self.pin_to_set_bit(pin);
        let label = self.sets.get(set)?.groups[(bit >> 3) as usize];
        if label.is_empty() {
            return None;
        }
        Some(format!("gpio{}{}", label, bit & 7))
    }
}

pub static AST2400: Variant = Variant {
    name: "ast2400",
    nr_pins: 216,
    nr_sets: 7,
    nr_secondary_sets: 0,
    gap: Some(196),
    sets: &[
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["A", "B", "C", "D"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["E", "F", "G", "H"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["I", "J", "K", "L"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["M", "N", "O", "P"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["Q", "R", "S", "T"] },
        SetCapabilities { input: 0xffff_ffff, output: 0x0000_ffff, groups: ["U", "V", "W", "X"] },
        SetCapabilities { input: 0x0000_000f, output: 0x0fff_ff0f, groups: ["Y", "Z", "AA", "AB"] },
    ],
};

pub static AST2500: Variant = Variant {
    name: "ast2500",
    nr_pins: 228,
    nr_sets: 8,
    nr_secondary_sets: 0,
    gap: Some(220),
    sets: &[
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["A", "B", "C", "D"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["E", "F", "G", "H"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["I", "J", "K", "L"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["M", "N", "O", "P"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["Q", "R", "S", "T"] },
        SetCapabilities { input: 0xffff_ffff, output: 0x0000_ffff, groups: ["U", "V", "W", "X"] },
        SetCapabilities { input: 0xffff_ff0f, output: 0x0fff_ff0f, groups: ["Y", "Z", "AA", "AB"] },
        SetCapabilities { input: 0x0000_00ff, output: 0x0000_00ff, groups: ["AC", "", "", ""] },
    ],
};

pub static AST2600: Variant = Variant {
    name: "ast2600",
    nr_pins: 208,
    nr_sets: 7,
    nr_secondary_sets: 2,
    gap: None,
    sets: &[
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["A", "B", "C", "D"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["E", "F", "G", "H"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["I", "J", "K", "L"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["M", "N", "O", "P"] },
        SetCapabilities { input: 0xffff_ffff, output: 0xffff_ffff, groups: ["Q", "R", "S", "T"] },
        SetCapabilities { input: 0xffff_ffff, output: 0x0000_ffff, groups: ["U", "V", "W", "X"] },
        SetCapabilities { input: 0xffff_0000, output: 0x0fff_0000, groups: ["Y", "Z", "", ""] },
        // 1.8V sets, secondary address bank
        SetCapabilities { input: 0x0000_00ff, output: 0x0000_00ff, groups: ["A", "B", "C", "D"] },
        SetCapabilities { input: 0x0000_00ff, output: 0x0000_00ff, groups: ["E", "", "", ""] },
    ],
};

/// Controller revision, selected at construction time from a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipModel {
    Ast2400,
    Ast2500,
    Ast2600,
}

impl ChipModel {
    pub fn descriptor(self) -> &'static Variant {
        match self {
            ChipModel::Ast2400 => &AST2400,
            ChipModel::Ast2500 => &AST2500,
            ChipModel::Ast2600 => &AST2600,
        }
    }
}

impl FromStr for ChipModel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ast2400" | "2400" => Ok(Self::Ast2400),
            "ast2500" | "2500" => Ok(Self::Ast2500),
            "ast2600" | "2600" => Ok(Self::Ast2600),
            _ => Err(format!(
                "unsupported GPIO controller model '{}'; supported: ast2400, ast2500, ast2600",
                value
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_are_consistent() {
        for model in [ChipModel::Ast2400, ChipModel::Ast2500, ChipModel::Ast2600] {
            model.descriptor().validate().unwrap();
        }
    }

    #[test]
    fn test_gap_mapping_ast2400() {
        // Gap at 196: pins at or past it shift up by four before mapping.
        assert_eq!(AST2400.pin_to_set_bit(196), (6, 8));
        assert_eq!(AST2400.pin_to_set_bit(195), (6, 3));
        assert_eq!(AST2400.pin_to_set_bit(0), (0, 0));
        assert_eq!(AST2400.pin_to_set_bit(33), (1, 1));
    }

    #[test]
    fn test_inverse_mapping_round_trips() {
        for variant in [&AST2400, &AST2500, &AST2600] {
            for pin in 0..variant.nr_pins {
                let (set, bit) = variant.pin_to_set_bit(pin);
                assert_eq!(variant.pin_from_set_bit(set, bit), Some(pin));
            }
        }
    }

    #[test]
    fn test_bits_inside_gap_have_no_pin() {
        // ast2400 gap covers adjusted indices 196..200 (set 6, bits 4..8).
        for bit in 4..8 {
            assert_eq!(AST2400.pin_from_set_bit(6, bit), None);
        }
        assert_eq!(AST2400.pin_from_set_bit(6, 8), Some(196));
    }

    #[test]
    fn test_pin_names() {
        assert_eq!(AST2400.pin_name(0).as_deref(), Some("gpioA0"));
        assert_eq!(AST2400.pin_name(10).as_deref(), Some("gpioB2"));
        assert_eq!(AST2400.pin_name(34).as_deref(), Some("gpioE2"));
        // Pin 195 is set 6, bit 3 -> group Y.
        assert_eq!(AST2400.pin_name(195).as_deref(), Some("gpioY3"));
        // Pin 196 jumps the gap to bit 8 -> group Z.
        assert_eq!(AST2400.pin_name(196).as_deref(), Some("gpioZ0"));
        assert_eq!(AST2500.pin_name(224).as_deref(), Some("gpioAC4"));
        assert_eq!(AST2400.pin_name(999), None);
    }

    #[test]
    fn test_chip_model_from_str() {
        assert_eq!("ast2500".parse::<ChipModel>().unwrap(), ChipModel::Ast2500);
        assert_eq!(" AST2600 ".parse::<ChipModel>().unwrap(), ChipModel::Ast2600);
        assert!("ast9999".parse::<ChipModel>().is_err());
    }
}
