// PinLab - GPIO Controller Simulation Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::variant::Variant;
use crate::{SimResult, SimulationError};
use std::collections::HashMap;

/// The register kinds of one 14-register bank, plus the three debounce-time
/// registers shared by the whole window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegKind {
    DataValue,
    Direction,
    IntEnable,
    IntSens0,
    IntSens1,
    IntSens2,
    IntStatus,
    ResetTolerant,
    Debounce1,
    Debounce2,
    CmdSource0,
    CmdSource1,
    /// Read-only shadow of externally/software-asserted levels.
    DataRead,
    InputMask,
    DebounceTime1,
    DebounceTime2,
    DebounceTime3,
}

/// One decoded dispatch entry: which register of which set an offset hits.
/// Several offsets share the same kind, so the set index rides along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegEntry {
    pub kind: RegKind,
    pub set: usize,
}

/// The secondary (reduced-voltage) bank repeats the first per-set layouts at
/// this offset. It is specified as its own table, never derived from the
/// primary map by arithmetic.
pub const SECONDARY_BANK_BASE: u64 = 0x800;

use RegKind::*;

/// Per-set register offsets in the primary bank. The layout is irregular:
/// data-read registers for all sets are grouped at 0x0C0.., the input masks
/// for sets 0/1 sit at 0x1D0/0x1D4, and sets 6/7 keep their data-value and
/// direction registers up at 0x1E0..0x1EC.
const SET_LAYOUTS: [&[(u64, RegKind)]; 8] = [
    &[
        (0x000, DataValue),
        (0x004, Direction),
        (0x008, IntEnable),
        (0x00C, IntSens0),
        (0x010, IntSens1),
        (0x014, IntSens2),
        (0x018, IntStatus),
        (0x01C, ResetTolerant),
        (0x040, Debounce1),
        (0x044, Debounce2),
        (0x060, CmdSource0),
        (0x064, CmdSource1),
        (0x0C0, DataRead),
        (0x1D0, InputMask),
    ],
    &[
        (0x020, DataValue),
        (0x024, Direction),
        (0x028, IntEnable),
        (0x02C, IntSens0),
        (0x030, IntSens1),
        (0x034, IntSens2),
        (0x038, IntStatus),
        (0x03C, ResetTolerant),
        (0x048, Debounce1),
        (0x04C, Debounce2),
        (0x068, CmdSource0),
        (0x06C, CmdSource1),
        (0x0C4, DataRead),
        (0x1D4, InputMask),
    ],
    &[
        (0x070, DataValue),
        (0x074, Direction),
        (0x090, CmdSource0),
        (0x094, CmdSource1),
        (0x098, IntEnable),
        (0x09C, IntSens0),
        (0x0A0, IntSens1),
        (0x0A4, IntSens2),
        (0x0A8, IntStatus),
        (0x0AC, ResetTolerant),
        (0x0B0, Debounce1),
        (0x0B4, Debounce2),
        (0x0B8, InputMask),
        (0x0C8, DataRead),
    ],
    &[
        (0x078, DataValue),
        (0x07C, Direction),
        (0x0CC, DataRead),
        (0x0E0, CmdSource0),
        (0x0E4, CmdSource1),
        (0x0E8, IntEnable),
        (0x0EC, IntSens0),
        (0x0F0, IntSens1),
        (0x0F4, IntSens2),
        (0x0F8, IntStatus),
        (0x0FC, ResetTolerant),
        (0x100, Debounce1),
        (0x104, Debounce2),
        (0x108, InputMask),
    ],
    &[
        (0x080, DataValue),
        (0x084, Direction),
        (0x0D0, DataRead),
        (0x110, CmdSource0),
        (0x114, CmdSource1),
        (0x118, IntEnable),
        (0x11C, IntSens0),
        (0x120, IntSens1),
        (0x124, IntSens2),
        (0x128, IntStatus),
        (0x12C, ResetTolerant),
        (0x130, Debounce1),
        (0x134, Debounce2),
        (0x138, InputMask),
    ],
    &[
        (0x088, DataValue),
        (0x08C, Direction),
        (0x0D4, DataRead),
        (0x140, CmdSource0),
        (0x144, CmdSource1),
        (0x148, IntEnable),
        (0x14C, IntSens0),
        (0x150, IntSens1),
        (0x154, IntSens2),
        (0x158, IntStatus),
        (0x15C, ResetTolerant),
        (0x160, Debounce1),
        (0x164, Debounce2),
        (0x168, InputMask),
    ],
    &[
        (0x0D8, DataRead),
        (0x170, CmdSource0),
        (0x174, CmdSource1),
        (0x178, IntEnable),
        (0x17C, IntSens0),
        (0x180, IntSens1),
        (0x184, IntSens2),
        (0x188, IntStatus),
        (0x18C, ResetTolerant),
        (0x190, Debounce1),
        (0x194, Debounce2),
        (0x198, InputMask),
        (0x1E0, DataValue),
        (0x1E4, Direction),
    ],
    &[
        (0x0DC, DataRead),
        (0x1A0, CmdSource0),
        (0x1A4, CmdSource1),
        (0x1A8, IntEnable),
        (0x1AC, IntSens0),
        (0x1B0, IntSens1),
        (0x1B4, IntSens2),
        (0x1B8, IntStatus),
        (0x1BC, ResetTolerant),
        (0x1C0, Debounce1),
        (0x1C4, Debounce2),
        (0x1C8, InputMask),
        (0x1E8, DataValue),
        (0x1EC, Direction),
    ],
];

/// Debounce timers shared across all sets of a bank.
const SHARED_LAYOUT: &[(u64, RegKind)] = &[
    (0x050, DebounceTime1),
    (0x054, DebounceTime2),
    (0x058, DebounceTime3),
];

/// Build the offset -> register map for one variant. Runs once at
/// construction; duplicate offsets are a configuration error, not a runtime
/// fault.
pub fn build_dispatch(variant: &Variant) -> SimResult<HashMap<u64, RegEntry>> {
    let mut map = HashMap::new();

    let mut insert = |offset: u64, entry: RegEntry| -> SimResult<()> {
        if map.insert(offset, entry).is_some() {
            return Err(SimulationError::InvalidVariant {
                variant: variant.name,
                reason: format!("duplicate register at offset {:#x}", offset),
            });
        }
        Ok(())
    };

    for set in 0..variant.nr_sets {
        for &(offset, kind) in SET_LAYOUTS[set] {
            insert(offset, RegEntry { kind, set })?;
        }
    }
    for &(offset, kind) in SHARED_LAYOUT {
        insert(offset, RegEntry { kind, set: 0 })?;
    }

    for i in 0..variant.nr_secondary_sets {
        let set = variant.nr_sets + i;
        for &(offset, kind) in SET_LAYOUTS[i] {
            insert(offset + SECONDARY_BANK_BASE, RegEntry { kind, set })?;
        }
    }
    if variant.nr_secondary_sets > 0 {
        for &(offset, kind) in SHARED_LAYOUT {
            insert(offset + SECONDARY_BANK_BASE, RegEntry { kind, set: 0 })?;
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{AST2400, AST2500, AST2600};

    #[test]
    fn test_builds_for_all_variants() {
        for variant in [&AST2400, &AST2500, &AST2600] {
            let map = build_dispatch(variant).unwrap();
            assert!(!map.is_empty(), "{}", variant.name);
        }
    }

    #[test]
    fn test_primary_bank_decode() {
        let map = build_dispatch(&AST2500).unwrap();
        assert_eq!(map[&0x000], RegEntry { kind: DataValue, set: 0 });
        assert_eq!(map[&0x1D0], RegEntry { kind: InputMask, set: 0 });
        assert_eq!(map[&0x0C8], RegEntry { kind: DataRead, set: 2 });
        assert_eq!(map[&0x128], RegEntry { kind: IntStatus, set: 4 });
        assert_eq!(map[&0x1E4], RegEntry { kind: Direction, set: 6 });
        assert_eq!(map[&0x1EC], RegEntry { kind: Direction, set: 7 });
        assert_eq!(map[&0x054], RegEntry { kind: DebounceTime2, set: 0 });
    }

    #[test]
    fn test_set_count_limits_map() {
        // ast2400 has 7 sets: set 7 offsets must not decode.
        let map = build_dispatch(&AST2400).unwrap();
        assert!(!map.contains_key(&0x1E8));
        assert!(!map.contains_key(&0x0DC));
        assert!(map.contains_key(&0x1E0));
    }

    #[test]
    fn test_secondary_bank_decode() {
        let map = build_dispatch(&AST2600).unwrap();
        // 1.8V sets land past the primary sets.
        assert_eq!(map[&0x800], RegEntry { kind: DataValue, set: 7 });
        assert_eq!(map[&0x8C4], RegEntry { kind: DataRead, set: 8 });
        assert_eq!(map[&0x9D4], RegEntry { kind: InputMask, set: 8 });
        assert_eq!(map[&0x850], RegEntry { kind: DebounceTime1, set: 0 });

        // Variants without secondary sets leave the bank unmapped.
        let map = build_dispatch(&AST2500).unwrap();
        assert!(!map.contains_key(&0x800));
    }

    #[test]
    fn test_every_set_has_fourteen_registers() {
        let map = build_dispatch(&AST2600).unwrap();
        for set in 0..AST2600.total_sets() {
            let count = map.values().filter(|e| e.set == set && !matches!(e.kind, DebounceTime1 | DebounceTime2 | DebounceTime3)).count();
            assert_eq!(count, 14, "set {}", set);
        }
    }
}
