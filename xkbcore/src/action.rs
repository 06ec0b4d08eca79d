//! The action tagged union a symbol level can carry.
//!
//! Grounded on the `union xkb_action` variants in the original C sources'
//! `xkb-priv.h` (`xkb_mod_action`, `xkb_group_action`, `xkb_iso_action`,
//! `xkb_controls_action`, `xkb_redirect_key_action`, ...), reshaped from a
//! fixed-size tagged struct union into a Rust enum where each variant only
//! carries the fields it needs.

use crate::types::{Controls, GroupIndex, KeycodeName, Mods, RealModMask, VirtualModMask};

/// Whether a modifier/group action affects the base, latched, or locked
/// component, or some combination (an `xkb_action` flags bitfield in the
/// original sources, narrowed here to the only combinations the grammar
/// produces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionFlags {
    pub clear_locks: bool,
    pub latch_to_lock: bool,
    pub no_lock: bool,
    pub no_unlock: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    NoAction,
    /// Placeholder produced by a symbol level with no declared action
    /// (e.g. a plain letter key); distinct from `NoAction` so the compiler
    /// can tell "the grammar said NoAction" apart from "nothing was said".
    VoidAction,

    SetMods { mods: Mods, flags: ActionFlags },
    LatchMods { mods: Mods, flags: ActionFlags },
    LockMods { mods: Mods, flags: ActionFlags },

    SetGroup { group: GroupDelta, flags: ActionFlags },
    LatchGroup { group: GroupDelta, flags: ActionFlags },
    LockGroup { group: GroupDelta, flags: ActionFlags },

    MovePointer { x: i16, y: i16, accelerate: bool },
    PointerButton { button: u8, count: u8 },
    LockPointerButton { button: u8, flags: ActionFlags },
    SetPointerDefault { button_default: Option<u8>, affect_default: bool },

    SetControls { controls: Controls },
    LockControls { controls: Controls, flags: ActionFlags },

    TerminateServer,
    SwitchScreen { screen: i8, same_server: bool },

    RedirectKey {
        new_key: KeycodeName,
        mods_mask: RealModMask,
        mods: RealModMask,
        vmods_mask: VirtualModMask,
        vmods: VirtualModMask,
    },

    /// An opaque vendor-private action, carried as the raw 7-byte payload
    /// from `xkb_any_action.data` the original format reserves for it.
    Private { kind: u8, data: [u8; 7] },

    #[cfg(feature = "legacy-actions")]
    ISOLock {
        group: GroupDelta,
        affect_mods: RealModMask,
        mods: RealModMask,
        affect: IsoAffect,
        flags: ActionFlags,
    },
    #[cfg(feature = "legacy-actions")]
    DeviceButton { device: u8, button: u8, count: u8 },
    #[cfg(feature = "legacy-actions")]
    DeviceValuator { device: u8, valuator: u8, value: i16 },
    #[cfg(feature = "legacy-actions")]
    ActionMessage { report_press: bool, report_release: bool, message: [u8; 6] },
}

/// A group index change: `Absolute` sets the group outright, `Relative`
/// adds a signed delta and wraps modulo the number of declared groups
/// (spec.md §4.4.3's group-wrap formula).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDelta {
    Absolute(GroupIndex),
    Relative(i8),
}

#[cfg(feature = "legacy-actions")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoAffect {
    pub mods: bool,
    pub group: bool,
    pub controls: bool,
    pub pointer_button: bool,
}

/// Computes the canonical group-wrap result for a relative or absolute
/// group change: `((current + delta) mod n + n) mod n`, with `n == 0`
/// collapsing to group 0 (spec.md §4.4.3).
pub fn wrap_group(current: GroupIndex, delta: GroupDelta, num_groups: GroupIndex) -> GroupIndex {
    if num_groups == 0 {
        return 0;
    }
    let n = num_groups as i32;
    let target = match delta {
        GroupDelta::Absolute(g) => g as i32,
        GroupDelta::Relative(d) => current as i32 + d as i32,
    };
    (((target % n) + n) % n) as GroupIndex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_group_is_canonical_modulo() {
        assert_eq!(wrap_group(0, GroupDelta::Relative(-1), 4), 3);
        assert_eq!(wrap_group(3, GroupDelta::Relative(1), 4), 0);
        assert_eq!(wrap_group(0, GroupDelta::Absolute(7), 4), 3);
        assert_eq!(wrap_group(2, GroupDelta::Relative(1), 0), 0);
    }
}
