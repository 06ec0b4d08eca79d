//! The data-model primitives and entities shared by every compiler stage
//! and by the runtime state machine.

use bitflags::bitflags;
use std::collections::BTreeMap;
use std::fmt;

/// A hardware keycode. XKB keycodes conventionally start at 8; this crate
/// does not enforce that, it just carries whatever the keymap source uses.
pub type Keycode = u32;

/// A keysym value, in the same numeric space `xkbcore_keysyms` operates on.
pub type Keysym = u32;

/// The symbolic name bound to a keycode in an `xkb_keycodes` section, e.g.
/// `<AC01>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeycodeName(pub String);

impl fmt::Display for KeycodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for KeycodeName {
    fn from(s: &str) -> Self {
        KeycodeName(s.to_string())
    }
}

/// A key group (layout) index.
pub type GroupIndex = u8;
/// Upper bound on simultaneous groups a keymap may declare (spec.md §3.1:
/// `MAX_GROUPS >= 32`). Format v1 keymaps conventionally stay within 4;
/// v2 keymaps may use the full range, see [`crate::compiler::config::KeymapFormat`].
pub const MAX_GROUPS: GroupIndex = 32;
/// The historical v1-format group count ceiling.
pub const V1_MAX_GROUPS: GroupIndex = 4;

/// A shift level within a key type, 0-based.
pub type LevelIndex = u8;

/// Position of a modifier (real or virtual) within a 32-bit mask.
pub type ModIndex = u8;

bitflags! {
    /// The eight canonical real modifiers XKB recognizes. Every virtual
    /// modifier ultimately resolves to some combination of these.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RealModMask: u32 {
        const SHIFT   = 1 << 0;
        const LOCK    = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1    = 1 << 3;
        const MOD2    = 1 << 4;
        const MOD3    = 1 << 5;
        const MOD4    = 1 << 6;
        const MOD5    = 1 << 7;
    }
}

impl RealModMask {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Shift" => Self::SHIFT,
            "Lock" => Self::LOCK,
            "Control" => Self::CONTROL,
            "Mod1" => Self::MOD1,
            "Mod2" => Self::MOD2,
            "Mod3" => Self::MOD3,
            "Mod4" => Self::MOD4,
            "Mod5" => Self::MOD5,
            _ => return None,
        })
    }
}

/// A user-declared virtual modifier bitset (up to 32 per keymap, named
/// freely in an `xkb_types`/`xkb_symbols` section — unlike the real
/// modifiers these have no fixed meaning, so this is a plain bitset rather
/// than a `bitflags!` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VirtualModMask(pub u32);

impl VirtualModMask {
    pub const EMPTY: VirtualModMask = VirtualModMask(0);

    pub fn bit(index: ModIndex) -> Self {
        VirtualModMask(1 << index)
    }

    pub fn contains(self, other: VirtualModMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for VirtualModMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        VirtualModMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for VirtualModMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for VirtualModMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        VirtualModMask(self.0 & rhs.0)
    }
}

/// A resolved modifier combination: the real-modifier mask a consumer acts
/// on (`mask`), split into the part that came from real modifier names
/// directly (`real_mods`) and the part that was still an unresolved virtual
/// modifier reference at parse time (`vmods`). Mirrors `xkb_mods` in the
/// original C sources; after compiler pass 5 (finalize) `vmods` is always
/// folded into `mask` and is kept only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mods {
    pub mask: RealModMask,
    pub real_mods: RealModMask,
    pub vmods: VirtualModMask,
}

impl Mods {
    pub fn real(mask: RealModMask) -> Self {
        Mods { mask, real_mods: mask, vmods: VirtualModMask::EMPTY }
    }
}

bitflags! {
    /// The fixed set of XKB accessibility/behavior controls (spec.md §3.5).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Controls: u32 {
        const REPEAT_KEYS        = 1 << 0;
        const SLOW_KEYS          = 1 << 1;
        const BOUNCE_KEYS        = 1 << 2;
        const STICKY_KEYS        = 1 << 3;
        const MOUSE_KEYS         = 1 << 4;
        const MOUSE_KEYS_ACCEL   = 1 << 5;
        const ACCESS_X_KEYS      = 1 << 6;
        const ACCESS_X_TIMEOUT   = 1 << 7;
        const ACCESS_X_FEEDBACK  = 1 << 8;
        const AUDIBLE_BELL       = 1 << 9;
        const OVERLAY1           = 1 << 10;
        const OVERLAY2           = 1 << 11;
        const GROUPS_WRAP        = 1 << 12;
        const INTERNAL_MODS      = 1 << 13;
        const IGNORE_GROUP_LOCK  = 1 << 14;
        const PER_KEY_REPEAT     = 1 << 15;
    }
}

/// A named indicator (LED) bitset. Like virtual modifiers, indicator names
/// are declared per-keymap, so this is a plain bitset rather than a
/// `bitflags!` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedMask(pub u32);

impl LedMask {
    pub const EMPTY: LedMask = LedMask(0);

    pub fn bit(index: ModIndex) -> Self {
        LedMask(1 << index)
    }

    pub fn contains(self, other: LedMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for LedMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        LedMask(self.0 | rhs.0)
    }
}

impl std::ops::Sub for LedMask {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        LedMask(self.0 & !rhs.0)
    }
}

/// What wins when the same level is active through more than one modifier
/// combination, and what a key type's entry for a given modifier
/// combination resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTypeMapEntry {
    pub mods: Mods,
    pub level: LevelIndex,
    /// Modifiers preserved (not consumed) when this entry is active, e.g.
    /// the ALPHABETIC type preserving Lock.
    pub preserve: RealModMask,
}

/// A compiled key type: the number of shift levels a key can have and how
/// an active modifier combination selects one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyType {
    pub name: String,
    pub mods: Mods,
    pub num_levels: LevelIndex,
    pub map: Vec<KeyTypeMapEntry>,
    pub level_names: Vec<Option<String>>,
}

impl KeyType {
    /// Resolves the active level for `active_mods`, applying `mask` first.
    /// Falls back to level 0 if no map entry matches, matching the
    /// original library's "unmapped combination selects level one"
    /// behavior.
    pub fn level_for_mods(&self, active_mods: RealModMask) -> LevelIndex {
        let masked = active_mods & self.mods.mask;
        self.map
            .iter()
            .find(|entry| entry.mods.mask == masked)
            .map(|entry| entry.level)
            .unwrap_or(0)
    }
}

/// How two colliding entities (interprets, symbol maps, ...) combine when
/// one file `include`s another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// The including file's entity wins outright.
    Default,
    /// The included file's entity wins outright (`augment` semantics
    /// inverted: this is what a bare `include` without qualifier, or an
    /// explicit `replace`, means for the entity being pulled in).
    Override,
    /// Keep both where possible (e.g. union symbol levels); on outright
    /// conflict the including file wins.
    Augment,
    /// The included entity completely replaces any existing one with the
    /// same key, regardless of origin.
    Replace,
}

impl Default for MergeMode {
    fn default() -> Self {
        MergeMode::Augment
    }
}

/// A compiled interpret rule: matches a keysym (optionally restricted to a
/// modifier combination) and prescribes an action plus virtual-modifier
/// effects for any symbol it matches.
#[derive(Debug, Clone)]
pub struct Interpret {
    pub keysym: Option<Keysym>,
    pub mods: Mods,
    /// `true` if `mods` must match exactly; `false` if it's a subset match
    /// (`AnyOfOrNone`/`AnyOf` style matching per spec.md §4.4.3).
    pub match_exact: bool,
    pub action: Option<crate::action::Action>,
    pub virtual_mod: Option<ModIndex>,
    pub repeat: Option<bool>,
    /// Declaration order across the whole merged AST; used to break ties
    /// between otherwise equally specific interprets (see DESIGN.md).
    pub declaration_order: u32,
}

bitflags! {
    /// Which state-component(s) an indicator's `whichModState`/
    /// `whichGroupState` field selects (spec.md §4.4.5). Shared between the
    /// modifier and group predicates since both select from the same
    /// base/latched/locked/effective family.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ComponentMask: u8 {
        const BASE      = 1 << 0;
        const LATCHED   = 1 << 1;
        const LOCKED    = 1 << 2;
        const EFFECTIVE = 1 << 3;
        /// Modifiers only: compat-derived (virtual-modifier-contributed) set.
        const COMPAT    = 1 << 4;
    }
}

impl ComponentMask {
    pub const ANY: ComponentMask = ComponentMask::from_bits_truncate(
        ComponentMask::BASE.bits()
            | ComponentMask::LATCHED.bits()
            | ComponentMask::LOCKED.bits()
            | ComponentMask::EFFECTIVE.bits(),
    );
}

/// A named LED (indicator) and what drives it. The LED is on iff every
/// non-empty condition among `which_mods`/`mods`, `which_groups`/`groups`,
/// and `controls` holds (spec.md §4.4.5); a zero'd condition is vacuously
/// satisfied and does not gate the LED.
#[derive(Debug, Clone, Default)]
pub struct IndicatorMap {
    pub name: String,
    pub index: ModIndex,
    pub which_mods: ComponentMask,
    pub mods: Mods,
    pub which_groups: ComponentMask,
    pub groups: Vec<GroupIndex>,
    pub controls: Controls,
}

/// One physical key: its bound type per group, its symbols per group and
/// level, and its actions per group and level.
#[derive(Debug, Clone, Default)]
pub struct Key {
    pub name: KeycodeName,
    pub keycode: Keycode,
    pub groups: Vec<KeyGroup>,
    pub repeats: bool,
    pub vmodmap: VirtualModMask,
}

#[derive(Debug, Clone, Default)]
pub struct KeyGroup {
    pub type_name: String,
    pub levels: Vec<KeyLevel>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyLevel {
    pub keysyms: Vec<Keysym>,
    pub actions: Vec<crate::action::Action>,
}

/// An alias: an alternate keycode name resolving to the same key.
#[derive(Debug, Clone)]
pub struct KeyAlias {
    pub alias: KeycodeName,
    pub real: KeycodeName,
}

/// The display names bound to each of the up to four groups (layouts), for
/// a `(layout, variant)`-unaware consumer to show the user.
#[derive(Debug, Clone, Default)]
pub struct GroupNameTable {
    pub names: BTreeMap<GroupIndex, String>,
}
