//! The parse tree the scanner's token stream is reduced to. Deliberately
//! loose — names are not yet resolved against each other (that's the
//! linker/compiler's job) — mirroring how the original library's grammar
//! builds an untyped parse tree before a separate resolution pass.

use crate::types::{GroupIndex, Keycode, KeycodeName, MergeMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Keycodes,
    Types,
    Compat,
    Symbols,
}

#[derive(Debug, Clone)]
pub struct KeymapFile {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub name: String,
    pub merge: MergeMode,
    pub partial: bool,
    pub hidden: bool,
    pub statements: Vec<(MergeMode, Statement)>,
    /// Declaration order within the whole file, assigned by the parser;
    /// the linker renumbers these into a single cross-file counter at
    /// merge time (see DESIGN.md, "interpret tie-breaking").
    pub order: u32,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Include { merge: MergeMode, target: String },

    /// `xkb_keycodes`: `<AC01> = 38;`
    KeycodeDef { name: KeycodeName, code: Keycode },
    /// `xkb_keycodes`: `alias <KPDL> = <KPDC>;`
    AliasDef { alias: KeycodeName, real: KeycodeName },
    /// `xkb_keycodes`: group name table entry.
    GroupNameDef { group: GroupIndex, name: String },

    /// `xkb_types`: `virtual_modifiers NumLock,Alt;`
    VirtualModifiersDef(Vec<String>),
    /// `xkb_types`: `type "TWO_LEVEL" { ... };`
    KeyTypeDef { name: String, body: Vec<KeyTypeStatement> },

    /// `xkb_compat`: `interpret Shift_L+AnyOf(all) { ... };`
    InterpretDef { matcher: InterpretMatcher, body: Vec<KeyFieldStatement> },
    /// `xkb_compat`: `indicator "Caps Lock" { ... };`
    IndicatorDef { name: String, body: Vec<KeyFieldStatement> },

    /// `xkb_symbols`: `key <AC01> { [a, A] };` or with field assignments.
    SymbolsKeyDef { name: KeycodeName, body: Vec<KeyFieldStatement> },
    /// `xkb_symbols`: `modifier_map Lock { <CAPS> };`
    ModifierMapDef { real_mod: String, keys: Vec<KeycodeName> },
}

#[derive(Debug, Clone)]
pub struct InterpretMatcher {
    /// `None` means `Any` (matches every keysym not otherwise matched).
    pub keysym: Option<String>,
    /// Modifier predicate text, e.g. `"AnyOf(all)"`, `"Shift+Lock"`,
    /// `"None"`. Left as text for the compiler's interpret pass to parse
    /// against the keymap's resolved modifier names.
    pub mod_predicate: Option<String>,
}

#[derive(Debug, Clone)]
pub enum KeyTypeStatement {
    Modifiers(String),
    Map { mods: String, level: i64 },
    Preserve { mods: String, preserve: String },
    LevelName { level: i64, name: String },
}

/// A field assignment shared by `interpret`, `indicator`, and `key` bodies
/// (`action`, `virtualModifier`, `repeat`, symbol/level lists, ...); kept
/// generic because the three grammars overlap heavily in the original
/// sources.
#[derive(Debug, Clone)]
pub enum KeyFieldStatement {
    Action(String),
    VirtualModifier(String),
    Repeat(bool),
    Symbols(Vec<Vec<String>>),
    Type(String),
    GroupType { group: GroupIndex, type_name: String },
    Modifiers { which: String, mods: String },
    Groups { which: String, groups: Vec<GroupIndex> },
    Controls(String),
    /// `whichModState = base+locked;` — selects which state component(s)
    /// an indicator's `modifiers` field is compared against.
    WhichModState(String),
    /// `whichGroupState = effective;` — same, for `groups`.
    WhichGroupState(String),
}
