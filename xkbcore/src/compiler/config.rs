/// Keymap text format version a [`crate::keymap::Keymap`] compiles from and
/// serializes as (spec.md §6.1). `V1` is the original dialect: group
/// references and `Group1..GroupN`/`Last` names resolve only up to
/// [`crate::types::V1_MAX_GROUPS`], an unknown group name is a hard error,
/// and long keycode names may need quoting to round-trip. `V2` raises the
/// group ceiling to [`crate::types::MAX_GROUPS`], tolerates an unknown
/// group name (falling back rather than failing compilation), and is more
/// relaxed about keysym literal syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapFormat {
    V1,
    V2,
}

impl Default for KeymapFormat {
    fn default() -> Self {
        KeymapFormat::V1
    }
}

impl KeymapFormat {
    pub fn max_groups(self) -> crate::types::GroupIndex {
        match self {
            KeymapFormat::V1 => crate::types::V1_MAX_GROUPS,
            KeymapFormat::V2 => crate::types::MAX_GROUPS,
        }
    }
}

/// Compile-time options. Passed by value/reference into [`crate::compiler::compile`]
/// rather than read from environment variables or a config file — this
/// crate has no ambient configuration of its own (spec.md's Non-goals
/// exclude RMLVO/config-file resolution).
#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub format: KeymapFormat,
    /// Name of a virtual modifier that gates the canonical KEYPAD type's
    /// second map entry (`xkb-priv.h`'s `keypadVMod` parameter to
    /// `XkbcInitCanonicalKeyTypes`). `None` means the simpler two-entry
    /// KEYPAD type with no virtual-modifier gate.
    pub with_keypad_vmod: Option<String>,
    /// Largest keycode this crate will allocate a `Key` slot for.
    pub max_keycode: u32,
    /// If true (the default), unresolvable-but-recoverable references
    /// (missing key type, unresolved virtual modifier used in a `key`
    /// body) fall back to a sane default and log a warning instead of
    /// aborting compilation, matching spec.md §7's lenient-fallback
    /// policy. If false, every such case is a hard error.
    pub lenient: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            format: KeymapFormat::default(),
            with_keypad_vmod: None,
            max_keycode: 0xff,
            lenient: true,
        }
    }
}
