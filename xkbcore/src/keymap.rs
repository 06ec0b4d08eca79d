//! The compiled keymap: an immutable, reference-counted result handed out
//! by [`crate::compiler::compile`] and consumed read-only by
//! [`crate::state::State`].
//!
//! Mirrors `xkb_keymap`'s lifecycle in the original sources — built once,
//! refcounted, never mutated after compile finish — as a thin `Arc` wrapper
//! rather than hand-rolled refcounting, the same choice the teacher corpus
//! makes for its own shared immutable config/state objects.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::action::{Action, GroupDelta};
use crate::compiler::config::KeymapFormat;
use crate::compiler::keycodes::KeycodesResult;
use crate::error::Result;
use crate::linker::IncludeResolver;
use crate::types::{
    Controls, GroupIndex, IndicatorMap, Interpret, Key, KeyType, Keycode, KeycodeName, ModIndex,
    Mods, RealModMask, VirtualModMask,
};
use xkbcore_keysyms::Database;

#[derive(Debug)]
pub struct KeymapData {
    pub keycodes: KeycodesResult,
    pub by_keycode: BTreeMap<Keycode, KeycodeName>,
    pub vmod_index: BTreeMap<String, ModIndex>,
    pub vmod_real: BTreeMap<ModIndex, RealModMask>,
    pub types: BTreeMap<String, KeyType>,
    pub interprets: Vec<Interpret>,
    pub indicators: Vec<IndicatorMap>,
    pub keys: BTreeMap<KeycodeName, Key>,
    pub num_groups: GroupIndex,
    pub format: KeymapFormat,
    pub min_keycode: Keycode,
    pub max_keycode: Keycode,
}

/// An immutable, atomically reference-counted compiled keymap. Cloning is
/// `Arc::clone` — cheap, and the clone shares the same underlying tables,
/// so multiple [`crate::state::State`]s (each used from one thread at a
/// time) can each hold their own clone of the same keymap (spec.md §5).
#[derive(Debug, Clone)]
pub struct Keymap(Arc<KeymapData>);

impl Keymap {
    pub(crate) fn new(data: KeymapData) -> Self {
        Keymap(Arc::new(data))
    }

    /// Compiles `source` against `resolver`/`db` under `config`, the single
    /// entry point spec.md's pipeline describes (scanner -> parser ->
    /// linker -> compiler -> keymap).
    pub fn compile(
        source: &str,
        resolver: &mut dyn IncludeResolver,
        db: &dyn Database,
        config: &crate::compiler::CompileConfig,
    ) -> Result<Keymap> {
        crate::compiler::compile(source, resolver, db, config)
    }

    pub fn min_keycode(&self) -> Keycode {
        self.0.min_keycode
    }

    pub fn max_keycode(&self) -> Keycode {
        self.0.max_keycode
    }

    pub fn num_groups(&self) -> GroupIndex {
        self.0.num_groups
    }

    pub fn num_leds(&self) -> usize {
        self.0.indicators.len()
    }

    pub fn num_virtual_mods(&self) -> usize {
        self.0.vmod_index.len()
    }

    pub fn format(&self) -> KeymapFormat {
        self.0.format
    }

    pub fn key_type(&self, name: &str) -> Option<&KeyType> {
        self.0.types.get(name)
    }

    pub fn indicators(&self) -> &[IndicatorMap] {
        &self.0.indicators
    }

    pub fn indicator_by_name(&self, name: &str) -> Option<&IndicatorMap> {
        self.0.indicators.iter().find(|i| i.name == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.0.keys.values()
    }

    pub fn key(&self, name: &KeycodeName) -> Option<&Key> {
        self.0.keys.get(name)
    }

    pub fn key_by_keycode(&self, keycode: Keycode) -> Option<&Key> {
        let name = self.0.by_keycode.get(&keycode)?;
        self.0.keys.get(name)
    }

    pub fn resolve_keycode(&self, name: &KeycodeName) -> Option<Keycode> {
        self.0.keycodes.resolve_keycode(name)
    }

    pub fn keycode_name(&self, keycode: Keycode) -> Option<&KeycodeName> {
        self.0.by_keycode.get(&keycode)
    }

    /// Resolves a named group reference (`Group1`..`GroupN`, `First`,
    /// `Last`) to an absolute index (spec.md §3.3 invariant 5). Returns
    /// `None` for a name beyond `num_groups` under format v1; v2 tolerates
    /// it by clamping to the last group.
    pub fn resolve_group_name(&self, name: &str) -> Option<GroupIndex> {
        let n = self.0.num_groups;
        if name.eq_ignore_ascii_case("first") {
            return Some(0);
        }
        if name.eq_ignore_ascii_case("last") {
            return Some(n.saturating_sub(1));
        }
        if let Some(digits) = name.strip_prefix("Group").or_else(|| name.strip_prefix("group")) {
            if let Ok(g) = digits.parse::<GroupIndex>() {
                let idx = g.saturating_sub(1);
                if idx < n {
                    return Some(idx);
                }
                return match self.0.format {
                    KeymapFormat::V2 if g <= crate::types::MAX_GROUPS => Some(n.saturating_sub(1)),
                    _ => None,
                };
            }
        }
        None
    }

    pub fn real_mods_for(&self, vmods: VirtualModMask) -> RealModMask {
        let mut out = RealModMask::empty();
        for idx in 0..32u8 {
            if vmods.contains(VirtualModMask::bit(idx)) {
                if let Some(&r) = self.0.vmod_real.get(&idx) {
                    out |= r;
                }
            }
        }
        out
    }

    pub fn resolved_mask(&self, mods: &Mods) -> RealModMask {
        mods.real_mods | self.real_mods_for(mods.vmods)
    }

    /// Two virtual modifiers with the same resolved real-mod mapping are
    /// "canonically" the same modifier for every query (spec.md §4.4.6,
    /// §8.1's modifier-canonicalization property) — this crate doesn't
    /// special-case that anywhere, it falls straight out of always
    /// comparing resolved `RealModMask`s instead of vmod bit identity.
    pub fn virtual_modifier_index(&self, name: &str) -> Option<ModIndex> {
        self.0.vmod_index.get(name).copied()
    }

    /// Canonical serializer (spec.md §4.5): deterministic, and
    /// `parse(serialize(keymap)) == keymap`'s sections up to declaration
    /// order. Produces valid `xkb_keymap { ... };` source the crate's own
    /// parser accepts, in this keymap's own compiled format.
    pub fn serialize(&self) -> String {
        self.serialize_as(self.0.format)
    }

    /// Serializes as if compiled under `format` instead of this keymap's
    /// own (e.g. re-emitting a v1 keymap as v2 text, or vice versa).
    pub fn to_string_versioned(&self, format: KeymapFormat) -> String {
        self.serialize_as(format)
    }

    fn serialize_as(&self, format: KeymapFormat) -> String {
        let mut out = String::new();
        if format == KeymapFormat::V2 {
            out.push_str("// format v2\n");
        }
        out.push_str("xkb_keymap {\n\n");
        self.serialize_keycodes(&mut out);
        out.push('\n');
        self.serialize_types(&mut out);
        out.push('\n');
        self.serialize_compat(&mut out);
        out.push('\n');
        self.serialize_symbols(&mut out);
        out.push_str("\n};\n");
        out
    }

    fn serialize_keycodes(&self, out: &mut String) {
        let _ = writeln!(out, "xkb_keycodes \"generated\" {{");
        for (name, code) in &self.0.keycodes.codes {
            let _ = writeln!(out, "    {name} = {code};");
        }
        for alias in &self.0.keycodes.aliases {
            let _ = writeln!(out, "    alias {} = {};", alias.alias, alias.real);
        }
        for (group, name) in &self.0.keycodes.group_names.names {
            let _ = writeln!(out, "    group {group} name = {name:?};");
        }
        out.push_str("};\n");
    }

    fn serialize_types(&self, out: &mut String) {
        let _ = writeln!(out, "xkb_types \"generated\" {{");
        if !self.0.vmod_index.is_empty() {
            let names: Vec<&str> = self.0.vmod_index.keys().map(String::as_str).collect();
            let _ = writeln!(out, "    virtual_modifiers {};", names.join(","));
        }
        for ty in self.0.types.values() {
            let _ = writeln!(out, "    type {:?} {{", ty.name);
            let _ = writeln!(out, "        modifiers = {};", format_mods(&ty.mods));
            for entry in &ty.map {
                let _ = writeln!(
                    out,
                    "        map[{}] = {};",
                    format_mods(&entry.mods),
                    entry.level + 1
                );
                if !entry.preserve.is_empty() {
                    let _ = writeln!(
                        out,
                        "        preserve[{}] = [{}];",
                        format_mods(&entry.mods),
                        format_real_mask(entry.preserve)
                    );
                }
            }
            for (idx, name) in ty.level_names.iter().enumerate() {
                if let Some(name) = name {
                    let _ = writeln!(out, "        level_name[{}] = {name:?};", idx + 1);
                }
            }
            out.push_str("    };\n");
        }
        out.push_str("};\n");
    }

    fn serialize_compat(&self, out: &mut String) {
        let _ = writeln!(out, "xkb_compat \"generated\" {{");
        for interp in &self.0.interprets {
            let keysym = interp
                .keysym
                .and_then(xkbcore_keysyms::keysym_to_name)
                .unwrap_or_else(|| "any".to_string());
            let _ = writeln!(out, "    interpret {keysym} {{");
            if let Some(action) = &interp.action {
                let _ = writeln!(out, "        action = {};", format_action(action));
            }
            if let Some(repeat) = interp.repeat {
                let _ = writeln!(out, "        repeat = {};", if repeat { "true" } else { "false" });
            }
            out.push_str("    };\n");
        }
        for ind in &self.0.indicators {
            let _ = writeln!(out, "    indicator {:?} {{", ind.name);
            if !ind.mods.mask.is_empty() {
                let _ = writeln!(out, "        modifiers = {};", format_mods(&ind.mods));
            }
            if !ind.groups.is_empty() {
                let groups: Vec<String> = ind.groups.iter().map(|g| g.to_string()).collect();
                let _ = writeln!(out, "        groups = [{}];", groups.join(","));
            }
            if !ind.controls.is_empty() {
                let _ = writeln!(out, "        controls = {};", format_controls(ind.controls));
            }
            out.push_str("    };\n");
        }
        out.push_str("};\n");
    }

    fn serialize_symbols(&self, out: &mut String) {
        let _ = writeln!(out, "xkb_symbols \"generated\" {{");
        for key in self.0.keys.values() {
            let _ = writeln!(out, "    key {} {{", key.name);
            let group_syms: Vec<String> = key
                .groups
                .iter()
                .map(|g| {
                    let syms: Vec<String> = g
                        .levels
                        .iter()
                        .map(|l| {
                            l.keysyms
                                .first()
                                .copied()
                                .and_then(xkbcore_keysyms::keysym_to_name)
                                .unwrap_or_else(|| "NoSymbol".to_string())
                        })
                        .collect();
                    format!("[ {} ]", syms.join(", "))
                })
                .collect();
            // Fields within a key body are comma-separated (the parser's
            // `parse_key_field_statements` only ever consumes a comma
            // between them, never a semicolon); the single semicolon that
            // terminates the whole `key <X> { ... };` statement comes from
            // the closing brace line below.
            let mut fields = vec![group_syms.join(", ")];
            for (idx, group) in key.groups.iter().enumerate() {
                fields.push(format!("type[{}] = {:?}", idx + 1, group.type_name));
            }
            if key.repeats {
                fields.push("repeat = true".to_string());
            }
            let _ = writeln!(out, "        {}", fields.join(",\n        "));
            out.push_str("    };\n");
        }
        out.push_str("};\n");
    }
}

impl std::fmt::Display for Keymap {
    /// Version-1-compatible textual form, the default re-encoding a caller
    /// gets from `to_string()`/`{}` without naming a format explicitly.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize_as(KeymapFormat::V1))
    }
}

fn format_real_mask(mask: RealModMask) -> String {
    if mask.is_empty() {
        return "none".to_string();
    }
    let names = [
        (RealModMask::SHIFT, "Shift"),
        (RealModMask::LOCK, "Lock"),
        (RealModMask::CONTROL, "Control"),
        (RealModMask::MOD1, "Mod1"),
        (RealModMask::MOD2, "Mod2"),
        (RealModMask::MOD3, "Mod3"),
        (RealModMask::MOD4, "Mod4"),
        (RealModMask::MOD5, "Mod5"),
    ];
    names
        .iter()
        .filter(|(bit, _)| mask.contains(*bit))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("+")
}

fn format_mods(mods: &Mods) -> String {
    format_real_mask(mods.mask)
}

fn format_controls(controls: Controls) -> String {
    let names = [
        (Controls::REPEAT_KEYS, "RepeatKeys"),
        (Controls::SLOW_KEYS, "SlowKeys"),
        (Controls::BOUNCE_KEYS, "BounceKeys"),
        (Controls::STICKY_KEYS, "StickyKeys"),
        (Controls::MOUSE_KEYS, "MouseKeys"),
        (Controls::ACCESS_X_KEYS, "AccessXKeys"),
        (Controls::AUDIBLE_BELL, "AudibleBell"),
        (Controls::OVERLAY1, "Overlay1"),
        (Controls::OVERLAY2, "Overlay2"),
        (Controls::IGNORE_GROUP_LOCK, "IgnoreGroupLock"),
    ];
    let joined: Vec<&str> = names.iter().filter(|(bit, _)| controls.contains(*bit)).map(|(_, n)| *n).collect();
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined.join("+")
    }
}

fn format_group_delta(delta: GroupDelta) -> String {
    match delta {
        GroupDelta::Absolute(g) => (g + 1).to_string(),
        GroupDelta::Relative(d) if d >= 0 => format!("+{d}"),
        GroupDelta::Relative(d) => d.to_string(),
    }
}

/// Serializes an [`Action`] back into the `Name(arg=value, ...)` call text
/// `compiler::actions::parse_action` reads, so a round-tripped keymap
/// parses to the same action.
pub fn format_action(action: &Action) -> String {
    match action {
        Action::NoAction => "NoAction()".to_string(),
        Action::VoidAction => "VoidAction()".to_string(),
        Action::SetMods { mods, .. } => format!("SetMods(modifiers={})", format_mods(mods)),
        Action::LatchMods { mods, flags } => format!(
            "LatchMods(modifiers={}{})",
            format_mods(mods),
            if flags.latch_to_lock { ",latchToLock=true" } else { "" }
        ),
        Action::LockMods { mods, .. } => format!("LockMods(modifiers={})", format_mods(mods)),
        Action::SetGroup { group, .. } => format!("SetGroup(group={})", format_group_delta(*group)),
        Action::LatchGroup { group, .. } => format!("LatchGroup(group={})", format_group_delta(*group)),
        Action::LockGroup { group, .. } => format!("LockGroup(group={})", format_group_delta(*group)),
        Action::MovePointer { x, y, .. } => format!("MovePointer(x={x},y={y})"),
        Action::PointerButton { button, count } => format!("PointerButton(button={button},count={count})"),
        Action::LockPointerButton { button, .. } => format!("LockPointerButton(button={button})"),
        Action::SetPointerDefault { button_default, .. } => {
            format!("SetPointerDefault(value={})", button_default.unwrap_or(0))
        }
        Action::SetControls { controls } => format!("SetControls(controls={})", format_controls(*controls)),
        Action::LockControls { controls, .. } => format!("LockControls(controls={})", format_controls(*controls)),
        Action::TerminateServer => "TerminateServer()".to_string(),
        Action::SwitchScreen { screen, .. } => format!("SwitchScreen(screen={screen})"),
        Action::RedirectKey { new_key, mods, .. } => {
            format!("RedirectKey(key={new_key},modifiers={})", format_real_mask(*mods))
        }
        Action::Private { kind, .. } => format!("Private(type={kind})"),
        #[cfg(feature = "legacy-actions")]
        Action::ISOLock { group, mods, .. } => {
            format!("ISOLock(group={},modifiers={})", format_group_delta(*group), format_real_mask(*mods))
        }
        #[cfg(feature = "legacy-actions")]
        Action::DeviceButton { device, button, count } => {
            format!("DeviceBtn(device={device},button={button},count={count})")
        }
        #[cfg(feature = "legacy-actions")]
        Action::DeviceValuator { device, valuator, value } => {
            format!("DeviceValuator(device={device},valuator={valuator},value={value})")
        }
        #[cfg(feature = "legacy-actions")]
        Action::ActionMessage { .. } => "ActionMessage()".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileConfig;
    use crate::linker::NullIncludeResolver;
    use xkbcore_keysyms::BuiltinDatabase;

    fn compile(src: &str) -> Keymap {
        let mut resolver = NullIncludeResolver;
        let db = BuiltinDatabase;
        Keymap::compile(src, &mut resolver, &db, &CompileConfig::default()).unwrap()
    }

    #[test]
    fn compiles_minimal_keymap() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <AC01> = 38; };
                xkb_symbols "m" { key <AC01> { [a] }; };
            };
            "#,
        );
        assert_eq!(keymap.min_keycode(), 38);
        assert_eq!(keymap.max_keycode(), 38);
        let key = keymap.key_by_keycode(38).unwrap();
        assert_eq!(key.groups[0].levels[0].keysyms[0], 0x61);
    }

    #[test]
    fn serialize_is_idempotent_text() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <AC01> = 38; };
                xkb_symbols "m" { key <AC01> { [a] }; };
            };
            "#,
        );
        let a = keymap.serialize();
        let b = keymap.serialize();
        assert_eq!(a, b);
        assert!(a.contains("xkb_keycodes"));
        assert!(a.contains("xkb_symbols"));
    }

    #[test]
    fn resolves_named_group_references() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <AC01> = 38; };
                xkb_symbols "m" { key <AC01> { [a, b, c] }; };
            };
            "#,
        );
        assert_eq!(keymap.resolve_group_name("First"), Some(0));
        assert_eq!(keymap.resolve_group_name("Last"), Some(2));
        assert_eq!(keymap.resolve_group_name("Group2"), Some(1));
    }
}
