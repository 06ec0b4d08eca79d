//! Pass 2: virtual modifier allocation and key type resolution.
//!
//! The four canonical types are compiled-in constants mirroring
//! `XkbcInitCanonicalKeyTypes`'s `canonicalTypes[]` table in the original
//! sources' `misc.c` (`map2Level`, `mapAlpha`/`preAlpha`, `mapKeypad`).

use std::collections::BTreeMap;

use crate::compiler::config::CompileConfig;
use crate::compiler::expr::parse_mod_expr;
use crate::compiler::merge::should_replace;
use crate::linker::LinkedEntry;
use crate::parser::{KeyTypeStatement, Statement};
use crate::types::{KeyType, KeyTypeMapEntry, Mods, RealModMask};

#[derive(Debug, Clone, Default)]
pub struct TypesResult {
    pub vmod_index: BTreeMap<String, u8>,
    pub types: BTreeMap<String, KeyType>,
}

pub fn compile(entries: &[LinkedEntry], config: &CompileConfig) -> TypesResult {
    let mut vmod_index = BTreeMap::new();
    let mut next_vmod = 0u8;

    for entry in entries {
        if let Statement::VirtualModifiersDef(names) = &entry.statement {
            for name in names {
                vmod_index.entry(name.clone()).or_insert_with(|| {
                    let idx = next_vmod;
                    next_vmod = next_vmod.saturating_add(1);
                    idx
                });
            }
        }
    }

    let mut types = canonical_types(config, &vmod_index);

    for entry in entries {
        if let Statement::KeyTypeDef { name, body } = &entry.statement {
            let compiled = compile_key_type(name, body, &vmod_index);
            let already = types.contains_key(name);
            if should_replace(already, entry.merge) {
                types.insert(name.clone(), compiled);
            }
        }
    }

    TypesResult { vmod_index, types }
}

fn compile_key_type(
    name: &str,
    body: &[KeyTypeStatement],
    vmods: &BTreeMap<String, u8>,
) -> KeyType {
    let mut mods = Mods::default();
    let mut map = Vec::new();
    let mut level_names: Vec<Option<String>> = Vec::new();

    for stmt in body {
        match stmt {
            KeyTypeStatement::Modifiers(expr) => mods = parse_mod_expr(expr, vmods),
            KeyTypeStatement::Map { mods: mod_expr, level } => {
                let entry_mods = parse_mod_expr(mod_expr, vmods);
                map.push(KeyTypeMapEntry {
                    mods: entry_mods,
                    level: (*level - 1).max(0) as crate::types::LevelIndex,
                    preserve: RealModMask::empty(),
                });
            }
            KeyTypeStatement::Preserve { mods: mod_expr, preserve } => {
                let entry_mods = parse_mod_expr(mod_expr, vmods);
                let preserve_mods = parse_mod_expr(preserve, vmods).real_mods;
                if let Some(existing) =
                    map.iter_mut().find(|e| e.mods.mask == entry_mods.mask)
                {
                    existing.preserve = preserve_mods;
                }
            }
            KeyTypeStatement::LevelName { level, name } => {
                let idx = (*level - 1).max(0) as usize;
                if level_names.len() <= idx {
                    level_names.resize(idx + 1, None);
                }
                level_names[idx] = Some(name.clone());
            }
        }
    }

    let num_levels = map
        .iter()
        .map(|e| e.level + 1)
        .max()
        .unwrap_or(1)
        .max(level_names.len() as crate::types::LevelIndex);

    KeyType { name: name.to_string(), mods, num_levels, map, level_names }
}

/// Builds the four canonical types every keymap gets even without an
/// explicit `xkb_types` declaration, per `misc.c`'s `canonicalTypes[]`.
fn canonical_types(
    config: &CompileConfig,
    vmods: &BTreeMap<String, u8>,
) -> BTreeMap<String, KeyType> {
    let mut types = BTreeMap::new();

    types.insert(
        "ONE_LEVEL".to_string(),
        KeyType {
            name: "ONE_LEVEL".to_string(),
            mods: Mods::default(),
            num_levels: 1,
            map: Vec::new(),
            level_names: vec![Some("Any".to_string())],
        },
    );

    types.insert(
        "TWO_LEVEL".to_string(),
        KeyType {
            name: "TWO_LEVEL".to_string(),
            mods: Mods::real(RealModMask::SHIFT),
            num_levels: 2,
            map: vec![KeyTypeMapEntry {
                mods: Mods::real(RealModMask::SHIFT),
                level: 1,
                preserve: RealModMask::empty(),
            }],
            level_names: vec![Some("Base".to_string()), Some("Shift".to_string())],
        },
    );

    types.insert(
        "ALPHABETIC".to_string(),
        KeyType {
            name: "ALPHABETIC".to_string(),
            mods: Mods::real(RealModMask::SHIFT | RealModMask::LOCK),
            num_levels: 2,
            map: vec![
                KeyTypeMapEntry {
                    mods: Mods::real(RealModMask::SHIFT),
                    level: 1,
                    preserve: RealModMask::empty(),
                },
                KeyTypeMapEntry {
                    mods: Mods::real(RealModMask::LOCK),
                    level: 0,
                    preserve: RealModMask::LOCK,
                },
                KeyTypeMapEntry {
                    mods: Mods::real(RealModMask::SHIFT | RealModMask::LOCK),
                    level: 0,
                    preserve: RealModMask::LOCK,
                },
            ],
            level_names: vec![Some("Base".to_string()), Some("Caps".to_string())],
        },
    );

    let keypad_vmod_bit = config
        .with_keypad_vmod
        .as_ref()
        .and_then(|name| vmods.get(name).copied());
    let mut keypad_mask = Mods::real(RealModMask::SHIFT);
    let mut keypad_map = vec![KeyTypeMapEntry {
        mods: Mods::real(RealModMask::SHIFT),
        level: 1,
        preserve: RealModMask::empty(),
    }];
    if let Some(bit) = keypad_vmod_bit {
        let vmod = crate::types::VirtualModMask::bit(bit);
        keypad_mask.vmods = vmod;
        keypad_map.push(KeyTypeMapEntry {
            mods: Mods { mask: RealModMask::empty(), real_mods: RealModMask::empty(), vmods: vmod },
            level: 1,
            preserve: RealModMask::empty(),
        });
    }
    types.insert(
        "KEYPAD".to_string(),
        KeyType {
            name: "KEYPAD".to_string(),
            mods: keypad_mask,
            num_levels: 2,
            map: keypad_map,
            level_names: vec![Some("Base".to_string()), Some("Keypad".to_string())],
        },
    );

    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::{Linker, NullIncludeResolver};

    #[test]
    fn canonical_types_are_always_present() {
        let result = compile(&[], &CompileConfig::default());
        for name in ["ONE_LEVEL", "TWO_LEVEL", "ALPHABETIC", "KEYPAD"] {
            assert!(result.types.contains_key(name), "missing canonical type {name}");
        }
    }

    #[test]
    fn alphabetic_type_preserves_lock() {
        let result = compile(&[], &CompileConfig::default());
        let alphabetic = &result.types["ALPHABETIC"];
        let lock_entry = alphabetic
            .map
            .iter()
            .find(|e| e.mods.mask == RealModMask::LOCK)
            .unwrap();
        assert_eq!(lock_entry.level, 0);
        assert_eq!(lock_entry.preserve, RealModMask::LOCK);
    }

    #[test]
    fn user_type_overrides_canonical_by_name() {
        let src = r#"
            xkb_types "minimal" {
                type "TWO_LEVEL" {
                    modifiers = Shift;
                    map[Shift] = 2;
                };
            };
        "#;
        let mut resolver = NullIncludeResolver;
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        let result = compile(&linked.types, &CompileConfig::default());
        assert_eq!(result.types["TWO_LEVEL"].map[0].level, 1);
    }
}
