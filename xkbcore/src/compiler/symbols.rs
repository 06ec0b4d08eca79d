//! Pass 4: resolve `xkb_symbols` into per-key groups of levels, each level
//! carrying its keysyms and the action decoded for it from the compiled
//! interpret list.

use std::collections::BTreeMap;

use crate::action::Action;
use crate::compiler::compat::CompatResult;
use crate::compiler::keycodes::KeycodesResult;
use crate::compiler::keytypes::TypesResult;
use crate::compiler::merge::should_replace;
use crate::error::{Error, Result};
use crate::linker::LinkedEntry;
use crate::parser::{KeyFieldStatement, Statement};
use crate::types::{
    GroupIndex, Key, KeyGroup, KeyLevel, Keysym, LevelIndex, ModIndex, RealModMask,
    VirtualModMask,
};
use xkbcore_keysyms::Database;

pub fn compile(
    entries: &[LinkedEntry],
    keycodes: &KeycodesResult,
    types: &TypesResult,
    compat: &CompatResult,
    vmods: &BTreeMap<String, u8>,
    db: &dyn Database,
    lenient: bool,
) -> Result<BTreeMap<crate::types::KeycodeName, Key>> {
    let mut keys: BTreeMap<crate::types::KeycodeName, Key> = BTreeMap::new();

    for entry in entries {
        let Statement::SymbolsKeyDef { name, body } = &entry.statement else {
            if !matches!(entry.statement, Statement::ModifierMapDef { .. }) {
                log::warn!("unexpected statement in xkb_symbols, ignoring");
            }
            continue;
        };

        let keycode = match keycodes.resolve_keycode(name) {
            Some(code) => code,
            None => {
                if lenient {
                    log::warn!("key {name} has symbols but no keycode binding, skipping");
                    continue;
                } else {
                    return Err(Error::UnknownKeycodeName(name.clone()));
                }
            }
        };

        let already = keys.contains_key(name);
        if !should_replace(already, entry.merge) {
            continue;
        }

        let mut key = Key { name: name.clone(), keycode, ..Default::default() };
        let mut explicit_types: BTreeMap<GroupIndex, String> = BTreeMap::new();
        let mut default_type: Option<String> = None;
        let mut symbol_groups: Vec<Vec<String>> = Vec::new();

        for field in body {
            match field {
                KeyFieldStatement::Symbols(groups) => symbol_groups = groups.clone(),
                KeyFieldStatement::Type(type_name) => default_type = Some(type_name.clone()),
                KeyFieldStatement::GroupType { group, type_name } => {
                    explicit_types.insert(*group, type_name.clone());
                }
                KeyFieldStatement::Repeat(value) => key.repeats = *value,
                KeyFieldStatement::VirtualModifier(vmod_name) => {
                    if let Some(&idx) = vmods.get(vmod_name.trim()) {
                        key.vmodmap |= VirtualModMask::bit(idx);
                    }
                }
                _ => {}
            }
        }

        for (group_idx, level_names) in symbol_groups.iter().enumerate() {
            let group_index = group_idx as GroupIndex;
            let keysyms: Vec<Vec<Keysym>> = level_names
                .iter()
                .map(|name| {
                    db.name_to_keysym(name, true)
                        .map(|ks| vec![ks])
                        .unwrap_or_else(|| {
                            log::warn!("unknown keysym name {name:?}, using NoSymbol");
                            vec![0]
                        })
                })
                .collect();

            let type_name = explicit_types
                .get(&group_index)
                .cloned()
                .or_else(|| default_type.clone())
                .unwrap_or_else(|| infer_type_name(&keysyms));

            let key_type = types.types.get(&type_name);
            let mut levels = Vec::with_capacity(keysyms.len());
            for (level_idx, level_syms) in keysyms.iter().enumerate() {
                let active_mods = key_type
                    .map(|t| mods_active_at_level(t, level_idx as LevelIndex))
                    .unwrap_or_default();
                let mut actions = Vec::with_capacity(level_syms.len());
                let mut accumulated_vmod: Option<ModIndex> = None;
                for &ks in level_syms {
                    let (action, vmod) =
                        resolve_action_for_keysym(ks, active_mods, &compat.interprets);
                    actions.push(action.unwrap_or(Action::NoAction));
                    accumulated_vmod = accumulated_vmod.or(vmod);
                }
                if let Some(idx) = accumulated_vmod {
                    key.vmodmap |= VirtualModMask::bit(idx);
                }
                levels.push(KeyLevel { keysyms: level_syms.clone(), actions });
            }

            if !types.types.contains_key(&type_name) && !lenient {
                return Err(Error::UnknownKeyType(type_name, name.clone()));
            }

            key.groups.push(KeyGroup { type_name, levels });
        }

        keys.insert(name.clone(), key);
    }

    Ok(keys)
}

/// Picks a default key type for a group with no explicit `type =`
/// assignment: `ONE_LEVEL` for a single symbol, `ALPHABETIC` when the two
/// levels are the lower/upper-case pairing of the same letter, `TWO_LEVEL`
/// otherwise. Mirrors the original library peeking at keysym case to pick
/// a default type, reusing `xkbcore_keysyms`'s case predicates instead of
/// a bespoke range table.
fn infer_type_name(keysyms: &[Vec<Keysym>]) -> String {
    match keysyms.len() {
        0 | 1 => "ONE_LEVEL".to_string(),
        _ => {
            let level0 = keysyms[0].first().copied().unwrap_or(0);
            let level1 = keysyms[1].first().copied().unwrap_or(0);
            if xkbcore_keysyms::is_lower(level0) && xkbcore_keysyms::is_upper_or_title(level1) {
                "ALPHABETIC".to_string()
            } else {
                "TWO_LEVEL".to_string()
            }
        }
    }
}

/// Finds the real-mod combination that selects `level` in `key_type`'s map,
/// i.e. the inverse of [`crate::types::KeyType::level_for_mods`]. Several
/// entries can map to the same level; the first declared one is
/// representative enough for matching an interpret's modifier predicate
/// against, since entries for one level only ever differ in modifiers the
/// type's effective mask already ignores.
fn mods_active_at_level(key_type: &crate::types::KeyType, level: LevelIndex) -> RealModMask {
    key_type
        .map
        .iter()
        .find(|entry| entry.level == level)
        .map(|entry| entry.mods.mask)
        .unwrap_or(RealModMask::empty())
}

/// Whether `interp`'s modifier predicate matches `active`, the real-mod
/// combination that selects the level this keysym is being resolved for.
/// An interpret with no modifier predicate in its source (`Mods::default()`)
/// always matches, the same as `AnyOfOrNone(any)`.
fn mods_predicate_matches(interp: &crate::types::Interpret, active: RealModMask) -> bool {
    if interp.mods.real_mods.is_empty() {
        return true;
    }
    if interp.match_exact {
        active == interp.mods.real_mods
    } else {
        (active & !interp.mods.real_mods).is_empty()
    }
}

fn resolve_action_for_keysym(
    keysym: Keysym,
    active_mods: RealModMask,
    interprets: &[crate::types::Interpret],
) -> (Option<Action>, Option<ModIndex>) {
    let mut best: Option<&crate::types::Interpret> = None;
    for interp in interprets {
        let keysym_matches = match interp.keysym {
            Some(ks) => ks == keysym,
            None => true,
        };
        if !keysym_matches || !mods_predicate_matches(interp, active_mods) {
            continue;
        }
        best = Some(match best {
            None => interp,
            Some(current) => {
                // More specific wins: a keysym-specific predicate beats a
                // wildcard one, then a modifier-restricted predicate beats
                // an unrestricted one; ties break by declaration order.
                let current_rank =
                    (current.keysym.is_some(), !current.mods.real_mods.is_empty());
                let new_rank = (interp.keysym.is_some(), !interp.mods.real_mods.is_empty());
                if new_rank > current_rank
                    || (new_rank == current_rank
                        && interp.declaration_order < current.declaration_order)
                {
                    interp
                } else {
                    current
                }
            }
        });
    }
    best.map(|i| (i.action.clone(), i.virtual_mod)).unwrap_or((None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::config::CompileConfig;
    use crate::linker::{Linker, NullIncludeResolver};
    use xkbcore_keysyms::BuiltinDatabase;

    fn compile_keymap_fragment(src: &str) -> BTreeMap<crate::types::KeycodeName, Key> {
        let mut resolver = NullIncludeResolver;
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        let keycodes = crate::compiler::keycodes::compile(&linked.keycodes);
        let types = crate::compiler::keytypes::compile(&linked.types, &CompileConfig::default());
        let db = BuiltinDatabase;
        let compat =
            crate::compiler::compat::compile(&linked.compat, &types.vmod_index, &db, true).unwrap();
        compile(&linked.symbols, &keycodes, &types, &compat, &types.vmod_index, &db, true).unwrap()
    }

    #[test]
    fn infers_alphabetic_type_for_letter_pair() {
        let src = r#"
            xkb_keycodes "m" { <AC01> = 38; };
            xkb_symbols "m" { key <AC01> { [a, A] }; };
        "#;
        let keys = compile_keymap_fragment(src);
        let key = &keys[&crate::types::KeycodeName::from("AC01")];
        assert_eq!(key.groups[0].type_name, "ALPHABETIC");
        assert_eq!(key.groups[0].levels.len(), 2);
    }

    #[test]
    fn interpret_selection_respects_the_levels_modifier_state() {
        let src = r#"
            xkb_keycodes "m" { <AE01> = 10; };
            xkb_compat "m" {
                interpret exclam {
                    action = SetMods(modifiers=Control);
                };
                interpret exclam + Exactly(Shift) {
                    action = SetMods(modifiers=Shift);
                };
            };
            xkb_symbols "m" { key <AE01> { type = "TWO_LEVEL", [exclam, exclam] }; };
        "#;
        let keys = compile_keymap_fragment(src);
        let key = &keys[&crate::types::KeycodeName::from("AE01")];
        // Level 0 has no active modifiers, so the unrestricted interpret wins.
        assert!(matches!(
            key.groups[0].levels[0].actions[0],
            Action::SetMods { mods, .. } if mods.real_mods == crate::types::RealModMask::CONTROL
        ));
        // Level 1 is reached with Shift down, matching the more specific interpret.
        assert!(matches!(
            key.groups[0].levels[1].actions[0],
            Action::SetMods { mods, .. } if mods.real_mods == crate::types::RealModMask::SHIFT
        ));
    }

    #[test]
    fn action_comes_from_matching_interpret() {
        let src = r#"
            xkb_keycodes "m" { <LFSH> = 50; };
            xkb_compat "m" {
                interpret Shift_L {
                    action = SetMods(modifiers=Shift);
                };
            };
            xkb_symbols "m" { key <LFSH> { [Shift_L] }; };
        "#;
        let keys = compile_keymap_fragment(src);
        let key = &keys[&crate::types::KeycodeName::from("LFSH")];
        assert!(matches!(key.groups[0].levels[0].actions[0], Action::SetMods { .. }));
    }
}
