//! Top-level compile pipeline: links the merged AST, runs the four
//! per-section passes (keycodes, types, compat, symbols), then a finalize
//! pass that resolves every virtual-modifier reference into a real-modifier
//! mask, and assembles the result into an immutable [`crate::keymap::Keymap`].
//!
//! Compilation is all-or-nothing (spec.md §7): the first error from any
//! pass aborts here and no keymap is produced. Individual unresolved
//! references a lenient caller can tolerate (missing key type, unknown
//! keysym name) are handled inside the pass that encounters them, with a
//! fallback and a `log::warn!`, not here.

pub mod actions;
pub mod compat;
pub mod config;
pub mod expr;
pub mod keycodes;
pub mod keytypes;
pub mod merge;
pub mod symbols;

pub use config::{CompileConfig, KeymapFormat};

use std::collections::BTreeMap;

use crate::error::Result;
use crate::keymap::{Keymap, KeymapData};
use crate::linker::{IncludeResolver, LinkedEntry, Linker};
use crate::parser::Statement;
use crate::types::{GroupIndex, Key, KeyType, Keycode, KeycodeName, ModIndex, Mods, RealModMask, VirtualModMask};
use xkbcore_keysyms::Database;

/// Runs the full pipeline over `source`, producing an immutable [`Keymap`]
/// or the first error encountered.
pub fn compile(
    source: &str,
    resolver: &mut dyn IncludeResolver,
    db: &dyn Database,
    config: &CompileConfig,
) -> Result<Keymap> {
    let linked = Linker::new(resolver).link(source)?;

    let keycodes = keycodes::compile(&linked.keycodes);
    let types_result = keytypes::compile(&linked.types, config);
    let keytypes::TypesResult { vmod_index, types: mut types_map } = types_result;

    let compat_result = compat::compile(&linked.compat, &vmod_index, db, config.lenient)?;
    let mut keys = symbols::compile(
        &linked.symbols,
        &keycodes,
        &keytypes::TypesResult { vmod_index: vmod_index.clone(), types: types_map.clone() },
        &compat_result,
        &vmod_index,
        db,
        config.lenient,
    )?;

    let vmod_real = resolve_virtual_modifiers(&linked.symbols, &vmod_index, &keys);

    for ty in types_map.values_mut() {
        finalize_key_type(ty, &vmod_real);
    }

    let mut interprets = compat_result.interprets;
    for interp in &mut interprets {
        finalize_mods(&mut interp.mods, &vmod_real);
    }

    let mut indicators = compat_result.indicators;
    for ind in &mut indicators {
        finalize_mods(&mut ind.mods, &vmod_real);
    }

    for key in keys.values_mut() {
        for group in &mut key.groups {
            for level in &mut group.levels {
                for action in &mut level.actions {
                    finalize_action(action, &vmod_real);
                }
            }
        }
    }

    let declared_group_count = keycodes
        .group_names
        .names
        .keys()
        .copied()
        .max()
        .map(|g| g.saturating_add(1))
        .unwrap_or(0);
    let num_groups = keys
        .values()
        .map(|k| k.groups.len() as GroupIndex)
        .max()
        .unwrap_or(0)
        .max(declared_group_count)
        .max(1)
        .min(config.format.max_groups());

    let min_keycode = keycodes.codes.values().copied().min().unwrap_or(0);
    let max_keycode = keycodes.codes.values().copied().max().unwrap_or(0);

    let by_keycode: BTreeMap<Keycode, KeycodeName> =
        keycodes.codes.iter().map(|(name, code)| (*code, name.clone())).collect();

    let data = KeymapData {
        keycodes,
        by_keycode,
        vmod_index,
        vmod_real,
        types: types_map,
        interprets,
        indicators,
        keys,
        num_groups,
        format: config.format,
        min_keycode,
        max_keycode,
    };

    Ok(Keymap::new(data))
}

/// Builds the virtual-modifier -> real-modifier-mask mapping that compiler
/// pass 5 ("finalize", spec.md §4.4.1) substitutes everywhere a virtual
/// modifier is referenced.
///
/// Grounded on `xkbcomp`'s `ResolveVirtualModifier`: a virtual modifier's
/// real-mod binding is never declared directly, it's inferred from which
/// keys carry both a `modifier_map REALMOD { <KEY> };` binding and a
/// `vmods = VMOD;` field on that same key — pressing that key sets both,
/// so the virtual modifier "means" whatever real modifier(s) its bound
/// keys also set.
fn resolve_virtual_modifiers(
    symbols_entries: &[LinkedEntry],
    vmod_index: &BTreeMap<String, u8>,
    keys: &BTreeMap<KeycodeName, Key>,
) -> BTreeMap<ModIndex, RealModMask> {
    let mut map: BTreeMap<ModIndex, RealModMask> = BTreeMap::new();

    for entry in symbols_entries {
        if let Statement::ModifierMapDef { real_mod, keys: key_names } = &entry.statement {
            let Some(real) = RealModMask::from_name(real_mod) else {
                log::warn!("modifier_map names unknown real modifier {real_mod:?}");
                continue;
            };
            for name in key_names {
                let Some(key) = keys.get(name) else { continue };
                for idx in 0..32u8 {
                    if key.vmodmap.contains(VirtualModMask::bit(idx)) {
                        *map.entry(idx).or_insert(RealModMask::empty()) |= real;
                    }
                }
            }
        }
    }

    // Every declared virtual modifier gets an entry, even an empty one —
    // spec.md §4.4.1 permits an unbound virtual modifier to still
    // participate in MODS_EFFECTIVE queries as itself.
    for &idx in vmod_index.values() {
        map.entry(idx).or_insert_with(RealModMask::empty);
    }

    map
}

fn resolve_vmod_mask(vmods: VirtualModMask, vmod_real: &BTreeMap<ModIndex, RealModMask>) -> RealModMask {
    let mut out = RealModMask::empty();
    for idx in 0..32u8 {
        if vmods.contains(VirtualModMask::bit(idx)) {
            if let Some(&r) = vmod_real.get(&idx) {
                out |= r;
            }
        }
    }
    out
}

/// Folds `mods.vmods` into `mods.mask` via `vmod_real`, leaving `real_mods`
/// (the part that was already a real-modifier name) untouched for
/// diagnostics.
fn finalize_mods(mods: &mut Mods, vmod_real: &BTreeMap<ModIndex, RealModMask>) {
    mods.mask = mods.real_mods | resolve_vmod_mask(mods.vmods, vmod_real);
}

/// Resolves a key type's modifier mask and every map entry's mask
/// (spec.md §4.4.2), dropping entries whose mask collapses to nothing
/// because their only modifiers were an unbound virtual modifier.
fn finalize_key_type(ty: &mut KeyType, vmod_real: &BTreeMap<ModIndex, RealModMask>) {
    finalize_mods(&mut ty.mods, vmod_real);
    let effective_mask = ty.mods.mask;

    let mut kept = Vec::with_capacity(ty.map.len());
    for mut entry in std::mem::take(&mut ty.map) {
        let had_vmods_only = !entry.mods.vmods.is_empty() && entry.mods.real_mods.is_empty();
        finalize_mods(&mut entry.mods, vmod_real);
        if had_vmods_only && entry.mods.mask.is_empty() {
            continue;
        }
        entry.mods.mask &= effective_mask;
        kept.push(entry);
    }
    ty.map = kept;
}

fn finalize_action(action: &mut crate::action::Action, vmod_real: &BTreeMap<ModIndex, RealModMask>) {
    use crate::action::Action;
    match action {
        Action::SetMods { mods, .. } | Action::LatchMods { mods, .. } | Action::LockMods { mods, .. } => {
            finalize_mods(mods, vmod_real);
        }
        Action::RedirectKey { mods_mask, mods, vmods_mask, vmods, .. } => {
            *mods_mask |= resolve_vmod_mask(*vmods_mask, vmod_real);
            *mods |= resolve_vmod_mask(*vmods, vmod_real);
        }
        _ => {}
    }
}
