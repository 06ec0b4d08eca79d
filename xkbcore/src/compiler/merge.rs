//! The one piece of merge-mode logic every compiler pass shares: deciding
//! whether a newly declared entity wins over one already in the map.
//!
//! Implemented as explicit match arms, not a generic `Merge` trait — the
//! teacher corpus resolves overrides the same way (plain conditionals) in
//! `config`'s keyassignment handling rather than via a merge-trait
//! abstraction, and XKB's merge semantics are a 4-way enum with no
//! recursive structure to justify more machinery.
//!
//! Conflict resolution per spec.md §4.3's table names `Override`'s and
//! `Replace`'s new-value-wins behavior explicitly; `Default` (no explicit
//! merge keyword on a statement or a bare `include` with no qualifier) is
//! resolved identically to `Augment` here — see DESIGN.md's "merge mode
//! defaults" entry for why.

use crate::types::MergeMode;

/// Applies `mode`'s semantics for combining `new` into `slot`:
///
/// - `Override`/`Replace`: `new` always wins.
/// - `Augment`/`Default`: `new` only fills an empty slot; an existing
///   entity is left alone (first declaration wins, matching
///   `xkb_compat`/`xkb_symbols`'s "first one sticks" default behavior).
pub fn merge_scalar<T>(slot: &mut Option<T>, new: T, mode: MergeMode) {
    match mode {
        MergeMode::Override | MergeMode::Replace => *slot = Some(new),
        MergeMode::Augment | MergeMode::Default => {
            if slot.is_none() {
                *slot = Some(new);
            }
        }
    }
}

/// Same decision as [`merge_scalar`], exposed as a bool for call sites that
/// already hold the existing value in a map entry (`BTreeMap`/`HashMap`
/// `.entry()` patterns don't fit the `Option<T>` shape above).
pub fn should_replace(already_present: bool, mode: MergeMode) -> bool {
    match mode {
        MergeMode::Override | MergeMode::Replace => true,
        MergeMode::Augment | MergeMode::Default => !already_present,
    }
}
