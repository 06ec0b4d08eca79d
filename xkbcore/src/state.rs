//! The runtime state machine: tracks base/latched/locked modifiers and
//! group, applies key actions, and emits output events in the order
//! spec'd by the level-selection and latch/lock rules below.
//!
//! Grounded on `xkb_state`'s update/serialize contract in the original C
//! sources, reshaped around an explicit input/output event pair instead of
//! the C API's "mutate in place, then ask what changed" style — this crate
//! has no equivalent of `xkb_state_update_key`'s implicit global, so the
//! change set is returned directly from each call.

use bitflags::bitflags;
use std::collections::BTreeMap;

use crate::action::{Action, ActionFlags, GroupDelta};
use crate::keymap::Keymap;
use crate::types::{ComponentMask, Controls, GroupIndex, Keycode, Keysym, LedMask, RealModMask};

bitflags! {
    /// Which field(s) of [`StateComponents`] an update call actually
    /// touched; carried on [`OutputEvent::ComponentsChange`] (spec.md
    /// §4.6.1's `changed: bitset`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeMask: u32 {
        const BASE_MODS      = 1 << 0;
        const LATCHED_MODS   = 1 << 1;
        const LOCKED_MODS    = 1 << 2;
        const EFFECTIVE_MODS = 1 << 3;
        const BASE_GROUP      = 1 << 4;
        const LATCHED_GROUP   = 1 << 5;
        const LOCKED_GROUP    = 1 << 6;
        const EFFECTIVE_GROUP = 1 << 7;
        const LEDS     = 1 << 8;
        const CONTROLS = 1 << 9;
    }
}

/// Snapshot of everything the state machine tracks (spec.md §3.4). Group
/// components are signed and unwrapped except `locked_group`, which is
/// always stored already wrapped to `[0, num_groups)` the moment it's set
/// (locking is the one place a raw out-of-range value is meaningless to
/// keep around); `effective_group` below is always the wrapped sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateComponents {
    pub base_mods: RealModMask,
    pub latched_mods: RealModMask,
    pub locked_mods: RealModMask,
    pub base_group: i32,
    pub latched_group: i32,
    pub locked_group: GroupIndex,
    pub leds: LedMask,
    pub controls: Controls,
}

impl StateComponents {
    pub fn effective_mods(&self) -> RealModMask {
        self.base_mods | self.latched_mods | self.locked_mods
    }

    pub fn effective_group(&self, num_groups: GroupIndex) -> GroupIndex {
        let sum = self.base_group + self.latched_group + self.locked_group as i32;
        wrap_group_i32(sum, num_groups)
    }
}

fn wrap_group_i32(target: i32, num_groups: GroupIndex) -> GroupIndex {
    if num_groups == 0 {
        return 0;
    }
    let n = num_groups as i32;
    (((target % n) + n) % n) as GroupIndex
}

/// Input events the state machine consumes (spec.md §4.6.1, §6.2, §6.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Keycode),
    KeyUp(Keycode),
    UpdateControls { affect: Controls, values: Controls },
    /// Maps to the spec's `UpdateLatchLock(affect_mods, mods,
    /// affect_group_latched?, group_latched_value, affect_locked_mods,
    /// locked_mods, affect_locked_group?, group_locked_value)`: the two
    /// `affect_*_mods` masks gate which real-modifier bits the
    /// accompanying value replaces, the two `affect_locked_group`/
    /// `affect_group_latched` flags gate whether the group value applies.
    UpdateLatchLock {
        affect_latched_mods: RealModMask,
        latched_mods: RealModMask,
        affect_latched_group: bool,
        latched_group_value: i32,
        affect_locked_mods: RealModMask,
        locked_mods: RealModMask,
        affect_locked_group: bool,
        locked_group_value: i32,
    },
    /// Sets every mod/group component at once, for synchronizing from an
    /// external authority (spec.md §6.3).
    UpdateMask {
        base_mods: RealModMask,
        latched_mods: RealModMask,
        locked_mods: RealModMask,
        base_group: i32,
        latched_group: i32,
        locked_group: i32,
    },
}

/// Output events, emitted in the fixed order spec.md §4.6.5 describes: a
/// single aggregated `ComponentsChange` before the `KeyDown`/`KeyUp` it
/// accompanies, then another after if the release itself caused further
/// changes (e.g. a latch resolving into `latched_mods`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    KeyDown(Keycode),
    KeyUp(Keycode),
    ComponentsChange { changed: ChangeMask, components: StateComponents },
}

#[derive(Debug, Clone, Copy)]
struct PendingLatch {
    keycode: Keycode,
    created_at_seq: u64,
}

/// A live instance of a [`Keymap`]: owns the mutable runtime components
/// and applies key events against the keymap's immutable tables. Cheap to
/// create from a cloned `Keymap` handle; not `Send`/`Sync`-shared across
/// threads at the same time (spec.md §5 — each thread gets its own
/// `State` cloned from the shared keymap).
#[derive(Debug, Clone)]
pub struct State {
    keymap: Keymap,
    components: StateComponents,
    seq: u64,
    pending_latches: Vec<PendingLatch>,
    /// Per-keycode: did this key's last completed latch resolve without
    /// being broken? Consulted so a second consecutive `latchToLock`
    /// latch of the same key promotes straight to a lock (spec.md
    /// §4.6.3's "previous release of the same key was also a latch").
    latch_history: BTreeMap<Keycode, bool>,
    /// Keys currently down due to a `RedirectKey` action on some other
    /// key, so the matching `KeyUp` can emit the mirrored release.
    redirects: BTreeMap<Keycode, RedirectState>,
}

#[derive(Debug, Clone, Copy)]
struct RedirectState {
    target: Keycode,
}

impl State {
    pub fn new(keymap: Keymap) -> Self {
        let mut state = State {
            keymap,
            components: StateComponents::default(),
            seq: 0,
            pending_latches: Vec::new(),
            latch_history: BTreeMap::new(),
            redirects: BTreeMap::new(),
        };
        state.components.leds = state.compute_leds();
        state
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn components(&self) -> StateComponents {
        self.components
    }

    pub fn effective_mods(&self) -> RealModMask {
        self.components.effective_mods()
    }

    pub fn effective_group(&self) -> GroupIndex {
        self.components.effective_group(self.keymap.num_groups())
    }

    /// Dispatches one input event, returning the output events it
    /// produced in emission order.
    pub fn process(&mut self, event: InputEvent) -> Vec<OutputEvent> {
        match event {
            InputEvent::KeyDown(kc) => self.key_down(kc),
            InputEvent::KeyUp(kc) => self.key_up(kc),
            InputEvent::UpdateControls { affect, values } => self.update_controls(affect, values),
            InputEvent::UpdateLatchLock {
                affect_latched_mods,
                latched_mods,
                affect_latched_group,
                latched_group_value,
                affect_locked_mods,
                locked_mods,
                affect_locked_group,
                locked_group_value,
            } => self.update_latch_lock(
                affect_latched_mods,
                latched_mods,
                affect_latched_group,
                latched_group_value,
                affect_locked_mods,
                locked_mods,
                affect_locked_group,
                locked_group_value,
            ),
            InputEvent::UpdateMask { base_mods, latched_mods, locked_mods, base_group, latched_group, locked_group } => {
                self.update_mask(base_mods, latched_mods, locked_mods, base_group, latched_group, locked_group)
            }
        }
    }

    /// Returns the first keysym of the key's active level (spec.md §8.2
    /// scenario 1's `get_one_sym`), or `0` (`NoSymbol`) if the keycode is
    /// unbound or out of range.
    pub fn key_get_one_sym(&self, keycode: Keycode) -> Keysym {
        self.key_get_syms(keycode).first().copied().unwrap_or(0)
    }

    pub fn key_get_syms(&self, keycode: Keycode) -> Vec<Keysym> {
        let Some(key) = self.keymap.key_by_keycode(keycode) else { return Vec::new() };
        let Some((_, level)) = self.resolve_group_level(key) else { return Vec::new() };
        level.keysyms.clone()
    }

    /// `serialize(components, which)` for the modifier family (spec.md
    /// §4.6.6): the bitwise OR of the requested sub-fields.
    pub fn serialize_mods(&self, which: ComponentMask) -> RealModMask {
        let mut out = RealModMask::empty();
        if which.contains(ComponentMask::BASE) {
            out |= self.components.base_mods;
        }
        if which.contains(ComponentMask::LATCHED) {
            out |= self.components.latched_mods;
        }
        if which.contains(ComponentMask::LOCKED) {
            out |= self.components.locked_mods;
        }
        if which.contains(ComponentMask::EFFECTIVE) {
            out |= self.components.effective_mods();
        }
        out
    }

    /// `serialize(components, which)` for the layout family: the sum of
    /// the requested group sub-fields (a group is an index, not a
    /// bitmask, so summing rather than OR-ing is what makes the result
    /// meaningful — mirrors `xkb_state_serialize_layout`).
    pub fn serialize_layout(&self, which: ComponentMask) -> i32 {
        let mut out = 0i32;
        if which.contains(ComponentMask::BASE) {
            out += self.components.base_group;
        }
        if which.contains(ComponentMask::LATCHED) {
            out += self.components.latched_group;
        }
        if which.contains(ComponentMask::LOCKED) {
            out += self.components.locked_group as i32;
        }
        if which.contains(ComponentMask::EFFECTIVE) {
            out += self.effective_group() as i32;
        }
        out
    }

    /// Checks whether `i` is the active group for the requested
    /// component. `locked`/`effective` compare after wrapping; `base`/
    /// `latched` compare the raw, unwrapped value (spec.md §4.6.6).
    pub fn layout_index_is_active(&self, i: i32, which: ComponentMask) -> bool {
        (which.contains(ComponentMask::BASE) && self.components.base_group == i)
            || (which.contains(ComponentMask::LATCHED) && self.components.latched_group == i)
            || (which.contains(ComponentMask::LOCKED) && self.components.locked_group as i32 == i)
            || (which.contains(ComponentMask::EFFECTIVE) && self.effective_group() as i32 == i)
    }

    fn resolve_group_level<'a>(
        &self,
        key: &'a crate::types::Key,
    ) -> Option<(GroupIndex, &'a crate::types::KeyLevel)> {
        if key.groups.is_empty() {
            return None;
        }
        let group_count = key.groups.len() as GroupIndex;
        let sum = self.components.base_group + self.components.latched_group + self.components.locked_group as i32;
        let group = wrap_group_i32(sum, group_count);
        let key_group = &key.groups[group as usize];
        let ty = self.keymap.key_type(&key_group.type_name);
        let level = match ty {
            Some(ty) => ty.level_for_mods(self.effective_mods()),
            None => 0,
        };
        let level = key_group.levels.get(level as usize).or_else(|| key_group.levels.first())?;
        Some((group, level))
    }

    fn key_down(&mut self, keycode: Keycode) -> Vec<OutputEvent> {
        self.seq += 1;
        let mut out = Vec::new();
        self.mark_latches_broken_by_other_key(keycode);

        let Some(key) = self.keymap.key_by_keycode(keycode).cloned() else {
            return out;
        };
        let Some((_, level)) = self.resolve_group_level(&key) else {
            out.push(OutputEvent::KeyDown(keycode));
            return out;
        };
        let actions = level.actions.clone();

        let before = self.components;
        for action in &actions {
            self.apply_action_down(keycode, action);
        }
        self.emit_change_if_any(&mut out, before);

        for action in &actions {
            if let Action::RedirectKey { new_key, mods_mask, mods, .. } = action {
                if let Some(target) = self.keymap.resolve_keycode(new_key) {
                    let overridden = (self.effective_mods() & !*mods_mask) | (*mods & *mods_mask);
                    out.push(OutputEvent::ComponentsChange {
                        changed: ChangeMask::EFFECTIVE_MODS,
                        components: StateComponents { base_mods: overridden, ..self.components },
                    });
                    out.push(OutputEvent::KeyDown(target));
                    self.redirects.insert(keycode, RedirectState { target });
                } else {
                    // redirected key doesn't exist: degrades to NoAction
                    // (spec.md §4.6.3).
                }
            }
        }

        if !self.redirects.contains_key(&keycode) {
            out.push(OutputEvent::KeyDown(keycode));
        }

        out
    }

    fn key_up(&mut self, keycode: Keycode) -> Vec<OutputEvent> {
        self.seq += 1;
        let mut out = Vec::new();
        self.mark_latches_broken_by_other_key(keycode);

        if let Some(redirect) = self.redirects.remove(&keycode) {
            out.push(OutputEvent::KeyUp(redirect.target));
            out.push(OutputEvent::ComponentsChange {
                changed: ChangeMask::EFFECTIVE_MODS,
                components: self.components,
            });
            return out;
        }

        let Some(key) = self.keymap.key_by_keycode(keycode).cloned() else {
            return out;
        };
        let Some((_, level)) = self.resolve_group_level(&key) else {
            out.push(OutputEvent::KeyUp(keycode));
            return out;
        };
        let actions = level.actions.clone();

        let before = self.components;
        for action in &actions {
            self.apply_action_up(keycode, action);
        }
        self.emit_change_if_any(&mut out, before);
        out.push(OutputEvent::KeyUp(keycode));

        out
    }

    fn mark_latches_broken_by_other_key(&mut self, keycode: Keycode) {
        for pending in &mut self.pending_latches {
            if pending.keycode != keycode && pending.created_at_seq < self.seq {
                pending.created_at_seq = u64::MAX;
            }
        }
    }

    fn apply_action_down(&mut self, keycode: Keycode, action: &Action) {
        let sticky = self.components.controls.contains(Controls::STICKY_KEYS);
        match action {
            Action::SetMods { mods, flags } if sticky => {
                self.begin_latch_mods(keycode, mods.mask, *flags);
            }
            Action::SetMods { mods, flags } => {
                if flags.clear_locks {
                    self.components.locked_mods = self.components.locked_mods & !mods.mask;
                }
                self.components.base_mods |= mods.mask;
            }
            Action::LatchMods { mods, flags } => {
                self.begin_latch_mods(keycode, mods.mask, *flags);
            }
            Action::LockMods { mods, flags } => {
                if flags.clear_locks {
                    self.components.locked_mods = RealModMask::empty();
                }
                self.components.base_mods |= mods.mask;
            }
            Action::SetGroup { group, .. } => {
                self.components.base_group = wrap_group_i32(
                    self.apply_group_delta(self.components.base_group, *group),
                    self.keymap.num_groups(),
                ) as i32;
            }
            Action::LatchGroup { group, flags } => {
                self.begin_latch_group(keycode, *group, *flags);
            }
            Action::LockGroup { group, .. } => {
                let target = self.apply_group_delta(self.components.locked_group as i32, *group);
                self.components.locked_group = wrap_group_i32(target, self.keymap.num_groups());
            }
            Action::SetControls { controls } => {
                self.set_controls(*controls, *controls);
            }
            Action::LockControls { controls, .. } => {
                self.set_controls(*controls, *controls);
            }
            // RedirectKey is handled in `key_down`, which has access to
            // the output event stream the temporary override needs.
            Action::RedirectKey { .. } => {}
            _ => {}
        }
        self.components.leds = self.compute_leds();
    }

    fn apply_action_up(&mut self, keycode: Keycode, action: &Action) {
        match action {
            Action::SetMods { mods, .. } => {
                self.components.base_mods &= !mods.mask;
            }
            Action::LatchMods { mods, flags } => {
                self.resolve_latch_mods(keycode, mods.mask, *flags);
            }
            Action::LockMods { mods, flags } => {
                self.components.base_mods &= !mods.mask;
                if !flags.no_unlock {
                    self.components.locked_mods ^= mods.mask;
                }
            }
            Action::SetGroup { .. } => {
                self.components.base_group = 0;
            }
            Action::LatchGroup { group, flags } => {
                self.resolve_latch_group(keycode, *group, *flags);
            }
            Action::LockGroup { .. } => {}
            _ => {}
        }
        self.components.leds = self.compute_leds();
    }

    fn apply_group_delta(&self, current: i32, delta: GroupDelta) -> i32 {
        match delta {
            GroupDelta::Absolute(g) => g as i32,
            GroupDelta::Relative(d) => current + d as i32,
        }
    }

    fn begin_latch_mods(&mut self, keycode: Keycode, mods: RealModMask, _flags: ActionFlags) {
        self.components.base_mods |= mods;
        self.pending_latches.push(PendingLatch { keycode, created_at_seq: self.seq });
    }

    fn begin_latch_group(&mut self, keycode: Keycode, group: GroupDelta, _flags: ActionFlags) {
        let target = self.apply_group_delta(self.components.base_group, group);
        self.components.base_group = target;
        self.pending_latches.push(PendingLatch { keycode, created_at_seq: self.seq });
    }

    fn take_pending(&mut self, keycode: Keycode) -> Option<PendingLatch> {
        let idx = self.pending_latches.iter().position(|p| p.keycode == keycode)?;
        Some(self.pending_latches.remove(idx))
    }

    fn resolve_latch_mods(&mut self, keycode: Keycode, mods: RealModMask, flags: ActionFlags) {
        let Some(pending) = self.take_pending(keycode) else {
            self.components.base_mods &= !mods;
            return;
        };
        let broken = pending.created_at_seq == u64::MAX;
        self.components.base_mods &= !mods;
        if broken {
            self.latch_history.insert(keycode, false);
            if flags.clear_locks {
                self.components.locked_mods &= !mods;
            }
            return;
        }

        let previous_was_latch = self.latch_history.get(&keycode).copied().unwrap_or(false);
        if flags.latch_to_lock && previous_was_latch {
            self.components.locked_mods ^= mods;
            self.latch_history.insert(keycode, false);
        } else {
            self.components.latched_mods |= mods;
            self.latch_history.insert(keycode, true);
        }
    }

    fn resolve_latch_group(&mut self, keycode: Keycode, group: GroupDelta, flags: ActionFlags) {
        let Some(pending) = self.take_pending(keycode) else { return };
        let broken = pending.created_at_seq == u64::MAX;
        self.components.base_group = 0;
        if broken {
            self.latch_history.insert(keycode, false);
            if flags.clear_locks {
                // spec.md §9 open question: this crate clears the lock
                // when a clearLocks group-latch is broken by another
                // key, see DESIGN.md.
                self.components.locked_group = 0;
            }
            return;
        }

        let previous_was_latch = self.latch_history.get(&keycode).copied().unwrap_or(false);
        let target = self.apply_group_delta(0, group);
        if flags.latch_to_lock && previous_was_latch {
            self.components.locked_group =
                wrap_group_i32(self.components.locked_group as i32 + target, self.keymap.num_groups());
            self.latch_history.insert(keycode, false);
        } else {
            self.components.latched_group = target;
            self.latch_history.insert(keycode, true);
        }
    }

    fn set_controls(&mut self, affect: Controls, values: Controls) {
        let was_sticky = self.components.controls.contains(Controls::STICKY_KEYS);
        self.components.controls = (self.components.controls & !affect) | (values & affect);
        let now_sticky = self.components.controls.contains(Controls::STICKY_KEYS);
        if was_sticky && !now_sticky {
            // spec.md §8.1 "sticky clear on disable"
            self.components.latched_mods = RealModMask::empty();
            self.components.latched_group = 0;
            self.pending_latches.clear();
        }
    }

    fn update_controls(&mut self, affect: Controls, values: Controls) -> Vec<OutputEvent> {
        let before = self.components;
        self.set_controls(affect, values);
        self.components.leds = self.compute_leds();
        let mut out = Vec::new();
        self.emit_change_if_any(&mut out, before);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn update_latch_lock(
        &mut self,
        affect_latched_mods: RealModMask,
        latched_mods: RealModMask,
        affect_latched_group: bool,
        latched_group_value: i32,
        affect_locked_mods: RealModMask,
        locked_mods: RealModMask,
        affect_locked_group: bool,
        locked_group_value: i32,
    ) -> Vec<OutputEvent> {
        let before = self.components;
        self.components.latched_mods =
            (self.components.latched_mods & !affect_latched_mods) | (latched_mods & affect_latched_mods);
        if affect_latched_group {
            self.components.latched_group = latched_group_value;
        }
        self.components.locked_mods =
            (self.components.locked_mods & !affect_locked_mods) | (locked_mods & affect_locked_mods);
        if affect_locked_group {
            self.components.locked_group = wrap_group_i32(locked_group_value, self.keymap.num_groups());
        }
        self.components.leds = self.compute_leds();
        let mut out = Vec::new();
        self.emit_change_if_any(&mut out, before);
        out
    }

    fn update_mask(
        &mut self,
        base_mods: RealModMask,
        latched_mods: RealModMask,
        locked_mods: RealModMask,
        base_group: i32,
        latched_group: i32,
        locked_group: i32,
    ) -> Vec<OutputEvent> {
        let before = self.components;
        self.components.base_mods = base_mods;
        self.components.latched_mods = latched_mods;
        self.components.locked_mods = locked_mods;
        self.components.base_group = base_group;
        self.components.latched_group = latched_group;
        self.components.locked_group = wrap_group_i32(locked_group, self.keymap.num_groups());
        self.components.leds = self.compute_leds();
        let mut out = Vec::new();
        self.emit_change_if_any(&mut out, before);
        out
    }

    fn emit_change_if_any(&self, out: &mut Vec<OutputEvent>, before: StateComponents) {
        let changed = self.diff(before);
        if !changed.is_empty() {
            out.push(OutputEvent::ComponentsChange { changed, components: self.components });
        }
    }

    fn diff(&self, before: StateComponents) -> ChangeMask {
        let mut changed = ChangeMask::empty();
        let num_groups = self.keymap.num_groups();
        if before.base_mods != self.components.base_mods {
            changed |= ChangeMask::BASE_MODS;
        }
        if before.latched_mods != self.components.latched_mods {
            changed |= ChangeMask::LATCHED_MODS;
        }
        if before.locked_mods != self.components.locked_mods {
            changed |= ChangeMask::LOCKED_MODS;
        }
        if before.effective_mods() != self.components.effective_mods() {
            changed |= ChangeMask::EFFECTIVE_MODS;
        }
        if before.base_group != self.components.base_group {
            changed |= ChangeMask::BASE_GROUP;
        }
        if before.latched_group != self.components.latched_group {
            changed |= ChangeMask::LATCHED_GROUP;
        }
        if before.locked_group != self.components.locked_group {
            changed |= ChangeMask::LOCKED_GROUP;
        }
        if before.effective_group(num_groups) != self.components.effective_group(num_groups) {
            changed |= ChangeMask::EFFECTIVE_GROUP;
        }
        if before.leds != self.components.leds {
            changed |= ChangeMask::LEDS;
        }
        if before.controls != self.components.controls {
            changed |= ChangeMask::CONTROLS;
        }
        changed
    }

    /// Evaluates every declared indicator against the current components.
    /// An indicator is lit iff every non-empty condition among its
    /// modifier predicate, group predicate, and controls predicate holds
    /// (spec.md §4.4.5; a criterion left unset is vacuously satisfied).
    fn compute_leds(&self) -> LedMask {
        let mut leds = LedMask::EMPTY;
        for ind in self.keymap.indicators() {
            if self.indicator_active(ind) {
                leds = leds | LedMask::bit(ind.index);
            }
        }
        leds
    }

    fn indicator_active(&self, ind: &crate::types::IndicatorMap) -> bool {
        let mods_ok = if ind.mods.mask.is_empty() {
            true
        } else {
            let which = if ind.which_mods.is_empty() { ComponentMask::EFFECTIVE } else { ind.which_mods };
            (self.serialize_mods(which) & ind.mods.mask) != RealModMask::empty()
        };
        let groups_ok = if ind.groups.is_empty() {
            true
        } else {
            let which = if ind.which_groups.is_empty() { ComponentMask::EFFECTIVE } else { ind.which_groups };
            ind.groups.iter().any(|&g| self.layout_index_is_active(g as i32, which))
        };
        let controls_ok = if ind.controls.is_empty() {
            true
        } else {
            (self.components.controls & ind.controls) == ind.controls
        };
        mods_ok && groups_ok && controls_ok
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

    /// Scenario 1 (spec.md §8.2): a plain 'a' key produces its keysym and
    /// no component change.
    #[test]
    fn plain_a_emits_no_components_change() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <AC01> = 1; };
                xkb_symbols "m" { key <AC01> { [a] }; };
            };
            "#,
        );
        let mut state = State::new(keymap);
        let out = state.process(InputEvent::KeyDown(1));
        assert_eq!(out, vec![OutputEvent::KeyDown(1)]);
        assert_eq!(state.key_get_one_sym(1), 0x0061);
    }

    /// Scenario 2: Shift+a with a TWO_LEVEL type.
    #[test]
    fn shift_plus_a_selects_upper_level() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" {
                    <LFSH> = 50;
                    <AC01> = 38;
                };
                xkb_compat "m" {
                    interpret Shift_L {
                        action = SetMods(modifiers=Shift);
                    };
                };
                xkb_symbols "m" {
                    key <LFSH> { [Shift_L] };
                    key <AC01> { [a, A] };
                };
            };
            "#,
        );
        let mut state = State::new(keymap);
        let down1 = state.process(InputEvent::KeyDown(50));
        assert!(matches!(down1[0], OutputEvent::ComponentsChange { .. }));
        assert!(matches!(down1[1], OutputEvent::KeyDown(50)));

        let down2 = state.process(InputEvent::KeyDown(38));
        assert_eq!(down2, vec![OutputEvent::KeyDown(38)]);
        assert_eq!(state.key_get_one_sym(38), 0x0041);
    }

    /// Scenario 4: Caps Lock toggles `locked_mods` and its LED.
    #[test]
    fn caps_lock_toggles_locked_mods_and_led() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <CAPS> = 66; };
                xkb_compat "m" {
                    interpret Caps_Lock {
                        action = LockMods(modifiers=Lock);
                    };
                    indicator "Caps Lock" {
                        modifiers = Lock;
                    };
                };
                xkb_symbols "m" { key <CAPS> { [Caps_Lock] }; };
            };
            "#,
        );
        let mut state = State::new(keymap);
        state.process(InputEvent::KeyDown(66));
        state.process(InputEvent::KeyUp(66));
        assert_eq!(state.components().locked_mods, RealModMask::LOCK);
        assert!(state.components().leds.contains(LedMask::bit(0)));

        state.process(InputEvent::KeyDown(66));
        state.process(InputEvent::KeyUp(66));
        assert_eq!(state.components().locked_mods, RealModMask::empty());
    }

    #[test]
    fn sticky_clear_on_disable_resets_latches() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <LFSH> = 50; };
                xkb_compat "m" {
                    interpret Shift_L {
                        action = LatchMods(modifiers=Shift);
                    };
                };
                xkb_symbols "m" { key <LFSH> { [Shift_L] }; };
            };
            "#,
        );
        let mut state = State::new(keymap);
        state.process(InputEvent::UpdateControls { affect: Controls::STICKY_KEYS, values: Controls::STICKY_KEYS });
        state.process(InputEvent::KeyDown(50));
        state.process(InputEvent::KeyUp(50));
        assert_eq!(state.components().latched_mods, RealModMask::SHIFT);

        let out = state.process(InputEvent::UpdateControls { affect: Controls::STICKY_KEYS, values: Controls::empty() });
        assert_eq!(state.components().latched_mods, RealModMask::empty());
        assert!(matches!(out.as_slice(), [OutputEvent::ComponentsChange { .. }]));
    }

    /// Pressing a `latchToLock` sticky modifier twice in a row (latch,
    /// consume it by pressing the same key again before anything else
    /// breaks it) promotes the latch to a lock on the second press,
    /// mirroring `original_source/test/state-machine.c`'s `test_sticky_keys`.
    #[test]
    fn sticky_keys_promotes_to_lock_after_two_latches() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <LFSH> = 50; };
                xkb_compat "m" {
                    interpret Shift_L {
                        action = LatchMods(modifiers=Shift,latchToLock=true);
                    };
                };
                xkb_symbols "m" { key <LFSH> { [Shift_L] }; };
            };
            "#,
        );
        let mut state = State::new(keymap);

        state.process(InputEvent::KeyDown(50));
        state.process(InputEvent::KeyUp(50));
        assert_eq!(state.components().latched_mods, RealModMask::SHIFT);
        assert_eq!(state.components().locked_mods, RealModMask::empty());

        state.process(InputEvent::KeyDown(50));
        state.process(InputEvent::KeyUp(50));
        assert_eq!(state.components().locked_mods, RealModMask::SHIFT);
        assert_eq!(state.components().latched_mods, RealModMask::empty());
    }

    #[test]
    fn group_wrap_on_lock_clamps_to_declared_groups() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" { <AC01> = 38; };
                xkb_symbols "m" { key <AC01> { [a, b, c] }; };
            };
            "#,
        );
        let mut state = State::new(keymap.clone());
        state.process(InputEvent::UpdateMask {
            base_mods: RealModMask::empty(),
            latched_mods: RealModMask::empty(),
            locked_mods: RealModMask::empty(),
            base_group: 0,
            latched_group: 0,
            locked_group: 5,
        });
        assert_eq!(state.components().locked_group, 5 % keymap.num_groups());
    }

    /// Scenario 5: a `RedirectKey` action emits the temporary-override
    /// change, the redirected key's down, and the mirrored restore on
    /// release, without ever perturbing the real modifier state.
    #[test]
    fn redirect_key_emits_override_and_restore() {
        let keymap = compile(
            r#"
            xkb_keymap {
                xkb_keycodes "m" {
                    <AC01> = 38;
                    <AC02> = 39;
                };
                xkb_compat "m" {
                    interpret Redirect_Example {
                        action = RedirectKey(key=<AC02>, mods=Shift+Control, modifiers=Shift);
                    };
                };
                xkb_symbols "m" {
                    key <AC01> { [Redirect_Example] };
                    key <AC02> { [s] };
                };
            };
            "#,
        );
        let mut state = State::new(keymap);
        state.process(InputEvent::UpdateMask {
            base_mods: RealModMask::empty(),
            latched_mods: RealModMask::empty(),
            locked_mods: RealModMask::CONTROL,
            base_group: 0,
            latched_group: 0,
            locked_group: 0,
        });

        let down = state.process(InputEvent::KeyDown(38));
        match &down[0] {
            OutputEvent::ComponentsChange { components, .. } => {
                assert_eq!(components.base_mods, RealModMask::SHIFT);
            }
            other => panic!("expected ComponentsChange, got {other:?}"),
        }
        assert_eq!(down[1], OutputEvent::KeyDown(39));
        assert_eq!(state.components().locked_mods, RealModMask::CONTROL);

        let up = state.process(InputEvent::KeyUp(38));
        assert_eq!(up[0], OutputEvent::KeyUp(39));
        assert_eq!(state.components().locked_mods, RealModMask::CONTROL);
    }
}
