//! Small textual-expression parsing shared by the types/compat/symbols
//! passes, for the modifier/controls/group expressions the statement-level
//! parser deferred (see `parser::collect_expression_text`).

use std::collections::BTreeMap;

use crate::types::{ComponentMask, Controls, Mods, RealModMask, VirtualModMask};

/// Splits `"Shift + Lock"` / `"Shift+Lock"` / `"none"` / `"all"` into real
/// and virtual modifier components. `vmods` maps a declared virtual
/// modifier's name to its allocated bit index.
pub fn parse_mod_expr(text: &str, vmods: &BTreeMap<String, u8>) -> Mods {
    let mut real = RealModMask::empty();
    let mut virt = VirtualModMask::EMPTY;

    for raw in text.split(|c: char| c == '+' || c.is_whitespace()) {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        if name.eq_ignore_ascii_case("none") {
            continue;
        }
        if name.eq_ignore_ascii_case("all") {
            real |= RealModMask::all();
            continue;
        }
        if let Some(bit) = RealModMask::from_name(name) {
            real |= bit;
        } else if let Some(&idx) = vmods.get(name) {
            virt |= VirtualModMask::bit(idx);
        } else {
            log::warn!("unresolved modifier name {name:?} in expression {text:?}");
        }
    }

    Mods { mask: real, real_mods: real, vmods: virt }
}

/// Splits a comma-separated name list, e.g. `virtual_modifiers
/// NumLock,Alt;`'s body text or a `modifier_map` key list.
pub fn parse_name_list(text: &str) -> Vec<String> {
    text.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Parses a `controls = ...` expression against the fixed canonical
/// control names.
pub fn parse_controls_expr(text: &str) -> Controls {
    let mut controls = Controls::empty();
    for raw in text.split(|c: char| c == '+' || c.is_whitespace()) {
        let name = raw.trim();
        let flag = match name.to_ascii_lowercase().as_str() {
            "" => continue,
            "repeatkeys" => Controls::REPEAT_KEYS,
            "slowkeys" => Controls::SLOW_KEYS,
            "bouncekeys" => Controls::BOUNCE_KEYS,
            "stickykeys" => Controls::STICKY_KEYS,
            "mousekeys" => Controls::MOUSE_KEYS,
            "mousekeysaccel" => Controls::MOUSE_KEYS_ACCEL,
            "accessxkeys" => Controls::ACCESS_X_KEYS,
            "accessxtimeout" => Controls::ACCESS_X_TIMEOUT,
            "accessxfeedback" => Controls::ACCESS_X_FEEDBACK,
            "audiblebell" => Controls::AUDIBLE_BELL,
            "overlay1" => Controls::OVERLAY1,
            "overlay2" => Controls::OVERLAY2,
            "groupswrap" => Controls::GROUPS_WRAP,
            "internalmods" => Controls::INTERNAL_MODS,
            "ignoregrouplock" => Controls::IGNORE_GROUP_LOCK,
            "perkeyrepeat" => Controls::PER_KEY_REPEAT,
            "all" => Controls::all(),
            "none" => continue,
            other => {
                log::warn!("unknown control name {other:?}");
                continue;
            }
        };
        controls |= flag;
    }
    controls
}

/// Parses a `whichModState`/`whichGroupState` expression, e.g.
/// `"base+latched"`, `"locked"`, or `"any"` (spec.md §4.4.5).
pub fn parse_component_mask(text: &str) -> ComponentMask {
    let mut mask = ComponentMask::empty();
    for raw in text.split(|c: char| c == '+' || c.is_whitespace()) {
        let name = raw.trim();
        mask |= match name.to_ascii_lowercase().as_str() {
            "" => continue,
            "base" => ComponentMask::BASE,
            "latched" => ComponentMask::LATCHED,
            "locked" => ComponentMask::LOCKED,
            "effective" => ComponentMask::EFFECTIVE,
            "compat" => ComponentMask::COMPAT,
            "any" => ComponentMask::ANY,
            other => {
                log::warn!("unknown state component name {other:?}");
                continue;
            }
        };
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_combined_real_and_virtual_mods() {
        let mut vmods = BTreeMap::new();
        vmods.insert("NumLock".to_string(), 0u8);
        let mods = parse_mod_expr("Shift + NumLock", &vmods);
        assert_eq!(mods.real_mods, RealModMask::SHIFT);
        assert_eq!(mods.vmods, VirtualModMask::bit(0));
    }

    #[test]
    fn all_expands_to_every_real_modifier() {
        let vmods = BTreeMap::new();
        let mods = parse_mod_expr("all", &vmods);
        assert_eq!(mods.real_mods, RealModMask::all());
    }

    #[test]
    fn parses_controls_list() {
        let controls = parse_controls_expr("StickyKeys+RepeatKeys");
        assert!(controls.contains(Controls::STICKY_KEYS));
        assert!(controls.contains(Controls::REPEAT_KEYS));
        assert!(!controls.contains(Controls::SLOW_KEYS));
    }
}
