//! Integration tests exercising spec.md §8.2's end-to-end scenarios and the
//! §8.1 properties that don't fit naturally as a `#[cfg(test)]` unit test
//! colocated with a single module (they drive the compiler and the state
//! machine together). Scenarios already covered by `xkbcore::state`'s own
//! unit tests (plain-a, Shift+a, Caps Lock, RedirectKey, group wrap on
//! lock) aren't repeated here.

use xkbcore::compiler::CompileConfig;
use xkbcore::linker::NullIncludeResolver;
use xkbcore::{InputEvent, OutputEvent, State};
use xkbcore_keysyms::BuiltinDatabase;

fn compile(src: &str) -> xkbcore::Keymap {
    let mut resolver = NullIncludeResolver;
    let db = BuiltinDatabase;
    xkbcore::compile(src, &mut resolver, &db, &CompileConfig::default()).unwrap()
}

/// Scenario 3: a LatchGroup(+1) on K1 and a plain 'a' on K2. Pressing K2
/// between K1's down and up breaks the latch before it's ever consumed.
#[test]
fn group_latch_breaks_on_intervening_key() {
    let keymap = compile(
        r#"
        xkb_keymap {
            xkb_keycodes "m" {
                <K1> = 10;
                <K2> = 11;
            };
            xkb_compat "m" {
                interpret Mode_switch {
                    action = LatchGroup(group=+1);
                };
            };
            xkb_symbols "m" {
                key <K1> { [Mode_switch] };
                key <K2> { [a] };
            };
        };
        "#,
    );
    let mut state = State::new(keymap);

    state.process(InputEvent::KeyDown(10));
    state.process(InputEvent::KeyDown(11));
    state.process(InputEvent::KeyUp(11));
    state.process(InputEvent::KeyUp(10));

    assert_eq!(state.components().latched_group, 0);
    assert_eq!(state.effective_group(), 0);
}

/// Scenario 3's mirror case: K1 down, K1 up (no intervening key) latches
/// the group; a later unrelated key then breaks it.
#[test]
fn group_latch_holds_until_broken_by_a_later_key() {
    let keymap = compile(
        r#"
        xkb_keymap {
            xkb_keycodes "m" {
                <K1> = 10;
                <K2> = 11;
            };
            xkb_compat "m" {
                interpret Mode_switch {
                    action = LatchGroup(group=+1);
                };
            };
            xkb_symbols "m" {
                key <K1> { [Mode_switch] };
                key <K2> { [a] };
            };
        };
        "#,
    );
    let mut state = State::new(keymap);

    state.process(InputEvent::KeyDown(10));
    state.process(InputEvent::KeyUp(10));
    assert_eq!(state.components().latched_group, 1);
    assert_eq!(state.effective_group(), 1);

    state.process(InputEvent::KeyDown(11));
    assert_eq!(state.components().latched_group, 0);
    assert_eq!(state.effective_group(), 0);
    state.process(InputEvent::KeyUp(11));
}

/// §8.1 "Latch cancellation": a bare modifier latch broken by any
/// non-modifier key in between never reaches `latched_mods`.
#[test]
fn latch_cancellation_prevents_latched_mods() {
    let keymap = compile(
        r#"
        xkb_keymap {
            xkb_keycodes "m" {
                <LFSH> = 50;
                <AC01> = 38;
            };
            xkb_compat "m" {
                interpret Shift_L {
                    action = LatchMods(modifiers=Shift);
                };
            };
            xkb_symbols "m" {
                key <LFSH> { [Shift_L] };
                key <AC01> { [a] };
            };
        };
        "#,
    );
    let mut state = State::new(keymap);

    state.process(InputEvent::KeyDown(50));
    state.process(InputEvent::KeyDown(38));
    state.process(InputEvent::KeyUp(38));
    state.process(InputEvent::KeyUp(50));

    assert_eq!(state.components().latched_mods, xkbcore::types::RealModMask::empty());
}

/// §8.1 "Modifier canonicalization": two virtual modifiers bound to the
/// same real modifier are indistinguishable to every query.
#[test]
fn virtual_modifiers_with_equal_real_binding_are_indistinguishable() {
    let keymap = compile(
        r#"
        xkb_keymap {
            xkb_keycodes "m" {
                <LALT> = 64;
                <RALT> = 108;
            };
            xkb_types "m" {
                virtual_modifiers Alt1,Alt2;
            };
            xkb_symbols "m" {
                key <LALT> {
                    vmods = Alt1;
                    [NoSymbol]
                };
                key <RALT> {
                    vmods = Alt2;
                    [NoSymbol]
                };
                modifier_map Mod1 { <LALT>, <RALT> };
            };
        };
        "#,
    );
    let v1 = keymap.virtual_modifier_index("Alt1").unwrap();
    let v2 = keymap.virtual_modifier_index("Alt2").unwrap();
    assert_ne!(v1, v2, "distinct virtual modifiers");
    assert_eq!(
        keymap.real_mods_for(xkbcore::types::VirtualModMask::bit(v1)),
        keymap.real_mods_for(xkbcore::types::VirtualModMask::bit(v2)),
        "both resolve to the same real-modifier mask (Mod1), so every state query treats them alike"
    );
}

/// §8.1 "Deterministic events": the same keymap driven by the same input
/// sequence twice produces byte-identical (here: value-identical, since
/// events aren't textual) output both times.
#[test]
fn same_input_sequence_produces_identical_events_across_runs() {
    let src = r#"
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
    "#;

    let run = || {
        let keymap = compile(src);
        let mut state = State::new(keymap);
        let mut events: Vec<OutputEvent> = Vec::new();
        events.extend(state.process(InputEvent::KeyDown(50)));
        events.extend(state.process(InputEvent::KeyDown(38)));
        events.extend(state.process(InputEvent::KeyUp(38)));
        events.extend(state.process(InputEvent::KeyUp(50)));
        events
    };

    assert_eq!(run(), run());
}

/// §8.1 "Round-trip": `parse(serialize(keymap))` compiles cleanly and
/// preserves the keys that matter for runtime behavior.
#[test]
fn serialized_keymap_recompiles_to_equivalent_behavior() {
    let keymap = compile(
        r#"
        xkb_keymap {
            xkb_keycodes "m" { <AC01> = 38; };
            xkb_symbols "m" { key <AC01> { [a] }; };
        };
        "#,
    );
    let text = keymap.serialize();
    let recompiled = compile(&text);
    assert_eq!(recompiled.min_keycode(), keymap.min_keycode());
    assert_eq!(recompiled.max_keycode(), keymap.max_keycode());
    assert_eq!(
        recompiled.key_by_keycode(38).unwrap().groups[0].levels[0].keysyms[0],
        keymap.key_by_keycode(38).unwrap().groups[0].levels[0].keysyms[0],
    );
}
