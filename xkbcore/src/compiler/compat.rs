//! Pass 3: resolve `xkb_compat`'s `interpret` and `indicator` statements.

use std::collections::BTreeMap;

use crate::action::Action;
use crate::compiler::actions::parse_action;
use crate::compiler::expr::parse_mod_expr;
use crate::error::Result;
use crate::linker::LinkedEntry;
use crate::parser::{KeyFieldStatement, Statement};
use crate::types::{Controls, IndicatorMap, Interpret, Mods};
use xkbcore_keysyms::Database;

#[derive(Debug, Default)]
pub struct CompatResult {
    pub interprets: Vec<Interpret>,
    pub indicators: Vec<IndicatorMap>,
}

pub fn compile(
    entries: &[LinkedEntry],
    vmods: &BTreeMap<String, u8>,
    db: &dyn Database,
    lenient: bool,
) -> Result<CompatResult> {
    let mut result = CompatResult::default();
    let mut next_led_index = 0u8;

    for entry in entries {
        match &entry.statement {
            Statement::InterpretDef { matcher, body } => {
                let keysym = matcher
                    .keysym
                    .as_ref()
                    .filter(|name| !name.eq_ignore_ascii_case("Any"))
                    .and_then(|name| db.name_to_keysym(name, true));
                let (mods, match_exact) = match &matcher.mod_predicate {
                    None => (Mods::default(), false),
                    Some(text) => parse_interpret_mods(text, vmods),
                };

                let mut action = None;
                let mut virtual_mod = None;
                let mut repeat = None;
                for field in body {
                    match field {
                        KeyFieldStatement::Action(text) => {
                            action = Some(parse_action(text, vmods, lenient)?)
                        }
                        KeyFieldStatement::VirtualModifier(name) => {
                            virtual_mod = vmods.get(name.trim()).copied();
                        }
                        KeyFieldStatement::Repeat(value) => repeat = Some(*value),
                        _ => {}
                    }
                }

                result.interprets.push(Interpret {
                    keysym,
                    mods,
                    match_exact,
                    action,
                    virtual_mod,
                    repeat,
                    declaration_order: entry.order,
                });
            }
            Statement::IndicatorDef { name, body } => {
                let mut map = IndicatorMap {
                    name: name.clone(),
                    index: next_led_index,
                    ..Default::default()
                };
                next_led_index = next_led_index.saturating_add(1);
                for field in body {
                    match field {
                        KeyFieldStatement::Modifiers { mods, .. } => {
                            map.mods = parse_mod_expr(mods, vmods);
                        }
                        KeyFieldStatement::WhichModState(text) => {
                            map.which_mods = crate::compiler::expr::parse_component_mask(text);
                        }
                        KeyFieldStatement::Groups { groups, .. } => {
                            map.groups = groups.clone();
                        }
                        KeyFieldStatement::WhichGroupState(text) => {
                            map.which_groups = crate::compiler::expr::parse_component_mask(text);
                        }
                        KeyFieldStatement::Controls(text) => {
                            map.controls = crate::compiler::expr::parse_controls_expr(text);
                        }
                        _ => {}
                    }
                }
                result.indicators.push(map);
            }
            _ => {
                log::warn!("unexpected statement in xkb_compat, ignoring");
            }
        }
    }

    Ok(result)
}

/// `"AnyOf(all)"`/`"AnyOfOrNone(Shift)"` match as a subset; a bare
/// modifier expression like `"Shift+Lock"` must match exactly.
fn parse_interpret_mods(text: &str, vmods: &BTreeMap<String, u8>) -> (Mods, bool) {
    let trimmed = text.trim();
    for prefix in ["AnyOfOrNone", "AnyOf", "NoneOf", "AllOf", "Exactly"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            let inner = rest.trim().trim_start_matches('(').trim_end_matches(')');
            let exact = prefix == "Exactly" || prefix == "AllOf";
            return (parse_mod_expr(inner, vmods), exact);
        }
    }
    (parse_mod_expr(trimmed, vmods), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::{Linker, NullIncludeResolver};
    use xkbcore_keysyms::BuiltinDatabase;

    #[test]
    fn compiles_interpret_with_action() {
        let src = r#"
            xkb_compat "minimal" {
                interpret Shift_L + AnyOf(all) {
                    action = SetMods(modifiers=Shift);
                };
            };
        "#;
        let mut resolver = NullIncludeResolver;
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        let db = BuiltinDatabase;
        let vmods = BTreeMap::new();
        let result = compile(&linked.compat, &vmods, &db, true).unwrap();
        assert_eq!(result.interprets.len(), 1);
        assert!(result.interprets[0].keysym.is_some());
        assert!(matches!(result.interprets[0].action, Some(Action::SetMods { .. })));
    }

    #[test]
    fn compiles_indicator_with_modifiers() {
        let src = r#"
            xkb_compat "minimal" {
                indicator "Caps Lock" {
                    modifiers = Lock;
                };
            };
        "#;
        let mut resolver = NullIncludeResolver;
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        let db = BuiltinDatabase;
        let vmods = BTreeMap::new();
        let result = compile(&linked.compat, &vmods, &db, true).unwrap();
        assert_eq!(result.indicators.len(), 1);
        assert_eq!(result.indicators[0].mods.real_mods, crate::types::RealModMask::LOCK);
    }
}
