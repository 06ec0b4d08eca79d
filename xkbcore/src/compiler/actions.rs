//! Parses the flattened `Name(arg = value, arg2 = value2)` action call text
//! `parser::collect_expression_text` produced back into an [`Action`].

use std::collections::BTreeMap;

use crate::action::{Action, ActionFlags, GroupDelta};
use crate::compiler::expr::{parse_controls_expr, parse_mod_expr};
use crate::error::{Error, Result};
use crate::types::KeycodeName;

struct Call {
    name: String,
    /// Keyed args (`key = value`) and bare positional args, both as raw
    /// (unsplit) value text — callers re-split multi-token values
    /// themselves since different arg kinds need different sub-parsers.
    named: BTreeMap<String, String>,
    positional: Vec<String>,
}

fn parse_call(text: &str) -> Call {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let name = tokens.first().copied().unwrap_or("NoAction").to_string();

    let mut named = BTreeMap::new();
    let mut positional = Vec::new();

    if tokens.get(1) == Some(&"(") {
        let inner_tokens = &tokens[2..];
        let close = inner_tokens.iter().position(|t| *t == ")").unwrap_or(inner_tokens.len());
        let inner = &inner_tokens[..close];
        for chunk in split_top_level_commas(inner) {
            if let Some(eq_pos) = chunk.iter().position(|t| *t == "=") {
                let key = chunk[..eq_pos].join(" ");
                let value = chunk[eq_pos + 1..].join(" ");
                named.insert(key, value);
            } else if !chunk.is_empty() {
                positional.push(chunk.join(" "));
            }
        }
    }

    Call { name, named, positional }
}

fn split_top_level_commas<'a>(tokens: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for &t in tokens {
        if t == "," {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(t);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn flags_from(call: &Call) -> ActionFlags {
    ActionFlags {
        clear_locks: call
            .named
            .get("clearLocks")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        latch_to_lock: call
            .named
            .get("latchToLock")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        no_lock: call.named.get("noLock").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false),
        no_unlock: call
            .named
            .get("noUnlock")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    }
}

fn group_delta(value: &str) -> GroupDelta {
    let trimmed = value.trim();
    if let Some(rest) = trimmed.strip_prefix('+') {
        GroupDelta::Relative(rest.trim().parse().unwrap_or(0))
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        GroupDelta::Relative(-rest.trim().parse().unwrap_or(0))
    } else {
        GroupDelta::Absolute(trimmed.parse().unwrap_or(1))
    }
}

pub fn parse_action(
    text: &str,
    vmods: &BTreeMap<String, u8>,
    lenient: bool,
) -> Result<Action> {
    let call = parse_call(text);
    let flags = flags_from(&call);

    let action = match call.name.as_str() {
        "NoAction" => Action::NoAction,
        "SetMods" => Action::SetMods {
            mods: call
                .named
                .get("modifiers")
                .or_else(|| call.named.get("mods"))
                .map(|m| parse_mod_expr(m, vmods))
                .unwrap_or_default(),
            flags,
        },
        "LatchMods" => Action::LatchMods {
            mods: call
                .named
                .get("modifiers")
                .or_else(|| call.named.get("mods"))
                .map(|m| parse_mod_expr(m, vmods))
                .unwrap_or_default(),
            flags,
        },
        "LockMods" => Action::LockMods {
            mods: call
                .named
                .get("modifiers")
                .or_else(|| call.named.get("mods"))
                .map(|m| parse_mod_expr(m, vmods))
                .unwrap_or_default(),
            flags,
        },
        "SetGroup" => Action::SetGroup {
            group: call.named.get("group").map(|g| group_delta(g)).unwrap_or(GroupDelta::Absolute(0)),
            flags,
        },
        "LatchGroup" => Action::LatchGroup {
            group: call.named.get("group").map(|g| group_delta(g)).unwrap_or(GroupDelta::Absolute(0)),
            flags,
        },
        "LockGroup" => Action::LockGroup {
            group: call.named.get("group").map(|g| group_delta(g)).unwrap_or(GroupDelta::Absolute(0)),
            flags,
        },
        "SetControls" => Action::SetControls {
            controls: call
                .named
                .get("controls")
                .map(|c| parse_controls_expr(c))
                .unwrap_or_default(),
        },
        "LockControls" => Action::LockControls {
            controls: call
                .named
                .get("controls")
                .map(|c| parse_controls_expr(c))
                .unwrap_or_default(),
            flags,
        },
        "TerminateServer" => Action::TerminateServer,
        "RedirectKey" => Action::RedirectKey {
            new_key: call
                .named
                .get("key")
                .map(|k| KeycodeName(k.trim_matches(|c| c == '<' || c == '>').to_string()))
                .unwrap_or_else(|| KeycodeName("".to_string())),
            mods_mask: call
                .named
                .get("mods")
                .map(|m| parse_mod_expr(m, vmods).real_mods)
                .unwrap_or_default(),
            mods: call
                .named
                .get("modifiers")
                .map(|m| parse_mod_expr(m, vmods).real_mods)
                .unwrap_or_default(),
            vmods_mask: Default::default(),
            vmods: Default::default(),
        },
        "MovePointer" => Action::MovePointer {
            x: call.named.get("x").and_then(|v| v.trim().parse().ok()).unwrap_or(0),
            y: call.named.get("y").and_then(|v| v.trim().parse().ok()).unwrap_or(0),
            accelerate: call
                .named
                .get("accelerate")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
        },
        "VoidAction" => Action::VoidAction,
        other => {
            if lenient {
                log::warn!("unrecognized action {other:?}, treating as NoAction");
                Action::NoAction
            } else {
                return Err(Error::Parse { line: 0, message: format!("unrecognized action {other:?}") });
            }
        }
    };
    let _ = call.positional;
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_mods() {
        let vmods = BTreeMap::new();
        let action = parse_action("SetMods ( modifiers = Shift )", &vmods, true).unwrap();
        match action {
            Action::SetMods { mods, .. } => {
                assert_eq!(mods.real_mods, crate::types::RealModMask::SHIFT)
            }
            other => panic!("expected SetMods, got {other:?}"),
        }
    }

    #[test]
    fn parses_lock_group_with_relative_delta() {
        let vmods = BTreeMap::new();
        let action = parse_action("LockGroup ( group = + 1 )", &vmods, true).unwrap();
        match action {
            Action::LockGroup { group, .. } => {
                assert_eq!(group, GroupDelta::Relative(1))
            }
            other => panic!("expected LockGroup, got {other:?}"),
        }
    }

    #[test]
    fn unknown_action_is_lenient_noop() {
        let vmods = BTreeMap::new();
        let action = parse_action("SomeFutureAction ( )", &vmods, true).unwrap();
        assert_eq!(action, Action::NoAction);
    }
}
