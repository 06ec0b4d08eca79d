//! Pass 1: resolve the `xkb_keycodes` section into a name<->code table,
//! key aliases, and the group name table.

use std::collections::BTreeMap;

use crate::compiler::merge::should_replace;
use crate::linker::LinkedEntry;
use crate::parser::Statement;
use crate::types::{GroupNameTable, KeyAlias, Keycode, KeycodeName};

#[derive(Debug, Clone, Default)]
pub struct KeycodesResult {
    pub codes: BTreeMap<KeycodeName, Keycode>,
    pub aliases: Vec<KeyAlias>,
    pub group_names: GroupNameTable,
}

pub fn compile(entries: &[LinkedEntry]) -> KeycodesResult {
    let mut result = KeycodesResult::default();

    for entry in entries {
        match &entry.statement {
            Statement::KeycodeDef { name, code } => {
                let already = result.codes.contains_key(name);
                if should_replace(already, entry.merge) {
                    result.codes.insert(name.clone(), *code);
                } else if let Some(existing) = result.codes.get(name) {
                    if existing != code {
                        log::debug!(
                            "keycode {name} already bound to {existing}, keeping it over {code} (merge={:?})",
                            entry.merge
                        );
                    }
                }
            }
            Statement::AliasDef { alias, real } => {
                if !result.aliases.iter().any(|a| &a.alias == alias) {
                    result.aliases.push(KeyAlias { alias: alias.clone(), real: real.clone() });
                } else if matches!(
                    entry.merge,
                    crate::types::MergeMode::Override | crate::types::MergeMode::Replace
                ) {
                    if let Some(existing) = result.aliases.iter_mut().find(|a| &a.alias == alias) {
                        existing.real = real.clone();
                    }
                }
            }
            Statement::GroupNameDef { group, name } => {
                let already = result.group_names.names.contains_key(group);
                if should_replace(already, entry.merge) {
                    result.group_names.names.insert(*group, name.clone());
                }
            }
            _ => {
                log::warn!("unexpected statement in xkb_keycodes, ignoring");
            }
        }
    }

    result
}

impl KeycodesResult {
    /// Resolves an alias chain (aliases never chain to other aliases in
    /// practice, but nothing in the grammar forbids it, so this follows up
    /// to a small bound rather than looping forever on a cycle).
    pub fn resolve_keycode(&self, name: &KeycodeName) -> Option<Keycode> {
        if let Some(code) = self.codes.get(name) {
            return Some(*code);
        }
        let mut current = name;
        for _ in 0..8 {
            let alias = self.aliases.iter().find(|a| &a.alias == current)?;
            if let Some(code) = self.codes.get(&alias.real) {
                return Some(*code);
            }
            current = &alias.real;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::{Linker, NullIncludeResolver};

    #[test]
    fn resolves_aliases_to_codes() {
        let src = r#"
            xkb_keycodes "minimal" {
                <CAPS> = 66;
                alias <LOCK> = <CAPS>;
            };
        "#;
        let mut resolver = NullIncludeResolver;
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        let result = compile(&linked.keycodes);
        assert_eq!(result.resolve_keycode(&KeycodeName::from("LOCK")), Some(66));
    }

    #[test]
    fn augment_keeps_first_declaration() {
        let src = r#"
            xkb_keycodes "minimal" {
                <AC01> = 38;
                <AC01> = 99;
            };
        "#;
        let mut resolver = NullIncludeResolver;
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        let result = compile(&linked.keycodes);
        assert_eq!(result.codes[&KeycodeName::from("AC01")], 38);
    }
}
