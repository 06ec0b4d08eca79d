//! Include resolution and entity-grained merging.
//!
//! Collapses a keymap's `xkb_keymap { xkb_keycodes {...}; xkb_types {...};
//! ... }` source (plus everything it `include`s, recursively) into one
//! merged [`LinkedSection`] per section kind, with every statement tagged
//! with the [`MergeMode`] that applies to it and a single monotonically
//! increasing declaration-order counter spanning the whole merge (used to
//! break interpret ties, see DESIGN.md).

mod resolver;

pub use resolver::{IncludeResolver, NullIncludeResolver};

use crate::error::{Error, Result};
use crate::parser::{KeymapFile, Parser, SectionKind, Statement};
use crate::types::MergeMode;

const DEFAULT_MAX_INCLUDE_DEPTH: u32 = 32;

#[derive(Debug, Clone)]
pub struct LinkedEntry {
    pub statement: Statement,
    pub merge: MergeMode,
    pub order: u32,
}

#[derive(Debug, Clone, Default)]
pub struct LinkedSection {
    pub keycodes: Vec<LinkedEntry>,
    pub types: Vec<LinkedEntry>,
    pub compat: Vec<LinkedEntry>,
    pub symbols: Vec<LinkedEntry>,
}

pub struct Linker<'a> {
    resolver: &'a mut dyn IncludeResolver,
    max_include_depth: u32,
    next_order: u32,
    depth: u32,
    in_progress: Vec<String>,
}

impl<'a> Linker<'a> {
    pub fn new(resolver: &'a mut dyn IncludeResolver) -> Self {
        Linker {
            resolver,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            next_order: 0,
            depth: 0,
            in_progress: Vec::new(),
        }
    }

    pub fn with_max_include_depth(mut self, depth: u32) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Parses and links `source`, following `include` statements through
    /// `self.resolver`, and returns one merged, order-tagged entry list per
    /// section kind.
    pub fn link(&mut self, source: &str) -> Result<LinkedSection> {
        let file = Parser::new(source).parse()?;
        let mut out = LinkedSection::default();
        self.merge_file(file, &mut out)?;
        Ok(out)
    }

    fn merge_file(&mut self, file: KeymapFile, out: &mut LinkedSection) -> Result<()> {
        for section in file.sections {
            let kind = section.kind;
            for (merge, statement) in section.statements {
                if let Statement::Include { merge: include_merge, target } = &statement {
                    self.merge_include(kind, target, *include_merge, out)?;
                    continue;
                }
                let order = self.next_order;
                self.next_order += 1;
                let bucket = bucket_mut(out, kind);
                bucket.push(LinkedEntry { statement, merge, order });
            }
        }
        Ok(())
    }

    fn merge_include(
        &mut self,
        kind: SectionKind,
        target: &str,
        merge: MergeMode,
        out: &mut LinkedSection,
    ) -> Result<()> {
        if self.depth >= self.max_include_depth {
            return Err(Error::IncludeDepthExceeded(target.to_string(), self.max_include_depth));
        }
        if self.in_progress.iter().any(|f| f == target) {
            return Err(Error::IncludeCycle(target.to_string()));
        }
        let (bytes, _canonical_name) = self
            .resolver
            .resolve(target, kind)
            .ok_or_else(|| Error::UnresolvedInclude(target.to_string()))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        self.depth += 1;
        self.in_progress.push(target.to_string());
        let file = Parser::new(&text).parse();
        self.in_progress.pop();
        self.depth -= 1;
        let file = file?;

        let mut included = LinkedSection::default();
        self.merge_file(file, &mut included)?;

        // The include's own merge qualifier applies to every entity it
        // contributes, overriding whatever merge mode its statements were
        // individually tagged with (spec.md §4.3: the include qualifier is
        // the merge mode for the whole included file).
        for entry in bucket_mut(&mut included, kind).drain(..) {
            bucket_mut(out, kind).push(LinkedEntry { merge, ..entry });
        }
        Ok(())
    }
}

fn bucket_mut(out: &mut LinkedSection, kind: SectionKind) -> &mut Vec<LinkedEntry> {
    match kind {
        SectionKind::Keycodes => &mut out.keycodes,
        SectionKind::Types => &mut out.types,
        SectionKind::Compat => &mut out.compat,
        SectionKind::Symbols => &mut out.symbols,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_single_file_with_no_includes() {
        let src = r#"
            xkb_keycodes "minimal" {
                <AC01> = 38;
            };
        "#;
        let mut resolver = NullIncludeResolver;
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        assert_eq!(linked.keycodes.len(), 1);
    }

    #[test]
    fn unresolved_include_is_an_error() {
        let src = r#"
            xkb_keycodes "minimal" {
                include "evdev";
            };
        "#;
        let mut resolver = NullIncludeResolver;
        let err = Linker::new(&mut resolver).link(src).unwrap_err();
        assert!(matches!(err, Error::UnresolvedInclude(_)));
    }

    struct StringResolver(Vec<(&'static str, &'static str)>);
    impl IncludeResolver for StringResolver {
        fn resolve(&mut self, file_name: &str, _section: SectionKind) -> Option<(Vec<u8>, String)> {
            self.0
                .iter()
                .find(|(name, _)| *name == file_name)
                .map(|(name, body)| (body.as_bytes().to_vec(), name.to_string()))
        }
    }

    #[test]
    fn include_merge_mode_applies_to_every_contributed_entry() {
        let included = r#"
            xkb_keycodes "base" {
                <AC01> = 38;
                <AC02> = 39;
            };
        "#;
        let src = r#"
            xkb_keycodes "minimal" {
                override include "base";
            };
        "#;
        let mut resolver = StringResolver(vec![("base", included)]);
        let linked = Linker::new(&mut resolver).link(src).unwrap();
        assert_eq!(linked.keycodes.len(), 2);
        assert!(linked.keycodes.iter().all(|e| matches!(e.merge, MergeMode::Override)));
    }

    #[test]
    fn include_cycle_is_detected() {
        struct CyclicResolver;
        impl IncludeResolver for CyclicResolver {
            fn resolve(&mut self, _file_name: &str, _section: SectionKind) -> Option<(Vec<u8>, String)> {
                Some((
                    br#"xkb_keycodes "x" { include "self"; };"#.to_vec(),
                    "self".to_string(),
                ))
            }
        }
        let src = r#"xkb_keycodes "x" { include "self"; };"#;
        let mut resolver = CyclicResolver;
        let err = Linker::new(&mut resolver).link(src).unwrap_err();
        assert!(matches!(err, Error::IncludeCycle(_)));
    }
}
