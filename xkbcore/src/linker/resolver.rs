use crate::parser::SectionKind;

/// Resolves an `include` statement's file reference to source bytes plus a
/// canonical name for diagnostics.
///
/// File I/O and the RMLVO/include-path search used to find a named
/// component are both out of scope for this crate (spec.md §1's
/// Non-goals) — a consumer wires this trait up to its own file system or
/// embedded-resource lookup and hands the resolver to [`crate::linker::Linker`].
pub trait IncludeResolver {
    fn resolve(&mut self, file_name: &str, section: SectionKind) -> Option<(Vec<u8>, String)>;
}

/// An [`IncludeResolver`] that never resolves anything, for keymaps known
/// to have no includes (every end-to-end test keymap in this crate uses
/// this).
#[derive(Debug, Default)]
pub struct NullIncludeResolver;

impl IncludeResolver for NullIncludeResolver {
    fn resolve(&mut self, _file_name: &str, _section: SectionKind) -> Option<(Vec<u8>, String)> {
        None
    }
}
