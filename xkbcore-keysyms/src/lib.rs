//! Keysym <-> Unicode conversion, standing in for the external keysym name
//! database that a real XKB implementation resolves against.
//!
//! This crate implements the *contract* spec'd for that collaborator (name
//! lookup, Unicode round-trip, a handful of case/class predicates) against a
//! compact builtin table rather than the full X11 keysym registry, which is
//! explicitly out of scope for this workspace.

mod error;
mod table;

pub use error::{Error, Result};

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Offset used to directly encode a Unicode code point as a keysym.
pub const UNICODE_OFFSET: u32 = 0x0100_0000;
/// Smallest keysym produced by direct Unicode encoding (code points below
/// 0x100 are already covered by the Latin-1 range and never encoded this
/// way).
pub const UNICODE_MIN: u32 = 0x0100_0100;
/// Largest keysym produced by direct Unicode encoding.
pub const UNICODE_MAX: u32 = 0x0110_ffff;
/// Longest name this crate's table ever returns from [`keysym_to_name`].
pub const NAME_MAX_SIZE: usize = 27;
/// Size of the buffer needed by [`keysym_to_utf8`] (4 UTF-8 bytes + NUL).
pub const UTF8_MAX_SIZE: usize = 5;

const NO_CONVERSION: u32 = 0;

fn is_surrogate(cp: u32) -> bool {
    (0xd800..=0xdfff).contains(&cp)
}

static NAME_TO_KEYSYM: Lazy<HashMap<&'static str, u32>> =
    Lazy::new(|| table::NAMED_KEYSYMS.iter().copied().collect());

static KEYSYM_TO_NAME: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(table::NAMED_KEYSYMS.len());
    // First entry wins so aliases (there are none today, but a future
    // addition shouldn't silently change the canonical spelling already in
    // the table) don't flip the canonical name around.
    for &(name, ks) in table::NAMED_KEYSYMS {
        map.entry(ks).or_insert(name);
    }
    map
});

/// Looks up a keysym by its textual name, e.g. `"Aogonek"` or `"a"`.
///
/// Falls back to treating a single-character name as a direct Latin-1
/// codepoint (so `"a"` resolves to keysym `0x61`, matching X11 convention
/// for printable ASCII/Latin-1 keysyms), and to parsing `0x...` / `U+...`
/// numeric literals.
pub fn name_to_keysym(name: &str, case_insensitive: bool) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    if let Some(&ks) = NAME_TO_KEYSYM.get(name) {
        return Some(ks);
    }
    if case_insensitive {
        if let Some(&(_, ks)) = table::NAMED_KEYSYMS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            return Some(ks);
        }
    }
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let cp = c as u32;
        if (0x0020..=0x007e).contains(&cp) || (0x00a0..=0x00ff).contains(&cp) {
            return Some(cp);
        }
    }
    parse_numeric_literal(name)
}

fn parse_numeric_literal(name: &str) -> Option<u32> {
    if let Some(hex) = name.strip_prefix("0x").or_else(|| name.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    if let Some(hex) = name.strip_prefix("U+").or_else(|| name.strip_prefix("u+")) {
        return u32::from_str_radix(hex, 16).ok().map(utf32_to_keysym);
    }
    None
}

/// Returns the canonical name of a keysym, if this crate's table knows one.
pub fn keysym_to_name(keysym: u32) -> Option<String> {
    if let Some(&name) = KEYSYM_TO_NAME.get(&keysym) {
        return Some(name.to_string());
    }
    if (0x0020..=0x007e).contains(&keysym) || (0x00a0..=0x00ff).contains(&keysym) {
        return char::from_u32(keysym).map(|c| c.to_string());
    }
    None
}

/// Converts a keysym to its Unicode scalar value, or `0` if the keysym has
/// no Unicode representation.
///
/// Mirrors `xkb_keysym_to_utf32`: Latin-1 keysyms map 1:1, a handful of
/// "special" control/editing/keypad keysyms map via `& 0x7f`, keysyms in
/// `[UNICODE_OFFSET, UNICODE_MAX]` decode by subtracting the offset, and
/// everything else falls back to a binary search of [`table::UNICODE_TABLE`].
pub fn keysym_to_utf32(keysym: u32) -> u32 {
    if (0x0020..=0x007e).contains(&keysym) || (0x00a0..=0x00ff).contains(&keysym) {
        return keysym;
    }

    const KP_SPACE: u32 = 0xff80;
    const SPACE: u32 = 0x0020;
    if keysym == KP_SPACE {
        return SPACE & 0x7f;
    }

    const BACKSPACE: u32 = 0xff08;
    const CLEAR: u32 = 0xff0b;
    const KP_MULTIPLY: u32 = 0xffaa;
    const KP_9: u32 = 0xffb9;
    const RETURN: u32 = 0xff0d;
    const ESCAPE: u32 = 0xff1b;
    const DELETE: u32 = 0xffff;
    const KP_TAB: u32 = 0xff89;
    const KP_ENTER: u32 = 0xff8d;
    const KP_EQUAL: u32 = 0xffbd;
    if (BACKSPACE..=CLEAR).contains(&keysym)
        || (KP_MULTIPLY..=KP_9).contains(&keysym)
        || keysym == RETURN
        || keysym == ESCAPE
        || keysym == DELETE
        || keysym == KP_TAB
        || keysym == KP_ENTER
        || keysym == KP_EQUAL
    {
        return keysym & 0x7f;
    }

    if is_surrogate(keysym) {
        return NO_CONVERSION;
    }

    if (UNICODE_OFFSET..=UNICODE_MAX).contains(&keysym) {
        return keysym - UNICODE_OFFSET;
    }

    match table::UNICODE_TABLE.binary_search_by_key(&keysym, |pair| pair.keysym) {
        Ok(idx) => table::UNICODE_TABLE[idx].ucs as u32,
        Err(_) => NO_CONVERSION,
    }
}

/// Converts a Unicode scalar value to a keysym.
///
/// Mirrors `xkb_utf32_to_keysym`: the inverse of [`keysym_to_utf32`], falling
/// back to direct `UNICODE_OFFSET` encoding when no named keysym exists for
/// the code point (and never returning a keysym for a deprecated table
/// entry).
pub fn utf32_to_keysym(cp: u32) -> u32 {
    const NO_SYMBOL: u32 = 0x0000_0000;
    const DELETE: u32 = 0xffff;

    if (0x0020..=0x007e).contains(&cp) || (0x00a0..=0x00ff).contains(&cp) {
        return cp;
    }

    const BACKSPACE_7F: u32 = 0xff08 & 0x7f;
    const CLEAR_7F: u32 = 0xff0b & 0x7f;
    const RETURN_7F: u32 = 0xff0d & 0x7f;
    const ESCAPE_7F: u32 = 0xff1b & 0x7f;
    if (BACKSPACE_7F..=CLEAR_7F).contains(&cp) || cp == RETURN_7F || cp == ESCAPE_7F {
        return cp | 0xff00;
    }
    if cp == (DELETE & 0x7f) {
        return DELETE;
    }

    if cp == 0 || is_surrogate(cp) || cp > 0x10ffff {
        return NO_SYMBOL;
    }

    for pair in table::UNICODE_TABLE {
        if pair.ucs as u32 == cp && !pair.deprecated {
            return pair.keysym;
        }
    }

    cp | UNICODE_OFFSET
}

/// Encodes a keysym as UTF-8 into `buf`, returning the number of bytes
/// written (`0` if the keysym has no Unicode representation).
pub fn keysym_to_utf8(keysym: u32, buf: &mut [u8; UTF8_MAX_SIZE]) -> usize {
    let cp = keysym_to_utf32(keysym);
    if cp == NO_CONVERSION {
        return 0;
    }
    match char::from_u32(cp) {
        Some(c) => {
            let s = c.encode_utf8(&mut buf[..4]);
            s.len()
        }
        None => 0,
    }
}

/// Whether `keysym` denotes a lowercase letter (via its Unicode mapping).
pub fn is_lower(keysym: u32) -> bool {
    let cp = keysym_to_utf32(keysym);
    cp != NO_CONVERSION && char::from_u32(cp).is_some_and(|c| c.is_lowercase())
}

/// Whether `keysym` denotes an uppercase (or titlecase) letter.
pub fn is_upper_or_title(keysym: u32) -> bool {
    let cp = keysym_to_utf32(keysym);
    cp != NO_CONVERSION && char::from_u32(cp).is_some_and(|c| c.is_uppercase())
}

/// Whether `keysym` is one of the numeric keypad keysyms (`KP_Space` ..
/// `KP_Equal`).
pub fn is_keypad(keysym: u32) -> bool {
    (0xff80..=0xffbd).contains(&keysym)
}

/// Whether `keysym` is a modifier keysym (Shift/Control/Alt/Meta/Super/Hyper,
/// Caps/Num/Scroll Lock, or an ISO level shift/latch/lock).
pub fn is_modifier(keysym: u32) -> bool {
    const NUM_LOCK: u32 = 0xff7f;
    const SCROLL_LOCK: u32 = 0xff14;
    (0xffe1..=0xffee).contains(&keysym)
        || keysym == NUM_LOCK
        || keysym == SCROLL_LOCK
        || (0xfe01..=0xfe05).contains(&keysym)
        || (0xfe11..=0xfe13).contains(&keysym)
}

/// Whether this crate's table (necessarily a subset of the full keysym
/// registry) recognizes `keysym` at all.
pub fn is_assigned(keysym: u32) -> bool {
    if keysym == 0 {
        return false;
    }
    if (0x0020..=0x007e).contains(&keysym) || (0x00a0..=0x00ff).contains(&keysym) {
        return true;
    }
    if (UNICODE_OFFSET..=UNICODE_MAX).contains(&keysym) {
        return true;
    }
    if KEYSYM_TO_NAME.contains_key(&keysym) {
        return true;
    }
    table::UNICODE_TABLE
        .binary_search_by_key(&keysym, |pair| pair.keysym)
        .is_ok()
}

/// Whether `keysym` is known to this table and flagged deprecated (e.g.
/// `Korean_Won`, superseded by `EuroSign`/direct Unicode encoding).
pub fn is_deprecated(keysym: u32) -> bool {
    table::UNICODE_TABLE
        .binary_search_by_key(&keysym, |pair| pair.keysym)
        .map(|idx| table::UNICODE_TABLE[idx].deprecated)
        .unwrap_or(false)
}

/// A keysym <-> Unicode conversion service, so callers (the linker/compiler
/// in `xkbcore`) can be generic over "the builtin table" versus a richer
/// database a consumer might supply.
pub trait Database: Send + Sync {
    fn name_to_keysym(&self, name: &str, case_insensitive: bool) -> Option<u32>;
    fn keysym_to_name(&self, keysym: u32) -> Option<String>;
    fn keysym_to_utf32(&self, keysym: u32) -> u32;
    fn utf32_to_keysym(&self, cp: u32) -> u32;
}

/// The builtin, zero-sized [`Database`] implementation backed by this
/// crate's free functions.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinDatabase;

impl Database for BuiltinDatabase {
    fn name_to_keysym(&self, name: &str, case_insensitive: bool) -> Option<u32> {
        name_to_keysym(name, case_insensitive)
    }

    fn keysym_to_name(&self, keysym: u32) -> Option<String> {
        keysym_to_name(keysym)
    }

    fn keysym_to_utf32(&self, keysym: u32) -> u32 {
        keysym_to_utf32(keysym)
    }

    fn utf32_to_keysym(&self, cp: u32) -> u32 {
        utf32_to_keysym(cp)
    }
}

/// The builtin database, usable without constructing anything.
pub static DEFAULT_DATABASE: BuiltinDatabase = BuiltinDatabase;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_round_trips() {
        for cp in 0x20u32..=0x7e {
            assert_eq!(keysym_to_utf32(utf32_to_keysym(cp)), cp);
        }
        for cp in 0xa0u32..=0xff {
            assert_eq!(keysym_to_utf32(utf32_to_keysym(cp)), cp);
        }
    }

    #[test]
    fn unicode_offset_round_trips() {
        for cp in [0x0100u32, 0x1234, 0xffff, 0x10ffff] {
            let ks = utf32_to_keysym(cp);
            assert_eq!(keysym_to_utf32(ks), cp);
        }
    }

    #[test]
    fn surrogates_never_convert() {
        assert_eq!(utf32_to_keysym(0xd800), 0);
        assert_eq!(keysym_to_utf32(0xd800), 0);
    }

    #[test]
    fn named_table_round_trips_through_name() {
        let ks = name_to_keysym("Aogonek", false).expect("Aogonek in table");
        assert_eq!(ks, 0x01a1);
        assert_eq!(keysym_to_name(ks).as_deref(), Some("Aogonek"));
        assert_eq!(keysym_to_utf32(ks), 0x0104);
    }

    #[test]
    fn single_char_name_is_latin1_direct() {
        assert_eq!(name_to_keysym("a", false), Some(0x61));
        assert_eq!(name_to_keysym("A", false), Some(0x41));
    }

    #[test]
    fn case_insensitive_lookup() {
        assert_eq!(name_to_keysym("SHIFT_L", true), Some(0xffe1));
        assert_eq!(name_to_keysym("SHIFT_L", false), None);
    }

    #[test]
    fn deprecated_flag_is_honored_in_reverse_lookup() {
        // Korean_Won (0x0eff) is deprecated in favor of EuroSign for U+20AC.
        assert_eq!(utf32_to_keysym(0x20ac), 0x20ac);
        assert!(is_deprecated(0x0eff));
        assert!(!is_deprecated(0x20ac));
    }

    #[test]
    fn predicates_on_known_keysyms() {
        assert!(is_modifier(0xffe1)); // Shift_L
        assert!(is_keypad(0xff96)); // KP_Left
        assert!(is_lower(0x61)); // a
        assert!(is_upper_or_title(0x41)); // A
        assert!(is_assigned(0x61));
        assert!(!is_assigned(0));
    }

    #[test]
    fn utf8_encoding_matches_utf32() {
        let mut buf = [0u8; UTF8_MAX_SIZE];
        let n = keysym_to_utf8(0x01a1, &mut buf); // Aogonek -> U+0104
        assert_eq!(&buf[..n], "Ą".as_bytes());
    }

    fn is_noncharacter(cp: u32) -> bool {
        (0xfdd0..=0xfdef).contains(&cp) || (cp & 0xfffe) == 0xfffe
    }

    /// spec.md §8.1's keysym<->codepoint property, over every scalar value
    /// above the Latin-1 range this crate handles specially.
    #[test]
    fn keysym_round_trips_every_scalar_value_above_latin1() {
        for cp in 0x100u32..=0x10ffff {
            if is_surrogate(cp) || is_noncharacter(cp) {
                continue;
            }
            assert_eq!(keysym_to_utf32(utf32_to_keysym(cp)), cp, "cp=U+{cp:04X}");
        }
    }

    #[test]
    fn builtin_database_delegates_to_free_functions() {
        let db = BuiltinDatabase;
        assert_eq!(db.name_to_keysym("a", false), name_to_keysym("a", false));
        assert_eq!(db.keysym_to_utf32(0x61), keysym_to_utf32(0x61));
    }
}
