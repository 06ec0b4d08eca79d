//! Builtin keysym tables.
//!
//! `NAMED_KEYSYMS` is a curated, alphabetically-unordered slice of
//! `(name, keysym)` pairs covering the ASCII punctuation names, the
//! editing/navigation/function/keypad/modifier keysyms, and a handful of
//! dead-key and Latin-2..9 letters. It is not a port of the ~2400-entry
//! explicit keysym table (out of scope); it exists so the conversion
//! contract has real, checkable names to exercise.
//!
//! `UNICODE_TABLE` is a subset of the public-domain `keysymtab[]` table from
//! `keysym-utf.c`, kept SORTED ascending by keysym value because
//! [`crate::keysym_to_utf32`] binary-searches it.

pub(crate) struct CodePair {
    pub keysym: u32,
    pub deprecated: bool,
    pub ucs: u32,
}

pub(crate) const NAMED_KEYSYMS: &[(&str, u32)] = &[
    ("NoSymbol", 0x0000_0000),
    ("VoidSymbol", 0x00ff_ffff),
    ("space", 0x0020),
    ("exclam", 0x0021),
    ("quotedbl", 0x0022),
    ("numbersign", 0x0023),
    ("dollar", 0x0024),
    ("percent", 0x0025),
    ("ampersand", 0x0026),
    ("apostrophe", 0x0027),
    ("parenleft", 0x0028),
    ("parenright", 0x0029),
    ("asterisk", 0x002a),
    ("plus", 0x002b),
    ("comma", 0x002c),
    ("minus", 0x002d),
    ("period", 0x002e),
    ("slash", 0x002f),
    ("colon", 0x003a),
    ("semicolon", 0x003b),
    ("less", 0x003c),
    ("equal", 0x003d),
    ("greater", 0x003e),
    ("question", 0x003f),
    ("at", 0x0040),
    ("bracketleft", 0x005b),
    ("backslash", 0x005c),
    ("bracketright", 0x005d),
    ("asciicircum", 0x005e),
    ("underscore", 0x005f),
    ("grave", 0x0060),
    ("braceleft", 0x007b),
    ("bar", 0x007c),
    ("braceright", 0x007d),
    ("asciitilde", 0x007e),
    ("BackSpace", 0xff08),
    ("Tab", 0xff09),
    ("Linefeed", 0xff0a),
    ("Clear", 0xff0b),
    ("Return", 0xff0d),
    ("Pause", 0xff13),
    ("Scroll_Lock", 0xff14),
    ("Escape", 0xff1b),
    ("Delete", 0xffff),
    ("Multi_key", 0xff20),
    ("Home", 0xff50),
    ("Left", 0xff51),
    ("Up", 0xff52),
    ("Right", 0xff53),
    ("Down", 0xff54),
    ("Page_Up", 0xff55),
    ("Page_Down", 0xff56),
    ("End", 0xff57),
    ("Begin", 0xff58),
    ("Insert", 0xff63),
    ("Num_Lock", 0xff7f),
    ("KP_Space", 0xff80),
    ("KP_Tab", 0xff89),
    ("KP_Enter", 0xff8d),
    ("KP_F1", 0xff91),
    ("KP_F2", 0xff92),
    ("KP_F3", 0xff93),
    ("KP_F4", 0xff94),
    ("KP_Home", 0xff95),
    ("KP_Left", 0xff96),
    ("KP_Up", 0xff97),
    ("KP_Right", 0xff98),
    ("KP_Down", 0xff99),
    ("KP_Page_Up", 0xff9a),
    ("KP_Page_Down", 0xff9b),
    ("KP_End", 0xff9c),
    ("KP_Begin", 0xff9d),
    ("KP_Insert", 0xff9e),
    ("KP_Delete", 0xff9f),
    ("KP_Multiply", 0xffaa),
    ("KP_Add", 0xffab),
    ("KP_Separator", 0xffac),
    ("KP_Subtract", 0xffad),
    ("KP_Decimal", 0xffae),
    ("KP_Divide", 0xffaf),
    ("KP_0", 0xffb0),
    ("KP_1", 0xffb1),
    ("KP_2", 0xffb2),
    ("KP_3", 0xffb3),
    ("KP_4", 0xffb4),
    ("KP_5", 0xffb5),
    ("KP_6", 0xffb6),
    ("KP_7", 0xffb7),
    ("KP_8", 0xffb8),
    ("KP_9", 0xffb9),
    ("KP_Equal", 0xffbd),
    ("F1", 0xffbe),
    ("F2", 0xffbf),
    ("F3", 0xffc0),
    ("F4", 0xffc1),
    ("F5", 0xffc2),
    ("F6", 0xffc3),
    ("F7", 0xffc4),
    ("F8", 0xffc5),
    ("F9", 0xffc6),
    ("F10", 0xffc7),
    ("F11", 0xffc8),
    ("F12", 0xffc9),
    ("F13", 0xffca),
    ("F14", 0xffcb),
    ("F15", 0xffcc),
    ("F16", 0xffcd),
    ("F17", 0xffce),
    ("F18", 0xffcf),
    ("F19", 0xffd0),
    ("F20", 0xffd1),
    ("F21", 0xffd2),
    ("F22", 0xffd3),
    ("F23", 0xffd4),
    ("F24", 0xffd5),
    ("F25", 0xffd6),
    ("F26", 0xffd7),
    ("F27", 0xffd8),
    ("F28", 0xffd9),
    ("F29", 0xffda),
    ("F30", 0xffdb),
    ("F31", 0xffdc),
    ("F32", 0xffdd),
    ("F33", 0xffde),
    ("F34", 0xffdf),
    ("F35", 0xffe0),
    ("Shift_L", 0xffe1),
    ("Shift_R", 0xffe2),
    ("Control_L", 0xffe3),
    ("Control_R", 0xffe4),
    ("Caps_Lock", 0xffe5),
    ("Shift_Lock", 0xffe6),
    ("Meta_L", 0xffe7),
    ("Meta_R", 0xffe8),
    ("Alt_L", 0xffe9),
    ("Alt_R", 0xffea),
    ("Super_L", 0xffeb),
    ("Super_R", 0xffec),
    ("Hyper_L", 0xffed),
    ("Hyper_R", 0xffee),
    ("ISO_Lock", 0xfe01),
    ("ISO_Level2_Latch", 0xfe02),
    ("ISO_Level3_Shift", 0xfe03),
    ("ISO_Level3_Latch", 0xfe04),
    ("ISO_Level3_Lock", 0xfe05),
    ("ISO_Level5_Shift", 0xfe11),
    ("ISO_Level5_Latch", 0xfe12),
    ("ISO_Level5_Lock", 0xfe13),
    // a representative slice of the Latin-2/Latin-9 letters, grounded on
    // the keysymtab[] entries in keysym-utf.c (same codepoints as
    // UNICODE_TABLE below).
    ("Aogonek", 0x01a1),
    ("Lstroke", 0x01a3),
    ("Scaron", 0x01a9),
    ("Zacute", 0x01ac),
    ("Zcaron", 0x01ae),
    ("aogonek", 0x01b1),
    ("lstroke", 0x01b3),
    ("scaron", 0x01b9),
    ("zacute", 0x01bc),
    ("zcaron", 0x01be),
    ("Racute", 0x01c0),
    ("Abreve", 0x01c3),
    ("Lacute", 0x01c5),
    ("Cacute", 0x01c6),
    ("Ccaron", 0x01c8),
    ("Eogonek", 0x01ca),
    ("Ecaron", 0x01cc),
    ("Dcaron", 0x01cf),
    ("Dstroke", 0x01d0),
    ("Nacute", 0x01d1),
    ("Ncaron", 0x01d2),
    ("OE", 0x13bc),
    ("oe", 0x13bd),
    ("Ydiaeresis", 0x13be),
    ("EuroSign", 0x20ac),
];

/// SPDX-SnippetBegin
/// Subset derived from the public-domain `keysymtab[]` table in
/// `keysym-utf.c` (Markus G. Kuhn, University of Cambridge, April 2001).
/// SPDX-SnippetEnd
pub(crate) const UNICODE_TABLE: &[CodePair] = &[
    CodePair { keysym: 0x01a1, deprecated: false, ucs: 0x0104 },
    CodePair { keysym: 0x01a2, deprecated: false, ucs: 0x02d8 },
    CodePair { keysym: 0x01a3, deprecated: false, ucs: 0x0141 },
    CodePair { keysym: 0x01a5, deprecated: false, ucs: 0x013d },
    CodePair { keysym: 0x01a6, deprecated: false, ucs: 0x015a },
    CodePair { keysym: 0x01a9, deprecated: false, ucs: 0x0160 },
    CodePair { keysym: 0x01aa, deprecated: false, ucs: 0x015e },
    CodePair { keysym: 0x01ab, deprecated: false, ucs: 0x0164 },
    CodePair { keysym: 0x01ac, deprecated: false, ucs: 0x0179 },
    CodePair { keysym: 0x01ae, deprecated: false, ucs: 0x017d },
    CodePair { keysym: 0x01af, deprecated: false, ucs: 0x017b },
    CodePair { keysym: 0x01b1, deprecated: false, ucs: 0x0105 },
    CodePair { keysym: 0x01b2, deprecated: false, ucs: 0x02db },
    CodePair { keysym: 0x01b3, deprecated: false, ucs: 0x0142 },
    CodePair { keysym: 0x01b5, deprecated: false, ucs: 0x013e },
    CodePair { keysym: 0x01b6, deprecated: false, ucs: 0x015b },
    CodePair { keysym: 0x01b7, deprecated: false, ucs: 0x02c7 },
    CodePair { keysym: 0x01b9, deprecated: false, ucs: 0x0161 },
    CodePair { keysym: 0x01ba, deprecated: false, ucs: 0x015f },
    CodePair { keysym: 0x01bb, deprecated: false, ucs: 0x0165 },
    CodePair { keysym: 0x01bc, deprecated: false, ucs: 0x017a },
    CodePair { keysym: 0x01bd, deprecated: false, ucs: 0x02dd },
    CodePair { keysym: 0x01be, deprecated: false, ucs: 0x017e },
    CodePair { keysym: 0x01bf, deprecated: false, ucs: 0x017c },
    CodePair { keysym: 0x01c0, deprecated: false, ucs: 0x0154 },
    CodePair { keysym: 0x01c3, deprecated: false, ucs: 0x0102 },
    CodePair { keysym: 0x01c5, deprecated: false, ucs: 0x0139 },
    CodePair { keysym: 0x01c6, deprecated: false, ucs: 0x0106 },
    CodePair { keysym: 0x01c8, deprecated: false, ucs: 0x010c },
    CodePair { keysym: 0x01ca, deprecated: false, ucs: 0x0118 },
    CodePair { keysym: 0x01cc, deprecated: false, ucs: 0x011a },
    CodePair { keysym: 0x01cf, deprecated: false, ucs: 0x010e },
    CodePair { keysym: 0x01d0, deprecated: false, ucs: 0x0110 },
    CodePair { keysym: 0x01d1, deprecated: false, ucs: 0x0143 },
    CodePair { keysym: 0x01d2, deprecated: false, ucs: 0x0147 },
    CodePair { keysym: 0x01d5, deprecated: false, ucs: 0x0150 },
    CodePair { keysym: 0x01d8, deprecated: false, ucs: 0x0158 },
    CodePair { keysym: 0x01d9, deprecated: false, ucs: 0x016e },
    CodePair { keysym: 0x01db, deprecated: false, ucs: 0x0170 },
    CodePair { keysym: 0x01de, deprecated: false, ucs: 0x0162 },
    CodePair { keysym: 0x01e0, deprecated: false, ucs: 0x0155 },
    CodePair { keysym: 0x01e3, deprecated: false, ucs: 0x0103 },
    CodePair { keysym: 0x01e5, deprecated: false, ucs: 0x013a },
    CodePair { keysym: 0x01e6, deprecated: false, ucs: 0x0107 },
    CodePair { keysym: 0x0ef4, deprecated: false, ucs: 0x3184 },
    CodePair { keysym: 0x0ef5, deprecated: false, ucs: 0x3186 },
    CodePair { keysym: 0x0ef6, deprecated: false, ucs: 0x318d },
    CodePair { keysym: 0x0ef7, deprecated: false, ucs: 0x318e },
    CodePair { keysym: 0x0ef8, deprecated: false, ucs: 0x11eb },
    CodePair { keysym: 0x0ef9, deprecated: false, ucs: 0x11f0 },
    CodePair { keysym: 0x0efa, deprecated: false, ucs: 0x11f9 },
    CodePair { keysym: 0x0eff, deprecated: true, ucs: 0x20a9 },
    CodePair { keysym: 0x13bc, deprecated: false, ucs: 0x0152 },
    CodePair { keysym: 0x13bd, deprecated: false, ucs: 0x0153 },
    CodePair { keysym: 0x13be, deprecated: false, ucs: 0x0178 },
    CodePair { keysym: 0x20ac, deprecated: false, ucs: 0x20ac },
];
