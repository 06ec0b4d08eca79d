use crate::types::KeycodeName;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// All the ways compiling or driving a keymap can fail.
///
/// Compilation is all-or-nothing: the first error aborts the pass that
/// raised it and is returned to the caller. The state machine, by
/// contrast, never returns an error to a caller driving key events —
/// out-of-range input is logged and ignored (see the `log::warn!` call
/// sites in `state`), matching how a real keyboard driver can't refuse an
/// event that already happened.
#[derive(Debug, Error)]
pub enum Error {
    #[error("scanner error at line {line}: {message}")]
    Scan { line: u32, message: String },

    #[error("input is UTF-16 encoded (byte-order mark detected); only UTF-8 is accepted")]
    Utf16Input,

    #[error("input is not valid UTF-8")]
    NonUtf8Input,

    #[error("input's first non-whitespace byte (0x{0:02x}) is not ASCII")]
    NonAsciiLeadByte(u8),

    #[error("parse error at line {line}: {message}")]
    Parse { line: u32, message: String },

    #[error("unterminated string literal starting at line {0}")]
    UnterminatedString(u32),

    #[error("malformed escape sequence {0:?} at line {1}")]
    MalformedEscape(String, u32),

    #[error("integer literal overflow: {0:?}")]
    IntegerOverflow(String),

    #[error("include of {0:?} could not be resolved")]
    UnresolvedInclude(String),

    #[error("include of {0:?} exceeded the maximum include depth ({1})")]
    IncludeDepthExceeded(String, u32),

    #[error("include cycle detected: {0:?} is already being processed")]
    IncludeCycle(String),

    #[error("unknown key type {0:?} referenced by key {1:?}")]
    UnknownKeyType(String, KeycodeName),

    #[error("key type {0:?} declares {1} levels but its map references level {2}")]
    LevelOutOfRange(String, u32, u32),

    #[error("virtual modifier {0:?} is referenced but never declared")]
    UnknownVirtualModifier(String),

    #[error("real modifier name {0:?} is not one of the eight canonical modifiers")]
    UnknownRealModifier(String),

    #[error("keycode name {0:?} is not bound to any key in this keymap")]
    UnknownKeycodeName(KeycodeName),

    #[error("group index {0} is out of range (must be 1..=4)")]
    GroupIndexOutOfRange(u32),

    #[error("indicator name {0:?} is referenced but never declared in an xkb_indicators section")]
    UnknownIndicator(String),

    #[error("keysym name {0:?} is not recognized by the keysym database")]
    UnknownKeysymName(String),

    #[error("duplicate keycode name {0:?} bound to different keycodes ({1} and {2})")]
    ConflictingKeycode(KeycodeName, u32, u32),

    #[error("action {0:?} requires feature \"legacy-actions\"")]
    LegacyActionDisabled(&'static str),

    #[error("keymap serialization failed: {0}")]
    Serialize(#[from] std::fmt::Error),

    #[error("component update referenced unknown {kind} index {index}")]
    UnknownComponentIndex { kind: &'static str, index: u32 },
}
