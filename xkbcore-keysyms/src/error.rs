use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing a textual keysym name such as `"Aogonek"` or
/// a `U+XXXX` / `0x1000041` literal.
#[derive(Debug, Error)]
pub enum Error {
    #[error("empty keysym name")]
    EmptyName,

    #[error("keysym name too long: {0} bytes (max {max})", max = crate::NAME_MAX_SIZE)]
    NameTooLong(usize),

    #[error("malformed numeric keysym literal: {0:?}")]
    MalformedLiteral(String),

    #[error("codepoint out of range for a keysym: U+{0:X}")]
    CodepointOutOfRange(u32),
}
