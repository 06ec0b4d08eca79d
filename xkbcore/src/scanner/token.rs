#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    /// A `<NAME>` keycode-name literal.
    KeyName(String),
    Integer(i64),
    Float(f64),
    String(String),

    // Punctuation.
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Equals,
    Plus,
    Minus,
    Bang,
    Tilde,
    Dot,

    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier {s:?}"),
            Token::KeyName(s) => format!("keycode name <{s}>"),
            Token::Integer(n) => format!("integer {n}"),
            Token::Float(n) => format!("float {n}"),
            Token::String(s) => format!("string {s:?}"),
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::Semi => "';'".into(),
            Token::Comma => "','".into(),
            Token::Equals => "'='".into(),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Bang => "'!'".into(),
            Token::Tilde => "'~'".into(),
            Token::Dot => "'.'".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

/// A token paired with the 1-based source line it started on, for
/// diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}
