//! Hand-written tokenizer for keymap source text.
//!
//! Structured like `termwiz::escape::parser::Parser`/`vtparse`: an explicit
//! state machine driven by a `step` method that consumes one input
//! character at a time, rather than a generated parser. The keymap grammar
//! in `xkb_symbols`/`xkb_types` sections nests merge-mode prefixes and
//! bracketed lists deeply enough that a regular-expression-based tokenizer
//! would need as much hand-written lookahead logic anyway.

mod token;

pub use token::{Spanned, Token};

use crate::error::{Error, Result};

/// Validates raw bytes read from a keymap source (file, include target) and
/// returns the text `Scanner`/`Parser` should tokenize.
///
/// Per spec.md §4.1: a leading UTF-16 byte-order mark (either endianness) is
/// rejected outright, a leading UTF-8 BOM is consumed, the rest must be
/// valid UTF-8, and the first non-whitespace, non-directional-mark
/// character must be ASCII (a keymap source always opens with an
/// ASCII keyword or a `#`/`//` comment).
pub fn decode_source(bytes: &[u8]) -> Result<std::borrow::Cow<'_, str>> {
    if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(Error::Utf16Input);
    }
    let without_bom = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    let text = std::str::from_utf8(without_bom).map_err(|_| Error::NonUtf8Input)?;

    if let Some((idx, c)) =
        text.char_indices().find(|&(_, c)| !c.is_whitespace() && !is_directional_mark(c))
    {
        if !c.is_ascii() {
            return Err(Error::NonAsciiLeadByte(without_bom[idx]));
        }
    }

    Ok(std::borrow::Cow::Borrowed(text))
}

fn is_directional_mark(c: char) -> bool {
    matches!(
        c,
        '\u{200e}' | '\u{200f}' | '\u{202a}'..='\u{202e}' | '\u{2066}'..='\u{2069}'
    )
}

pub struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Scanner { chars: src.char_indices().peekable(), src, line: 1 }
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_pos(&mut self) -> Option<usize> {
        self.chars.peek().map(|&(i, _)| i)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some(&(_, '/')) => {
                            while let Some(c) = self.peek() {
                                if c == '\n' {
                                    break;
                                }
                                self.bump();
                            }
                        }
                        Some(&(_, '*')) => {
                            self.bump();
                            self.bump();
                            loop {
                                match self.bump() {
                                    None => break,
                                    Some('*') if self.peek() == Some('/') => {
                                        self.bump();
                                        break;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
    }

    /// Returns the next token, or `Token::Eof` once the input is
    /// exhausted. Callers loop until they see `Eof`.
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_trivia();
        let line = self.line;
        let c = match self.peek() {
            None => return Ok(Spanned { token: Token::Eof, line }),
            Some(c) => c,
        };

        let token = match c {
            '{' => { self.bump(); Token::LBrace }
            '}' => { self.bump(); Token::RBrace }
            '(' => { self.bump(); Token::LParen }
            ')' => { self.bump(); Token::RParen }
            '[' => { self.bump(); Token::LBracket }
            ']' => { self.bump(); Token::RBracket }
            ';' => { self.bump(); Token::Semi }
            ',' => { self.bump(); Token::Comma }
            '=' => { self.bump(); Token::Equals }
            '+' => { self.bump(); Token::Plus }
            '-' => { self.bump(); Token::Minus }
            '!' => { self.bump(); Token::Bang }
            '~' => { self.bump(); Token::Tilde }
            '.' => { self.bump(); Token::Dot }
            '$' => { self.bump(); self.scan_ident_into_dollar()? }
            '<' => self.scan_key_name(line)?,
            '"' => self.scan_string(line)?,
            c if c.is_ascii_digit() => self.scan_number()?,
            c if is_ident_start(c) => self.scan_ident(),
            other => {
                return Err(Error::Scan { line, message: format!("unexpected character {other:?}") })
            }
        };
        Ok(Spanned { token, line })
    }

    /// `$name` is a predefined-variable reference; the scanner folds the
    /// sigil into the identifier text (`"$name"`) so the parser can
    /// recognize it without a dedicated token kind.
    fn scan_ident_into_dollar(&mut self) -> Result<Token> {
        let mut s = String::from("$");
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Ok(Token::Ident(s))
    }

    fn scan_ident(&mut self) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token::Ident(s)
    }

    fn scan_key_name(&mut self, line: u32) -> Result<Token> {
        self.bump(); // consume '<'
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some(c) => s.push(c),
                None => {
                    return Err(Error::Scan { line, message: "unterminated keycode name".into() })
                }
            }
        }
        Ok(Token::KeyName(s))
    }

    fn scan_string(&mut self, line: u32) -> Result<Token> {
        self.bump(); // consume opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(Error::UnterminatedString(line)),
                Some('"') => break,
                Some('\\') => s.push(self.scan_escape(line)?),
                Some(c) => s.push(c),
            }
        }
        Ok(Token::String(s))
    }

    fn scan_escape(&mut self, line: u32) -> Result<char> {
        let esc = self.bump().ok_or(Error::UnterminatedString(line))?;
        Ok(match esc {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'v' => '\u{0b}',
            'a' => '\u{07}',
            'e' => '\u{1b}',
            '\\' => '\\',
            '"' => '"',
            c @ '0'..='7' => {
                let mut octal = String::new();
                octal.push(c);
                for _ in 0..2 {
                    match self.peek() {
                        Some(c) if ('0'..='7').contains(&c) => {
                            octal.push(c);
                            self.bump();
                        }
                        _ => break,
                    }
                }
                let code = u32::from_str_radix(&octal, 8)
                    .map_err(|_| Error::MalformedEscape(format!("\\{octal}"), line))?;
                char::from_u32(code)
                    .ok_or_else(|| Error::MalformedEscape(format!("\\{octal}"), line))?
            }
            'x' => {
                let mut hex = String::new();
                for _ in 0..2 {
                    match self.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(c);
                            self.bump();
                        }
                        _ => break,
                    }
                }
                let code = u8::from_str_radix(&hex, 16)
                    .map_err(|_| Error::MalformedEscape(format!("\\x{hex}"), line))?;
                code as char
            }
            'u' => {
                if self.peek() != Some('{') {
                    return Err(Error::MalformedEscape("\\u".into(), line));
                }
                self.bump();
                let mut hex = String::new();
                loop {
                    match self.bump() {
                        Some('}') => break,
                        Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                        _ => return Err(Error::MalformedEscape(format!("\\u{{{hex}"), line)),
                    }
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| Error::MalformedEscape(format!("\\u{{{hex}}}"), line))?;
                char::from_u32(code)
                    .ok_or_else(|| Error::MalformedEscape(format!("\\u{{{hex}}}"), line))?
            }
            other => return Err(Error::MalformedEscape(format!("\\{other}"), line)),
        })
    }

    fn scan_number(&mut self) -> Result<Token> {
        let start = self.peek_pos().unwrap();
        let mut is_hex = false;
        let mut is_float = false;

        if self.peek() == Some('0') {
            self.bump();
            if matches!(self.peek(), Some('x') | Some('X')) {
                self.bump();
                is_hex = true;
                while let Some(c) = self.peek() {
                    if c.is_ascii_hexdigit() {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        if !is_hex {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.bump();
                } else {
                    break;
                }
            }
            if self.peek() == Some('.') {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if matches!(lookahead.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
                    is_float = true;
                    self.bump();
                    while let Some(c) = self.peek() {
                        if c.is_ascii_digit() {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
            }
            // spec.md §4.1: floats require a decimal point and never carry
            // an exponent, so a trailing `e`/`E` belongs to the next token
            // (e.g. an identifier), not this number.
        }

        let end = self.peek_pos().unwrap_or(self.src.len());
        let text = &self.src[start..end];
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| Error::IntegerOverflow(text.to_string()))
        } else if is_hex {
            let digits = &text[2..];
            i64::from_str_radix(digits, 16)
                .map(Token::Integer)
                .map_err(|_| Error::IntegerOverflow(text.to_string()))
        } else {
            text.parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| Error::IntegerOverflow(text.to_string()))
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(src);
        let mut out = Vec::new();
        loop {
            let tok = scanner.next_token().unwrap();
            if tok.token == Token::Eof {
                break;
            }
            out.push(tok.token);
        }
        out
    }

    #[test]
    fn scans_identifiers_and_punctuation() {
        assert_eq!(
            tokens("xkb_keycodes \"default\" { };"),
            vec![
                Token::Ident("xkb_keycodes".into()),
                Token::String("default".into()),
                Token::LBrace,
                Token::RBrace,
                Token::Semi,
            ]
        );
    }

    #[test]
    fn scans_key_names() {
        assert_eq!(tokens("<AC01> = 38;"), vec![
            Token::KeyName("AC01".into()),
            Token::Equals,
            Token::Integer(38),
            Token::Semi,
        ]);
    }

    #[test]
    fn scans_hex_and_float() {
        assert_eq!(tokens("0x1A 3.5"), vec![Token::Integer(0x1a), Token::Float(3.5)]);
    }

    /// spec.md §4.1: floats never carry an exponent; `1e2` is the integer
    /// `1` followed by the identifier `e2`, not a float.
    #[test]
    fn no_exponent_in_floats() {
        assert_eq!(tokens("1e2"), vec![Token::Integer(1), Token::Ident("e2".into())]);
    }

    #[test]
    fn scans_string_escapes() {
        assert_eq!(tokens(r#""a\nb\u{41}\x42""#), vec![Token::String("a\nbAB".into())]);
    }

    #[test]
    fn rejects_unterminated_string() {
        let mut scanner = Scanner::new("\"abc");
        assert!(scanner.next_token().is_err());
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            tokens("// line\nkey /* block */ <A>;"),
            vec![Token::Ident("key".into()), Token::KeyName("A".into()), Token::Semi]
        );
    }

    #[test]
    fn dollar_variables_are_single_tokens() {
        assert_eq!(tokens("$mymod"), vec![Token::Ident("$mymod".into())]);
    }

    #[test]
    fn scans_control_and_octal_escapes() {
        assert_eq!(
            tokens(r#""\b\f\v\a\e\101""#),
            vec![Token::String("\u{08}\u{0c}\u{0b}\u{07}\u{1b}A".into())]
        );
    }

    #[test]
    fn octal_escape_stops_after_three_digits() {
        // \1234 is the octal escape \123 (S) followed by a literal '4'.
        assert_eq!(tokens(r#""\1234""#), vec![Token::String("S4".into())]);
    }

    #[test]
    fn decode_source_consumes_leading_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"xkb_keymap");
        let text = decode_source(&bytes).unwrap();
        assert_eq!(text, "xkb_keymap");
    }

    #[test]
    fn decode_source_rejects_utf16_bom() {
        assert!(matches!(decode_source(&[0xFF, 0xFE, b'x', 0]), Err(Error::Utf16Input)));
        assert!(matches!(decode_source(&[0xFE, 0xFF, 0, b'x']), Err(Error::Utf16Input)));
    }

    #[test]
    fn decode_source_rejects_non_ascii_lead_byte() {
        let err = decode_source("\u{00e9}xkb_keymap".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::NonAsciiLeadByte(_)));
    }

    #[test]
    fn decode_source_allows_leading_whitespace_and_directional_marks() {
        let src = "  \u{200e}xkb_keymap";
        assert_eq!(decode_source(src.as_bytes()).unwrap(), src);
    }
}
