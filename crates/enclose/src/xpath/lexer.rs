//! Tokenizer for XPath expressions.

use super::XPathError;

/// A lexical token with its byte offset
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `@`
    At,
    /// `,`
    Comma,
    /// `|`
    Pipe,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `*`
    Star,
    /// `::`
    ColonColon,
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// Quoted string
    Literal(String),
    /// Numeric literal
    Number(f64),
    /// Name (element name, axis, function, `and`/`or`)
    Name(String),
}

/// Split `input` into tokens paired with their byte offsets
pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, XPathError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;
        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos += 2;
                Token::DoubleSlash
            }
            b'/' => {
                pos += 1;
                Token::Slash
            }
            b'[' => {
                pos += 1;
                Token::LBracket
            }
            b']' => {
                pos += 1;
                Token::RBracket
            }
            b'(' => {
                pos += 1;
                Token::LParen
            }
            b')' => {
                pos += 1;
                Token::RParen
            }
            b'@' => {
                pos += 1;
                Token::At
            }
            b',' => {
                pos += 1;
                Token::Comma
            }
            b'|' => {
                pos += 1;
                Token::Pipe
            }
            b'*' => {
                pos += 1;
                Token::Star
            }
            b'=' => {
                pos += 1;
                Token::Eq
            }
            b'!' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::NotEq
            }
            b'<' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::LtEq
            }
            b'<' => {
                pos += 1;
                Token::Lt
            }
            b'>' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::GtEq
            }
            b'>' => {
                pos += 1;
                Token::Gt
            }
            b':' if bytes.get(pos + 1) == Some(&b':') => {
                pos += 2;
                Token::ColonColon
            }
            b'.' if bytes.get(pos + 1) == Some(&b'.') => {
                pos += 2;
                Token::DotDot
            }
            b'.' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
                let (number, end) = read_number(input, pos);
                pos = end;
                Token::Number(number)
            }
            b'.' => {
                pos += 1;
                Token::Dot
            }
            b'\'' | b'"' => {
                let end = input[pos + 1..]
                    .find(c as char)
                    .map(|offset| pos + 1 + offset)
                    .ok_or_else(|| XPathError::syntax(start, "unterminated string literal"))?;
                let literal = input[pos + 1..end].to_string();
                pos = end + 1;
                Token::Literal(literal)
            }
            b'0'..=b'9' => {
                let (number, end) = read_number(input, pos);
                pos = end;
                Token::Number(number)
            }
            _ if is_name_start(c) => {
                let end = input[pos..]
                    .find(|ch: char| !is_name_char(ch))
                    .map_or(input.len(), |offset| pos + offset);
                if end == pos {
                    return Err(XPathError::syntax(start, "unexpected character"));
                }
                let name = input[pos..end].to_string();
                pos = end;
                Token::Name(name)
            }
            _ => {
                return Err(XPathError::syntax(
                    start,
                    format!(
                        "unexpected character {:?}",
                        input[pos..].chars().next().unwrap_or('?')
                    ),
                ))
            }
        };
        tokens.push((token, start));
    }

    Ok(tokens)
}

fn read_number(input: &str, start: usize) -> (f64, usize) {
    let end = input[start..]
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
        .map_or(input.len(), |offset| start + offset);
    (input[start..end].parse().unwrap_or(f64::NAN), end)
}

const fn is_name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
