//! Converts Corth source text into a flat token stream.
//!
//! Pure function of the input: no I/O, no global state. Halts and reports
//! position on the first hard failure (unidentified word, unterminated
//! string); softer issues (a lone `|` or `&`) are pushed to the diagnostic
//! sink and recovered in place.

mod cursor;

use cursor::Cursor;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::LexError;
use crate::token::{Keyword, Operator, Position, Token, TokenKind};

/// Tokenizes `source`, reporting recoverable issues into `diagnostics`.
///
/// Returns the first [`LexError`] encountered rather than a partial token
/// list, matching the lexer's "no partial result on failure" contract.
pub fn tokenize(source: &str, diagnostics: &mut Diagnostics) -> Result<Vec<Token>, LexError> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    while !cursor.is_at_end() {
        if let Some(token) = lex_token(&mut cursor, diagnostics)? {
            tokens.push(token);
        }
    }

    Ok(tokens)
}

fn lex_token(cursor: &mut Cursor, diagnostics: &mut Diagnostics) -> Result<Option<Token>, LexError> {
    let start = cursor.position();
    let c = cursor.peek().expect("lex_token called at end of input");

    if c.is_whitespace() {
        cursor.advance();
        return Ok(None);
    }

    if is_operator_glyph(c) {
        return lex_operator(cursor, diagnostics, start);
    }

    if c.is_ascii_digit() {
        return Ok(Some(lex_int(cursor, start)));
    }

    if c.is_alphabetic() {
        return lex_word(cursor, start).map(Some);
    }

    if c == '"' {
        return lex_string(cursor, start).map(Some);
    }

    // Corth's source alphabet is otherwise exactly whitespace, operator
    // glyphs, digits, letters/underscore, and quotes; anything else is
    // silently skipped rather than treated as a hard lexer error.
    cursor.advance();
    Ok(None)
}

fn is_operator_glyph(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '#' | '|' | '&')
}

fn lex_operator(
    cursor: &mut Cursor,
    diagnostics: &mut Diagnostics,
    start: Position,
) -> Result<Option<Token>, LexError> {
    let c = cursor.advance().expect("operator glyph already peeked");

    let (op, text): (Operator, &'static str) = match c {
        '=' if cursor.peek() == Some('=') => {
            cursor.advance();
            (Operator::Eq, "==")
        }
        '<' if cursor.peek() == Some('=') => {
            cursor.advance();
            (Operator::Le, "<=")
        }
        '>' if cursor.peek() == Some('=') => {
            cursor.advance();
            (Operator::Ge, ">=")
        }
        '<' if cursor.peek() == Some('<') => {
            cursor.advance();
            (Operator::Shl, "<<")
        }
        '>' if cursor.peek() == Some('>') => {
            cursor.advance();
            (Operator::Shr, ">>")
        }
        '/' if cursor.peek() == Some('/') => {
            cursor.advance();
            while !cursor.is_at_end() && cursor.peek() != Some('\n') {
                cursor.advance();
            }
            return Ok(None);
        }
        '|' => {
            if cursor.peek() == Some('|') {
                cursor.advance();
            } else {
                diagnostics.push(Diagnostic::warning(
                    "lone `|` treated as `||` (did you mean to double it?)",
                    start,
                ));
            }
            (Operator::Or, "||")
        }
        '&' => {
            if cursor.peek() == Some('&') {
                cursor.advance();
            } else {
                diagnostics.push(Diagnostic::warning(
                    "lone `&` treated as `&&` (did you mean to double it?)",
                    start,
                ));
            }
            (Operator::And, "&&")
        }
        '=' => (Operator::Eq, "="),
        '<' => (Operator::Lt, "<"),
        '>' => (Operator::Gt, ">"),
        '+' => (Operator::Add, "+"),
        '-' => (Operator::Sub, "-"),
        '*' => (Operator::Mul, "*"),
        '/' => (Operator::Div, "/"),
        '%' => (Operator::Mod, "%"),
        '#' => (Operator::Dump, "#"),
        other => unreachable!("is_operator_glyph let through {other:?}"),
    };

    Ok(Some(Token::new(TokenKind::Op(op), text, start)))
}

fn lex_int(cursor: &mut Cursor, start: Position) -> Token {
    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        text.push(c);
        cursor.advance();
    }
    let value: i64 = text.parse().expect("greedy digit run must parse as an integer");
    Token::new(TokenKind::Int(value), text, start)
}

fn lex_word(cursor: &mut Cursor, start: Position) -> Result<Token, LexError> {
    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        if !(c.is_alphanumeric() || c == '_') {
            break;
        }
        text.push(c);
        cursor.advance();
    }

    match Keyword::lookup(&text) {
        Some(keyword) => Ok(Token::new(TokenKind::Keyword(keyword), text, start)),
        None => Err(LexError::UnidentifiedKeyword { word: text, position: start }),
    }
}

fn lex_string(cursor: &mut Cursor, start: Position) -> Result<Token, LexError> {
    cursor.advance(); // opening quote
    let mut text = String::new();
    loop {
        match cursor.peek() {
            None => return Err(LexError::UnterminatedString { position: start }),
            Some('"') => {
                cursor.advance();
                break;
            }
            Some(c) => {
                text.push(c);
                cursor.advance();
            }
        }
    }
    Ok(Token::new(TokenKind::String(text), "", start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let mut diagnostics = Vec::new();
        tokenize(source, &mut diagnostics).expect("lex should succeed")
    }

    #[test]
    fn lexes_arithmetic_and_dump() {
        let tokens = lex("5 5 + #");
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int(5),
                TokenKind::Int(5),
                TokenKind::Op(Operator::Add),
                TokenKind::Op(Operator::Dump),
            ]
        );
    }

    #[test]
    fn equals_and_double_equals_both_lex_to_eq() {
        let a = lex("=");
        let b = lex("==");
        assert_eq!(a[0].kind, TokenKind::Op(Operator::Eq));
        assert_eq!(b[0].kind, TokenKind::Op(Operator::Eq));
        assert_eq!(a[0].text, "=");
        assert_eq!(b[0].text, "==");
    }

    #[test]
    fn line_comment_emits_no_token() {
        let tokens = lex("1 // trailing comment\n2");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn line_comment_at_eof_without_newline() {
        let tokens = lex("1 // trailing comment");
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn lone_pipe_warns_and_is_treated_as_double() {
        let mut diagnostics = Vec::new();
        let tokens = tokenize("1 2 |", &mut diagnostics).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Op(Operator::Or));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let mut diagnostics = Vec::new();
        let err = tokenize("\"hi", &mut diagnostics).unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { position: Position::new(1, 1) });
    }

    #[test]
    fn unidentified_word_is_fatal() {
        let mut diagnostics = Vec::new();
        let err = tokenize("bogus", &mut diagnostics).unwrap_err();
        assert_eq!(
            err,
            LexError::UnidentifiedKeyword { word: "bogus".into(), position: Position::new(1, 1) }
        );
    }

    #[test]
    fn string_literal_body_excludes_quotes() {
        let tokens = lex("\"Hi\"");
        assert_eq!(tokens[0].kind, TokenKind::String("Hi".into()));
    }

    #[test]
    fn empty_source_yields_no_tokens() {
        assert!(lex("").is_empty());
    }
}
