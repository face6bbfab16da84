//! Block resolver: pairs `if/else/endif` and `while/do/endwhile` and
//! annotates each control-flow token with its matched partner's index.
//!
//! The semantics mirror a recursive descent (each opener recursively
//! resolves its own body), but this implementation uses an explicit frame
//! stack instead of literal recursion -- an idiomatic translation that
//! produces identical annotations without risking a stack overflow on
//! deeply nested input.

use crate::error::BlockError;
use crate::token::{Keyword, Token, TokenKind};

enum Frame {
    If { index: usize },
    Else { index: usize },
    WhileAwaitingDo { index: usize },
    WhileBody { while_index: usize, do_index: usize },
}

/// Walks `tokens` once, setting `annotation` on every control-flow keyword.
pub fn resolve_blocks(tokens: &mut [Token]) -> Result<(), BlockError> {
    let mut frames: Vec<Frame> = Vec::new();

    for i in 0..tokens.len() {
        let keyword = match &tokens[i].kind {
            TokenKind::Keyword(kw) if kw.is_control_flow() => *kw,
            _ => continue,
        };

        if matches!(keyword, Keyword::If | Keyword::Else | Keyword::Endif) {
            if let Some(Frame::WhileAwaitingDo { index: while_index }) = frames.last() {
                return Err(BlockError::WhileWithoutDo { position: tokens[*while_index].position });
            }
        }

        match keyword {
            Keyword::If => frames.push(Frame::If { index: i }),
            Keyword::While => frames.push(Frame::WhileAwaitingDo { index: i }),
            Keyword::Do => {
                if let Some(&Frame::WhileAwaitingDo { index: while_index }) = frames.last() {
                    frames.pop();
                    frames.push(Frame::WhileBody { while_index, do_index: i });
                }
                // A `do` with no pending `while` is never reached by the
                // driver loop in the original implementation either; it is
                // simply inert.
            }
            Keyword::Else => match frames.pop() {
                Some(Frame::If { index: if_index }) => {
                    tokens[if_index].annotation = Some(i);
                    frames.push(Frame::Else { index: i });
                }
                _ => return Err(BlockError::ElseWithoutIf { position: tokens[i].position }),
            },
            Keyword::Endif => match frames.pop() {
                Some(Frame::If { index: opener }) | Some(Frame::Else { index: opener }) => {
                    tokens[opener].annotation = Some(i);
                }
                _ => return Err(BlockError::EndifWithoutIf { position: tokens[i].position }),
            },
            Keyword::EndWhile => match frames.pop() {
                Some(Frame::WhileBody { while_index, do_index }) => {
                    tokens[do_index].annotation = Some(i);
                    tokens[i].annotation = Some(while_index);
                }
                _ => return Err(BlockError::EndWhileWithoutDo { position: tokens[i].position }),
            },
            _ => {}
        }
    }

    if let Some(frame) = frames.pop() {
        let (keyword, index) = match frame {
            Frame::If { index } => ("if", index),
            Frame::Else { index } => ("else", index),
            Frame::WhileAwaitingDo { index } => ("while", index),
            Frame::WhileBody { do_index, .. } => ("do", do_index),
        };
        return Err(BlockError::UnmatchedOpener { keyword, position: tokens[index].position });
    }

    Ok(())
}

/// Drops demoted `Whitespace` tokens and remaps every surviving
/// annotation to its post-filter index.
///
/// The original implementation calls `std::remove_if` without the
/// follow-up `.erase()`, so the demoted tokens are never actually
/// dropped before emission -- that is a known source bug, not a
/// behavior to reproduce (see the design notes).
pub fn strip_whitespace(tokens: Vec<Token>) -> Vec<Token> {
    let mut new_index = vec![None; tokens.len()];
    let mut next = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if !token.kind.is_whitespace() {
            new_index[i] = Some(next);
            next += 1;
        }
    }

    tokens
        .into_iter()
        .filter(|token| !token.kind.is_whitespace())
        .map(|mut token| {
            if let Some(old) = token.annotation {
                token.annotation = new_index[old];
            }
            token
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::tokenize;
    use crate::validator::validate_stack;

    fn resolve(source: &str) -> Result<Vec<Token>, BlockError> {
        let mut diagnostics: Diagnostics = Vec::new();
        let mut tokens = tokenize(source, &mut diagnostics).unwrap();
        validate_stack(&mut tokens, &mut diagnostics);
        resolve_blocks(&mut tokens)?;
        Ok(strip_whitespace(tokens))
    }

    #[test]
    fn if_endif_pairs_up() {
        let tokens = resolve("1 if 2 # endif").unwrap();
        let if_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::If)).unwrap();
        let endif_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::Endif)).unwrap();
        assert_eq!(tokens[if_index].annotation, Some(endif_index));
    }

    #[test]
    fn if_else_endif_chains_correctly() {
        let tokens = resolve("1 if 42 # else 13 # endif").unwrap();
        let if_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::If)).unwrap();
        let else_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::Else)).unwrap();
        let endif_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::Endif)).unwrap();
        assert_eq!(tokens[if_index].annotation, Some(else_index));
        assert_eq!(tokens[else_index].annotation, Some(endif_index));
    }

    #[test]
    fn while_do_endwhile_cross_references() {
        let tokens = resolve("3 while dup 0 > do dup # 1 - endwhile drop").unwrap();
        let while_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::While)).unwrap();
        let do_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::Do)).unwrap();
        let endwhile_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::EndWhile)).unwrap();
        assert_eq!(tokens[do_index].annotation, Some(endwhile_index));
        assert_eq!(tokens[endwhile_index].annotation, Some(while_index));
    }

    #[test]
    fn nested_blocks_resolve_independently() {
        let tokens =
            resolve("1 if 1 while dup 0 > do dup # 1 - endwhile else 2 # endif").unwrap();
        let outer_if = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::If)).unwrap();
        let outer_else = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::Else)).unwrap();
        assert_eq!(tokens[outer_if].annotation, Some(outer_else));
    }

    #[test]
    fn else_without_if_is_an_error() {
        let err = resolve("1 else 2 endif").unwrap_err();
        assert!(matches!(err, BlockError::ElseWithoutIf { .. }));
    }

    #[test]
    fn endif_without_if_is_an_error() {
        let err = resolve("1 endif").unwrap_err();
        assert!(matches!(err, BlockError::EndifWithoutIf { .. }));
    }

    #[test]
    fn while_without_do_before_if_is_an_error() {
        let err = resolve("1 while 1 if 2 endif").unwrap_err();
        assert!(matches!(err, BlockError::WhileWithoutDo { .. }));
    }

    #[test]
    fn endwhile_without_do_is_an_error() {
        let err = resolve("1 endwhile").unwrap_err();
        assert!(matches!(err, BlockError::EndWhileWithoutDo { .. }));
    }

    #[test]
    fn unmatched_while_at_eof_is_an_error() {
        let err = resolve("1 while dup").unwrap_err();
        assert!(matches!(err, BlockError::UnmatchedOpener { keyword: "while", .. }));
    }

    #[test]
    fn whitespace_demoted_tokens_are_dropped_and_annotations_remapped() {
        // `+` underflows (only one operand) and gets demoted; the
        // surviving `if`/`endif` pair must still point at each other by
        // their *post-filter* indices.
        let tokens = resolve("+ 1 if 2 endif").unwrap();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Whitespace));
        let if_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::If)).unwrap();
        let endif_index = tokens.iter().position(|t| t.kind == TokenKind::Keyword(Keyword::Endif)).unwrap();
        assert_eq!(tokens[if_index].annotation, Some(endif_index));
    }
}
