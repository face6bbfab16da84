//! Stack validator: a linear abstract interpretation of stack depth.
//!
//! Control flow is *not* followed here -- this single forward pass assumes
//! every conditional is taken, which makes it a cheap static check rather
//! than a precise one. A token whose guard fails is demoted to
//! `Whitespace` in place (removed later, once the block resolver has had a
//! chance to use stable indices -- see [`crate::resolver`]) and a
//! localized error is reported; the scan continues so a single run can
//! surface every underflow in a program.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::token::{Keyword, Operator, Token, TokenKind};

/// `(depth delta, minimum depth required before applying it)`.
fn stack_effect(kind: &TokenKind) -> Option<(i64, i64)> {
    Some(match kind {
        TokenKind::Whitespace => return None,
        TokenKind::Int(_) | TokenKind::String(_) => (1, 0),
        TokenKind::Op(op) => match op {
            Operator::Add
            | Operator::Sub
            | Operator::Mul
            | Operator::Div
            | Operator::Mod
            | Operator::Eq
            | Operator::Lt
            | Operator::Gt
            | Operator::Le
            | Operator::Ge
            | Operator::Shl
            | Operator::Shr
            | Operator::Or
            | Operator::And => (-1, 2),
            Operator::Dump => (-1, 1),
        },
        TokenKind::Keyword(kw) => match kw {
            Keyword::If | Keyword::Do => (-1, 1),
            Keyword::Else | Keyword::Endif | Keyword::While | Keyword::EndWhile => (0, 0),
            Keyword::Dup => (1, 1),
            Keyword::TwoDup => (2, 2),
            Keyword::Drop => (-1, 1),
            Keyword::Swap => (0, 2),
            Keyword::Over => (1, 2),
            Keyword::Mem => (1, 0),
            Keyword::LoadB => (0, 1),
            Keyword::StoreB => (-2, 2),
            Keyword::Dump | Keyword::DumpC | Keyword::DumpS => (-1, 1),
            Keyword::Shl | Keyword::Shr | Keyword::Or | Keyword::And | Keyword::Mod => (-1, 2),
        },
    })
}

/// Runs the linear stack-depth simulation, demoting underflow-offending
/// tokens to `Whitespace` in place and reporting diagnostics.
pub fn validate_stack(tokens: &mut [Token], diagnostics: &mut Diagnostics) {
    let mut depth: i64 = 0;

    for i in 0..tokens.len() {
        let Some((delta, guard)) = stack_effect(&tokens[i].kind) else {
            continue;
        };

        if depth < guard {
            diagnostics.push(Diagnostic::error(
                "stack protection invoked! (did you forget to put the operator after the \
                 operands, i.e. `5 5 +` not `5 + 5`)?",
                tokens[i].position,
            ));
            tokens[i].demote_to_whitespace();
            continue;
        }

        depth += delta;
    }

    if depth != 0 {
        let position = tokens.last().map(|t| t.position).unwrap_or_else(|| crate::token::Position::new(1, 1));
        diagnostics.push(Diagnostic::warning(
            format!("stack is not empty at end of program ({depth} cell(s) left)"),
            position,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(source: &str) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Vec::new();
        let mut tokens = tokenize(source, &mut diagnostics).unwrap();
        validate_stack(&mut tokens, &mut diagnostics);
        (tokens, diagnostics)
    }

    #[test]
    fn well_formed_program_has_no_diagnostics() {
        let (_, diagnostics) = run("5 5 + #");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn underflowing_operator_is_demoted() {
        let (tokens, diagnostics) = run("5 +");
        assert_eq!(tokens[1].kind, TokenKind::Whitespace);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn residual_stack_warns_but_does_not_demote() {
        let (tokens, diagnostics) = run("1 2 3");
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Whitespace));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, crate::diagnostics::Severity::Warning);
    }

    #[test]
    fn swap_needs_two_but_leaves_depth_unchanged() {
        let (_, diagnostics) = run("1 2 swap drop drop");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn multiple_underflows_are_all_reported_in_one_pass() {
        let (_, diagnostics) = run("+ -");
        assert_eq!(diagnostics.len(), 2);
    }
}
