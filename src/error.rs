//! Fatal error types for each compiler stage.
//!
//! Recoverable findings go through [`crate::diagnostics`] instead; only
//! things that halt the pipeline live here.

use thiserror::Error;

use crate::token::Position;

/// Errors the lexer can report. Fatal: lexing stops at the first one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("{position}: unidentified keyword: {word}")]
    UnidentifiedKeyword { word: String, position: Position },

    #[error("{position}: expected closing quotes")]
    UnterminatedString { position: Position },
}

/// Errors the block resolver can report. Fatal: block resolution stops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("{position}: `else` keyword can only be used within `if` blocks")]
    ElseWithoutIf { position: Position },

    #[error("{position}: `endif` keyword can only be used within `if` blocks")]
    EndifWithoutIf { position: Position },

    #[error("{position}: expected `do` following `while`")]
    WhileWithoutDo { position: Position },

    #[error("{position}: `endwhile` keyword can only be used within `do` blocks")]
    EndWhileWithoutDo { position: Position },

    #[error("{position}: unmatched `{keyword}` at end of input")]
    UnmatchedOpener { keyword: &'static str, position: Position },
}

/// Errors the emitter can report.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write assembly output: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors the process-orchestration layer can report (assembler/linker
/// invocation). Kept distinct from [`EmitError`] since it belongs to the
/// collaborator layer described in the purpose-and-scope section, not the core.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch `{tool}`: {source}")]
    Launch { tool: String, #[source] source: std::io::Error },

    #[error("`{tool}` exited with a non-zero status")]
    NonZeroExit { tool: String },
}

/// Top-level error type returned by the driver binary.
#[derive(Debug, Error)]
pub enum CorthError {
    #[error("failed to read source file `{path}`: {source}")]
    ReadSource { path: String, #[source] source: std::io::Error },

    #[error("lexing failed: {0}")]
    Lex(#[from] LexError),

    #[error("block resolution failed: {0}")]
    Block(#[from] BlockError),

    #[error("code generation failed: {0}")]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

pub type Result<T, E = CorthError> = std::result::Result<T, E>;
