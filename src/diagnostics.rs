//! Non-fatal findings.
//!
//! Stack-underflow demotions, lexer doubling warnings, and the residual-stack
//! notice are not `Err`s -- the pipeline keeps going past them. Each stage
//! takes a `&mut Vec<Diagnostic>` sink rather than printing directly, so a
//! test (or a future non-CLI host) can inspect exactly what was reported.

use std::fmt;

use crate::token::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub position: Position,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>, position: Position) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            position,
        }
    }

    pub fn error(message: impl Into<String>, position: Position) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "WRN",
            Severity::Error => "ERR",
        };
        write!(f, "[{}] {}: {}", tag, self.position, self.message)
    }
}

pub type Diagnostics = Vec<Diagnostic>;
