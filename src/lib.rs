//! # Corth
//!
//! A compiler for Corth, a stack-oriented language in the Forth tradition,
//! emitting x86-64 assembly for either NASM or GAS syntax, targeting either
//! Windows or Linux.
//!
//! ## Pipeline
//!
//! Source text passes through four stages, each a pure function over the
//! token stream plus a diagnostic sink:
//!
//! 1. **Lexer** ([`lexer`]) - turns source text into a flat token stream.
//! 2. **Validator** ([`validator`]) - a linear stack-depth simulation that
//!    demotes underflowing tokens to whitespace and flags residual stack.
//! 3. **Resolver** ([`resolver`]) - pairs `if/else/endif` and
//!    `while/do/endwhile`, then strips the demoted whitespace.
//! 4. **Emitter** ([`emitter`]) - lowers the resolved stream to an internal
//!    instruction IR and renders it through a backend chosen by platform
//!    and syntax.
//!
//! [`options::CompileOptions`] threads explicitly through every stage; there
//! is no module-level mutable global.
//!
//! ## Example
//!
//! ```rust,no_run
//! use corth::options::{CompileOptions, Mode, Platform, Syntax};
//!
//! let options = CompileOptions {
//!     source_path: "program.corth".into(),
//!     output_name: "program".into(),
//!     platform: Platform::Linux64,
//!     syntax: Syntax::Nasm,
//!     mode: Mode::Generate,
//!     verbose: false,
//!     assembler_path: None,
//!     assembler_opts: None,
//!     extra_assembler_opts: Vec::new(),
//!     linker_path: None,
//!     linker_opts: None,
//!     extra_linker_opts: Vec::new(),
//! };
//!
//! let report = corth::compile(&options).unwrap();
//! println!("wrote {}", report.output_path.display());
//! ```

pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod options;
pub mod resolver;
pub mod token;
pub mod validator;

use std::path::PathBuf;

use diagnostics::Diagnostics;
use error::{CorthError, Result};
use options::CompileOptions;

/// What a successful compile produced: the path of the emitted assembly
/// file, plus every diagnostic collected along the way (underflow demotions
/// and residual-stack warnings survive even when the overall compile
/// succeeds).
#[derive(Debug)]
pub struct CompileReport {
    pub output_path: PathBuf,
    pub diagnostics: Diagnostics,
}

/// Runs the full lexer -> validator -> resolver -> emitter pipeline and
/// writes the resulting assembly file.
///
/// Does not invoke the assembler or linker; see
/// `corthc`'s `orchestrate` module for [`options::Mode::Compile`].
pub fn compile(options: &CompileOptions) -> Result<CompileReport> {
    let source = std::fs::read_to_string(&options.source_path)
        .map_err(|source| CorthError::ReadSource { path: options.source_path.display().to_string(), source })?;

    let mut diagnostics = Vec::new();
    let mut tokens = lexer::tokenize(&source, &mut diagnostics)?;
    validator::validate_stack(&mut tokens, &mut diagnostics);
    resolver::resolve_blocks(&mut tokens)?;
    let tokens = resolver::strip_whitespace(tokens);

    let output_path = emitter::emit(&tokens, options)?;

    Ok(CompileReport { output_path, diagnostics })
}
