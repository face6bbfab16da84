//! Invokes the platform's assembler and linker on a freshly emitted file.
//!
//! Deliberately separate from `corth`'s core pipeline: the core only ever
//! produces assembly text, never shells out. This module is where
//! [`corth::options::Mode::Compile`] turns that text into an executable.

use std::path::Path;
use std::process::Command;

use corth::error::ToolError;
use corth::options::{CompileOptions, Syntax};

use log::debug;

/// Runs the assembler on `asm_path`, and for NASM targets the linker too,
/// logging each command line at debug level before running it.
pub fn assemble_and_link(asm_path: &Path, options: &CompileOptions) -> Result<(), ToolError> {
    let object_path = asm_path.with_extension("o");

    run_tool(&options.resolved_assembler(), &assembler_args(asm_path, &object_path, options))?;

    if matches!(options.syntax, Syntax::Nasm) {
        run_tool(&options.resolved_linker(), &linker_args(&object_path, options))?;
    }

    Ok(())
}

fn assembler_args(asm_path: &Path, object_path: &Path, options: &CompileOptions) -> Vec<String> {
    let mut args = options.resolved_assembler_opts();
    args.push("-o".to_string());
    args.push(object_path.display().to_string());
    args.push(asm_path.display().to_string());
    args
}

fn linker_args(object_path: &Path, options: &CompileOptions) -> Vec<String> {
    let mut args = options.resolved_linker_opts();
    args.push("-o".to_string());
    args.push(options.output_name.clone());
    args.push(object_path.display().to_string());
    args
}

fn run_tool(tool: &str, args: &[String]) -> Result<(), ToolError> {
    debug!("{tool} {}", args.join(" "));

    let status = Command::new(tool)
        .args(args)
        .status()
        .map_err(|source| ToolError::Launch { tool: tool.to_string(), source })?;

    if !status.success() {
        return Err(ToolError::NonZeroExit { tool: tool.to_string() });
    }

    Ok(())
}
