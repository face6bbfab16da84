//! Command-line argument parsing for `corthc`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use corth::options::{CompileOptions, Mode, Platform, Syntax};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compiler for Corth, a stack-oriented language")]
pub struct Cli {
    /// Path to the Corth source file.
    #[arg(index = 1)]
    pub file: PathBuf,

    /// Name of the output file, without extension. Defaults to the source
    /// file's stem.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Target platform.
    #[arg(long, value_enum, default_value_t = PlatformArg::Linux64)]
    pub platform: PlatformArg,

    /// Assembly syntax to emit.
    #[arg(long, value_enum, default_value_t = SyntaxArg::Nasm)]
    pub syntax: SyntaxArg,

    /// Invoke the assembler (and linker, for NASM) after generating assembly.
    #[arg(short = 'c', long)]
    pub compile: bool,

    /// Log at debug level instead of info level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the assembler executable for the target platform.
    #[arg(short = 'a', long)]
    pub assembler_path: Option<String>,

    /// Override the assembler's command-line options.
    #[arg(long)]
    pub assembler_options: Option<String>,

    /// Append an extra assembler option. Repeatable.
    #[arg(long = "add-asm-opt")]
    pub add_asm_opt: Vec<String>,

    /// Override the linker executable for the target platform.
    #[arg(short = 'l', long)]
    pub linker_path: Option<String>,

    /// Override the linker's command-line options.
    #[arg(long)]
    pub linker_options: Option<String>,

    /// Append an extra linker option. Repeatable.
    #[arg(long = "add-link-opt")]
    pub add_link_opt: Vec<String>,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }

    pub fn to_options(&self) -> CompileOptions {
        let output_name = self.output.clone().unwrap_or_else(|| {
            self.file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "out".to_string())
        });

        CompileOptions {
            source_path: self.file.clone(),
            output_name,
            platform: self.platform.into(),
            syntax: self.syntax.into(),
            mode: if self.compile { Mode::Compile } else { Mode::Generate },
            verbose: self.verbose,
            assembler_path: self.assembler_path.clone(),
            assembler_opts: self.assembler_options.clone(),
            extra_assembler_opts: self.add_asm_opt.clone(),
            linker_path: self.linker_path.clone(),
            linker_opts: self.linker_options.clone(),
            extra_linker_opts: self.add_link_opt.clone(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PlatformArg {
    Win64,
    Linux64,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Win64 => Platform::Win64,
            PlatformArg::Linux64 => Platform::Linux64,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SyntaxArg {
    Nasm,
    Gas,
}

impl From<SyntaxArg> for Syntax {
    fn from(value: SyntaxArg) -> Self {
        match value {
            SyntaxArg::Nasm => Syntax::Nasm,
            SyntaxArg::Gas => Syntax::Gas,
        }
    }
}
