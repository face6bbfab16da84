//! The `CompileOptions` record the core is driven by.
//!
//! Everything here is an immutable value constructed once by the CLI layer
//! and threaded through the pipeline explicitly -- there is no module-level
//! mutable global, unlike the source this crate is descended from.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Win64,
    Linux64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Nasm,
    Gas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Emit assembly only.
    Generate,
    /// Emit assembly, then invoke the assembler (and linker, for NASM) to
    /// produce an executable.
    Compile,
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub source_path: PathBuf,
    pub output_name: String,
    pub platform: Platform,
    pub syntax: Syntax,
    pub mode: Mode,
    pub verbose: bool,
    /// Overrides `platform.default_assembler()` when set.
    pub assembler_path: Option<String>,
    /// Overrides `platform.default_assembler_opts(syntax)` when set.
    pub assembler_opts: Option<String>,
    /// Appended after the resolved assembler options.
    pub extra_assembler_opts: Vec<String>,
    /// Overrides `platform.default_linker()` when set.
    pub linker_path: Option<String>,
    /// Overrides `platform.default_linker_opts()` when set.
    pub linker_opts: Option<String>,
    /// Appended after the resolved linker options.
    pub extra_linker_opts: Vec<String>,
}

impl CompileOptions {
    pub fn resolved_assembler(&self) -> String {
        self.assembler_path.clone().unwrap_or_else(|| self.platform.default_assembler().to_string())
    }

    pub fn resolved_assembler_opts(&self) -> Vec<String> {
        let base = self.assembler_opts.clone().unwrap_or_else(|| {
            self.platform.default_assembler_opts(self.syntax).to_string()
        });
        let mut opts: Vec<String> = base.split_whitespace().map(str::to_string).collect();
        opts.extend(self.extra_assembler_opts.iter().cloned());
        opts
    }

    pub fn resolved_linker(&self) -> String {
        self.linker_path.clone().unwrap_or_else(|| self.platform.default_linker().to_string())
    }

    pub fn resolved_linker_opts(&self) -> Vec<String> {
        let base = self.linker_opts.clone().unwrap_or_else(|| self.platform.default_linker_opts().to_string());
        let mut opts: Vec<String> = base.split_whitespace().map(str::to_string).collect();
        opts.extend(self.extra_linker_opts.iter().cloned());
        opts
    }
}

impl Platform {
    pub fn default_assembler(self) -> &'static str {
        match self {
            Platform::Win64 => "\\NASM\\nasm.exe",
            Platform::Linux64 => "nasm",
        }
    }

    pub fn default_assembler_opts(self, syntax: Syntax) -> &'static str {
        match (self, syntax) {
            (Platform::Win64, Syntax::Nasm) => "-f win64",
            (Platform::Win64, Syntax::Gas) => "-e main",
            (Platform::Linux64, Syntax::Nasm) => "-f elf64",
            (Platform::Linux64, Syntax::Gas) => "-e main",
        }
    }

    pub fn default_linker(self) -> &'static str {
        match self {
            Platform::Win64 => "\\Golink\\golink.exe",
            Platform::Linux64 => "ld",
        }
    }

    pub fn default_linker_opts(self) -> &'static str {
        match self {
            Platform::Win64 => "/console /ENTRY:main msvcrt.dll",
            Platform::Linux64 => "-dynamic-linker /lib64/ld-linux-x86-64.so.2 -lc -m elf_x86_64",
        }
    }
}

impl Syntax {
    pub fn output_extension(self) -> &'static str {
        match self {
            Syntax::Nasm => "asm",
            Syntax::Gas => "s",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_options() -> CompileOptions {
        CompileOptions {
            source_path: PathBuf::from("prog.corth"),
            output_name: "prog".to_string(),
            platform: Platform::Linux64,
            syntax: Syntax::Nasm,
            mode: Mode::Generate,
            verbose: false,
            assembler_path: None,
            assembler_opts: None,
            extra_assembler_opts: Vec::new(),
            linker_path: None,
            linker_opts: None,
            extra_linker_opts: Vec::new(),
        }
    }

    #[test]
    fn falls_back_to_platform_defaults_when_unset() {
        let options = base_options();
        assert_eq!(options.resolved_assembler(), "nasm");
        assert_eq!(options.resolved_assembler_opts(), vec!["-f", "elf64"]);
    }

    #[test]
    fn override_replaces_the_default_entirely() {
        let mut options = base_options();
        options.assembler_path = Some("my-nasm".to_string());
        options.assembler_opts = Some("-f bin".to_string());
        assert_eq!(options.resolved_assembler(), "my-nasm");
        assert_eq!(options.resolved_assembler_opts(), vec!["-f", "bin"]);
    }

    #[test]
    fn extra_opts_are_appended_after_the_base() {
        let mut options = base_options();
        options.extra_linker_opts = vec!["--strip-all".to_string()];
        let opts = options.resolved_linker_opts();
        assert_eq!(opts.last().unwrap(), "--strip-all");
    }
}
