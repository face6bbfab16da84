//! Code generation: lowers the resolved token stream to the internal IR
//! (see [`ir`]) and renders it through one [`profile::Backend`] chosen by
//! `(platform, syntax)`, replacing four near-duplicated
//! `GenerateAssembly_*` functions with one render loop.

pub mod ir;
pub mod profile;

use std::io::Write;
use std::path::PathBuf;

use crate::error::EmitError;
use crate::options::{CompileOptions, Platform, Syntax};
use crate::token::Token;
use ir::{Inst, Inst::*};
use profile::{AbiProfile, Backend, GasBackend, NasmBackend, Reg};

/// The platform/syntax pair a `Backend` is chosen for, plus the one
/// cross-cutting exception (`_start` vs `main`) that doesn't belong to
/// either axis alone.
pub struct Target {
    pub platform: Platform,
    pub syntax: Syntax,
}

impl Target {
    pub fn entry_symbol(&self) -> &'static str {
        match (self.platform, self.syntax) {
            (Platform::Linux64, Syntax::Nasm) => "_start",
            _ => "main",
        }
    }

    fn backend(&self) -> Box<dyn Backend> {
        match self.syntax {
            Syntax::Nasm => Box::new(NasmBackend),
            Syntax::Gas => Box::new(GasBackend),
        }
    }
}

/// Renders `tokens` as assembly text for `target` into `writer`.
///
/// Exposed separately from [`emit`] so tests can render into an in-memory
/// buffer without touching the filesystem.
pub fn emit_to<W: Write>(tokens: &[Token], target: &Target, writer: &mut W) -> Result<(), EmitError> {
    let (instrs, strings) = ir::lower(tokens);
    let backend = target.backend();
    let abi = AbiProfile::for_platform(target.platform);
    let entry_symbol = target.entry_symbol();

    let mut out = String::new();
    backend.prologue(&mut out, entry_symbol, entry_symbol == "_start");
    render(&*backend, &abi, &instrs, &mut out);
    backend.epilogue(&mut out, &abi);
    backend.data_section(&mut out, &strings);
    backend.bss_section(&mut out);

    writer.write_all(out.as_bytes())?;
    Ok(())
}

/// Renders `tokens` to `<options.output_name>.<ext>` next to the current
/// directory and returns the path written.
pub fn emit(tokens: &[Token], options: &CompileOptions) -> Result<PathBuf, EmitError> {
    let target = Target { platform: options.platform, syntax: options.syntax };
    let path = PathBuf::from(format!("{}.{}", options.output_name, options.syntax.output_extension()));
    let mut file = std::fs::File::create(&path)?;
    emit_to(tokens, &target, &mut file)?;
    Ok(path)
}

fn render(backend: &dyn Backend, abi: &AbiProfile, instrs: &[Inst], out: &mut String) {
    for (i, inst) in instrs.iter().enumerate() {
        match inst {
            // `else`/`endwhile` are unconditional jumps whose own index is
            // the label the matching `if`/`do` jumps to; the jump must be
            // emitted before that label, or the jump lands on itself.
            Else { target } | EndWhile { target } => {
                backend.jmp(out, *target);
                backend.label(out, i);
            }
            _ => {
                backend.label(out, i);
                render_one(backend, abi, *inst, out);
            }
        }
    }
}

fn render_one(backend: &dyn Backend, abi: &AbiProfile, inst: Inst, out: &mut String) {
    match inst {
        PushInt(n) => backend.push_imm(out, n),
        PushStr(idx) => backend.push_str_addr(out, idx),
        Add => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.add(out, Reg::Rax, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
        }
        Sub => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.sub(out, Reg::Rax, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
        }
        Mul => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.mul_unsigned(out, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
        }
        Div => {
            backend.xor_zero(out, Reg::Rdx);
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.div_unsigned(out, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
        }
        Mod => {
            backend.xor_zero(out, Reg::Rdx);
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.div_unsigned(out, Reg::Rbx);
            backend.push_reg(out, Reg::Rdx);
        }
        Compare(cc) => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.cmp(out, Reg::Rax, Reg::Rbx);
            backend.mov_reg_imm(out, Reg::Rcx, 0);
            backend.mov_reg_imm(out, Reg::Rdx, 1);
            backend.cmov(out, cc, Reg::Rcx, Reg::Rdx);
            backend.push_reg(out, Reg::Rcx);
        }
        Shift { left } => {
            backend.pop_reg(out, Reg::Rcx);
            backend.pop_reg(out, Reg::Rbx);
            backend.shift(out, left, Reg::Rbx);
            backend.push_reg(out, Reg::Rbx);
        }
        Bitwise(op) => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.bitwise(out, op, Reg::Rax, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
        }
        Dump(flavor) => backend.call_printf(out, flavor, abi),
        Drop => backend.pop_reg(out, Reg::Rax),
        Dup => {
            backend.pop_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rax);
        }
        TwoDup => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rbx);
        }
        Swap => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
        }
        Over => {
            backend.pop_reg(out, Reg::Rbx);
            backend.pop_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rax);
            backend.push_reg(out, Reg::Rbx);
            backend.push_reg(out, Reg::Rax);
        }
        Mem => backend.push_mem_addr(out),
        LoadB => {
            backend.pop_reg(out, Reg::Rax);
            backend.xor_zero(out, Reg::Rbx);
            backend.load_byte(out, Reg::Rbx, Reg::Rax);
            backend.push_reg(out, Reg::Rbx);
        }
        StoreB => {
            backend.pop_reg(out, Reg::Rbx); // value (top of stack)
            backend.pop_reg(out, Reg::Rax); // address
            backend.store_byte(out, Reg::Rax, Reg::Rbx);
        }
        If { target } => {
            backend.pop_reg(out, Reg::Rax);
            backend.xor_zero(out, Reg::Rbx);
            backend.cmp(out, Reg::Rax, Reg::Rbx);
            backend.je(out, target);
        }
        Endif => {}
        While => {}
        Do { target } => {
            backend.pop_reg(out, Reg::Rax);
            backend.xor_zero(out, Reg::Rbx);
            backend.cmp(out, Reg::Rax, Reg::Rbx);
            backend.je(out, target);
        }
        Else { .. } | EndWhile { .. } => {
            unreachable!("render() emits these directly, with the label after the jump")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::tokenize;
    use crate::resolver::{resolve_blocks, strip_whitespace};
    use crate::validator::validate_stack;

    fn compile(source: &str, platform: Platform, syntax: Syntax) -> String {
        let mut diagnostics: Diagnostics = Vec::new();
        let mut tokens = tokenize(source, &mut diagnostics).unwrap();
        validate_stack(&mut tokens, &mut diagnostics);
        resolve_blocks(&mut tokens).unwrap();
        let tokens = strip_whitespace(tokens);
        let target = Target { platform, syntax };
        let mut buf = Vec::new();
        emit_to(&tokens, &target, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn nasm_linux_uses_start_as_entry() {
        let asm = compile("1 2 + #", Platform::Linux64, Syntax::Nasm);
        assert!(asm.contains("_start:"));
        assert!(asm.contains("global _start"));
    }

    #[test]
    fn nasm_win64_uses_main_as_entry() {
        let asm = compile("1 2 + #", Platform::Win64, Syntax::Nasm);
        assert!(asm.contains("main:"));
        assert!(!asm.contains("_start"));
    }

    #[test]
    fn gas_linux_uses_main_as_entry() {
        let asm = compile("1 2 + #", Platform::Linux64, Syntax::Gas);
        assert!(asm.contains("main:"));
        assert!(!asm.contains("_start"));
    }

    #[test]
    fn win64_wraps_printf_in_shadow_space_but_not_exit() {
        let asm = compile("65 dump_c", Platform::Win64, Syntax::Nasm);
        assert!(asm.contains("sub rsp, 32"));
        let exit_pos = asm.find("call exit").unwrap();
        let preceding = &asm[..exit_pos];
        assert!(!preceding.ends_with("sub rsp, 32\n"));
    }

    #[test]
    fn linux_never_emits_shadow_space() {
        let asm = compile("65 dump_c", Platform::Linux64, Syntax::Nasm);
        assert!(!asm.contains("sub rsp, 32"));
    }

    #[test]
    fn string_literal_is_collected_into_data_section() {
        let asm = compile("\"hi\" dump_s", Platform::Linux64, Syntax::Gas);
        assert!(asm.contains("str_0: .string \"hi\""));
    }

    #[test]
    fn storeb_pops_value_before_address() {
        // `mem 65 storeb` leaves `mem`'s address under the value `65` on
        // the stack; the value (top) must land in bl, the address in rax.
        let asm = compile("mem 65 storeb mem loadb dump_c", Platform::Linux64, Syntax::Nasm);
        let expected_store = "\
pop rbx
pop rax
mov [rax], bl
";
        assert!(asm.contains(expected_store), "storeb sequence:\n{asm}");

        let expected_load = "\
pop rax
xor rbx, rbx
mov bl, [rax]
push rbx
";
        assert!(asm.contains(expected_load), "loadb sequence:\n{asm}");
    }

    #[test]
    fn else_jump_is_emitted_before_its_own_label() {
        let asm = compile("1 if 42 # else 13 # endif", Platform::Linux64, Syntax::Nasm);
        // `else`'s own index (4) is what `if`'s `je` targets; the jump
        // skipping the else body (to `endif`, index 7) must come first,
        // or `je addr_4` would land on an unconditional jump back to
        // itself instead of falling into the else body at addr_5.
        assert!(asm.contains("jmp addr_7\naddr_4:\n"));
        assert!(asm.contains("je addr_4"));
    }

    #[test]
    fn endwhile_jump_is_emitted_before_its_own_label() {
        let asm = compile("3 while dup 0 > do dup # 1 - endwhile drop", Platform::Linux64, Syntax::Nasm);
        // `endwhile`'s own index (10) is what `do`'s exit `je` targets;
        // the jump back to the condition (addr_1) must come first, or
        // the loop exit would jump straight back into the loop.
        assert!(asm.contains("jmp addr_1\naddr_10:\n"));
        assert!(asm.contains("je addr_10"));
    }

    #[test]
    fn mem_reserves_720000_bytes() {
        let asm = compile("mem drop", Platform::Linux64, Syntax::Nasm);
        assert!(asm.contains("resb 720000"));
    }

    #[test]
    fn every_emitted_file_ends_with_a_trailing_newline() {
        let asm = compile("1 #", Platform::Linux64, Syntax::Nasm);
        assert!(asm.ends_with('\n'));
    }
}
