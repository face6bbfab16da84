//! Syntax and ABI profiles: the two value-level descriptors the single
//! emitter loop (`crate::emitter::emit`) is parameterized over, replacing
//! four near-duplicated `GenerateAssembly_*` functions with one loop and
//! a trait object chosen once per compile.

use crate::emitter::ir::{BitOp, Cc, DumpFlavor};
use crate::options::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    /// Only ever used as an argument register for the Linux System V
    /// `printf`/`exit` calls, never by the internal stack arithmetic.
    Rdi,
    Rsi,
}

impl Reg {
    fn nasm(self) -> &'static str {
        match self {
            Reg::Rax => "rax",
            Reg::Rbx => "rbx",
            Reg::Rcx => "rcx",
            Reg::Rdx => "rdx",
            Reg::Rdi => "rdi",
            Reg::Rsi => "rsi",
        }
    }

    fn gas(self) -> &'static str {
        match self {
            Reg::Rax => "%rax",
            Reg::Rbx => "%rbx",
            Reg::Rcx => "%rcx",
            Reg::Rdx => "%rdx",
            Reg::Rdi => "%rdi",
            Reg::Rsi => "%rsi",
        }
    }

    fn low8_nasm(self) -> &'static str {
        match self {
            Reg::Rax => "al",
            Reg::Rbx => "bl",
            Reg::Rcx => "cl",
            Reg::Rdx => "dl",
            Reg::Rdi => "dil",
            Reg::Rsi => "sil",
        }
    }

    fn low8_gas(self) -> &'static str {
        match self {
            Reg::Rax => "%al",
            Reg::Rbx => "%bl",
            Reg::Rcx => "%cl",
            Reg::Rdx => "%dl",
            Reg::Rdi => "%dil",
            Reg::Rsi => "%sil",
        }
    }
}

/// The ABI half of the pair: which registers carry the `printf`/`exit`
/// arguments, and whether the caller owes the callee shadow space.
pub struct AbiProfile {
    pub dump_fmt_reg: Reg,
    pub dump_value_reg: Reg,
    pub exit_code_reg: Reg,
    pub shadow_space: bool,
}

impl AbiProfile {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Linux64 => AbiProfile {
                dump_fmt_reg: Reg::Rdi,
                dump_value_reg: Reg::Rsi,
                exit_code_reg: Reg::Rdi,
                shadow_space: false,
            },
            Platform::Win64 => AbiProfile {
                dump_fmt_reg: Reg::Rcx,
                dump_value_reg: Reg::Rdx,
                exit_code_reg: Reg::Rcx,
                shadow_space: true,
            },
        }
    }
}

/// One line of rendered assembly text (always newline-terminated).
pub trait Backend {
    fn comment_prefix(&self) -> &'static str;

    fn prologue(&self, out: &mut String, entry_symbol: &str, declare_start: bool);
    fn epilogue(&self, out: &mut String, abi: &AbiProfile);

    fn label(&self, out: &mut String, idx: usize);
    fn jmp(&self, out: &mut String, target: usize);
    fn je(&self, out: &mut String, target: usize);

    fn push_imm(&self, out: &mut String, value: i64);
    fn push_reg(&self, out: &mut String, reg: Reg);
    fn pop_reg(&self, out: &mut String, reg: Reg);
    fn push_mem_addr(&self, out: &mut String);
    fn push_str_addr(&self, out: &mut String, idx: usize);

    fn mov_reg_imm(&self, out: &mut String, dst: Reg, value: i64);
    fn xor_zero(&self, out: &mut String, reg: Reg);
    fn add(&self, out: &mut String, dst: Reg, src: Reg);
    fn sub(&self, out: &mut String, dst: Reg, src: Reg);
    fn mul_unsigned(&self, out: &mut String, src: Reg);
    fn div_unsigned(&self, out: &mut String, src: Reg);
    fn cmp(&self, out: &mut String, a: Reg, b: Reg);
    fn cmov(&self, out: &mut String, cc: Cc, dst: Reg, src: Reg);
    fn shift(&self, out: &mut String, left: bool, reg: Reg);
    fn bitwise(&self, out: &mut String, op: BitOp, dst: Reg, src: Reg);
    fn load_byte(&self, out: &mut String, dst: Reg, addr_reg: Reg);
    fn store_byte(&self, out: &mut String, addr_reg: Reg, src: Reg);

    fn enter_call_frame(&self, out: &mut String, abi: &AbiProfile);
    fn leave_call_frame(&self, out: &mut String, abi: &AbiProfile);
    fn call_printf(&self, out: &mut String, flavor: DumpFlavor, abi: &AbiProfile);

    fn data_section(&self, out: &mut String, strings: &[String]);
    fn bss_section(&self, out: &mut String);
}

fn cc_suffix(cc: Cc) -> &'static str {
    match cc {
        Cc::Eq => "e",
        Cc::Lt => "l",
        Cc::Gt => "g",
        Cc::Le => "le",
        Cc::Ge => "ge",
    }
}

pub struct NasmBackend;

impl Backend for NasmBackend {
    fn comment_prefix(&self) -> &'static str {
        ";;"
    }

    fn prologue(&self, out: &mut String, entry_symbol: &str, declare_start: bool) {
        out.push_str("SECTION .text\n");
        out.push_str("extern printf\n");
        out.push_str("extern exit\n");
        out.push_str(&format!("global {entry_symbol}\n"));
        let _ = declare_start;
        out.push_str(&format!("{entry_symbol}:\n"));
    }

    fn epilogue(&self, out: &mut String, abi: &AbiProfile) {
        out.push_str(&format!("mov {}, 0\n", abi.exit_code_reg.nasm()));
        out.push_str("call exit\n");
    }

    fn label(&self, out: &mut String, idx: usize) {
        out.push_str(&format!("addr_{idx}:\n"));
    }

    fn jmp(&self, out: &mut String, target: usize) {
        out.push_str(&format!("jmp addr_{target}\n"));
    }

    fn je(&self, out: &mut String, target: usize) {
        out.push_str(&format!("je addr_{target}\n"));
    }

    fn push_imm(&self, out: &mut String, value: i64) {
        out.push_str(&format!("push {value}\n"));
    }

    fn push_reg(&self, out: &mut String, reg: Reg) {
        out.push_str(&format!("push {}\n", reg.nasm()));
    }

    fn pop_reg(&self, out: &mut String, reg: Reg) {
        out.push_str(&format!("pop {}\n", reg.nasm()));
    }

    fn push_mem_addr(&self, out: &mut String) {
        out.push_str("push mem\n");
    }

    fn push_str_addr(&self, out: &mut String, idx: usize) {
        out.push_str(&format!("push str_{idx}\n"));
    }

    fn mov_reg_imm(&self, out: &mut String, dst: Reg, value: i64) {
        out.push_str(&format!("mov {}, {}\n", dst.nasm(), value));
    }

    fn xor_zero(&self, out: &mut String, reg: Reg) {
        out.push_str(&format!("xor {}, {}\n", reg.nasm(), reg.nasm()));
    }

    fn add(&self, out: &mut String, dst: Reg, src: Reg) {
        out.push_str(&format!("add {}, {}\n", dst.nasm(), src.nasm()));
    }

    fn sub(&self, out: &mut String, dst: Reg, src: Reg) {
        out.push_str(&format!("sub {}, {}\n", dst.nasm(), src.nasm()));
    }

    fn mul_unsigned(&self, out: &mut String, src: Reg) {
        out.push_str(&format!("mul {}\n", src.nasm()));
    }

    fn div_unsigned(&self, out: &mut String, src: Reg) {
        out.push_str(&format!("div {}\n", src.nasm()));
    }

    fn cmp(&self, out: &mut String, a: Reg, b: Reg) {
        out.push_str(&format!("cmp {}, {}\n", a.nasm(), b.nasm()));
    }

    fn cmov(&self, out: &mut String, cc: Cc, dst: Reg, src: Reg) {
        out.push_str(&format!("cmov{} {}, {}\n", cc_suffix(cc), dst.nasm(), src.nasm()));
    }

    fn shift(&self, out: &mut String, left: bool, reg: Reg) {
        let mnemonic = if left { "shl" } else { "shr" };
        out.push_str(&format!("{mnemonic} {}, cl\n", reg.nasm()));
    }

    fn bitwise(&self, out: &mut String, op: BitOp, dst: Reg, src: Reg) {
        let mnemonic = match op {
            BitOp::Or => "or",
            BitOp::And => "and",
        };
        out.push_str(&format!("{mnemonic} {}, {}\n", dst.nasm(), src.nasm()));
    }

    fn load_byte(&self, out: &mut String, dst: Reg, addr_reg: Reg) {
        out.push_str(&format!("mov {}, [{}]\n", dst.low8_nasm(), addr_reg.nasm()));
    }

    fn store_byte(&self, out: &mut String, addr_reg: Reg, src: Reg) {
        out.push_str(&format!("mov [{}], {}\n", addr_reg.nasm(), src.low8_nasm()));
    }

    fn enter_call_frame(&self, out: &mut String, abi: &AbiProfile) {
        if abi.shadow_space {
            out.push_str("sub rsp, 32\n");
        }
    }

    fn leave_call_frame(&self, out: &mut String, abi: &AbiProfile) {
        if abi.shadow_space {
            out.push_str("add rsp, 32\n");
        }
    }

    fn call_printf(&self, out: &mut String, flavor: DumpFlavor, abi: &AbiProfile) {
        let fmt_label = match flavor {
            DumpFlavor::Int => "fmt",
            DumpFlavor::Char => "fmt_char",
            DumpFlavor::Str => "fmt_str",
        };
        self.pop_reg(out, abi.dump_value_reg);
        out.push_str(&format!("lea {}, [rel {fmt_label}]\n", abi.dump_fmt_reg.nasm()));
        self.xor_zero(out, Reg::Rax);
        self.enter_call_frame(out, abi);
        out.push_str("call printf\n");
        self.leave_call_frame(out, abi);
    }

    fn data_section(&self, out: &mut String, strings: &[String]) {
        out.push_str("SECTION .data\n");
        out.push_str("fmt db '%u', 10, 0\n");
        out.push_str("fmt_char db '%c', 0\n");
        out.push_str("fmt_str db '%s', 0\n");
        for (i, s) in strings.iter().enumerate() {
            let bytes: Vec<String> = s.bytes().map(|b| format!("0x{b:02x}")).collect();
            if bytes.is_empty() {
                out.push_str(&format!("str_{i} db 0\n"));
            } else {
                out.push_str(&format!("str_{i} db {},0\n", bytes.join(",")));
            }
        }
    }

    fn bss_section(&self, out: &mut String) {
        out.push_str("SECTION .bss\n");
        out.push_str("mem resb 720000\n");
    }
}

pub struct GasBackend;

impl Backend for GasBackend {
    fn comment_prefix(&self) -> &'static str {
        "#"
    }

    fn prologue(&self, out: &mut String, entry_symbol: &str, _declare_start: bool) {
        out.push_str(".text\n");
        out.push_str(&format!(".globl {entry_symbol}\n"));
        out.push_str(&format!("{entry_symbol}:\n"));
    }

    fn epilogue(&self, out: &mut String, abi: &AbiProfile) {
        out.push_str(&format!("mov $0, {}\n", abi.exit_code_reg.gas()));
        out.push_str("call exit\n");
    }

    fn label(&self, out: &mut String, idx: usize) {
        out.push_str(&format!("addr_{idx}:\n"));
    }

    fn jmp(&self, out: &mut String, target: usize) {
        out.push_str(&format!("jmp addr_{target}\n"));
    }

    fn je(&self, out: &mut String, target: usize) {
        out.push_str(&format!("je addr_{target}\n"));
    }

    fn push_imm(&self, out: &mut String, value: i64) {
        out.push_str(&format!("push ${value}\n"));
    }

    fn push_reg(&self, out: &mut String, reg: Reg) {
        out.push_str(&format!("push {}\n", reg.gas()));
    }

    fn pop_reg(&self, out: &mut String, reg: Reg) {
        out.push_str(&format!("pop {}\n", reg.gas()));
    }

    fn push_mem_addr(&self, out: &mut String) {
        out.push_str("lea mem(%rip), %rax\n");
        out.push_str("push %rax\n");
    }

    fn push_str_addr(&self, out: &mut String, idx: usize) {
        out.push_str(&format!("lea str_{idx}(%rip), %rax\n"));
        out.push_str("push %rax\n");
    }

    fn mov_reg_imm(&self, out: &mut String, dst: Reg, value: i64) {
        out.push_str(&format!("mov ${}, {}\n", value, dst.gas()));
    }

    fn xor_zero(&self, out: &mut String, reg: Reg) {
        out.push_str(&format!("xor {}, {}\n", reg.gas(), reg.gas()));
    }

    fn add(&self, out: &mut String, dst: Reg, src: Reg) {
        out.push_str(&format!("add {}, {}\n", src.gas(), dst.gas()));
    }

    fn sub(&self, out: &mut String, dst: Reg, src: Reg) {
        out.push_str(&format!("sub {}, {}\n", src.gas(), dst.gas()));
    }

    fn mul_unsigned(&self, out: &mut String, src: Reg) {
        out.push_str(&format!("mul {}\n", src.gas()));
    }

    fn div_unsigned(&self, out: &mut String, src: Reg) {
        out.push_str(&format!("div {}\n", src.gas()));
    }

    fn cmp(&self, out: &mut String, a: Reg, b: Reg) {
        out.push_str(&format!("cmp {}, {}\n", b.gas(), a.gas()));
    }

    fn cmov(&self, out: &mut String, cc: Cc, dst: Reg, src: Reg) {
        out.push_str(&format!("cmov{} {}, {}\n", cc_suffix(cc), src.gas(), dst.gas()));
    }

    fn shift(&self, out: &mut String, left: bool, reg: Reg) {
        let mnemonic = if left { "shl" } else { "shr" };
        out.push_str(&format!("{mnemonic} %cl, {}\n", reg.gas()));
    }

    fn bitwise(&self, out: &mut String, op: BitOp, dst: Reg, src: Reg) {
        let mnemonic = match op {
            BitOp::Or => "or",
            BitOp::And => "and",
        };
        out.push_str(&format!("{mnemonic} {}, {}\n", src.gas(), dst.gas()));
    }

    fn load_byte(&self, out: &mut String, dst: Reg, addr_reg: Reg) {
        out.push_str(&format!("movb ({}), {}\n", addr_reg.gas(), dst.low8_gas()));
    }

    fn store_byte(&self, out: &mut String, addr_reg: Reg, src: Reg) {
        out.push_str(&format!("movb {}, ({})\n", src.low8_gas(), addr_reg.gas()));
    }

    fn enter_call_frame(&self, out: &mut String, abi: &AbiProfile) {
        if abi.shadow_space {
            out.push_str("sub $32, %rsp\n");
        }
    }

    fn leave_call_frame(&self, out: &mut String, abi: &AbiProfile) {
        if abi.shadow_space {
            out.push_str("add $32, %rsp\n");
        }
    }

    fn call_printf(&self, out: &mut String, flavor: DumpFlavor, abi: &AbiProfile) {
        let fmt_label = match flavor {
            DumpFlavor::Int => "fmt",
            DumpFlavor::Char => "fmt_char",
            DumpFlavor::Str => "fmt_str",
        };
        self.pop_reg(out, abi.dump_value_reg);
        out.push_str(&format!("lea {fmt_label}(%rip), {}\n", abi.dump_fmt_reg.gas()));
        self.xor_zero(out, Reg::Rax);
        self.enter_call_frame(out, abi);
        out.push_str("call printf\n");
        self.leave_call_frame(out, abi);
    }

    fn data_section(&self, out: &mut String, strings: &[String]) {
        out.push_str(".data\n");
        out.push_str("fmt: .string \"%u\\n\"\n");
        out.push_str("fmt_char: .string \"%c\"\n");
        out.push_str("fmt_str: .string \"%s\"\n");
        for (i, s) in strings.iter().enumerate() {
            out.push_str(&format!("str_{i}: .string \"{}\"\n", escape_gas_string(s)));
        }
    }

    fn bss_section(&self, out: &mut String) {
        out.push_str(".bss\n");
        out.push_str(".lcomm mem, 720000\n");
    }
}

fn escape_gas_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
