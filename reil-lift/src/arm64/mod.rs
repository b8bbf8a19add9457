//! AArch64 translation.

mod arithmetic;
pub mod conditional;
mod control_flow;
mod memory;
pub mod operand;

use std::collections::HashMap;

use reil_il::{Instruction, Register, Temporary};

use crate::context::BlockBuilder;
use crate::driver::{Arch, Blocks};
use crate::error::TranslationError;
use crate::insn::{Disassembler, Groups, Insn};

pub use conditional::Arm64Condition;

/// Register identifiers of the decoded AArch64 operand records.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm64Reg {
    X0, X1, X2, X3, X4, X5, X6, X7, X8, X9, X10, X11, X12, X13, X14, X15,
    X16, X17, X18, X19, X20, X21, X22, X23, X24, X25, X26, X27, X28, X29, X30,
    Sp, Lr, Xzr,
    W0, W1, W2, W3, W4, W5, W6, W7, W8, W9, W10, W11, W12, W13, W14, W15,
    W16, W17, W18, W19, W20, W21, W22, W23, W24, W25, W26, W27, W28, W29, W30,
    Wsp, Wzr,
}

/// Opcode identifiers of the decoded AArch64 instruction records.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm64Op {
    B,
    Cmp,
    Mov,
    Mrs,
    Stp,
    Str,
    Sub,
}

/// A decoded AArch64 instruction record.
pub type Arm64Insn = Insn<Arm64Op, Arm64Reg>;

/// Translation context for AArch64.
pub struct Arm64Context {
    blk: BlockBuilder,
    registers: HashMap<Arm64Reg, Register>,
    /// Architectural word size in bits.
    pub word_size: u16,
    /// The stack pointer.
    pub stack_ptr: Register,
    /// The link register.
    pub link_reg: Register,
    /// The program counter.
    pub program_ctr: Register,
}

impl Arm64Context {
    /// A fresh AArch64 context.
    pub fn new() -> Self {
        let mut registers = HashMap::new();
        for (id, name) in [
            (Arm64Reg::X0, "x0"),
            (Arm64Reg::X1, "x1"),
            (Arm64Reg::X2, "x2"),
            (Arm64Reg::X3, "x3"),
            (Arm64Reg::X4, "x4"),
            (Arm64Reg::X5, "x5"),
            (Arm64Reg::X6, "x6"),
            (Arm64Reg::X7, "x7"),
            (Arm64Reg::X8, "x8"),
            (Arm64Reg::X9, "x9"),
            (Arm64Reg::X10, "x10"),
            (Arm64Reg::X11, "x11"),
            (Arm64Reg::X12, "x12"),
            (Arm64Reg::X13, "x13"),
            (Arm64Reg::X14, "x14"),
            (Arm64Reg::X15, "x15"),
            (Arm64Reg::X16, "x16"),
            (Arm64Reg::X17, "x17"),
            (Arm64Reg::X18, "x18"),
            (Arm64Reg::X19, "x19"),
            (Arm64Reg::X20, "x20"),
            (Arm64Reg::X21, "x21"),
            (Arm64Reg::X22, "x22"),
            (Arm64Reg::X23, "x23"),
            (Arm64Reg::X24, "x24"),
            (Arm64Reg::X25, "x25"),
            (Arm64Reg::X26, "x26"),
            (Arm64Reg::X27, "x27"),
            (Arm64Reg::X28, "x28"),
            (Arm64Reg::X29, "x29"),
            (Arm64Reg::X30, "x30"),
            (Arm64Reg::Sp, "sp"),
            (Arm64Reg::Lr, "lr"),
        ] {
            registers.insert(id, Register::new(name, 64));
        }

        Arm64Context {
            blk: BlockBuilder::default(),
            word_size: 64,
            stack_ptr: registers[&Arm64Reg::Sp].clone(),
            link_reg: registers[&Arm64Reg::Lr].clone(),
            program_ctr: Register::new("pc", 64),
            registers,
        }
    }

    pub(crate) fn tmp(&mut self, size: u16) -> Temporary {
        self.blk.tmp(size)
    }

    pub(crate) fn emit(&mut self, instruction: Instruction) {
        self.blk.emit(instruction);
    }

    pub(crate) fn finalise(&mut self) -> Result<Vec<Instruction>, TranslationError> {
        self.blk.finalise()
    }

    pub(crate) fn reset(&mut self) {
        self.blk.reset();
    }

    pub(crate) fn full_register(&self, reg: Arm64Reg) -> Result<Register, TranslationError> {
        self.registers
            .get(&reg)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownRegister(format!("{reg:?}")))
    }
}

impl Default for Arm64Context {
    fn default() -> Self {
        Self::new()
    }
}

/// System-register reads are outside the model; the destination simply
/// stops being known.
fn mrs(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    operand::undefine(ctx, i, 0)
}

fn dispatch(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    match i.op {
        Arm64Op::B => control_flow::b(ctx, i),
        Arm64Op::Cmp => arithmetic::cmp(ctx, i),
        Arm64Op::Mov => memory::mov(ctx, i),
        Arm64Op::Mrs => mrs(ctx, i),
        Arm64Op::Stp => memory::stp(ctx, i),
        Arm64Op::Str => memory::str(ctx, i),
        Arm64Op::Sub => arithmetic::sub(ctx, i),
    }
}

/// Marker type wiring AArch64 into the generic driver.
pub enum Arm64Arch {}

impl Arch for Arm64Arch {
    type Op = Arm64Op;
    type Reg = Arm64Reg;
    type Context = Arm64Context;

    fn translate(
        ctx: &mut Arm64Context,
        i: &Arm64Insn,
    ) -> Result<Vec<Instruction>, TranslationError> {
        match dispatch(ctx, i) {
            Ok(()) => ctx.finalise(),
            Err(e) => {
                ctx.reset();
                Err(e)
            }
        }
    }

    fn ends_basic_block(i: &Arm64Insn) -> bool {
        i.groups.contains(Groups::JUMP) || matches!(i.op, Arm64Op::B)
    }
}

/// Translate AArch64 machine code starting at `base_address`.
pub fn translate_arm64<'a, D>(dis: D, code: &'a [u8], base_address: u64) -> Blocks<'a, Arm64Arch, D>
where
    D: Disassembler<Op = Arm64Op, Reg = Arm64Reg>,
{
    Blocks::new(Arm64Context::new(), dis, code, base_address)
}
