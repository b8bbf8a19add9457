//! ARMv7 and Thumb-2 translation.

mod arithmetic;
mod control_flow;
mod memory;
pub mod operand;
mod utilities;

use std::collections::HashMap;

use reil_il::shorthand::unkn_;
use reil_il::{Instruction, Operand as IlOperand, Register, Temporary};
use tracing::debug;

use crate::context::BlockBuilder;
use crate::driver::{Arch, Blocks};
use crate::error::TranslationError;
use crate::insn::{Disassembler, Groups, Insn};

/// Register identifiers of the decoded ARM operand records.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmReg {
    R0, R1, R2, R3, R4, R5, R6, R7, R8, R9, R10, R11, R12,
    Sp, Lr, Pc,
}

/// Opcode identifiers of the decoded ARM instruction records.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmOp {
    Add,
    B,
    Blx,
    Cmp,
    Mov,
    Movt,
    Movw,
    Msr,
    Push,
    Stm,
    Str,
    Sub,
}

/// A decoded ARM instruction record.
pub type ArmInsn = Insn<ArmOp, ArmReg>;

/// Translation context for ARMv7 and Thumb-2.
pub struct ArmContext {
    blk: BlockBuilder,
    registers: HashMap<ArmReg, Register>,
    /// Architectural word size in bits.
    pub word_size: u16,
    pub(crate) thumb: bool,
    pub(crate) stack_ptr: Register,
    /// The link register.
    pub link_reg: Register,
    /// The program counter.
    pub program_ctr: Register,
}

impl ArmContext {
    /// A context for the given instruction-set state.
    pub fn new(thumb: bool) -> Self {
        let mut registers = HashMap::new();
        for (id, name) in [
            (ArmReg::R0, "r0"),
            (ArmReg::R1, "r1"),
            (ArmReg::R2, "r2"),
            (ArmReg::R3, "r3"),
            (ArmReg::R4, "r4"),
            (ArmReg::R5, "r5"),
            (ArmReg::R6, "r6"),
            (ArmReg::R7, "r7"),
            (ArmReg::R8, "r8"),
            (ArmReg::R9, "r9"),
            (ArmReg::R10, "r10"),
            (ArmReg::R11, "r11"),
            (ArmReg::R12, "r12"),
            (ArmReg::Sp, "sp"),
            (ArmReg::Lr, "lr"),
            (ArmReg::Pc, "pc"),
        ] {
            registers.insert(id, Register::new(name, 32));
        }

        ArmContext {
            blk: BlockBuilder::default(),
            word_size: 32,
            thumb,
            stack_ptr: registers[&ArmReg::Sp].clone(),
            link_reg: registers[&ArmReg::Lr].clone(),
            program_ctr: registers[&ArmReg::Pc].clone(),
            registers,
        }
    }

    pub(crate) fn tmp(&mut self, size: u16) -> Temporary {
        self.blk.tmp(size)
    }

    pub(crate) fn emit(&mut self, instruction: Instruction) {
        self.blk.emit(instruction);
    }

    #[allow(dead_code)]
    pub(crate) fn label(&mut self, name: &'static str) {
        self.blk.label(name);
    }

    #[allow(dead_code)]
    pub(crate) fn jump(&mut self, condition: impl Into<IlOperand>, label: &'static str) {
        self.blk.jump(condition, label);
    }

    pub(crate) fn finalise(&mut self) -> Result<Vec<Instruction>, TranslationError> {
        self.blk.finalise()
    }

    pub(crate) fn reset(&mut self) {
        self.blk.reset();
    }

    pub(crate) fn full_register(&self, reg: ArmReg) -> Result<Register, TranslationError> {
        self.registers
            .get(&reg)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownRegister(format!("{reg:?}")))
    }
}

/// Reads of the status register cannot be modeled; they are an opaque step.
fn msr(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    debug!(address = i.address, mnemonic = %i.mnemonic, "opaque instruction");
    ctx.emit(unkn_());
    Ok(())
}

fn dispatch(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    match i.op {
        ArmOp::Add => arithmetic::add(ctx, i),
        ArmOp::B => control_flow::b(ctx, i),
        ArmOp::Blx => control_flow::blx(ctx, i),
        ArmOp::Cmp => arithmetic::cmp(ctx, i),
        ArmOp::Mov => memory::mov(ctx, i),
        ArmOp::Movt => memory::movt(ctx, i),
        ArmOp::Movw => memory::movw(ctx, i),
        ArmOp::Msr => msr(ctx, i),
        ArmOp::Push => memory::push(ctx, i),
        ArmOp::Stm => memory::stm(ctx, i),
        ArmOp::Str => memory::str(ctx, i),
        ArmOp::Sub => arithmetic::sub(ctx, i),
    }
}

/// Marker type wiring ARM into the generic driver.
pub enum ArmArch {}

impl Arch for ArmArch {
    type Op = ArmOp;
    type Reg = ArmReg;
    type Context = ArmContext;

    fn translate(ctx: &mut ArmContext, i: &ArmInsn) -> Result<Vec<Instruction>, TranslationError> {
        match dispatch(ctx, i) {
            Ok(()) => ctx.finalise(),
            Err(e) => {
                ctx.reset();
                Err(e)
            }
        }
    }

    fn ends_basic_block(i: &ArmInsn) -> bool {
        i.groups.contains(Groups::JUMP) || matches!(i.op, ArmOp::B | ArmOp::Blx)
    }
}

/// Translate ARM (or Thumb) machine code starting at `base_address`.
pub fn translate_arm<'a, D>(
    dis: D,
    code: &'a [u8],
    base_address: u64,
    thumb: bool,
) -> Blocks<'a, ArmArch, D>
where
    D: Disassembler<Op = ArmOp, Reg = ArmReg>,
{
    Blocks::new(ArmContext::new(thumb), dis, code, base_address)
}
