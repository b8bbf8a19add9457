//! Reading and writing AArch64 instruction operands.
//!
//! The `w` register names are 32-bit views of their `x` parents: reads
//! materialise a narrowed temporary, writes zero-extend into the parent.
//! The zero registers read as the constant 0 and silently discard writes.

use reil_il::bits::{mask, natural_size};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand as IlOperand, Register};

use crate::error::TranslationError;
use crate::insn::{MemOperand, Operand};

use super::{Arm64Context, Arm64Insn, Arm64Reg};

fn operand<'i>(i: &'i Arm64Insn, index: usize) -> Result<&'i Operand<Arm64Reg>, TranslationError> {
    i.operands
        .get(index)
        .ok_or(TranslationError::UnsupportedOperand)
}

fn w_parent(reg: Arm64Reg) -> Option<Arm64Reg> {
    use Arm64Reg::*;

    Some(match reg {
        W0 => X0, W1 => X1, W2 => X2, W3 => X3, W4 => X4, W5 => X5,
        W6 => X6, W7 => X7, W8 => X8, W9 => X9, W10 => X10, W11 => X11,
        W12 => X12, W13 => X13, W14 => X14, W15 => X15, W16 => X16,
        W17 => X17, W18 => X18, W19 => X19, W20 => X20, W21 => X21,
        W22 => X22, W23 => X23, W24 => X24, W25 => X25, W26 => X26,
        W27 => X27, W28 => X28, W29 => X29, W30 => X30, Wsp => Sp,
        _ => return None,
    })
}

/// The full architectural register behind a decoded register id.
pub(crate) fn parent_register(
    ctx: &Arm64Context,
    reg: Arm64Reg,
) -> Result<Register, TranslationError> {
    match w_parent(reg) {
        Some(parent) => ctx.full_register(parent),
        None => ctx.full_register(reg),
    }
}

fn get_register(ctx: &mut Arm64Context, reg: Arm64Reg) -> Result<IlOperand, TranslationError> {
    // the zero registers always read as zero
    if reg == Arm64Reg::Xzr {
        return Ok(Immediate::new(0, 64).into());
    }
    if reg == Arm64Reg::Wzr {
        return Ok(Immediate::new(0, 32).into());
    }

    if let Some(parent) = w_parent(reg) {
        let parent = ctx.full_register(parent)?;
        let value = ctx.tmp(32);
        ctx.emit(str_(parent, value));
        return Ok(value.into());
    }

    Ok(ctx.full_register(reg)?.into())
}

fn memory_address(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    mem: &MemOperand<Arm64Reg>,
    writeback: bool,
) -> Result<IlOperand, TranslationError> {
    let _ = i;
    let word = ctx.word_size;
    let disp = (mem.disp as i128 as u128) & mask(word);

    let address: IlOperand = match (disp != 0, mem.base) {
        (true, None) => Immediate::new(disp, word).into(),
        (false, Some(base)) => get_register(ctx, base)?,
        (true, Some(base)) => {
            let base = get_register(ctx, base)?;
            let tmp0 = ctx.tmp(word * 2);
            let address = ctx.tmp(word);

            ctx.emit(add_(base, Immediate::new(disp, word), tmp0));
            ctx.emit(and_(tmp0, Immediate::new(mask(word), word * 2), address));
            address.into()
        }
        (false, None) => Immediate::new(0, word).into(),
    };

    if writeback {
        if let Some(base) = mem.base {
            set_register(ctx, base, address.clone())?;
        }
    }

    Ok(address)
}

fn get_immediate(ctx: &Arm64Context, value: i64, size: u16) -> Immediate {
    let size = match size {
        0 => natural_size(value.unsigned_abs() as u128, ctx.word_size),
        size => size,
    };
    Immediate::new(value as i128 as u128, size)
}

/// Read operand `index` of `i`.
pub fn get(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    index: usize,
) -> Result<IlOperand, TranslationError> {
    get_sized(ctx, i, index, 0)
}

/// Read operand `index` of `i`, forcing immediates to `size` bits.
pub fn get_sized(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    index: usize,
    size: u16,
) -> Result<IlOperand, TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => get_register(ctx, reg),
        Operand::Imm(value) => Ok(get_immediate(ctx, value, size).into()),
        Operand::Mem(ref mem) => {
            let address = memory_address(ctx, i, &mem.clone(), false)?;
            let value = ctx.tmp(ctx.word_size);
            ctx.emit(ldm_(address, value));
            Ok(value.into())
        }
    }
}

/// Read the register operand named by `reg`.
pub fn get_reg(ctx: &mut Arm64Context, reg: Arm64Reg) -> Result<IlOperand, TranslationError> {
    get_register(ctx, reg)
}

/// The width in bits of operand `index`.
pub fn get_size(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    index: usize,
) -> Result<u16, TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(Arm64Reg::Xzr) => Ok(64),
        Operand::Reg(Arm64Reg::Wzr) => Ok(32),
        Operand::Reg(reg) => match w_parent(reg) {
            Some(_) => Ok(32),
            None => Ok(ctx.full_register(reg)?.size),
        },
        Operand::Imm(value) => Ok(get_immediate(ctx, value, 0).size),
        Operand::Mem(_) => Ok(ctx.word_size),
    }
}

/// The effective address of memory operand `index`.
pub fn get_address(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    index: usize,
) -> Result<IlOperand, TranslationError> {
    match operand(i, index)? {
        Operand::Mem(mem) => memory_address(ctx, i, &mem.clone(), false),
        _ => Err(TranslationError::UnsupportedOperand),
    }
}

pub fn is_register(i: &Arm64Insn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Reg(_)))
}

pub fn is_immediate(i: &Arm64Insn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Imm(_)))
}

pub fn is_memory(i: &Arm64Insn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Mem(_)))
}

fn set_register(
    ctx: &mut Arm64Context,
    reg: Arm64Reg,
    value: IlOperand,
) -> Result<(), TranslationError> {
    // the zero registers discard writes
    if reg == Arm64Reg::Xzr || reg == Arm64Reg::Wzr {
        return Ok(());
    }

    // w-register writes zero-extend into the x parent
    let reg = parent_register(ctx, reg)?;
    ctx.emit(str_(value, reg));
    Ok(())
}

fn set_memory(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    mem: &MemOperand<Arm64Reg>,
    value: IlOperand,
    writeback: bool,
) -> Result<(), TranslationError> {
    let address = memory_address(ctx, i, mem, writeback)?;

    // the value's own width selects the store width; a register pair
    // stores both halves
    ctx.emit(stm_(value, address));
    Ok(())
}

/// Write `value` to operand `index` of `i`, committing a post-indexed base
/// when `writeback` is set.
pub fn set(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    index: usize,
    value: IlOperand,
    writeback: bool,
) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => set_register(ctx, reg, value),
        Operand::Mem(ref mem) => set_memory(ctx, i, &mem.clone(), value, writeback),
        Operand::Imm(_) => Err(TranslationError::UnsupportedOperand),
    }
}

/// Write `value` to the register named by `reg`.
pub fn set_reg(
    ctx: &mut Arm64Context,
    reg: Arm64Reg,
    value: IlOperand,
) -> Result<(), TranslationError> {
    set_register(ctx, reg, value)
}

/// Mark the register operand at `index` as undefined. W-register views
/// widen to the x parent.
pub fn undefine(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    index: usize,
) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => {
            let reg = parent_register(ctx, reg)?;
            ctx.emit(undef_(reg));
            Ok(())
        }
        _ => Err(TranslationError::BadUndefine),
    }
}

/// Commit the recomputed address of memory operand `index` to its base
/// register. Correct only for the post-indexed addressing modes.
pub fn writeback(
    ctx: &mut Arm64Context,
    i: &Arm64Insn,
    index: usize,
) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Mem(ref mem) => {
            let mem = mem.clone();
            let base = mem.base.ok_or(TranslationError::BadWriteback)?;
            let address = memory_address(ctx, i, &mem, false)?;
            set_register(ctx, base, address)
        }
        _ => Err(TranslationError::BadWriteback),
    }
}
