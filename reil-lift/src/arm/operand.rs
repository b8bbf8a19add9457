//! Reading and writing ARM instruction operands.

use reil_il::bits::{mask, natural_size};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand as IlOperand};

use crate::error::TranslationError;
use crate::insn::{MemOperand, Operand};

use super::{ArmContext, ArmInsn, ArmReg};

fn operand<'i>(i: &'i ArmInsn, index: usize) -> Result<&'i Operand<ArmReg>, TranslationError> {
    i.operands
        .get(index)
        .ok_or(TranslationError::UnsupportedOperand)
}

fn memory_address(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    mem: &MemOperand<ArmReg>,
) -> Result<IlOperand, TranslationError> {
    let _ = i;
    let word = ctx.word_size;
    let disp = (mem.disp as i128 as u128) & mask(word);

    let mut address = match (disp != 0, mem.base) {
        (true, None) => Immediate::new(disp, word).into(),
        (false, Some(base)) => ctx.full_register(base)?.into(),
        (true, Some(base)) => {
            let base = ctx.full_register(base)?;
            let tmp0 = ctx.tmp(word * 2);
            let address = ctx.tmp(word);

            ctx.emit(add_(base, Immediate::new(disp, word), tmp0));
            ctx.emit(and_(tmp0, Immediate::new(mask(word), word * 2), address));
            address.into()
        }
        (false, None) => Immediate::new(0, word).into(),
    };

    // register-offset addressing
    if let Some(index) = mem.index {
        let index = ctx.full_register(index)?;
        let tmp0 = ctx.tmp(word * 2);
        let tmp1 = ctx.tmp(word);
        let tmp2 = ctx.tmp(word * 2);
        let sum = ctx.tmp(word);

        ctx.emit(mul_(
            index,
            Immediate::new(mem.scale as i128 as u128, word),
            tmp0,
        ));
        ctx.emit(and_(tmp0, Immediate::new(mask(word), word * 2), tmp1));
        ctx.emit(add_(tmp1, address, tmp2));
        ctx.emit(and_(tmp2, Immediate::new(mask(word), word * 2), sum));
        address = sum.into();
    }

    Ok(address)
}

fn memory_size(ctx: &ArmContext) -> u16 {
    ctx.word_size
}

fn get_immediate(ctx: &ArmContext, value: i64, size: u16) -> Immediate {
    let size = match size {
        0 => natural_size(value.unsigned_abs() as u128, ctx.word_size),
        size => size,
    };
    Immediate::new(value as i128 as u128, size)
}

/// Read the register operand named by `reg`.
pub fn get_reg(ctx: &mut ArmContext, reg: ArmReg) -> Result<IlOperand, TranslationError> {
    Ok(ctx.full_register(reg)?.into())
}

/// Read operand `index` of `i`.
pub fn get(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    index: usize,
) -> Result<IlOperand, TranslationError> {
    get_sized(ctx, i, index, 0)
}

/// Read operand `index` of `i`, forcing immediates to `size` bits.
pub fn get_sized(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    index: usize,
    size: u16,
) -> Result<IlOperand, TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => get_reg(ctx, reg),
        Operand::Imm(value) => Ok(get_immediate(ctx, value, size).into()),
        Operand::Mem(ref mem) => {
            let address = memory_address(ctx, i, mem)?;
            let value = ctx.tmp(memory_size(ctx));
            ctx.emit(ldm_(address, value));
            Ok(value.into())
        }
    }
}

/// The width in bits of operand `index`.
pub fn get_size(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    index: usize,
) -> Result<u16, TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => Ok(ctx.full_register(reg)?.size),
        Operand::Imm(value) => Ok(get_immediate(ctx, value, 0).size),
        Operand::Mem(_) => Ok(memory_size(ctx)),
    }
}

/// The effective address of memory operand `index`.
pub fn get_address(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    index: usize,
) -> Result<IlOperand, TranslationError> {
    match operand(i, index)? {
        Operand::Mem(mem) => memory_address(ctx, i, &mem.clone()),
        _ => Err(TranslationError::UnsupportedOperand),
    }
}

pub fn is_register(i: &ArmInsn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Reg(_)))
}

pub fn is_immediate(i: &ArmInsn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Imm(_)))
}

pub fn is_memory(i: &ArmInsn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Mem(_)))
}

/// Mark the register operand at `index` as undefined.
pub fn undefine(ctx: &mut ArmContext, i: &ArmInsn, index: usize) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => {
            let reg = ctx.full_register(reg)?;
            ctx.emit(undef_(reg));
            Ok(())
        }
        _ => Err(TranslationError::BadUndefine),
    }
}

fn set_register(
    ctx: &mut ArmContext,
    reg: ArmReg,
    value: IlOperand,
) -> Result<(), TranslationError> {
    let reg = ctx.full_register(reg)?;
    ctx.emit(str_(value, reg));
    Ok(())
}

fn set_memory(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    mem: &MemOperand<ArmReg>,
    value: IlOperand,
) -> Result<(), TranslationError> {
    let address = memory_address(ctx, i, mem)?;
    let write_size = memory_size(ctx);

    let value = if value.size() > write_size {
        let narrowed = ctx.tmp(write_size);
        ctx.emit(str_(value, narrowed));
        narrowed.into()
    } else {
        value
    };

    ctx.emit(stm_(value, address));
    Ok(())
}

/// Write `value` to operand `index` of `i`.
pub fn set(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    index: usize,
    value: IlOperand,
) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => set_register(ctx, reg, value),
        Operand::Mem(ref mem) => set_memory(ctx, i, &mem.clone(), value),
        Operand::Imm(_) => Err(TranslationError::UnsupportedOperand),
    }
}

/// Write `value` to the register named by `reg`.
pub fn set_reg(
    ctx: &mut ArmContext,
    reg: ArmReg,
    value: IlOperand,
) -> Result<(), TranslationError> {
    set_register(ctx, reg, value)
}

/// Commit the recomputed address of memory operand `index` to its base
/// register. Correct only for the post-indexed addressing modes.
pub fn writeback(
    ctx: &mut ArmContext,
    i: &ArmInsn,
    index: usize,
) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Mem(ref mem) => {
            let mem = mem.clone();
            let base = mem.base.ok_or(TranslationError::BadWriteback)?;
            let address = memory_address(ctx, i, &mem)?;
            set_register(ctx, base, address)
        }
        _ => Err(TranslationError::BadWriteback),
    }
}
