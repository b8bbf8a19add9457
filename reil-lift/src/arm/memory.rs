//! Translation of ARM memory and move instructions.

use reil_il::bits::mask;
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand};

use crate::error::TranslationError;
use crate::insn::Operand as DecodedOperand;

use super::operand;
use super::utilities::{set_n, set_z};
use super::{ArmContext, ArmInsn};

fn mov_common(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let source = operand::get(ctx, i, 1)?;
    let value = ctx.tmp(ctx.word_size);

    ctx.emit(str_(source, value));

    if i.update_flags {
        set_n(ctx, value);
        set_z(ctx, value);
    }

    operand::set(ctx, i, 0, value.into())
}

pub(super) fn mov(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    mov_common(ctx, i)
}

pub(super) fn movt(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    // keep the low half of the destination
    let dst = operand::get(ctx, i, 0)?;
    let low = ctx.tmp(ctx.word_size);

    ctx.emit(and_(dst, Immediate::new(mask(16), 32), low));

    // shift the new value into the high half
    let source = operand::get(ctx, i, 1)?;
    let result = ctx.tmp(ctx.word_size);

    ctx.emit(str_(source, result));
    ctx.emit(lshl_(result, Immediate::new(16, 32), result));

    ctx.emit(or_(low, result, result));

    let result: Operand = result.into();
    if i.update_flags {
        set_n(ctx, result.clone());
        set_z(ctx, result.clone());
    }

    operand::set(ctx, i, 0, result)
}

pub(super) fn movw(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    mov_common(ctx, i)
}

pub(super) fn push(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let word = ctx.word_size;
    let stack_ptr = ctx.stack_ptr.clone();

    for index in 0..i.operands.len() {
        let value = operand::get(ctx, i, index)?;

        ctx.emit(sub_(
            &stack_ptr,
            Immediate::new(word as u128 / 8, word),
            &stack_ptr,
        ));

        let value = if value.size() != word {
            let widened = ctx.tmp(word);
            ctx.emit(sex_(value, widened));
            widened.into()
        } else {
            value
        };

        ctx.emit(stm_(value, &stack_ptr));
    }
    Ok(())
}

/// Store-multiple: the base register is operand 0 and the register list
/// follows; successive registers land at successive word addresses.
pub(super) fn stm(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let word = ctx.word_size;

    let base_reg = match i.operands.first() {
        Some(DecodedOperand::Reg(reg)) => *reg,
        _ => return Err(TranslationError::UnsupportedOperand),
    };
    let base = ctx.full_register(base_reg)?;

    let address = ctx.tmp(word);
    ctx.emit(str_(&base, address));

    let step = Immediate::new(word as u128 / 8, word);
    for index in 1..i.operands.len() {
        let value = operand::get(ctx, i, index)?;
        ctx.emit(stm_(value, address));
        ctx.emit(add_(address, &step, address));
    }

    if i.writeback {
        ctx.emit(str_(address, base));
    }
    Ok(())
}

pub(super) fn str(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let value = operand::get(ctx, i, 0)?;
    operand::set(ctx, i, 1, value)?;

    if i.writeback && operand::is_memory(i, 1) {
        operand::writeback(ctx, i, 1)?;
    }
    Ok(())
}
