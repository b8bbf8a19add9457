//! Translation of ARM control flow instructions.

use reil_il::shorthand::*;
use reil_il::Immediate;

use crate::error::TranslationError;

use super::operand;
use super::{ArmContext, ArmInsn};

pub(super) fn b(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let target = operand::get(ctx, i, 0)?;
    ctx.emit(jcc_(Immediate::new(1, 8), target));
    Ok(())
}

pub(super) fn blx(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let target = operand::get(ctx, i, 0)?;

    let pc = operand::get_reg(ctx, super::ArmReg::Pc)?;
    let return_address = if ctx.thumb {
        // bit 0 of the link value records the Thumb state
        let thumb_pc = ctx.tmp(32);
        ctx.emit(or_(pc, Immediate::new(1, 32), thumb_pc));
        thumb_pc.into()
    } else {
        pc
    };

    operand::set_reg(ctx, super::ArmReg::Lr, return_address)?;
    ctx.emit(jcc_(Immediate::new(1, 8), target));
    Ok(())
}
