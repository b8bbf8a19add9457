//! Translation of AArch64 memory access and move instructions.

use reil_il::shorthand::*;
use reil_il::Immediate;

use crate::error::TranslationError;

use super::operand;
use super::{Arm64Context, Arm64Insn};

pub(super) fn mov(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    let value = operand::get(ctx, i, 1)?;
    operand::set(ctx, i, 0, value, i.writeback)
}

/// Store pair: concatenate the two registers and write them through the
/// memory operand in one store, with optional base writeback. The first
/// register occupies the lower half, so it lands at the lower address.
pub(super) fn stp(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;

    let value = ctx.tmp(a.size() + b.size());
    let low_size = a.size();
    ctx.emit(str_(b, value));
    ctx.emit(lshl_(value, Immediate::new(low_size as u128, 8), value));
    ctx.emit(or_(a, value, value));

    operand::set(ctx, i, 2, value.into(), i.writeback)
}

pub(super) fn str(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    let value = operand::get(ctx, i, 0)?;
    operand::set(ctx, i, 1, value, i.writeback)
}
