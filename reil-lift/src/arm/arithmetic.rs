//! Translation of ARM arithmetic instructions.

use reil_il::shorthand::*;
use reil_il::Operand;

use crate::error::TranslationError;

use super::operand;
use super::utilities::{add_set_flags, sub_set_flags};
use super::{ArmContext, ArmInsn};

/// ARM data-processing instructions come in two- and three-operand shapes;
/// the destination is always operand 0.
fn source_indices(i: &ArmInsn) -> (usize, usize) {
    if i.operands.len() == 3 {
        (1, 2)
    } else {
        (0, 1)
    }
}

pub(super) fn add(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let (a_idx, b_idx) = source_indices(i);

    let a = operand::get(ctx, i, a_idx)?;
    let b = operand::get_sized(ctx, i, b_idx, a.size())?;

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(add_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    if i.update_flags {
        add_set_flags(ctx, &a, &b, &result);
    }

    operand::set(ctx, i, 0, result)
}

pub(super) fn sub(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let (a_idx, b_idx) = source_indices(i);

    let a = operand::get(ctx, i, a_idx)?;
    let b = operand::get_sized(ctx, i, b_idx, a.size())?;

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    if i.update_flags {
        sub_set_flags(ctx, &a, &b, &result);
    }

    operand::set(ctx, i, 0, result)
}

/// cmp is a subtraction that always updates the flags and never writes a
/// register back.
pub(super) fn cmp(ctx: &mut ArmContext, i: &ArmInsn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get_sized(ctx, i, 1, a.size())?;

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));

    sub_set_flags(ctx, &a, &b, &result.into());
    Ok(())
}
