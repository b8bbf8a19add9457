//! Translation of AArch64 arithmetic instructions.

use reil_il::bits::{carry_bit, mask, sign_bit};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand, Register};

use crate::error::TranslationError;

use super::operand;
use super::{Arm64Context, Arm64Insn};

fn flag(name: &'static str) -> Register {
    Register::new(name, 8)
}

/// Set n, z, c and v from a double-width arithmetic result and the operand
/// sign bits.
fn arithmetic_set_flags(
    ctx: &mut Arm64Context,
    sign_a: Operand,
    sign_b: Operand,
    result: &Operand,
) {
    let size = sign_a.size();

    let sign_result = ctx.tmp(size);
    let tmp0 = ctx.tmp(size);
    let tmp1 = ctx.tmp(size);
    let tmp2 = ctx.tmp(size);
    let tmp3 = ctx.tmp(size);
    let tmp4 = ctx.tmp(result.size());

    ctx.emit(and_(
        result.clone(),
        Immediate::new(sign_bit(size), size),
        sign_result,
    ));

    // overflow: (sign a != sign result) && (sign b != sign result)
    ctx.emit(xor_(sign_a, sign_result, tmp0));
    ctx.emit(xor_(sign_b, sign_result, tmp1));
    ctx.emit(and_(tmp0, tmp1, tmp2));
    ctx.emit(bisnz_(tmp2, flag("v")));

    ctx.emit(bisnz_(sign_result, flag("n")));

    ctx.emit(and_(result.clone(), Immediate::new(mask(size), size), tmp3));
    ctx.emit(bisz_(tmp3, flag("z")));

    ctx.emit(and_(
        result.clone(),
        Immediate::new(carry_bit(size), result.size()),
        tmp4,
    ));
    ctx.emit(bisnz_(tmp4, flag("c")));
}

fn sub_set_flags(ctx: &mut Arm64Context, a: &Operand, b: &Operand, result: &Operand) {
    let size = a.size();

    let tmp0 = ctx.tmp(size);
    let sign_a = ctx.tmp(size);
    let sign_b = ctx.tmp(size);

    ctx.emit(and_(a.clone(), Immediate::new(sign_bit(size), size), sign_a));
    // the subtrahend contributes the sign of its negation
    ctx.emit(xor_(b.clone(), Immediate::new(sign_bit(size), size), tmp0));
    ctx.emit(and_(tmp0, Immediate::new(sign_bit(size), size), sign_b));

    arithmetic_set_flags(ctx, sign_a.into(), sign_b.into(), result);
}

fn source_indices(i: &Arm64Insn) -> (usize, usize) {
    if i.operands.len() == 3 {
        (1, 2)
    } else {
        (0, 1)
    }
}

pub(super) fn sub(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    let (a_idx, b_idx) = source_indices(i);

    let a = operand::get(ctx, i, a_idx)?;
    let b = operand::get_sized(ctx, i, b_idx, a.size())?;

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    if i.update_flags {
        sub_set_flags(ctx, &a, &b, &result);
    }

    operand::set(ctx, i, 0, result, i.writeback)
}

/// cmp is a subtraction that always updates the flags and never writes a
/// register back.
pub(super) fn cmp(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get_sized(ctx, i, 1, a.size())?;

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));

    sub_set_flags(ctx, &a, &b, &result.into());
    Ok(())
}
