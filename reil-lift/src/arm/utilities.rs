//! ARM flag micro-sequences.

use reil_il::bits::{carry_bit, mask, sign_bit};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand, Register};

use super::ArmContext;

pub(super) fn flag(name: &'static str) -> Register {
    Register::new(name, 8)
}

/// Compute the negative flag from the most significant bit of `result`.
pub(super) fn set_n(ctx: &mut ArmContext, result: impl Into<Operand>) {
    let result = result.into();
    let size = result.size();
    let sign = ctx.tmp(size);

    ctx.emit(and_(result, Immediate::new(sign_bit(size), size), sign));
    ctx.emit(bisnz_(sign, flag("n")));
}

/// Compute the zero flag.
pub(super) fn set_z(ctx: &mut ArmContext, result: impl Into<Operand>) {
    ctx.emit(bisz_(result.into(), flag("z")));
}

/// Set n, z, c and v from a double-width arithmetic result and the operand
/// sign bits.
pub(super) fn arithmetic_set_flags(
    ctx: &mut ArmContext,
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

pub(super) fn add_set_flags(ctx: &mut ArmContext, a: &Operand, b: &Operand, result: &Operand) {
    let size = a.size();

    let sign_a = ctx.tmp(size);
    let sign_b = ctx.tmp(size);

    ctx.emit(and_(a.clone(), Immediate::new(sign_bit(size), size), sign_a));
    ctx.emit(and_(b.clone(), Immediate::new(sign_bit(size), size), sign_b));

    arithmetic_set_flags(ctx, sign_a.into(), sign_b.into(), result);
}

pub(super) fn sub_set_flags(ctx: &mut ArmContext, a: &Operand, b: &Operand, result: &Operand) {
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
