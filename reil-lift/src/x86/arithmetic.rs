//! Translation of the basic arithmetic instructions: add, sub, mul, div and
//! friends.

use reil_il::bits::{carry_bit, mask, sign_bit};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand};

use crate::error::TranslationError;

use super::operand::{self, WriteFlags};
use super::utilities::{flag, set_pf};
use super::{X86Context, X86Insn, X86Reg};

// Helpers

pub(super) fn arithmetic_set_flags(
    ctx: &mut X86Context,
    sign_a: Operand,
    sign_b: Operand,
    result: &Operand,
    cf: bool,
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
    ctx.emit(bisnz_(tmp2, flag("of")));

    ctx.emit(bisnz_(sign_result, flag("sf")));

    ctx.emit(and_(result.clone(), Immediate::new(mask(size), size), tmp3));
    ctx.emit(bisz_(tmp3, flag("zf")));

    if cf {
        ctx.emit(and_(
            result.clone(),
            Immediate::new(carry_bit(size), result.size()),
            tmp4,
        ));
        ctx.emit(bisnz_(tmp4, flag("cf")));
    }

    set_pf(ctx, result.clone());

    // the adjust flag costs more il than it is worth
    ctx.emit(undef_(flag("af")));
}

pub(super) fn add_set_flags(
    ctx: &mut X86Context,
    a: &Operand,
    b: &Operand,
    result: &Operand,
    cf: bool,
) {
    let size = a.size();

    let sign_a = ctx.tmp(size);
    let sign_b = ctx.tmp(size);

    ctx.emit(and_(a.clone(), Immediate::new(sign_bit(size), size), sign_a));
    ctx.emit(and_(b.clone(), Immediate::new(sign_bit(size), size), sign_b));

    arithmetic_set_flags(ctx, sign_a.into(), sign_b.into(), result, cf);
}

pub(super) fn sub_set_flags(
    ctx: &mut X86Context,
    a: &Operand,
    b: &Operand,
    result: &Operand,
    cf: bool,
) {
    let size = a.size();

    let tmp0 = ctx.tmp(size);
    let sign_a = ctx.tmp(size);
    let sign_b = ctx.tmp(size);

    ctx.emit(and_(a.clone(), Immediate::new(sign_bit(size), size), sign_a));
    // the subtrahend contributes the sign of its negation
    ctx.emit(xor_(b.clone(), Immediate::new(sign_bit(size), size), tmp0));
    ctx.emit(and_(tmp0, Immediate::new(sign_bit(size), size), sign_b));

    arithmetic_set_flags(ctx, sign_a.into(), sign_b.into(), result, cf);
}

fn imul_set_flags(ctx: &mut X86Context, result: &Operand) {
    let size = result.size();
    let tmp0 = ctx.tmp(size);

    ctx.emit(and_(
        result.clone(),
        Immediate::new(mask(size) ^ mask(size / 2), size),
        tmp0,
    ));
    ctx.emit(bisnz_(tmp0, flag("cf")));
    ctx.emit(bisnz_(tmp0, flag("of")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("zf")));
    ctx.emit(undef_(flag("af")));

    set_pf(ctx, result.clone());
}

fn undef_all_flags(ctx: &mut X86Context) {
    for name in ["cf", "of", "sf", "zf", "af", "pf"] {
        ctx.emit(undef_(flag(name)));
    }
}

fn sign_extended(ctx: &mut X86Context, size: u16, b: Operand) -> Operand {
    if b.size() < size {
        let widened = ctx.tmp(size);
        ctx.emit(sex_(b, widened));
        widened.into()
    } else {
        b
    }
}

fn accumulator_part(size: u16) -> X86Reg {
    match size {
        8 => X86Reg::Al,
        16 => X86Reg::Ax,
        32 => X86Reg::Eax,
        _ => X86Reg::Rax,
    }
}

fn data_part(size: u16) -> X86Reg {
    match size {
        16 => X86Reg::Dx,
        32 => X86Reg::Edx,
        _ => X86Reg::Rdx,
    }
}

// Instruction translators

pub(super) fn adc(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(add_(a.clone(), b.clone(), result));
    ctx.emit(add_(result, flag("cf"), result));

    let result: Operand = result.into();
    add_set_flags(ctx, &a, &b, &result, true);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn adcx(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);
    let tmp0 = ctx.tmp(a.size() * 2);

    ctx.emit(add_(a.clone(), b, result));
    ctx.emit(add_(result, flag("cf"), result));

    // adcx updates the carry flag and nothing else
    ctx.emit(and_(
        result,
        Immediate::new(carry_bit(a.size()), result.size),
        tmp0,
    ));
    ctx.emit(bisnz_(tmp0, flag("cf")));

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

pub(super) fn adox(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);
    let tmp0 = ctx.tmp(a.size() * 2);

    ctx.emit(add_(a.clone(), b, result));
    ctx.emit(add_(result, flag("of"), result));

    // adox updates the overflow flag and nothing else
    ctx.emit(and_(
        result,
        Immediate::new(carry_bit(a.size()), result.size),
        tmp0,
    ));
    ctx.emit(bisnz_(tmp0, flag("of")));

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

pub(super) fn add(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(add_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    add_set_flags(ctx, &a, &b, &result, true);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn cmp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let mut b = operand::get(ctx, i, 1)?;

    // disassemblers hand out sign-extended byte immediates wider than the
    // first operand; cut them back down before comparing
    if b.size() > a.size() {
        let narrowed = ctx.tmp(a.size());
        ctx.emit(str_(b, narrowed));
        b = narrowed.into();
    }
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    sub_set_flags(ctx, &a, &b, &result, true);
    Ok(())
}

pub(super) fn div(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let divisor = if i.operands.is_empty() {
        ctx.counter.clone().into()
    } else {
        operand::get(ctx, i, 0)?
    };
    let size = divisor.size();

    if size == 8 {
        // dividend is ax; quotient goes to al, remainder to ah
        let acc = ctx.accumulator.clone();
        let dividend = operand::narrowed(ctx, &acc, 16);
        let quotient = ctx.tmp(8);
        let remainder = ctx.tmp(8);

        ctx.emit(div_(dividend.clone(), divisor.clone(), quotient));
        ctx.emit(mod_(dividend, divisor, remainder));

        let result = ctx.tmp(16);
        ctx.emit(str_(remainder, result));
        ctx.emit(lshl_(result, Immediate::new(8, 8), result));
        ctx.emit(or_(quotient, result, result));

        operand::set_reg(ctx, i, X86Reg::Ax, result.into(), WriteFlags::empty())?;
    } else {
        // dividend is dx:ax, edx:eax or rdx:rax
        let acc = ctx.accumulator.clone();
        let data = ctx.data.clone();
        let a = operand::narrowed(ctx, &acc, size);
        let b = operand::narrowed(ctx, &data, size);

        let dividend = ctx.tmp(size * 2);
        let quotient = ctx.tmp(size);
        let remainder = ctx.tmp(size);

        ctx.emit(str_(b, dividend));
        ctx.emit(lshl_(dividend, Immediate::new(size as u128, 8), dividend));
        ctx.emit(or_(a, dividend, dividend));

        ctx.emit(div_(dividend, divisor.clone(), quotient));
        ctx.emit(mod_(dividend, divisor, remainder));

        operand::set_reg(ctx, i, accumulator_part(size), quotient.into(), WriteFlags::empty())?;
        operand::set_reg(ctx, i, data_part(size), remainder.into(), WriteFlags::empty())?;
    }

    undef_all_flags(ctx);
    Ok(())
}

pub(super) fn dec(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b: Operand = Immediate::new(1, a.size()).into();
    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    sub_set_flags(ctx, &a, &b, &result, false);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn idiv(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let divisor = operand::get(ctx, i, 0)?;
    let size = divisor.size();
    let dividend = ctx.tmp(size * 2);

    let acc = ctx.accumulator.clone();
    if size == 8 {
        // dividend is ax
        ctx.emit(str_(acc, dividend));
    } else {
        // dividend is dx:ax, edx:eax or rdx:rax
        let data = ctx.data.clone();
        let dividend_lo = ctx.tmp(size);
        let dividend_hi = ctx.tmp(size);

        ctx.emit(str_(acc, dividend_lo));
        ctx.emit(str_(data, dividend_hi));
        ctx.emit(lshl_(dividend_hi, Immediate::new(size as u128, 8), dividend));
        ctx.emit(or_(dividend, dividend_lo, dividend));
    }

    let quotient = ctx.tmp(size);
    let remainder = ctx.tmp(size);

    ctx.emit(sdiv_(dividend, divisor.clone(), quotient));
    ctx.emit(mod_(dividend, divisor, remainder));

    if size == 8 {
        let result = ctx.tmp(16);
        ctx.emit(str_(remainder, result));
        ctx.emit(lshl_(result, Immediate::new(8, 8), result));
        ctx.emit(or_(quotient, result, result));

        operand::set_reg(ctx, i, X86Reg::Ax, result.into(), WriteFlags::empty())?;
    } else {
        operand::set_reg(ctx, i, accumulator_part(size), quotient.into(), WriteFlags::empty())?;
        operand::set_reg(ctx, i, data_part(size), remainder.into(), WriteFlags::empty())?;
    }

    undef_all_flags(ctx);
    Ok(())
}

pub(super) fn imul(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    match i.operands.len() {
        1 => {
            let b = operand::get(ctx, i, 0)?;
            let size = b.size();
            let (a_reg, b_reg) = match size {
                8 => (X86Reg::Al, X86Reg::Ah),
                16 => (X86Reg::Ax, X86Reg::Dx),
                32 => (X86Reg::Eax, X86Reg::Edx),
                _ => (X86Reg::Rax, X86Reg::Rdx),
            };

            let a = operand::get_reg(ctx, i, a_reg)?;
            let result = ctx.tmp(size * 2);
            let low = ctx.tmp(size);
            let high = ctx.tmp(size);

            ctx.emit(mul_(a, b, result));
            ctx.emit(str_(result, low));
            ctx.emit(lshr_(result, Immediate::new(size as u128, 8), high));

            operand::set_reg(ctx, i, a_reg, low.into(), WriteFlags::empty())?;
            operand::set_reg(ctx, i, b_reg, high.into(), WriteFlags::empty())?;

            imul_set_flags(ctx, &result.into());
        }
        2 => {
            let a = operand::get(ctx, i, 0)?;
            let b = operand::get(ctx, i, 1)?;
            let result = ctx.tmp(a.size() * 2);

            ctx.emit(mul_(a, b, result));

            operand::set(ctx, i, 0, result.into(), WriteFlags::empty())?;
            imul_set_flags(ctx, &result.into());
        }
        _ => {
            let a = operand::get(ctx, i, 1)?;
            let b = operand::get(ctx, i, 2)?;
            let b = sign_extended(ctx, a.size(), b);
            let result = ctx.tmp(a.size() * 2);

            ctx.emit(mul_(a, b, result));

            operand::set(ctx, i, 0, result.into(), WriteFlags::empty())?;
            imul_set_flags(ctx, &result.into());
        }
    }
    Ok(())
}

pub(super) fn inc(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b: Operand = Immediate::new(1, a.size()).into();
    let result = ctx.tmp(a.size() * 2);

    ctx.emit(add_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    add_set_flags(ctx, &a, &b, &result, false);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn mul(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let b = operand::get(ctx, i, 0)?;
    let size = b.size();

    let acc = ctx.accumulator.clone();
    let a = ctx.tmp(size);
    let result = ctx.tmp(size * 2);

    ctx.emit(str_(acc, a));
    ctx.emit(mul_(a, b, result));

    if size == 8 {
        operand::set_reg(ctx, i, X86Reg::Ax, result.into(), WriteFlags::empty())?;
    } else {
        let low = ctx.tmp(size);
        let high = ctx.tmp(size);
        ctx.emit(str_(result, low));
        ctx.emit(lshr_(result, Immediate::new(size as u128, 8), high));
        operand::set_reg(ctx, i, accumulator_part(size), low.into(), WriteFlags::empty())?;
        operand::set_reg(ctx, i, data_part(size), high.into(), WriteFlags::empty())?;
    }

    // cf and of record whether the upper half of the product is in use
    let tmp0 = ctx.tmp(size * 2);
    ctx.emit(and_(
        result,
        Immediate::new(mask(size * 2) ^ mask(size), size * 2),
        tmp0,
    ));
    ctx.emit(bisnz_(tmp0, flag("cf")));
    ctx.emit(bisnz_(tmp0, flag("of")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("zf")));
    ctx.emit(undef_(flag("af")));
    ctx.emit(undef_(flag("pf")));
    Ok(())
}

pub(super) fn neg(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let zero: Operand = Immediate::new(0, a.size()).into();
    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(zero.clone(), a.clone(), result));

    let result: Operand = result.into();
    sub_set_flags(ctx, &zero, &a, &result, true);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn sbb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));
    ctx.emit(sub_(result, flag("cf"), result));

    let result: Operand = result.into();
    sub_set_flags(ctx, &a, &b, &result, true);

    operand::set(ctx, i, 0, result, WriteFlags::CLEAR)
}

pub(super) fn sub(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(sub_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    sub_set_flags(ctx, &a, &b, &result, true);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn xadd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let b = sign_extended(ctx, a.size(), b);

    let result = ctx.tmp(a.size() * 2);

    ctx.emit(add_(a.clone(), b.clone(), result));

    let result: Operand = result.into();
    add_set_flags(ctx, &a, &b, &result, true);

    operand::set(ctx, i, 0, result, WriteFlags::empty())?;
    operand::set(ctx, i, 1, a, WriteFlags::empty())
}
