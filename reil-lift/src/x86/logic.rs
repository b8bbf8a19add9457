//! Translation of the basic logical instructions: and, or, xor, not, test.

use reil_il::bits::{mask, sign_bit};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand};

use crate::error::TranslationError;

use super::operand::{self, WriteFlags};
use super::utilities::{flag, set_pf};
use super::{X86Context, X86Insn};

fn logic_set_flags(ctx: &mut X86Context, result: &Operand) {
    let size = result.size();
    let sign_result = ctx.tmp(size);

    ctx.emit(and_(
        result.clone(),
        Immediate::new(sign_bit(size), size),
        sign_result,
    ));

    ctx.emit(str_(Immediate::new(0, 8), flag("of")));
    ctx.emit(bisnz_(sign_result, flag("sf")));
    ctx.emit(bisz_(result.clone(), flag("zf")));
    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    ctx.emit(undef_(flag("af")));

    set_pf(ctx, result.clone());
}

pub(super) fn and(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get_sized(ctx, i, 1, a.size())?;

    let result = ctx.tmp(a.size().min(b.size()));

    ctx.emit(and_(a, b, result));

    let result: Operand = result.into();
    logic_set_flags(ctx, &result);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn andn(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get_sized(ctx, i, 1, a.size())?;

    let size = a.size().min(b.size());
    let result = ctx.tmp(size);

    ctx.emit(xor_(a, Immediate::new(mask(size), size), result));
    ctx.emit(and_(result, b, result));

    let result: Operand = result.into();
    logic_set_flags(ctx, &result);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn not(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;

    let size = a.size();
    let result = ctx.tmp(size);

    ctx.emit(xor_(a, Immediate::new(mask(size), size), result));

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

pub(super) fn or(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get_sized(ctx, i, 1, a.size())?;

    let result = ctx.tmp(a.size().min(b.size()));

    ctx.emit(or_(a, b, result));

    let result: Operand = result.into();
    logic_set_flags(ctx, &result);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}

pub(super) fn test(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get_sized(ctx, i, 1, a.size())?;

    let result = ctx.tmp(a.size().min(b.size()));

    ctx.emit(and_(a, b, result));

    logic_set_flags(ctx, &result.into());
    Ok(())
}

pub(super) fn xor(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get_sized(ctx, i, 1, a.size())?;

    let result = ctx.tmp(a.size().min(b.size()));

    ctx.emit(xor_(a, b, result));

    let result: Operand = result.into();
    logic_set_flags(ctx, &result);

    operand::set(ctx, i, 0, result, WriteFlags::empty())
}
