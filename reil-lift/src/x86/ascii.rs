//! Translation of the ASCII/decimal adjust instructions used for
//! binary-coded-decimal arithmetic.

use reil_il::shorthand::*;
use reil_il::Immediate;

use crate::error::TranslationError;

use super::operand::{self, WriteFlags};
use super::utilities::{flag, set_pf, set_sf, set_zf};
use super::{X86Context, X86Insn, X86Reg};

pub(super) fn aaa(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let al = operand::get_reg(ctx, i, X86Reg::Al)?;
    let ah = operand::get_reg(ctx, i, X86Reg::Ah)?;

    let result_al = ctx.tmp(8);
    let result_ah = ctx.tmp(8);
    let tmp0 = ctx.tmp(16);
    let tmp1 = ctx.tmp(8);

    // (al & 0xf) > 9
    ctx.emit(and_(al, Immediate::new(0xf, 8), result_al));
    ctx.emit(sub_(result_al, Immediate::new(9, 8), tmp0));
    ctx.emit(and_(tmp0, Immediate::new(0xff00, 16), tmp0));
    ctx.emit(bisnz_(tmp0, tmp1));
    //                || af == 1
    ctx.emit(or_(tmp1, flag("af"), tmp1));
    ctx.jump(tmp1, "adjust");

    ctx.emit(str_(ah.clone(), result_ah));
    ctx.emit(str_(Immediate::new(0, 8), flag("af")));
    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("adjust");
    ctx.emit(add_(result_al, Immediate::new(6, 8), tmp0));
    ctx.emit(str_(tmp0, result_al));

    ctx.emit(add_(ah, Immediate::new(1, 8), tmp0));
    ctx.emit(str_(tmp0, result_ah));

    ctx.emit(str_(Immediate::new(1, 8), flag("af")));
    ctx.emit(str_(Immediate::new(1, 8), flag("cf")));

    ctx.label("done");

    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("zf")));
    ctx.emit(undef_(flag("pf")));

    operand::set_reg(ctx, i, X86Reg::Al, result_al.into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, X86Reg::Ah, result_ah.into(), WriteFlags::empty())
}

pub(super) fn aad(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let al = operand::get_reg(ctx, i, X86Reg::Al)?;
    let ah = operand::get_reg(ctx, i, X86Reg::Ah)?;
    let base = match operand::is_immediate(i, 0) {
        true => operand::immediate_value(i, 0)? as u128,
        false => 10,
    };

    let result_al = ctx.tmp(8);
    let tmp0 = ctx.tmp(16);

    // al = (al + ah * base) & 0xff; ah = 0
    ctx.emit(mul_(ah, Immediate::new(base, 8), tmp0));
    ctx.emit(add_(al, tmp0, tmp0));
    ctx.emit(str_(tmp0, result_al));

    set_sf(ctx, result_al);
    set_zf(ctx, result_al);
    set_pf(ctx, result_al);

    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("af")));
    ctx.emit(undef_(flag("cf")));

    operand::set_reg(ctx, i, X86Reg::Al, result_al.into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, X86Reg::Ah, Immediate::new(0, 8).into(), WriteFlags::empty())
}

pub(super) fn aam(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let al = operand::get_reg(ctx, i, X86Reg::Al)?;
    let base = match operand::is_immediate(i, 0) {
        true => operand::immediate_value(i, 0)? as u128,
        false => 10,
    };

    let result_al = ctx.tmp(8);
    let result_ah = ctx.tmp(8);

    // ah = al / base; al = al % base
    ctx.emit(div_(al.clone(), Immediate::new(base, 8), result_ah));
    ctx.emit(mod_(al, Immediate::new(base, 8), result_al));

    set_sf(ctx, result_al);
    set_zf(ctx, result_al);
    set_pf(ctx, result_al);

    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("af")));
    ctx.emit(undef_(flag("cf")));

    operand::set_reg(ctx, i, X86Reg::Al, result_al.into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, X86Reg::Ah, result_ah.into(), WriteFlags::empty())
}

pub(super) fn aas(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let al = operand::get_reg(ctx, i, X86Reg::Al)?;
    let ah = operand::get_reg(ctx, i, X86Reg::Ah)?;

    let result_al = ctx.tmp(8);
    let result_ah = ctx.tmp(8);
    let tmp0 = ctx.tmp(16);
    let tmp1 = ctx.tmp(8);

    // (al & 0xf) > 9
    ctx.emit(and_(al, Immediate::new(0xf, 8), result_al));
    ctx.emit(sub_(result_al, Immediate::new(9, 8), tmp0));
    ctx.emit(and_(tmp0, Immediate::new(0xff00, 16), tmp0));
    ctx.emit(bisnz_(tmp0, tmp1));
    //                || af == 1
    ctx.emit(or_(tmp1, flag("af"), tmp1));
    ctx.jump(tmp1, "adjust");

    ctx.emit(str_(ah.clone(), result_ah));
    ctx.emit(str_(Immediate::new(0, 8), flag("af")));
    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("adjust");
    ctx.emit(sub_(result_al, Immediate::new(6, 8), tmp0));
    ctx.emit(str_(tmp0, result_al));

    ctx.emit(sub_(ah, Immediate::new(1, 8), tmp0));
    ctx.emit(str_(tmp0, result_ah));

    ctx.emit(str_(Immediate::new(1, 8), flag("af")));
    ctx.emit(str_(Immediate::new(1, 8), flag("cf")));

    ctx.label("done");

    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("zf")));
    ctx.emit(undef_(flag("pf")));

    operand::set_reg(ctx, i, X86Reg::Al, result_al.into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, X86Reg::Ah, result_ah.into(), WriteFlags::empty())
}

pub(super) fn daa(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    decimal_adjust(ctx, i, false)
}

pub(super) fn das(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    decimal_adjust(ctx, i, true)
}

fn decimal_adjust(
    ctx: &mut X86Context,
    i: &X86Insn,
    subtract: bool,
) -> Result<(), TranslationError> {
    let al = operand::get_reg(ctx, i, X86Reg::Al)?;

    let result_al = ctx.tmp(8);
    let tmp0 = ctx.tmp(16);
    let tmp1 = ctx.tmp(8);

    let six = Immediate::new(6, 8);
    let sixty = Immediate::new(0x60, 8);

    // (al & 0xf) > 9
    ctx.emit(and_(al.clone(), Immediate::new(0xf, 8), result_al));
    ctx.emit(sub_(result_al, Immediate::new(9, 8), tmp0));
    ctx.emit(and_(tmp0, Immediate::new(0xff00, 16), tmp0));
    ctx.emit(bisnz_(tmp0, tmp1));
    //                || af == 1
    ctx.emit(or_(tmp1, flag("af"), tmp1));
    ctx.jump(tmp1, "adjust0");

    ctx.emit(str_(Immediate::new(0, 8), flag("af")));
    ctx.jump(Immediate::new(1, 8), "done0");

    ctx.label("adjust0");
    if subtract {
        ctx.emit(sub_(result_al, six.clone(), tmp0));
    } else {
        ctx.emit(add_(result_al, six.clone(), tmp0));
    }
    ctx.emit(str_(tmp0, result_al));
    ctx.emit(str_(Immediate::new(1, 8), flag("af")));

    ctx.label("done0");

    // al > 0x99
    ctx.emit(sub_(al, Immediate::new(0x99, 8), tmp0));
    ctx.emit(and_(tmp0, Immediate::new(0xff00, 16), tmp0));
    ctx.emit(bisnz_(tmp0, tmp1));
    //           || cf == 1
    ctx.emit(or_(tmp1, flag("cf"), tmp1));
    ctx.jump(tmp1, "adjust1");

    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    ctx.jump(Immediate::new(1, 8), "done1");

    ctx.label("adjust1");
    if subtract {
        ctx.emit(sub_(result_al, sixty, tmp0));
    } else {
        ctx.emit(add_(result_al, sixty, tmp0));
    }
    ctx.emit(str_(tmp0, result_al));
    ctx.emit(str_(Immediate::new(1, 8), flag("cf")));

    ctx.label("done1");

    set_sf(ctx, result_al);
    set_zf(ctx, result_al);
    set_pf(ctx, result_al);

    ctx.emit(undef_(flag("of")));

    operand::set_reg(ctx, i, X86Reg::Al, result_al.into(), WriteFlags::empty())
}
