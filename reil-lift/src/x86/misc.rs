//! Translation of the instructions that fit no other category: flag
//! manipulation, exchanges, compare-and-swap, conversions, setcc, and the
//! supervisor transitions.

use reil_il::bits::sign_bit;
use reil_il::shorthand::*;
use reil_il::Immediate;

use crate::error::TranslationError;

use super::conditional::{self, Condition};
use super::operand::{self, WriteFlags};
use super::utilities::{flag, pack, unpack};
use super::{X86Context, X86Insn, X86Reg};

fn conditional_set(ctx: &mut X86Context, i: &X86Insn, cc: Condition) -> Result<(), TranslationError> {
    let cond = conditional::condition(ctx, cc);
    operand::set(ctx, i, 0, cond, WriteFlags::empty())
}

/// Sign-extend the low half of the accumulator across the data register
/// (cwd, cdq, cqo).
fn convert_split(ctx: &mut X86Context, size: u16) -> Result<(), TranslationError> {
    let acc = ctx.accumulator.clone();
    let data = ctx.data.clone();

    let a = ctx.tmp(size);
    let result = ctx.tmp(size * 2);
    let high = ctx.tmp(size);
    let low = ctx.tmp(size);

    ctx.emit(str_(acc.clone(), a));
    ctx.emit(sex_(a, result));
    ctx.emit(str_(result, low));
    ctx.emit(lshr_(result, Immediate::new(size as u128, 8), high));
    ctx.emit(str_(low, acc));
    ctx.emit(str_(high, data));
    Ok(())
}

/// Sign-extend the low half of the accumulator in place (cbw, cwde, cdqe).
fn convert_widen(ctx: &mut X86Context, size: u16) -> Result<(), TranslationError> {
    let acc = ctx.accumulator.clone();

    let a = ctx.tmp(size);
    let result = ctx.tmp(size * 2);

    ctx.emit(str_(acc.clone(), a));
    ctx.emit(sex_(a, result));
    ctx.emit(str_(result, acc));
    Ok(())
}

pub(super) fn arpl(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let dest_seg = operand::get(ctx, i, 0)?;
    let src_seg = operand::get(ctx, i, 1)?;

    let dest_rpl = ctx.tmp(16);
    let src_rpl = ctx.tmp(16);
    let tmp0 = ctx.tmp(32);
    let tmp1 = ctx.tmp(8);
    let result_seg = ctx.tmp(16);
    let tmp2 = ctx.tmp(16);

    // the rpl is selector bits 0..2; adjust only when dest.rpl < src.rpl
    ctx.emit(and_(dest_seg.clone(), Immediate::new(0b11, 16), dest_rpl));
    ctx.emit(and_(src_seg.clone(), Immediate::new(0b11, 16), src_rpl));
    ctx.emit(sub_(dest_rpl, src_rpl, tmp0));
    ctx.emit(and_(tmp0, Immediate::new(sign_bit(32), 32), tmp0));
    ctx.emit(bisz_(tmp0, tmp1));
    ctx.jump(tmp1, "check_passed");

    ctx.emit(str_(Immediate::new(1, 8), flag("zf")));
    ctx.emit(and_(dest_seg, Immediate::new(0xfffc, 16), result_seg));
    ctx.emit(and_(src_seg, Immediate::new(0b11, 16), tmp2));
    ctx.emit(or_(result_seg, tmp2, result_seg));

    operand::set(ctx, i, 0, result_seg.into(), WriteFlags::empty())?;

    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("check_passed");
    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));

    ctx.label("done");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn bswap(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;

    // byte-swapping a 16-bit register is undefined
    if a.size() < 32 {
        return Err(TranslationError::IllegalInstruction {
            mnemonic: i.mnemonic.clone(),
        });
    }

    let mut bytes = unpack(ctx, &a, 8);
    bytes.reverse();
    let value = pack(ctx, &bytes);

    operand::set(ctx, i, 0, value, WriteFlags::empty())
}

pub(super) fn clc(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    Ok(())
}

pub(super) fn cld(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(str_(Immediate::new(0, 8), flag("df")));
    Ok(())
}

pub(super) fn cmc(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(xor_(flag("cf"), Immediate::new(1, 8), flag("cf")));
    Ok(())
}

pub(super) fn stc(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(str_(Immediate::new(1, 8), flag("cf")));
    Ok(())
}

pub(super) fn cwd(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    convert_split(ctx, 16)
}

pub(super) fn cdq(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    convert_split(ctx, 32)
}

pub(super) fn cqo(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    convert_split(ctx, 64)
}

pub(super) fn cbw(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    convert_widen(ctx, 8)
}

pub(super) fn cwde(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    convert_widen(ctx, 16)
}

pub(super) fn cdqe(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    convert_widen(ctx, 32)
}

pub(super) fn cmpxchg(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let acc = ctx.accumulator.clone();
    let b = operand::get(ctx, i, 0)?;
    let c = operand::get(ctx, i, 1)?;

    let a = operand::narrowed(ctx, &acc, b.size());
    let tmp0 = ctx.tmp(8);

    ctx.emit(equ_(a, b, tmp0));
    ctx.jump(tmp0, "equal");

    // not equal: the current destination value moves into the accumulator
    ctx.emit(str_(c.clone(), &acc));
    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("equal");
    operand::set(ctx, i, 0, c, WriteFlags::empty())?;
    ctx.emit(str_(Immediate::new(1, 8), flag("zf")));

    ctx.label("done");
    ctx.emit(nop_());
    Ok(())
}

fn cmpxchg_pair(
    ctx: &mut X86Context,
    i: &X86Insn,
    size: u16,
    acc_pair: (X86Reg, X86Reg),
    src_pair: (X86Reg, X86Reg),
) -> Result<(), TranslationError> {
    let (lo_reg, hi_reg) = acc_pair;
    let (src_lo_reg, src_hi_reg) = src_pair;

    let hi = operand::get_reg(ctx, i, hi_reg)?;
    let lo = operand::get_reg(ctx, i, lo_reg)?;
    let expected = ctx.tmp(size * 2);

    let src_hi = operand::get_reg(ctx, i, src_hi_reg)?;
    let src_lo = operand::get_reg(ctx, i, src_lo_reg)?;
    let replacement = ctx.tmp(size * 2);

    let value = operand::get(ctx, i, 0)?;

    let tmp0 = ctx.tmp(size * 2);
    let tmp1 = ctx.tmp(8);
    let result_lo = ctx.tmp(size);
    let result_hi = ctx.tmp(size);

    ctx.emit(lshl_(hi, Immediate::new(size as u128, 8), expected));
    ctx.emit(str_(lo, tmp0));
    ctx.emit(or_(expected, tmp0, expected));

    ctx.emit(equ_(value.clone(), expected, tmp1));
    ctx.jump(tmp1, "equal");

    // not equal: the memory value splits into the accumulator pair
    ctx.emit(str_(value.clone(), result_lo));
    let shifted = ctx.tmp(size * 2);
    ctx.emit(lshr_(value, Immediate::new(size as u128, 8), shifted));
    ctx.emit(str_(shifted, result_hi));

    operand::set_reg(ctx, i, hi_reg, result_hi.into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, lo_reg, result_lo.into(), WriteFlags::empty())?;

    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("equal");
    ctx.emit(lshl_(src_hi, Immediate::new(size as u128, 8), replacement));
    ctx.emit(str_(src_lo, tmp0));
    ctx.emit(or_(replacement, tmp0, replacement));

    operand::set(ctx, i, 0, replacement.into(), WriteFlags::empty())?;

    ctx.emit(str_(Immediate::new(1, 8), flag("zf")));

    ctx.label("done");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn cmpxchg8b(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    cmpxchg_pair(
        ctx,
        i,
        32,
        (X86Reg::Eax, X86Reg::Edx),
        (X86Reg::Ebx, X86Reg::Ecx),
    )
}

pub(super) fn cmpxchg16b(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    cmpxchg_pair(
        ctx,
        i,
        64,
        (X86Reg::Rax, X86Reg::Rdx),
        (X86Reg::Rbx, X86Reg::Rcx),
    )
}

pub(super) fn cpuid(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let eax = operand::get_reg(ctx, i, X86Reg::Eax)?;

    let leaf0 = ctx.tmp(8);
    ctx.emit(equ_(eax, Immediate::new(0, 32), leaf0));
    ctx.jump(leaf0, "cpuid_basic");

    // unmodeled leaves are an opaque step
    ctx.emit(unkn_());
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("cpuid_basic");
    operand::set_reg(ctx, i, X86Reg::Eax, Immediate::new(0, 32).into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, X86Reg::Ebx, Immediate::new(0x756e_6547, 32).into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, X86Reg::Ecx, Immediate::new(0x4965_6e69, 32).into(), WriteFlags::empty())?;
    operand::set_reg(ctx, i, X86Reg::Edx, Immediate::new(0x6c65_746e, 32).into(), WriteFlags::empty())?;

    ctx.label("done");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn int(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let vector = operand::immediate_value(i, 0).unwrap_or(0);
    ctx.emit(sys_(Some(Immediate::new(vector as u128, 8))));
    Ok(())
}

pub(super) fn int1(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(sys_(Some(Immediate::new(1, 8))));
    Ok(())
}

pub(super) fn int3(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(sys_(Some(Immediate::new(3, 8))));
    Ok(())
}

pub(super) fn into(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.jump(flag("of"), "do_interrupt");
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("do_interrupt");
    ctx.emit(sys_(Some(Immediate::new(4, 8))));

    ctx.label("done");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn lahf(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    // ah = sf:zf:0:af:0:pf:1:cf
    let result = ctx.tmp(8);

    ctx.emit(str_(Immediate::new(0, 8), result));
    ctx.emit(or_(flag("sf"), result, result));
    ctx.emit(lshl_(result, Immediate::new(1, 8), result));
    ctx.emit(or_(flag("zf"), result, result));
    ctx.emit(lshl_(result, Immediate::new(2, 8), result));
    ctx.emit(or_(flag("af"), result, result));
    ctx.emit(lshl_(result, Immediate::new(2, 8), result));
    ctx.emit(or_(flag("pf"), result, result));
    ctx.emit(lshl_(result, Immediate::new(1, 8), result));
    ctx.emit(or_(Immediate::new(1, 8), result, result));
    ctx.emit(lshl_(result, Immediate::new(1, 8), result));
    ctx.emit(or_(flag("cf"), result, result));

    operand::set_reg(ctx, i, X86Reg::Ah, result.into(), WriteFlags::empty())
}

pub(super) fn sahf(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let ah = operand::get_reg(ctx, i, X86Reg::Ah)?;

    for (name, bit) in [("cf", 0u16), ("pf", 2), ("af", 4), ("zf", 6), ("sf", 7)] {
        let tmp = ctx.tmp(8);
        ctx.emit(and_(ah.clone(), Immediate::new(1 << bit, 8), tmp));
        ctx.emit(bisnz_(tmp, flag(name)));
    }
    Ok(())
}

pub(super) fn nop(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn rdtsc(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(nop_());
    Ok(())
}

/// set if above
pub(super) fn seta(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::A)
}

/// set if above or equal
pub(super) fn setae(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::Ae)
}

/// set if below
pub(super) fn setb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::B)
}

/// set if below or equal
pub(super) fn setbe(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::Be)
}

/// set if equal
pub(super) fn sete(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::E)
}

/// set if greater
pub(super) fn setg(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::G)
}

/// set if greater or equal
pub(super) fn setge(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::Ge)
}

/// set if less
pub(super) fn setl(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::L)
}

/// set if less or equal
pub(super) fn setle(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::Le)
}

/// set if not equal
pub(super) fn setne(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::Ne)
}

/// set if not overflow
pub(super) fn setno(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::No)
}

/// set if not parity
pub(super) fn setnp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::Np)
}

/// set if not sign
pub(super) fn setns(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::Ns)
}

/// set if overflow
pub(super) fn seto(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::O)
}

/// set if parity
pub(super) fn setp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::P)
}

/// set if sign
pub(super) fn sets(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_set(ctx, i, Condition::S)
}

pub(super) fn sysenter(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(sys_(Some(Immediate::new(1, 8))));
    Ok(())
}

pub(super) fn syscall(ctx: &mut X86Context, _i: &X86Insn) -> Result<(), TranslationError> {
    ctx.emit(sys_(Some(Immediate::new(0, 8))));
    Ok(())
}

pub(super) fn xchg(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;

    let tmp0 = ctx.tmp(a.size());
    ctx.emit(str_(a, tmp0));

    operand::set(ctx, i, 0, b, WriteFlags::empty())?;
    operand::set(ctx, i, 1, tmp0.into(), WriteFlags::empty())
}
