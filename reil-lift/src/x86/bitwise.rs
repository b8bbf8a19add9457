//! Translation of bit-twiddling instructions: shifts, rotates, bit tests,
//! bit scans and the BMI extensions.

use reil_il::bits::{carry_bit, mask, sign_bit};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand};

use crate::error::TranslationError;

use super::operand::{self, WriteFlags};
use super::utilities::{flag, set_pf, set_sf, set_zf};
use super::{X86Context, X86Insn};

fn shift_set_flags(ctx: &mut X86Context, result: &Operand) {
    let size = result.size();
    let sign_result = ctx.tmp(size);

    ctx.emit(and_(
        result.clone(),
        Immediate::new(sign_bit(size), size),
        sign_result,
    ));
    ctx.emit(bisnz_(sign_result, flag("sf")));
    ctx.emit(bisz_(result.clone(), flag("zf")));

    set_pf(ctx, result.clone());
}

/// The shift count operand: implicit 1 for the `.. 1` encodings, `cl` for
/// the register forms, or the explicit second operand.
fn shift_count(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<Operand, TranslationError> {
    if i.operands.len() == 1 {
        if i.mnemonic.ends_with('1') {
            Ok(Immediate::new(1, size).into())
        } else {
            let counter = ctx.counter.clone();
            Ok(operand::narrowed(ctx, &counter, 8))
        }
    } else {
        operand::get(ctx, i, 1)
    }
}

/// Read the bit selected by the offset operand out of the base operand.
/// For memory bases the offset indexes an arbitrarily long bitstring, so
/// the byte address is computed first.
fn read_bit(
    ctx: &mut X86Context,
    i: &X86Insn,
    base_index: usize,
    offset_index: usize,
) -> Result<Operand, TranslationError> {
    let bit = ctx.tmp(8);

    if operand::is_memory(i, base_index) {
        let base = operand::get_address(ctx, i, base_index)?;
        let base = match base {
            Operand::Temporary(t) => t,
            other => {
                let t = ctx.tmp(other.size());
                ctx.emit(str_(other, t));
                t
            }
        };
        let offset = operand::get(ctx, i, offset_index)?;
        let osize = offset.size();

        let offset_sign = ctx.tmp(8);
        let byte_offset = ctx.tmp(base.size);
        let tmp0 = ctx.tmp(osize);
        let tmp1 = ctx.tmp(osize);
        let tmp2 = ctx.tmp(osize);
        let byte = ctx.tmp(8);
        let bitmask = ctx.tmp(8);

        ctx.emit(and_(offset.clone(), Immediate::new(sign_bit(osize), osize), tmp0));
        ctx.emit(bisnz_(tmp0, offset_sign));
        ctx.emit(and_(offset, Immediate::new(!sign_bit(osize), osize), tmp1));
        ctx.emit(div_(tmp1, Immediate::new(8, osize), byte_offset));
        ctx.emit(mod_(tmp1, Immediate::new(8, osize), tmp2));

        ctx.jump(offset_sign, "negative_offset");
        ctx.emit(add_(base, byte_offset, base));
        ctx.jump(Immediate::new(1, 8), "base_calculated");

        ctx.label("negative_offset");
        ctx.emit(sub_(base, byte_offset, base));

        ctx.label("base_calculated");
        ctx.emit(ldm_(base, byte));
        ctx.emit(lshl_(Immediate::new(1, 8), tmp2, bitmask));
        ctx.emit(and_(byte, bitmask, byte));
        ctx.emit(bisnz_(byte, bit));
    } else {
        let a = operand::get(ctx, i, base_index)?;
        let offset = operand::get(ctx, i, offset_index)?;
        let size = a.size();
        let bitmask = ctx.tmp(size);
        let tmp0 = ctx.tmp(size);

        ctx.emit(lshl_(Immediate::new(1, size), offset, bitmask));
        ctx.emit(and_(a, bitmask, tmp0));
        ctx.emit(bisnz_(tmp0, bit));
    }

    Ok(bit.into())
}

/// Write `bit` into the position selected by the offset operand.
fn write_bit(
    ctx: &mut X86Context,
    i: &X86Insn,
    base_index: usize,
    offset_index: usize,
    bit: Operand,
) -> Result<(), TranslationError> {
    if operand::is_memory(i, base_index) {
        let base = operand::get_address(ctx, i, base_index)?;
        let base = match base {
            Operand::Temporary(t) => t,
            other => {
                let t = ctx.tmp(other.size());
                ctx.emit(str_(other, t));
                t
            }
        };
        let offset = operand::get(ctx, i, offset_index)?;
        let osize = offset.size();

        let offset_sign = ctx.tmp(8);
        let byte_offset = ctx.tmp(base.size);
        let tmp0 = ctx.tmp(osize);
        let bit_index = ctx.tmp(osize);
        let byte = ctx.tmp(8);
        let bitmask = ctx.tmp(8);
        let shifted = ctx.tmp(8);

        ctx.emit(and_(offset.clone(), Immediate::new(sign_bit(osize), osize), tmp0));
        ctx.emit(bisnz_(tmp0, offset_sign));
        ctx.emit(and_(offset.clone(), Immediate::new(!sign_bit(osize), osize), tmp0));
        ctx.emit(div_(tmp0, Immediate::new(8, osize), byte_offset));
        ctx.emit(mod_(tmp0, Immediate::new(8, osize), bit_index));

        // distinct from the read_bit labels: btc and friends emit both
        // helpers into one block
        ctx.jump(offset_sign, "write_negative_offset");
        ctx.emit(add_(base, byte_offset, base));
        ctx.jump(Immediate::new(1, 8), "write_base_calculated");

        ctx.label("write_negative_offset");
        ctx.emit(sub_(base, byte_offset, base));

        ctx.label("write_base_calculated");
        ctx.emit(ldm_(base, byte));
        ctx.emit(lshl_(Immediate::new(1, 8), bit_index, bitmask));
        ctx.emit(xor_(bitmask, Immediate::new(mask(8), 8), bitmask));
        ctx.emit(and_(byte, bitmask, byte));
        ctx.emit(lshl_(bit, bit_index, shifted));
        ctx.emit(or_(byte, shifted, byte));
        ctx.emit(stm_(byte, base));
    } else {
        let a = operand::get(ctx, i, base_index)?;
        let offset = operand::get(ctx, i, offset_index)?;
        let size = a.size();
        let bitmask = ctx.tmp(size);
        let tmp0 = ctx.tmp(size);
        let tmp1 = ctx.tmp(size);

        ctx.emit(lshl_(Immediate::new(1, size), offset.clone(), bitmask));
        ctx.emit(xor_(bitmask, Immediate::new(mask(size), size), bitmask));
        ctx.emit(and_(a, bitmask, tmp0));
        ctx.emit(str_(bit, tmp1));
        ctx.emit(lshl_(tmp1, offset, tmp1));
        ctx.emit(or_(tmp0, tmp1, tmp1));

        operand::set(ctx, i, base_index, tmp1.into(), WriteFlags::empty())?;
    }
    Ok(())
}

// Instruction translators

pub(super) fn bextr(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let b = operand::get(ctx, i, 2)?;
    let size = a.size();

    let start = ctx.tmp(8);
    let length = ctx.tmp(8);
    let field_mask = ctx.tmp(size);
    let tmp0 = ctx.tmp(8);
    let result = ctx.tmp(size);

    ctx.emit(str_(b.clone(), start));
    ctx.emit(lshr_(b, Immediate::new(8, 8), length));

    // build a mask covering [start + length, start)
    ctx.emit(sub_(Immediate::new(size as u128, size), length, tmp0));
    ctx.emit(lshr_(Immediate::new(mask(size), size), tmp0, field_mask));
    ctx.emit(add_(tmp0, start, tmp0));
    ctx.emit(lshl_(field_mask, tmp0, field_mask));
    ctx.emit(lshr_(field_mask, start, field_mask));

    ctx.emit(and_(a, field_mask, result));
    ctx.emit(lshr_(result, start, result));

    set_zf(ctx, result);

    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    ctx.emit(undef_(flag("af")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("pf")));

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

/// Find-first-set loop shared by the BMI extract instructions: leaves the
/// lowest set bit's index in `index` and branches to `"found"`, with the
/// `"non-zero"` label marking loop setup and `"done"` left for the caller.
fn lowest_set_bit(ctx: &mut X86Context, a: &Operand) -> (reil_il::Temporary, reil_il::Temporary) {
    let size = a.size();
    let bit = ctx.tmp(size);
    let index = ctx.tmp(size);
    let tmp0 = ctx.tmp(size);

    ctx.label("non-zero");
    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));
    ctx.emit(str_(Immediate::new(0, size), index));
    ctx.emit(str_(Immediate::new(1, size), bit));

    ctx.label("loop");
    ctx.emit(and_(a.clone(), bit, tmp0));
    ctx.jump(tmp0, "found");

    ctx.emit(add_(index, Immediate::new(1, size), index));
    ctx.emit(lshl_(bit, Immediate::new(1, size), bit));
    ctx.jump(Immediate::new(1, 8), "loop");

    ctx.label("found");
    (bit, index)
}

pub(super) fn blsi(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let size = a.size();
    let result = ctx.tmp(size);

    ctx.jump(a.clone(), "non-zero");

    ctx.emit(str_(Immediate::new(1, 8), flag("zf")));
    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    ctx.jump(Immediate::new(1, 8), "done");

    let (_, index) = lowest_set_bit(ctx, &a);
    ctx.emit(str_(Immediate::new(1, size), result));
    ctx.emit(lshl_(result, index, result));

    operand::set(ctx, i, 0, result.into(), WriteFlags::CLEAR)?;

    set_sf(ctx, result);
    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));
    ctx.emit(str_(Immediate::new(1, 8), flag("cf")));

    ctx.label("done");
    ctx.emit(str_(Immediate::new(0, 8), flag("of")));
    ctx.emit(undef_(flag("pf")));
    ctx.emit(undef_(flag("af")));
    Ok(())
}

pub(super) fn blsmsk(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let size = a.size();
    let result = ctx.tmp(size);

    ctx.jump(a.clone(), "non-zero");

    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));
    ctx.jump(Immediate::new(1, 8), "done");

    let (_, index) = lowest_set_bit(ctx, &a);
    ctx.emit(str_(Immediate::new(mask(size), size), result));
    ctx.emit(lshl_(result, index, result));
    ctx.emit(lshr_(result, index, result));
    ctx.emit(xor_(Immediate::new(mask(size), size), result, result));

    operand::set(ctx, i, 0, result.into(), WriteFlags::CLEAR)?;

    set_sf(ctx, result);
    ctx.emit(str_(Immediate::new(1, 8), flag("cf")));

    ctx.label("done");
    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));
    ctx.emit(str_(Immediate::new(0, 8), flag("of")));
    ctx.emit(undef_(flag("pf")));
    ctx.emit(undef_(flag("af")));
    Ok(())
}

pub(super) fn blsr(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let size = a.size();
    let result = ctx.tmp(size);

    ctx.jump(a.clone(), "non-zero");

    ctx.emit(str_(Immediate::new(1, 8), flag("cf")));
    ctx.jump(Immediate::new(1, 8), "done");

    let (_, index) = lowest_set_bit(ctx, &a);
    ctx.emit(str_(Immediate::new(1, size), result));
    ctx.emit(lshl_(result, index, result));
    ctx.emit(xor_(a.clone(), result, result));

    operand::set(ctx, i, 0, result.into(), WriteFlags::CLEAR)?;

    ctx.emit(str_(Immediate::new(0, 8), flag("cf")));

    ctx.label("done");
    set_zf(ctx, result);
    set_sf(ctx, result);
    ctx.emit(str_(Immediate::new(0, 8), flag("of")));
    ctx.emit(undef_(flag("pf")));
    ctx.emit(undef_(flag("af")));
    Ok(())
}

pub(super) fn bsf(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;

    ctx.jump(a.clone(), "non-zero");

    // source of zero: zf set, destination undefined
    ctx.emit(str_(Immediate::new(1, 8), flag("zf")));
    operand::undefine(ctx, i, 0)?;
    ctx.jump(Immediate::new(1, 8), "done");

    let (_, index) = lowest_set_bit(ctx, &a);
    operand::set(ctx, i, 0, index.into(), WriteFlags::CLEAR)?;

    ctx.label("done");
    ctx.emit(undef_(flag("cf")));
    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("pf")));
    ctx.emit(undef_(flag("af")));
    Ok(())
}

pub(super) fn bsr(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let size = a.size();

    let bit = ctx.tmp(size);
    let index = ctx.tmp(size);
    let tmp0 = ctx.tmp(size);

    ctx.jump(a.clone(), "non-zero");

    ctx.emit(str_(Immediate::new(1, 8), flag("zf")));
    operand::undefine(ctx, i, 0)?;
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("non-zero");
    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));
    ctx.emit(str_(Immediate::new(size as u128 - 1, size), index));
    ctx.emit(str_(Immediate::new(sign_bit(size), size), bit));

    ctx.label("loop");
    ctx.emit(and_(a, bit, tmp0));
    ctx.jump(tmp0, "found");

    ctx.emit(sub_(index, Immediate::new(1, size), index));
    ctx.emit(lshr_(bit, Immediate::new(1, size), bit));
    ctx.jump(Immediate::new(1, 8), "loop");

    ctx.label("found");
    operand::set(ctx, i, 0, index.into(), WriteFlags::CLEAR)?;

    ctx.label("done");
    ctx.emit(undef_(flag("cf")));
    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("pf")));
    ctx.emit(undef_(flag("af")));
    Ok(())
}

pub(super) fn bt(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let bit = read_bit(ctx, i, 0, 1)?;
    ctx.emit(str_(bit, flag("cf")));
    Ok(())
}

pub(super) fn btc(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let bit = read_bit(ctx, i, 0, 1)?;
    let inverted = ctx.tmp(8);

    ctx.emit(str_(bit.clone(), flag("cf")));
    ctx.emit(bisz_(bit, inverted));

    write_bit(ctx, i, 0, 1, inverted.into())
}

pub(super) fn btr(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let bit = read_bit(ctx, i, 0, 1)?;
    ctx.emit(str_(bit, flag("cf")));

    write_bit(ctx, i, 0, 1, Immediate::new(0, 8).into())
}

pub(super) fn bts(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let bit = read_bit(ctx, i, 0, 1)?;
    ctx.emit(str_(bit, flag("cf")));

    write_bit(ctx, i, 0, 1, Immediate::new(1, 8).into())
}

pub(super) fn bzhi(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let b = operand::get(ctx, i, 2)?;
    let size = a.size();

    let result = ctx.tmp(size);
    let index = ctx.tmp(size);
    let tmp0 = ctx.tmp(size * 2);

    ctx.emit(mod_(b.clone(), Immediate::new(size as u128 - 1, size), index));
    ctx.emit(lshl_(a, index, result));
    ctx.emit(lshr_(result, index, result));

    // cf records an index beyond the operand width
    ctx.emit(sub_(b, Immediate::new(size as u128 - 1, size), tmp0));
    ctx.emit(and_(tmp0, Immediate::new(sign_bit(size * 2), size * 2), tmp0));
    ctx.emit(bisnz_(tmp0, flag("cf")));

    set_zf(ctx, result);
    set_sf(ctx, result);

    ctx.emit(str_(Immediate::new(0, 8), flag("of")));
    ctx.emit(undef_(flag("pf")));
    ctx.emit(undef_(flag("af")));

    operand::set(ctx, i, 0, result.into(), WriteFlags::CLEAR)
}

pub(super) fn lzcnt(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let size = a.size();

    let bit = ctx.tmp(size);
    let index = ctx.tmp(size);
    let tmp0 = ctx.tmp(size);

    ctx.jump(a.clone(), "non-zero");

    // all bits clear: the count is the operand width
    ctx.emit(str_(Immediate::new(1, 8), flag("zf")));
    operand::set(ctx, i, 0, Immediate::new(size as u128, size).into(), WriteFlags::CLEAR)?;
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("non-zero");
    ctx.emit(str_(Immediate::new(0, 8), flag("zf")));
    ctx.emit(str_(Immediate::new(0, size), index));
    ctx.emit(str_(Immediate::new(sign_bit(size), size), bit));

    // scan down from the top bit
    ctx.label("loop");
    ctx.emit(and_(a, bit, tmp0));
    ctx.jump(tmp0, "found");

    ctx.emit(add_(index, Immediate::new(1, size), index));
    ctx.emit(lshr_(bit, Immediate::new(1, size), bit));
    ctx.jump(Immediate::new(1, 8), "loop");

    ctx.label("found");
    operand::set(ctx, i, 0, index.into(), WriteFlags::CLEAR)?;

    ctx.label("done");
    ctx.emit(undef_(flag("cf")));
    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("sf")));
    ctx.emit(undef_(flag("pf")));
    ctx.emit(undef_(flag("af")));
    Ok(())
}

pub(super) fn rol(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;

    let size = a.size();
    let max_shift = size as u128 - 1;

    let amount = ctx.tmp(size);
    let zero_rotate = ctx.tmp(8);
    let tmp2 = ctx.tmp(size * 2);
    let tmp3 = ctx.tmp(size * 2);
    let tmp4 = ctx.tmp(size);
    let tmp5 = ctx.tmp(size * 2);
    let tmp6 = ctx.tmp(size);
    let low_bit = ctx.tmp(size);
    let result = ctx.tmp(size);

    // the rotate amount is truncated at the operand width
    ctx.emit(and_(b.clone(), Immediate::new(max_shift, size), amount));

    // a zero rotate leaves the flags alone
    ctx.emit(bisz_(amount, zero_rotate));
    ctx.jump(zero_rotate, "zero_rotate");

    ctx.emit(str_(a.clone(), tmp2));
    ctx.emit(lshl_(tmp2, amount, tmp3));

    // low half of the result
    ctx.emit(str_(tmp3, tmp4));

    // bits rotated out the top come back in at the bottom
    ctx.emit(lshr_(tmp3, Immediate::new(max_shift + 1, size * 2), tmp5));
    ctx.emit(str_(tmp5, tmp6));

    ctx.emit(or_(tmp4, tmp6, result));

    // carry is the last bit rotated across
    ctx.emit(and_(result, Immediate::new(1, size), low_bit));
    ctx.emit(bisnz_(low_bit, flag("cf")));

    if matches!(&b, Operand::Immediate(imm) if imm.value == 1) {
        // overflow is msb of input ^ msb of output, defined only for
        // single-bit rotates
        let sign_in = ctx.tmp(size);
        ctx.emit(and_(a, Immediate::new(sign_bit(size), size), sign_in));
        ctx.emit(xor_(sign_in, low_bit, sign_in));
        ctx.emit(bisnz_(sign_in, flag("of")));
    } else {
        ctx.emit(undef_(flag("of")));
    }

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())?;

    ctx.label("zero_rotate");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn ror(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;

    let size = a.size();
    let max_shift = size as u128 - 1;

    let amount = ctx.tmp(size);
    let zero_rotate = ctx.tmp(8);
    let tmp2 = ctx.tmp(size * 2);
    let tmp3 = ctx.tmp(size * 2);
    let tmp4 = ctx.tmp(size * 2);
    let tmp5 = ctx.tmp(size);
    let tmp6 = ctx.tmp(size * 2);
    let tmp7 = ctx.tmp(size);
    let high_bit = ctx.tmp(size);
    let result = ctx.tmp(size);

    ctx.emit(and_(b.clone(), Immediate::new(max_shift, size), amount));

    ctx.emit(bisz_(amount, zero_rotate));
    ctx.jump(zero_rotate, "zero_rotate");

    // shift the value into the upper half, rotate right, and recombine
    ctx.emit(str_(a.clone(), tmp2));
    ctx.emit(lshl_(tmp2, Immediate::new(max_shift + 1, size * 2), tmp3));
    ctx.emit(lshr_(tmp3, amount, tmp4));

    ctx.emit(str_(tmp4, tmp5));

    ctx.emit(lshr_(tmp4, Immediate::new(max_shift + 1, size * 2), tmp6));
    ctx.emit(str_(tmp6, tmp7));

    ctx.emit(or_(tmp5, tmp7, result));

    // carry is the last bit rotated across
    ctx.emit(and_(result, Immediate::new(sign_bit(size), size), high_bit));
    ctx.emit(bisnz_(high_bit, flag("cf")));

    if matches!(&b, Operand::Immediate(imm) if imm.value == 1) {
        let sign_in = ctx.tmp(size);
        ctx.emit(and_(a, Immediate::new(sign_bit(size), size), sign_in));
        ctx.emit(xor_(sign_in, high_bit, sign_in));
        ctx.emit(bisnz_(sign_in, flag("of")));
    } else {
        ctx.emit(undef_(flag("of")));
    }

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())?;

    ctx.label("zero_rotate");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn sar(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let size = a.size();
    let b = shift_count(ctx, i, size)?;

    let max_shift = size as u128 - 1;

    let amount = ctx.tmp(size);
    let tmp1 = ctx.tmp(size * 2);
    let tmp2 = ctx.tmp(size * 2);
    let tmp3 = ctx.tmp(size * 2);
    let last_out = ctx.tmp(size);
    let tmp5 = ctx.tmp(size * 2);
    let result = ctx.tmp(size);

    // the shift amount is truncated at the operand width
    ctx.emit(and_(b, Immediate::new(max_shift, size), amount));

    // shift the value into the upper half so the bits falling off the
    // bottom stay observable
    ctx.emit(str_(a, tmp1));
    ctx.emit(lshl_(tmp1, Immediate::new(max_shift + 1, size * 2), tmp2));
    ctx.emit(ashr_(tmp2, amount, tmp3));

    // the highest bit of the lower half is the last one shifted out
    ctx.emit(and_(tmp3, Immediate::new(sign_bit(size), size * 2), last_out));

    ctx.emit(ashr_(tmp3, Immediate::new(max_shift + 1, size * 2), tmp5));
    ctx.emit(str_(tmp5, result));

    ctx.emit(bisnz_(last_out, flag("cf")));

    // an arithmetic right shift can never overflow
    ctx.emit(str_(Immediate::new(0, 8), flag("of")));

    shift_set_flags(ctx, &result.into());

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

pub(super) fn shl(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let size = a.size();
    let b = shift_count(ctx, i, size)?;

    let max_shift = size as u128 - 1;

    let amount = ctx.tmp(size);
    let zero_shift = ctx.tmp(8);
    let tmp2 = ctx.tmp(size * 2);
    let tmp3 = ctx.tmp(size * 2);
    let carry = ctx.tmp(size * 2);
    let one_shift = ctx.tmp(8);
    let sign_out = ctx.tmp(size);
    let tmp7 = ctx.tmp(8);
    let result = ctx.tmp(size);

    ctx.emit(and_(b, Immediate::new(max_shift, size), amount));

    // a zero shift leaves the flags alone
    ctx.emit(bisz_(amount, zero_shift));
    ctx.jump(zero_shift, "zero_shift");

    ctx.emit(str_(a, tmp2));
    ctx.emit(lshl_(tmp2, amount, tmp3));
    ctx.emit(str_(tmp3, result));

    // carry is the last bit shifted out
    ctx.emit(and_(tmp3, Immediate::new(carry_bit(size), size * 2), carry));
    ctx.emit(bisnz_(carry, flag("cf")));

    // overflow is defined only for single-bit shifts
    ctx.emit(equ_(amount, Immediate::new(1, size), one_shift));
    ctx.emit(bisz_(one_shift, one_shift));
    ctx.jump(one_shift, "no_overflow_flag");

    ctx.emit(and_(result, Immediate::new(sign_bit(size), size), sign_out));
    ctx.emit(bisnz_(sign_out, tmp7));
    ctx.emit(xor_(flag("cf"), tmp7, flag("of")));
    ctx.jump(Immediate::new(1, 8), "overflow_flag_done");

    ctx.label("no_overflow_flag");
    ctx.emit(undef_(flag("of")));

    ctx.label("overflow_flag_done");

    shift_set_flags(ctx, &result.into());

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())?;

    ctx.label("zero_shift");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn shr(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let size = a.size();
    let b = shift_count(ctx, i, size)?;

    let max_shift = size as u128 - 1;

    let amount = ctx.tmp(size);
    let zero_shift = ctx.tmp(8);
    let tmp2 = ctx.tmp(size * 2);
    let tmp3 = ctx.tmp(size * 2);
    let tmp4 = ctx.tmp(size * 2);
    let tmp5 = ctx.tmp(size * 2);
    let one_shift = ctx.tmp(8);
    let sign_in = ctx.tmp(size);
    let last_out = ctx.tmp(size);
    let result = ctx.tmp(size);

    ctx.emit(and_(b, Immediate::new(max_shift, size), amount));

    ctx.emit(bisz_(amount, zero_shift));
    ctx.jump(zero_shift, "zero_shift");

    // shift the value into the upper half so the bits falling off the
    // bottom stay observable
    ctx.emit(str_(a.clone(), tmp2));
    ctx.emit(lshl_(tmp2, Immediate::new(max_shift + 1, size * 2), tmp3));
    ctx.emit(lshr_(tmp3, amount, tmp4));

    ctx.emit(lshr_(tmp4, Immediate::new(max_shift + 1, size * 2), tmp5));
    ctx.emit(str_(tmp5, result));

    // overflow is defined only for single-bit shifts
    ctx.emit(equ_(amount, Immediate::new(1, size), one_shift));
    ctx.emit(bisz_(one_shift, one_shift));
    ctx.jump(one_shift, "no_overflow_flag");

    ctx.emit(and_(a, Immediate::new(sign_bit(size), size), sign_in));
    ctx.emit(bisnz_(sign_in, flag("of")));
    ctx.jump(Immediate::new(1, 8), "overflow_flag_done");

    ctx.label("no_overflow_flag");
    ctx.emit(undef_(flag("of")));

    ctx.label("overflow_flag_done");

    // carry is the last bit shifted out
    ctx.emit(and_(tmp4, Immediate::new(sign_bit(size), size * 2), last_out));
    ctx.emit(bisnz_(last_out, flag("cf")));

    shift_set_flags(ctx, &result.into());

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())?;

    ctx.label("zero_shift");
    ctx.emit(nop_());
    Ok(())
}

pub(super) fn shrd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;
    let size = a.size();

    let c = if i.operands.len() == 2 {
        let counter = ctx.counter.clone();
        operand::narrowed(ctx, &counter, 8)
    } else {
        operand::get(ctx, i, 2)?
    };

    let max_shift = size as u128 - 1;

    let amount = ctx.tmp(size);
    let pair = ctx.tmp(size * 2);
    let result = ctx.tmp(size);

    ctx.emit(and_(c, Immediate::new(max_shift, size), amount));

    // concatenate b:a and shift the pair right
    ctx.emit(str_(b, pair));
    ctx.emit(lshl_(pair, Immediate::new(size as u128, 8), pair));
    ctx.emit(or_(pair, a, pair));

    ctx.emit(lshr_(pair, amount, pair));
    ctx.emit(str_(pair, result));

    ctx.emit(undef_(flag("cf")));
    ctx.emit(undef_(flag("of")));
    ctx.emit(undef_(flag("af")));
    shift_set_flags(ctx, &result.into());

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}
