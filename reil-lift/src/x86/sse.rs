//! Translation of the integer subset of the streaming-SIMD extensions.
//!
//! Only the integer forms are modeled; the floating-point forms lower to
//! opaque steps. Three-operand VEX encodings expose distinct source and
//! destination slots; the legacy two-operand encodings alias them.

use itertools::Itertools;
use reil_il::bits::{mask, sign_bit};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand};

use crate::error::TranslationError;

use super::operand::{self, WriteFlags};
use super::utilities::{pack, unpack};
use super::{X86Context, X86Insn};

/// Operand slots as (first source, second source, destination): VEX forms
/// carry the destination separately, legacy forms reuse slot 0.
fn vex_operands(i: &X86Insn) -> (usize, usize, usize) {
    if i.operands.len() == 3 {
        (2, 1, 0)
    } else {
        (0, 1, 0)
    }
}

pub(super) use super::memory::mov as movaps;
pub(super) use super::memory::mov as movd;
pub(super) use super::memory::mov as movdqa;
pub(super) use super::memory::mov as movdqu;
pub(super) use super::memory::mov as movups;

pub(super) fn movhpd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let value = operand::get(ctx, i, 1)?;
    let tmp0 = ctx.tmp(a.size());
    let tmp1 = ctx.tmp(a.size());

    ctx.emit(and_(a, Immediate::new(mask(64), 128), tmp0));
    ctx.emit(str_(value, tmp1));
    ctx.emit(lshl_(tmp1, Immediate::new(64, 8), tmp1));
    ctx.emit(or_(tmp0, tmp1, tmp0));

    operand::set(ctx, i, 0, tmp0.into(), WriteFlags::empty())
}

pub(super) fn movlpd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let value = operand::get(ctx, i, 1)?;
    let tmp0 = ctx.tmp(a.size());

    ctx.emit(and_(a, Immediate::new(mask(128) ^ mask(64), 128), tmp0));
    ctx.emit(or_(tmp0, value, tmp0));

    operand::set(ctx, i, 0, tmp0.into(), WriteFlags::empty())
}

pub(super) fn movq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let value = operand::get(ctx, i, 1)?;
    operand::set(ctx, i, 0, value, WriteFlags::CLEAR)
}

pub(super) fn palignr(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;

    // the shift is always an immediate byte count
    let shift = operand::immediate_value(i, 2)? as u128 * 8;

    let combined: Operand = if a.size() == 64 {
        pack(ctx, &[b, a])
    } else {
        let tmp0 = ctx.tmp(256);
        let tmp1 = ctx.tmp(256);
        ctx.emit(str_(a, tmp0));
        ctx.emit(str_(b, tmp1));
        ctx.emit(lshl_(tmp0, Immediate::new(128, 8), tmp0));
        ctx.emit(or_(tmp0, tmp1, tmp0));
        tmp0.into()
    };

    let result = ctx.tmp(combined.size());
    ctx.emit(lshr_(combined, Immediate::new(shift, 32), result));

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

pub(super) fn pand(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;
    let value = ctx.tmp(a.size());

    ctx.emit(and_(a, b, value));

    operand::set(ctx, i, dst_id, value.into(), WriteFlags::empty())
}

pub(super) fn pandn(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;
    let size = a.size();
    let value = ctx.tmp(size);

    ctx.emit(xor_(a, Immediate::new(mask(size), size), value));
    ctx.emit(and_(value, b, value));

    operand::set(ctx, i, dst_id, value.into(), WriteFlags::empty())
}

fn pcmpeq(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;

    let a_parts = unpack(ctx, &a, size);
    let b_parts = unpack(ctx, &b, size);

    let mut dst_parts = Vec::new();
    for (a_part, b_part) in a_parts.into_iter().zip_eq(b_parts) {
        let equal = ctx.tmp(8);
        let lane = ctx.tmp(size);

        ctx.emit(equ_(a_part, b_part, equal));
        // all-ones on equality, all-zeroes otherwise
        ctx.emit(mul_(equal, Immediate::new(mask(size), size), lane));

        dst_parts.push(lane.into());
    }

    let value = pack(ctx, &dst_parts);
    operand::set(ctx, i, dst_id, value, WriteFlags::empty())
}

pub(super) fn pcmpeqb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpeq(ctx, i, 8)
}

pub(super) fn pcmpeqw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpeq(ctx, i, 16)
}

pub(super) fn pcmpeqd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpeq(ctx, i, 32)
}

pub(super) fn pcmpeqq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpeq(ctx, i, 64)
}

fn pcmpgt(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;

    let a_parts = unpack(ctx, &a, size);
    let b_parts = unpack(ctx, &b, size);

    let mut dst_parts = Vec::new();
    for (a_part, b_part) in a_parts.into_iter().zip_eq(b_parts) {
        let a_sign = ctx.tmp(size);
        let a_abs = ctx.tmp(size);
        let b_sign = ctx.tmp(size);
        let b_abs = ctx.tmp(size);

        let tmp0 = ctx.tmp(size * 2);
        let b_abs_lt_a_abs = ctx.tmp(8);
        let tmp1 = ctx.tmp(size);
        let same_sign = ctx.tmp(8);
        let b_neg = ctx.tmp(8);
        let a_nonneg = ctx.tmp(8);
        let b_neg_and_a_nonneg = ctx.tmp(8);
        let cond = ctx.tmp(8);
        let lane = ctx.tmp(size);

        ctx.emit(and_(a_part.clone(), Immediate::new(sign_bit(size), size), a_sign));
        ctx.emit(and_(a_part, Immediate::new(!sign_bit(size) & mask(size), size), a_abs));
        ctx.emit(and_(b_part.clone(), Immediate::new(sign_bit(size), size), b_sign));
        ctx.emit(and_(b_part, Immediate::new(!sign_bit(size) & mask(size), size), b_abs));

        // a > b <==> (|b| < |a| and sign(a) == sign(b))
        //            or (b < 0 and a >= 0)

        // |b| < |a|
        ctx.emit(sub_(b_abs, a_abs, tmp0));
        ctx.emit(and_(tmp0, Immediate::new(sign_bit(size * 2), size * 2), tmp0));
        ctx.emit(bisnz_(tmp0, b_abs_lt_a_abs));

        // sign(a) == sign(b)
        ctx.emit(xor_(a_sign, b_sign, tmp1));
        ctx.emit(bisz_(tmp1, same_sign));

        // b < 0 and a >= 0
        ctx.emit(bisnz_(b_sign, b_neg));
        ctx.emit(bisz_(a_sign, a_nonneg));
        ctx.emit(and_(b_neg, a_nonneg, b_neg_and_a_nonneg));

        ctx.emit(and_(b_abs_lt_a_abs, same_sign, cond));
        ctx.emit(or_(cond, b_neg_and_a_nonneg, cond));
        ctx.emit(mul_(cond, Immediate::new(mask(size), size), lane));

        dst_parts.push(lane.into());
    }

    let value = pack(ctx, &dst_parts);
    operand::set(ctx, i, dst_id, value, WriteFlags::empty())
}

pub(super) fn pcmpgtb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpgt(ctx, i, 8)
}

pub(super) fn pcmpgtw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpgt(ctx, i, 16)
}

pub(super) fn pcmpgtd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpgt(ctx, i, 32)
}

pub(super) fn pcmpgtq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pcmpgt(ctx, i, 64)
}

fn pmaxu(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;

    let a_parts = unpack(ctx, &a, size);
    let b_parts = unpack(ctx, &b, size);

    let mut dst_parts = Vec::new();
    for (a_part, b_part) in a_parts.into_iter().zip_eq(b_parts) {
        let borrow = ctx.tmp(size * 2);
        let a_ge_b = ctx.tmp(8);
        let b_gt_a = ctx.tmp(8);
        let picked_a = ctx.tmp(size * 2);
        let picked_b = ctx.tmp(size * 2);
        let lane = ctx.tmp(size);

        // select a when a - b does not borrow
        ctx.emit(sub_(a_part.clone(), b_part.clone(), borrow));
        ctx.emit(and_(borrow, Immediate::new(sign_bit(size * 2), size * 2), borrow));
        ctx.emit(bisz_(borrow, a_ge_b));
        ctx.emit(bisz_(a_ge_b, b_gt_a));
        ctx.emit(mul_(a_part, a_ge_b, picked_a));
        ctx.emit(mul_(b_part, b_gt_a, picked_b));
        ctx.emit(add_(picked_a, picked_b, picked_a));
        ctx.emit(str_(picked_a, lane));

        dst_parts.push(lane.into());
    }

    let value = pack(ctx, &dst_parts);
    operand::set(ctx, i, dst_id, value, WriteFlags::empty())
}

fn pminu(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;

    let a_parts = unpack(ctx, &a, size);
    let b_parts = unpack(ctx, &b, size);

    let mut dst_parts = Vec::new();
    for (a_part, b_part) in a_parts.into_iter().zip_eq(b_parts) {
        let borrow = ctx.tmp(size * 2);
        let a_ge_b = ctx.tmp(8);
        let b_gt_a = ctx.tmp(8);
        let picked_a = ctx.tmp(size * 2);
        let picked_b = ctx.tmp(size * 2);
        let lane = ctx.tmp(size);

        // select b when a - b does not borrow
        ctx.emit(sub_(a_part.clone(), b_part.clone(), borrow));
        ctx.emit(and_(borrow, Immediate::new(sign_bit(size * 2), size * 2), borrow));
        ctx.emit(bisz_(borrow, a_ge_b));
        ctx.emit(bisz_(a_ge_b, b_gt_a));
        ctx.emit(mul_(b_part, a_ge_b, picked_b));
        ctx.emit(mul_(a_part, b_gt_a, picked_a));
        ctx.emit(add_(picked_a, picked_b, picked_a));
        ctx.emit(str_(picked_a, lane));

        dst_parts.push(lane.into());
    }

    let value = pack(ctx, &dst_parts);
    operand::set(ctx, i, dst_id, value, WriteFlags::empty())
}

pub(super) fn pmaxub(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pmaxu(ctx, i, 8)
}

pub(super) fn pmaxuw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pmaxu(ctx, i, 16)
}

pub(super) fn pmaxud(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pmaxu(ctx, i, 32)
}

pub(super) fn pmaxuq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pmaxu(ctx, i, 64)
}

pub(super) fn pminub(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pminu(ctx, i, 8)
}

pub(super) fn pminuw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pminu(ctx, i, 16)
}

pub(super) fn pminud(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pminu(ctx, i, 32)
}

pub(super) fn pminuq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    pminu(ctx, i, 64)
}

pub(super) fn pmovmskb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 1)?;
    let a_bytes = unpack(ctx, &a, 8);
    let out_size = a.size() / 8;

    let mut bits = Vec::new();
    for a_byte in a_bytes {
        let bit = ctx.tmp(8);
        ctx.emit(and_(a_byte, Immediate::new(sign_bit(8), 8), bit));
        ctx.emit(bisnz_(bit, bit));
        bits.push(bit);
    }

    bits.reverse();

    let mut value: Operand = Immediate::new(0, out_size).into();
    for bit in bits {
        let tmp0 = ctx.tmp(out_size);
        let next = ctx.tmp(out_size);
        ctx.emit(lshl_(value, Immediate::new(1, 8), tmp0));
        ctx.emit(add_(tmp0, bit, next));
        value = next.into();
    }

    operand::set(ctx, i, 0, value, WriteFlags::CLEAR)
}

pub(super) fn por(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;
    let value = ctx.tmp(a.size());

    ctx.emit(or_(a, b, value));

    operand::set(ctx, i, dst_id, value.into(), WriteFlags::empty())
}

pub(super) fn pshufd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let src = operand::get(ctx, i, 1)?;
    let mut order = operand::get(ctx, i, 2)?;

    let mut value: Operand = Immediate::new(0, 128).into();

    for lane in 0..4u128 {
        let next_order = ctx.tmp(8);
        let selector = ctx.tmp(8);
        let shift = ctx.tmp(32);
        let selected = ctx.tmp(128);
        let lane_value = ctx.tmp(32);
        let widened = ctx.tmp(128);
        let placed = ctx.tmp(128);
        let next = ctx.tmp(128);

        ctx.emit(lshr_(order.clone(), Immediate::new(2, 8), next_order));
        ctx.emit(and_(order, Immediate::new(0b11, 8), selector));
        ctx.emit(mul_(selector, Immediate::new(32, 32), shift));
        ctx.emit(lshr_(src.clone(), shift, selected));
        ctx.emit(str_(selected, lane_value));
        ctx.emit(str_(lane_value, widened));
        ctx.emit(lshl_(widened, Immediate::new(lane * 32, 8), placed));
        ctx.emit(add_(placed, value, next));

        order = next_order.into();
        value = next.into();
    }

    operand::set(ctx, i, 0, value, WriteFlags::empty())
}

pub(super) fn pslldq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let shift = operand::immediate_value(i, 1)?.min(16) as u128;
    let result = ctx.tmp(a.size());

    ctx.emit(lshl_(a, Immediate::new(shift * 8, 8), result));

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

pub(super) fn psrldq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let shift = operand::immediate_value(i, 1)?.min(16) as u128;
    let result = ctx.tmp(a.size());

    ctx.emit(lshr_(a, Immediate::new(shift * 8, 8), result));

    operand::set(ctx, i, 0, result.into(), WriteFlags::empty())
}

fn psub(ctx: &mut X86Context, i: &X86Insn, part_size: u16) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;

    let size = a.size().min(b.size());
    let part_count = (size / part_size) as usize;

    let a_parts = unpack(ctx, &a, part_size);
    let b_parts = if a == b {
        a_parts.clone()
    } else {
        unpack(ctx, &b, part_size)
    };

    let mut parts = Vec::new();
    for (a_part, b_part) in a_parts
        .into_iter()
        .zip_eq(b_parts)
        .take(part_count)
    {
        let lane = ctx.tmp(part_size);
        ctx.emit(sub_(a_part, b_part, lane));
        parts.push(lane.into());
    }

    let value = pack(ctx, &parts);
    operand::set(ctx, i, dst_id, value, WriteFlags::empty())
}

pub(super) fn psubb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    psub(ctx, i, 8)
}

pub(super) fn psubw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    psub(ctx, i, 16)
}

pub(super) fn psubd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    psub(ctx, i, 32)
}

pub(super) fn psubq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    psub(ctx, i, 64)
}

fn punpckl(ctx: &mut X86Context, i: &X86Insn, part_size: u16) -> Result<(), TranslationError> {
    let a = operand::get(ctx, i, 0)?;
    let b = operand::get(ctx, i, 1)?;

    let size = a.size().min(b.size());
    let part_count = (size / (part_size * 2)) as usize;

    let a_parts = unpack(ctx, &a, part_size);
    let b_parts = if a == b {
        a_parts.clone()
    } else {
        unpack(ctx, &b, part_size)
    };

    let mut parts = Vec::new();
    for (a_part, b_part) in a_parts.into_iter().zip_eq(b_parts).take(part_count) {
        parts.push(a_part);
        parts.push(b_part);
    }

    let value = pack(ctx, &parts);
    operand::set(ctx, i, 0, value, WriteFlags::empty())
}

pub(super) fn punpcklbw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    punpckl(ctx, i, 8)
}

pub(super) fn punpcklwd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    punpckl(ctx, i, 16)
}

pub(super) fn punpckldq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    punpckl(ctx, i, 32)
}

pub(super) fn punpcklqdq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    punpckl(ctx, i, 64)
}

pub(super) fn pxor(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let (a_id, b_id, dst_id) = vex_operands(i);

    let a = operand::get(ctx, i, a_id)?;
    let b = operand::get(ctx, i, b_id)?;
    let value = ctx.tmp(a.size());

    ctx.emit(xor_(a, b, value));

    operand::set(ctx, i, dst_id, value.into(), WriteFlags::empty())
}
