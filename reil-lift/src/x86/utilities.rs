//! Flag micro-sequences and lane pack/unpack helpers shared by the x86
//! handler modules.

use reil_il::bits::sign_bit;
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand, Register};

use super::X86Context;

pub(crate) fn flag(name: &'static str) -> Register {
    Register::new(name, 8)
}

/// Compute the parity flag: parity of the low byte of `result`.
///
/// Folds the byte onto its low nibble, then indexes the 16-entry parity
/// table packed into the constant 0x9669.
pub(crate) fn set_pf(ctx: &mut X86Context, result: impl Into<Operand>) {
    let tmp0 = ctx.tmp(8);
    let tmp1 = ctx.tmp(8);
    let tmp2 = ctx.tmp(16);

    ctx.emit(str_(result.into(), tmp0));
    ctx.emit(lshr_(tmp0, Immediate::new(4, 8), tmp1));
    ctx.emit(xor_(tmp0, tmp1, tmp0));
    ctx.emit(and_(tmp0, Immediate::new(0xf, 8), tmp1));
    ctx.emit(lshr_(Immediate::new(0x9669, 16), tmp1, tmp2));
    ctx.emit(and_(tmp2, Immediate::new(1, 8), flag("pf")));
}

/// Compute the sign flag from the most significant bit of `result`.
pub(crate) fn set_sf(ctx: &mut X86Context, result: impl Into<Operand>) {
    let result = result.into();
    let size = result.size();
    let sign = ctx.tmp(size);

    ctx.emit(and_(result, Immediate::new(sign_bit(size), size), sign));
    ctx.emit(bisnz_(sign, flag("sf")));
}

/// Compute the zero flag.
pub(crate) fn set_zf(ctx: &mut X86Context, result: impl Into<Operand>) {
    ctx.emit(bisz_(result.into(), flag("zf")));
}

/// Split `value` into its `size`-bit lanes, lowest lane first.
pub(crate) fn unpack(ctx: &mut X86Context, value: &Operand, size: u16) -> Vec<Operand> {
    let mut parts = Vec::new();
    let mut rest = value.clone();

    for _ in 0..value.size() / size {
        let part = ctx.tmp(size);
        let shifted = ctx.tmp(value.size());

        ctx.emit(str_(rest.clone(), part));
        ctx.emit(lshr_(rest, Immediate::new(size as u128, 8), shifted));
        rest = shifted.into();

        parts.push(part.into());
    }
    parts
}

/// Concatenate equally sized lanes back into one value, first lane lowest.
pub(crate) fn pack(ctx: &mut X86Context, parts: &[Operand]) -> Operand {
    let size = parts.len() as u16 * parts[0].size();
    let mut value: Operand = Immediate::new(0, size).into();

    for part in parts.iter().rev() {
        let tmp0 = ctx.tmp(size);
        let next = ctx.tmp(size);

        ctx.emit(lshl_(value, Immediate::new(part.size() as u128, 8), tmp0));
        ctx.emit(add_(part.clone(), tmp0, next));
        value = next.into();
    }
    value
}
