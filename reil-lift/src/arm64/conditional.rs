//! Evaluation of AArch64 condition codes.

use reil_il::shorthand::*;
use reil_il::{Immediate, Operand, Register};

use super::Arm64Context;

fn flag(name: &'static str) -> Register {
    Register::new(name, 8)
}

/// AArch64 condition codes, carrying their architectural 4-bit encodings.
///
/// Bit 0 is the invert bit; the upper three bits select the base predicate
/// over the n, z, c and v flags. `AL` and `NV` both behave as "always".
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Arm64Condition {
    Eq = 0b0000,
    Ne = 0b0001,
    Hs = 0b0010,
    Lo = 0b0011,
    Mi = 0b0100,
    Pl = 0b0101,
    Vs = 0b0110,
    Vc = 0b0111,
    Hi = 0b1000,
    Ls = 0b1001,
    Ge = 0b1010,
    Lt = 0b1011,
    Gt = 0b1100,
    Le = 0b1101,
    Al = 0b1110,
    Nv = 0b1111,
}

/// Lower `cc` to an 8-bit operand that is 1 exactly when the condition
/// holds: evaluate the base predicate, then invert if the low encoding bit
/// is set.
pub(crate) fn condition(ctx: &mut Arm64Context, cc: Arm64Condition) -> Operand {
    let encoding = cc as u8;
    let base = (encoding >> 1) & 0b111;

    if base == 0b111 {
        // AL and NV are unconditional
        return Immediate::new(1, 8).into();
    }

    let cond = ctx.tmp(8);
    match base {
        0b000 => {
            ctx.emit(bisnz_(flag("z"), cond));
        }
        0b001 => {
            ctx.emit(bisnz_(flag("c"), cond));
        }
        0b010 => {
            ctx.emit(bisnz_(flag("n"), cond));
        }
        0b011 => {
            ctx.emit(bisnz_(flag("v"), cond));
        }
        0b100 => {
            // c && !z
            let t0 = ctx.tmp(8);
            let t1 = ctx.tmp(8);
            ctx.emit(bisnz_(flag("c"), t0));
            ctx.emit(bisz_(flag("z"), t1));
            ctx.emit(and_(t0, t1, cond));
        }
        0b101 => {
            // n == v
            ctx.emit(equ_(flag("n"), flag("v"), cond));
        }
        _ => {
            // (n == v) && !z
            let t0 = ctx.tmp(8);
            let t1 = ctx.tmp(8);
            ctx.emit(equ_(flag("n"), flag("v"), t0));
            ctx.emit(bisz_(flag("z"), t1));
            ctx.emit(and_(t0, t1, cond));
        }
    }

    if encoding & 0b1 == 1 {
        ctx.emit(bisz_(cond, cond));
    }

    cond.into()
}
