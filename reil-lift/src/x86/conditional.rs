//! Evaluation of x86 condition codes.

use reil_il::shorthand::*;
use reil_il::{Immediate, Operand, Register};

use super::X86Context;

fn flag(name: &'static str) -> Register {
    Register::new(name, 8)
}

/// The x86 condition codes the translators evaluate.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    A,
    Ae,
    B,
    Be,
    Cxz,
    Ecxz,
    Rcxz,
    E,
    G,
    Ge,
    L,
    Le,
    Ne,
    No,
    Np,
    Ns,
    O,
    P,
    S,
    /// Unconditional; short-circuits to the literal 1.
    Un,
}

/// Lower `cc` to an 8-bit operand that is 1 exactly when the condition
/// holds.
pub(crate) fn condition(ctx: &mut X86Context, cc: Condition) -> Operand {
    if cc == Condition::Un {
        return Immediate::new(1, 8).into();
    }

    let cond = ctx.tmp(8);
    match cc {
        Condition::A => {
            // above (CF == 0 && ZF == 0)
            let tmp0 = ctx.tmp(8);
            ctx.emit(or_(flag("cf"), flag("zf"), tmp0));
            ctx.emit(bisz_(tmp0, cond));
        }
        Condition::Ae => {
            // above or equal (CF == 0)
            ctx.emit(bisz_(flag("cf"), cond));
        }
        Condition::B => {
            // below (CF == 1)
            ctx.emit(bisnz_(flag("cf"), cond));
        }
        Condition::Be => {
            // below or equal (CF == 1 || ZF == 1)
            ctx.emit(or_(flag("cf"), flag("zf"), cond));
        }
        Condition::Cxz => {
            ctx.emit(bisz_(Register::new("cx", 16), cond));
        }
        Condition::Ecxz => {
            ctx.emit(bisz_(Register::new("ecx", 32), cond));
        }
        Condition::Rcxz => {
            ctx.emit(bisz_(Register::new("rcx", 64), cond));
        }
        Condition::E => {
            // equal (ZF == 1)
            ctx.emit(bisnz_(flag("zf"), cond));
        }
        Condition::G => {
            // greater (ZF == 0 && SF == OF)
            let tmp0 = ctx.tmp(8);
            let tmp1 = ctx.tmp(8);
            ctx.emit(equ_(flag("sf"), flag("of"), tmp0));
            ctx.emit(bisz_(flag("zf"), tmp1));
            ctx.emit(and_(tmp0, tmp1, cond));
        }
        Condition::Ge => {
            // greater or equal (SF == OF)
            ctx.emit(equ_(flag("sf"), flag("of"), cond));
        }
        Condition::L => {
            // less (SF != OF)
            let tmp0 = ctx.tmp(8);
            ctx.emit(equ_(flag("sf"), flag("of"), tmp0));
            ctx.emit(bisz_(tmp0, cond));
        }
        Condition::Le => {
            // less or equal (ZF == 1 || SF != OF)
            let tmp0 = ctx.tmp(8);
            let tmp1 = ctx.tmp(8);
            ctx.emit(equ_(flag("sf"), flag("of"), tmp0));
            ctx.emit(bisz_(tmp0, tmp1));
            ctx.emit(or_(flag("zf"), tmp1, cond));
        }
        Condition::Ne => {
            // not equal (ZF == 0)
            ctx.emit(bisz_(flag("zf"), cond));
        }
        Condition::No => {
            ctx.emit(bisz_(flag("of"), cond));
        }
        Condition::Np => {
            ctx.emit(bisz_(flag("pf"), cond));
        }
        Condition::Ns => {
            ctx.emit(bisz_(flag("sf"), cond));
        }
        Condition::O => {
            ctx.emit(bisnz_(flag("of"), cond));
        }
        Condition::P => {
            ctx.emit(bisnz_(flag("pf"), cond));
        }
        Condition::S => {
            ctx.emit(bisnz_(flag("sf"), cond));
        }
        Condition::Un => unreachable!(),
    }
    cond.into()
}
