//! Translation of AArch64 control flow instructions.

use reil_il::shorthand::*;

use crate::error::TranslationError;

use super::conditional::{self, Arm64Condition};
use super::operand;
use super::{Arm64Context, Arm64Insn};

pub(super) fn b(ctx: &mut Arm64Context, i: &Arm64Insn) -> Result<(), TranslationError> {
    let target = operand::get(ctx, i, 0)?;
    let cond = conditional::condition(ctx, i.cc.unwrap_or(Arm64Condition::Al));
    ctx.emit(jcc_(cond, target));
    Ok(())
}
