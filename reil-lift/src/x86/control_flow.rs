//! Translation of control flow instructions: call, jmp, ret and the loop
//! family. All of these end a basic block.

use reil_il::shorthand::*;
use reil_il::{Immediate, Operand};

use crate::error::TranslationError;

use super::conditional::{self, Condition};
use super::operand;
use super::{X86Context, X86Insn};

// Helpers

fn conditional_jump(
    ctx: &mut X86Context,
    i: &X86Insn,
    cc: Condition,
) -> Result<(), TranslationError> {
    let cond = conditional::condition(ctx, cc);
    // jump targets are addresses; immediates widen to the word size
    let dst = operand::get_sized(ctx, i, 0, ctx.word_size)?;

    ctx.emit(jcc_(cond, dst));
    Ok(())
}

fn push(ctx: &mut X86Context, value: Operand) {
    let word = ctx.word_size;
    let stack_ptr = ctx.stack_ptr.clone();

    let value = if value.size() != word {
        let widened = ctx.tmp(word);
        ctx.emit(str_(value, widened));
        widened.into()
    } else {
        value
    };

    ctx.emit(sub_(
        &stack_ptr,
        Immediate::new(word as u128 / 8, word),
        &stack_ptr,
    ));
    ctx.emit(stm_(value, stack_ptr));
}

// Instruction translators

/// call procedure
pub(super) fn call(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let dst = operand::get_sized(ctx, i, 0, ctx.word_size)?;

    let return_address = Immediate::new((i.address + i.size as u64) as u128, ctx.word_size);
    push(ctx, return_address.into());

    ctx.emit(jcc_(Immediate::new(1, 8), dst));
    Ok(())
}

pub(super) fn enter(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let size = operand::get(ctx, i, 0)?;
    // nesting depth is an immediate known at translation time
    let nest = operand::immediate_value(i, 1)? as u64 % 32;

    let word = ctx.word_size;
    let frame_ptr = ctx.frame_ptr.clone();
    let stack_ptr = ctx.stack_ptr.clone();

    push(ctx, frame_ptr.clone().into());

    let frame_tmp: Operand = if nest > 0 {
        let frame_tmp = ctx.tmp(word);
        ctx.emit(str_(&stack_ptr, frame_tmp));

        for _ in 1..nest {
            ctx.emit(sub_(
                &frame_ptr,
                Immediate::new(word as u128 / 8, word),
                &frame_ptr,
            ));
            push(ctx, frame_ptr.clone().into());
        }
        push(ctx, frame_tmp.into());

        frame_tmp.into()
    } else {
        stack_ptr.clone().into()
    };

    ctx.emit(str_(frame_tmp, &frame_ptr));
    ctx.emit(sub_(frame_ptr, size, stack_ptr));
    Ok(())
}

/// jump if above
pub(super) fn ja(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::A)
}

/// jump if above or equal
pub(super) fn jae(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Ae)
}

/// jump if below
pub(super) fn jb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::B)
}

/// jump if below or equal
pub(super) fn jbe(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Be)
}

/// jump if cx is zero
pub(super) fn jcxz(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Cxz)
}

/// jump if ecx is zero
pub(super) fn jecxz(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Ecxz)
}

/// jump if rcx is zero
pub(super) fn jrcxz(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Rcxz)
}

/// jump if equal
pub(super) fn je(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::E)
}

/// jump if greater
pub(super) fn jg(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::G)
}

/// jump if greater or equal
pub(super) fn jge(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Ge)
}

/// jump if less
pub(super) fn jl(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::L)
}

/// jump if less or equal
pub(super) fn jle(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Le)
}

/// jump
pub(super) fn jmp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Un)
}

/// jump if not equal
pub(super) fn jne(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Ne)
}

/// jump if not overflow
pub(super) fn jno(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::No)
}

/// jump if not parity
pub(super) fn jnp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Np)
}

/// jump if not sign
pub(super) fn jns(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::Ns)
}

/// jump if overflow
pub(super) fn jo(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::O)
}

/// jump if parity
pub(super) fn jp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::P)
}

/// jump if sign
pub(super) fn js(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_jump(ctx, i, Condition::S)
}

pub(super) fn loop_(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let cond = ctx.tmp(8);
    let dst = operand::get_sized(ctx, i, 0, ctx.word_size)?;
    let counter = ctx.counter.clone();

    ctx.emit(sub_(&counter, Immediate::new(1, counter.size), &counter));
    ctx.emit(bisnz_(&counter, cond));
    ctx.emit(jcc_(cond, dst));
    Ok(())
}

pub(super) fn loope(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let cond = conditional::condition(ctx, Condition::E);
    loop_tail(ctx, i, cond)
}

pub(super) fn loopne(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let cond = conditional::condition(ctx, Condition::Ne);
    loop_tail(ctx, i, cond)
}

fn loop_tail(ctx: &mut X86Context, i: &X86Insn, cond: Operand) -> Result<(), TranslationError> {
    let dst = operand::get_sized(ctx, i, 0, ctx.word_size)?;
    let counter = ctx.counter.clone();
    let tmp0 = ctx.tmp(8);
    let taken = ctx.tmp(8);

    ctx.emit(sub_(&counter, Immediate::new(1, counter.size), &counter));
    ctx.emit(bisnz_(&counter, tmp0));
    ctx.emit(and_(cond, tmp0, taken));
    ctx.emit(jcc_(taken, dst));
    Ok(())
}

/// return from procedure
pub(super) fn ret(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let word = ctx.word_size;
    let stack_ptr = ctx.stack_ptr.clone();
    let return_address = ctx.tmp(word);

    ctx.emit(ldm_(&stack_ptr, return_address));

    let adjust = match i.operands.is_empty() {
        // ret imm pops the return address and then imm extra bytes
        false => operand::immediate_value(i, 0)? as u128 + word as u128 / 8,
        true => word as u128 / 8,
    };
    ctx.emit(add_(&stack_ptr, Immediate::new(adjust, word), &stack_ptr));

    ctx.emit(jcc_(Immediate::new(1, 8), return_address));
    Ok(())
}
