//! Translation of memory and move instructions: mov and friends, push/pop,
//! the string operations and their REP-prefixed forms.

use reil_il::shorthand::*;
use reil_il::{Immediate, Offset};

use crate::error::TranslationError;

use super::arithmetic::sub_set_flags;
use super::conditional::{self, Condition};
use super::operand::{self, WriteFlags};
use super::utilities::flag;
use super::{X86Context, X86Insn, X86Reg};

// Helpers

fn conditional_mov(ctx: &mut X86Context, i: &X86Insn, cc: Condition) -> Result<(), TranslationError> {
    let cond = conditional::condition(ctx, cc);

    let value = if i.operands.len() == 1 {
        // source is the accumulator
        ctx.accumulator.clone().into()
    } else {
        operand::get(ctx, i, 1)?
    };

    ctx.jump(cond, "do_mov");
    ctx.jump(Immediate::new(1, 8), "done");

    ctx.label("do_mov");
    operand::set(ctx, i, 0, value, WriteFlags::CLEAR)?;

    ctx.label("done");
    ctx.emit(nop_());
    Ok(())
}

/// REP prologue: a zero counter skips the whole native instruction.
fn rep_prologue(ctx: &mut X86Context, i: &X86Insn) {
    let counter = ctx.counter.clone();
    let zero = ctx.tmp(8);

    ctx.emit(bisz_(counter, zero));
    ctx.emit(jcc_(
        zero,
        Immediate::new((i.address + i.size as u64) as u128, ctx.word_size),
    ));
}

/// REP epilogue: decrement the counter and loop back to the top of this
/// block while the repeat condition holds. Looping in place keeps the whole
/// iteration inside one native instruction, so analyzers see a fixed point
/// instead of an unrolled string operation.
fn rep_epilogue(ctx: &mut X86Context, i: &X86Insn) {
    let word = ctx.word_size;
    let counter = ctx.counter.clone();
    let cond = ctx.tmp(8);

    ctx.emit(sub_(&counter, Immediate::new(1, word), &counter));
    ctx.emit(bisnz_(counter, cond));

    if i.mnemonic.starts_with("repne") {
        // repeat while counter > 0 and zf clear
        let tmp = ctx.tmp(8);
        ctx.emit(bisz_(flag("zf"), tmp));
        ctx.emit(and_(tmp, cond, cond));
    } else if i.mnemonic.starts_with("repe") || i.mnemonic.contains("cmps") {
        // repeat while counter > 0 and zf set
        ctx.emit(and_(flag("zf"), cond, cond));
    }

    ctx.emit(jcc_(cond, Offset::new(0)));
}

// Instruction translators

/// mov if above
pub(super) fn cmova(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::A)
}

/// mov if above or equal
pub(super) fn cmovae(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::Ae)
}

/// mov if below
pub(super) fn cmovb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::B)
}

/// mov if below or equal
pub(super) fn cmovbe(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::Be)
}

/// mov if equal
pub(super) fn cmove(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::E)
}

/// mov if greater
pub(super) fn cmovg(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::G)
}

/// mov if greater or equal
pub(super) fn cmovge(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::Ge)
}

/// mov if less
pub(super) fn cmovl(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::L)
}

/// mov if less or equal
pub(super) fn cmovle(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::Le)
}

/// mov if not equal
pub(super) fn cmovne(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::Ne)
}

/// mov if not overflow
pub(super) fn cmovno(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::No)
}

/// mov if not parity
pub(super) fn cmovnp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::Np)
}

/// mov if not sign
pub(super) fn cmovns(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::Ns)
}

/// mov if overflow
pub(super) fn cmovo(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::O)
}

/// mov if parity
pub(super) fn cmovp(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::P)
}

/// mov if sign
pub(super) fn cmovs(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    conditional_mov(ctx, i, Condition::S)
}

fn cmps(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let word = ctx.word_size;
    let src = ctx.source.clone();
    let dst = ctx.destination.clone();

    let result = ctx.tmp(size * 2);
    let value1 = ctx.tmp(size);
    let address1 = ctx.tmp(src.size);
    let value2 = ctx.tmp(size);
    let address2 = ctx.tmp(src.size);

    if i.has_rep_prefix() {
        rep_prologue(ctx, i);
    }

    ctx.emit(str_(&src, address1));
    ctx.emit(ldm_(address1, value1));

    ctx.emit(str_(&dst, address2));
    ctx.emit(ldm_(address2, value2));

    ctx.emit(sub_(value1, value2, result));
    sub_set_flags(ctx, &value1.into(), &value2.into(), &result.into(), true);

    let step = Immediate::new(size as u128 / 8, word);
    ctx.jump(flag("df"), "decrement");
    ctx.label("increment");
    ctx.emit(add_(address1, &step, address1));
    ctx.emit(add_(address2, &step, address2));
    ctx.jump(Immediate::new(1, 8), "set");
    ctx.label("decrement");
    ctx.emit(sub_(address1, &step, address1));
    ctx.emit(sub_(address2, &step, address2));
    ctx.label("set");
    ctx.emit(str_(address1, src));
    ctx.emit(str_(address2, dst));

    if i.has_rep_prefix() {
        rep_epilogue(ctx, i);
    }
    Ok(())
}

pub(super) fn cmpsb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    cmps(ctx, i, 8)
}

pub(super) fn cmpsw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    cmps(ctx, i, 16)
}

pub(super) fn cmpsd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    cmps(ctx, i, 32)
}

pub(super) fn cmpsq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    cmps(ctx, i, 64)
}

pub(super) fn lea(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let address = operand::get_address(ctx, i, 1)?;
    operand::set(ctx, i, 0, address, WriteFlags::CLEAR)
}

pub(super) fn leave(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let _ = i;
    let word = ctx.word_size;
    let frame_ptr = ctx.frame_ptr.clone();
    let stack_ptr = ctx.stack_ptr.clone();

    ctx.emit(str_(&frame_ptr, &stack_ptr));
    ctx.emit(ldm_(&stack_ptr, frame_ptr));
    ctx.emit(add_(
        &stack_ptr,
        Immediate::new(word as u128 / 8, word),
        &stack_ptr,
    ));
    Ok(())
}

fn lods(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let word = ctx.word_size;
    let src = ctx.source.clone();
    let value = ctx.tmp(size);

    if i.has_rep_prefix() {
        rep_prologue(ctx, i);
    }

    ctx.emit(ldm_(&src, value));

    let dst = match size {
        8 => X86Reg::Al,
        16 => X86Reg::Ax,
        32 => X86Reg::Eax,
        _ => X86Reg::Rax,
    };
    operand::set_reg(ctx, i, dst, value.into(), WriteFlags::empty())?;

    let step = Immediate::new(size as u128 / 8, word);
    ctx.jump(flag("df"), "decrement");
    ctx.label("increment");
    ctx.emit(add_(&src, &step, &src));
    ctx.jump(Immediate::new(1, 8), "set");
    ctx.label("decrement");
    ctx.emit(sub_(&src, &step, &src));
    ctx.label("set");
    ctx.emit(nop_());

    if i.has_rep_prefix() {
        rep_epilogue(ctx, i);
    }
    Ok(())
}

pub(super) fn lodsb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    lods(ctx, i, 8)
}

pub(super) fn lodsd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    lods(ctx, i, 32)
}

pub(super) fn lodsq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    lods(ctx, i, 64)
}

pub(super) fn lodsw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    lods(ctx, i, 16)
}

pub(super) fn mov(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let size = operand::get_size(ctx, i, 0)?;

    let value = if i.operands.len() == 1 {
        // source is the accumulator
        ctx.accumulator.clone().into()
    } else {
        operand::get_sized(ctx, i, 1, size)?
    };

    // sub-word register destinations keep their untouched bits; the write
    // layer zero-extends the dword and SSE cases on its own
    operand::set(ctx, i, 0, value, WriteFlags::empty())
}

pub(super) fn movabs(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    mov(ctx, i)
}

fn movs(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    // capstone-style decoders reuse the movsd mnemonic for the SSE scalar
    // move; with a register operand on either side this is that form, and
    // plain mov handles it
    if !operand::is_memory(i, 0) || !operand::is_memory(i, 1) {
        return mov(ctx, i);
    }

    let word = ctx.word_size;
    let src = ctx.source.clone();
    let dst = ctx.destination.clone();
    let value = ctx.tmp(size);

    if i.has_rep_prefix() {
        rep_prologue(ctx, i);
    }

    ctx.emit(ldm_(&src, value));
    ctx.emit(stm_(value, &dst));

    let step = Immediate::new(size as u128 / 8, word);
    ctx.jump(flag("df"), "decrement");
    ctx.label("increment");
    ctx.emit(add_(&dst, &step, &dst));
    ctx.emit(add_(&src, &step, &src));
    ctx.jump(Immediate::new(1, 8), "done");
    ctx.label("decrement");
    ctx.emit(sub_(&dst, &step, &dst));
    ctx.emit(sub_(&src, &step, &src));
    ctx.label("done");
    ctx.emit(nop_());

    if i.has_rep_prefix() {
        rep_epilogue(ctx, i);
    }
    Ok(())
}

pub(super) fn movsb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    movs(ctx, i, 8)
}

pub(super) fn movsd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    movs(ctx, i, 32)
}

pub(super) fn movsq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    movs(ctx, i, 64)
}

pub(super) fn movsw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    movs(ctx, i, 16)
}

pub(super) fn movsx(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let value = if i.operands.len() == 1 {
        ctx.accumulator.clone().into()
    } else {
        operand::get(ctx, i, 1)?
    };

    operand::set(ctx, i, 0, value, WriteFlags::CLEAR | WriteFlags::SIGN_EXTEND)
}

pub(super) fn movzx(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let value = if i.operands.len() == 1 {
        ctx.accumulator.clone().into()
    } else {
        operand::get(ctx, i, 1)?
    };

    operand::set(ctx, i, 0, value, WriteFlags::CLEAR)
}

pub(super) fn pop(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let size = operand::get_size(ctx, i, 0)?;
    let word = ctx.word_size;
    let stack_ptr = ctx.stack_ptr.clone();
    let value = ctx.tmp(size);

    ctx.emit(ldm_(&stack_ptr, value));
    ctx.emit(add_(
        &stack_ptr,
        Immediate::new(size as u128 / 8, word),
        &stack_ptr,
    ));

    operand::set(ctx, i, 0, value.into(), WriteFlags::empty())
}

pub(super) fn push(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    let value = operand::get(ctx, i, 0)?;
    let word = ctx.word_size;
    let stack_ptr = ctx.stack_ptr.clone();

    ctx.emit(sub_(
        &stack_ptr,
        Immediate::new(word as u128 / 8, word),
        &stack_ptr,
    ));

    let value = if value.size() != word {
        // narrow pushes (push imm8) sign-extend to the stack width
        let widened = ctx.tmp(word);
        ctx.emit(sex_(value, widened));
        widened.into()
    } else {
        value
    };

    ctx.emit(stm_(value, stack_ptr));
    Ok(())
}

fn scas(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let word = ctx.word_size;
    let dst = ctx.destination.clone();
    let acc = ctx.accumulator.clone();

    let expected = operand::narrowed(ctx, &acc, size);
    let value = ctx.tmp(size);
    let result = ctx.tmp(size * 2);
    let address = ctx.tmp(dst.size);

    if i.has_rep_prefix() {
        rep_prologue(ctx, i);
    }

    ctx.emit(str_(&dst, address));
    ctx.emit(ldm_(address, value));

    ctx.emit(sub_(value, expected.clone(), result));
    sub_set_flags(ctx, &value.into(), &expected, &result.into(), true);

    let step = Immediate::new(size as u128 / 8, word);
    ctx.jump(flag("df"), "decrement");
    ctx.label("increment");
    ctx.emit(add_(address, &step, address));
    ctx.jump(Immediate::new(1, 8), "set");
    ctx.label("decrement");
    ctx.emit(sub_(address, &step, address));
    ctx.label("set");
    ctx.emit(str_(address, dst));

    if i.has_rep_prefix() {
        rep_epilogue(ctx, i);
    }
    Ok(())
}

pub(super) fn scasb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    scas(ctx, i, 8)
}

pub(super) fn scasd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    scas(ctx, i, 32)
}

pub(super) fn scasq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    scas(ctx, i, 64)
}

pub(super) fn scasw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    scas(ctx, i, 16)
}

fn stos(ctx: &mut X86Context, i: &X86Insn, size: u16) -> Result<(), TranslationError> {
    let word = ctx.word_size;
    let dst = ctx.destination.clone();
    let acc = ctx.accumulator.clone();

    let value = operand::narrowed(ctx, &acc, size);
    let address = ctx.tmp(dst.size);

    if i.has_rep_prefix() {
        rep_prologue(ctx, i);
    }

    ctx.emit(str_(&dst, address));
    ctx.emit(stm_(value, address));

    let step = Immediate::new(size as u128 / 8, word);
    ctx.jump(flag("df"), "decrement");
    ctx.label("increment");
    ctx.emit(add_(address, &step, address));
    ctx.jump(Immediate::new(1, 8), "set");
    ctx.label("decrement");
    ctx.emit(sub_(address, &step, address));
    ctx.label("set");
    ctx.emit(str_(address, dst));

    if i.has_rep_prefix() {
        rep_epilogue(ctx, i);
    }
    Ok(())
}

pub(super) fn stosb(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    stos(ctx, i, 8)
}

pub(super) fn stosd(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    stos(ctx, i, 32)
}

pub(super) fn stosq(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    stos(ctx, i, 64)
}

pub(super) fn stosw(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    stos(ctx, i, 16)
}
