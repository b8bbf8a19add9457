//! Reading and writing x86 instruction operands.
//!
//! Registers, immediates, and memory references all funnel through `get` /
//! `set`; the sub-register rules (zero-extending dword writes, preserving
//! splices for byte and word writes, the `ah`-style high-byte lane) live in
//! a single classification table shared by the read, write, size, and
//! undefine paths.

use reil_il::bits::{mask, natural_size};
use reil_il::shorthand::*;
use reil_il::{Immediate, Operand as IlOperand, Register};

use crate::error::TranslationError;
use crate::insn::{MemOperand, Operand};

use super::{X86Context, X86Insn, X86Reg};

bitflags::bitflags! {
    /// Behaviour switches for sub-width register writes.
    pub struct WriteFlags: u8 {
        /// Zero- (or sign-) extend into the full register instead of
        /// preserving the untouched high bits.
        const CLEAR = 0b01;
        /// Sign-extend rather than zero-extend when widening.
        const SIGN_EXTEND = 0b10;
    }
}

/// How a decoded register id maps onto the architectural register file.
enum Slice {
    /// The id names a full register.
    Full(Register),
    /// Low 8 bits of `parent`.
    Low8(Register),
    /// Bits 8..16 of `parent`.
    High8(Register),
    /// Low 16 bits of `parent`.
    Low16(Register),
    /// Low 32 bits of `parent`; writes zero-extend to 64 bits.
    Low32(Register),
}

fn classify(ctx: &X86Context, reg: X86Reg) -> Result<Slice, TranslationError> {
    use X86Reg::*;

    if let Ok(full) = ctx.full_register(reg) {
        return Ok(Slice::Full(full));
    }

    let slice = match reg {
        Al => Slice::Low8(ctx.accumulator.clone()),
        Bl => Slice::Low8(ctx.base.clone()),
        Cl => Slice::Low8(ctx.counter.clone()),
        Dl => Slice::Low8(ctx.data.clone()),
        Sil => Slice::Low8(ctx.source.clone()),
        Dil => Slice::Low8(ctx.destination.clone()),
        Bpl => Slice::Low8(ctx.frame_ptr.clone()),
        Spl => Slice::Low8(ctx.stack_ptr.clone()),
        R8b => Slice::Low8(ctx.full_register(R8)?),
        R9b => Slice::Low8(ctx.full_register(R9)?),
        R10b => Slice::Low8(ctx.full_register(R10)?),
        R11b => Slice::Low8(ctx.full_register(R11)?),
        R12b => Slice::Low8(ctx.full_register(R12)?),
        R13b => Slice::Low8(ctx.full_register(R13)?),
        R14b => Slice::Low8(ctx.full_register(R14)?),
        R15b => Slice::Low8(ctx.full_register(R15)?),

        Ah => Slice::High8(ctx.accumulator.clone()),
        Bh => Slice::High8(ctx.base.clone()),
        Ch => Slice::High8(ctx.counter.clone()),
        Dh => Slice::High8(ctx.data.clone()),

        Ax => Slice::Low16(ctx.accumulator.clone()),
        Bx => Slice::Low16(ctx.base.clone()),
        Cx => Slice::Low16(ctx.counter.clone()),
        Dx => Slice::Low16(ctx.data.clone()),
        Si => Slice::Low16(ctx.source.clone()),
        Di => Slice::Low16(ctx.destination.clone()),
        Bp => Slice::Low16(ctx.frame_ptr.clone()),
        Sp => Slice::Low16(ctx.stack_ptr.clone()),
        R8w => Slice::Low16(ctx.full_register(R8)?),
        R9w => Slice::Low16(ctx.full_register(R9)?),
        R10w => Slice::Low16(ctx.full_register(R10)?),
        R11w => Slice::Low16(ctx.full_register(R11)?),
        R12w => Slice::Low16(ctx.full_register(R12)?),
        R13w => Slice::Low16(ctx.full_register(R13)?),
        R14w => Slice::Low16(ctx.full_register(R14)?),
        R15w => Slice::Low16(ctx.full_register(R15)?),

        // Only reached in 64-bit mode; in 32-bit mode these ids name full
        // registers and were handled above.
        Eax => Slice::Low32(ctx.accumulator.clone()),
        Ebx => Slice::Low32(ctx.base.clone()),
        Ecx => Slice::Low32(ctx.counter.clone()),
        Edx => Slice::Low32(ctx.data.clone()),
        Esi => Slice::Low32(ctx.source.clone()),
        Edi => Slice::Low32(ctx.destination.clone()),
        Ebp => Slice::Low32(ctx.frame_ptr.clone()),
        Esp => Slice::Low32(ctx.stack_ptr.clone()),
        R8d => Slice::Low32(ctx.full_register(R8)?),
        R9d => Slice::Low32(ctx.full_register(R9)?),
        R10d => Slice::Low32(ctx.full_register(R10)?),
        R11d => Slice::Low32(ctx.full_register(R11)?),
        R12d => Slice::Low32(ctx.full_register(R12)?),
        R13d => Slice::Low32(ctx.full_register(R13)?),
        R14d => Slice::Low32(ctx.full_register(R14)?),
        R15d => Slice::Low32(ctx.full_register(R15)?),

        other => return Err(TranslationError::UnknownRegister(format!("{other:?}"))),
    };
    Ok(slice)
}

fn operand<'i>(i: &'i X86Insn, index: usize) -> Result<&'i Operand<X86Reg>, TranslationError> {
    i.operands
        .get(index)
        .ok_or(TranslationError::UnsupportedOperand)
}

fn memory_address(
    ctx: &mut X86Context,
    i: &X86Insn,
    mem: &MemOperand<X86Reg>,
) -> Result<IlOperand, TranslationError> {
    let word = ctx.word_size;
    let disp = (mem.disp as i128 as u128) & mask(word);

    let mut address = match (disp != 0, mem.base) {
        (true, None) => Immediate::new(disp, word).into(),
        (false, Some(base)) => get_register(ctx, i, base)?,
        (true, Some(base)) => {
            let base = get_register(ctx, i, base)?;
            let tmp0 = ctx.tmp(word * 2);
            let address = ctx.tmp(word);

            ctx.emit(add_(base, Immediate::new(disp, word), tmp0));
            ctx.emit(and_(tmp0, Immediate::new(mask(word), word * 2), address));
            address.into()
        }
        (false, None) => Immediate::new(0, word).into(),
    };

    if let Some(segment) = mem.segment {
        let segment = ctx.full_register(segment)?;
        let tmp0 = ctx.tmp(word * 2);
        let sum = ctx.tmp(word);

        ctx.emit(add_(address, segment, tmp0));
        ctx.emit(and_(tmp0, Immediate::new(mask(word), word * 2), sum));
        address = sum.into();
    }

    if let Some(index) = mem.index {
        let index = get_register(ctx, i, index)?;
        let tmp0 = ctx.tmp(word * 2);
        let tmp1 = ctx.tmp(word);
        let tmp2 = ctx.tmp(word * 2);
        let sum = ctx.tmp(word);

        ctx.emit(mul_(
            index,
            Immediate::new(mem.scale as i128 as u128, word),
            tmp0,
        ));
        ctx.emit(and_(tmp0, Immediate::new(mask(word), word * 2), tmp1));
        ctx.emit(add_(tmp1, address, tmp2));
        ctx.emit(and_(tmp2, Immediate::new(mask(word), word * 2), sum));
        address = sum.into();
    }

    Ok(address)
}

fn memory_size(ctx: &X86Context, i: &X86Insn) -> u16 {
    // The access width only reaches us through the printable operand form.
    if i.op_str.contains("byte") {
        8
    } else if i.op_str.contains("dword") {
        32
    } else if i.op_str.contains("qword") {
        64
    } else if i.op_str.contains("xmmword") {
        128
    } else if i.op_str.contains("word") {
        16
    } else {
        ctx.word_size
    }
}

fn get_immediate(ctx: &X86Context, value: i64, size: u16) -> Immediate {
    let size = match size {
        0 => natural_size(value.unsigned_abs() as u128, ctx.word_size),
        size => size,
    };
    Immediate::new(value as i128 as u128, size)
}

fn get_register(
    ctx: &mut X86Context,
    i: &X86Insn,
    reg: X86Reg,
) -> Result<IlOperand, TranslationError> {
    // rip reads shortcut the register file so the use_rip switch stays in
    // one place.
    if reg == X86Reg::Rip && !ctx.use_rip {
        return Ok(ctx.pc(i));
    }

    let value = match classify(ctx, reg)? {
        Slice::Full(reg) => reg.into(),
        Slice::Low8(parent) => {
            let byte = ctx.tmp(8);
            ctx.emit(str_(parent, byte));
            byte.into()
        }
        Slice::High8(parent) => {
            let word = ctx.tmp(16);
            let byte = ctx.tmp(8);
            ctx.emit(str_(parent, word));
            ctx.emit(lshr_(word, Immediate::new(8, 8), byte));
            byte.into()
        }
        Slice::Low16(parent) => {
            let word = ctx.tmp(16);
            ctx.emit(str_(parent, word));
            word.into()
        }
        Slice::Low32(parent) => {
            let dword = ctx.tmp(32);
            ctx.emit(str_(parent, dword));
            dword.into()
        }
    };
    Ok(value)
}

fn register_size(ctx: &X86Context, reg: X86Reg) -> Result<u16, TranslationError> {
    Ok(match classify(ctx, reg)? {
        Slice::Full(reg) => reg.size,
        Slice::Low8(_) | Slice::High8(_) => 8,
        Slice::Low16(_) => 16,
        Slice::Low32(_) => 32,
    })
}

/// Read the register operand slice named by `reg`, materialising sub-width
/// parts into a fresh temporary.
pub fn get_reg(
    ctx: &mut X86Context,
    i: &X86Insn,
    reg: X86Reg,
) -> Result<IlOperand, TranslationError> {
    get_register(ctx, i, reg)
}

/// Read a register operand at `size` bits, materialising a narrowed copy
/// when the register is wider.
pub(crate) fn narrowed(ctx: &mut X86Context, reg: &Register, size: u16) -> IlOperand {
    if reg.size == size {
        reg.into()
    } else {
        let value = ctx.tmp(size);
        ctx.emit(str_(reg, value));
        value.into()
    }
}

/// Read operand `index` of `i`.
pub fn get(
    ctx: &mut X86Context,
    i: &X86Insn,
    index: usize,
) -> Result<IlOperand, TranslationError> {
    get_sized(ctx, i, index, 0)
}

/// Read operand `index` of `i`, forcing immediates to `size` bits (0 keeps
/// the natural immediate width).
pub fn get_sized(
    ctx: &mut X86Context,
    i: &X86Insn,
    index: usize,
    size: u16,
) -> Result<IlOperand, TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => get_register(ctx, i, reg),
        Operand::Imm(value) => Ok(get_immediate(ctx, value, size).into()),
        Operand::Mem(ref mem) => {
            let address = memory_address(ctx, i, mem)?;
            let value = ctx.tmp(memory_size(ctx, i));
            ctx.emit(ldm_(address, value));
            Ok(value.into())
        }
    }
}

/// The width in bits of operand `index`.
pub fn get_size(
    ctx: &mut X86Context,
    i: &X86Insn,
    index: usize,
) -> Result<u16, TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => register_size(ctx, reg),
        Operand::Imm(value) => Ok(get_immediate(ctx, value, 0).size),
        Operand::Mem(_) => Ok(memory_size(ctx, i)),
    }
}

/// The effective address of memory operand `index`, as REIL arithmetic on
/// word-sized temporaries.
pub fn get_address(
    ctx: &mut X86Context,
    i: &X86Insn,
    index: usize,
) -> Result<IlOperand, TranslationError> {
    match operand(i, index)? {
        Operand::Mem(mem) => memory_address(ctx, i, &mem.clone()),
        _ => Err(TranslationError::UnsupportedOperand),
    }
}

/// The raw value of the immediate operand at `index`.
pub(crate) fn immediate_value(i: &X86Insn, index: usize) -> Result<i64, TranslationError> {
    match *operand(i, index)? {
        Operand::Imm(value) => Ok(value),
        _ => Err(TranslationError::UnsupportedOperand),
    }
}

pub fn is_register(i: &X86Insn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Reg(_)))
}

pub fn is_immediate(i: &X86Insn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Imm(_)))
}

pub fn is_memory(i: &X86Insn, index: usize) -> bool {
    matches!(i.operands.get(index), Some(Operand::Mem(_)))
}

fn truncate(ctx: &mut X86Context, value: IlOperand, size: u16) -> IlOperand {
    if value.size() > size {
        let narrowed = ctx.tmp(size);
        ctx.emit(str_(value, narrowed));
        narrowed.into()
    } else {
        value
    }
}

fn set_register_id(
    ctx: &mut X86Context,
    reg_id: X86Reg,
    value: IlOperand,
    flags: WriteFlags,
) -> Result<(), TranslationError> {
    let mut value = value;
    let mut clear = flags.contains(WriteFlags::CLEAR);
    let mut sign_extend = flags.contains(WriteFlags::SIGN_EXTEND);

    let (reg, set_mask) = match classify(ctx, reg_id)? {
        Slice::Full(reg) => {
            let set_mask = Immediate::new(mask(reg.size), reg.size);
            (reg, set_mask)
        }
        Slice::Low8(reg) => {
            let set_mask = Immediate::new(!mask(8), reg.size);
            value = truncate(ctx, value, 8);
            (reg, set_mask)
        }
        Slice::High8(reg) => {
            // Splice bits 8..16 while preserving everything else.
            value = truncate(ctx, value, 8);

            let spliced = ctx.tmp(reg.size);
            let tmp0 = ctx.tmp(reg.size);
            let tmp1 = ctx.tmp(reg.size);

            ctx.emit(and_(
                &reg,
                Immediate::new(mask(reg.size) ^ 0xff00, reg.size),
                tmp0,
            ));
            ctx.emit(str_(value, tmp1));
            ctx.emit(lshl_(tmp1, Immediate::new(8, 8), tmp1));
            ctx.emit(or_(tmp0, tmp1, spliced));

            value = spliced.into();
            let set_mask = Immediate::new(mask(reg.size), reg.size);
            (reg, set_mask)
        }
        Slice::Low16(reg) => {
            let set_mask = Immediate::new(!mask(16), reg.size);
            value = truncate(ctx, value, 16);
            (reg, set_mask)
        }
        Slice::Low32(reg) => {
            // Intel manual: 32-bit operands generate a 32-bit result,
            // zero-extended to 64 bits in the destination register.
            let set_mask = Immediate::new(mask(64), reg.size);
            value = truncate(ctx, value, 32);
            clear = true;
            (reg, set_mask)
        }
    };

    if matches!(
        reg_id,
        X86Reg::Xmm0
            | X86Reg::Xmm1
            | X86Reg::Xmm2
            | X86Reg::Xmm3
            | X86Reg::Xmm4
            | X86Reg::Xmm5
            | X86Reg::Xmm6
            | X86Reg::Xmm7
            | X86Reg::Xmm8
            | X86Reg::Xmm9
            | X86Reg::Xmm10
            | X86Reg::Xmm11
            | X86Reg::Xmm12
            | X86Reg::Xmm13
            | X86Reg::Xmm14
            | X86Reg::Xmm15
    ) {
        // Narrow writes to SSE registers zero-extend; the SSE handlers rely
        // on this when forwarding memory-sized values.
        sign_extend = false;
        clear = true;
    }

    if value.size() > reg.size {
        value = truncate(ctx, value, reg.size);
    } else if value.size() < reg.size {
        let narrow = value;
        let widened = ctx.tmp(reg.size);

        if clear {
            if sign_extend {
                ctx.emit(sex_(narrow, widened));
            } else {
                ctx.emit(str_(narrow, widened));
            }
        } else {
            let tmp0 = ctx.tmp(reg.size);

            ctx.emit(str_(narrow, widened));
            ctx.emit(and_(&reg, set_mask, tmp0));
            ctx.emit(or_(tmp0, widened, widened));
        }
        value = widened.into();
    }

    ctx.emit(str_(value, reg));
    Ok(())
}

fn set_memory(
    ctx: &mut X86Context,
    i: &X86Insn,
    mem: &MemOperand<X86Reg>,
    value: IlOperand,
) -> Result<(), TranslationError> {
    let address = memory_address(ctx, i, mem)?;
    let value = truncate(ctx, value, memory_size(ctx, i));
    ctx.emit(stm_(value, address));
    Ok(())
}

/// Write `value` to operand `index` of `i`, applying the sub-register
/// splicing and truncation rules.
pub fn set(
    ctx: &mut X86Context,
    i: &X86Insn,
    index: usize,
    value: IlOperand,
    flags: WriteFlags,
) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => set_register_id(ctx, reg, value, flags),
        Operand::Mem(ref mem) => set_memory(ctx, i, &mem.clone(), value),
        Operand::Imm(_) => Err(TranslationError::UnsupportedOperand),
    }
}

/// Write `value` to the register named by `reg`.
pub fn set_reg(
    ctx: &mut X86Context,
    _i: &X86Insn,
    reg: X86Reg,
    value: IlOperand,
    flags: WriteFlags,
) -> Result<(), TranslationError> {
    set_register_id(ctx, reg, value, flags)
}

/// Mark the register operand at `index` as undefined. Sub-register ids
/// widen to their parent: the whole architectural register becomes
/// undefined.
pub fn undefine(
    ctx: &mut X86Context,
    i: &X86Insn,
    index: usize,
) -> Result<(), TranslationError> {
    match *operand(i, index)? {
        Operand::Reg(reg) => {
            let parent = match classify(ctx, reg)? {
                Slice::Full(reg) => reg,
                Slice::Low8(parent)
                | Slice::High8(parent)
                | Slice::Low16(parent)
                | Slice::Low32(parent) => parent,
            };
            ctx.emit(undef_(parent));
            Ok(())
        }
        _ => Err(TranslationError::BadUndefine),
    }
}
