//! Shorthand constructors for REIL instructions.
//!
//! Every constructor narrows its parameters to the operand kinds its opcode
//! accepts: outputs are [`Dst`] (register or temporary), memory addresses and
//! jump targets are general operands, `undef_` takes an architectural
//! register. Size rules that are cheap to state are debug-asserted here; the
//! width bookkeeping of the translators (double-width results, truncating
//! copies) is the callers' responsibility.
//!
//! The trailing underscore keeps the set uniform where Rust reserves the
//! name (`mod_`, `str_`).

use crate::{Dst, Immediate, Instruction, Opcode, Operand, Register};

fn binary(opcode: Opcode, input0: Operand, input1: Operand, output: Dst) -> Instruction {
    Instruction::new(opcode, Some(input0), Some(input1), Some(output.into()))
}

/// `output = input0 + input1`.
pub fn add_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Add, input0.into(), input1.into(), output.into())
}

/// `output = input0 & input1`.
pub fn and_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::And, input0.into(), input1.into(), output.into())
}

/// `output = (input0 == 0) ? 1 : 0`. The output is 8 bits wide.
pub fn bisz_(condition: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    let output: Dst = output.into();
    debug_assert_eq!(output.size(), 8, "bisz output must be 8 bits");
    Instruction::new(Opcode::Bisz, Some(condition.into()), None, Some(output.into()))
}

/// `output = input0 << input1` for positive shifts, `>>` for negative.
pub fn bsh_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Bsh, input0.into(), input1.into(), output.into())
}

/// `output = input0 / input1`, unsigned.
pub fn div_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Div, input0.into(), input1.into(), output.into())
}

/// Jump to `target` when `condition` is nonzero. The target may be an
/// immediate address, a register, or a block-local offset.
pub fn jcc_(condition: impl Into<Operand>, target: impl Into<Operand>) -> Instruction {
    Instruction::new(Opcode::Jcc, Some(condition.into()), None, Some(target.into()))
}

/// Load `sizeof(output)` bytes from memory at `address` into `output`.
pub fn ldm_(address: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    let output: Dst = output.into();
    Instruction::new(Opcode::Ldm, Some(address.into()), None, Some(output.into()))
}

/// `output = input0 % input1`.
pub fn mod_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Mod, input0.into(), input1.into(), output.into())
}

/// `output = input0 * input1`, unsigned.
pub fn mul_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Mul, input0.into(), input1.into(), output.into())
}

/// Does nothing.
pub fn nop_() -> Instruction {
    Instruction::new(Opcode::Nop, None, None, None)
}

/// `output = input0 | input1`.
pub fn or_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Or, input0.into(), input1.into(), output.into())
}

/// Store `value` (all `sizeof(value)` bytes of it) to memory at `address`.
pub fn stm_(value: impl Into<Operand>, address: impl Into<Operand>) -> Instruction {
    Instruction::new(Opcode::Stm, Some(value.into()), None, Some(address.into()))
}

/// Copy `input0` into `output`, zero-extending if `output` is wider.
pub fn str_(input0: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    let output: Dst = output.into();
    Instruction::new(Opcode::Str, Some(input0.into()), None, Some(output.into()))
}

/// `output = input0 - input1`.
pub fn sub_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Sub, input0.into(), input1.into(), output.into())
}

/// Mark `register` as holding an undefined value until its next write.
pub fn undef_(register: Register) -> Instruction {
    Instruction::new(Opcode::Undef, None, None, Some(Operand::Register(register)))
}

/// Opaque placeholder for an unmodeled native instruction.
pub fn unkn_() -> Instruction {
    Instruction::new(Opcode::Unkn, None, None, None)
}

/// `output = input0 ^ input1`.
pub fn xor_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Xor, input0.into(), input1.into(), output.into())
}

/// `output = (input0 != 0) ? 1 : 0`. The output is 8 bits wide.
pub fn bisnz_(condition: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    let output: Dst = output.into();
    debug_assert_eq!(output.size(), 8, "bisnz output must be 8 bits");
    Instruction::new(Opcode::Bisnz, Some(condition.into()), None, Some(output.into()))
}

/// `output = (input0 == input1) ? 1 : 0`. The inputs must have equal widths.
pub fn equ_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    let (input0, input1) = (input0.into(), input1.into());
    debug_assert_eq!(input0.size(), input1.size(), "equ inputs must have equal widths");
    binary(Opcode::Equ, input0, input1, output.into())
}

/// `output = input0 << input1`, logical.
pub fn lshl_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Lshl, input0.into(), input1.into(), output.into())
}

/// `output = input0 >> input1`, logical.
pub fn lshr_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Lshr, input0.into(), input1.into(), output.into())
}

/// `output = input0 >> input1`, arithmetic.
pub fn ashr_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Ashr, input0.into(), input1.into(), output.into())
}

/// `output = input0 / input1`, signed.
pub fn sdiv_(input0: impl Into<Operand>, input1: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    binary(Opcode::Sdiv, input0.into(), input1.into(), output.into())
}

/// Copy `input0` into `output`, sign-extending if `output` is wider.
pub fn sex_(input0: impl Into<Operand>, output: impl Into<Dst>) -> Instruction {
    let output: Dst = output.into();
    Instruction::new(Opcode::Sex, Some(input0.into()), None, Some(output.into()))
}

/// Transition between user and supervisor level code, with an optional
/// inline parameter.
pub fn sys_(input0: Option<Immediate>) -> Instruction {
    Instruction::new(Opcode::Sys, input0.map(Operand::Immediate), None, None)
}
