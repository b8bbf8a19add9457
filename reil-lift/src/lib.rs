//! Machine-code lifter producing REIL.
//!
//! Given a byte sequence of native instructions for a supported ISA (x86-32,
//! x86-64, ARMv7/Thumb-2, AArch64) and the address at which those bytes
//! execute, the lifter yields a lazy stream of decoded native instructions,
//! each annotated with a block of [`reil_il::Instruction`]s that models its
//! effect on registers, flags, and memory with every side effect explicit.
//!
//! Disassembly itself is delegated to an external [`Disassembler`]; this
//! crate consumes its decoded records and owns everything downstream of
//! them: operand access, sub-register splicing, flag micro-sequences,
//! conditional evaluation, REP prefix looping, and basic-block termination.

mod context;
mod driver;
mod error;
mod insn;
mod native;

pub mod arm;
pub mod arm64;
pub mod x86;

pub use context::BlockBuilder;
pub use driver::{Arch, Blocks};
pub use error::{LiftError, TranslationError};
pub use insn::{Disassembler, Groups, Insn, MemOperand, Operand};
pub use native::NativeInstruction;

pub use arm::{translate_arm, ArmArch};
pub use arm64::{translate_arm64, Arm64Arch, Arm64Condition};
pub use x86::{translate_x86, X86Arch, X86Options};
