//! Value types of the REIL intermediate representation.
//!
//! REIL is a small, side-effect-explicit intermediate language for binary
//! analysis: a closed set of 25 opcodes over a uniform operand shape of
//! immediates, registers, temporaries, and block-local offsets. This crate
//! defines the instruction and operand types, the shorthand constructors used
//! by the per-architecture translators, and the stable textual form that
//! analysis tooling consumes.
//!
//! .. REIL language specification:
//!     http://www.zynamics.com/binnavi/manual/html/reil_language.htm

#![warn(missing_docs)]

mod instruction;
mod opcode;
mod operand;
mod parse;

pub mod bits;
pub mod shorthand;

pub use instruction::Instruction;
pub use opcode::Opcode;
pub use operand::{Dst, Immediate, Offset, Operand, Register, Temporary};
pub use parse::ParseError;
