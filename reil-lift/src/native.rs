//! The native-instruction records yielded to the consumer.

use core::fmt;

use reil_il::Instruction;

/// One decoded native instruction together with the REIL block that models
/// it. Yielded by [`crate::Blocks`]; owned by the caller thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeInstruction {
    /// Address the instruction executes at.
    pub address: u64,
    /// Printable mnemonic and operand text.
    pub mnemonic: String,
    /// The REIL block modeling this instruction. Contains no dangling
    /// labels; every `jcc` target is an immediate, a register, or an offset
    /// into this block.
    pub il: Vec<Instruction>,
    /// Whether this instruction terminates a basic block.
    pub ends_basic_block: bool,
    /// Byte length of the instruction.
    pub size: usize,
}

impl fmt::Display for NativeInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x} {} {}",
            self.address, self.ends_basic_block as u8, self.mnemonic
        )
    }
}
