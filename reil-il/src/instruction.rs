use core::fmt;

use crate::{Opcode, Operand};

/// A single REIL instruction: an opcode plus up to three positional
/// operands. Unused slots are absent.
///
/// The textual form is `<opcode> <input0>, <input1>, <output>` with absent
/// slots skipped; it is stable and round-trips through [`str::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// The opcode for this instruction.
    pub opcode: Opcode,
    /// The first input operand.
    pub input0: Option<Operand>,
    /// The second input operand.
    pub input1: Option<Operand>,
    /// The output operand.
    pub output: Option<Operand>,
}

impl Instruction {
    /// Create an instruction from its raw parts.
    ///
    /// Prefer the typed constructors in [`crate::shorthand`], which enforce
    /// the per-opcode operand-kind rules.
    pub fn new(
        opcode: Opcode,
        input0: Option<Operand>,
        input1: Option<Operand>,
        output: Option<Operand>,
    ) -> Self {
        Instruction {
            opcode,
            input0,
            input1,
            output,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        let mut first = true;
        for operand in [&self.input0, &self.input1, &self.output]
            .into_iter()
            .flatten()
        {
            if first {
                write!(f, " {operand}")?;
                first = false;
            } else {
                write!(f, ", {operand}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::shorthand::*;
    use crate::{Immediate, Offset, Register, Temporary};

    fn imm(value: u128, size: u16) -> Immediate {
        Immediate::new(value, size)
    }

    #[test]
    fn display_skips_absent_slots() {
        assert_eq!(nop_().to_string(), "nop");
        assert_eq!(unkn_().to_string(), "unkn");
        assert_eq!(sys_(Some(imm(3, 8))).to_string(), "sys (3, 8)");
        assert_eq!(
            str_(Register::new("rdi", 64), Register::new("rax", 64)).to_string(),
            "str (rdi, 64), (rax, 64)"
        );
        assert_eq!(
            add_(Register::new("eax", 32), imm(1, 32), Temporary::new(0, 64)).to_string(),
            "add (eax, 32), (1, 32), (t00, 64)"
        );
        assert_eq!(
            jcc_(imm(1, 8), Offset::new(3)).to_string(),
            "jcc (1, 8), (.03, 8)"
        );
    }
}
