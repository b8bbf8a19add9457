/// The closed set of REIL opcodes.
///
/// The first seventeen values are the opcodes of the published REIL
/// specification; the remainder are the extended opcodes commonly added by
/// analysis tooling (explicit shift variants, signed division, sign
/// extension, equality, and the supervisor transition marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Opcode {
    /// Adds the two input operands and writes the result to the output
    /// operand. The inputs can be literals or register values; the output
    /// must be a register.
    Add = 0x00,
    /// Bitwise AND of the two input operands into the output register.
    And = 0x01,
    /// Sets the output register to 1 if the input operand is zero, 0
    /// otherwise.
    Bisz = 0x02,
    /// Logical shift of the first input by the second. A positive shift
    /// count shifts left, a negative count shifts right.
    Bsh = 0x03,
    /// Unsigned division of the first input (dividend) by the second
    /// (divisor) into the output register.
    Div = 0x04,
    /// Conditional jump to the target held in the output slot when the
    /// first input is nonzero. The target is an immediate address, a
    /// register, or a block-local offset.
    Jcc = 0x05,
    /// Loads from memory. The first input holds the address; the output
    /// register's size determines how many bytes are read.
    Ldm = 0x06,
    /// Modulo of the first input by the second into the output register.
    Mod = 0x07,
    /// Unsigned multiplication of the two inputs into the output register.
    Mul = 0x08,
    /// Does nothing.
    Nop = 0x09,
    /// Bitwise OR of the two input operands into the output register.
    Or = 0x0a,
    /// Stores to memory. The first input is the value, the output slot holds
    /// the address; the value's size determines how many bytes are written.
    Stm = 0x0b,
    /// Copies the input to the output register, zero-extending when the
    /// output is wider than the input.
    Str = 0x0c,
    /// Subtracts the second input from the first into the output register.
    Sub = 0x0d,
    /// Flags a register as holding an undefined value until its next write.
    Undef = 0x0e,
    /// Placeholder for a native instruction the translator declines to
    /// model.
    Unkn = 0x0f,
    /// Bitwise XOR of the two input operands into the output register.
    Xor = 0x10,
    /// Sets the output register to 1 if the input operand is nonzero, 0
    /// otherwise.
    Bisnz = 0x11,
    /// Sets the output register to 1 if the two inputs are equal, 0
    /// otherwise. The inputs must have equal widths.
    Equ = 0x12,
    /// Logical left shift of the first input by the second.
    Lshl = 0x13,
    /// Logical right shift of the first input by the second.
    Lshr = 0x14,
    /// Arithmetic right shift of the first input by the second.
    Ashr = 0x15,
    /// Signed division of the first input (dividend) by the second
    /// (divisor) into the output register.
    Sdiv = 0x16,
    /// Copies the input to the output register, sign-extending when the
    /// output is wider than the input.
    Sex = 0x17,
    /// Marks a transition between user and supervisor level code. Where the
    /// native mechanism carries an inline parameter (for example the x86
    /// `int` instruction) it is passed as the first input operand.
    Sys = 0x18,
}

#[cfg(test)]
mod tests {
    use super::Opcode;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn printable_names_round_trip() {
        for op in Opcode::iter() {
            let text = op.to_string();
            assert_eq!(text, text.to_lowercase());
            assert_eq!(Opcode::from_str(&text).unwrap(), op);
        }
    }

    #[test]
    fn opcode_count_is_closed() {
        assert_eq!(Opcode::iter().count(), 25);
    }
}
