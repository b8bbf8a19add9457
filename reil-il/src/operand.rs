use core::fmt;
use std::borrow::Cow;

use crate::bits::mask;

/// A REIL immediate operand: a literal value with an explicit bit width.
///
/// Values are stored masked to their declared size; negative values coming
/// from a disassembler are represented in two's complement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Immediate {
    /// The value of the operand, masked to `size` bits.
    pub value: u128,
    /// The size in bits of the operand.
    pub size: u16,
}

impl Immediate {
    /// Create an immediate of `size` bits, masking `value` accordingly.
    pub fn new(value: u128, size: u16) -> Self {
        Immediate {
            value: value & mask(size),
            size,
        }
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.value, self.size)
    }
}

/// A REIL register operand: an architectural register or a named flag.
///
/// Register names are static for all architectural state; the operand only
/// borrows them, so cloning a register is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Register {
    /// The name of the register.
    pub name: Cow<'static, str>,
    /// The size in bits of the operand.
    pub size: u16,
}

impl Register {
    /// Create a register operand from a static name and a bit width.
    pub fn new(name: &'static str, size: u16) -> Self {
        Register {
            name: Cow::Borrowed(name),
            size,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.name, self.size)
    }
}

/// A REIL temporary operand.
///
/// Temporaries are minted by the translation context with a per-native-
/// instruction monotonic index, never alias architectural state, and never
/// outlive the native instruction that minted them. The canonical printable
/// name is `t<NN>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Temporary {
    /// The index of the temporary register.
    pub index: u16,
    /// The size in bits of the operand.
    pub size: u16,
}

impl Temporary {
    /// Create a temporary operand with the given index and bit width.
    pub fn new(index: u16, size: u16) -> Self {
        Temporary { index, size }
    }
}

impl fmt::Display for Temporary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(t{:02}, {})", self.index, self.size)
    }
}

/// A REIL offset operand: a jump destination inside the current native
/// instruction's block, by ordinal index. Offsets are always 8 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    /// The index of the destination instruction within the current block.
    pub offset: u8,
}

impl Offset {
    /// Create an offset operand.
    pub fn new(offset: u8) -> Self {
        Offset { offset }
    }

    /// The size in bits of an offset operand.
    pub const SIZE: u16 = 8;
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(.{:02x}, {})", self.offset, Self::SIZE)
    }
}

/// A REIL operand: one of the four operand kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// An immediate literal.
    Immediate(Immediate),
    /// An architectural register or named flag.
    Register(Register),
    /// A context-local temporary register.
    Temporary(Temporary),
    /// A block-local jump destination.
    Offset(Offset),
}

impl Operand {
    /// The size in bits of the operand.
    pub fn size(&self) -> u16 {
        match self {
            Operand::Immediate(imm) => imm.size,
            Operand::Register(reg) => reg.size,
            Operand::Temporary(tmp) => tmp.size,
            Operand::Offset(_) => Offset::SIZE,
        }
    }

    /// Whether the operand names writable register state (a register or a
    /// temporary).
    pub fn is_writable(&self) -> bool {
        matches!(self, Operand::Register(_) | Operand::Temporary(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Immediate(imm) => imm.fmt(f),
            Operand::Register(reg) => reg.fmt(f),
            Operand::Temporary(tmp) => tmp.fmt(f),
            Operand::Offset(off) => off.fmt(f),
        }
    }
}

impl From<Immediate> for Operand {
    fn from(imm: Immediate) -> Self {
        Operand::Immediate(imm)
    }
}

impl From<&Immediate> for Operand {
    fn from(imm: &Immediate) -> Self {
        Operand::Immediate(imm.clone())
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Register(reg)
    }
}

impl From<&Register> for Operand {
    fn from(reg: &Register) -> Self {
        Operand::Register(reg.clone())
    }
}

impl From<Temporary> for Operand {
    fn from(tmp: Temporary) -> Self {
        Operand::Temporary(tmp)
    }
}

impl From<Offset> for Operand {
    fn from(off: Offset) -> Self {
        Operand::Offset(off)
    }
}

/// A write destination: the subset of operands an instruction may produce
/// into. Constructors taking `impl Into<Dst>` reject immediates and offsets
/// at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dst {
    /// An architectural register or named flag.
    Register(Register),
    /// A context-local temporary register.
    Temporary(Temporary),
}

impl Dst {
    /// The size in bits of the destination.
    pub fn size(&self) -> u16 {
        match self {
            Dst::Register(reg) => reg.size,
            Dst::Temporary(tmp) => tmp.size,
        }
    }
}

impl From<Register> for Dst {
    fn from(reg: Register) -> Self {
        Dst::Register(reg)
    }
}

impl From<&Register> for Dst {
    fn from(reg: &Register) -> Self {
        Dst::Register(reg.clone())
    }
}

impl From<Temporary> for Dst {
    fn from(tmp: Temporary) -> Self {
        Dst::Temporary(tmp)
    }
}

impl From<Dst> for Operand {
    fn from(dst: Dst) -> Self {
        match dst {
            Dst::Register(reg) => Operand::Register(reg),
            Dst::Temporary(tmp) => Operand::Temporary(tmp),
        }
    }
}

impl TryFrom<Operand> for Dst {
    type Error = Operand;

    fn try_from(op: Operand) -> Result<Self, Operand> {
        match op {
            Operand::Register(reg) => Ok(Dst::Register(reg)),
            Operand::Temporary(tmp) => Ok(Dst::Temporary(tmp)),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Immediate::new(1, 8).to_string(), "(1, 8)");
        assert_eq!(Register::new("rax", 64).to_string(), "(rax, 64)");
        assert_eq!(Temporary::new(3, 16).to_string(), "(t03, 16)");
        assert_eq!(Offset::new(0x1f).to_string(), "(.1f, 8)");
    }

    #[test]
    fn immediates_are_masked_to_size() {
        assert_eq!(Immediate::new(u128::MAX, 8).value, 0xff);
        assert_eq!(Immediate::new(0x1_0000_0001, 32).value, 1);
    }
}
