//! The decoded-instruction records consumed by the translators.
//!
//! Disassembly is an external concern; the lifter only fixes the shape of
//! its output. [`Insn`] is generic over the per-ISA opcode and register id
//! types, and its operand set is the union of what the supported ISAs need:
//! registers, immediates, and memory references with displacement, base,
//! index, scale, and segment.

use crate::arm64::Arm64Condition;

bitflags::bitflags! {
    /// Semantic group membership reported by the disassembler.
    pub struct Groups: u8 {
        /// The instruction is a jump; it ends a basic block.
        const JUMP = 0b0000_0001;
    }
}

/// A decoded memory operand.
///
/// The effective address is
/// `base + disp + segment + index * scale`, with absent registers
/// contributing zero and the sum truncated to the architectural word size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemOperand<R> {
    /// Segment register, if a segment prefix applies (x86 only).
    pub segment: Option<R>,
    /// Base register.
    pub base: Option<R>,
    /// Index register.
    pub index: Option<R>,
    /// Scale applied to the index register.
    pub scale: i64,
    /// Constant displacement.
    pub disp: i64,
}

impl<R> MemOperand<R> {
    /// A memory operand with only a base register.
    pub fn base(base: R) -> Self {
        MemOperand {
            segment: None,
            base: Some(base),
            index: None,
            scale: 1,
            disp: 0,
        }
    }

    /// A memory operand with a base register and a displacement.
    pub fn base_disp(base: R, disp: i64) -> Self {
        MemOperand {
            disp,
            ..Self::base(base)
        }
    }
}

/// A decoded operand: the union shape across all supported ISAs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<R> {
    /// A register, identified by the disassembler's register id.
    Reg(R),
    /// An immediate value.
    Imm(i64),
    /// A memory reference.
    Mem(MemOperand<R>),
}

/// One decoded native instruction, as provided by the upstream
/// disassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insn<O, R> {
    /// Numeric opcode identifier.
    pub op: O,
    /// Address the instruction executes at.
    pub address: u64,
    /// Byte length of the instruction.
    pub size: usize,
    /// Mnemonic, including any REP-family prefix (`"rep movsb"` arrives as
    /// mnemonic `"rep movsb"`).
    pub mnemonic: String,
    /// Printable operand string. On x86 this also carries the memory access
    /// width (`byte ptr`, `qword ptr`, ...).
    pub op_str: String,
    /// Decoded operands, in the ISA's canonical order.
    pub operands: Vec<Operand<R>>,
    /// Group membership, used for jump detection.
    pub groups: Groups,
    /// Condition code (AArch64).
    pub cc: Option<Arm64Condition>,
    /// Whether the instruction updates the flags (ARM `adds`, `subs`, ...).
    pub update_flags: bool,
    /// Whether a memory base register is written back (ARM addressing
    /// modes).
    pub writeback: bool,
}

impl<O, R> Insn<O, R> {
    /// Create a record with no operands and empty flags; callers fill in
    /// the rest through the `with_*` builders or the public fields.
    pub fn new(op: O, address: u64, size: usize, mnemonic: &str, op_str: &str) -> Self {
        Insn {
            op,
            address,
            size,
            mnemonic: mnemonic.to_owned(),
            op_str: op_str.to_owned(),
            operands: Vec::new(),
            groups: Groups::empty(),
            cc: None,
            update_flags: false,
            writeback: false,
        }
    }

    /// Attach decoded operands.
    pub fn with_operands(mut self, operands: Vec<Operand<R>>) -> Self {
        self.operands = operands;
        self
    }

    /// Attach group flags.
    pub fn with_groups(mut self, groups: Groups) -> Self {
        self.groups = groups;
        self
    }

    /// Attach a condition code.
    pub fn with_cc(mut self, cc: Arm64Condition) -> Self {
        self.cc = Some(cc);
        self
    }

    /// Mark the instruction as flag-updating.
    pub fn with_update_flags(mut self) -> Self {
        self.update_flags = true;
        self
    }

    /// Mark the instruction as writing back its memory base register.
    pub fn with_writeback(mut self) -> Self {
        self.writeback = true;
        self
    }

    /// Whether the mnemonic carries a REP-family prefix.
    pub fn has_rep_prefix(&self) -> bool {
        self.mnemonic.starts_with("rep")
    }
}

/// The upstream oracle: decodes the instruction at the front of `code`.
///
/// Returning `None` stops the block stream; the lifter does not distinguish
/// "out of bytes" from "undecodable bytes".
pub trait Disassembler {
    /// Per-ISA opcode identifier type.
    type Op;
    /// Per-ISA register identifier type.
    type Reg;

    /// Decode the instruction at the front of `code`, which executes at
    /// `address`.
    fn decode(&mut self, code: &[u8], address: u64) -> Option<Insn<Self::Op, Self::Reg>>;
}
