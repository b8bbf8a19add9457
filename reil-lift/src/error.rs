//! Lifter error types.

use thiserror::Error;

/// Failure while translating a single native instruction.
///
/// One enum covers all three recoverable failure classes of the translator:
/// malformed inputs from the decoded record (`UnknownRegister`,
/// `UnsupportedOperand`, `BadWriteback`, `BadUndefine`,
/// `IllegalSubRegister`, `UnknownLabel`), operand widths that contradict the
/// native opcode (`IllegalInstruction`), and recognised-but-unfinished
/// handlers (`NotImplemented`, which marks a translator bug, as opposed to
/// the opcodes that lower to `unkn` by design and are not errors at all).
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The decoded record names a register id the context does not know.
    #[error("unknown register {0}")]
    UnknownRegister(String),
    /// The decoded operand kind has no meaning in this position.
    #[error("unsupported operand kind")]
    UnsupportedOperand,
    /// `writeback` was requested for a non-memory operand.
    #[error("writeback requires a memory operand")]
    BadWriteback,
    /// `undefine` was requested for a non-register operand.
    #[error("undefine requires a register operand")]
    BadUndefine,
    /// A sub-register access of a width the splicing tables do not model.
    #[error("illegal sub-register width {0}")]
    IllegalSubRegister(u16),
    /// A handler referenced a block-local label it never declared.
    #[error("label {0:?} was referenced but never declared")]
    UnknownLabel(&'static str),
    /// The operand width contradicts the native opcode.
    #[error("illegal operand width for {mnemonic}")]
    IllegalInstruction {
        /// Mnemonic of the offending native instruction.
        mnemonic: String,
    },
    /// The opcode is recognised but its handler is incomplete.
    #[error("{mnemonic} is recognised but not implemented")]
    NotImplemented {
        /// Mnemonic of the offending native instruction.
        mnemonic: String,
    },
}

/// A [`TranslationError`] annotated with the address of the offending
/// native instruction. Produced by the block iterator, which terminates the
/// stream on the first failure.
#[derive(Debug, Error)]
#[error("translation failed at {address:#x}")]
pub struct LiftError {
    /// Address of the native instruction that failed to translate.
    pub address: u64,
    /// The underlying failure.
    #[source]
    pub source: TranslationError,
}
