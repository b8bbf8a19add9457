//! Per-native-instruction emission state.
//!
//! Handlers append REIL instructions and block-local labels to a
//! [`BlockBuilder`]; forward references are expressed as pending jumps that
//! name a label. `finalise` resolves every pending jump to an offset
//! operand, returns the clean instruction vector, and resets the builder for
//! the next native instruction.

use reil_il::shorthand::jcc_;
use reil_il::{Instruction, Offset, Operand, Temporary};

use crate::error::TranslationError;

enum Entry {
    Instr(Instruction),
    Label(&'static str),
    PendingJcc {
        condition: Operand,
        label: &'static str,
    },
}

/// Emission buffer plus temporary counter for one native instruction.
#[derive(Default)]
pub struct BlockBuilder {
    next_temporary: u16,
    entries: Vec<Entry>,
}

impl BlockBuilder {
    /// Mint a fresh temporary of `size` bits.
    pub fn tmp(&mut self, size: u16) -> Temporary {
        let tmp = Temporary::new(self.next_temporary, size);
        self.next_temporary += 1;
        tmp
    }

    /// Append an instruction.
    pub fn emit(&mut self, instruction: Instruction) {
        self.entries.push(Entry::Instr(instruction));
    }

    /// Declare a label at the current position. The label resolves to the
    /// index of the next emitted instruction.
    pub fn label(&mut self, name: &'static str) {
        self.entries.push(Entry::Label(name));
    }

    /// Emit a conditional jump to a label declared elsewhere in this block.
    pub fn jump(&mut self, condition: impl Into<Operand>, label: &'static str) {
        self.entries.push(Entry::PendingJcc {
            condition: condition.into(),
            label,
        });
    }

    /// Resolve labels, return the finished block, and reset the builder.
    ///
    /// Every pending jump becomes a `jcc` with an [`Offset`] output; a label
    /// that was referenced but never declared is a translator bug and
    /// surfaces as [`TranslationError::UnknownLabel`].
    pub fn finalise(&mut self) -> Result<Vec<Instruction>, TranslationError> {
        let entries = std::mem::take(&mut self.entries);
        self.next_temporary = 0;

        let mut labels: Vec<(&'static str, usize)> = Vec::new();
        let mut index = 0usize;
        for entry in &entries {
            match entry {
                Entry::Label(name) => {
                    debug_assert!(
                        labels.iter().all(|(declared, _)| declared != name),
                        "label {name:?} declared twice"
                    );
                    labels.push((name, index));
                }
                _ => index += 1,
            }
        }

        let mut block = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Entry::Instr(instruction) => block.push(instruction),
                Entry::Label(_) => {}
                Entry::PendingJcc { condition, label } => {
                    let offset = labels
                        .iter()
                        .find(|(name, _)| *name == label)
                        .map(|(_, index)| *index)
                        .ok_or(TranslationError::UnknownLabel(label))?;
                    // offsets are 8 bits wide; labelled blocks stay far
                    // below that
                    debug_assert!(offset <= u8::MAX as usize);
                    block.push(jcc_(condition, Offset::new(offset as u8)));
                }
            }
        }
        Ok(block)
    }

    /// Drop any buffered state, readying the builder for the next native
    /// instruction. Used on the error path, where `finalise` is never
    /// reached.
    pub fn reset(&mut self) {
        self.next_temporary = 0;
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reil_il::shorthand::*;
    use reil_il::Immediate;

    #[test]
    fn temporaries_count_up_from_zero() {
        let mut blk = BlockBuilder::default();
        assert_eq!(blk.tmp(8).index, 0);
        assert_eq!(blk.tmp(64).index, 1);
        blk.emit(nop_());
        blk.finalise().unwrap();
        assert_eq!(blk.tmp(8).index, 0);
    }

    #[test]
    fn labels_resolve_to_post_removal_indices() {
        let mut blk = BlockBuilder::default();
        blk.jump(Immediate::new(1, 8), "done");
        blk.emit(nop_());
        blk.label("done");
        blk.emit(nop_());

        let block = blk.finalise().unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(block[0].to_string(), "jcc (1, 8), (.02, 8)");
    }

    #[test]
    fn undeclared_labels_are_reported() {
        let mut blk = BlockBuilder::default();
        blk.jump(Immediate::new(1, 8), "nowhere");
        assert!(matches!(
            blk.finalise(),
            Err(TranslationError::UnknownLabel("nowhere"))
        ));
    }

    #[test]
    fn jump_backwards_to_block_start() {
        let mut blk = BlockBuilder::default();
        blk.label("top");
        blk.emit(nop_());
        blk.jump(Immediate::new(1, 8), "top");

        let block = blk.finalise().unwrap();
        assert_eq!(block[1].to_string(), "jcc (1, 8), (.00, 8)");
    }
}
