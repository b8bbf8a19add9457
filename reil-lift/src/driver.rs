//! The per-architecture driver loop, expressed as a pull iterator.

use reil_il::Instruction;
use tracing::trace;

use crate::error::{LiftError, TranslationError};
use crate::insn::{Disassembler, Insn};
use crate::native::NativeInstruction;

/// One supported architecture: its decoded-record types, its translation
/// context, and the two operations the driver needs from it.
pub trait Arch {
    /// Per-ISA opcode identifier type.
    type Op;
    /// Per-ISA register identifier type.
    type Reg;
    /// Per-ISA translation context.
    type Context;

    /// Translate one decoded instruction into its finished REIL block. The
    /// context must be clean again when this returns, on both paths.
    fn translate(
        ctx: &mut Self::Context,
        i: &Insn<Self::Op, Self::Reg>,
    ) -> Result<Vec<Instruction>, TranslationError>;

    /// Whether `i` terminates a basic block.
    fn ends_basic_block(i: &Insn<Self::Op, Self::Reg>) -> bool;
}

/// Lazy stream of translated native instructions.
///
/// Drives the external disassembler over `code` one instruction at a time,
/// translating each through a fresh-per-construction context. Iteration
/// stops after the first block-ending instruction, on the first translation
/// failure, when the disassembler declines to decode, or at the end of the
/// byte slice. Dropping the iterator cancels the stream; there is no other
/// cleanup.
pub struct Blocks<'a, A: Arch, D> {
    ctx: A::Context,
    dis: D,
    code: &'a [u8],
    offset: usize,
    address: u64,
    done: bool,
}

impl<'a, A: Arch, D> Blocks<'a, A, D> {
    /// Build a stream from an explicit context. The `translate_*` entry
    /// points construct the context for you; use this (with
    /// [`Blocks::into_context`]) to amortise context allocations across
    /// calls.
    pub fn new(ctx: A::Context, dis: D, code: &'a [u8], base_address: u64) -> Self {
        Blocks {
            ctx,
            dis,
            code,
            offset: 0,
            address: base_address,
            done: false,
        }
    }

    /// Recover the translation context for reuse.
    pub fn into_context(self) -> A::Context {
        self.ctx
    }
}

impl<'a, A, D> Iterator for Blocks<'a, A, D>
where
    A: Arch,
    D: Disassembler<Op = A::Op, Reg = A::Reg>,
{
    type Item = Result<NativeInstruction, LiftError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.code.len() {
            return None;
        }

        let i = self.dis.decode(&self.code[self.offset..], self.address)?;
        trace!(address = i.address, mnemonic = %i.mnemonic, "translating");

        let il = match A::translate(&mut self.ctx, &i) {
            Ok(il) => il,
            Err(source) => {
                self.done = true;
                return Some(Err(LiftError {
                    address: i.address,
                    source,
                }));
            }
        };

        let ends_basic_block = A::ends_basic_block(&i);
        let native = NativeInstruction {
            address: i.address,
            mnemonic: match i.op_str.is_empty() {
                true => i.mnemonic.clone(),
                false => format!("{} {}", i.mnemonic, i.op_str),
            },
            il,
            ends_basic_block,
            size: i.size,
        };

        self.offset += i.size;
        self.address += i.size as u64;
        if ends_basic_block {
            self.done = true;
        }
        Some(Ok(native))
    }
}
