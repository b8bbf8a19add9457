//! Stubs for the instruction classes the translator declines to model.
//!
//! Five reasons are distinguished in the dispatch table so coverage stays
//! auditable, but every one of them lowers to the same single `unkn`
//! instruction: a uniform opaque step for downstream analyzers.

use reil_il::shorthand::unkn_;
use tracing::debug;

use crate::error::TranslationError;

use super::{X86Context, X86Insn};

fn opaque(ctx: &mut X86Context, i: &X86Insn, reason: &str) -> Result<(), TranslationError> {
    debug!(address = i.address, mnemonic = %i.mnemonic, reason, "opaque instruction");
    ctx.emit(unkn_());
    Ok(())
}

/// Not modeled: too complicated to be worth the il.
pub(super) fn complicated(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    opaque(ctx, i, "complicated")
}

/// Not modeled: REIL has no floating-point support.
pub(super) fn floating_point(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    opaque(ctx, i, "floating_point")
}

/// Not modeled: the effects are too low-level.
pub(super) fn low_level(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    opaque(ctx, i, "low_level")
}

/// Not modeled: requires CPL0.
pub(super) fn privileged(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    opaque(ctx, i, "privileged")
}

/// Not modeled: only useful with processor exceptions.
pub(super) fn requires_exceptions(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    opaque(ctx, i, "requires_exceptions")
}
