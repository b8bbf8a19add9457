//! x86 and x86-64 translation.

mod arithmetic;
mod ascii;
mod bitwise;
mod conditional;
mod control_flow;
mod logic;
mod memory;
mod misc;
pub mod operand;
mod sse;
mod unsupported;
mod utilities;

use std::collections::HashMap;

use reil_il::{Immediate, Instruction, Operand as IlOperand, Register, Temporary};

use crate::context::BlockBuilder;
use crate::driver::{Arch, Blocks};
use crate::error::TranslationError;
use crate::insn::{Disassembler, Groups, Insn};

pub use conditional::Condition;

/// Register identifiers of the decoded x86 operand records.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum X86Reg {
    // 8-bit low parts
    Al, Bl, Cl, Dl, Sil, Dil, Bpl, Spl,
    R8b, R9b, R10b, R11b, R12b, R13b, R14b, R15b,
    // 8-bit high parts
    Ah, Bh, Ch, Dh,
    // 16-bit low parts
    Ax, Bx, Cx, Dx, Si, Di, Bp, Sp,
    R8w, R9w, R10w, R11w, R12w, R13w, R14w, R15w,
    // 32-bit registers / low parts
    Eax, Ebx, Ecx, Edx, Esi, Edi, Ebp, Esp,
    R8d, R9d, R10d, R11d, R12d, R13d, R14d, R15d,
    // 64-bit registers
    Rax, Rbx, Rcx, Rdx, Rsi, Rdi, Rbp, Rsp,
    R8, R9, R10, R11, R12, R13, R14, R15,
    Rip,
    // segment bases
    Fs, Gs, Cs, Ss, Ds, Es,
    // SSE registers
    Xmm0, Xmm1, Xmm2, Xmm3, Xmm4, Xmm5, Xmm6, Xmm7,
    Xmm8, Xmm9, Xmm10, Xmm11, Xmm12, Xmm13, Xmm14, Xmm15,
}

/// Opcode identifiers of the decoded x86 instruction records.
///
/// The whole supported surface is enumerated here, including the
/// floating-point, privileged, and otherwise unmodeled opcodes, so that the
/// dispatch match stays total and auditable: nothing is translated by
/// accident and nothing falls through silently.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum X86Op {
    Aaa, Aad, Aam, Aas, Adc, Adcx, Add, Adox, And, Andn, Arpl,
    Bextr, Blsi, Blsmsk, Blsr, Bsf, Bsr, Bswap, Bt, Btc, Btr, Bts, Bzhi,
    Call, Cbw, Cdq, Cdqe, Clc, Cld, Cmc,
    Cmova, Cmovae, Cmovb, Cmovbe, Cmove, Cmovg, Cmovge, Cmovl, Cmovle,
    Cmovne, Cmovno, Cmovnp, Cmovns, Cmovo, Cmovp, Cmovs,
    Cmp, Cmpsb, Cmpsw, Cmpsd, Cmpsq, Cmpxchg, Cmpxchg8b, Cmpxchg16b,
    Cpuid, Cqo, Cwd, Cwde,
    Daa, Das, Dec, Div,
    Enter,
    Idiv, Imul, Inc, Int, Int1, Int3, Into,
    Ja, Jae, Jb, Jbe, Jcxz, Jecxz, Jrcxz, Je, Jg, Jge, Jl, Jle, Jmp,
    Jne, Jno, Jnp, Jns, Jo, Jp, Js,
    Lahf, Lddqu, Lea, Leave, Lodsb, Lodsd, Lodsq, Lodsw,
    Loop, Loope, Loopne, Lzcnt,
    Mov, Movabs, Movaps, Movd, Movdqa, Movdqu, Movhpd, Movlpd, Movq,
    Movsb, Movsd, Movsq, Movsw, Movsx, Movsxd, Movups, Movzx, Mul,
    Neg, Nop, Not, Or,
    Palignr, Pand, Pandn,
    Pcmpeqb, Pcmpeqd, Pcmpeqq, Pcmpeqw, Pcmpgtb, Pcmpgtd, Pcmpgtq, Pcmpgtw,
    Pmaxub, Pmaxud, Pmaxuq, Pmaxuw, Pminub, Pminud, Pminuq, Pminuw,
    Pmovmskb, Pop, Por, Pshufd, Pslldq, Psrldq,
    Psubb, Psubw, Psubd, Psubq,
    Punpcklbw, Punpcklwd, Punpckldq, Punpcklqdq,
    Push, Pxor,
    Rdtsc, Ret, Rol, Ror,
    Sahf, Sar, Sbb, Scasb, Scasd, Scasq, Scasw,
    Seta, Setae, Setb, Setbe, Sete, Setg, Setge, Setl, Setle,
    Setne, Setno, Setnp, Setns, Seto, Setp, Sets,
    Shl, Shr, Shrd, Stc, Stosb, Stosd, Stosq, Stosw, Sub, Syscall, Sysenter,
    Test,
    Vmovdqa, Vmovdqu,
    Vpand, Vpandn,
    Vpcmpeqb, Vpcmpeqd, Vpcmpeqq, Vpcmpeqw, Vpcmpgtb, Vpcmpgtd, Vpcmpgtq, Vpcmpgtw,
    Vpmaxub, Vpmaxud, Vpmaxuq, Vpmaxuw, Vpminub, Vpminud, Vpminuq, Vpminuw,
    Vpmovmskb, Vpor, Vpsubb, Vpsubw, Vpsubd, Vpsubq, Vpxor,
    Xadd, Xchg, Xor,

    // Floating point (x87, SSE/AVX floating-point forms): opaque.
    Addpd, Addps, Addsd, Addss, Addsubpd, Addsubps,
    Andpd, Andps, Andnpd, Andnps,
    Blendpd, Blendps, Blendvpd, Blendvps,
    Cmppd, Cmpps, Cmpss, Comisd, Comiss,
    Cvtdq2pd, Cvtdq2ps, Cvtpd2dq, Cvtpd2pi, Cvtpd2ps, Cvtpi2pd, Cvtpi2ps,
    Cvtps2dq, Cvtps2pd, Cvtps2pi, Cvtsd2si, Cvtsd2ss, Cvtsi2sd, Cvtsi2ss,
    Cvttpd2pi, Cvttpd2dq, Cvttps2dq, Cvttps2pi, Cvttsd2si, Cvttss2si,
    Divpd, Divps, Divsd, Divss, Emms,
    F2xm1, Fabs, Fadd, Faddp, Fbld, Fbstp, Fchs,
    Fcmovb, Fcmovbe, Fcmove, Fcmovnb, Fcmovnbe, Fcmovne, Fcmovnu, Fcmovu,
    Fcom, Fcomp, Fcompp, Fcomi, Fcos, Fdecstp, Fdiv, Fdivp, Fdivr, Fdivrp,
    Ffree, Fiadd, Ficom, Ficomp, Fidiv, Fidivr, Fild, Fimul, Fincstp,
    Fist, Fistp, Fisttp, Fld, Fld1, Fldl2e, Fldl2t, Fldlg2, Fldln2, Fldz,
    Fldcw, Fldenv, Fmul, Fmulp, Fnclex, Fninit, Fnop, Fnsave, Fnstcw,
    Fnstenv, Fnstsw, Fprem, Fprem1, Fptan, Frndint, Frstor, Fscale, Fsin,
    Fsincos, Fsqrt, Fst, Fstp, Fsub, Fsubr, Fsubrp, Ftst,
    Fucom, Fucomi, Fucomp, Fucompi, Fxam, Fxch, Fxrstor, Fxsave, Fxtract,
    Fyl2x, Fyl2xp1,
    Haddpd, Haddps, Hsubpd, Hsubps,
    Maxpd, Maxps, Maxsd, Maxss, Minpd, Minps, Minsd, Minss,
    Movapd, Movhps, Movlps, Movmskpd, Movmskps,
    Mulpd, Mulps, Mulsd, Mulss,
    Orpd, Orps,
    Shufpd, Shufps, Sqrtpd, Sqrtps, Sqrtsd, Sqrtss,
    Subpd, Subps, Subsd, Subss,
    Ucomisd, Ucomiss, Unpckhpd, Unpckhps, Unpcklpd, Unpcklps,
    Xorpd, Xorps,

    // Privileged: opaque.
    Clac, Cli, Clts, Hlt, In, Insb, Insd, Insw, Invd, Invlpg,
    Lgdt, Lidt, Lldt, Lmsw, Ltr, Out, Outsb, Outsd, Outsw,
    Rdmsr, Rsm, Sti, Swapgs, Sysexit, Sysret, Wbinvd, Wrmsr,
    Xrstor, Xsave, Xsetbv,

    // Too low-level to model usefully: opaque.
    Clflush, Lar, Ldmxcsr, Lds, Les, Lfs, Lgs, Lss, Lfence, Lsl,
    Mfence, Monitor, Mwait, Pause, Popf, Popfd, Popfq,
    Pushf, Pushfd, Pushfq, Sfence, Sgdt, Sidt, Sldt, Smsw, Stmxcsr,
    StrTr, Verr, Verw, Xgetbv,

    // Requires processor exceptions to be useful: opaque.
    Bound, Ud2,

    // Complicated; deliberately skipped for now: opaque.
    Aesdec, Aesdeclast, Aesenc, Aesenclast, Aesimc, Aeskeygenassist,
    Crc32, Maskmovdqu, Movntdq, Movnti, Movntpd, Movntps,
    Rcl, Rcr, Shld, Xlatb,
}

/// A decoded x86 instruction record.
pub type X86Insn = Insn<X86Op, X86Reg>;

/// Mode switches for x86 translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct X86Options {
    /// Translate in 64-bit mode.
    pub x86_64: bool,
    /// Model `rip` as an architectural register instead of folding it to
    /// the constant `address + size` at each use.
    pub use_rip: bool,
}

/// Translation context for x86 and x86-64.
pub struct X86Context {
    blk: BlockBuilder,
    registers: HashMap<X86Reg, Register>,
    /// Architectural word size in bits.
    pub word_size: u16,
    pub(crate) accumulator: Register,
    pub(crate) base: Register,
    pub(crate) counter: Register,
    pub(crate) data: Register,
    pub(crate) source: Register,
    pub(crate) destination: Register,
    pub(crate) frame_ptr: Register,
    pub(crate) stack_ptr: Register,
    pub(crate) x86_64: bool,
    pub(crate) use_rip: bool,
}

impl X86Context {
    /// A 32-bit context.
    pub fn x86() -> Self {
        let mut registers = HashMap::new();
        for (id, name) in [
            (X86Reg::Eax, "eax"),
            (X86Reg::Ebx, "ebx"),
            (X86Reg::Ecx, "ecx"),
            (X86Reg::Edx, "edx"),
            (X86Reg::Esi, "esi"),
            (X86Reg::Edi, "edi"),
            (X86Reg::Ebp, "ebp"),
            (X86Reg::Esp, "esp"),
            (X86Reg::Fs, "fsbase"),
            (X86Reg::Gs, "gsbase"),
            (X86Reg::Cs, "csbase"),
            (X86Reg::Ss, "ssbase"),
            (X86Reg::Ds, "dsbase"),
            (X86Reg::Es, "esbase"),
        ] {
            registers.insert(id, Register::new(name, 32));
        }
        for (id, name) in XMM_LOW {
            registers.insert(id, Register::new(name, 128));
        }

        X86Context {
            blk: BlockBuilder::default(),
            word_size: 32,
            accumulator: registers[&X86Reg::Eax].clone(),
            base: registers[&X86Reg::Ebx].clone(),
            counter: registers[&X86Reg::Ecx].clone(),
            data: registers[&X86Reg::Edx].clone(),
            source: registers[&X86Reg::Esi].clone(),
            destination: registers[&X86Reg::Edi].clone(),
            frame_ptr: registers[&X86Reg::Ebp].clone(),
            stack_ptr: registers[&X86Reg::Esp].clone(),
            registers,
            x86_64: false,
            use_rip: false,
        }
    }

    /// A 64-bit context.
    pub fn x86_64(use_rip: bool) -> Self {
        let mut registers = HashMap::new();
        for (id, name) in [
            (X86Reg::Rax, "rax"),
            (X86Reg::Rbx, "rbx"),
            (X86Reg::Rcx, "rcx"),
            (X86Reg::Rdx, "rdx"),
            (X86Reg::Rsi, "rsi"),
            (X86Reg::Rdi, "rdi"),
            (X86Reg::Rbp, "rbp"),
            (X86Reg::Rsp, "rsp"),
            (X86Reg::R8, "r8"),
            (X86Reg::R9, "r9"),
            (X86Reg::R10, "r10"),
            (X86Reg::R11, "r11"),
            (X86Reg::R12, "r12"),
            (X86Reg::R13, "r13"),
            (X86Reg::R14, "r14"),
            (X86Reg::R15, "r15"),
            (X86Reg::Rip, "rip"),
            (X86Reg::Fs, "fsbase"),
            (X86Reg::Gs, "gsbase"),
        ] {
            registers.insert(id, Register::new(name, 64));
        }
        for (id, name) in XMM_LOW.into_iter().chain(XMM_HIGH) {
            registers.insert(id, Register::new(name, 128));
        }

        X86Context {
            blk: BlockBuilder::default(),
            word_size: 64,
            accumulator: registers[&X86Reg::Rax].clone(),
            base: registers[&X86Reg::Rbx].clone(),
            counter: registers[&X86Reg::Rcx].clone(),
            data: registers[&X86Reg::Rdx].clone(),
            source: registers[&X86Reg::Rsi].clone(),
            destination: registers[&X86Reg::Rdi].clone(),
            frame_ptr: registers[&X86Reg::Rbp].clone(),
            stack_ptr: registers[&X86Reg::Rsp].clone(),
            registers,
            x86_64: true,
            use_rip,
        }
    }

    /// Build a context from the mode switches.
    pub fn from_options(opts: X86Options) -> Self {
        match opts.x86_64 {
            true => Self::x86_64(opts.use_rip),
            false => Self::x86(),
        }
    }

    pub(crate) fn tmp(&mut self, size: u16) -> Temporary {
        self.blk.tmp(size)
    }

    pub(crate) fn emit(&mut self, instruction: Instruction) {
        self.blk.emit(instruction);
    }

    pub(crate) fn label(&mut self, name: &'static str) {
        self.blk.label(name);
    }

    pub(crate) fn jump(&mut self, condition: impl Into<IlOperand>, label: &'static str) {
        self.blk.jump(condition, label);
    }

    pub(crate) fn finalise(&mut self) -> Result<Vec<Instruction>, TranslationError> {
        self.blk.finalise()
    }

    pub(crate) fn reset(&mut self) {
        self.blk.reset();
    }

    pub(crate) fn full_register(&self, reg: X86Reg) -> Result<Register, TranslationError> {
        self.registers
            .get(&reg)
            .cloned()
            .ok_or_else(|| TranslationError::UnknownRegister(format!("{reg:?}")))
    }

    /// The value the program counter reads as during `i`: the `rip`
    /// register when `use_rip` is set, otherwise the constant address of
    /// the following instruction.
    pub(crate) fn pc(&self, i: &X86Insn) -> IlOperand {
        if self.use_rip {
            self.registers[&X86Reg::Rip].clone().into()
        } else {
            Immediate::new((i.address + i.size as u64) as u128, 64).into()
        }
    }
}

const XMM_LOW: [(X86Reg, &str); 8] = [
    (X86Reg::Xmm0, "xmm0"),
    (X86Reg::Xmm1, "xmm1"),
    (X86Reg::Xmm2, "xmm2"),
    (X86Reg::Xmm3, "xmm3"),
    (X86Reg::Xmm4, "xmm4"),
    (X86Reg::Xmm5, "xmm5"),
    (X86Reg::Xmm6, "xmm6"),
    (X86Reg::Xmm7, "xmm7"),
];

const XMM_HIGH: [(X86Reg, &str); 8] = [
    (X86Reg::Xmm8, "xmm8"),
    (X86Reg::Xmm9, "xmm9"),
    (X86Reg::Xmm10, "xmm10"),
    (X86Reg::Xmm11, "xmm11"),
    (X86Reg::Xmm12, "xmm12"),
    (X86Reg::Xmm13, "xmm13"),
    (X86Reg::Xmm14, "xmm14"),
    (X86Reg::Xmm15, "xmm15"),
];

fn dispatch(ctx: &mut X86Context, i: &X86Insn) -> Result<(), TranslationError> {
    use X86Op::*;

    match i.op {
        Aaa => ascii::aaa(ctx, i),
        Aad => ascii::aad(ctx, i),
        Aam => ascii::aam(ctx, i),
        Aas => ascii::aas(ctx, i),
        Adc => arithmetic::adc(ctx, i),
        Adcx => arithmetic::adcx(ctx, i),
        Add => arithmetic::add(ctx, i),
        Adox => arithmetic::adox(ctx, i),
        And => logic::and(ctx, i),
        Andn => logic::andn(ctx, i),
        Arpl => misc::arpl(ctx, i),

        Bextr => bitwise::bextr(ctx, i),
        Blsi => bitwise::blsi(ctx, i),
        Blsmsk => bitwise::blsmsk(ctx, i),
        Blsr => bitwise::blsr(ctx, i),
        Bsf => bitwise::bsf(ctx, i),
        Bsr => bitwise::bsr(ctx, i),
        Bswap => misc::bswap(ctx, i),
        Bt => bitwise::bt(ctx, i),
        Btc => bitwise::btc(ctx, i),
        Btr => bitwise::btr(ctx, i),
        Bts => bitwise::bts(ctx, i),
        Bzhi => bitwise::bzhi(ctx, i),

        Call => control_flow::call(ctx, i),
        Cbw => misc::cbw(ctx, i),
        Cdq => misc::cdq(ctx, i),
        Cdqe => misc::cdqe(ctx, i),
        Clc => misc::clc(ctx, i),
        Cld => misc::cld(ctx, i),
        Cmc => misc::cmc(ctx, i),
        Cmova => memory::cmova(ctx, i),
        Cmovae => memory::cmovae(ctx, i),
        Cmovb => memory::cmovb(ctx, i),
        Cmovbe => memory::cmovbe(ctx, i),
        Cmove => memory::cmove(ctx, i),
        Cmovg => memory::cmovg(ctx, i),
        Cmovge => memory::cmovge(ctx, i),
        Cmovl => memory::cmovl(ctx, i),
        Cmovle => memory::cmovle(ctx, i),
        Cmovne => memory::cmovne(ctx, i),
        Cmovno => memory::cmovno(ctx, i),
        Cmovnp => memory::cmovnp(ctx, i),
        Cmovns => memory::cmovns(ctx, i),
        Cmovo => memory::cmovo(ctx, i),
        Cmovp => memory::cmovp(ctx, i),
        Cmovs => memory::cmovs(ctx, i),
        Cmp => arithmetic::cmp(ctx, i),
        Cmpsb => memory::cmpsb(ctx, i),
        Cmpsw => memory::cmpsw(ctx, i),
        Cmpsd => memory::cmpsd(ctx, i),
        Cmpsq => memory::cmpsq(ctx, i),
        Cmpxchg => misc::cmpxchg(ctx, i),
        Cmpxchg8b => misc::cmpxchg8b(ctx, i),
        Cmpxchg16b => misc::cmpxchg16b(ctx, i),
        Cpuid => misc::cpuid(ctx, i),
        Cqo => misc::cqo(ctx, i),
        Cwd => misc::cwd(ctx, i),
        Cwde => misc::cwde(ctx, i),

        Daa => ascii::daa(ctx, i),
        Das => ascii::das(ctx, i),
        Dec => arithmetic::dec(ctx, i),
        Div => arithmetic::div(ctx, i),

        Enter => control_flow::enter(ctx, i),

        Idiv => arithmetic::idiv(ctx, i),
        Imul => arithmetic::imul(ctx, i),
        Inc => arithmetic::inc(ctx, i),
        Int => misc::int(ctx, i),
        Int1 => misc::int1(ctx, i),
        Int3 => misc::int3(ctx, i),
        Into => misc::into(ctx, i),

        Ja => control_flow::ja(ctx, i),
        Jae => control_flow::jae(ctx, i),
        Jb => control_flow::jb(ctx, i),
        Jbe => control_flow::jbe(ctx, i),
        Jcxz => control_flow::jcxz(ctx, i),
        Jecxz => control_flow::jecxz(ctx, i),
        Jrcxz => control_flow::jrcxz(ctx, i),
        Je => control_flow::je(ctx, i),
        Jg => control_flow::jg(ctx, i),
        Jge => control_flow::jge(ctx, i),
        Jl => control_flow::jl(ctx, i),
        Jle => control_flow::jle(ctx, i),
        Jmp => control_flow::jmp(ctx, i),
        Jne => control_flow::jne(ctx, i),
        Jno => control_flow::jno(ctx, i),
        Jnp => control_flow::jnp(ctx, i),
        Jns => control_flow::jns(ctx, i),
        Jo => control_flow::jo(ctx, i),
        Jp => control_flow::jp(ctx, i),
        Js => control_flow::js(ctx, i),

        Lahf => misc::lahf(ctx, i),
        Lddqu => sse::movdqu(ctx, i),
        Lea => memory::lea(ctx, i),
        Leave => memory::leave(ctx, i),
        Lodsb => memory::lodsb(ctx, i),
        Lodsd => memory::lodsd(ctx, i),
        Lodsq => memory::lodsq(ctx, i),
        Lodsw => memory::lodsw(ctx, i),
        Loop => control_flow::loop_(ctx, i),
        Loope => control_flow::loope(ctx, i),
        Loopne => control_flow::loopne(ctx, i),
        Lzcnt => bitwise::lzcnt(ctx, i),

        Mov => memory::mov(ctx, i),
        Movabs => memory::movabs(ctx, i),
        Movaps => sse::movaps(ctx, i),
        Movd => sse::movd(ctx, i),
        Movdqa | Vmovdqa => sse::movdqa(ctx, i),
        Movdqu | Vmovdqu => sse::movdqu(ctx, i),
        Movhpd => sse::movhpd(ctx, i),
        Movlpd => sse::movlpd(ctx, i),
        Movq => sse::movq(ctx, i),
        Movsb => memory::movsb(ctx, i),
        Movsd => memory::movsd(ctx, i),
        Movsq => memory::movsq(ctx, i),
        Movsw => memory::movsw(ctx, i),
        Movsx | Movsxd => memory::movsx(ctx, i),
        Movups => sse::movups(ctx, i),
        Movzx => memory::movzx(ctx, i),
        Mul => arithmetic::mul(ctx, i),

        Neg => arithmetic::neg(ctx, i),
        Nop => misc::nop(ctx, i),
        Not => logic::not(ctx, i),
        Or => logic::or(ctx, i),

        Palignr => sse::palignr(ctx, i),
        Pand | Vpand => sse::pand(ctx, i),
        Pandn | Vpandn => sse::pandn(ctx, i),
        Pcmpeqb | Vpcmpeqb => sse::pcmpeqb(ctx, i),
        Pcmpeqd | Vpcmpeqd => sse::pcmpeqd(ctx, i),
        Pcmpeqq | Vpcmpeqq => sse::pcmpeqq(ctx, i),
        Pcmpeqw | Vpcmpeqw => sse::pcmpeqw(ctx, i),
        Pcmpgtb | Vpcmpgtb => sse::pcmpgtb(ctx, i),
        Pcmpgtd | Vpcmpgtd => sse::pcmpgtd(ctx, i),
        Pcmpgtq | Vpcmpgtq => sse::pcmpgtq(ctx, i),
        Pcmpgtw | Vpcmpgtw => sse::pcmpgtw(ctx, i),
        Pmaxub | Vpmaxub => sse::pmaxub(ctx, i),
        Pmaxud | Vpmaxud => sse::pmaxud(ctx, i),
        Pmaxuq | Vpmaxuq => sse::pmaxuq(ctx, i),
        Pmaxuw | Vpmaxuw => sse::pmaxuw(ctx, i),
        Pminub | Vpminub => sse::pminub(ctx, i),
        Pminud | Vpminud => sse::pminud(ctx, i),
        Pminuq | Vpminuq => sse::pminuq(ctx, i),
        Pminuw | Vpminuw => sse::pminuw(ctx, i),
        Pmovmskb | Vpmovmskb => sse::pmovmskb(ctx, i),
        Pop => memory::pop(ctx, i),
        Por | Vpor => sse::por(ctx, i),
        Pshufd => sse::pshufd(ctx, i),
        Pslldq => sse::pslldq(ctx, i),
        Psrldq => sse::psrldq(ctx, i),
        Psubb | Vpsubb => sse::psubb(ctx, i),
        Psubw | Vpsubw => sse::psubw(ctx, i),
        Psubd | Vpsubd => sse::psubd(ctx, i),
        Psubq | Vpsubq => sse::psubq(ctx, i),
        Punpcklbw => sse::punpcklbw(ctx, i),
        Punpcklwd => sse::punpcklwd(ctx, i),
        Punpckldq => sse::punpckldq(ctx, i),
        Punpcklqdq => sse::punpcklqdq(ctx, i),
        Push => memory::push(ctx, i),
        Pxor | Vpxor => sse::pxor(ctx, i),

        Rdtsc => misc::rdtsc(ctx, i),
        Ret => control_flow::ret(ctx, i),
        Rol => bitwise::rol(ctx, i),
        Ror => bitwise::ror(ctx, i),

        Sahf => misc::sahf(ctx, i),
        Sar => bitwise::sar(ctx, i),
        Sbb => arithmetic::sbb(ctx, i),
        Scasb => memory::scasb(ctx, i),
        Scasd => memory::scasd(ctx, i),
        Scasq => memory::scasq(ctx, i),
        Scasw => memory::scasw(ctx, i),
        Seta => misc::seta(ctx, i),
        Setae => misc::setae(ctx, i),
        Setb => misc::setb(ctx, i),
        Setbe => misc::setbe(ctx, i),
        Sete => misc::sete(ctx, i),
        Setg => misc::setg(ctx, i),
        Setge => misc::setge(ctx, i),
        Setl => misc::setl(ctx, i),
        Setle => misc::setle(ctx, i),
        Setne => misc::setne(ctx, i),
        Setno => misc::setno(ctx, i),
        Setnp => misc::setnp(ctx, i),
        Setns => misc::setns(ctx, i),
        Seto => misc::seto(ctx, i),
        Setp => misc::setp(ctx, i),
        Sets => misc::sets(ctx, i),
        Shl => bitwise::shl(ctx, i),
        Shr => bitwise::shr(ctx, i),
        Shrd => bitwise::shrd(ctx, i),
        Stc => misc::stc(ctx, i),
        Stosb => memory::stosb(ctx, i),
        Stosd => memory::stosd(ctx, i),
        Stosq => memory::stosq(ctx, i),
        Stosw => memory::stosw(ctx, i),
        Sub => arithmetic::sub(ctx, i),
        Syscall => misc::syscall(ctx, i),
        Sysenter => misc::sysenter(ctx, i),

        Test => logic::test(ctx, i),

        Xadd => arithmetic::xadd(ctx, i),
        Xchg => misc::xchg(ctx, i),
        Xor => logic::xor(ctx, i),

        Addpd | Addps | Addsd | Addss | Addsubpd | Addsubps
        | Andpd | Andps | Andnpd | Andnps
        | Blendpd | Blendps | Blendvpd | Blendvps
        | Cmppd | Cmpps | Cmpss | Comisd | Comiss
        | Cvtdq2pd | Cvtdq2ps | Cvtpd2dq | Cvtpd2pi | Cvtpd2ps | Cvtpi2pd
        | Cvtpi2ps | Cvtps2dq | Cvtps2pd | Cvtps2pi | Cvtsd2si | Cvtsd2ss
        | Cvtsi2sd | Cvtsi2ss | Cvttpd2pi | Cvttpd2dq | Cvttps2dq
        | Cvttps2pi | Cvttsd2si | Cvttss2si
        | Divpd | Divps | Divsd | Divss | Emms
        | F2xm1 | Fabs | Fadd | Faddp | Fbld | Fbstp | Fchs
        | Fcmovb | Fcmovbe | Fcmove | Fcmovnb | Fcmovnbe | Fcmovne
        | Fcmovnu | Fcmovu | Fcom | Fcomp | Fcompp | Fcomi | Fcos
        | Fdecstp | Fdiv | Fdivp | Fdivr | Fdivrp | Ffree | Fiadd | Ficom
        | Ficomp | Fidiv | Fidivr | Fild | Fimul | Fincstp | Fist | Fistp
        | Fisttp | Fld | Fld1 | Fldl2e | Fldl2t | Fldlg2 | Fldln2 | Fldz
        | Fldcw | Fldenv | Fmul | Fmulp | Fnclex | Fninit | Fnop | Fnsave
        | Fnstcw | Fnstenv | Fnstsw | Fprem | Fprem1 | Fptan | Frndint
        | Frstor | Fscale | Fsin | Fsincos | Fsqrt | Fst | Fstp | Fsub
        | Fsubr | Fsubrp | Ftst | Fucom | Fucomi | Fucomp | Fucompi | Fxam
        | Fxch | Fxrstor | Fxsave | Fxtract | Fyl2x | Fyl2xp1
        | Haddpd | Haddps | Hsubpd | Hsubps
        | Maxpd | Maxps | Maxsd | Maxss | Minpd | Minps | Minsd | Minss
        | Movapd | Movhps | Movlps | Movmskpd | Movmskps
        | Mulpd | Mulps | Mulsd | Mulss | Orpd | Orps
        | Shufpd | Shufps | Sqrtpd | Sqrtps | Sqrtsd | Sqrtss
        | Subpd | Subps | Subsd | Subss
        | Ucomisd | Ucomiss | Unpckhpd | Unpckhps | Unpcklpd | Unpcklps
        | Xorpd | Xorps => unsupported::floating_point(ctx, i),

        Clac | Cli | Clts | Hlt | In | Insb | Insd | Insw | Invd | Invlpg
        | Lgdt | Lidt | Lldt | Lmsw | Ltr | Out | Outsb | Outsd | Outsw
        | Rdmsr | Rsm | Sti | Swapgs | Sysexit | Sysret | Wbinvd | Wrmsr
        | Xrstor | Xsave | Xsetbv => unsupported::privileged(ctx, i),

        Clflush | Lar | Ldmxcsr | Lds | Les | Lfs | Lgs | Lss | Lfence
        | Lsl | Mfence | Monitor | Mwait | Pause | Popf | Popfd | Popfq
        | Pushf | Pushfd | Pushfq | Sfence | Sgdt | Sidt | Sldt | Smsw
        | Stmxcsr | StrTr | Verr | Verw | Xgetbv => {
            unsupported::low_level(ctx, i)
        }

        Bound | Ud2 => unsupported::requires_exceptions(ctx, i),

        Aesdec | Aesdeclast | Aesenc | Aesenclast | Aesimc
        | Aeskeygenassist | Crc32 | Maskmovdqu | Movntdq | Movnti
        | Movntpd | Movntps | Rcl | Rcr | Shld | Xlatb => {
            unsupported::complicated(ctx, i)
        }
    }
}

/// Marker type wiring x86 into the generic driver.
pub enum X86Arch {}

impl Arch for X86Arch {
    type Op = X86Op;
    type Reg = X86Reg;
    type Context = X86Context;

    fn translate(
        ctx: &mut X86Context,
        i: &X86Insn,
    ) -> Result<Vec<Instruction>, TranslationError> {
        match dispatch(ctx, i) {
            Ok(()) => ctx.finalise(),
            Err(e) => {
                ctx.reset();
                Err(e)
            }
        }
    }

    fn ends_basic_block(i: &X86Insn) -> bool {
        i.groups.contains(Groups::JUMP) || matches!(i.op, X86Op::Call | X86Op::Ret)
    }
}

/// Translate x86 machine code starting at `base_address`.
///
/// Each call builds a fresh [`X86Context`]; use [`Blocks::new`] with a
/// retained context to amortise allocations across calls.
pub fn translate_x86<'a, D>(
    dis: D,
    code: &'a [u8],
    base_address: u64,
    opts: X86Options,
) -> Blocks<'a, X86Arch, D>
where
    D: Disassembler<Op = X86Op, Reg = X86Reg>,
{
    Blocks::new(X86Context::from_options(opts), dis, code, base_address)
}
