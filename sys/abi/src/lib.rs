// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel ABI definitions shared between the fault handlers, the assembly
//! exception vector stubs, and post-mortem tooling.
//!
//! Everything in here has a fixed layout. The vector stubs build these
//! structures on the stack by offset, and debuggers read them back out of a
//! halted image, so reordering a field is an ABI break.

#![no_std]

use core::fmt;

use num_derive::FromPrimitive;
use static_assertions::const_assert_eq;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Registers stacked by hardware and the vector stub on every exception.
///
/// These are the AAPCS caller-saved registers, plus the return address and
/// the saved program status register of the interrupted context.
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(C)]
pub struct BasicFrame {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    /// Return address into the interrupted context.
    pub pc: u32,
    /// SPSR of the exception mode, i.e. the interrupted CPSR.
    pub xpsr: u32,
}

/// Floating-point state that can be parked in an exception stack frame.
///
/// Only the low half of the VFP register file (`s0`-`s15`) is caller-saved,
/// so that's all an exception frame ever holds.
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(C)]
pub struct FpContext {
    /// Raw bit patterns of `s0` through `s15`.
    pub s: [u32; 16],
    pub fpscr: u32,
    /// FPEXC as it stood at this exception level. The `EN` bit doubles as the
    /// record of whether this frame holds live floating-point state.
    pub fpexc: u32,
}

/// Exception stack frame, as laid down by the vector entry stub.
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(C)]
pub struct ExceptionStackFrame {
    #[cfg(feature = "fpu-sharing")]
    pub fpu: FpContext,
    pub basic: BasicFrame,
}

/// Size of `BasicFrame` in bytes.
pub const BASIC_FRAME_SIZE: usize = 8 * 4;

/// Size of `FpContext` in bytes.
pub const FP_CONTEXT_SIZE: usize = (16 + 2) * 4;

/// Size of the whole `ExceptionStackFrame`; the vector stubs reserve exactly
/// this much stack.
#[cfg(feature = "fpu-sharing")]
pub const ESF_SIZE: usize = FP_CONTEXT_SIZE + BASIC_FRAME_SIZE;
#[cfg(not(feature = "fpu-sharing"))]
pub const ESF_SIZE: usize = BASIC_FRAME_SIZE;

const_assert_eq!(core::mem::size_of::<BasicFrame>(), BASIC_FRAME_SIZE);
const_assert_eq!(core::mem::size_of::<FpContext>(), FP_CONTEXT_SIZE);
const_assert_eq!(core::mem::size_of::<ExceptionStackFrame>(), ESF_SIZE);

/// Registers the interrupted code was obliged to preserve itself, captured by
/// the vector stub purely so they can be reported.
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
#[repr(C)]
pub struct CalleeSaved {
    // NOTE: r4-r11 must stay contiguous, the stub stores them with one stm.
    pub r4: u32,
    pub r5: u32,
    pub r6: u32,
    pub r7: u32,
    pub r8: u32,
    pub r9: u32,
    pub r10: u32,
    pub r11: u32,
    /// Thread (process) stack pointer at the time of the exception.
    pub psp: u32,
}

const_assert_eq!(core::mem::size_of::<CalleeSaved>(), 9 * 4);

bitflags::bitflags! {
    /// Per-thread option bits, as stored in the thread control block.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct ThreadOptions: u8 {
        /// Thread is essential; its death takes the system down.
        const ESSENTIAL = 1 << 0;
        /// Thread uses the floating-point registers, so the scheduler must
        /// preserve them across context switches. Set lazily by the fault
        /// handler on first use; never cleared by it.
        const FP_REGS = 1 << 1;
        /// Thread runs unprivileged.
        const USER = 1 << 2;
    }
}

/// The part of a thread control block the fault path is allowed to see.
///
/// The scheduler owns the rest of the structure; this prefix must stay first.
#[derive(Debug, Default)]
#[repr(C)]
pub struct ThreadBase {
    pub user_options: ThreadOptions,
}

/// Reason codes handed to the kernel's fatal error handler.
///
/// The numeric values are visible to tooling and must not change.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u32)]
pub enum ReasonCode {
    /// A CPU exception that the kernel could not handle (undefined
    /// instruction, prefetch abort, data abort).
    CpuException = 0,
    /// An interrupt with no registered handler fired.
    SpuriousIrq = 1,
    /// A stack canary was found clobbered.
    StackCheckFail = 2,
    /// A recoverable kernel error, only fatal to the offending thread.
    KernelOops = 3,
    /// An unrecoverable kernel error.
    KernelPanic = 4,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CpuException => "CPU exception",
            Self::SpuriousIrq => "Unhandled interrupt",
            Self::StackCheckFail => "Stack overflow",
            Self::KernelOops => "Kernel oops",
            Self::KernelPanic => "Kernel panic",
        })
    }
}
