// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Architecture support for ARMv7-R (and the AArch32 state of ARMv7-A).
//!
//! # Register access
//!
//! The fault status and address registers live in CP15 and are read through
//! `cortex_ar::register`. The debug status register (CP14) and FPEXC/FPSCR
//! (VFP system registers) aren't covered there, so those are single
//! instructions of our own; see `CpuRegs`.
//!
//! # Vector stub interface
//!
//! The exception vectors and their entry stubs are provided by the platform.
//! To build an `ExceptionStackFrame` and find this core's `CpuSlot` they need
//! a handful of layout numbers, which we export as absolute symbols:
//!
//! - `KERN_CPU_SIZE`: stride of the `KERNEL_CPUS` table.
//! - `KERN_CPU_NESTED_OFFSET`, `KERN_CPU_CURRENT_OFFSET`,
//!   `KERN_CPU_FP_CTX_OFFSET`: field offsets within a slot. The last is only
//!   present with floating-point sharing.
//! - `KERN_ESF_SIZE`: bytes to reserve for an exception stack frame.
//!
//! That way a layout change shows up as a link error or a changed constant,
//! rather than as a stub quietly scribbling on the wrong field.

use core::arch::{self, global_asm};

use cortex_ar::asm;
use cortex_ar::register::{Cpsr, Dfar, Dfsr, Ifar, Ifsr, Mpidr, SysRegRead};
use kerncore::cpu::{self, CpuSlot};
use kerncore::regs::FaultRegisters;

#[cfg(all(feature = "fpu-sharing", not(target_abi = "eabihf")))]
compile_error!(
    "floating-point sharing needs a target with a VFP (e.g. armv7r-none-eabihf)"
);

/// The fault-related system registers of the current core.
#[derive(Copy, Clone, Debug, Default)]
pub struct CpuRegs;

impl FaultRegisters for CpuRegs {
    fn ifsr(&self) -> u32 {
        // Safety: reading a fault status register has no side effects.
        unsafe { Ifsr::read_raw() }
    }

    fn ifar(&self) -> u32 {
        // Safety: reading a fault address register has no side effects.
        unsafe { Ifar::read_raw() }
    }

    fn dfsr(&self) -> u32 {
        // Safety: as for ifsr.
        unsafe { Dfsr::read_raw() }
    }

    fn dfar(&self) -> u32 {
        // Safety: as for ifar.
        unsafe { Dfar::read_raw() }
    }

    // DBGDSCRint and the VFP system registers have no accessors in
    // cortex-ar.
    fn dbgdscr(&self) -> u32 {
        let r: u32;
        // Safety: DBGDSCRint is readable from any privileged mode and reading
        // it has no side effects.
        unsafe {
            arch::asm!(
                "mrc p14, 0, {}, c0, c1, 0",
                out(reg) r,
                options(nomem, preserves_flags, nostack),
            );
        }
        r
    }

    #[cfg(feature = "fpu-sharing")]
    fn fpexc(&self) -> u32 {
        let r: u32;
        // Safety: FPEXC is accessible from privileged modes whether or not
        // the VFP is enabled.
        unsafe {
            arch::asm!(
                "vmrs {}, fpexc",
                out(reg) r,
                options(nomem, preserves_flags, nostack),
            );
        }
        r
    }

    #[cfg(feature = "fpu-sharing")]
    fn set_fpexc(&mut self, value: u32) {
        // Safety: we only ever write EN here, and the caller is the lazy
        // enable path, which has decided the VFP should now be on.
        unsafe {
            arch::asm!(
                "vmsr fpexc, {}",
                in(reg) value,
                options(nomem, preserves_flags, nostack),
            );
        }
    }

    #[cfg(feature = "fpu-sharing")]
    fn fpscr(&self) -> u32 {
        let r: u32;
        // Safety: only reached with the VFP enabled (by lazy_enable, or
        // because the undefined instruction was taken with it already on).
        unsafe {
            arch::asm!(
                "vmrs {}, fpscr",
                out(reg) r,
                options(nomem, preserves_flags, nostack),
            );
        }
        r
    }

    #[cfg(feature = "fpu-sharing")]
    fn store_low_fp_regs(&self, dest: &mut [u32; 16]) {
        // Safety: the VFP is enabled (see fpscr), and `dest` is exactly the
        // 64 bytes the store writes.
        unsafe {
            arch::asm!(
                "vstmia {0}, {{s0-s15}}",
                in(reg) dest.as_mut_ptr(),
                options(preserves_flags, nostack),
            );
        }
    }

    // Without floating-point sharing the fault path never looks at the VFP,
    // and the target may not have one.
    #[cfg(not(feature = "fpu-sharing"))]
    fn fpexc(&self) -> u32 {
        0
    }

    #[cfg(not(feature = "fpu-sharing"))]
    fn set_fpexc(&mut self, _value: u32) {}

    #[cfg(not(feature = "fpu-sharing"))]
    fn fpscr(&self) -> u32 {
        0
    }

    #[cfg(not(feature = "fpu-sharing"))]
    fn store_low_fp_regs(&self, _dest: &mut [u32; 16]) {}
}

/// Affinity level 0 of the calling core, used to index per-core state.
pub fn core_id() -> usize {
    // Safety: MPIDR is a read-only identification register.
    let mpidr = unsafe { Mpidr::read_raw() };
    (mpidr & 0xFF) as usize
}

/// Current program status register.
pub fn current_psr() -> u32 {
    Cpsr::read().raw_value()
}

/// Checks whether the calling code is running in user mode.
pub fn thread_is_in_user_mode() -> bool {
    cpu::mode_is_user(current_psr())
}

/// Stops this core for good.
pub fn halt() -> ! {
    loop {
        // Nothing the fatal path wants to service will wake us.
        asm::wfi();
    }
}

global_asm! {"
    .globl KERN_CPU_SIZE
    .equ KERN_CPU_SIZE, {cpu_size}
    .globl KERN_CPU_NESTED_OFFSET
    .equ KERN_CPU_NESTED_OFFSET, {nested}
    .globl KERN_CPU_CURRENT_OFFSET
    .equ KERN_CPU_CURRENT_OFFSET, {current}
    .globl KERN_ESF_SIZE
    .equ KERN_ESF_SIZE, {esf_size}
    ",
    cpu_size = const core::mem::size_of::<CpuSlot>(),
    nested = const cpu::CPU_NESTED_OFFSET,
    current = const cpu::CPU_CURRENT_OFFSET,
    esf_size = const abi::ESF_SIZE,
}

#[cfg(feature = "fpu-sharing")]
global_asm! {"
    .globl KERN_CPU_FP_CTX_OFFSET
    .equ KERN_CPU_FP_CTX_OFFSET, {fp_ctx}
    ",
    fp_ctx = const cpu::CPU_FP_CTX_OFFSET,
}
