// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazy floating-point context switching.
//!
//! The scheduler leaves the VFP disabled for threads that have never used
//! it, so it doesn't have to save and restore the floating-point registers on
//! every context switch. The first floating-point instruction such a thread
//! executes traps as an undefined instruction; that trap is our cue to turn
//! the unit on and let the instruction run again.
//!
//! The complication is nesting. If the trap was taken from an interrupt or
//! SVC handler rather than from a thread, the VFP registers may still hold the
//! live state of whatever that handler interrupted. The caller-saved half of
//! that state (`s0`-`s15` and FPSCR) has to be parked in the outer level's
//! exception stack frame before the handler clobbers it. The vector stub tells
//! us which frame that is through `CpuState::fp_ctx`.

use abi::ThreadOptions;

use crate::cpu::CpuState;
use crate::regs::{FaultRegisters, FPEXC_EN};

/// Checks whether an undefined instruction trap is really a lazy VFP enable
/// request, and handles it if so.
///
/// Returns `true` if the trap was absorbed: the VFP is now enabled and the
/// faulting instruction can simply be retried. Returns `false`, having touched
/// nothing, if the VFP was already on -- in which case the instruction really
/// is undefined.
pub fn lazy_enable(cpu: &mut CpuState, regs: &mut impl FaultRegisters) -> bool {
    if regs.fpexc() & FPEXC_EN != 0 {
        return false;
    }

    regs.set_fpexc(FPEXC_EN);

    let nested = cpu.nested();
    if nested > 1 {
        // We came from an IRQ or SVC handler: it holds nesting level 1 and
        // this trap took us to 2, or deeper if handlers were already nested.
        let thread_uses_fp =
            cpu.current_options().contains(ThreadOptions::FP_REGS);

        let Some(outer) = cpu.take_fp_ctx() else {
            // Nothing was recorded, so nothing below us had live VFP state.
            return true;
        };

        // At depth 2 the outer level is the thread itself, and its registers
        // matter if it has ever used the VFP (whether or not it was using it
        // just now). Deeper than that, the outer level is another handler,
        // and the frame records whether the VFP was on when it was entered.
        let live = if nested == 2 {
            thread_uses_fp
        } else {
            outer.fpu.fpexc & FPEXC_EN != 0
        };

        if live {
            outer.fpu.fpexc |= FPEXC_EN;
            outer.fpu.fpscr = regs.fpscr();
            regs.store_low_fp_regs(&mut outer.fpu.s);
        }
    } else {
        // A thread faulted. From now on the scheduler must treat it as a
        // floating-point user. This means a thread doesn't have to ask for
        // FP_REGS at creation, though it should.
        cpu.mark_current_fp_user();
    }

    true
}
