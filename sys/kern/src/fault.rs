// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entry points for the undefined instruction, prefetch abort and data abort
//! vectors.
//!
//! The platform's vector stubs are expected to, in order:
//!
//! 1. build an `ExceptionStackFrame` for the interrupted context, and store
//!    the callee-saved registers and thread stack pointer in a `CalleeSaved`;
//! 2. increment `nested` in this core's `KERNEL_CPUS` slot;
//! 3. call the matching `arm_fault_*` function below;
//! 4. decrement `nested` again.
//!
//! A `false` return means the fault was dealt with and the stub should return
//! to the faulting instruction. A fatal fault never returns at all. The
//! `bool` return is kept so that a recoverable fault can be added later
//! without changing the stubs.

use abi::{CalleeSaved, ExceptionStackFrame};
use kerncore::{FaultConfig, FaultContext, FaultKind};

use crate::arch::CpuRegs;
use crate::fail;
use crate::klog::Klog;
use crate::percpu;

const FAULT_CONFIG: FaultConfig = FaultConfig {
    verbose_dump: cfg!(feature = "fault-dump-verbose"),
};

/// Called once during kernel initialization.
///
/// There's currently nothing to set up: the fault status registers need no
/// configuration and the vectors are installed with the rest of the image.
#[no_mangle]
pub extern "C" fn arm_fault_init() {}

/// Rust-side name for [`arm_fault_init`].
pub fn fault_init() {
    arm_fault_init()
}

/// Classifies one exception on this core, escalating if it is fatal.
///
/// This is what the `arm_fault_*` entry points do, behind a Rust ABI so that
/// the fatal path can unwind on hosts.
///
/// # Safety
///
/// `esf` and `cs` must point to the frames built by the vector stub for the
/// exception being handled, and we must be running in that exception's
/// context.
pub unsafe fn dispatch(
    kind: FaultKind,
    esf: *mut ExceptionStackFrame,
    cs: *const CalleeSaved,
) -> bool {
    // Safety: the stub passes us pointers to frames on the exception stack,
    // which stay put until we return.
    let (Some(esf), Some(cs)) = (unsafe { esf.as_mut() }, unsafe { cs.as_ref() })
    else {
        fail::die("fault entered without a stack frame");
    };
    let Some(slot) = percpu::current_slot() else {
        fail::die("fault on a core with no fault state");
    };

    let mut regs = CpuRegs;
    let mut log = Klog;
    // Safety: we're in exception context on this core, and the slot is only
    // shared with exceptions nested on top of us.
    let mut cx =
        unsafe { FaultContext::new(slot, &mut regs, &mut log, FAULT_CONFIG) };

    let r = match kind {
        FaultKind::UndefinedInstruction => cx.handle_undefined(esf, cs),
        FaultKind::PrefetchAbort => cx.handle_prefetch_abort(esf, cs),
        FaultKind::DataAbort => cx.handle_data_abort(esf, cs),
    };

    match r {
        Ok(()) => false,
        Err(e) => fail::fatal_error(e, esf),
    }
}

/// Undefined instruction vector entry.
///
/// Also the way a thread's first floating-point instruction gets the VFP
/// turned on, when floating-point sharing is enabled.
///
/// # Safety
///
/// Only for use by the vector stub; see the module docs.
#[no_mangle]
pub unsafe extern "C" fn arm_fault_undef_instruction(
    esf: *mut ExceptionStackFrame,
    cs: *const CalleeSaved,
) -> bool {
    // Safety: passed through from our caller.
    unsafe { dispatch(FaultKind::UndefinedInstruction, esf, cs) }
}

/// Prefetch abort vector entry.
///
/// # Safety
///
/// Only for use by the vector stub; see the module docs.
#[no_mangle]
pub unsafe extern "C" fn arm_fault_prefetch(
    esf: *mut ExceptionStackFrame,
    cs: *const CalleeSaved,
) -> bool {
    // Safety: passed through from our caller.
    unsafe { dispatch(FaultKind::PrefetchAbort, esf, cs) }
}

/// Data abort vector entry.
///
/// # Safety
///
/// Only for use by the vector stub; see the module docs.
#[no_mangle]
pub unsafe extern "C" fn arm_fault_data(
    esf: *mut ExceptionStackFrame,
    cs: *const CalleeSaved,
) -> bool {
    // Safety: passed through from our caller.
    unsafe { dispatch(FaultKind::DataAbort, esf, cs) }
}
