// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-core fault handling state.
//!
//! Each logical core owns one `CpuState`. It is shared only between the
//! exception levels nested on that core, never between cores, so nothing in
//! here needs a lock -- but the vector stubs and the handlers have to agree on
//! the order in which fields are touched:
//!
//! - the stub increments `nested` before calling a handler and decrements it
//!   after the handler returns;
//! - the stub records the frame of a floating-point-capable exception level in
//!   `fp_ctx` before anything can nest on top of it;
//! - the lazy FPU filter consumes `fp_ctx` exactly once.
//!
//! The stubs reach these fields by offset, hence `repr(C)` and the exported
//! offsets below.
//!
//! Handlers get at the state through a [`CpuSlot`], and only borrow it for as
//! long as they are manipulating it. A handler that held a `&mut CpuState`
//! while logging could be interrupted by a nested trap that borrows the same
//! slot again.

use core::cell::UnsafeCell;
use core::mem::offset_of;
use core::ptr::NonNull;

#[cfg(feature = "fpu-sharing")]
use abi::ExceptionStackFrame;
use abi::{ThreadBase, ThreadOptions};
use static_assertions::const_assert_eq;

/// CPSR/SPSR mode field.
pub const PSR_MODE_MASK: u32 = 0x1F;
/// User mode encoding of the mode field.
pub const PSR_MODE_USR: u32 = 0x10;

/// Checks whether a saved program status word describes user mode.
#[inline]
pub fn mode_is_user(psr: u32) -> bool {
    psr & PSR_MODE_MASK == PSR_MODE_USR
}

#[derive(Debug)]
#[repr(C)]
pub struct CpuState {
    nested: u32,
    current: Option<NonNull<ThreadBase>>,
    #[cfg(feature = "fpu-sharing")]
    fp_ctx: Option<NonNull<ExceptionStackFrame>>,
}

pub const CPU_NESTED_OFFSET: usize = offset_of!(CpuState, nested);
pub const CPU_CURRENT_OFFSET: usize = offset_of!(CpuState, current);
#[cfg(feature = "fpu-sharing")]
pub const CPU_FP_CTX_OFFSET: usize = offset_of!(CpuState, fp_ctx);

const_assert_eq!(CPU_NESTED_OFFSET, 0);
const_assert_eq!(CPU_CURRENT_OFFSET, core::mem::size_of::<usize>());
#[cfg(feature = "fpu-sharing")]
const_assert_eq!(CPU_FP_CTX_OFFSET, 2 * core::mem::size_of::<usize>());

impl CpuState {
    pub const fn new() -> Self {
        Self {
            nested: 0,
            current: None,
            #[cfg(feature = "fpu-sharing")]
            fp_ctx: None,
        }
    }

    /// Number of exception levels currently active on this core. At least 1
    /// whenever a fault handler is running.
    pub fn nested(&self) -> u32 {
        self.nested
    }

    /// Records entry to an exception level. Normally the vector stub does
    /// this itself.
    pub fn nest_enter(&mut self) {
        self.nested = self.nested.wrapping_add(1);
    }

    /// Records exit from an exception level.
    pub fn nest_exit(&mut self) {
        self.nested = self.nested.saturating_sub(1);
    }

    /// Installs the thread that will be blamed for faults in thread context.
    ///
    /// # Safety
    ///
    /// `thread`, if given, must point to a valid `ThreadBase` that stays alive
    /// and is not otherwise mutated while a fault handler runs on this core,
    /// until it is replaced by another call.
    pub unsafe fn set_current(&mut self, thread: Option<NonNull<ThreadBase>>) {
        self.current = thread;
    }

    /// Option bits of the current thread; empty if no thread is installed
    /// (e.g. before the scheduler starts).
    pub fn current_options(&self) -> ThreadOptions {
        match self.current {
            // Safety: set_current's contract keeps this valid.
            Some(t) => unsafe { t.as_ref().user_options },
            None => ThreadOptions::empty(),
        }
    }

    /// Flags the current thread as a floating-point user. Returns `false` if
    /// there was no thread to flag.
    pub fn mark_current_fp_user(&mut self) -> bool {
        match self.current {
            Some(mut t) => {
                // Safety: set_current's contract keeps this valid and
                // unaliased while we run.
                unsafe { t.as_mut().user_options |= ThreadOptions::FP_REGS };
                true
            }
            None => false,
        }
    }

    /// Records the frame of the exception level whose floating-point
    /// registers are still live in the VFP.
    ///
    /// # Safety
    ///
    /// `esf` must point to a valid exception stack frame, on a stack that
    /// outlives every exception level nested above it, and nothing else may
    /// access that frame until [`Self::take_fp_ctx`] hands it out.
    #[cfg(feature = "fpu-sharing")]
    pub unsafe fn set_fp_ctx(&mut self, esf: NonNull<ExceptionStackFrame>) {
        self.fp_ctx = Some(esf);
    }

    /// Whether a frame is waiting to be spilled into.
    #[cfg(feature = "fpu-sharing")]
    pub fn has_fp_ctx(&self) -> bool {
        self.fp_ctx.is_some()
    }

    /// Consumes the pending frame, clearing it so it cannot be used twice.
    #[cfg(feature = "fpu-sharing")]
    pub fn take_fp_ctx(&mut self) -> Option<&mut ExceptionStackFrame> {
        // Safety: set_fp_ctx's contract makes the frame valid and exclusively
        // ours once taken; take() guarantees we hand it out only once.
        self.fp_ctx.take().map(|mut esf| unsafe { esf.as_mut() })
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}

/// Home of one core's `CpuState`, shared between the exception levels nested
/// on that core.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct CpuSlot(UnsafeCell<CpuState>);

impl CpuSlot {
    pub const fn new() -> Self {
        Self(UnsafeCell::new(CpuState::new()))
    }

    /// Exclusive access through exclusive ownership, for setup and tests.
    pub fn get_mut(&mut self) -> &mut CpuState {
        self.0.get_mut()
    }

    /// Runs `body` with the state in this slot.
    ///
    /// # Safety
    ///
    /// Nothing else may access the slot while `body` runs. On a live core
    /// that means `body` must not log, and must not do anything else that
    /// could take an exception which itself uses the slot.
    pub unsafe fn with<R>(&self, body: impl FnOnce(&mut CpuState) -> R) -> R {
        // Safety: per our contract, this is the only reference for now.
        body(unsafe { &mut *self.0.get() })
    }
}

const_assert_eq!(
    core::mem::size_of::<CpuSlot>(),
    core::mem::size_of::<CpuState>()
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_mode_detection() {
        assert!(mode_is_user(0x6000_0010));
        assert!(!mode_is_user(0x6000_001F)); // sys
        assert!(!mode_is_user(0x6000_0013)); // svc
        assert!(!mode_is_user(0x6000_0017)); // abt
    }

    #[test]
    fn nesting_saturates_at_zero() {
        let mut cpu = CpuState::new();
        cpu.nest_exit();
        assert_eq!(cpu.nested(), 0);
        cpu.nest_enter();
        cpu.nest_enter();
        assert_eq!(cpu.nested(), 2);
        cpu.nest_exit();
        assert_eq!(cpu.nested(), 1);
    }

    #[test]
    fn cores_are_independent() {
        let mut thread = ThreadBase::default();
        let mut cpus: [CpuState; 4] = Default::default();

        cpus[2].nest_enter();
        cpus[2].nest_enter();
        unsafe {
            cpus[1].set_current(Some(NonNull::from(&mut thread)));
        }
        assert!(cpus[1].mark_current_fp_user());

        for (i, cpu) in cpus.iter().enumerate() {
            assert_eq!(cpu.nested(), if i == 2 { 2 } else { 0 });
            assert_eq!(
                cpu.current_options().contains(ThreadOptions::FP_REGS),
                i == 1
            );
        }
        assert!(!cpus[0].mark_current_fp_user());
    }

    #[test]
    fn slot_hands_out_its_state() {
        let mut slot = CpuSlot::new();
        slot.get_mut().nest_enter();
        let nested = unsafe {
            slot.with(|cpu| {
                cpu.nest_enter();
                cpu.nested()
            })
        };
        assert_eq!(nested, 2);
        assert_eq!(slot.get_mut().nested(), 2);
    }

    #[cfg(feature = "fpu-sharing")]
    #[test]
    fn fp_ctx_is_consumed_once() {
        let mut outer = ExceptionStackFrame::default();
        let mut cpu = CpuState::new();
        unsafe {
            cpu.set_fp_ctx(NonNull::from(&mut outer));
        }
        assert!(cpu.has_fp_ctx());
        assert!(cpu.take_fp_ctx().is_some());
        assert!(!cpu.has_fp_ctx());
        assert!(cpu.take_fp_ctx().is_none());
    }
}
