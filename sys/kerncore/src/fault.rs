// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification of undefined instruction, prefetch abort and data abort
//! exceptions.
//!
//! Each handler is entered exactly once per exception, with the nesting count
//! already bumped by the vector stub. `Ok(())` means execution may resume at
//! the faulting instruction; `Err` means the fault is fatal and must be
//! escalated. At present every genuine fault is fatal: there is no emulation
//! of undefined instructions and no recoverable abort.

use abi::{CalleeSaved, ExceptionStackFrame};

use crate::cpu::CpuSlot;
use crate::dump;
use crate::err::{FatalError, FaultKind};
use crate::fsr;
use crate::log::FaultLog;
use crate::regs::FaultRegisters;

/// Build-time fault handling options.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FaultConfig {
    /// Decode and print the fault status register for aborts.
    pub verbose_dump: bool,
}

/// Everything a fault handler needs besides the saved registers.
pub struct FaultContext<'a, R, L> {
    /// State of the core that took the exception. Only the lazy FPU filter
    /// touches it.
    #[cfg_attr(not(feature = "fpu-sharing"), allow(dead_code))]
    cpu: &'a CpuSlot,
    pub regs: &'a mut R,
    pub log: &'a mut L,
    pub config: FaultConfig,
}

impl<'a, R, L> FaultContext<'a, R, L> {
    /// # Safety
    ///
    /// `cpu` must be the slot of the core handling the exception, and nothing
    /// but exceptions nested on top of this one may use it while the context
    /// exists.
    pub unsafe fn new(
        cpu: &'a CpuSlot,
        regs: &'a mut R,
        log: &'a mut L,
        config: FaultConfig,
    ) -> Self {
        Self {
            cpu,
            regs,
            log,
            config,
        }
    }
}

impl<R: FaultRegisters, L: FaultLog> FaultContext<'_, R, L> {
    /// Handles an undefined instruction exception.
    pub fn handle_undefined(
        &mut self,
        esf: &mut ExceptionStackFrame,
        cs: &CalleeSaved,
    ) -> Result<(), FatalError> {
        #[cfg(feature = "fpu-sharing")]
        {
            let regs = &mut *self.regs;
            // Safety: the filter doesn't log, and once it has turned the VFP
            // on nothing it does can trap. Our constructor's contract covers
            // everyone else.
            let absorbed = unsafe {
                self.cpu.with(|cpu| crate::fpu::lazy_enable(cpu, regs))
            };
            if absorbed {
                return Ok(());
            }

            // This really is an undefined instruction and we're going down,
            // so keep the VFP state for whoever reads the frame afterwards.
            esf.fpu.fpexc = self.regs.fpexc();
            esf.fpu.fpscr = self.regs.fpscr();
            self.regs.store_low_fp_regs(&mut esf.fpu.s);
        }
        #[cfg(not(feature = "fpu-sharing"))]
        let _ = esf;

        fault_log!(self.log, "***** UNDEFINED INSTRUCTION ABORT *****");
        dump::dump_callee_saved(self.log, cs);

        Err(FatalError::cpu_exception(FaultKind::UndefinedInstruction))
    }

    /// Handles a prefetch abort, reported through IFSR and IFAR.
    ///
    /// The frame isn't consulted; the kernel reports its pc when escalating.
    pub fn handle_prefetch_abort(
        &mut self,
        _esf: &ExceptionStackFrame,
        cs: &CalleeSaved,
    ) -> Result<(), FatalError> {
        let status = fsr::fault_status(self.regs.ifsr());
        let addr = self.regs.ifar();

        fault_log!(self.log, "***** PREFETCH ABORT *****");
        self.abort_common(status, addr, cs);

        Err(FatalError::cpu_exception(FaultKind::PrefetchAbort))
    }

    /// Handles a data abort, reported through DFSR and DFAR.
    pub fn handle_data_abort(
        &mut self,
        _esf: &ExceptionStackFrame,
        cs: &CalleeSaved,
    ) -> Result<(), FatalError> {
        let status = fsr::fault_status(self.regs.dfsr());
        let addr = self.regs.dfar();

        fault_log!(self.log, "***** DATA ABORT *****");
        self.abort_common(status, addr, cs);

        Err(FatalError::cpu_exception(FaultKind::DataAbort))
    }

    fn abort_common(&mut self, status: u32, addr: u32, cs: &CalleeSaved) {
        if self.config.verbose_dump {
            dump::dump_fault(&*self.regs, self.log, status, addr);
        }
        dump::dump_callee_saved(self.log, cs);
    }
}
