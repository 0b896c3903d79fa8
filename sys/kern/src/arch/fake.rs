// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stand-in architecture support for host builds.
//!
//! Register reads return zero and there is only ever one core, running in
//! system mode. Nothing here can take a real fault.

use kerncore::cpu;
use kerncore::regs::FaultRegisters;

#[derive(Copy, Clone, Debug, Default)]
pub struct CpuRegs;

impl FaultRegisters for CpuRegs {
    fn ifsr(&self) -> u32 {
        0
    }
    fn ifar(&self) -> u32 {
        0
    }
    fn dfsr(&self) -> u32 {
        0
    }
    fn dfar(&self) -> u32 {
        0
    }
    fn dbgdscr(&self) -> u32 {
        0
    }
    fn fpexc(&self) -> u32 {
        0
    }
    fn set_fpexc(&mut self, _value: u32) {}
    fn fpscr(&self) -> u32 {
        0
    }
    fn store_low_fp_regs(&self, dest: &mut [u32; 16]) {
        *dest = [0; 16];
    }
}

pub fn core_id() -> usize {
    0
}

/// System mode, interrupts enabled.
pub fn current_psr() -> u32 {
    0x1F
}

pub fn thread_is_in_user_mode() -> bool {
    cpu::mode_is_user(current_psr())
}

pub fn halt() -> ! {
    panic!("kernel halted");
}
