// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host stand-ins for the register file and the kernel log.

use core::cell::Cell;
use core::fmt;

use crate::log::FaultLog;
use crate::regs::FaultRegisters;

/// A register file that answers reads from its fields and records writes.
#[derive(Debug, Default)]
pub struct FakeRegs {
    pub ifsr: u32,
    pub ifar: u32,
    pub dfsr: u32,
    pub dfar: u32,
    pub dbgdscr: u32,
    pub fpexc: u32,
    pub fpscr: u32,
    pub s: [u32; 16],
    /// Every value written to FPEXC, in order.
    pub fpexc_writes: Vec<u32>,
    /// Number of times `s0`-`s15` were stored out.
    pub fp_stores: Cell<usize>,
}

impl FakeRegs {
    /// Fills `s0`-`s15` with a recognizable pattern.
    #[cfg(feature = "fpu-sharing")]
    pub fn with_fp_pattern(mut self) -> Self {
        for (i, s) in self.s.iter_mut().enumerate() {
            *s = 0x3F80_0000 + i as u32;
        }
        self
    }
}

impl FaultRegisters for FakeRegs {
    fn ifsr(&self) -> u32 {
        self.ifsr
    }
    fn ifar(&self) -> u32 {
        self.ifar
    }
    fn dfsr(&self) -> u32 {
        self.dfsr
    }
    fn dfar(&self) -> u32 {
        self.dfar
    }
    fn dbgdscr(&self) -> u32 {
        self.dbgdscr
    }
    fn fpexc(&self) -> u32 {
        self.fpexc
    }
    fn set_fpexc(&mut self, value: u32) {
        self.fpexc = value;
        self.fpexc_writes.push(value);
    }
    fn fpscr(&self) -> u32 {
        self.fpscr
    }
    fn store_low_fp_regs(&self, dest: &mut [u32; 16]) {
        self.fp_stores.set(self.fp_stores.get() + 1);
        *dest = self.s;
    }
}

/// Collects log lines as strings.
#[derive(Debug, Default)]
pub struct RecordingLog {
    pub lines: Vec<String>,
}

impl FaultLog for RecordingLog {
    fn error(&mut self, args: fmt::Arguments<'_>) {
        self.lines.push(args.to_string());
    }
}
