// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Access to the architectural registers the fault handlers consult.

/// FPEXC.EN: the floating-point unit is enabled.
pub const FPEXC_EN: u32 = 1 << 30;

/// The fault-related system registers of an ARMv7-A/R core.
///
/// On hardware these are CP15 (fault status/address), CP14 (debug) and VFP
/// system register accesses. All reads are side-effect free; the only write
/// the fault path ever performs is to FPEXC.
pub trait FaultRegisters {
    /// Instruction Fault Status Register.
    fn ifsr(&self) -> u32;
    /// Instruction Fault Address Register.
    fn ifar(&self) -> u32;
    /// Data Fault Status Register.
    fn dfsr(&self) -> u32;
    /// Data Fault Address Register.
    fn dfar(&self) -> u32;
    /// Debug Status and Control Register.
    fn dbgdscr(&self) -> u32;

    /// Floating-Point Exception Control register.
    fn fpexc(&self) -> u32;
    fn set_fpexc(&mut self, value: u32);
    /// Floating-Point Status and Control Register.
    fn fpscr(&self) -> u32;

    /// Stores `s0` through `s15` into `dest`, in register order.
    ///
    /// Only valid while the floating-point unit is enabled.
    fn store_low_fp_regs(&self, dest: &mut [u32; 16]);
}
