// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Portable core of the AArch32 Cortex-A/R fault handlers.
//!
//! Everything in here is independent of how registers are actually read and
//! of where log output goes: the kernel binds [`regs::FaultRegisters`] to the
//! coprocessor registers and [`log::FaultLog`] to its console, and host tests
//! bind them to fakes. That keeps the interesting logic -- status decoding and
//! the lazy floating-point bookkeeping -- testable without a target.
//!
//! The handlers themselves never halt the machine. A fault they consider fatal
//! comes back as an `Err(FatalError)`, and the kernel's top-level entry point
//! is responsible for handing that to the system fatal error routine.

// Allow std-y things to be used in test. Note that this attribute is a bit of a
// trap for the programmer, because rust-analyzer by default seems to build
// things with test set. This means it's easy to introduce code incompatible
// with no_std without your editor hassling you about it. Beware.
#![cfg_attr(not(test), no_std)]
#![forbid(clippy::wildcard_imports)]

#[macro_use]
pub mod log;

pub mod cpu;
pub mod dump;
pub mod err;
pub mod fault;
#[cfg(feature = "fpu-sharing")]
pub mod fpu;
pub mod fsr;
pub mod regs;

#[cfg(test)]
mod testutil;

pub use cpu::{CpuSlot, CpuState};
pub use err::{FatalError, FaultKind};
pub use fault::{FaultConfig, FaultContext};
