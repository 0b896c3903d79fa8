// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of the fault status and debug status registers.
//!
//! IFSR and DFSR (short-descriptor format) split their five-bit fault status
//! field in two: `FS[3:0]` lives in bits 3:0 and `FS[4]` in bit 10.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Mask for `FS[3:0]` in IFSR/DFSR.
pub const FS0_MASK: u32 = 0xF;
/// Mask for `FS[4]` in IFSR/DFSR.
pub const FS1_MASK: u32 = 1 << 10;

/// Position of the Method of Entry field in DBGDSCR.
pub const MOE_SHIFT: u32 = 2;
/// Mask for the Method of Entry field in DBGDSCR.
pub const MOE_MASK: u32 = 0xF << MOE_SHIFT;

/// Reassembles the five-bit fault status code from a raw IFSR or DFSR value.
#[inline]
pub fn fault_status(fsr: u32) -> u32 {
    ((fsr & FS1_MASK) >> 6) | (fsr & FS0_MASK)
}

/// Extracts the Method of Entry field from a raw DBGDSCR value.
#[inline]
pub fn method_of_entry(dbgdscr: u32) -> u32 {
    (dbgdscr & MOE_MASK) >> MOE_SHIFT
}

/// Fault status codes the kernel knows how to describe.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u32)]
pub enum FaultStatus {
    Background = 0b00000,
    Alignment = 0b00001,
    DebugEvent = 0b00010,
    SyncExternalAbort = 0b01000,
    Permission = 0b01101,
    AsyncExternalAbort = 0b10110,
    AsyncParityError = 0b11000,
    SyncParityError = 0b11001,
}

impl FaultStatus {
    /// Looks up a decoded fault status code. Codes outside the table return
    /// `None` and are reported raw.
    pub fn decode(code: u32) -> Option<Self> {
        Self::from_u32(code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Background => "Background Fault",
            Self::Alignment => "Alignment Fault",
            Self::DebugEvent => "Debug Event",
            Self::SyncExternalAbort => "Synchronous External Abort",
            Self::Permission => "Permission Fault",
            Self::AsyncExternalAbort => "Asynchronous External Abort",
            Self::AsyncParityError => "Asynchronous Parity/ECC Error",
            Self::SyncParityError => "Synchronous Parity/ECC Error",
        }
    }

    /// Asynchronous aborts leave the fault address register UNKNOWN, so it
    /// must never be reported for them.
    pub fn is_async(self) -> bool {
        matches!(self, Self::AsyncExternalAbort | Self::AsyncParityError)
    }
}

/// Debug event causes, from DBGDSCR.MOE.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
#[repr(u32)]
pub enum DebugEntry {
    HaltRequest = 0b0000,
    Breakpoint = 0b0001,
    AsyncWatchpoint = 0b0010,
    BkptInstruction = 0b0011,
    ExtDebugRequest = 0b0100,
    VectorCatch = 0b0101,
    OsUnlockCatch = 0b1000,
    SyncWatchpoint = 0b1010,
}

impl DebugEntry {
    pub fn decode(moe: u32) -> Option<Self> {
        Self::from_u32(moe)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HaltRequest => "Halt Request",
            Self::Breakpoint => "Breakpoint",
            Self::AsyncWatchpoint => "Asynchronous Watchpoint",
            Self::BkptInstruction => "BKPT Instruction",
            Self::ExtDebugRequest => "External Debug Request",
            Self::VectorCatch => "Vector Catch",
            Self::OsUnlockCatch => "OS Unlock Catch",
            Self::SyncWatchpoint => "Synchronous Watchpoint",
        }
    }
}

/// Label for a raw Method of Entry value, `"Unknown"` if unrecognized.
pub fn debug_entry_label(moe: u32) -> &'static str {
    DebugEntry::decode(moe).map_or("Unknown", DebugEntry::label)
}
