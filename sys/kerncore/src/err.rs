// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fault outcomes.
//!
//! A handler that decides a fault is fatal returns a `FatalError` rather than
//! stopping the machine itself; the kernel's entry point owns the one call
//! into the fatal error routine. A lazy floating-point enable trap is not an
//! error at all and never shows up here.

use core::fmt;

use abi::ReasonCode;

/// The CPU exceptions this subsystem classifies.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FaultKind {
    UndefinedInstruction,
    PrefetchAbort,
    DataAbort,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UndefinedInstruction => "undefined instruction",
            Self::PrefetchAbort => "prefetch abort",
            Self::DataAbort => "data abort",
        })
    }
}

/// A fault that must be escalated to the kernel's fatal error handler.
///
/// `reason` is what the fatal handler gets to see. Every CPU exception is
/// reported as [`ReasonCode::CpuException`]; `kind` is kept only for the
/// post-mortem record, the fatal handler doesn't branch on it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FatalError {
    pub reason: ReasonCode,
    pub kind: FaultKind,
}

impl FatalError {
    pub fn cpu_exception(kind: FaultKind) -> Self {
        Self {
            reason: ReasonCode::CpuException,
            kind,
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reason, self.kind)
    }
}
