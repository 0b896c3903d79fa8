// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fatal error handling, and the record it leaves for debuggers.
//!
//! This module defines the following binary interface to debuggers:
//!
//! - `KERNEL_HAS_FAILED` is a `bool`. It is zero (false) in the loaded image,
//!   and set to one (true) once the kernel reaches `die`, whether from a fatal
//!   CPU exception or a `panic!`. Any other value means memory was corrupted
//!   on the way down.
//!
//! - `KERNEL_EPITAPH` is an array of `u8`. `die` writes as much of the
//!   failure description into it (as UTF-8) as fits, truncating if it fills.
//!   The length isn't recorded; trim trailing NULs before printing.

use core::fmt::{self, Display, Write};
use core::sync::atomic::{self, Ordering};

use abi::{ExceptionStackFrame, ReasonCode};
use kerncore::cpu;
use kerncore::FatalError;
use num_traits::FromPrimitive;

use crate::arch;

/// Set by every failure path, giving tools a single flag to check.
#[no_mangle]
#[used]
static mut KERNEL_HAS_FAILED: bool = false;

const EPITAPH_LEN: usize = 128;

/// Up to `EPITAPH_LEN` bytes describing why the kernel failed, NUL padded.
#[no_mangle]
#[used]
static mut KERNEL_EPITAPH: [u8; EPITAPH_LEN] = [0; EPITAPH_LEN];

fn begin_epitaph() -> &'static mut [u8; EPITAPH_LEN] {
    // Safety: by the time anyone gets here the machine is going down, and
    // the swap below lets only the first caller through.
    let previous_fail = unsafe {
        core::ptr::replace(core::ptr::addr_of_mut!(KERNEL_HAS_FAILED), true)
    };
    if previous_fail {
        // We failed while failing. Anything more we try is likely to make
        // it worse, so just stop.
        arch::halt();
    }

    // Safety: only one execution of this function gets past the flag.
    unsafe { &mut *core::ptr::addr_of_mut!(KERNEL_EPITAPH) }
}

/// Records `msg` as the epitaph and stops this core.
#[inline(always)]
pub fn die(msg: impl Display) -> ! {
    die_impl(&msg)
}

#[inline(never)]
fn die_impl(msg: &dyn Display) -> ! {
    let buf = begin_epitaph();
    let mut writer = Eulogist { dest: buf };
    write!(writer, "{msg}").ok();

    // Make sure the epitaph is in memory before a debugger can stop us.
    atomic::fence(Ordering::SeqCst);
    arch::halt()
}

struct Eulogist {
    dest: &'static mut [u8],
}

impl Write for Eulogist {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let s = s.as_bytes();
        let n = s.len().min(self.dest.len());
        let (dest, leftovers) = {
            let taken = core::mem::take(&mut self.dest);
            taken.split_at_mut(n)
        };
        dest.copy_from_slice(&s[..n]);
        self.dest = leftovers;
        Ok(())
    }
}

/// What the fatal path knows about the context that faulted.
struct Fatal<'a> {
    what: &'a dyn Display,
    pc: u32,
    user: bool,
}

impl Display for Fatal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pc={:#010x}", self.what, self.pc)?;
        if self.user {
            f.write_str(" (user)")?;
        }
        Ok(())
    }
}

fn fatal_impl(what: &dyn Display, esf: &ExceptionStackFrame) -> ! {
    let fatal = Fatal {
        what,
        pc: esf.basic.pc,
        user: cpu::mode_is_user(esf.basic.xpsr),
    };
    klog!("fatal: {}", fatal);
    die(fatal)
}

/// Takes the system down in response to a fault the handlers couldn't
/// resolve.
pub fn fatal_error(err: FatalError, esf: &ExceptionStackFrame) -> ! {
    fatal_impl(&err, esf)
}

/// Fatal error entry point for assembly and other non-Rust callers.
///
/// `reason` is a [`ReasonCode`] value; anything unrecognized is reported as a
/// kernel panic.
///
/// # Safety
///
/// `esf` must point to a valid exception stack frame.
#[no_mangle]
pub unsafe extern "C" fn arm_fatal_error(
    reason: u32,
    esf: *const ExceptionStackFrame,
) -> ! {
    let reason = ReasonCode::from_u32(reason).unwrap_or(ReasonCode::KernelPanic);
    // Safety: per our contract.
    match unsafe { esf.as_ref() } {
        Some(esf) => fatal_impl(&reason, esf),
        None => {
            klog!("fatal: {}", reason);
            die(reason)
        }
    }
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo<'_>) -> ! {
    klog!("panic: {}", info);
    die(info)
}
