// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host runs of the fault entry points, playing the vector stub's part by
//! hand. On the host the register file reads as all zeroes and `halt`
//! panics, so a fatal fault shows up as a "kernel halted" panic.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

use abi::{CalleeSaved, ExceptionStackFrame, ThreadBase, ThreadOptions};
use kern::{fault, klog, percpu};
use kerncore::FaultKind;

/// The per-core table and the log sink are global, so tests take turns.
static SERIAL: Mutex<()> = Mutex::new(());
static CAPTURED: Mutex<String> = Mutex::new(String::new());
static INSTALL: Once = Once::new();

struct Capture;

impl fmt::Write for Capture {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        captured().push_str(s);
        Ok(())
    }
}

fn captured() -> MutexGuard<'static, String> {
    CAPTURED.lock().unwrap_or_else(PoisonError::into_inner)
}

fn setup() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    INSTALL.call_once(|| {
        assert!(klog::install(Box::leak(Box::new(Capture))));
    });
    captured().clear();
    guard
}

fn log_lines() -> Vec<String> {
    captured().lines().map(str::to_string).collect()
}

/// Runs a fault that is expected to take the kernel down.
fn expect_halt(kind: FaultKind, esf: *mut ExceptionStackFrame) {
    let cs = CalleeSaved {
        r4: 0x44,
        psp: 0x2000_0F00,
        ..CalleeSaved::default()
    };
    let r = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
        fault::dispatch(kind, esf, &cs)
    }));
    let payload = match r {
        Ok(resumed) => panic!("fault returned {resumed} instead of halting"),
        Err(payload) => payload,
    };
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"kernel halted"));
}

#[test]
fn init_is_harmless() {
    let _g = setup();
    fault::fault_init();
    fault::arm_fault_init();
    assert!(!kern::arch::thread_is_in_user_mode());
    assert!(log_lines().is_empty());
}

#[cfg(feature = "fpu-sharing")]
#[test]
fn first_fp_use_in_thread_is_absorbed() {
    let _g = setup();
    let thread = Box::leak(Box::new(ThreadBase::default()));
    let thread = NonNull::from(thread);

    // What the scheduler and the vector stub would have done.
    unsafe {
        assert!(percpu::set_current_thread(Some(thread)));
        percpu::nest_enter();
    }

    let mut esf = ExceptionStackFrame::default();
    let cs = CalleeSaved::default();
    let fatal = unsafe { fault::arm_fault_undef_instruction(&mut esf, &cs) };

    unsafe {
        percpu::nest_exit();
        assert!(percpu::set_current_thread(None));
    }

    assert!(!fatal);
    let options = unsafe { thread.as_ref().user_options };
    assert!(options.contains(ThreadOptions::FP_REGS));
    let nested = unsafe { percpu::with_current_cpu(|cpu| cpu.nested()) };
    assert_eq!(nested, Some(0));
    assert!(log_lines().is_empty());
}

#[test]
fn data_abort_escalates_once() {
    let _g = setup();
    let mut esf = ExceptionStackFrame::default();
    esf.basic.pc = 0x0800_1234;
    // System mode.
    esf.basic.xpsr = 0x6000_001F;

    unsafe { percpu::nest_enter() };
    expect_halt(FaultKind::DataAbort, &mut esf);
    unsafe { percpu::nest_exit() };

    let mut expected = vec!["error: ***** DATA ABORT *****"];
    if cfg!(feature = "fault-dump-verbose") {
        expected.push("error: Background Fault @ 0x00000000");
    }
    expected.extend([
        "error:  r4: 0x00000044  r5:  0x00000000  r6:  00000000",
        "error:  r7: 0x00000000  r8:  0x00000000  r9:  00000000",
        "error: r10: 0x00000000 r11:  0x00000000 psp:  20000f00",
        "fatal: CPU exception (data abort) pc=0x08001234",
    ]);
    assert_eq!(log_lines(), expected);
}

#[test]
fn prefetch_abort_from_user_mode_is_tagged() {
    let _g = setup();
    let mut esf = ExceptionStackFrame::default();
    esf.basic.pc = 0x0000_2000;
    esf.basic.xpsr = 0x0000_0010;

    expect_halt(FaultKind::PrefetchAbort, &mut esf);

    let lines = log_lines();
    assert_eq!(lines[0], "error: ***** PREFETCH ABORT *****");
    let fatal: Vec<_> =
        lines.iter().filter(|l| l.starts_with("fatal:")).collect();
    assert_eq!(
        fatal,
        ["fatal: CPU exception (prefetch abort) pc=0x00002000 (user)"]
    );
}

#[test]
fn missing_frame_halts_without_classifying() {
    let _g = setup();
    expect_halt(FaultKind::DataAbort, std::ptr::null_mut());
    assert!(log_lines().is_empty());
}
