// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel log sink.
//!
//! The kernel doesn't know how to reach a console; board code hands us one
//! with [`install`] during early init (usually a polled UART writer). Until
//! then, and whenever the sink is already in use, lines are dropped.
//!
//! The fault path can land here while the interrupted code was halfway
//! through a line of its own. Waiting for the lock in that case would never
//! finish, so every writer uses `try_lock` and gives up instead.

use core::fmt::{self, Write};

use kerncore::log::FaultLog;
use spin::Mutex;

type Sink = &'static mut (dyn Write + Send);

static SINK: Mutex<Option<Sink>> = Mutex::new(None);

/// Installs the console writer, replacing any previous one.
///
/// Returns `false` if the sink was busy and nothing was changed.
pub fn install(sink: Sink) -> bool {
    match SINK.try_lock() {
        Some(mut slot) => {
            *slot = Some(sink);
            true
        }
        None => false,
    }
}

/// Writes one line to the sink, if there is one and it's free.
pub fn write_line(args: fmt::Arguments<'_>) {
    if let Some(mut slot) = SINK.try_lock() {
        if let Some(sink) = slot.as_mut() {
            // Nowhere to report a console error to.
            sink.write_fmt(args).ok();
            sink.write_str("\n").ok();
        }
    }
}

macro_rules! klog {
    ($($arg:tt)*) => {
        $crate::klog::write_line(format_args!($($arg)*))
    };
}

/// Adapter that routes fault diagnostics into the kernel log at error level.
pub struct Klog;

impl FaultLog for Klog {
    fn error(&mut self, args: fmt::Arguments<'_>) {
        klog!("error: {}", args);
    }
}
