// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostic output from the fault path.

use core::fmt;

/// Destination for fault diagnostics.
///
/// Every line the fault handlers produce is error level; there is no other
/// level on this path. Implementations must not fail or block: a line that
/// can't be delivered is dropped.
pub trait FaultLog {
    fn error(&mut self, args: fmt::Arguments<'_>);
}

/// Emits one error-level line to a [`FaultLog`].
macro_rules! fault_log {
    ($log:expr, $($arg:tt)*) => {
        $crate::log::FaultLog::error(&mut *$log, format_args!($($arg)*))
    };
}
