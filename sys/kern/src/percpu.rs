// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-core fault state.
//!
//! One [`CpuSlot`] per logical core, indexed by the core's affinity number.
//! The table is exported as `KERNEL_CPUS` so the vector stubs can find their
//! core's slot without calling into Rust; the layout constants they need are
//! exported by the arch module.
//!
//! There is no lock around a slot. A slot is only ever touched by its own
//! core, and on that core only by code running with further exceptions of the
//! same kind masked. The one exception is the undefined instruction trap,
//! which can nest on top of another handler -- which is precisely the
//! situation `CpuState::nested` exists to describe. For that to be sound, a
//! handler only borrows its slot for as long as it is changing the state in
//! it, never across logging.

use core::ptr::NonNull;

use abi::ThreadBase;
use kerncore::{CpuSlot, CpuState};

use crate::arch;

include!(concat!(env!("OUT_DIR"), "/consts.rs"));

#[repr(transparent)]
pub struct CpuTable([CpuSlot; MAX_CPUS]);

// Safety: each slot is only accessed from the core it belongs to (see module
// docs), so sharing the table between cores never shares a slot.
unsafe impl Sync for CpuTable {}

#[no_mangle]
pub static KERNEL_CPUS: CpuTable =
    CpuTable([const { CpuSlot::new() }; MAX_CPUS]);

/// This core's slot, or `None` if the table was built for fewer cores than
/// the system has.
pub fn current_slot() -> Option<&'static CpuSlot> {
    KERNEL_CPUS.0.get(arch::core_id())
}

/// Runs `body` with the state of the calling core.
///
/// Returns `None` if the calling core has no slot, which means the table was
/// built for fewer cores than the system has.
///
/// # Safety
///
/// Must be called on the core being asked about, with nothing else on that
/// core using the slot, as for [`CpuSlot::with`]. `body` must not log or do
/// anything else that could trap.
pub unsafe fn with_current_cpu<R>(
    body: impl FnOnce(&mut CpuState) -> R,
) -> Option<R> {
    let slot = current_slot()?;
    // Safety: passed through from our caller; no other core ever uses the
    // slot.
    Some(unsafe { slot.with(body) })
}

/// Records entry to an exception level on this core.
///
/// The vector stubs normally do this in assembly, using the exported field
/// offsets. This is for platforms whose stubs call into Rust first.
///
/// # Safety
///
/// As for [`with_current_cpu`]. Must be paired with [`nest_exit`].
pub unsafe fn nest_enter() {
    // Safety: passed through from our caller.
    unsafe { with_current_cpu(CpuState::nest_enter) };
}

/// Records exit from an exception level on this core.
///
/// # Safety
///
/// As for [`with_current_cpu`].
pub unsafe fn nest_exit() {
    // Safety: passed through from our caller.
    unsafe { with_current_cpu(CpuState::nest_exit) };
}

/// Tells the fault handlers which thread is now running on this core.
///
/// Returns `false` if this core has no slot.
///
/// # Safety
///
/// As for [`with_current_cpu`] and [`CpuState::set_current`]. The scheduler
/// calls this on every context switch, with exceptions masked.
pub unsafe fn set_current_thread(thread: Option<NonNull<ThreadBase>>) -> bool {
    // Safety: passed through from our caller.
    unsafe { with_current_cpu(|cpu| cpu.set_current(thread)) }.is_some()
}
