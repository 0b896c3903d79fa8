// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CPU fault handling for ARMv7-A/R kernels.
//!
//! This crate is the architecture-bound half of the fault subsystem. The
//! decisions -- what a fault status code means, whether an undefined
//! instruction trap was really a lazy floating-point enable, whether a fault
//! is fatal -- live in `kerncore`, where they can be tested on a host. This
//! crate supplies what `kerncore` deliberately doesn't know about:
//!
//! - the coprocessor register accesses (`arch`),
//! - the per-core state the vector stubs maintain (`percpu`),
//! - somewhere for log lines to go (`klog`),
//! - the `extern "C"` entry points the vector stubs call (`fault`),
//! - and what happens when a fault is fatal (`fail`).
//!
//! The vector stubs themselves belong to the platform. Their side of the
//! contract is spelled out on the entry points in `fault`.

#![cfg_attr(target_os = "none", no_std)]

#[macro_use]
pub mod klog;

pub mod arch;
pub mod fail;
pub mod fault;
pub mod percpu;
