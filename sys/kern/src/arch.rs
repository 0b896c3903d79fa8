// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Architecture-specific support.
//!
//! In practice, this works by
//!
//! - Conditionally defining a nested module (below).
//! - `pub use`-ing its contents
//!
//! Thus, all architecture-specific types and functions show up right here in
//! the `arch` module, magically tailored for the current target.
//!
//! For this to work, each architecture support module must define the same set
//! of names: `CpuRegs`, `core_id`, `thread_is_in_user_mode`, and `halt`.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod arm_r;
        pub use arm_r::*;
    } else {
        // Host builds, so the crate can be checked and its dependents
        // linked off-target.
        pub mod fake;
        pub use fake::*;
    }
}
