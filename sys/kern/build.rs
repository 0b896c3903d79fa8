// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    generate_consts()?;
    Ok(())
}

fn generate_consts() -> Result<(), Box<dyn std::error::Error>> {
    let out = &PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR unset")?);
    let mut const_file = File::create(out.join("consts.rs"))?;

    // Number of logical cores the kernel keeps fault state for. Cores whose
    // MPIDR affinity number is at or above this are not expected to take
    // exceptions.
    println!("cargo:rerun-if-env-changed=KERN_CPU_COUNT");
    let cpus: usize = match env::var("KERN_CPU_COUNT") {
        Ok(n) => n.parse()?,
        Err(_) => 1,
    };
    if cpus == 0 {
        return Err("KERN_CPU_COUNT must be at least 1".into());
    }

    writeln!(const_file, "// See build.rs for details")?;
    writeln!(const_file, "pub const MAX_CPUS: usize = {cpus};")?;
    Ok(())
}
