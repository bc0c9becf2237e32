//! Emits the target cfgs and puts `stack-trap.x` on the linker search path

use std::{env, fs, path::PathBuf};

fn main() {
    arm_targets::process();

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("stack-trap.x"), include_bytes!("stack-trap.x"))
        .expect("writing stack-trap.x to OUT_DIR");
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=stack-trap.x");
    println!("cargo:rerun-if-changed=build.rs");
}
