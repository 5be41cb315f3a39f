//! Build script for hydria-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Stamps the build time as the initial wall-clock setting

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    setup_linker();
    stamp_build_time();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Export the build time as `HYDRIA_BUILD_EPOCH` (Unix seconds)
///
/// Boards without a battery-backed RTC boot with this as their clock.
/// Set `HYDRIA_NO_BUILD_CLOCK` to leave the clock unset so the firmware
/// starts in configuration mode.
fn stamp_build_time() {
    println!("cargo:rerun-if-env-changed=HYDRIA_NO_BUILD_CLOCK");
    if env::var_os("HYDRIA_NO_BUILD_CLOCK").is_some() {
        return;
    }

    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => {
            println!("cargo:rustc-env=HYDRIA_BUILD_EPOCH={}", since_epoch.as_secs());
        }
        Err(_) => {
            println!("cargo:warning=host clock is before 1970, not stamping build time");
        }
    }
}
