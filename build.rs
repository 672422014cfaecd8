// stepper-diag - Build Script
//
// Emits the ESP-IDF environment and the version banner string.

use std::process::Command;

fn main() {
    // ESP-IDF environment setup (MUST be first!)
    embuild::espidf::sysenv::output();

    // Get git version info
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!(
        "cargo:rustc-env=VERSION_STRING=stepper-diag v{}-g{}",
        version, git_hash
    );

    // Rebuild if the FreeRTOS/peripheral configuration changes
    println!("cargo:rerun-if-changed=sdkconfig.defaults");
}
