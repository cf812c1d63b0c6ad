//! Build script for edugen-ai
//!
//! Stamps the binary with the commit it was built from and when, so the
//! health endpoint and startup log can identify a deployment.

use std::process::Command;

fn main() {
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=EDUGEN_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=EDUGEN_BUILT_AT={}", built_at);
    println!("cargo:rustc-env=EDUGEN_BUILD_PROFILE={}", profile);
}
