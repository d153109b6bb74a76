//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `studypet_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Tiny probe to validate core crate wiring independently from the
    // request-layer runtime setup.
    println!("studypet_core ping={}", studypet_core::ping());
    println!("studypet_core version={}", studypet_core::core_version());
}
