pub const TARGET: &str = "thumbv7em-none-eabihf";
pub const CHIP: &str = "nRF52840_xxAA";
pub const SAMPLES_MANIFEST: &str = "crates/notecard-samples/Cargo.toml";

/// Sample binaries in `crates/notecard-samples/src/bin`.
pub const SAMPLES: &[&str] =
    &["card_version", "attention", "presence", "uart_version"];
