use anyhow::{Context, Result};
use std::process::Command;

use crate::build::{build_sample, elf_path};
use crate::constants::CHIP;

pub fn flash_sample(sample: &str, release: bool, force: bool) -> Result<()> {
    build_sample(sample, release)?;

    if force {
        println!("Erasing chip...");
        let mut cmd = Command::new("probe-rs");
        cmd.args(["erase", "--chip", CHIP, "--allow-erase-all"]);
        let status = cmd.status().context("Failed to erase chip")?;
        if !status.success() {
            anyhow::bail!("Failed to erase chip");
        }
    }

    println!("Checking/Flashing {}...", sample);
    let path = elf_path(sample, release);
    let mut cmd = Command::new("probe-rs");
    cmd.args([
        "download",
        "--chip",
        CHIP,
        &path,
        "--preverify",
        "--restore-unwritten",
    ]);

    let status = cmd
        .status()
        .with_context(|| format!("Failed to flash {}", sample))?;
    if !status.success() {
        anyhow::bail!("Failed to flash {}", sample);
    }

    Ok(())
}
