use crate::constants::{SAMPLES, SAMPLES_MANIFEST, TARGET};
use anyhow::{Context, Result};
use std::process::Command;

pub fn build_all_samples(release: bool) -> Result<()> {
    for sample in SAMPLES {
        println!("Building {}...", sample);
        build_sample(sample, release)?;
    }
    Ok(())
}

pub fn build_sample(sample: &str, release: bool) -> Result<()> {
    check_sample(sample)?;

    let mut cargo_build = Command::new("cargo");
    cargo_build
        .arg("build")
        .arg("--manifest-path")
        .arg(SAMPLES_MANIFEST)
        .arg("--target")
        .arg(TARGET)
        .args(["--bin", sample]);

    if release {
        cargo_build.arg("--release");
    }

    let status = cargo_build
        .status()
        .with_context(|| format!("Failed to build {}", sample))?;

    if !status.success() {
        anyhow::bail!("Build failed for {}", sample);
    }

    Ok(())
}

pub fn elf_path(sample: &str, release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{}/{}/{}", TARGET, profile, sample)
}

fn check_sample(sample: &str) -> Result<()> {
    if !SAMPLES.contains(&sample) {
        anyhow::bail!(
            "Unknown sample `{}` (expected one of: {})",
            sample,
            SAMPLES.join(", ")
        );
    }
    Ok(())
}
