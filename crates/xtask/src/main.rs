mod build;
mod constants;
mod flash;
mod rtt;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Build one sample, or all of them
    Build {
        #[arg(long)]
        bin: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Flash a sample
    Flash {
        #[arg(long)]
        bin: String,
        #[arg(long)]
        release: bool,
        #[arg(long)]
        force: bool,
    },
    /// Build, flash and run a sample with RTT
    Run {
        #[arg(long)]
        bin: String,
        #[arg(long)]
        release: bool,
    },
    /// Attach RTT to a running sample
    Attach {
        #[arg(long)]
        bin: String,
        #[arg(long)]
        release: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Build { bin, release } => {
            match bin {
                Some(bin) => build::build_sample(bin, *release)?,
                None => build::build_all_samples(*release)?,
            }
            println!("Build complete!");
        }
        Commands::Flash { bin, release, force } => {
            flash::flash_sample(bin, *release, *force)?;
        }
        Commands::Run { bin, release } => {
            flash::flash_sample(bin, *release, false)?;

            println!("Attaching RTT...");
            rtt::run(&build::elf_path(bin, *release))?;
        }
        Commands::Attach { bin, release } => {
            rtt::run(&build::elf_path(bin, *release))?;
        }
    }

    Ok(())
}
