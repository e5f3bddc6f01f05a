// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Uses the `clap` crate
// to parse arguments; all actual work is delegated to Layer 2.
//
// Five commands are supported:
//   1. `validate`       — check a TSV manifest's id coverage
//   2. `show`           — one sample from a wav+JSON dataset
//   3. `show-paq`       — one sample from a wav+PAQ dataset
//   4. `show-quantized` — one sample with a quantized query
//   5. `show-qa`        — one sample from the evaluation set
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use self::commands::Commands;

use crate::application::inspect_use_case::{show_sample, validate_manifest};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "speech-qa-data",
    version = "0.1.0",
    about = "Inspect speech QA dataset joins: manifests, wav features, quantized queries."
)]
pub struct Cli {
    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use
    /// case. The CLI layer only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Validate(args) => {
                let report = validate_manifest(&args.into())?;
                println!(
                    "{} entries, ids {}..={}",
                    report.entries, report.min_id, report.max_id
                );
                if report.gaps.is_empty() {
                    println!("no gaps — index+1 lookup is safe over the full range");
                } else {
                    println!("missing ids: {:?}", report.gaps);
                }
                Ok(())
            }
            Commands::Show(args) => print_sample(args.into()),
            Commands::ShowPaq(args) => print_sample(args.into()),
            Commands::ShowQuantized(args) => print_sample(args.into()),
            Commands::ShowQa(args) => print_sample(args.into()),
        }
    }
}

/// Run one show-style use case and print its summary block.
fn print_sample(config: crate::application::inspect_use_case::ShowConfig) -> Result<()> {
    let summary = show_sample(&config)?;
    print!("{summary}");
    Ok(())
}
