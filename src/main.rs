mod bam_rec;
mod cigar;
mod cli;
mod errors;
mod header;
mod merge;
mod pipeline;
mod seq;
mod standardize;
mod suffix;
mod types;

use anyhow::{Result, bail};
use clap::Parser;
use errors::FormatError;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Initialize tracing subscriber; diagnostics go to stderr so --stdout
    // output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.single_end && args.suff_len.is_some() {
        return Err(FormatError::IncompatibleOptions.into());
    }
    if args.output.is_some() == args.use_stdout {
        bail!("specify exactly one of an output file and --stdout");
    }

    let cmd = std::env::args().collect::<Vec<_>>().join(" ");

    if args.verbose {
        tracing::info!(
            input = %args.input.display(),
            mapper = args.format.name(),
            configuration = if args.single_end { "SE" } else { "PE" },
            output = %args
                .output
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            output_type = if args.bam { "BAM" } else { "SAM" },
            force = args.force,
            threads = args.threads,
            command = %cmd,
            "starting"
        );
    }

    let suff_len = if args.single_end || args.force {
        args.suff_len.unwrap_or(0)
    } else {
        let names = suffix::load_read_names(&args.input, args.check)?;
        if names.is_empty() {
            bail!("failed to read records from: {}", args.input.display());
        }
        let suff_len = match args.suff_len {
            Some(len) => {
                suffix::check_suff_len(&names, len)?;
                len
            }
            None => {
                let len = suffix::guess_suff_len(&names)?;
                tracing::debug!(suff_len = len, "read name suffix length guess");
                len
            }
        };
        if !suffix::mates_are_adjacent(&names, suff_len) {
            return Err(FormatError::MatesNotAdjacent.into());
        }
        suff_len
    };

    let stats = pipeline::run(&args, &cmd, suff_len)?;
    tracing::info!(
        reads_in = stats.reads_in,
        records_out = stats.records_out,
        mates_merged = stats.mates_merged,
        "bsformat-rs: processing complete"
    );
    Ok(())
}
