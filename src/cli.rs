// cli.rs is used only by the binary.
#![allow(dead_code)]
use crate::standardize::InputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bsformat-rs",
    about = "Convert SAM/BAM mapped bs-seq reads to standard dnmtools format",
    version
)]
pub struct Args {
    /// Input SAM/BAM with mapped bisulfite reads
    pub input: PathBuf,

    /// Output path (omit when using --stdout)
    pub output: Option<PathBuf>,

    /// Number of threads for reading and writing
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Output in BAM format
    #[arg(short = 'B', long = "bam")]
    pub bam: bool,

    /// Write to standard output
    #[arg(long = "stdout")]
    pub use_stdout: bool,

    /// Input format
    #[arg(short = 'f', long = "format", value_enum, default_value = "abismal")]
    pub format: InputFormat,

    /// Read name suffix length [do not use with --single-end]
    #[arg(short = 's', long = "suff")]
    pub suff_len: Option<usize>,

    /// Assume single-end reads
    #[arg(long = "single-end")]
    pub single_end: bool,

    /// Maximum allowed insert size
    #[arg(short = 'L', long = "max-frag", default_value_t = i32::MAX as i64)]
    pub max_frag_len: i64,

    /// Check this many reads to validate the read name suffix
    #[arg(short = 'c', long = "check", default_value_t = 1_000_000)]
    pub check: usize,

    /// Force formatting for mixed single and paired reads
    #[arg(short = 'F', long = "force")]
    pub force: bool,

    /// Print more information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
