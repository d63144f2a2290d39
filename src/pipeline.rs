// pipeline.rs is used only by the binary (BAM I/O path).
#![allow(dead_code)]
use crate::cli::Args;
use crate::header;
use crate::merge;
use crate::standardize::{self, InputFormat};
use anyhow::{Result, anyhow, bail};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rust_htslib::bam::{self, Format, Read};

const PROGRESS_UPDATE_INTERVAL: u64 = 1000;

#[derive(Debug, Default)]
pub struct Stats {
    pub reads_in: u64,
    pub records_out: u64,
    pub mates_merged: u64,
}

/// Stream the input once: standardize every record, collapse adjacent mate
/// pairs, re-orient A-rich survivors to T-rich, and write them out in
/// arrival order.
///
/// Only three records are ever live: `prev`, `cur`, and the merged result.
/// `prev` and `cur` trade places with `std::mem::swap`; nothing is deep
/// copied on the fast path.
pub fn run(args: &Args, cmd: &str, suff_len: usize) -> Result<Stats> {
    let mut reader = bam::Reader::from_path(&args.input)?;
    if args.threads > 1 {
        reader.set_threads(args.threads)?;
    }

    let out_header = header::build_output_header(reader.header(), cmd);
    if args.verbose && !header::mentions_format(reader.header(), args.format.name()) {
        tracing::warn!(
            format = args.format.name(),
            input = %args.input.display(),
            "input format not found in header"
        );
    }

    let out_format = if args.bam { Format::Bam } else { Format::Sam };
    let mut writer = match (&args.output, args.use_stdout) {
        (Some(path), false) => bam::Writer::from_path(path, &out_header, out_format)?,
        (None, true) => bam::Writer::from_stdout(&out_header, out_format)?,
        _ => bail!("specify exactly one of an output file and --stdout"),
    };
    if args.threads > 1 {
        writer.set_threads(args.threads)?;
    }

    let progress = if args.verbose {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(2));
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Failed to set progress bar template"),
        );
        pb.set_message("Processing reads...");
        Some(pb)
    } else {
        None
    };

    let mut stats = Stats::default();
    let mut prev = bam::Record::new();
    let mut cur = bam::Record::new();

    match reader.read(&mut prev) {
        Some(res) => res?,
        None => bail!("failed to read records from: {}", args.input.display()),
    }
    stats.reads_in += 1;
    standardize::standardize(args.format, &mut prev)?;

    if args.single_end {
        run_single_end(args.format, reader, &mut writer, prev, &mut stats, &progress)?;
    } else {
        run_paired(
            args,
            reader,
            &mut writer,
            &mut prev,
            &mut cur,
            suff_len,
            &mut stats,
            &progress,
        )?;
    }

    if let Some(pb) = progress {
        pb.finish_with_message(format!("Completed: {} reads processed", stats.reads_in));
    }
    Ok(stats)
}

/// No pairing: each standardized record is re-oriented when A-rich and
/// emitted immediately.
fn run_single_end(
    format: InputFormat,
    mut reader: bam::Reader,
    writer: &mut bam::Writer,
    mut prev: bam::Record,
    stats: &mut Stats,
    progress: &Option<ProgressBar>,
) -> Result<()> {
    emit(writer, &mut prev, stats)?;
    let mut rec = bam::Record::new();
    while let Some(res) = reader.read(&mut rec) {
        res?;
        stats.reads_in += 1;
        tick(progress, stats.reads_in);
        standardize::standardize(format, &mut rec)?;
        emit(writer, &mut rec, stats)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_paired(
    args: &Args,
    mut reader: bam::Reader,
    writer: &mut bam::Writer,
    prev: &mut bam::Record,
    cur: &mut bam::Record,
    suff_len: usize,
    stats: &mut Stats,
    progress: &Option<ProgressBar>,
) -> Result<()> {
    let mut prev_was_merged = false;

    while let Some(res) = reader.read(cur) {
        res?;
        stats.reads_in += 1;
        tick(progress, stats.reads_in);
        standardize::standardize(args.format, cur)?;

        if same_name(prev, cur, suff_len) {
            // the positive-strand mate leads the merge
            if !cur.is_reverse() {
                std::mem::swap(prev, cur);
            }
            let (merged, frag_len) = merge::merge_mates(prev, cur)?;
            match merged {
                Some(mut m) if frag_len > 0 && frag_len < args.max_frag_len => {
                    emit(writer, &mut m, stats)?;
                    stats.mates_merged += 1;
                }
                // fragment out of range, degenerate dovetail, or the mate
                // fields do not reciprocate: keep both ends as they are
                _ => {
                    emit(writer, prev, stats)?;
                    emit(writer, cur, stats)?;
                }
            }
            prev_was_merged = true;
        } else {
            if !prev_was_merged {
                emit(writer, prev, stats)?;
            }
            prev_was_merged = false;
        }
        std::mem::swap(prev, cur);
    }

    if !prev_was_merged {
        emit(writer, prev, stats)?;
    }
    Ok(())
}

/// Re-orient to T-rich when needed, then write.
fn emit(writer: &mut bam::Writer, rec: &mut bam::Record, stats: &mut Stats) -> Result<()> {
    if standardize::is_a_rich(rec)? {
        standardize::flip_conversion(rec)?;
    }
    writer
        .write(rec)
        .map_err(|e| anyhow!("failed to write record: {e}"))?;
    stats.records_out += 1;
    Ok(())
}

/// Byte equality of read names after dropping the learned suffix.
fn same_name(a: &bam::Record, b: &bam::Record, suff_len: usize) -> bool {
    let a_name = a.qname();
    let b_name = b.qname();
    if a_name.len() != b_name.len() || a_name.len() <= suff_len {
        return false;
    }
    a_name[..a_name.len() - suff_len] == b_name[..b_name.len() - suff_len]
}

fn tick(progress: &Option<ProgressBar>, reads: u64) {
    if let Some(pb) = progress
        && reads.is_multiple_of(PROGRESS_UPDATE_INTERVAL)
    {
        pb.set_message(format!("Processed {reads} reads"));
        pb.tick();
    }
}
