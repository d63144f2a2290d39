//! Read-name suffix discovery for mate pairing.
//!
//! Paired-end mappers name the two ends of a template identically except for
//! a short suffix ("/1", ".R2", ...). Rather than hard-code conventions, the
//! suffix length is learned from a sample of names taken from the head of
//! the stream: the smallest length at which consecutive sorted names start
//! colliding is the one that makes mates share a prefix. A length that makes
//! *more* than two names collide would pair reads promiscuously and is
//! rejected.

use crate::errors::FormatError;
use crate::types::{HashMap, HashMapExt};
use rust_htslib::bam::{self, Read};
use std::path::Path;

/// Collect up to `n_reads` read names from the head of the input.
pub fn load_read_names(path: &Path, n_reads: usize) -> Result<Vec<Vec<u8>>, FormatError> {
    let mut reader = bam::Reader::from_path(path)?;
    let mut names = Vec::new();
    let mut rec = bam::Record::new();
    while names.len() < n_reads {
        match reader.read(&mut rec) {
            None => break,
            Some(res) => {
                res?;
                names.push(rec.qname().to_vec());
            }
        }
    }
    Ok(names)
}

/// Longest run of consecutive names (sorted input) of equal length sharing
/// the prefix that remains after dropping `suff_len` bytes. Stops counting at
/// 2: any value that large already disqualifies the suffix length.
fn max_repeat_count(names: &[Vec<u8>], suff_len: usize) -> usize {
    let mut repeat_count = 0;
    let mut run = 0;
    for i in 1..names.len() {
        if repeat_count >= 2 {
            break;
        }
        let prev = &names[i - 1];
        let cur = &names[i];
        if prev.len() == cur.len() && prev[..prev.len() - suff_len] == cur[..cur.len() - suff_len] {
            run += 1;
        } else {
            run = 0;
        }
        repeat_count = repeat_count.max(run);
    }
    repeat_count
}

fn min_name_len(names: &[Vec<u8>]) -> usize {
    names.iter().map(|n| n.len()).min().unwrap_or(0)
}

/// Find the smallest suffix length at which sampled names begin to pair up.
///
/// Walks candidate lengths upward until the repeat count becomes nonzero; a
/// count of exactly 1 means mates, anything larger means no suffix length
/// cleanly separates pairs and the input is likely single-end.
pub fn guess_suff_len(names: &[Vec<u8>]) -> Result<usize, FormatError> {
    let mut sorted = names.to_vec();
    sorted.sort_unstable();

    let mut suff_len = 0;
    let mut repeat_count = 0;
    let max_suff_len = min_name_len(names).saturating_sub(1);
    while suff_len < max_suff_len && repeat_count == 0 {
        repeat_count = max_repeat_count(&sorted, suff_len);
        if repeat_count == 0 {
            suff_len += 1;
        }
    }
    if repeat_count > 1 {
        return Err(FormatError::NoValidSuffix);
    }
    Ok(suff_len)
}

/// Validate a user-supplied suffix length against the sampled names.
pub fn check_suff_len(names: &[Vec<u8>], suff_len: usize) -> Result<(), FormatError> {
    let min_name_len = min_name_len(names);
    if min_name_len <= suff_len {
        return Err(FormatError::SuffixTooLong {
            suff_len,
            min_name_len,
        });
    }
    let mut sorted = names.to_vec();
    sorted.sort_unstable();
    if max_repeat_count(&sorted, suff_len) >= 2 {
        return Err(FormatError::NoValidSuffix);
    }
    Ok(())
}

/// Whether every name that recurs (after suffix stripping) does so at the
/// very next position. Runs over the sample in stream order; a mate showing
/// up later than immediately after its partner means the input is not
/// name-grouped.
pub fn mates_are_adjacent(names: &[Vec<u8>], suff_len: usize) -> bool {
    let mut first_seen: HashMap<&[u8], usize> = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        let stripped = if name.len() > suff_len {
            &name[..name.len() - suff_len]
        } else {
            name.as_slice()
        };
        match first_seen.get(stripped) {
            None => {
                first_seen.insert(stripped, i);
            }
            Some(&prev) if prev + 1 != i => return false,
            Some(_) => {}
        }
    }
    true
}
