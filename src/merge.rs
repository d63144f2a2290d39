//! Collapse a mate pair into a single fragment record.
//!
//! The two records arrive name-grouped with the positive-strand mate first;
//! [`merge_mates`] classifies their geometric relationship on the reference
//! and splices a fresh record from the packed parts of both. Four cases:
//!
//! ```text
//! gap        [----end1----]______[----end2----]        REF_SKIP spacer
//! overlap    [----end1----[====]----end2----]           splice at the head
//! stacked    [==== end1/end2 ====]---longer tail---]    keep the better end
//! dovetail   [--end2----[======]----end1--]             truncate end1
//! ```

// merge.rs is shared between the library and binary targets.  Items used only
// by one target look "unused" to the other — suppress those false positives.
#![allow(dead_code)]

use crate::bam_rec::{self, FLAG_KEEP_MASK};
use crate::cigar;
use crate::errors::FormatError;
use crate::seq;
use rust_htslib::bam::Record;
use rust_htslib::bam::record::Aux;

/// Fragment length reported when the two records fail the mate precondition.
pub const NOT_MATES: i64 = i64::MIN;

/// Reciprocal mate fields and opposite strands; the caller guarantees `one`
/// is the positive-strand record.
fn are_mates(one: &Record, two: &Record) -> bool {
    one.mtid() == two.tid() && one.mpos() == two.pos() && one.is_reverse() != two.is_reverse()
}

/// Number of leading ops of `cig` that fit entirely within `n_ref_target`
/// reference bases, plus the bases the next op must contribute to reach the
/// target exactly. Ops that consume no reference are always included.
fn get_full_and_partial_ops(cig: &[u32], n_ref_target: u32) -> (usize, u32) {
    let mut rlen = 0u32;
    let mut i = 0;
    while i < cig.len() {
        if cigar::eats_ref(cig[i]) {
            if rlen + cigar::oplen(cig[i]) > n_ref_target {
                break;
            }
            rlen += cigar::oplen(cig[i]);
        }
        i += 1;
    }
    (i, n_ref_target - rlen)
}

/// Build a new record from the prefix of `a` covering `overlap` reference
/// bases. Used for dovetailed pairs, where only the doubly-covered interval
/// is trustworthy.
fn truncate_overlap(a: &Record, overlap: u32) -> Result<Record, FormatError> {
    let a_cig = a.raw_cigar();
    let (c_cur, part_op) = get_full_and_partial_ops(a_cig, overlap);
    let use_partial = c_cur < a_cig.len() && part_op > 0;

    let mut c_cig = a_cig[..c_cur].to_vec();
    if use_partial {
        c_cig.push(cigar::encode(part_op, cigar::op(a_cig[c_cur])));
    }
    // the cigar is set; everything below derives from it
    let c_seq_len = cigar::qlen(&c_cig);
    let isize = cigar::rlen(&c_cig);
    let flag = a.flags() & FLAG_KEEP_MASK;

    let mut c = Record::new();
    bam_rec::assemble(
        &mut c,
        a.qname(),
        flag,
        a.tid(),
        a.pos(),
        a.mapq(),
        &c_cig,
        isize,
        c_seq_len,
    );
    let n_bytes = c_seq_len.div_ceil(2);
    bam_rec::seq_packed_mut(&mut c)[..n_bytes].copy_from_slice(&bam_rec::seq_packed(a)[..n_bytes]);

    let nm = bam_rec::aux_int(a, b"NM")?;
    c.push_aux(b"NM", Aux::I32(nm as i32))?;
    let cv = bam_rec::aux_char(a, b"CV")?;
    c.push_aux(b"CV", Aux::Char(cv))?;
    Ok(c)
}

/// Splice `a` and `b` where `a` contributes `head > 0` reference bases before
/// the overlap and `b` supplies everything from there on. The boundary op of
/// `a` coalesces with the first op of `b` when their op codes agree.
fn merge_overlap(a: &Record, b: &Record, head: u32) -> Result<Record, FormatError> {
    debug_assert!(head > 0);
    let a_cig = a.raw_cigar();
    let b_cig = b.raw_cigar();

    let (mut c_cur, part_op) = get_full_and_partial_ops(a_cig, head);
    let use_partial = c_cur < a_cig.len() && part_op > 0;
    let merge_mid = if use_partial {
        cigar::op(a_cig[c_cur]) == cigar::op(b_cig[0])
    } else {
        cigar::op(a_cig[c_cur - 1]) == cigar::op(b_cig[0])
    };

    let mut c_cig = a_cig[..c_cur].to_vec();
    if use_partial {
        c_cig.push(cigar::encode(part_op, cigar::op(a_cig[c_cur])));
        c_cur += 1;
    }
    // a's query contribution is fixed by its cigar prefix, before any
    // coalescing with the head of b's cigar
    let a_seq_len = cigar::qlen(&c_cig);
    if merge_mid {
        let last = c_cur - 1;
        c_cig[last] = cigar::encode(
            cigar::oplen(c_cig[last]) + cigar::oplen(b_cig[0]),
            cigar::op(b_cig[0]),
        );
    }
    c_cig.extend_from_slice(&b_cig[usize::from(merge_mid)..]);

    let c_seq_len = a_seq_len + b.seq_len();
    let isize = cigar::rlen(&c_cig);
    let flag = a.flags() & FLAG_KEEP_MASK;

    let mut c = Record::new();
    bam_rec::assemble(
        &mut c,
        a.qname(),
        flag,
        a.tid(),
        a.pos(),
        a.mapq(),
        &c_cig,
        isize,
        c_seq_len,
    );
    seq::merge_packed(
        bam_rec::seq_packed(a),
        bam_rec::seq_packed(b),
        bam_rec::seq_packed_mut(&mut c),
        b.seq_len(),
        c_seq_len,
    );

    let nm = bam_rec::aux_int(a, b"NM")? + bam_rec::aux_int(b, b"NM")?;
    c.push_aux(b"NM", Aux::I32(nm as i32))?;
    let cv = bam_rec::aux_char(a, b"CV")?;
    c.push_aux(b"CV", Aux::Char(cv))?;
    Ok(c)
}

/// Concatenate `a` and `b` with a REF_SKIP of `spacer` reference bases
/// between their CIGARs. Nothing coalesces across a skip.
fn merge_non_overlap(a: &Record, b: &Record, spacer: u32) -> Result<Record, FormatError> {
    let a_cig = a.raw_cigar();
    let b_cig = b.raw_cigar();
    let mut c_cig = Vec::with_capacity(a_cig.len() + b_cig.len() + 1);
    c_cig.extend_from_slice(a_cig);
    c_cig.push(cigar::encode(spacer, cigar::CREF_SKIP));
    c_cig.extend_from_slice(b_cig);

    let c_seq_len = a.seq_len() + b.seq_len();
    let isize = cigar::rlen(&c_cig);
    let flag = a.flags() & FLAG_KEEP_MASK;

    let mut c = Record::new();
    bam_rec::assemble(
        &mut c,
        a.qname(),
        flag,
        a.tid(),
        a.pos(),
        a.mapq(),
        &c_cig,
        isize,
        c_seq_len,
    );
    seq::merge_packed(
        bam_rec::seq_packed(a),
        bam_rec::seq_packed(b),
        bam_rec::seq_packed_mut(&mut c),
        b.seq_len(),
        c_seq_len,
    );

    let nm = bam_rec::aux_int(a, b"NM")? + bam_rec::aux_int(b, b"NM")?;
    c.push_aux(b"NM", Aux::I32(nm as i32))?;
    let cv = bam_rec::aux_char(a, b"CV")?;
    c.push_aux(b"CV", Aux::Char(cv))?;
    Ok(c)
}

/// Perfectly stacked starts: copy whichever record consumes more reference
/// (ties keep `one`), clear its mate fields, and strip the flag down to the
/// pairing/strand bits.
fn keep_better_end(one: &Record, two: &Record) -> Record {
    let keep = if bam_rec::rlen_from_cigar(one) >= bam_rec::rlen_from_cigar(two) {
        one
    } else {
        two
    };
    let mut c = keep.clone();
    c.set_mtid(-1);
    c.set_mpos(-1);
    let isize = bam_rec::rlen_from_cigar(&c);
    c.set_insert_size(isize);
    let flag = c.flags() & FLAG_KEEP_MASK;
    c.set_flags(flag);
    c
}

/// Merge a mate pair into one fragment record, returning the merged record
/// (when one can be formed) and the fragment length `two_e - one_s`.
///
/// `one` must be the positive-strand mate. When the records are not
/// reciprocal mates, no record is produced and the fragment length is the
/// [`NOT_MATES`] sentinel. A degenerate dovetail (no residual overlap) also
/// produces no record. The caller decides, from the fragment length, whether
/// to emit the merged record or the two mates separately.
pub fn merge_mates(one: &Record, two: &Record) -> Result<(Option<Record>, i64), FormatError> {
    if !are_mates(one, two) {
        return Ok((None, NOT_MATES));
    }

    let one_s = one.pos();
    let one_e = bam_rec::endpos(one);
    let two_s = two.pos();
    let two_e = bam_rec::endpos(two);

    let spacer = two_s - one_e;
    let merged = if spacer >= 0 {
        Some(merge_non_overlap(one, two, spacer as u32)?)
    } else {
        let head = two_s - one_s;
        if head > 0 {
            Some(merge_overlap(one, two, head as u32)?)
        } else if head == 0 {
            Some(keep_better_end(one, two))
        } else {
            // dovetail: only the interval covered by both ends remains
            let overlap = two_e - one_s;
            if overlap > 0 {
                Some(truncate_overlap(one, overlap as u32)?)
            } else {
                None
            }
        }
    };

    // merging can leave clips interior or insertions external; repair
    let merged = match merged {
        Some(mut m) => {
            cigar::correct_cigar(&mut m)?;
            Some(m)
        }
        None => None,
    };

    Ok((merged, two_e - one_s))
}
