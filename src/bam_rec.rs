//! Helpers over the packed `bam1_t` data block of a rust-htslib [`Record`].
//!
//! rust-htslib exposes the record's variable-length data only piecemeal; the
//! normalizer needs the packed 4-bit sequence and the aux region directly,
//! and needs to assemble whole records from spliced parts. Everything here
//! stays within the `bam1_t` layout: qname (NUL-padded to 4 bytes), CIGAR
//! words, packed sequence, qualities, aux.

use crate::cigar;
use crate::errors::FormatError;
use rust_htslib::bam::Record;
use rust_htslib::bam::record::Aux;
use std::slice;

pub const FLAG_REVERSE: u16 = 0x10;
pub const FLAG_READ1: u16 = 0x40;
pub const FLAG_READ2: u16 = 0x80;

/// The only flag bits that survive on a merged or mate-cleared record.
pub const FLAG_KEEP_MASK: u16 = FLAG_READ1 | FLAG_READ2 | FLAG_REVERSE;

#[inline]
fn seq_offset(rec: &Record) -> usize {
    rec.inner.core.l_qname as usize + 4 * rec.cigar_len()
}

#[inline]
fn aux_offset(rec: &Record) -> usize {
    seq_offset(rec) + rec.seq_len().div_ceil(2) + rec.seq_len()
}

/// The packed 4-bit sequence region, two bases per byte.
pub fn seq_packed(rec: &Record) -> &[u8] {
    let off = seq_offset(rec);
    let n = rec.seq_len().div_ceil(2);
    unsafe { slice::from_raw_parts(rec.inner.data.add(off), n) }
}

pub fn seq_packed_mut(rec: &mut Record) -> &mut [u8] {
    let off = seq_offset(rec);
    let n = rec.seq_len().div_ceil(2);
    unsafe { slice::from_raw_parts_mut(rec.inner.data.add(off), n) }
}

/// The per-base quality region, mutable.
pub fn qual_mut(rec: &mut Record) -> &mut [u8] {
    let off = seq_offset(rec) + rec.seq_len().div_ceil(2);
    let n = rec.seq_len();
    unsafe { slice::from_raw_parts_mut(rec.inner.data.add(off), n) }
}

/// Drop every aux tag by truncating the data block at the aux offset. The
/// allocation is untouched; subsequent `push_aux` calls reuse it.
pub fn truncate_aux(rec: &mut Record) {
    rec.inner.l_data = aux_offset(rec) as i32;
}

/// Reference bases consumed by the record's CIGAR.
pub fn rlen_from_cigar(rec: &Record) -> i64 {
    cigar::rlen(rec.raw_cigar())
}

/// One past the rightmost reference position covered by the alignment.
pub fn endpos(rec: &Record) -> i64 {
    rec.pos() + rlen_from_cigar(rec)
}

/// Integer aux lookup accepting any numeric width.
pub fn aux_int(rec: &Record, tag: &'static [u8; 2]) -> Result<i64, FormatError> {
    let value = rec
        .aux(tag)
        .map_err(|_| missing(tag))?;
    match value {
        Aux::I8(v) => Ok(v as i64),
        Aux::U8(v) => Ok(v as i64),
        Aux::I16(v) => Ok(v as i64),
        Aux::U16(v) => Ok(v as i64),
        Aux::I32(v) => Ok(v as i64),
        Aux::U32(v) => Ok(v as i64),
        _ => Err(missing(tag)),
    }
}

/// Single-character aux lookup.
pub fn aux_char(rec: &Record, tag: &'static [u8; 2]) -> Result<u8, FormatError> {
    match rec.aux(tag).map_err(|_| missing(tag))? {
        Aux::Char(c) => Ok(c),
        _ => Err(missing(tag)),
    }
}

/// String aux lookup, copied out so the record can be mutated afterwards.
pub fn aux_string(rec: &Record, tag: &'static [u8; 2]) -> Result<String, FormatError> {
    match rec.aux(tag).map_err(|_| missing(tag))? {
        Aux::String(s) => Ok(s.to_owned()),
        _ => Err(missing(tag)),
    }
}

fn missing(tag: &'static [u8; 2]) -> FormatError {
    // the two supported mappers and our own output use ASCII tags only
    FormatError::AuxTagMissing {
        tag: std::str::from_utf8(tag).unwrap_or("??"),
    }
}

/// Build `c` from scratch: qname, flags, placement, CIGAR, and a fresh
/// seq/qual block (sequence zeroed for the caller to fill, qualities set to
/// the 0xFF missing sentinel, no aux). The mate fields are cleared. This is
/// the `bam_set1` of the splicing path, expressed through `set_data`.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    c: &mut Record,
    qname: &[u8],
    flag: u16,
    tid: i32,
    pos: i64,
    mapq: u8,
    cig: &[u32],
    isize: i64,
    l_qseq: usize,
) {
    let extranul = (4 - (qname.len() + 1) % 4) % 4;
    let l_qname = qname.len() + 1 + extranul;
    let seq_bytes = l_qseq.div_ceil(2);

    let mut data = Vec::with_capacity(l_qname + 4 * cig.len() + seq_bytes + l_qseq);
    data.extend_from_slice(qname);
    data.resize(l_qname, 0);
    for &word in cig {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data.resize(data.len() + seq_bytes, 0);
    data.resize(data.len() + l_qseq, 0xff);
    c.set_data(&data);

    let core = &mut c.inner.core;
    core.l_qname = l_qname as u16;
    core.l_extranul = extranul as u8;
    core.n_cigar = cig.len() as u32;
    core.l_qseq = l_qseq as i32;
    core.flag = flag;
    core.tid = tid;
    core.pos = pos;
    core.qual = mapq;
    core.mtid = -1;
    core.mpos = -1;
    core.isize_ = isize;
    core.bin = reg2bin(pos, pos + cigar::rlen(cig).max(1)) as u16;
}

/// Replace the record's CIGAR with `cig`, shifting the seq/qual/aux block
/// left by `4 * (old_n - new_n)` bytes when the op count shrank. The new op
/// count must not exceed the old one.
pub fn compact_after_cigar_shrink(rec: &mut Record, cig: &[u32]) {
    let old_n = rec.cigar_len();
    debug_assert!(cig.len() <= old_n);
    let l_qname = rec.inner.core.l_qname as usize;
    let l_data = rec.inner.l_data as usize;
    let tail_start = l_qname + 4 * old_n;

    let data = unsafe { slice::from_raw_parts(rec.inner.data, l_data) };
    let mut out = Vec::with_capacity(l_data - 4 * (old_n - cig.len()));
    out.extend_from_slice(&data[..l_qname]);
    for &word in cig {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.extend_from_slice(&data[tail_start..]);

    rec.set_data(&out);
    rec.inner.core.n_cigar = cig.len() as u32;
}

// hts_reg2bin for the standard 14..28 bit scheme; records without a bin are
// fine for streaming but samtools index expects it to be set.
fn reg2bin(beg: i64, end: i64) -> i64 {
    let end = end - 1;
    if beg >> 14 == end >> 14 {
        return ((1 << 15) - 1) / 7 + (beg >> 14);
    }
    if beg >> 17 == end >> 17 {
        return ((1 << 12) - 1) / 7 + (beg >> 17);
    }
    if beg >> 20 == end >> 20 {
        return ((1 << 9) - 1) / 7 + (beg >> 20);
    }
    if beg >> 23 == end >> 23 {
        return ((1 << 6) - 1) / 7 + (beg >> 23);
    }
    if beg >> 26 == end >> 26 {
        return ((1 << 3) - 1) / 7 + (beg >> 26);
    }
    0
}
