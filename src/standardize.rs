//! Per-mapper normalization of freshly decoded records.
//!
//! Every supported bisulfite mapper marks conversion (A-rich vs T-rich) its
//! own way; this module rewrites each record to carry exactly the `NM` and
//! `CV` tags, with `CV` one byte, `'A'` or `'T'`. Reverse-strand records are
//! reverse-complemented in their packed encoding so that downstream merging
//! always sees forward-oriented sequence.

use crate::bam_rec;
use crate::errors::FormatError;
use crate::seq;
use clap::ValueEnum;
use rust_htslib::bam::Record;
use rust_htslib::bam::record::Aux;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// abismal output is already in the standard form
    Abismal,
    /// same conventions as abismal
    Walt,
    /// conversion encoded in the second character of the ZS tag
    Bsmap,
    /// conversion encoded in the XR tag string
    Bismark,
}

impl InputFormat {
    pub fn name(self) -> &'static str {
        match self {
            InputFormat::Abismal => "abismal",
            InputFormat::Walt => "walt",
            InputFormat::Bsmap => "bsmap",
            InputFormat::Bismark => "bismark",
        }
    }
}

/// Normalize one record in place: read the mapper's conversion indicator,
/// replace all aux tags with `NM` + `CV`, reverse-complement reverse-strand
/// sequence, and erase the base qualities with the 0xFF missing sentinel.
pub fn standardize(format: InputFormat, rec: &mut Record) -> Result<(), FormatError> {
    match format {
        InputFormat::Abismal | InputFormat::Walt => {}
        InputFormat::Bsmap => {
            // e.g. ZS:Z:++ for top-strand T-rich, ZS:Z:+- for A-rich
            let zs = bam_rec::aux_string(rec, b"ZS")?;
            let cv = if zs.as_bytes().get(1) == Some(&b'-') {
                b'A'
            } else {
                b'T'
            };
            retag(rec, cv)?;
        }
        InputFormat::Bismark => {
            // XR:Z:GA marks the guanine-to-adenine converted (A-rich) read
            let xr = bam_rec::aux_string(rec, b"XR")?;
            let cv = if xr == "GA" { b'A' } else { b'T' };
            retag(rec, cv)?;
        }
    }

    // base qualities carry no signal downstream, whichever mapper produced
    // the record
    bam_rec::qual_mut(rec).fill(0xff);
    Ok(())
}

/// Keep `NM`, discard every other aux tag, append `CV`, and orient the
/// sequence forward.
fn retag(rec: &mut Record, cv: u8) -> Result<(), FormatError> {
    let nm = bam_rec::aux_int(rec, b"NM")?;
    bam_rec::truncate_aux(rec);
    rec.push_aux(b"NM", Aux::I32(nm as i32))?;
    rec.push_aux(b"CV", Aux::Char(cv))?;
    if rec.is_reverse() {
        let qlen = rec.seq_len();
        seq::revcomp_in_place(bam_rec::seq_packed_mut(rec), qlen);
    }
    Ok(())
}

/// Whether the record was mapped from the A-rich (reverse-complement) strand.
pub fn is_a_rich(rec: &Record) -> Result<bool, FormatError> {
    Ok(bam_rec::aux_char(rec, b"CV")? == b'A')
}

/// Re-orient an A-rich record to T-rich: toggle the strand bit,
/// reverse-complement the packed sequence, and rewrite `CV` to `'T'`.
pub fn flip_conversion(rec: &mut Record) -> Result<(), FormatError> {
    let flags = rec.flags() ^ bam_rec::FLAG_REVERSE;
    rec.set_flags(flags);
    let qlen = rec.seq_len();
    seq::revcomp_in_place(bam_rec::seq_packed_mut(rec), qlen);
    // CV is a one-byte value; drop and re-append rather than patching the
    // aux block in place
    rec.remove_aux(b"CV")
        .map_err(|_| FormatError::AuxTagMissing { tag: "CV" })?;
    rec.push_aux(b"CV", Aux::Char(b'T'))?;
    Ok(())
}
