//! Error types for read normalization.

use thiserror::Error;

/// Errors raised while normalizing mapped bisulfite reads. None of these are
/// recovered internally; a per-record failure aborts the whole run.
#[derive(Error, Debug)]
pub enum FormatError {
    /// A CIGAR with no reference-consuming operation cannot be placed on the
    /// reference and cannot be repaired.
    #[error("cigar eats no ref")]
    CigarEatsNoRef,

    #[error("aux tag {tag} not found (invalid input for the requested mapper?)")]
    AuxTagMissing { tag: &'static str },

    #[error("suffix length {suff_len} exceeds min read name length {min_name_len}")]
    SuffixTooLong { suff_len: usize, min_name_len: usize },

    #[error(
        "failed to identify read name suffix length\n\
         verify reads are not single-end\n\
         specify read name suffix length directly"
    )]
    NoValidSuffix,

    #[error("mates are not consecutive in the input")]
    MatesNotAdjacent,

    #[error("incompatible arguments: --single-end cannot be used with --suff")]
    IncompatibleOptions,

    #[error(transparent)]
    Hts(#[from] rust_htslib::errors::Error),
}
