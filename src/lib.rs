//! bsformat-rs: normalize aligned bisulfite-sequencing reads.
//!
//! Consumes mapped reads from any supported bisulfite mapper (abismal, walt,
//! bsmap, bismark) and emits a uniform representation: every surviving
//! record is T-rich on the forward strand, carries exactly the `NM` and `CV`
//! aux tags, and, for paired-end input, adjacent mates are collapsed into a
//! single fragment record whenever their geometry allows it.
//!
//! # Library usage
//!
//! ```no_run
//! use bsformat_rs::merge::merge_mates;
//! use bsformat_rs::standardize::{InputFormat, standardize, flip_conversion, is_a_rich};
//!
//! // Records come from rust_htslib; `one` must be the positive-strand mate.
//! // let mut one: rust_htslib::bam::Record = /* … */;
//! // let mut two: rust_htslib::bam::Record = /* … */;
//! // standardize(InputFormat::Bsmap, &mut one)?;
//! // standardize(InputFormat::Bsmap, &mut two)?;
//! // let (merged, frag_len) = merge_mates(&one, &two)?;
//! ```

// Public modules — the record-transformation API surface, also exercised by
// the integration tests in tests/.
pub mod bam_rec;
pub mod cigar;
pub mod errors;
pub mod merge;
pub mod seq;
pub mod standardize;
pub mod suffix;

// Internal modules — only the binary drives these.
pub(crate) mod cli;
pub(crate) mod header;
pub(crate) mod pipeline;
pub(crate) mod types;

pub use errors::FormatError;
pub use standardize::InputFormat;
