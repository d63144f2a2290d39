use bsformat_rs::errors::FormatError;
use bsformat_rs::standardize::{InputFormat, flip_conversion, is_a_rich, standardize};
use rust_htslib::bam::Record;
use rust_htslib::bam::record::{Aux, Cigar, CigarString};

const FLAG_REVERSE: u16 = 0x10;

fn build_record(flag: u16, seq: &[u8]) -> Record {
    let mut rec = Record::new();
    let cig = CigarString(vec![Cigar::Match(seq.len() as u32)]);
    let qual = vec![30u8; seq.len()];
    rec.set(b"frag1", Some(&cig), seq, &qual);
    rec.set_flags(flag);
    rec.set_tid(0);
    rec.set_pos(100);
    rec.set_mapq(40);
    rec
}

fn aux_char(rec: &Record, tag: &[u8]) -> u8 {
    match rec.aux(tag).unwrap() {
        Aux::Char(c) => c,
        other => panic!("unexpected {tag:?} value: {other:?}"),
    }
}

fn aux_i32(rec: &Record, tag: &[u8]) -> i32 {
    match rec.aux(tag).unwrap() {
        Aux::I32(v) => v,
        other => panic!("unexpected {tag:?} value: {other:?}"),
    }
}

#[test]
fn bsmap_minus_strand_zs_marks_a_rich() {
    let mut rec = build_record(0, b"ACGTACGT");
    rec.push_aux(b"ZS", Aux::String("+-")).unwrap();
    rec.push_aux(b"NM", Aux::I32(2)).unwrap();
    rec.push_aux(b"XA", Aux::String("extraneous")).unwrap();

    standardize(InputFormat::Bsmap, &mut rec).unwrap();

    assert_eq!(aux_char(&rec, b"CV"), b'A');
    assert_eq!(aux_i32(&rec, b"NM"), 2);
    // every mapper-specific tag is dropped
    assert!(rec.aux(b"ZS").is_err());
    assert!(rec.aux(b"XA").is_err());
    assert_eq!(rec.qual(), vec![0xffu8; 8].as_slice());
}

#[test]
fn bsmap_plus_strand_zs_marks_t_rich() {
    let mut rec = build_record(0, b"ACGTACGT");
    rec.push_aux(b"ZS", Aux::String("++")).unwrap();
    rec.push_aux(b"NM", Aux::I32(0)).unwrap();

    standardize(InputFormat::Bsmap, &mut rec).unwrap();
    assert_eq!(aux_char(&rec, b"CV"), b'T');
    assert!(!is_a_rich(&rec).unwrap());
}

#[test]
fn bsmap_reverse_strand_sequence_is_reoriented() {
    let mut rec = build_record(FLAG_REVERSE, b"AACG");
    rec.push_aux(b"ZS", Aux::String("++")).unwrap();
    rec.push_aux(b"NM", Aux::I32(0)).unwrap();

    standardize(InputFormat::Bsmap, &mut rec).unwrap();
    assert_eq!(rec.seq().as_bytes(), b"CGTT".to_vec());
}

#[test]
fn bismark_ga_read_marks_a_rich() {
    let mut rec = build_record(0, b"ACGTACGT");
    rec.push_aux(b"XR", Aux::String("GA")).unwrap();
    rec.push_aux(b"NM", Aux::I32(1)).unwrap();

    standardize(InputFormat::Bismark, &mut rec).unwrap();
    assert_eq!(aux_char(&rec, b"CV"), b'A');
    assert!(is_a_rich(&rec).unwrap());
}

#[test]
fn bismark_ct_read_marks_t_rich() {
    let mut rec = build_record(0, b"ACGTACGT");
    rec.push_aux(b"XR", Aux::String("CT")).unwrap();
    rec.push_aux(b"NM", Aux::I32(1)).unwrap();

    standardize(InputFormat::Bismark, &mut rec).unwrap();
    assert_eq!(aux_char(&rec, b"CV"), b'T');
}

#[test]
fn bsmap_without_zs_is_an_error() {
    let mut rec = build_record(0, b"ACGT");
    rec.push_aux(b"NM", Aux::I32(0)).unwrap();
    let err = standardize(InputFormat::Bsmap, &mut rec).unwrap_err();
    assert!(matches!(err, FormatError::AuxTagMissing { tag: "ZS" }));
}

#[test]
fn abismal_records_pass_through_with_quals_blanked() {
    let mut rec = build_record(0, b"ACGTACGT");
    rec.push_aux(b"NM", Aux::I32(0)).unwrap();
    rec.push_aux(b"CV", Aux::Char(b'T')).unwrap();

    standardize(InputFormat::Abismal, &mut rec).unwrap();
    assert_eq!(aux_char(&rec, b"CV"), b'T');
    assert_eq!(aux_i32(&rec, b"NM"), 0);
    assert_eq!(rec.seq().as_bytes(), b"ACGTACGT".to_vec());
    assert_eq!(rec.qual(), vec![0xffu8; 8].as_slice());
}

#[test]
fn flip_reorients_a_rich_record() {
    let mut rec = build_record(0, b"ACGT");
    rec.push_aux(b"NM", Aux::I32(0)).unwrap();
    rec.push_aux(b"CV", Aux::Char(b'A')).unwrap();

    flip_conversion(&mut rec).unwrap();

    assert_eq!(rec.flags() & FLAG_REVERSE, FLAG_REVERSE);
    assert_eq!(aux_char(&rec, b"CV"), b'T');
    // ACGT is its own reverse complement
    assert_eq!(rec.seq().as_bytes(), b"ACGT".to_vec());

    // flipping back clears the strand bit again
    flip_conversion(&mut rec).unwrap();
    assert_eq!(rec.flags() & FLAG_REVERSE, 0);
}

#[test]
fn flip_reverse_complements_odd_length_sequence() {
    let mut rec = build_record(0, b"AACGT");
    rec.push_aux(b"NM", Aux::I32(0)).unwrap();
    rec.push_aux(b"CV", Aux::Char(b'A')).unwrap();

    flip_conversion(&mut rec).unwrap();
    assert_eq!(rec.seq().as_bytes(), b"ACGTT".to_vec());
}

#[test]
fn missing_cv_is_an_error() {
    let rec = build_record(0, b"ACGT");
    let err = is_a_rich(&rec).unwrap_err();
    assert!(matches!(err, FormatError::AuxTagMissing { tag: "CV" }));
}
