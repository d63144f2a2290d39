use bsformat_rs::cigar::{self, CMATCH, CREF_SKIP};
use bsformat_rs::merge::{NOT_MATES, merge_mates};
use rust_htslib::bam::Record;
use rust_htslib::bam::record::{Aux, Cigar, CigarString};

const FLAG_PAIRED: u16 = 0x1;
const FLAG_REVERSE: u16 = 0x10;
const FLAG_READ1: u16 = 0x40;
const FLAG_READ2: u16 = 0x80;

fn build_end(
    name: &[u8],
    flag: u16,
    pos: i64,
    cig: CigarString,
    seq: &[u8],
    mpos: i64,
    nm: i32,
) -> Record {
    let mut rec = Record::new();
    let qual = vec![255u8; seq.len()];
    rec.set(name, Some(&cig), seq, &qual);
    rec.set_flags(flag);
    rec.set_tid(0);
    rec.set_pos(pos);
    rec.set_mapq(40);
    rec.set_mtid(0);
    rec.set_mpos(mpos);
    rec.push_aux(b"NM", Aux::I32(nm)).unwrap();
    rec.push_aux(b"CV", Aux::Char(b'T')).unwrap();
    rec
}

fn ops(rec: &Record) -> Vec<(u32, u32)> {
    rec.raw_cigar()
        .iter()
        .map(|&c| (cigar::op(c), cigar::oplen(c)))
        .collect()
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
fn gap_between_mates_bridged_with_skip() {
    let one = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ1,
        100,
        CigarString(vec![Cigar::Match(50)]),
        &b"A".repeat(50),
        200,
        1,
    );
    let two = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ2 | FLAG_REVERSE,
        200,
        CigarString(vec![Cigar::Match(50)]),
        &b"T".repeat(50),
        100,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    let merged = merged.unwrap();

    assert_eq!(frag_len, 150);
    assert_eq!(
        ops(&merged),
        vec![(CMATCH, 50), (CREF_SKIP, 50), (CMATCH, 50)]
    );
    assert_eq!(merged.seq_len(), 100);
    assert_eq!(merged.insert_size(), 150);
    assert_eq!(merged.pos(), 100);
    assert_eq!(merged.qname(), b"frag1");
    assert_eq!(merged.flags(), FLAG_READ1);
    assert_eq!(merged.mtid(), -1);
    assert_eq!(merged.mpos(), -1);
    // the reverse mate is reverse-complemented as it is spliced in
    assert_eq!(merged.seq().as_bytes(), b"A".repeat(100));
    assert_eq!(aux_char(&merged, b"CV"), b'T');
    assert_eq!(aux_i32(&merged, b"NM"), 3);
}

#[test]
fn overlapping_mates_coalesce_at_the_junction() {
    let one = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ1,
        100,
        CigarString(vec![Cigar::Match(50)]),
        &b"A".repeat(50),
        130,
        1,
    );
    let two = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ2 | FLAG_REVERSE,
        130,
        CigarString(vec![Cigar::Match(50)]),
        &b"T".repeat(50),
        100,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    let merged = merged.unwrap();

    assert_eq!(frag_len, 80);
    assert_eq!(ops(&merged), vec![(CMATCH, 80)]);
    assert_eq!(merged.seq_len(), 80);
    assert_eq!(merged.insert_size(), 80);
    assert_eq!(merged.pos(), 100);
    assert_eq!(merged.seq().as_bytes(), b"A".repeat(80));
    assert_eq!(aux_i32(&merged, b"NM"), 3);
    // query-consuming cigar lengths account for the whole sequence
    assert_eq!(cigar::qlen(merged.raw_cigar()), merged.seq_len());
}

#[test]
fn stacked_starts_keep_the_longer_end() {
    let one = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ1,
        100,
        CigarString(vec![Cigar::Match(60)]),
        &b"C".repeat(60),
        100,
        1,
    );
    let two = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ2 | FLAG_REVERSE,
        100,
        CigarString(vec![Cigar::Match(50)]),
        &b"G".repeat(50),
        100,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    let merged = merged.unwrap();

    assert_eq!(frag_len, 50);
    assert_eq!(ops(&merged), vec![(CMATCH, 60)]);
    assert_eq!(merged.insert_size(), 60);
    assert_eq!(merged.qname(), b"frag1");
    assert_eq!(merged.flags(), FLAG_READ1);
    assert_eq!(merged.mtid(), -1);
    assert_eq!(merged.mpos(), -1);
    assert_eq!(merged.seq().as_bytes(), b"C".repeat(60));
}

#[test]
fn stacked_starts_keep_the_winning_record_wholesale() {
    // distinct post-suffix names, as real mates carry; when two consumes
    // more reference it is copied as-is, its own qname included
    let one = build_end(
        b"frag0001/1",
        FLAG_PAIRED | FLAG_READ1,
        100,
        CigarString(vec![Cigar::Match(50)]),
        &b"A".repeat(50),
        100,
        1,
    );
    let two = build_end(
        b"frag0001/2",
        FLAG_PAIRED | FLAG_READ2 | FLAG_REVERSE,
        100,
        CigarString(vec![Cigar::Match(70)]),
        &b"G".repeat(70),
        100,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    let merged = merged.unwrap();

    assert_eq!(frag_len, 70);
    assert_eq!(ops(&merged), vec![(CMATCH, 70)]);
    assert_eq!(merged.insert_size(), 70);
    assert_eq!(merged.qname(), b"frag0001/2");
    assert_eq!(merged.flags(), FLAG_READ2 | FLAG_REVERSE);
    assert_eq!(merged.mtid(), -1);
    assert_eq!(merged.mpos(), -1);
    assert_eq!(merged.seq().as_bytes(), b"G".repeat(70));
    assert_eq!(aux_i32(&merged, b"NM"), 2);
}

#[test]
fn dovetailed_mates_truncate_to_the_shared_interval() {
    let one = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ1,
        150,
        CigarString(vec![Cigar::Match(50)]),
        &b"A".repeat(50),
        100,
        1,
    );
    let two = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ2 | FLAG_REVERSE,
        100,
        CigarString(vec![Cigar::Match(80)]),
        &b"T".repeat(80),
        150,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    let merged = merged.unwrap();

    assert_eq!(frag_len, 30);
    assert_eq!(ops(&merged), vec![(CMATCH, 30)]);
    assert_eq!(merged.seq_len(), 30);
    assert_eq!(merged.insert_size(), 30);
    assert_eq!(merged.pos(), 150);
    assert_eq!(merged.seq().as_bytes(), b"A".repeat(30));
    // NM comes from the retained end alone
    assert_eq!(aux_i32(&merged, b"NM"), 1);
}

#[test]
fn degenerate_dovetail_produces_no_record() {
    let one = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ1,
        150,
        CigarString(vec![Cigar::Match(50)]),
        &b"A".repeat(50),
        100,
        1,
    );
    let two = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ2 | FLAG_REVERSE,
        100,
        CigarString(vec![Cigar::Match(30)]),
        &b"T".repeat(30),
        150,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    assert!(merged.is_none());
    assert_eq!(frag_len, -20);
}

#[test]
fn same_strand_records_are_not_mates() {
    let one = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ1,
        100,
        CigarString(vec![Cigar::Match(50)]),
        &b"A".repeat(50),
        200,
        1,
    );
    let two = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ2,
        200,
        CigarString(vec![Cigar::Match(50)]),
        &b"T".repeat(50),
        100,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    assert!(merged.is_none());
    assert_eq!(frag_len, NOT_MATES);
}

#[test]
fn merge_with_indels_keeps_query_accounting() {
    // one: 20M2I20M spans 40 ref bases with 42 query bases
    let one = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ1,
        100,
        CigarString(vec![Cigar::Match(20), Cigar::Ins(2), Cigar::Match(20)]),
        &b"A".repeat(42),
        130,
        1,
    );
    let two = build_end(
        b"frag1",
        FLAG_PAIRED | FLAG_READ2 | FLAG_REVERSE,
        130,
        CigarString(vec![Cigar::Match(50)]),
        &b"T".repeat(50),
        100,
        2,
    );

    let (merged, frag_len) = merge_mates(&one, &two).unwrap();
    let merged = merged.unwrap();

    // one contributes 30 ref bases before two starts: 20M 2I 10M
    assert_eq!(frag_len, 80);
    assert_eq!(
        ops(&merged),
        vec![(CMATCH, 20), (bsformat_rs::cigar::CINS, 2), (CMATCH, 60)]
    );
    assert_eq!(merged.seq_len(), 82);
    assert_eq!(cigar::qlen(merged.raw_cigar()), merged.seq_len());
    assert_eq!(merged.insert_size(), 80);
}
