use bsformat_rs::errors::FormatError;
use bsformat_rs::suffix::{check_suff_len, guess_suff_len, mates_are_adjacent};

fn names(raw: &[&str]) -> Vec<Vec<u8>> {
    raw.iter().map(|s| s.as_bytes().to_vec()).collect()
}

#[test]
fn guess_finds_single_character_suffix() {
    let sample = names(&[
        "frag0001/1",
        "frag0001/2",
        "frag0002/1",
        "frag0002/2",
        "frag0003/1",
        "frag0003/2",
    ]);
    assert_eq!(guess_suff_len(&sample).unwrap(), 1);
}

#[test]
fn guess_finds_longer_suffix() {
    // mates differ in the last two characters
    let sample = names(&["frag0001.aa", "frag0001.bb", "frag0002.aa", "frag0002.bb"]);
    assert_eq!(guess_suff_len(&sample).unwrap(), 2);
}

#[test]
fn guess_rejects_promiscuous_suffix() {
    // three reads would mutually appear as mates at any suffix length that
    // makes names collide
    let sample = names(&["frag0001/1", "frag0001/2", "frag0001/3", "frag0002/1"]);
    let err = guess_suff_len(&sample).unwrap_err();
    assert!(matches!(err, FormatError::NoValidSuffix));
}

#[test]
fn verify_accepts_correct_length() {
    let sample = names(&["frag0001/1", "frag0001/2", "frag0002/1", "frag0002/2"]);
    check_suff_len(&sample, 1).unwrap();
    check_suff_len(&sample, 2).unwrap();
}

#[test]
fn verify_rejects_length_reaching_name_start() {
    let sample = names(&["ab/1", "ab/2"]);
    let err = check_suff_len(&sample, 4).unwrap_err();
    assert!(matches!(
        err,
        FormatError::SuffixTooLong {
            suff_len: 4,
            min_name_len: 4
        }
    ));
}

#[test]
fn verify_rejects_length_collapsing_triples() {
    let sample = names(&["frag0001/1", "frag0001/2", "frag0001/3"]);
    let err = check_suff_len(&sample, 1).unwrap_err();
    assert!(matches!(err, FormatError::NoValidSuffix));
}

#[test]
fn adjacent_mates_pass_the_grouping_check() {
    let sample = names(&[
        "frag0001/1",
        "frag0001/2",
        "frag0002/1",
        "frag0003/1",
        "frag0003/2",
    ]);
    assert!(mates_are_adjacent(&sample, 1));
}

#[test]
fn separated_mates_fail_the_grouping_check() {
    let sample = names(&["frag0001/1", "frag0002/1", "frag0001/2"]);
    assert!(!mates_are_adjacent(&sample, 1));
}
