// header.rs is used only by the binary (BAM I/O path).
#![allow(dead_code)]
use rust_htslib::bam::{self, header::HeaderRecord};

/// Clone the input header and append the program-group line documenting this
/// invocation.
pub fn build_output_header(input: &bam::HeaderView, cmd: &str) -> bam::Header {
    let mut header = bam::Header::from_template(input);
    let mut pg = HeaderRecord::new(b"PG");
    pg.push_tag(b"ID", "DNMTOOLS");
    pg.push_tag(b"VN", env!("CARGO_PKG_VERSION"));
    pg.push_tag(b"CL", cmd);
    header.push_record(&pg);
    header
}

/// Case-insensitive scan for the mapper name in the raw input header text.
/// Purely advisory; mappers differ in whether they record themselves in @PG.
pub fn mentions_format(input: &bam::HeaderView, format_name: &str) -> bool {
    let text = bam::Header::from_template(input)
        .to_bytes()
        .to_ascii_lowercase();
    let needle = format_name.as_bytes().to_ascii_lowercase();
    !needle.is_empty()
        && text
            .windows(needle.len())
            .any(|window| window == needle)
}
