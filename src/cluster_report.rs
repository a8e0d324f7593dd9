//! Reader for CD-HIT style `.clstr` cluster reports.
//!
//! A report is a sequence of blocks:
//! ```text
//! >Cluster 0
//! 0	1023nt, >[4][17][cluster_230] lcl|NZ_CP0001_cds_WP_0001.1_17 *
//! 1	990nt, >[5][3][pseudo] lcl|NZ_CP0002_cds_5 at +/95.00%
//! >Cluster 1
//! ...
//! ```
//! Each member line is reduced to a [`MemberRecord`]; nothing downstream
//! re-reads the raw text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::ReportError;
use crate::types::{ClusterBlock, ClusterIndex, MemberRecord};

pub const HEADER_PATTERN: &str = "`>Cluster <integer>`";
pub const STRAIN_SEQ_PATTERN: &str = "`[<strainIndex>][<seqIndex>]`";
pub const LENGTH_PATTERN: &str = "`<integer>nt,` length field";

const HEADER_PREFIX: &str = ">Cluster";
const CLUSTER_TAG_PREFIX: &str = "[cluster_";
const PSEUDO_FRAGMENT: &str = "[pseudo";

/// Which clustering pass produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Stage-1, protein sequences (`cd-hit`).
    Protein,
    /// Stage-2, CDS nucleotide sequences (`cd-hit-est`); length is mandatory.
    Nucleotide,
}

/// Classification of a single raw report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Blank,
    Header(ClusterIndex),
    Member(MemberRecord),
}

/// Classify one line of a report. `line_no` is only used for diagnostics.
pub fn classify_line(line: &str, line_no: usize, stage: Stage) -> Result<ReportLine, ReportError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ReportLine::Blank);
    }
    if trimmed.starts_with(HEADER_PREFIX) {
        return trimmed
            .split_whitespace()
            .nth(1)
            .and_then(|id| id.parse::<ClusterIndex>().ok())
            .map(ReportLine::Header)
            .ok_or_else(|| format_error(line_no, line, HEADER_PATTERN));
    }
    parse_member(trimmed, line_no, stage).map(ReportLine::Member)
}

/// Tokenize a member line into its structured fields.
pub fn parse_member(line: &str, line_no: usize, stage: Stage) -> Result<MemberRecord, ReportError> {
    let (strain, seq, rest) =
        find_strain_seq(line).ok_or_else(|| format_error(line_no, line, STRAIN_SEQ_PATTERN))?;

    let is_representative = line.trim_end().ends_with('*');
    let tagged_cluster = parse_cluster_tag(rest);

    let (length, is_pseudogene) = match stage {
        Stage::Protein => (find_length(length_field_region(line)), false),
        Stage::Nucleotide => {
            let length = find_length(length_field_region(line))
                .ok_or_else(|| format_error(line_no, line, LENGTH_PATTERN))?;
            (Some(length), opens_pseudo_fragment(rest))
        }
    };

    Ok(MemberRecord {
        strain,
        seq,
        length,
        is_pseudogene,
        tagged_cluster,
        is_representative,
    })
}

/// Locate the first `[<digits>][<digits>]` in `line`.
/// Returns the two numbers and the remainder of the line after the closing bracket.
fn find_strain_seq(line: &str) -> Option<(u32, u32, &str)> {
    let bytes = line.as_bytes();
    let mut start = 0;
    while let Some(offset) = line[start..].find('[') {
        let open = start + offset;
        if let Some((strain, after_first)) = bracketed_number(bytes, open) {
            if let Some((seq, after_second)) = bracketed_number(bytes, after_first) {
                return Some((strain, seq, &line[after_second..]));
            }
        }
        start = open + 1;
    }
    None
}

/// Parse `[<digits>]` starting at `open`; returns the number and the index past `]`.
fn bracketed_number(bytes: &[u8], open: usize) -> Option<(u32, usize)> {
    if bytes.get(open) != Some(&b'[') {
        return None;
    }
    let digits_start = open + 1;
    let mut end = digits_start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start || bytes.get(end) != Some(&b']') {
        return None;
    }
    let value = std::str::from_utf8(&bytes[digits_start..end]).ok()?.parse().ok()?;
    Some((value, end + 1))
}

/// The first bracketed fragment after the strain/seq brackets is `[pseudo...`,
/// or a prefix of it cut off by the end of the line (`[p`).
fn opens_pseudo_fragment(rest: &str) -> bool {
    let Some(open) = rest.find('[') else {
        return false;
    };
    let fragment = rest[open..].trim_end();
    fragment.starts_with(PSEUDO_FRAGMENT)
        || (fragment.len() >= 2 && !fragment.contains(']') && PSEUDO_FRAGMENT.starts_with(fragment))
}

fn parse_cluster_tag(rest: &str) -> Option<ClusterIndex> {
    let tail = rest.strip_prefix(CLUSTER_TAG_PREFIX)?;
    let close = tail.find(']')?;
    tail[..close].parse().ok()
}

/// Text that may hold the length field: everything before the `>[` that opens
/// the sequence name, or the whole line when there is no such marker.
fn length_field_region(line: &str) -> &str {
    match line.find(">[") {
        Some(name_start) => &line[..name_start],
        None => line,
    }
}

/// First `<digits>nt,` field in `line`.
fn find_length(line: &str) -> Option<u32> {
    let bytes = line.as_bytes();
    let mut start = 0;
    while let Some(offset) = line[start..].find("nt,") {
        let marker = start + offset;
        let mut digits_start = marker;
        while digits_start > 0 && bytes[digits_start - 1].is_ascii_digit() {
            digits_start -= 1;
        }
        if digits_start < marker {
            if let Ok(length) = line[digits_start..marker].parse() {
                return Some(length);
            }
        }
        start = marker + 3;
    }
    None
}

fn format_error(line_no: usize, line: &str, expected: &'static str) -> ReportError {
    ReportError::Format {
        line_no,
        line: line.trim_end().to_string(),
        expected,
    }
}

/// Parser state: either between blocks or accumulating one.
#[derive(Debug)]
enum ParserState {
    NoOpenCluster,
    OpenCluster {
        id: ClusterIndex,
        header_line: usize,
        members: Vec<MemberRecord>,
    },
}

/// Streaming block reader. Yields one [`ClusterBlock`] per `>Cluster` header;
/// a block is flushed when the next header arrives or the input ends.
pub struct ReportParser<R: BufRead> {
    reader: R,
    stage: Stage,
    state: ParserState,
    line_no: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead> ReportParser<R> {
    pub fn new(reader: R, stage: Stage) -> Self {
        Self {
            reader,
            stage,
            state: ParserState::NoOpenCluster,
            line_no: 0,
            buf: String::with_capacity(256),
            done: false,
        }
    }

    fn flush(&mut self, next: ParserState) -> Result<Option<ClusterBlock>, ReportError> {
        match std::mem::replace(&mut self.state, next) {
            ParserState::NoOpenCluster => Ok(None),
            ParserState::OpenCluster { id, header_line, members } => {
                if members.is_empty() {
                    return Err(ReportError::EmptyCluster {
                        line_no: header_line,
                        cluster: id,
                    });
                }
                Ok(Some(ClusterBlock { id, members }))
            }
        }
    }

    fn next_block(&mut self) -> Result<Option<ClusterBlock>, ReportError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                self.done = true;
                return self.flush(ParserState::NoOpenCluster);
            }
            self.line_no += 1;

            match classify_line(&self.buf, self.line_no, self.stage)? {
                ReportLine::Blank => continue,
                ReportLine::Header(id) => {
                    let next = ParserState::OpenCluster {
                        id,
                        header_line: self.line_no,
                        members: Vec::new(),
                    };
                    if let Some(block) = self.flush(next)? {
                        return Ok(Some(block));
                    }
                }
                ReportLine::Member(record) => match &mut self.state {
                    ParserState::OpenCluster { members, .. } => members.push(record),
                    ParserState::NoOpenCluster => {
                        return Err(ReportError::MemberOutsideCluster {
                            line_no: self.line_no,
                            line: self.buf.trim_end().to_string(),
                        })
                    }
                },
            }
        }
    }
}

impl<R: BufRead> Iterator for ReportParser<R> {
    type Item = Result<ClusterBlock, ReportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Opens a report file for streaming.
pub fn open_report<P: AsRef<Path>>(path: P, stage: Stage) -> Result<ReportParser<BufReader<File>>, ReportError> {
    let file = File::open(path.as_ref())?;
    log::debug!("Reading {:?} cluster report {}", stage, path.as_ref().display());
    Ok(ReportParser::new(BufReader::new(file), stage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn blocks(text: &str, stage: Stage) -> Result<Vec<ClusterBlock>, ReportError> {
        ReportParser::new(Cursor::new(text.as_bytes()), stage).collect()
    }

    #[test]
    fn test_protein_member_line() {
        let rec = parse_member("0\t345aa, >[12][7]WP_003085.1 hypothetical protein... *", 1, Stage::Protein).unwrap();
        assert_eq!(rec.strain, 12);
        assert_eq!(rec.seq, 7);
        assert!(rec.is_representative);
        assert!(!rec.is_pseudogene);
        assert_eq!(rec.length, None);

        let rec = parse_member("1\t340aa, >[3][5]WP_1... at 97.35%", 2, Stage::Protein).unwrap();
        assert!(!rec.is_representative);
    }

    #[test]
    fn test_nucleotide_member_lines() {
        let rep = parse_member("[0][1] 300nt,*", 1, Stage::Nucleotide).unwrap();
        assert_eq!((rep.strain, rep.seq, rep.length), (0, 1, Some(300)));
        assert!(rep.is_representative);
        assert!(!rep.is_pseudogene);

        let pseudo = parse_member("[1][2] 290nt,[p", 2, Stage::Nucleotide).unwrap();
        assert_eq!(pseudo.length, Some(290));
        assert!(pseudo.is_pseudogene);

        let pseudo = parse_member("1\t290nt, >[1][2][pseudo] lcl|x_2 at +/91.03%", 2, Stage::Nucleotide).unwrap();
        assert!(pseudo.is_pseudogene);
        assert_eq!(pseudo.tagged_cluster, None);

        let tagged = parse_member("0\t1023nt, >[4][17][cluster_230] lcl|x_17 *", 3, Stage::Nucleotide).unwrap();
        assert_eq!(tagged.tagged_cluster, Some(230));
        assert!(tagged.is_representative);
        assert!(!tagged.is_pseudogene);

        let described = parse_member("0\t990nt, >[4][17][cluster_2] x [protein=y] [pseudo=true]", 4, Stage::Nucleotide).unwrap();
        assert!(!described.is_pseudogene, "only the fragment right after the indices counts");

        let qualifier = parse_member("0\t300nt, >[4][17] lcl|x [protein=dnaA] *", 5, Stage::Nucleotide).unwrap();
        assert!(!qualifier.is_pseudogene);
        let qualifier = parse_member("0\t300nt, >[4][17] lcl|x [protein_id=WP_1.1] *", 6, Stage::Nucleotide).unwrap();
        assert!(!qualifier.is_pseudogene);

        let truncated = parse_member("[1][3] 120nt,[pse", 7, Stage::Nucleotide).unwrap();
        assert!(truncated.is_pseudogene);
    }

    #[test]
    fn test_missing_length_is_fatal_for_nucleotides() {
        let err = parse_member("0\t>[4][17][cluster_230] *", 9, Stage::Nucleotide).unwrap_err();
        match err {
            ReportError::Format { line_no, expected, .. } => {
                assert_eq!(line_no, 9);
                assert_eq!(expected, LENGTH_PATTERN);
            }
            other => panic!("unexpected error {other:?}"),
        }
        // a length-like token inside the sequence name is not the length field
        let err = parse_member("0\t>[4][17][cluster_1] name 12nt, *", 10, Stage::Nucleotide).unwrap_err();
        assert!(matches!(err, ReportError::Format { line_no: 10, expected: LENGTH_PATTERN, .. }));

        // the same line is fine for proteins
        assert!(parse_member("0\t>[4][17] *", 9, Stage::Protein).is_ok());
    }

    #[test]
    fn test_bad_member_line_is_fatal() {
        let text = ">Cluster 0\n0\t345aa, >[0][1]x *\n1\t300aa, >WP_1 at 90%\n";
        let err = blocks(text, Stage::Protein).unwrap_err();
        match err {
            ReportError::Format { line_no, line, expected } => {
                assert_eq!(line_no, 3);
                assert!(line.contains("WP_1"));
                assert_eq!(expected, STRAIN_SEQ_PATTERN);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_blocks_are_flushed_on_header_and_eof() {
        let text = "\
>Cluster 0
0\t345aa, >[0][1]a *
1\t345aa, >[1][1]b at 99%

>Cluster 7
0\t120aa, >[2][9]c *
";
        let parsed = blocks(text, Stage::Protein).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, 0);
        assert_eq!(parsed[0].members.len(), 2);
        assert_eq!(parsed[1].id, 7);
        assert_eq!(parsed[1].members[0].seq, 9);
    }

    #[test]
    fn test_member_before_header() {
        let err = blocks("0\t345aa, >[0][1]a *\n", Stage::Protein).unwrap_err();
        assert!(matches!(err, ReportError::MemberOutsideCluster { line_no: 1, .. }));
    }

    #[test]
    fn test_empty_cluster_rejected() {
        let err = blocks(">Cluster 0\n>Cluster 1\n0\t1aa, >[0][1]a *\n", Stage::Protein).unwrap_err();
        assert!(matches!(err, ReportError::EmptyCluster { cluster: 0, line_no: 1 }));
    }

    #[test]
    fn test_bad_header() {
        let err = blocks(">Cluster x\n", Stage::Protein).unwrap_err();
        assert!(matches!(err, ReportError::Format { expected: HEADER_PATTERN, .. }));
    }

    #[test]
    fn test_leading_brackets_that_are_not_indices() {
        let rec = parse_member("0\t88aa, >[gene=x][0][4]y *", 1, Stage::Protein).unwrap();
        assert_eq!((rec.strain, rec.seq), (0, 4));
    }
}
