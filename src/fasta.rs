use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

/// Line width used when writing sequences back out.
pub const FASTA_LINE_WIDTH: usize = 60;

/// One FASTA record. `header` is the full header line without `>`;
/// `id` is its first whitespace-separated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub header: String,
    pub seq: String,
}

impl FastaRecord {
    /// The header text after the id, if any.
    pub fn description(&self) -> &str {
        self.header.trim_start()[self.id.len()..].trim_start()
    }
}

/// Streaming FASTA reader over any `BufRead`.
pub struct FastaReader<R: BufRead> {
    reader: R,
    line: String,
    pending_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::with_capacity(256),
            pending_header: None,
        }
    }

    /// Reads the next record, `Ok(None)` at EOF. Text before the first header is skipped.
    pub fn next_record(&mut self) -> io::Result<Option<FastaRecord>> {
        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                self.line.clear();
                if self.reader.read_line(&mut self.line)? == 0 {
                    return Ok(None);
                }
                if let Some(h) = self.line.trim_end().strip_prefix('>') {
                    break h.to_string();
                }
            },
        };

        let mut seq = String::new();
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                break;
            }
            let trimmed = self.line.trim_end();
            if let Some(next) = trimmed.strip_prefix('>') {
                self.pending_header = Some(next.to_string());
                break;
            }
            seq.push_str(trimmed.trim_start());
        }

        let id = header.split_whitespace().next().unwrap_or("").to_string();
        Ok(Some(FastaRecord { id, header, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = io::Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Opens a FASTA file, transparently decompressing `.gz`.
pub fn open_fasta<P: AsRef<Path>>(path: P) -> io::Result<FastaReader<Box<dyn BufRead>>> {
    let path = path.as_ref();
    let f = File::open(path)?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(FastaReader::new(reader))
}

/// Writes one record, wrapping the sequence at [`FASTA_LINE_WIDTH`].
pub fn write_record<W: Write>(out: &mut W, header: &str, seq: &str) -> io::Result<()> {
    writeln!(out, ">{}", header)?;
    for chunk in seq.as_bytes().chunks(FASTA_LINE_WIDTH) {
        out.write_all(chunk)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
