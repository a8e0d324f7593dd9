//! Error types for report parsing and the annotation pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{ClusterIndex, SeqIndex, StrainIndex};

/// Errors raised while reading a cluster report.
///
/// Any member line that does not fit the grammar aborts the parse: a skipped
/// line would silently change every downstream percentage.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("line {line_no}: expected {expected}, found `{line}`")]
    Format {
        line_no: usize,
        line: String,
        expected: &'static str,
    },

    #[error("line {line_no}: member line `{line}` appears before any `>Cluster` header")]
    MemberOutsideCluster { line_no: usize, line: String },

    #[error("line {line_no}: cluster {cluster} has no members")]
    EmptyCluster { line_no: usize, cluster: u32 },

    #[error("cluster {cluster} appears more than once in the report")]
    DuplicateCluster { cluster: u32 },

    #[error("sequence [{strain}][{seq}] is a member of both cluster {first} and cluster {second}")]
    DuplicateMember {
        strain: StrainIndex,
        seq: SeqIndex,
        first: ClusterIndex,
        second: ClusterIndex,
    },

    #[error("I/O error while reading report: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the per-strain preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no file matching `{pattern}` in strain directory {}", dir.display())]
    MissingStrainFile { dir: PathBuf, pattern: &'static str },

    #[error("invalid strain index in {}: `{content}`", path.display())]
    InvalidStrainIndex { path: PathBuf, content: String },

    #[error("strain index {index} is used by both {} and {}", first.display(), second.display())]
    DuplicateStrainIndex {
        index: StrainIndex,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("strain {strain}: CDS header `{header}` does not end in `_<position>`")]
    MalformedCdsHeader { strain: StrainIndex, header: String },

    #[error("strain {strain}: protein `{protein_id}` has no matching CDS record")]
    UnmatchedProtein { strain: StrainIndex, protein_id: String },

    #[error("worker {worker_id} failed: {source}")]
    Worker {
        worker_id: usize,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Tags an error with the worker that raised it.
    pub fn in_worker(self, worker_id: usize) -> Self {
        PipelineError::Worker {
            worker_id,
            source: Box::new(self),
        }
    }
}
