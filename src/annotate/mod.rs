//! Parallel per-strain passes that feed the two clustering runs.
//!
//! Both passes share one shape: every strain directory becomes a job on a
//! [`JobQueue`], a [`WorkerPool`] drains it with each worker appending to its
//! own `<prefix><worker_id>` file, and the worker files are concatenated in
//! worker-id order into the combined FASTA once every worker has succeeded.
//! A failed pass leaves no combined file and no worker files behind.

pub mod cds;
pub mod job_queue;
pub mod pool;
pub mod proteins;
pub mod representatives;

pub use cds::{sequence_position, structural_tag, tag_strain_cds, CdsTally};
pub use job_queue::{JobQueue, QueueItem};
pub use pool::WorkerPool;
pub use proteins::{cds_protein_id, index_strain_proteins};
pub use representatives::RepresentativeIndex;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{PipelineConfig, WORKER_CDS_FILE_PREFIX, WORKER_PROTEIN_FILE_PREFIX};
use crate::errors::PipelineError;
use crate::strains::{list_strain_dirs, StrainDir};

/// What one worker wrote during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub path: PathBuf,
    pub strains: usize,
    pub sequences: usize,
}

/// Outcome of a completed pass.
#[derive(Debug, Clone)]
pub struct PassSummary {
    pub output: PathBuf,
    pub workers: Vec<WorkerSummary>,
}

impl PassSummary {
    pub fn strains(&self) -> usize {
        self.workers.iter().map(|w| w.strains).sum()
    }

    pub fn sequences(&self) -> usize {
        self.workers.iter().map(|w| w.sequences).sum()
    }
}

/// A worker's private output file.
struct WorkerOutput {
    worker_id: usize,
    path: PathBuf,
    writer: BufWriter<File>,
    strains: usize,
    sequences: usize,
}

impl WorkerOutput {
    fn create(dir: &Path, prefix: &str, worker_id: usize) -> io::Result<Self> {
        let path = worker_file_path(dir, prefix, worker_id);
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self {
            worker_id,
            path,
            writer,
            strains: 0,
            sequences: 0,
        })
    }

    fn finish(mut self) -> io::Result<WorkerSummary> {
        self.writer.flush()?;
        Ok(WorkerSummary {
            worker_id: self.worker_id,
            path: self.path,
            strains: self.strains,
            sequences: self.sequences,
        })
    }
}

pub fn worker_file_path(dir: &Path, prefix: &str, worker_id: usize) -> PathBuf {
    dir.join(format!("{}{}", prefix, worker_id))
}

/// Deletes every file in `dir` whose name starts with `prefix`.
pub fn remove_worker_files(dir: &Path, prefix: &str) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_worker_file = entry.file_name().to_string_lossy().starts_with(prefix);
        if is_worker_file && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Concatenates `parts` in order into `dest`, going through a sibling temp file
/// so `dest` only ever appears complete. The temp file is removed on failure.
pub fn merge_worker_files(parts: &[PathBuf], dest: &Path) -> io::Result<u64> {
    let staging = staging_path(dest);
    let merged = copy_parts(parts, &staging).and_then(|bytes| {
        fs::rename(&staging, dest)?;
        Ok(bytes)
    });
    if merged.is_err() {
        if let Err(cleanup) = remove_if_exists(&staging) {
            log::warn!("Could not remove {}: {}", staging.display(), cleanup);
        }
    }
    merged
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut staging_name = dest.file_name().unwrap_or_default().to_os_string();
    staging_name.push(".partial");
    dest.with_file_name(staging_name)
}

fn copy_parts(parts: &[PathBuf], staging: &Path) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(staging)?);
    let mut bytes = 0;
    for part in parts {
        bytes += io::copy(&mut File::open(part)?, &mut out)?;
    }
    out.flush()?;
    Ok(bytes)
}

fn discard_worker_files(dir: &Path, prefix: &str) {
    if let Err(cleanup) = remove_worker_files(dir, prefix) {
        log::warn!("Could not remove partial worker files: {}", cleanup);
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Runs `process` over every strain on `config.workers` threads and merges the
/// per-worker files into `dest`.
pub fn run_strain_pass<F>(
    config: &PipelineConfig,
    strains: Vec<StrainDir>,
    prefix: &str,
    dest: &Path,
    process: F,
) -> Result<PassSummary, PipelineError>
where
    F: Fn(&StrainDir, &mut BufWriter<File>) -> Result<usize, PipelineError> + Sync,
{
    let stale = remove_worker_files(&config.data_dir, prefix)?;
    if stale > 0 {
        log::info!("Removed {} stale `{}*` files", stale, prefix);
    }
    remove_if_exists(dest)?;

    let pool = WorkerPool::new(config.workers);
    log::info!(
        "Processing {} strains with {} workers into {}",
        strains.len(),
        pool.size(),
        dest.display()
    );
    let queue: JobQueue<StrainDir> = strains.into_iter().collect();

    let outcome = pool.run(
        &queue,
        |worker_id| Ok(WorkerOutput::create(&config.data_dir, prefix, worker_id)?),
        |output: &mut WorkerOutput, strain: StrainDir| {
            let written = process(&strain, &mut output.writer)?;
            output.strains += 1;
            output.sequences += written;
            log::debug!(
                "[worker {}] strain {} ({}): {} sequences",
                output.worker_id,
                strain.index,
                strain.name(),
                written
            );
            Ok(())
        },
    );

    let summaries = match outcome.and_then(|outputs| {
        outputs
            .into_iter()
            .map(WorkerOutput::finish)
            .collect::<io::Result<Vec<_>>>()
            .map_err(PipelineError::from)
    }) {
        Ok(summaries) => summaries,
        Err(e) => {
            discard_worker_files(&config.data_dir, prefix);
            return Err(e);
        }
    };

    let parts: Vec<PathBuf> = summaries.iter().map(|w| w.path.clone()).collect();
    let bytes = match merge_worker_files(&parts, dest) {
        Ok(bytes) => bytes,
        Err(e) => {
            discard_worker_files(&config.data_dir, prefix);
            return Err(e.into());
        }
    };
    let summary = PassSummary {
        output: dest.to_path_buf(),
        workers: summaries,
    };
    log::info!(
        "Wrote {} sequences from {} strains ({} bytes) to {}",
        summary.sequences(),
        summary.strains(),
        bytes,
        dest.display()
    );
    Ok(summary)
}

/// Builds the combined protein FASTA for the first clustering run.
pub fn preprocess_proteins(config: &PipelineConfig) -> Result<PassSummary, PipelineError> {
    let strains = list_strain_dirs(&config.strains_dir)?;
    run_strain_pass(
        config,
        strains,
        WORKER_PROTEIN_FILE_PREFIX,
        &config.combined_proteins_path(),
        |strain, out| index_strain_proteins(strain, out),
    )
}

/// Builds the combined representatives-and-pseudogenes FASTA for the second
/// clustering run from the first run's report.
pub fn extract_representatives_and_pseudogenes(config: &PipelineConfig) -> Result<PassSummary, PipelineError> {
    let representatives = RepresentativeIndex::from_report(config.protein_clusters_path())?;
    let strains = list_strain_dirs(&config.strains_dir)?;
    run_strain_pass(
        config,
        strains,
        WORKER_CDS_FILE_PREFIX,
        &config.combined_cds_path(),
        |strain, out| Ok(tag_strain_cds(strain, &representatives, out)?.written()),
    )
}
