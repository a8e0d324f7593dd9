//src/config.rs

use std::path::{Path, PathBuf};

/// Fraction of all strains a cluster must reach to count as core genome.
pub const CORE_THRESHOLD: f64 = 0.9;

/// File name fragments of the per-strain NCBI downloads.
pub const PROTEIN_FILE_PATTERN: &str = "protein.faa";
pub const CDS_FROM_GENOMIC_PATTERN: &str = "cds_from_genomic.fna";
pub const GENOMIC_PATTERN: &str = "genomic.fna";
pub const STRAIN_INDEX_FILE: &str = "strain_index";

/// Description flag NCBI puts on pseudogene CDS records.
pub const PSEUDO_FLAG: &str = "pseudo=true";

pub const WORKER_PROTEIN_FILE_PREFIX: &str = "worker_proteins_";
pub const WORKER_CDS_FILE_PREFIX: &str = "worker_cds_";

/// Environment overrides read by [`PipelineConfig::from_env`].
pub const DATA_DIR_ENV: &str = "PSEUDOGENE_DATA_DIR";
pub const WORKERS_ENV: &str = "PSEUDOGENE_WORKERS";

/// Paths and knobs shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub strains_dir: PathBuf,
    pub workers: usize,
    pub combined_proteins_file: String,
    pub combined_cds_file: String,
    pub protein_clusters_file: String,
    pub cds_clusters_file: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl PipelineConfig {
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            strains_dir: data_dir.join("strains"),
            data_dir,
            workers: host_parallelism(),
            combined_proteins_file: "all_strains_proteins.fasta".to_string(),
            combined_cds_file: "all_strains_reps_and_pseudogenes.fasta".to_string(),
            protein_clusters_file: "protein_clusters.clstr".to_string(),
            cds_clusters_file: "cds_clusters.clstr".to_string(),
        }
    }

    /// Default config, then `PSEUDOGENE_DATA_DIR` / `PSEUDOGENE_WORKERS` if set.
    pub fn from_env() -> Self {
        let mut config = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => Self::with_data_dir(dir),
            None => Self::default(),
        };
        if let Some(workers) = std::env::var(WORKERS_ENV)
            .ok()
            .and_then(|w| w.trim().parse::<usize>().ok())
        {
            config = config.workers(workers);
        }
        config
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn strains_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.strains_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn combined_proteins_path(&self) -> PathBuf {
        self.data_dir.join(&self.combined_proteins_file)
    }

    pub fn combined_cds_path(&self) -> PathBuf {
        self.data_dir.join(&self.combined_cds_file)
    }

    pub fn protein_clusters_path(&self) -> PathBuf {
        self.data_dir.join(&self.protein_clusters_file)
    }

    pub fn cds_clusters_path(&self) -> PathBuf {
        self.data_dir.join(&self.cds_clusters_file)
    }
}

fn host_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_data_dir() {
        let config = PipelineConfig::with_data_dir("/tmp/run1");
        assert_eq!(config.strains_dir, PathBuf::from("/tmp/run1/strains"));
        assert_eq!(
            config.combined_cds_path(),
            PathBuf::from("/tmp/run1/all_strains_reps_and_pseudogenes.fasta")
        );
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_worker_count_never_zero() {
        let config = PipelineConfig::default().workers(0);
        assert_eq!(config.workers, 1);
    }
}
