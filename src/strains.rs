//src/strains.rs

use ahash::AHashMap;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{
    CDS_FROM_GENOMIC_PATTERN, GENOMIC_PATTERN, PROTEIN_FILE_PATTERN, PSEUDO_FLAG, STRAIN_INDEX_FILE,
};
use crate::errors::PipelineError;
use crate::fasta::open_fasta;
use crate::types::{GenomicStats, StrainIndex};

/// A downloaded strain directory together with its already-assigned index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrainDir {
    pub index: StrainIndex,
    pub dir: PathBuf,
}

impl StrainDir {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PipelineError> {
        let dir = dir.as_ref().to_path_buf();
        let index = read_strain_index(dir.join(STRAIN_INDEX_FILE))?;
        Ok(Self { index, dir })
    }

    /// Directory name without the `[<index>]` download prefix.
    pub fn name(&self) -> String {
        let name = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match name.rfind(']') {
            Some(pos) => name[pos + 1..].to_string(),
            None => name,
        }
    }

    pub fn cds_path(&self) -> Result<PathBuf, PipelineError> {
        self.find_file(CDS_FROM_GENOMIC_PATTERN, None)
    }

    pub fn protein_path(&self) -> Result<PathBuf, PipelineError> {
        self.find_file(PROTEIN_FILE_PATTERN, None)
    }

    pub fn genomic_path(&self) -> Result<PathBuf, PipelineError> {
        self.find_file(GENOMIC_PATTERN, Some("_from_genomic"))
    }

    /// First file (by name) containing `pattern` and not containing `exclude`.
    fn find_file(&self, pattern: &'static str, exclude: Option<&str>) -> Result<PathBuf, PipelineError> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                let name = path.file_name()?.to_string_lossy().into_owned();
                let excluded = exclude.map(|e| name.contains(e)).unwrap_or(false);
                if name.contains(pattern) && !excluded {
                    Some(path)
                } else {
                    None
                }
            })
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::MissingStrainFile {
                dir: self.dir.clone(),
                pattern,
            })
    }
}

/// Reads the one-line `strain_index` sidecar.
pub fn read_strain_index<P: AsRef<Path>>(path: P) -> Result<StrainIndex, PipelineError> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::MissingStrainFile {
                dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                pattern: STRAIN_INDEX_FILE,
            })
        }
        Err(e) => return Err(e.into()),
    };
    let first = content.lines().next().unwrap_or("").trim();
    first.parse().map_err(|_| PipelineError::InvalidStrainIndex {
        path: path.to_path_buf(),
        content: first.to_string(),
    })
}

/// All strain directories under `strains_dir`, sorted by strain index.
/// Two directories claiming the same index are an error.
pub fn list_strain_dirs<P: AsRef<Path>>(strains_dir: P) -> Result<Vec<StrainDir>, PipelineError> {
    let mut strains = Vec::new();
    for entry in fs::read_dir(strains_dir.as_ref())? {
        let path = entry?.path();
        if path.is_dir() {
            strains.push(StrainDir::open(&path)?);
        }
    }
    strains.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.dir.cmp(&b.dir)));
    if let Some(pair) = strains.windows(2).find(|pair| pair[0].index == pair[1].index) {
        return Err(PipelineError::DuplicateStrainIndex {
            index: pair[0].index,
            first: pair[0].dir.clone(),
            second: pair[1].dir.clone(),
        });
    }
    log::info!("Found {} strain directories in {}", strains.len(), strains_dir.as_ref().display());
    Ok(strains)
}

/// Contigs (non-plasmid genomic records) and pseudogenes (CDS flagged `pseudo=true`).
pub fn genomic_stats(strain: &StrainDir) -> Result<GenomicStats, PipelineError> {
    let mut stats = GenomicStats::default();

    for record in open_fasta(strain.genomic_path()?)? {
        if !record?.header.contains("plasmid") {
            stats.contigs += 1;
        }
    }
    for record in open_fasta(strain.cds_path()?)? {
        if record?.header.contains(PSEUDO_FLAG) {
            stats.pseudogenes += 1;
        }
    }
    Ok(stats)
}

/// Parallel scan of every strain's genomic and CDS files.
pub fn collect_genomic_stats(strains: &[StrainDir]) -> Result<AHashMap<StrainIndex, GenomicStats>, PipelineError> {
    strains
        .par_iter()
        .fold(
            || Ok(AHashMap::new()),
            |acc: Result<AHashMap<StrainIndex, GenomicStats>, PipelineError>, strain| {
                let mut acc = acc?;
                acc.insert(strain.index, genomic_stats(strain)?);
                Ok(acc)
            },
        )
        .reduce(
            || Ok(AHashMap::new()),
            |a, b| {
                let mut a = a?;
                a.extend(b?);
                Ok(a)
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_strain(root: &Path, name: &str, index: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STRAIN_INDEX_FILE), index).unwrap();
        dir
    }

    #[test]
    fn test_strain_dirs_sorted_by_index() {
        let root = tempfile::tempdir().unwrap();
        make_strain(root.path(), "[1]GCF_000002", "1\n");
        make_strain(root.path(), "[0]GCF_000001", "0");
        let strains = list_strain_dirs(root.path()).unwrap();
        assert_eq!(strains.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(strains[0].name(), "GCF_000001");
    }

    #[test]
    fn test_shared_strain_index_rejected() {
        let root = tempfile::tempdir().unwrap();
        make_strain(root.path(), "[2]GCF_000002", "2");
        make_strain(root.path(), "[2]GCF_000003", "2\n");
        match list_strain_dirs(root.path()) {
            Err(PipelineError::DuplicateStrainIndex { index, first, second }) => {
                assert_eq!(index, 2);
                assert!(first.ends_with("[2]GCF_000002"));
                assert!(second.ends_with("[2]GCF_000003"));
            }
            other => panic!("expected duplicate strain index, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_and_missing_index() {
        let root = tempfile::tempdir().unwrap();
        let bad = make_strain(root.path(), "bad", "abc");
        assert!(matches!(StrainDir::open(&bad), Err(PipelineError::InvalidStrainIndex { .. })));

        let missing = root.path().join("missing");
        fs::create_dir_all(&missing).unwrap();
        assert!(matches!(
            StrainDir::open(&missing),
            Err(PipelineError::MissingStrainFile { pattern: STRAIN_INDEX_FILE, .. })
        ));
    }

    #[test]
    fn test_missing_cds_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let dir = make_strain(root.path(), "s", "4");
        let strain = StrainDir::open(&dir).unwrap();
        assert!(matches!(
            strain.cds_path(),
            Err(PipelineError::MissingStrainFile { pattern: CDS_FROM_GENOMIC_PATTERN, .. })
        ));
    }

    #[test]
    fn test_genomic_stats_in_parallel() {
        let root = tempfile::tempdir().unwrap();
        for (i, name) in ["a", "b"].iter().enumerate() {
            let dir = make_strain(root.path(), name, &i.to_string());
            fs::write(
                dir.join("GCF_1_genomic.fna"),
                ">NZ_1 chromosome\nACGT\n>NZ_2 plasmid p1\nAC\n>NZ_3 contig 2\nGG\n",
            )
            .unwrap();
            fs::write(
                dir.join("GCF_1_cds_from_genomic.fna"),
                ">lcl|NZ_1_cds_1 [gene=a]\nATG\n>lcl|NZ_1_cds_2 [pseudo=true]\nATG\n",
            )
            .unwrap();
        }
        fs::write(root.path().join("a").join("GCF_1_rna_from_genomic.fna"), ">r\nA\n").unwrap();
        let strains = list_strain_dirs(root.path()).unwrap();
        assert!(strains[0].genomic_path().unwrap().ends_with("GCF_1_genomic.fna"));

        let stats = collect_genomic_stats(&strains).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[&1], GenomicStats { contigs: 2, pseudogenes: 1 });
    }
}
