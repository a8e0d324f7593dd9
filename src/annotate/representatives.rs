// src/annotate/representatives.rs

use ahash::AHashMap;
use std::io::BufRead;
use std::path::Path;

use crate::cluster_report::{open_report, ReportParser, Stage};
use crate::errors::ReportError;
use crate::types::{ClusterBlock, ClusterIndex, SeqIndex, StrainIndex};

/// Stage-1 cluster representatives, keyed strain -> sequence position -> cluster.
#[derive(Debug, Default)]
pub struct RepresentativeIndex {
    by_strain: AHashMap<StrainIndex, AHashMap<SeqIndex, ClusterIndex>>,
    count: usize,
}

impl RepresentativeIndex {
    pub fn from_blocks<I>(blocks: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = Result<ClusterBlock, ReportError>>,
    {
        let mut index = RepresentativeIndex::default();
        for block in blocks {
            let block = block?;
            let mut reps = block.members.iter().filter(|m| m.is_representative);
            match reps.next() {
                Some(rep) => {
                    index
                        .by_strain
                        .entry(rep.strain)
                        .or_default()
                        .insert(rep.seq, block.id);
                    index.count += 1;
                }
                None => log::warn!("Cluster {} has no representative", block.id),
            }
            if reps.next().is_some() {
                log::warn!("Cluster {} lists more than one representative, keeping the first", block.id);
            }
        }
        log::info!(
            "Indexed {} cluster representatives across {} strains",
            index.count,
            index.by_strain.len()
        );
        Ok(index)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReportError> {
        Self::from_blocks(ReportParser::new(reader, Stage::Protein))
    }

    pub fn from_report<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        Self::from_blocks(open_report(path, Stage::Protein)?)
    }

    /// Cluster represented by `(strain, seq)`, if that sequence is a representative.
    pub fn lookup(&self, strain: StrainIndex, seq: SeqIndex) -> Option<ClusterIndex> {
        self.by_strain.get(&strain)?.get(&seq).copied()
    }

    pub fn for_strain(&self, strain: StrainIndex) -> Option<&AHashMap<SeqIndex, ClusterIndex>> {
        self.by_strain.get(&strain)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
