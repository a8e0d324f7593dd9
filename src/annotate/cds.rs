// src/annotate/cds.rs

use std::io::Write;

use super::representatives::RepresentativeIndex;
use crate::config::PSEUDO_FLAG;
use crate::errors::PipelineError;
use crate::fasta::{open_fasta, write_record};
use crate::strains::StrainDir;
use crate::types::{ClusterIndex, SeqIndex, StrainIndex};

/// Per-strain counts from one CDS pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CdsTally {
    pub representatives: usize,
    pub pseudogenes: usize,
}

impl CdsTally {
    pub fn written(&self) -> usize {
        self.representatives + self.pseudogenes
    }
}

/// Position of a CDS within its strain: the integer after the last `_` of the id.
pub fn sequence_position(id: &str) -> Option<SeqIndex> {
    id.rsplit_once('_')?.1.parse().ok()
}

/// `[strain][seq][cluster_<id>]` for representatives, `[strain][seq][pseudo]` otherwise.
pub fn structural_tag(strain: StrainIndex, seq: SeqIndex, cluster: Option<ClusterIndex>) -> String {
    match cluster {
        Some(cluster) => format!("[{}][{}][cluster_{}]", strain, seq, cluster),
        None => format!("[{}][{}][pseudo]", strain, seq),
    }
}

/// Writes every protein-cluster representative and every pseudogene from one
/// strain's CDS file, each header prefixed with its structural tag.
pub fn tag_strain_cds<W: Write>(
    strain: &StrainDir,
    representatives: &RepresentativeIndex,
    out: &mut W,
) -> Result<CdsTally, PipelineError> {
    let reps = representatives.for_strain(strain.index);
    if reps.is_none() {
        log::debug!("Strain {} represents no protein cluster", strain.index);
    }

    let mut tally = CdsTally::default();
    for record in open_fasta(strain.cds_path()?)? {
        let record = record?;
        let seq = sequence_position(&record.id).ok_or_else(|| PipelineError::MalformedCdsHeader {
            strain: strain.index,
            header: record.header.clone(),
        })?;

        let cluster = reps.and_then(|r| r.get(&seq)).copied();
        if cluster.is_some() {
            tally.representatives += 1;
        } else if record.header.contains(PSEUDO_FLAG) {
            tally.pseudogenes += 1;
        } else {
            continue;
        }

        let tag = structural_tag(strain.index, seq, cluster);
        write_record(out, &format!("{} {}", tag, record.header), &record.seq)?;
    }
    Ok(tally)
}
