//src/graph/nucleotide.rs

use std::collections::BTreeMap;

use super::cluster::Cluster;
use crate::types::{ClusterIndex, MemberRecord, SeqIndex, StrainIndex};

/// A stage-2 (CDS nucleotide) cluster.
///
/// Members are split into the protein/representative category (sequences that
/// came in tagged `[cluster_N]`) and the pseudogene category (`[pseudo]`).
#[derive(Debug, Clone)]
pub struct NucleotideCluster {
    cluster: Cluster,
    protein_seqs: BTreeMap<StrainIndex, Vec<SeqIndex>>,
    pseudogenes: BTreeMap<StrainIndex, Vec<SeqIndex>>,
    protein_length_total: u64,
    pseudogene_length_total: u64,
    protein_count: usize,
    pseudogene_count: usize,
    /// `[cluster_N]` annotation carried by the first protein member
    protein_tag: Option<ClusterIndex>,
}

impl NucleotideCluster {
    pub fn new(index: ClusterIndex) -> Self {
        Self {
            cluster: Cluster::new(index),
            protein_seqs: BTreeMap::new(),
            pseudogenes: BTreeMap::new(),
            protein_length_total: 0,
            pseudogene_length_total: 0,
            protein_count: 0,
            pseudogene_count: 0,
            protein_tag: None,
        }
    }

    pub fn index(&self) -> ClusterIndex {
        self.cluster.index
    }

    /// The stage-1 view of this cluster's membership.
    pub fn as_cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn add_member(&mut self, record: &MemberRecord) {
        self.cluster.add_member(record);
        let length = u64::from(record.length.unwrap_or(0));
        if record.is_pseudogene {
            self.pseudogenes.entry(record.strain).or_default().push(record.seq);
            self.pseudogene_length_total += length;
            self.pseudogene_count += 1;
        } else {
            self.protein_seqs.entry(record.strain).or_default().push(record.seq);
            self.protein_length_total += length;
            self.protein_count += 1;
            if self.protein_tag.is_none() {
                self.protein_tag = record.tagged_cluster;
            }
        }
    }

    pub fn strain_count(&self) -> usize {
        self.cluster.strain_count()
    }

    pub fn member_count(&self) -> usize {
        self.cluster.member_count()
    }

    pub fn protein_count(&self) -> usize {
        self.protein_count
    }

    pub fn pseudogene_count(&self) -> usize {
        self.pseudogene_count
    }

    pub fn pseudogenes_of(&self, strain: StrainIndex) -> &[SeqIndex] {
        self.pseudogenes.get(&strain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// No protein/representative member at all; pseudogenes may still be present.
    pub fn has_no_representative(&self) -> bool {
        self.protein_count == 0
    }

    /// The sole protein member, if there is exactly one.
    pub fn sole_protein_member(&self) -> Option<(StrainIndex, SeqIndex)> {
        if self.protein_count != 1 {
            return None;
        }
        self.protein_seqs
            .iter()
            .next()
            .and_then(|(&strain, seqs)| seqs.first().map(|&seq| (strain, seq)))
    }

    /// Stage-1 cluster id the annotation step wrote into the protein member's header.
    pub fn protein_tag(&self) -> Option<ClusterIndex> {
        self.protein_tag
    }

    /// The member the clustering tool marked with `*`.
    pub fn representative(&self) -> Option<(StrainIndex, SeqIndex)> {
        self.cluster.representative()
    }

    pub fn protein_length_total(&self) -> u64 {
        self.protein_length_total
    }

    pub fn pseudogene_length_total(&self) -> u64 {
        self.pseudogene_length_total
    }
}
