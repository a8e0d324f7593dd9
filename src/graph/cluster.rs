//src/graph/cluster.rs

use ahash::AHashMap;

use crate::config::CORE_THRESHOLD;
use crate::types::{ClusterIndex, MemberRecord, SeqIndex, StrainIndex};

/// A stage-1 (protein) cluster.
///
/// `member_strains` is a multiset: a strain carrying paralogous copies shows up
/// with a count above one, so `strain_count() <= member_count()` always holds.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub index: ClusterIndex,
    member_strains: AHashMap<StrainIndex, u32>,
    members: Vec<(StrainIndex, SeqIndex)>,
    representative: Option<(StrainIndex, SeqIndex)>,
}

impl Cluster {
    pub fn new(index: ClusterIndex) -> Self {
        Self {
            index,
            member_strains: AHashMap::new(),
            members: Vec::new(),
            representative: None,
        }
    }

    pub fn add_member(&mut self, record: &MemberRecord) {
        *self.member_strains.entry(record.strain).or_insert(0) += 1;
        self.members.push((record.strain, record.seq));
        if record.is_representative && self.representative.is_none() {
            self.representative = Some((record.strain, record.seq));
        }
    }

    /// Number of distinct strains with at least one member.
    pub fn strain_count(&self) -> usize {
        self.member_strains.len()
    }

    /// Total number of member sequences.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn copies_of(&self, strain: StrainIndex) -> u32 {
        self.member_strains.get(&strain).copied().unwrap_or(0)
    }

    /// Every `(strain, seq)` member, in report order.
    pub fn members(&self) -> &[(StrainIndex, SeqIndex)] {
        &self.members
    }

    pub fn member_strains(&self) -> impl Iterator<Item = (StrainIndex, u32)> + '_ {
        self.member_strains.iter().map(|(&s, &n)| (s, n))
    }

    /// The member the clustering tool marked with `*`.
    pub fn representative(&self) -> Option<(StrainIndex, SeqIndex)> {
        self.representative
    }

    pub fn is_core(&self, total_strains: usize) -> bool {
        meets_core_threshold(self.strain_count(), total_strains)
    }

    pub fn is_singleton(&self) -> bool {
        self.strain_count() == 1
    }

    /// True when some strain contributes more than one sequence.
    pub fn is_multi_copy(&self) -> bool {
        self.member_strains.values().any(|&n| n > 1)
    }

    /// Strains contributing more than one sequence, sorted.
    pub fn multi_copy_strains(&self) -> Vec<StrainIndex> {
        let mut strains: Vec<StrainIndex> = self
            .member_strains
            .iter()
            .filter(|(_, &n)| n > 1)
            .map(|(&s, _)| s)
            .collect();
        strains.sort_unstable();
        strains
    }
}

/// `strain_count / total_strains >= CORE_THRESHOLD`; never core for an empty dataset.
pub fn meets_core_threshold(strain_count: usize, total_strains: usize) -> bool {
    total_strains > 0 && (strain_count as f64 / total_strains as f64) >= CORE_THRESHOLD
}
