// src/analysis/cluster_typing.rs

use std::fmt;

use crate::graph::{NucleotideCluster, NucleotideGraph, ProteinGraph};
use crate::types::{ClusterIndex, SeqIndex, StrainIndex};

/// Stage-2 cluster type, by (protein members, pseudogenes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterType {
    /// Type 1: one protein member and at least one pseudogene.
    RepresentativeWithPseudogenes,
    /// Type 2: pseudogenes only, no functional copy anywhere.
    PseudogenesOnly,
    /// Type 3: one protein member, no pseudogenes.
    RepresentativeOnly,
    /// Type 4: two or more protein members (paralog family).
    Paralogs,
}

impl ClusterType {
    pub const ALL: [ClusterType; 4] = [
        ClusterType::RepresentativeWithPseudogenes,
        ClusterType::PseudogenesOnly,
        ClusterType::RepresentativeOnly,
        ClusterType::Paralogs,
    ];

    /// `None` only for a cluster without any member, which the parser never produces.
    pub fn classify(protein_members: usize, pseudogenes: usize) -> Option<Self> {
        match (protein_members, pseudogenes) {
            (0, 0) => None,
            (0, _) => Some(ClusterType::PseudogenesOnly),
            (1, 0) => Some(ClusterType::RepresentativeOnly),
            (1, _) => Some(ClusterType::RepresentativeWithPseudogenes),
            _ => Some(ClusterType::Paralogs),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            ClusterType::RepresentativeWithPseudogenes => 1,
            ClusterType::PseudogenesOnly => 2,
            ClusterType::RepresentativeOnly => 3,
            ClusterType::Paralogs => 4,
        }
    }

    /// Exactly one protein member, so the stage-1 origin is unambiguous.
    pub fn is_cross_linkable(self) -> bool {
        matches!(
            self,
            ClusterType::RepresentativeWithPseudogenes | ClusterType::RepresentativeOnly
        )
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type{}", self.number())
    }
}

/// Outcome of following a stage-2 cluster back to stage 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossLink {
    Linked {
        strain: StrainIndex,
        seq: SeqIndex,
        protein_cluster: ClusterIndex,
        strain_count: usize,
        member_count: usize,
    },
    /// Zero or several protein members: no single stage-1 target.
    NotLinked,
    /// One protein member, but stage 1 has no cluster for it.
    Unresolved { strain: StrainIndex, seq: SeqIndex },
}

/// Type and cross-link of one stage-2 cluster.
#[derive(Debug, Clone)]
pub struct ClusterTyping {
    pub cluster: ClusterIndex,
    pub cluster_type: ClusterType,
    pub protein_members: usize,
    pub pseudogenes: usize,
    pub strain_count: usize,
    pub link: CrossLink,
}

/// All typings of a stage-2 report, sorted by cluster index.
#[derive(Debug, Clone, Default)]
pub struct TypingSummary {
    pub typings: Vec<ClusterTyping>,
}

impl TypingSummary {
    pub fn count(&self, cluster_type: ClusterType) -> usize {
        self.typings
            .iter()
            .filter(|t| t.cluster_type == cluster_type)
            .count()
    }

    pub fn linked(&self) -> impl Iterator<Item = &ClusterTyping> {
        self.typings
            .iter()
            .filter(|t| matches!(t.link, CrossLink::Linked { .. }))
    }

    pub fn unresolved_count(&self) -> usize {
        self.typings
            .iter()
            .filter(|t| matches!(t.link, CrossLink::Unresolved { .. }))
            .count()
    }
}

/// Resolves the sole protein member through the stage-1 join table.
pub fn cross_link(cluster: &NucleotideCluster, protein: &ProteinGraph) -> CrossLink {
    let Some((strain, seq)) = cluster.sole_protein_member() else {
        return CrossLink::NotLinked;
    };
    match protein.cluster_of(strain, seq) {
        Some(origin) => {
            if let Some(tag) = cluster.protein_tag() {
                if tag != origin.index {
                    log::warn!(
                        "Nucleotide cluster {}: [{}][{}] tagged cluster_{} but stage 1 places it in {}",
                        cluster.index(),
                        strain,
                        seq,
                        tag,
                        origin.index
                    );
                }
            }
            CrossLink::Linked {
                strain,
                seq,
                protein_cluster: origin.index,
                strain_count: origin.strain_count(),
                member_count: origin.member_count(),
            }
        }
        None => {
            log::warn!(
                "Nucleotide cluster {}: no stage-1 cluster for [{}][{}]",
                cluster.index(),
                strain,
                seq
            );
            CrossLink::Unresolved { strain, seq }
        }
    }
}

pub fn type_clusters(nucleotide: &NucleotideGraph, protein: &ProteinGraph) -> TypingSummary {
    let mut typings = Vec::with_capacity(nucleotide.clusters.len());

    for index in nucleotide.sorted_clusters() {
        let cluster = &nucleotide.clusters[&index];
        let Some(cluster_type) = ClusterType::classify(cluster.protein_count(), cluster.pseudogene_count()) else {
            continue;
        };
        let link = if cluster_type.is_cross_linkable() {
            cross_link(cluster, protein)
        } else {
            CrossLink::NotLinked
        };
        typings.push(ClusterTyping {
            cluster: index,
            cluster_type,
            protein_members: cluster.protein_count(),
            pseudogenes: cluster.pseudogene_count(),
            strain_count: cluster.strain_count(),
            link,
        });
    }

    let summary = TypingSummary { typings };
    log::info!(
        "Typed {} nucleotide clusters: {} / {} / {} / {} (types 1-4), {} unresolved links",
        summary.typings.len(),
        summary.count(ClusterType::RepresentativeWithPseudogenes),
        summary.count(ClusterType::PseudogenesOnly),
        summary.count(ClusterType::RepresentativeOnly),
        summary.count(ClusterType::Paralogs),
        summary.unresolved_count()
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PROTEIN_REPORT: &str = "\
>Cluster 0
0\t300aa, >[0][1]a *
1\t300aa, >[1][1]b at 99%
2\t300aa, >[2][1]c at 99%
3\t300aa, >[2][4]c at 95%
>Cluster 1
0\t100aa, >[1][7]d *
";

    fn graphs(nucleotide: &str) -> (NucleotideGraph, ProteinGraph) {
        (
            NucleotideGraph::from_reader(Cursor::new(nucleotide.as_bytes())).unwrap(),
            ProteinGraph::from_reader(Cursor::new(PROTEIN_REPORT.as_bytes())).unwrap(),
        )
    }

    #[test]
    fn test_classify_table() {
        assert_eq!(ClusterType::classify(1, 1), Some(ClusterType::RepresentativeWithPseudogenes));
        assert_eq!(ClusterType::classify(1, 5), Some(ClusterType::RepresentativeWithPseudogenes));
        assert_eq!(ClusterType::classify(0, 2), Some(ClusterType::PseudogenesOnly));
        assert_eq!(ClusterType::classify(1, 0), Some(ClusterType::RepresentativeOnly));
        assert_eq!(ClusterType::classify(2, 0), Some(ClusterType::Paralogs));
        assert_eq!(ClusterType::classify(3, 4), Some(ClusterType::Paralogs));
        assert_eq!(ClusterType::classify(0, 0), None);
    }

    #[test]
    fn test_representative_with_pseudogene_links_back() {
        let (nt, protein) = graphs(">Cluster 0\n[0][1] 300nt,*\n[1][2] 290nt,[p\n");
        let summary = type_clusters(&nt, &protein);
        let t = &summary.typings[0];
        assert_eq!(t.cluster_type, ClusterType::RepresentativeWithPseudogenes);
        assert_eq!((t.protein_members, t.pseudogenes), (1, 1));
        assert_eq!(
            t.link,
            CrossLink::Linked {
                strain: 0,
                seq: 1,
                protein_cluster: 0,
                strain_count: 3,
                member_count: 4,
            }
        );
    }

    #[test]
    fn test_only_single_protein_clusters_are_linked() {
        let text = "\
>Cluster 0
0\t300nt, >[1][7][cluster_1] x *
>Cluster 1
0\t300nt, >[0][1][cluster_0] x *
1\t300nt, >[1][1][cluster_0] y at 99%
>Cluster 2
0\t300nt, >[2][9][pseudo] x *
>Cluster 3
0\t300nt, >[2][5][cluster_8] x *
";
        let (nt, protein) = graphs(text);
        let summary = type_clusters(&nt, &protein);
        let types: Vec<ClusterType> = summary.typings.iter().map(|t| t.cluster_type).collect();
        assert_eq!(
            types,
            vec![
                ClusterType::RepresentativeOnly,
                ClusterType::Paralogs,
                ClusterType::PseudogenesOnly,
                ClusterType::RepresentativeOnly,
            ]
        );
        assert!(matches!(summary.typings[0].link, CrossLink::Linked { protein_cluster: 1, strain_count: 1, member_count: 1, .. }));
        assert_eq!(summary.typings[1].link, CrossLink::NotLinked);
        assert_eq!(summary.typings[2].link, CrossLink::NotLinked);
        assert_eq!(summary.typings[3].link, CrossLink::Unresolved { strain: 2, seq: 5 });
        assert_eq!(summary.linked().count(), 1);
        assert_eq!(summary.unresolved_count(), 1);
        assert_eq!(summary.count(ClusterType::RepresentativeOnly), 2);
    }
}
