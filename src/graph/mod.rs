//! Bipartite strain <-> cluster model built from a parsed cluster report.
pub mod cluster;
pub mod nucleotide;

pub use cluster::{meets_core_threshold, Cluster};
pub use nucleotide::NucleotideCluster;

use ahash::AHashMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use crate::cluster_report::{open_report, ReportParser, Stage};
use crate::errors::ReportError;
use crate::types::{ClusterBlock, ClusterIndex, SeqIndex, StrainIndex};

/// Access to the stage-1 membership data every cluster kind carries.
pub trait ClusterView {
    fn base(&self) -> &Cluster;
}

impl ClusterView for Cluster {
    fn base(&self) -> &Cluster {
        self
    }
}

impl ClusterView for NucleotideCluster {
    fn base(&self) -> &Cluster {
        self.as_cluster()
    }
}

/// A cluster type that can be assembled from one report block.
pub trait ReportCluster: ClusterView + Sized {
    const STAGE: Stage;

    fn from_block(block: &ClusterBlock) -> Self;
}

impl ReportCluster for Cluster {
    const STAGE: Stage = Stage::Protein;

    fn from_block(block: &ClusterBlock) -> Self {
        let mut cluster = Cluster::new(block.id);
        for member in &block.members {
            cluster.add_member(member);
        }
        cluster
    }
}

impl ReportCluster for NucleotideCluster {
    const STAGE: Stage = Stage::Nucleotide;

    fn from_block(block: &ClusterBlock) -> Self {
        let mut cluster = NucleotideCluster::new(block.id);
        for member in &block.members {
            cluster.add_member(member);
        }
        cluster
    }
}

/// One strain and the clusters it has members in.
#[derive(Debug)]
pub struct Strain<C> {
    pub index: StrainIndex,
    clusters: AHashMap<ClusterIndex, Arc<C>>,
    /// sequence position -> cluster it landed in
    sequence_clusters: AHashMap<SeqIndex, ClusterIndex>,
}

impl<C: ClusterView> Strain<C> {
    pub fn new(index: StrainIndex) -> Self {
        Self {
            index,
            clusters: AHashMap::new(),
            sequence_clusters: AHashMap::new(),
        }
    }

    pub fn add_cluster(&mut self, cluster: Arc<C>) {
        self.clusters.insert(cluster.base().index, cluster);
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Arc<C>> {
        self.clusters.values()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn cluster_of(&self, seq: SeqIndex) -> Option<ClusterIndex> {
        self.sequence_clusters.get(&seq).copied()
    }

    pub fn core_clusters(&self, total_strains: usize) -> Vec<&Arc<C>> {
        self.clusters
            .values()
            .filter(|c| c.base().is_core(total_strains))
            .collect()
    }

    pub fn singleton_clusters(&self) -> Vec<&Arc<C>> {
        self.clusters
            .values()
            .filter(|c| c.base().is_singleton())
            .collect()
    }
}

impl Strain<NucleotideCluster> {
    /// This strain's pseudogenes that sit in clusters with no protein member.
    pub fn pseudogenes_in_clusters_without_representative(&self) -> Vec<SeqIndex> {
        let mut seqs: Vec<SeqIndex> = self
            .clusters
            .values()
            .filter(|c| c.has_no_representative())
            .flat_map(|c| c.pseudogenes_of(self.index).iter().copied())
            .collect();
        seqs.sort_unstable();
        seqs
    }
}

/// All strains and clusters of one report. Read-only once built.
#[derive(Debug)]
pub struct ClusterGraph<C> {
    pub strains: AHashMap<StrainIndex, Strain<C>>,
    pub clusters: AHashMap<ClusterIndex, Arc<C>>,
    pub total_strains: usize,
    pub total_core_clusters: usize,
}

pub type ProteinGraph = ClusterGraph<Cluster>;
pub type NucleotideGraph = ClusterGraph<NucleotideCluster>;

impl<C: ReportCluster> ClusterGraph<C> {
    /// Builds the graph from a stream of parsed blocks, stopping at the first error.
    pub fn from_blocks<I>(blocks: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = Result<ClusterBlock, ReportError>>,
    {
        let mut strains: AHashMap<StrainIndex, Strain<C>> = AHashMap::new();
        let mut clusters: AHashMap<ClusterIndex, Arc<C>> = AHashMap::new();

        for block in blocks {
            let block = block?;
            if clusters.contains_key(&block.id) {
                return Err(ReportError::DuplicateCluster { cluster: block.id });
            }
            let cluster = Arc::new(C::from_block(&block));
            for &(strain_index, seq) in cluster.base().members() {
                let strain = strains
                    .entry(strain_index)
                    .or_insert_with(|| Strain::new(strain_index));
                if let Some(first) = strain.sequence_clusters.insert(seq, block.id) {
                    if first != block.id {
                        return Err(ReportError::DuplicateMember {
                            strain: strain_index,
                            seq,
                            first,
                            second: block.id,
                        });
                    }
                }
                strain.add_cluster(Arc::clone(&cluster));
            }
            clusters.insert(block.id, cluster);
        }

        let total_strains = strains.len();
        let total_core_clusters = clusters
            .values()
            .filter(|c| c.base().is_core(total_strains))
            .count();

        log::info!(
            "Built {:?} graph: {} strains, {} clusters, {} core",
            C::STAGE,
            total_strains,
            clusters.len(),
            total_core_clusters
        );

        Ok(Self {
            strains,
            clusters,
            total_strains,
            total_core_clusters,
        })
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReportError> {
        Self::from_blocks(ReportParser::new(reader, C::STAGE))
    }

    pub fn from_report<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        Self::from_blocks(open_report(path, C::STAGE)?)
    }

    /// Join-table lookup: which cluster holds sequence `seq` of `strain`.
    pub fn cluster_of(&self, strain: StrainIndex, seq: SeqIndex) -> Option<&Arc<C>> {
        let index = self.strains.get(&strain)?.cluster_of(seq)?;
        self.clusters.get(&index)
    }

    /// Strain indices in ascending order.
    pub fn sorted_strains(&self) -> Vec<StrainIndex> {
        let mut strains: Vec<StrainIndex> = self.strains.keys().copied().collect();
        strains.sort_unstable();
        strains
    }

    /// Cluster indices in ascending order.
    pub fn sorted_clusters(&self) -> Vec<ClusterIndex> {
        let mut clusters: Vec<ClusterIndex> = self.clusters.keys().copied().collect();
        clusters.sort_unstable();
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn protein_graph(text: &str) -> ProteinGraph {
        ProteinGraph::from_reader(Cursor::new(text.as_bytes())).unwrap()
    }

    #[test]
    fn test_scenario_three_strains_all_present() {
        let g = protein_graph(">Cluster 0\n0\t300aa, >[0][1]a *\n1\t300aa, >[1][1]b at 99%\n2\t300aa, >[2][1]c at 98%\n");
        assert_eq!(g.total_strains, 3);
        let c = &g.clusters[&0];
        assert!(c.is_core(g.total_strains));
        assert!(!c.is_singleton());
        assert_eq!(g.total_core_clusters, 1);
    }

    #[test]
    fn test_scenario_nine_of_ten_strains() {
        // cluster 0 covers strains 0..=8, cluster 1 covers 0..=7, cluster 2 adds strain 9
        let mut text = String::from(">Cluster 0\n");
        for s in 0..9 {
            text.push_str(&format!("{s}\t100aa, >[{s}][1]x\n"));
        }
        text.push_str(">Cluster 1\n");
        for s in 0..8 {
            text.push_str(&format!("{s}\t100aa, >[{s}][2]x\n"));
        }
        text.push_str(">Cluster 2\n0\t100aa, >[9][3]x *\n");
        let g = protein_graph(&text);

        assert_eq!(g.total_strains, 10);
        assert!(g.clusters[&0].is_core(10));
        assert!(!g.clusters[&1].is_core(10));
        assert!(g.clusters[&2].is_singleton());
        assert_eq!(g.total_core_clusters, 1);

        let strain_9 = &g.strains[&9];
        assert_eq!(strain_9.core_clusters(g.total_strains).len(), 0);
        assert_eq!(strain_9.singleton_clusters().len(), 1);
        let strain_0 = &g.strains[&0];
        assert_eq!(strain_0.core_clusters(g.total_strains).len(), 1);
        assert_eq!(strain_0.cluster_count(), 2);
    }

    #[test]
    fn test_strain_count_never_exceeds_member_count() {
        let g = protein_graph(
            ">Cluster 0\n0\t1aa, >[0][1]a *\n1\t1aa, >[0][2]a\n2\t1aa, >[1][1]a\n>Cluster 1\n0\t1aa, >[1][5]a *\n",
        );
        for c in g.clusters.values() {
            assert!(c.strain_count() <= c.member_count());
        }
        assert_eq!(g.clusters[&0].member_count(), 3);
        assert_eq!(g.clusters[&0].strain_count(), 2);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = ">Cluster 0\n0\t1aa, >[0][1]a *\n1\t1aa, >[0][2]a\n>Cluster 5\n0\t1aa, >[3][1]a *\n";
        let a = protein_graph(text);
        let b = protein_graph(text);
        assert_eq!(a.sorted_clusters(), b.sorted_clusters());
        for id in a.sorted_clusters() {
            let (ca, cb) = (&a.clusters[&id], &b.clusters[&id]);
            assert_eq!((ca.strain_count(), ca.member_count()), (cb.strain_count(), cb.member_count()));
        }
    }

    #[test]
    fn test_join_table_lookup() {
        let g = protein_graph(">Cluster 3\n0\t1aa, >[0][1]a *\n>Cluster 4\n0\t1aa, >[0][2]a *\n1\t1aa, >[1][7]b\n");
        assert_eq!(g.cluster_of(0, 2).map(|c| c.index), Some(4));
        assert_eq!(g.cluster_of(1, 7).map(|c| c.index), Some(4));
        assert_eq!(g.strains[&0].cluster_of(1), Some(3));
        assert!(g.cluster_of(1, 1).is_none());
        assert!(g.cluster_of(8, 1).is_none());
    }

    #[test]
    fn test_duplicate_cluster_rejected() {
        let err = ProteinGraph::from_reader(Cursor::new(
            ">Cluster 0\n0\t1aa, >[0][1]a *\n>Cluster 0\n0\t1aa, >[1][1]a *\n".as_bytes(),
        ))
        .unwrap_err();
        assert!(matches!(err, ReportError::DuplicateCluster { cluster: 0 }));
    }

    #[test]
    fn test_sequence_in_two_clusters_rejected() {
        let err = ProteinGraph::from_reader(Cursor::new(
            ">Cluster 0\n0\t1aa, >[0][1]a *\n1\t1aa, >[1][1]a\n>Cluster 1\n0\t1aa, >[0][1]a *\n".as_bytes(),
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            ReportError::DuplicateMember { strain: 0, seq: 1, first: 0, second: 1 }
        ));
    }

    #[test]
    fn test_nucleotide_pseudogenes_without_representative() {
        let text = "\
>Cluster 0
0\t300nt, >[0][1][cluster_5] a *
1\t290nt, >[1][2][pseudo] b at 95%
>Cluster 1
0\t500nt, >[1][4][pseudo] c *
1\t480nt, >[1][6][pseudo] d at 91%
2\t480nt, >[2][3][pseudo] e at 90%
";
        let g = NucleotideGraph::from_reader(Cursor::new(text.as_bytes())).unwrap();
        assert_eq!(g.total_strains, 3);
        let strain_1 = &g.strains[&1];
        assert_eq!(strain_1.pseudogenes_in_clusters_without_representative(), vec![4, 6]);
        assert!(g.strains[&0].pseudogenes_in_clusters_without_representative().is_empty());
        assert_eq!(g.strains[&2].pseudogenes_in_clusters_without_representative(), vec![3]);
    }
}
