// src/analysis/strain_stats.rs

use ahash::AHashMap;

use crate::graph::{NucleotideGraph, ProteinGraph};
use crate::types::{GenomicStats, StrainIndex, StrainStatsRow};

/// Percentage of the dataset's core clusters a strain is missing.
pub fn missing_core_pct(strain_core: usize, total_core_clusters: usize) -> f64 {
    if total_core_clusters == 0 {
        return 0.0;
    }
    100.0 * total_core_clusters.saturating_sub(strain_core) as f64 / total_core_clusters as f64
}

/// One row per stage-1 strain, sorted by strain index.
/// Genomic counts are filled in when `genomic` has an entry for the strain.
pub fn build_strain_stats(
    graph: &ProteinGraph,
    genomic: Option<&AHashMap<StrainIndex, GenomicStats>>,
) -> Vec<StrainStatsRow> {
    graph
        .sorted_strains()
        .into_iter()
        .map(|index| {
            let strain = &graph.strains[&index];
            let core_clusters = strain.core_clusters(graph.total_strains).len();
            let genomic_stats = genomic.and_then(|g| g.get(&index));
            StrainStatsRow {
                strain: index,
                total_clusters: strain.cluster_count(),
                core_clusters,
                singleton_clusters: strain.singleton_clusters().len(),
                missing_core_pct: missing_core_pct(core_clusters, graph.total_core_clusters),
                contigs: genomic_stats.map(|g| g.contigs),
                pseudogenes: genomic_stats.map(|g| g.pseudogenes),
            }
        })
        .collect()
}

/// Stage-2 per-strain pseudogene counts: (strain, all pseudogenes, pseudogenes in
/// clusters without a protein member), sorted by strain index.
pub fn orphan_pseudogene_counts(graph: &NucleotideGraph) -> Vec<(StrainIndex, usize, usize)> {
    graph
        .sorted_strains()
        .into_iter()
        .map(|index| {
            let strain = &graph.strains[&index];
            let all: usize = strain.clusters().map(|c| c.pseudogenes_of(index).len()).sum();
            let orphaned = strain.pseudogenes_in_clusters_without_representative().len();
            (index, all, orphaned)
        })
        .collect()
}
