// src/lib.rs
pub mod types;
pub mod errors;
pub mod config;
pub mod cluster_report;
pub mod graph;
pub mod analysis;
pub mod fasta;
pub mod strains;
pub mod annotate;

use std::fmt::Write as FmtWrite;

use crate::analysis::{
    build_strain_stats, orphan_pseudogene_counts, refine_core_clusters, type_clusters, ClusterType,
    CoreRefinement, CrossLink, TypingSummary,
};
use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::graph::{NucleotideGraph, ProteinGraph};
use crate::strains::{collect_genomic_stats, list_strain_dirs};
use crate::types::{StrainIndex, StrainStatsRow};

pub use crate::annotate::{extract_representatives_and_pseudogenes, preprocess_proteins, PassSummary};

/// Stage-1 statistics. Only structured data is stored; text is rendered on demand.
pub struct Stage1Results {
    pub total_strains: usize,
    pub total_clusters: usize,
    pub total_core_clusters: usize,

    /// One row per strain, sorted by strain index
    pub strain_rows: Vec<StrainStatsRow>,

    pub refinement: CoreRefinement,
}

impl Stage1Results {
    pub fn from_graph(graph: &ProteinGraph, rows: Vec<StrainStatsRow>) -> Self {
        Self {
            total_strains: graph.total_strains,
            total_clusters: graph.clusters.len(),
            total_core_clusters: graph.total_core_clusters,
            strain_rows: rows,
            refinement: refine_core_clusters(graph),
        }
    }

    /// Per-strain table as TSV. Genomic columns are `NA` when not collected.
    pub fn get_strain_stats_tsv(&self) -> String {
        let mut output = String::new();
        output.push_str("strain\tclusters\tcore\tsingletons\tmissing_core_pct\tcontigs\tpseudogenes\n");
        for row in &self.strain_rows {
            writeln!(
                output,
                "{}\t{}\t{}\t{}\t{:.2}\t{}\t{}",
                row.strain,
                row.total_clusters,
                row.core_clusters,
                row.singleton_clusters,
                row.missing_core_pct,
                optional_count(row.contigs),
                optional_count(row.pseudogenes)
            )
            .unwrap();
        }
        output
    }

    pub fn get_core_refinement_text(&self) -> String {
        let mut output = String::new();
        writeln!(output, "strains\t{}", self.total_strains).unwrap();
        writeln!(output, "clusters\t{}", self.total_clusters).unwrap();
        writeln!(output, "core_clusters\t{}", self.total_core_clusters).unwrap();
        writeln!(output, "clean_core\t{}", self.refinement.clean.len()).unwrap();
        writeln!(output, "multi_copy_core\t{}", self.refinement.multi_copy.len()).unwrap();
        writeln!(output, "formerly_core\t{}", self.refinement.formerly_core.len()).unwrap();
        writeln!(output, "refined_core\t{}", self.refinement.refined_core_count()).unwrap();
        output
    }
}

/// Stage-2 typing and cross-link results.
pub struct Stage2Results {
    pub total_strains: usize,
    pub total_clusters: usize,
    pub typing: TypingSummary,

    /// Mean length over all protein (non-pseudogene) members of the report
    pub avg_protein_length: Option<f64>,
    pub avg_pseudogene_length: Option<f64>,

    /// (strain, pseudogenes, pseudogenes in clusters without a protein member)
    pub orphan_pseudogenes: Vec<(StrainIndex, usize, usize)>,
}

impl Stage2Results {
    pub fn from_graphs(nucleotide: &NucleotideGraph, protein: &ProteinGraph) -> Self {
        let (mut protein_total, mut protein_count) = (0u64, 0usize);
        let (mut pseudo_total, mut pseudo_count) = (0u64, 0usize);
        for cluster in nucleotide.clusters.values() {
            protein_total += cluster.protein_length_total();
            protein_count += cluster.protein_count();
            pseudo_total += cluster.pseudogene_length_total();
            pseudo_count += cluster.pseudogene_count();
        }

        Self {
            total_strains: nucleotide.total_strains,
            total_clusters: nucleotide.clusters.len(),
            typing: type_clusters(nucleotide, protein),
            avg_protein_length: mean(protein_total, protein_count),
            avg_pseudogene_length: mean(pseudo_total, pseudo_count),
            orphan_pseudogenes: orphan_pseudogene_counts(nucleotide),
        }
    }

    pub fn get_cluster_type_counts_text(&self) -> String {
        let mut output = String::new();
        writeln!(output, "strains\t{}", self.total_strains).unwrap();
        writeln!(output, "clusters\t{}", self.total_clusters).unwrap();
        for cluster_type in ClusterType::ALL {
            writeln!(output, "{}\t{}", cluster_type, self.typing.count(cluster_type)).unwrap();
        }
        writeln!(output, "unresolved_links\t{}", self.typing.unresolved_count()).unwrap();
        writeln!(output, "avg_protein_length\t{}", optional_mean(self.avg_protein_length)).unwrap();
        writeln!(output, "avg_pseudogene_length\t{}", optional_mean(self.avg_pseudogene_length)).unwrap();
        output
    }

    /// One row per Type 1 / Type 3 cluster. Unresolved links keep their member
    /// and leave the stage-1 columns as `NA`.
    pub fn get_cross_links_tsv(&self) -> String {
        let mut output = String::new();
        output.push_str("cluster\ttype\tstrain\tseq\tprotein_cluster\tprotein_strains\tprotein_members\n");
        for typing in &self.typing.typings {
            match &typing.link {
                CrossLink::Linked {
                    strain,
                    seq,
                    protein_cluster,
                    strain_count,
                    member_count,
                } => {
                    writeln!(
                        output,
                        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                        typing.cluster, typing.cluster_type, strain, seq, protein_cluster, strain_count, member_count
                    )
                    .unwrap();
                }
                CrossLink::Unresolved { strain, seq } => {
                    writeln!(
                        output,
                        "{}\t{}\t{}\t{}\tNA\tNA\tNA",
                        typing.cluster, typing.cluster_type, strain, seq
                    )
                    .unwrap();
                }
                CrossLink::NotLinked => {}
            }
        }
        output
    }

    pub fn get_orphan_pseudogenes_tsv(&self) -> String {
        let mut output = String::new();
        output.push_str("strain\tpseudogenes\twithout_representative\n");
        for (strain, all, orphaned) in &self.orphan_pseudogenes {
            writeln!(output, "{}\t{}\t{}", strain, all, orphaned).unwrap();
        }
        output
    }
}

fn optional_count(value: Option<usize>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string())
}

fn optional_mean(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "NA".to_string())
}

fn mean(total: u64, count: usize) -> Option<f64> {
    (count > 0).then(|| total as f64 / count as f64)
}

/// Stage-1 statistics from the protein cluster report.
///
/// With `with_genomic_stats`, every strain directory is also scanned (in
/// parallel) for contig and pseudogene counts.
pub fn analyze_stage1(config: &PipelineConfig, with_genomic_stats: bool) -> Result<Stage1Results, PipelineError> {
    let graph = ProteinGraph::from_report(config.protein_clusters_path())?;

    let genomic = if with_genomic_stats {
        let strains = list_strain_dirs(&config.strains_dir)?;
        Some(collect_genomic_stats(&strains)?)
    } else {
        None
    };
    let rows = build_strain_stats(&graph, genomic.as_ref());
    Ok(Stage1Results::from_graph(&graph, rows))
}

/// Stage-2 typing, cross-linked against the stage-1 report.
pub fn analyze_stage2(config: &PipelineConfig) -> Result<Stage2Results, PipelineError> {
    let protein = ProteinGraph::from_report(config.protein_clusters_path())?;
    let nucleotide = NucleotideGraph::from_report(config.cds_clusters_path())?;
    Ok(Stage2Results::from_graphs(&nucleotide, &protein))
}
