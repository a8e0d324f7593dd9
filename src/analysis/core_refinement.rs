// src/analysis/core_refinement.rs

use crate::graph::{meets_core_threshold, ProteinGraph};
use crate::types::ClusterIndex;

/// Stage-1 core clusters split by copy number.
///
/// - `clean`: every member strain contributes exactly one sequence
/// - `multi_copy`: some strains carry paralogs, but the single-copy strains
///   alone still reach the core threshold
/// - `formerly_core`: core by raw strain count only; kept for reporting and
///   never counted as core
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreRefinement {
    pub clean: Vec<ClusterIndex>,
    pub multi_copy: Vec<ClusterIndex>,
    pub formerly_core: Vec<ClusterIndex>,
}

impl CoreRefinement {
    /// Clusters that survive refinement (clean plus multi-copy core).
    pub fn refined_core_count(&self) -> usize {
        self.clean.len() + self.multi_copy.len()
    }
}

pub fn refine_core_clusters(graph: &ProteinGraph) -> CoreRefinement {
    let mut refinement = CoreRefinement::default();

    for index in graph.sorted_clusters() {
        let cluster = &graph.clusters[&index];
        if !cluster.is_core(graph.total_strains) {
            continue;
        }
        if !cluster.is_multi_copy() {
            refinement.clean.push(index);
            continue;
        }

        let stripped = cluster.multi_copy_strains().len();
        let single_copy_strains = cluster.strain_count() - stripped;
        if meets_core_threshold(single_copy_strains, graph.total_strains) {
            refinement.multi_copy.push(index);
        } else {
            log::debug!(
                "Cluster {} drops out of core after removing {} multi-copy strains",
                index,
                stripped
            );
            refinement.formerly_core.push(index);
        }
    }

    log::info!(
        "Core refinement: {} clean, {} multi-copy, {} formerly core",
        refinement.clean.len(),
        refinement.multi_copy.len(),
        refinement.formerly_core.len()
    );
    refinement
}
