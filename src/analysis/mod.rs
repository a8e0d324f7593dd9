pub mod cluster_typing;
pub mod core_refinement;
pub mod strain_stats;

pub use cluster_typing::{type_clusters, ClusterType, ClusterTyping, CrossLink, TypingSummary};
pub use core_refinement::{refine_core_clusters, CoreRefinement};
pub use strain_stats::{build_strain_stats, missing_core_pct, orphan_pseudogene_counts};
