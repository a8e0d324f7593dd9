//src/types.rs

/// Stable per-strain identity, assigned once at download time.
pub type StrainIndex = u32;

/// Cluster id, unique within a single report.
pub type ClusterIndex = u32;

/// 1-based position of a coding sequence within its strain's CDS file.
pub type SeqIndex = u32;

/// One parsed member line of a cluster report.
/// For example (stage-2):
///  0	1023nt, >[4][17][cluster_230] lcl|NZ_... *
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub strain: StrainIndex,
    pub seq: SeqIndex,
    pub length: Option<u32>,          // mandatory for stage-2 only
    pub is_pseudogene: bool,          // next bracketed fragment is `[pseudo...` (or its truncation)
    pub tagged_cluster: Option<ClusterIndex>, // `[cluster_<id>]` annotation
    pub is_representative: bool,      // trailing `*`
}

/// A single `>Cluster N` block with all of its member lines.
#[derive(Debug, Clone)]
pub struct ClusterBlock {
    pub id: ClusterIndex,
    pub members: Vec<MemberRecord>,
}

/// A structured representation of one row in the per-strain stage-1 table.
///  strain  clusters  core  singletons  missingCore%  contigs  pseudogenes
#[derive(Debug, Clone)]
pub struct StrainStatsRow {
    pub strain: StrainIndex,
    pub total_clusters: usize,
    pub core_clusters: usize,
    pub singleton_clusters: usize,
    pub missing_core_pct: f64,
    pub contigs: Option<usize>,
    pub pseudogenes: Option<usize>,
}

/// Contig and pseudogene counts read straight from a strain's downloaded files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenomicStats {
    pub contigs: usize,
    pub pseudogenes: usize,
}
