// src/annotate/proteins.rs

use ahash::AHashMap;
use std::io::Write;

use super::cds::sequence_position;
use crate::errors::PipelineError;
use crate::fasta::{open_fasta, write_record, FastaRecord};
use crate::strains::StrainDir;
use crate::types::SeqIndex;

const PROTEIN_ID_QUALIFIER: &str = "[protein_id=";
const CDS_ID_MARKER: &str = "_cds_";

/// Protein accession a CDS record translates to, if it encodes one.
///
/// Prefers the `[protein_id=...]` qualifier and falls back to the accession
/// embedded in `..._cds_<accession>_<position>`. Pseudogenes have neither.
pub fn cds_protein_id(record: &FastaRecord) -> Option<&str> {
    let description = record.description();
    if let Some(start) = description.find(PROTEIN_ID_QUALIFIER) {
        let rest = &description[start + PROTEIN_ID_QUALIFIER.len()..];
        return rest.split(']').next().filter(|id| !id.is_empty());
    }
    let (_, tail) = record.id.rsplit_once(CDS_ID_MARKER)?;
    let (accession, _) = tail.rsplit_once('_')?;
    Some(accession).filter(|a| !a.is_empty())
}

/// Protein accession -> CDS position for one strain. First CDS wins for repeated accessions.
pub fn protein_positions(strain: &StrainDir) -> Result<AHashMap<String, SeqIndex>, PipelineError> {
    let mut positions = AHashMap::new();
    for record in open_fasta(strain.cds_path()?)? {
        let record = record?;
        let seq = sequence_position(&record.id).ok_or_else(|| PipelineError::MalformedCdsHeader {
            strain: strain.index,
            header: record.header.clone(),
        })?;
        if let Some(protein_id) = cds_protein_id(&record) {
            positions.entry(protein_id.to_string()).or_insert(seq);
        }
    }
    Ok(positions)
}

/// Rewrites one strain's protein file with `[strain][position]` prefixed to every header.
pub fn index_strain_proteins<W: Write>(strain: &StrainDir, out: &mut W) -> Result<usize, PipelineError> {
    let positions = protein_positions(strain)?;
    let mut written = 0;
    for record in open_fasta(strain.protein_path()?)? {
        let record = record?;
        let seq = *positions
            .get(&record.id)
            .ok_or_else(|| PipelineError::UnmatchedProtein {
                strain: strain.index,
                protein_id: record.id.clone(),
            })?;
        write_record(out, &format!("[{}][{}]{}", strain.index, seq, record.header), &record.seq)?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STRAIN_INDEX_FILE;
    use std::fs;
    use std::path::Path;

    fn record(header: &str) -> FastaRecord {
        FastaRecord {
            id: header.split_whitespace().next().unwrap().to_string(),
            header: header.to_string(),
            seq: String::new(),
        }
    }

    fn strain_with(root: &Path, cds: &str, proteins: &str) -> StrainDir {
        let dir = root.join("[3]GCF_9");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STRAIN_INDEX_FILE), "3").unwrap();
        fs::write(dir.join("GCF_9_cds_from_genomic.fna"), cds).unwrap();
        fs::write(dir.join("GCF_9_protein.faa"), proteins).unwrap();
        StrainDir::open(dir).unwrap()
    }

    #[test]
    fn test_protein_id_sources() {
        assert_eq!(
            cds_protein_id(&record("lcl|NZ_1_cds_WP_1.1_4 [gene=x] [protein_id=WP_1.1]")),
            Some("WP_1.1")
        );
        assert_eq!(cds_protein_id(&record("lcl|NZ_1_cds_WP_7.2_12 [gene=x]")), Some("WP_7.2"));
        assert_eq!(cds_protein_id(&record("lcl|NZ_1_cds_5 [pseudo=true]")), None);
    }

    #[test]
    fn test_proteins_get_cds_positions() {
        let root = tempfile::tempdir().unwrap();
        let strain = strain_with(
            root.path(),
            ">lcl|NZ_1_cds_WP_1.1_1 [protein_id=WP_1.1]\nATG\n\
             >lcl|NZ_1_cds_2 [pseudo=true]\nATG\n\
             >lcl|NZ_1_cds_WP_2.1_3 [protein_id=WP_2.1]\nATG\n",
            ">WP_2.1 chaperone\nMKV\n>WP_1.1 dnaA\nMSL\n",
        );

        let mut out = Vec::new();
        assert_eq!(index_strain_proteins(&strain, &mut out).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, ">[3][3]WP_2.1 chaperone\nMKV\n>[3][1]WP_1.1 dnaA\nMSL\n");
    }

    #[test]
    fn test_unmatched_protein_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let strain = strain_with(root.path(), ">lcl|NZ_1_cds_WP_1.1_1\nATG\n", ">WP_9.1 orphan\nM\n");
        match index_strain_proteins(&strain, &mut Vec::new()) {
            Err(PipelineError::UnmatchedProtein { strain: 3, protein_id }) => assert_eq!(protein_id, "WP_9.1"),
            other => panic!("expected unmatched protein, got {other:?}"),
        }
    }
}
