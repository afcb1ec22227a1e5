// vcf.rs - minimal VCF reading/writing for the recombination-masked sites list

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::Deserialize;

use crate::data::Base;

#[derive(Debug, Deserialize)]
struct VcfRecord {
    #[serde(rename = "#CHROM")]
    _chrom: String,
    #[serde(rename = "POS")]
    pos: u64,
    #[serde(rename = "ID")]
    _id: String,
    #[serde(rename = "REF")]
    _reference: String,
    #[serde(rename = "ALT")]
    _alt: String,
}

/// Reads just the genome positions a VCF lists, tab-separated, skipping
/// `##` meta-lines. Used when `--vcf` supplies externally-called variant
/// sites instead of a pre-built multi-FASTA alignment.
pub fn read_positions(path: &Path) -> Result<Vec<u64>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("vcf: failed to read {}: {e}", path.display()))?;
    let body: String = content
        .lines()
        .filter(|l| !l.starts_with("##"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(body.as_bytes());

    let mut positions = Vec::new();
    for record in reader.deserialize() {
        let record: VcfRecord =
            record.map_err(|e| format!("vcf: malformed record in {}: {e}", path.display()))?;
        positions.push(record.pos);
    }
    Ok(positions)
}

/// Writes the final SNP sites (post-masking) as a VCF body, one biallelic
/// line per retained column. `reference_base` and genotype calls come from
/// the root-node reconstruction.
pub fn write_vcf(
    path: &Path,
    chrom: &str,
    sites: &[(u64, Base, Vec<(String, Base)>)],
) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("vcf: failed to create {}: {e}", path.display()))?;
    let mut w = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(file);

    let sample_names: Vec<&str> = sites
        .first()
        .map(|(_, _, calls)| calls.iter().map(|(name, _)| name.as_str()).collect())
        .unwrap_or_default();

    w.write_record(["##fileformat=VCFv4.2"])
        .map_err(|e| format!("vcf: write error: {e}"))?;
    let mut header = vec![
        "#CHROM".to_string(),
        "POS".to_string(),
        "ID".to_string(),
        "REF".to_string(),
        "ALT".to_string(),
        "QUAL".to_string(),
        "FILTER".to_string(),
        "INFO".to_string(),
        "FORMAT".to_string(),
    ];
    header.extend(sample_names.iter().map(|s| s.to_string()));
    w.write_record(&header)
        .map_err(|e| format!("vcf: write error: {e}"))?;

    for (pos, reference, calls) in sites {
        let mut alts: Vec<char> = calls
            .iter()
            .map(|(_, b)| b.to_char())
            .filter(|&c| c != reference.to_char())
            .collect();
        alts.sort_unstable();
        alts.dedup();
        let alt_field = if alts.is_empty() {
            ".".to_string()
        } else {
            alts.iter().collect::<String>()
        };

        let mut record = vec![
            chrom.to_string(),
            pos.to_string(),
            ".".to_string(),
            reference.to_char().to_string(),
            alt_field.clone(),
            ".".to_string(),
            "PASS".to_string(),
            ".".to_string(),
            "GT".to_string(),
        ];
        for (_, base) in calls {
            let gt = if base == reference {
                "0".to_string()
            } else if let Some(idx) = alts.iter().position(|&c| c == base.to_char()) {
                (idx + 1).to_string()
            } else {
                ".".to_string()
            };
            record.push(gt);
        }
        w.write_record(&record)
            .map_err(|e| format!("vcf: write error: {e}"))?;
    }

    w.flush().map_err(|e| format!("vcf: flush error: {e}"))?;
    println!("✅ VCF written: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_positions_skips_meta_lines() {
        let dir = std::env::temp_dir();
        let path = dir.join("phylorecomb_test.vcf");
        std::fs::write(
            &path,
            "##fileformat=VCFv4.2\n##contig=<ID=1>\n#CHROM\tPOS\tID\tREF\tALT\n1\t100\t.\tA\tT\n1\t205\t.\tC\tG\n",
        )
        .unwrap();
        let positions = read_positions(&path).unwrap();
        assert_eq!(positions, vec![100, 205]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn write_vcf_emits_one_line_per_site() {
        let dir = std::env::temp_dir();
        let path = dir.join("phylorecomb_test_out.vcf");
        let sites = vec![(
            150u64,
            Base::A,
            vec![("s1".to_string(), Base::A), ("s2".to_string(), Base::T)],
        )];
        write_vcf(&path, "genome", &sites).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("150"));
        assert!(content.contains("s1"));
        let _ = std::fs::remove_file(&path);
    }
}
