// stats_table.rs - per-sample recombination statistics TSV writer

use std::fs::File;
use std::path::Path;

use csv::WriterBuilder;

use crate::data::SampleStats;

/// Writes one row per sequence slot -- every leaf sample plus every
/// reconstructed internal node (spec.md §6) -- to
/// `{out_prefix}.per_branch_statistics.csv`.
pub fn write_stats_table(path: &Path, rows: &[SampleStats]) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("stats table: failed to create {}: {e}", path.display()))?;
    let mut w = WriterBuilder::new().delimiter(b',').from_writer(file);

    w.write_record([
        "Sample",
        "Number_of_recombinations",
        "Number_of_SNPs",
        "Genome_length_without_gaps",
        "Number_of_blocks",
        "Bases_in_recombinations",
        "Bases_in_recombinations_including_gaps",
        "Branch_bases_in_recombinations",
        "Branch_bases_in_recombinations_including_gaps",
        "Genome_length_excluding_blocks_and_gaps",
    ])
    .map_err(|e| format!("stats table: write error: {e}"))?;

    for row in rows {
        w.write_record([
            row.sample_name.clone(),
            row.number_of_recombinations.to_string(),
            row.number_of_snps.to_string(),
            row.genome_length_without_gaps.to_string(),
            row.number_of_blocks.to_string(),
            row.bases_in_recombinations.to_string(),
            row.bases_in_recombinations_including_gaps.to_string(),
            row.branch_bases_in_recombinations.to_string(),
            row.branch_bases_in_recombinations_including_gaps.to_string(),
            row.genome_length_excluding_blocks_and_gaps.to_string(),
        ])
        .map_err(|e| format!("stats table: write error: {e}"))?;
    }

    w.flush()
        .map_err(|e| format!("stats table: flush error: {e}"))?;
    println!("✅ Per-branch statistics written: {}", path.display());
    Ok(())
}
