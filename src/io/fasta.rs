// fasta.rs - multi-FASTA alignment reading and PHYLIP/FASTA emission

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bio::io::fasta;

use crate::data::Base;

/// One record read straight off disk, before any column filtering.
pub struct RawRecord {
    pub id: String,
    pub bases: Vec<Base>,
}

/// Reads a multi-FASTA alignment. Every record must be the same length;
/// order of records becomes the sample order used to assign leaf slots
/// (§4.2).
pub fn read_alignment(path: &Path) -> Result<Vec<RawRecord>, String> {
    let file = File::open(path)
        .map_err(|e| format!("fasta: failed to open {}: {e}", path.display()))?;
    let reader = fasta::Reader::new(BufReader::new(file));

    let mut records = Vec::new();
    let mut width = None;
    for record_result in reader.records() {
        let record = record_result
            .map_err(|e| format!("fasta: invalid record in {}: {e}", path.display()))?;
        let bases: Vec<Base> = record
            .seq()
            .iter()
            .map(|&b| Base::from_char(b as char))
            .collect();
        match width {
            None => width = Some(bases.len()),
            Some(w) if w != bases.len() => {
                return Err(format!(
                    "fasta: record '{}' is {} columns wide, expected {} (not an alignment)",
                    record.id(),
                    bases.len(),
                    w
                ))
            }
            _ => {}
        }
        records.push(RawRecord {
            id: record.id().to_string(),
            bases,
        });
    }

    if records.is_empty() {
        return Err(format!("fasta: {} contains no records", path.display()));
    }
    Ok(records)
}

/// Writes `sequences` (label, bases) as relaxed PHYLIP, one line per
/// sequence, ten-character label field followed by a space.
pub fn write_phylip(path: &Path, sequences: &[(String, Vec<Base>)]) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("phylip: failed to create {}: {e}", path.display()))?;
    let mut w = BufWriter::new(file);
    let width = sequences.first().map(|(_, s)| s.len()).unwrap_or(0);
    writeln!(w, " {} {}", sequences.len(), width)
        .map_err(|e| format!("phylip: write error: {e}"))?;
    for (label, bases) in sequences {
        let seq: String = bases.iter().map(|b| b.to_char()).collect();
        writeln!(w, "{label:<10} {seq}").map_err(|e| format!("phylip: write error: {e}"))?;
    }
    println!("✅ PHYLIP alignment written: {}", path.display());
    Ok(())
}

/// Writes `sequences` as a wrapped multi-FASTA file (70 columns per line).
pub fn write_fasta(path: &Path, sequences: &[(String, Vec<Base>)]) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("fasta: failed to create {}: {e}", path.display()))?;
    let mut w = BufWriter::new(file);
    for (label, bases) in sequences {
        writeln!(w, ">{label}").map_err(|e| format!("fasta: write error: {e}"))?;
        for chunk in bases.chunks(70) {
            let line: String = chunk.iter().map(|b| b.to_char()).collect();
            writeln!(w, "{line}").map_err(|e| format!("fasta: write error: {e}"))?;
        }
    }
    println!("✅ FASTA alignment written: {}", path.display());
    Ok(())
}

/// Reads just the reference genome length from a single-record FASTA file,
/// used to seed per-sample `genome_length_without_gaps` when no alignment
/// position is gapped relative to the reference.
pub fn read_reference_length(path: &Path) -> Result<usize, String> {
    let file = File::open(path)
        .map_err(|e| format!("fasta: failed to open reference {}: {e}", path.display()))?;
    let reader = fasta::Reader::new(BufReader::new(file));
    let mut records = reader.records();
    let record = records
        .next()
        .ok_or_else(|| format!("fasta: reference {} contains no records", path.display()))?
        .map_err(|e| format!("fasta: invalid reference record: {e}"))?;
    Ok(record.seq().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn write_phylip_pads_labels_to_ten_chars() {
        let dir = std::env::temp_dir();
        let path = dir.join("phylorecomb_test_write.phy");
        let seqs = vec![("A".to_string(), vec![Base::A, Base::C, Base::G, Base::T])];
        write_phylip(&path, &seqs).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("A          ACGT") || content.contains("A          ACGT\n"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn read_alignment_rejects_unequal_widths() {
        let dir = std::env::temp_dir();
        let path = dir.join("phylorecomb_test_bad.fasta");
        let mut f = File::create(&path).unwrap();
        writeln!(f, ">A\nACGT\n>B\nACG\n").unwrap();
        let err = read_alignment(&path).unwrap_err();
        assert!(err.contains("not an alignment"));
        let _ = std::fs::remove_file(&path);
    }
}
