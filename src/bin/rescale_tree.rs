// rescale_tree.rs - standalone utility: rescale an unscaled Newick tree from
// a previously-computed per-branch SNP count table (spec.md §4.5), without
// re-running the scan.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use csv::ReaderBuilder;
use serde::Deserialize;

use phylorecomb::core::tree::Tree;
use phylorecomb::io::newick::{parse_newick, write_newick, NewickNode};

#[derive(Parser, Debug)]
#[command(
    name = "rescale_tree",
    about = "Rescale a Newick tree's branch lengths from a branch-SNP-count table"
)]
struct Cli {
    /// unscaled Newick tree (the starting tree handed to phylorecomb)
    #[arg(long)]
    tree: PathBuf,

    /// TSV with columns: label, original_branch_snps, remaining_branch_snps
    #[arg(long)]
    branch_snps: PathBuf,

    /// path to write the rescaled Newick tree
    #[arg(long)]
    output: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BranchSnpRow {
    label: String,
    original_branch_snps: usize,
    remaining_branch_snps: usize,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let tree_text = std::fs::read_to_string(&cli.tree)
        .map_err(|e| format!("failed to read tree '{}': {e}", cli.tree.display()))?;
    let newick = parse_newick(&tree_text)?;
    let leaf_names = collect_leaf_names(&newick);
    let mut tree = Tree::load(&newick, &leaf_names)?;

    let file = std::fs::File::open(&cli.branch_snps)
        .map_err(|e| format!("failed to open '{}': {e}", cli.branch_snps.display()))?;
    let mut reader = ReaderBuilder::new().delimiter(b'\t').from_reader(file);

    let mut original_by_label = HashMap::new();
    let mut remaining_by_label = HashMap::new();
    for record in reader.deserialize() {
        let row: BranchSnpRow =
            record.map_err(|e| format!("malformed row in '{}': {e}", cli.branch_snps.display()))?;
        original_by_label.insert(row.label.clone(), row.original_branch_snps);
        remaining_by_label.insert(row.label, row.remaining_branch_snps);
    }

    // A node absent from the table (e.g. internal nodes when the table only
    // lists leaves) is left unscaled: original == remaining == 1 gives a
    // rescale factor of 1.0 rather than `rescale_tree`'s zero-original default.
    let mut original_branch_snps = HashMap::new();
    let mut remaining_branch_snps = HashMap::new();
    for node in tree.iter() {
        let original = original_by_label.get(&node.label).copied().unwrap_or(1);
        let remaining = remaining_by_label.get(&node.label).copied().unwrap_or(1);
        original_branch_snps.insert(node.id, original);
        remaining_branch_snps.insert(node.id, remaining);
    }

    phylorecomb::core::rescale_tree(&mut tree, &original_branch_snps, &remaining_branch_snps);

    std::fs::write(&cli.output, write_newick(&tree))
        .map_err(|e| format!("failed to write '{}': {e}", cli.output.display()))?;
    println!("✅ Rescaled tree written: {}", cli.output.display());
    Ok(())
}

fn collect_leaf_names(node: &NewickNode) -> Vec<String> {
    match node {
        NewickNode::Leaf { name, .. } => vec![name.clone()],
        NewickNode::Internal { children, .. } => {
            children.iter().flat_map(collect_leaf_names).collect()
        }
    }
}
