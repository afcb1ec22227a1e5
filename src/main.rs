// main.rs - CLI entry point

use std::path::Path;
use std::time::Instant;

use phylorecomb::cli::{validate_args, Args, ScanConfig};
use phylorecomb::core::{finalize_genome_length_stats, rescale_tree, run_pipeline, IdentityRefiner};
use phylorecomb::data::AlignmentStore;
use phylorecomb::io::fasta::{read_alignment, read_reference_length, write_fasta, write_phylip};
use phylorecomb::io::newick::parse_newick;
use phylorecomb::io::stats_table::write_stats_table;
use phylorecomb::io::vcf::{read_positions, write_vcf};
use phylorecomb::core::tree::Tree;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();

    if args.generate_config {
        println!("{}", ScanConfig::generate_sample());
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let validated = validate_args(&args)?;

    println!("🚀 phylorecomb v{}", phylorecomb::VERSION);
    println!("⚡ Strategy: reconstruct ancestors → scan branches in parallel → mask → rescale");

    if let Some(n) = validated.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .expect("failed to configure thread pool");
        println!("🧵 Threads: {}", n);
    } else {
        println!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
    }

    let total_start = Instant::now();

    println!("📖 Loading alignment: {}", validated.alignment_path);
    let records = read_alignment(Path::new(&validated.alignment_path))?;
    let sample_order: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    let rows: Vec<Vec<_>> = records.into_iter().map(|r| r.bases).collect();

    println!("📖 Loading variant sites: {}", validated.vcf_path);
    let snp_location = read_positions(Path::new(&validated.vcf_path))?;

    println!("📖 Loading starting tree: {}", validated.tree_path);
    let tree_text = std::fs::read_to_string(&validated.tree_path)
        .map_err(|e| format!("failed to read tree file '{}': {e}", validated.tree_path))?;
    let newick = parse_newick(&tree_text)?;
    let mut tree = Tree::load(&newick, &sample_order)?;

    println!("📖 Loading reference genome: {}", validated.reference_path);
    let reference_genome_length = read_reference_length(Path::new(&validated.reference_path))?;

    let mut store = AlignmentStore::load(rows, snp_location)
        .map_err(|e| format!("alignment/VCF mismatch: {e}"))?;
    store.ensure_internal_rows(tree.internal_count());

    println!(
        "🧬 {} samples, {} variable sites, {} tree nodes",
        tree.sample_count(),
        store.col_count(),
        tree.len()
    );

    let mut refiner = IdentityRefiner;
    let result = run_pipeline(&mut store, &mut tree, &validated.pipeline_config, &mut refiner);
    println!(
        "🔁 Converged after {} iteration(s)",
        result.iterations
    );

    let mut stats = result.stats;
    finalize_genome_length_stats(&store, &tree, reference_genome_length, &mut stats);
    rescale_tree(&mut tree, &result.original_branch_snps, &result.remaining_branch_snps);

    // §4.1/§6: every emitted output spans all S+I sequence slots (leaves plus
    // reconstructed internal nodes), not just the leaf samples.
    let mut labels_by_slot = vec![String::new(); store.row_count()];
    for node in tree.iter() {
        labels_by_slot[node.seq_slot] = node.label.clone();
    }
    let active_rows: Vec<usize> = (0..store.row_count()).collect();

    let (final_cols, _final_locs) = store.refilter(&active_rows);
    let rotated = store.rotate(&active_rows, &final_cols);
    let sequences: Vec<(String, Vec<_>)> = labels_by_slot
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let seq = rotated.iter().map(|col| col[i]).collect();
            (label.clone(), seq)
        })
        .collect();

    let prefix = &validated.output_prefix;
    write_phylip(Path::new(&format!("{prefix}.filtered_polymorphic_sites.phylip")), &sequences)?;
    write_fasta(Path::new(&format!("{prefix}.filtered_polymorphic_sites.fasta")), &sequences)?;

    let root_slot = tree.node(tree.root()).seq_slot;
    let vcf_sites: Vec<_> = final_cols
        .iter()
        .zip(rotated.iter())
        .map(|(&col, col_bases)| {
            let pos = store.snp_location()[col];
            let reference = store.read(root_slot, col);
            let calls = labels_by_slot
                .iter()
                .zip(col_bases.iter())
                .map(|(label, &b)| (label.clone(), b))
                .collect();
            (pos, reference, calls)
        })
        .collect();
    write_vcf(
        Path::new(&format!("{prefix}.summary_of_snp_distribution.vcf")),
        "genome",
        &vcf_sites,
    )?;

    let mut stats_rows: Vec<_> = tree
        .iter()
        .map(|n| (n.seq_slot, stats.remove(&n.id).expect("every node has a stats entry")))
        .collect();
    stats_rows.sort_by_key(|(slot, _)| *slot);
    let stats_rows: Vec<_> = stats_rows.into_iter().map(|(_, s)| s).collect();
    write_stats_table(
        Path::new(&format!("{prefix}.per_branch_statistics.csv")),
        &stats_rows,
    )?;

    std::fs::write(format!("{prefix}.final_tree.tre"), tree.emit())
        .map_err(|e| format!("failed to write final tree: {e}"))?;
    println!("✅ Final tree written: {prefix}.final_tree.tre");

    println!("⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}
