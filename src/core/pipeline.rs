// pipeline.rs - Step F: the outer fixed-point loop, and the two-phase
// compute/apply parallel dispatch across branches described in spec.md §5.
//
// Each outer iteration: reconstruct ancestors (serial, §4.3), then compute
// every branch's candidate blocks in parallel (read-only over the store,
// §5's "no lock required" independence), then apply the accepted blocks to
// the store and the tree sequentially (cheap relative to the scan itself).
// The loop repeats until a pass accepts no blocks anywhere.

use std::collections::HashMap;

use rayon::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::core::reconstruct::reconstruct;
use crate::core::scanner::{
    apply_trimming, mask_and_record, merge_adjacent_blocks, scan_branch, BranchContext,
    BranchSequence, extend_end_of_block_left_over_gap, extend_end_of_block_right_over_gap,
    WindowConfig,
};
use crate::core::tree::{NodeId, RecombinationBlock, Tree};
use crate::data::{AlignmentStore, SampleStats};

/// Tunables for one run of the outer fixed-point loop.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub window: WindowConfig,
    pub trimming_ratio: f64,
    /// Safety bound on outer iterations (testable property 13: the loop is
    /// guaranteed to converge because masked bases can never re-propose a
    /// block, but a bound keeps a malformed input from looping forever).
    pub max_iterations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            window: WindowConfig {
                window_min: 100,
                window_max: 10_000,
                p_value_threshold: 0.05,
                min_snps: 3,
                extensive_search: false,
            },
            trimming_ratio: 0.0,
            max_iterations: 1000,
        }
    }
}

/// Hook for rebuilding tree topology/branch lengths between outer
/// iterations using an external maximum-likelihood tool. Out of scope for
/// this core (spec.md §1's "driver scripts that orchestrate external
/// maximum-likelihood tree builders" are an external collaborator); the
/// default no-op keeps the core's own convergence loop self-contained.
pub trait TreeRefiner {
    fn refine(&mut self, _tree: &mut Tree, _store: &mut AlignmentStore) {}
}

/// The default refiner: the topology and branch lengths handed in are used
/// as-is for every outer iteration.
pub struct IdentityRefiner;

impl TreeRefiner for IdentityRefiner {}

/// Everything the pipeline produces once the fixed point is reached.
pub struct PipelineResult {
    pub stats: HashMap<NodeId, SampleStats>,
    pub original_branch_snps: HashMap<NodeId, usize>,
    pub remaining_branch_snps: HashMap<NodeId, usize>,
    pub iterations: usize,
}

struct BranchPlan {
    child: NodeId,
    child_slot: usize,
    ctx: BranchContext,
    blocks: Vec<RecombinationBlock>,
}

/// Runs the Branch Recombination Scanner to convergence, mutating `store`
/// (masking) and `tree` (accepted blocks) in place.
pub fn run_pipeline(
    store: &mut AlignmentStore,
    tree: &mut Tree,
    config: &PipelineConfig,
    refiner: &mut dyn TreeRefiner,
) -> PipelineResult {
    let mut stats: HashMap<NodeId, SampleStats> = HashMap::new();
    for node in tree.iter() {
        stats.insert(node.id, SampleStats::new(node.label.clone()));
    }

    let mut original_branch_snps: HashMap<NodeId, usize> = HashMap::new();
    let mut remaining_branch_snps: HashMap<NodeId, usize> = HashMap::new();
    let mut first_pass = true;
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        reconstruct(store, tree);
        refiner.refine(tree, store);

        let branches = tree.post_order_branches();
        let pb = ProgressBar::new(branches.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} branches scanned (pass {msg})")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(iterations.to_string());

        // Compute phase: independent per branch, safe to run in parallel
        // (§5) because each branch only reads rows `p` and `c`.
        let plans: Vec<BranchPlan> = branches
            .par_iter()
            .map(|&(parent, child)| {
                let plan = compute_branch_plan(store, tree, parent, child, config);
                pb.inc(1);
                plan
            })
            .collect();
        pb.finish_and_clear();

        // Apply phase: sequential, each branch writes only its own child
        // row and its own stats entry, so ordering across branches does not
        // affect the result -- only the per-branch tie-break order (already
        // deterministic inside `scan_branch`) does.
        let mut accepted_any = false;
        for plan in plans {
            if first_pass {
                original_branch_snps.insert(plan.child, plan.ctx.branch_snp_count());
            }

            if plan.blocks.is_empty() {
                remaining_branch_snps.insert(plan.child, plan.ctx.branch_snp_count());
                continue;
            }
            accepted_any = true;
            let snp_location = store.snp_location().to_vec();
            let node_stats = stats
                .get_mut(&plan.child)
                .expect("a stats entry exists for every tree node");
            for block in &plan.blocks {
                mask_and_record(store, plan.child_slot, &plan.ctx, &snp_location, *block, node_stats);
                tree.node_mut(plan.child).blocks.push(*block);
            }
        }

        first_pass = false;

        if !accepted_any || iterations >= config.max_iterations {
            break;
        }
    }

    // A masking round can reduce a branch's remaining SNP count after the
    // plan for that branch was computed; recompute once more against the
    // fully-converged store so `number_of_snps` and the rescale factor are
    // both exact (spec.md §3, §4.5).
    for (parent, child) in tree.post_order_branches() {
        let parent_slot = tree.node(parent).seq_slot;
        let child_slot = tree.node(child).seq_slot;
        let ctx = BranchContext::build(store, parent_slot, child_slot);
        if let Some(node_stats) = stats.get_mut(&child) {
            node_stats.number_of_snps = ctx.branch_snp_count();
        }
        remaining_branch_snps.insert(child, ctx.branch_snp_count());
    }

    PipelineResult {
        stats,
        original_branch_snps,
        remaining_branch_snps,
        iterations,
    }
}

/// Fills in `genome_length_without_gaps` and
/// `genome_length_excluding_blocks_and_gaps` from the converged store state.
///
/// Open Question resolution (see DESIGN.md): the Alignment Store only ever
/// holds variable-site columns, so a node's gap count is taken over those
/// columns and subtracted from the externally-supplied reference genome
/// length, on the assumption that non-variable genome positions carry no
/// gaps -- true for a whole-genome bacterial alignment already restricted to
/// its core genome, which is this engine's stated domain (spec.md §1).
pub fn finalize_genome_length_stats(
    store: &AlignmentStore,
    tree: &Tree,
    reference_genome_length: usize,
    stats: &mut HashMap<NodeId, SampleStats>,
) {
    for node in tree.iter() {
        let gaps = (0..store.col_count())
            .filter(|&col| store.read(node.seq_slot, col).is_gap())
            .count();
        let genome_length_without_gaps = reference_genome_length.saturating_sub(gaps);
        if let Some(node_stats) = stats.get_mut(&node.id) {
            node_stats.genome_length_without_gaps = genome_length_without_gaps;
            node_stats.genome_length_excluding_blocks_and_gaps = genome_length_without_gaps
                .saturating_sub(node_stats.bases_in_recombinations_including_gaps);
        }
    }
}

fn compute_branch_plan(
    store: &AlignmentStore,
    tree: &Tree,
    parent: NodeId,
    child: NodeId,
    config: &PipelineConfig,
) -> BranchPlan {
    let parent_slot = tree.node(parent).seq_slot;
    let child_slot = tree.node(child).seq_slot;
    let ctx = BranchContext::build(store, parent_slot, child_slot);
    let snp_location = store.snp_location();

    let candidates = scan_branch(&ctx, snp_location, &config.window);

    let is_gap: Vec<bool> = {
        let mut v = vec![true; ctx.col_count()];
        for &col in &ctx.brsnp_cols {
            v[col] = false;
        }
        v
    };
    let branch_seq = BranchSequence {
        coords: snp_location,
        is_gap: &is_gap,
    };

    let mut blocks: Vec<RecombinationBlock> = candidates
        .iter()
        .map(|c| RecombinationBlock::new(c.start, c.end, c.snp_count))
        .collect();

    for block in blocks.iter_mut() {
        let start = extend_end_of_block_left_over_gap(block.start, &branch_seq);
        let end = extend_end_of_block_right_over_gap(block.end, &branch_seq);
        let snp_count_within = ctx
            .brsnp_cols
            .iter()
            .filter(|&&col| {
                let loc = snp_location[col];
                loc >= start && loc <= end
            })
            .count();
        *block = RecombinationBlock::new(start, end, snp_count_within);
    }

    merge_adjacent_blocks(&mut blocks, &branch_seq);

    let blocks: Vec<RecombinationBlock> = blocks
        .into_iter()
        .filter(|b| !b.is_subsumed())
        .map(|b| apply_trimming(b, &ctx, snp_location, config.trimming_ratio))
        .collect();

    BranchPlan {
        child,
        child_slot,
        ctx,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Base;
    use crate::io::newick::parse_newick;

    fn dense_cluster_setup() -> (AlignmentStore, Tree) {
        // A 30-column alignment where B diverges from A at 15 consecutive
        // densely-packed sites, enough to trip the window scan.
        let mut a = vec![Base::A; 30];
        let mut b = vec![Base::A; 30];
        for base in b.iter_mut().take(15) {
            *base = Base::T;
        }
        a.extend(std::iter::repeat(Base::A).take(0));
        let snp_location: Vec<u64> = (0..30u64).map(|i| i * 10 + 1).collect();
        let store = AlignmentStore::load(vec![a, b], snp_location).unwrap();
        let parsed = parse_newick("(A:1,B:1);").unwrap();
        let tree = Tree::load(&parsed, &["A".to_string(), "B".to_string()]).unwrap();
        (store, tree)
    }

    #[test]
    fn pipeline_converges_and_masks_a_dense_cluster() {
        let (mut store, mut tree) = dense_cluster_setup();
        store.ensure_internal_rows(tree.internal_count());

        let config = PipelineConfig {
            window: WindowConfig {
                window_min: 50,
                window_max: 400,
                p_value_threshold: 0.1,
                min_snps: 3,
                extensive_search: false,
            },
            trimming_ratio: 0.0,
            max_iterations: 50,
        };
        let mut refiner = IdentityRefiner;
        let result = run_pipeline(&mut store, &mut tree, &config, &mut refiner);

        assert!(result.iterations < config.max_iterations);
        let b_leaf = tree
            .iter()
            .find(|n| n.label == "B")
            .expect("leaf B exists");
        assert!(
            !b_leaf.blocks.is_empty(),
            "dense cluster of branch-unique SNPs should be accepted as a block"
        );
    }

    #[test]
    fn branch_with_no_divergence_accepts_no_blocks() {
        let snp_location: Vec<u64> = vec![10, 20, 30];
        let mut store = AlignmentStore::load(
            vec![vec![Base::A, Base::C, Base::G], vec![Base::A, Base::C, Base::G]],
            snp_location,
        )
        .unwrap();
        let parsed = parse_newick("(A:1,B:1);").unwrap();
        let mut tree = Tree::load(&parsed, &["A".to_string(), "B".to_string()]).unwrap();
        store.ensure_internal_rows(tree.internal_count());

        let config = PipelineConfig::default();
        let mut refiner = IdentityRefiner;
        let result = run_pipeline(&mut store, &mut tree, &config, &mut refiner);
        assert_eq!(result.iterations, 1);
        assert!(tree.iter().all(|n| n.blocks.is_empty()));
    }
}
