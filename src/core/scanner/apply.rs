// apply.rs - Step E: masking and per-sample statistics update

use crate::core::scanner::branch_snps::BranchContext;
use crate::core::tree::RecombinationBlock;
use crate::data::{AlignmentStore, Base, SampleStats};

/// Masks every concrete base at `child_slot` within `block`'s genome-coordinate
/// range to `N`, and folds the block's contribution into `stats` (spec.md
/// §4.4 Step E). The block itself is appended to the child node's block list
/// by the caller, which also owns the tree.
pub fn mask_and_record(
    store: &mut AlignmentStore,
    child_slot: usize,
    ctx: &BranchContext,
    snp_location: &[u64],
    block: RecombinationBlock,
    stats: &mut SampleStats,
) {
    let mut informative_bases = 0usize;
    for col in 0..ctx.col_count() {
        let loc = snp_location[col];
        if loc < block.start || loc > block.end {
            continue;
        }
        if ctx.is_informative(col) {
            informative_bases += 1;
        }
        if store.read(child_slot, col).is_real() {
            store.write(child_slot, col, Base::N);
        }
    }
    let block_len_including_gaps = (block.end - block.start + 1) as usize;
    stats.record_block(informative_bases, block_len_including_gaps, block.snp_count_within);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::RecombinationBlock;

    #[test]
    fn mask_and_record_masks_only_the_block_range_and_updates_stats() {
        let snp_location: Vec<u64> = vec![10, 20, 30, 40];
        let mut store = AlignmentStore::load(
            vec![
                vec![Base::A, Base::A, Base::A, Base::A],
                vec![Base::T, Base::T, Base::T, Base::A],
            ],
            snp_location.clone(),
        )
        .unwrap();
        let ctx = BranchContext::build(&store, 0, 1);
        let block = RecombinationBlock::new(20, 30, 2);
        let mut stats = SampleStats::new("child".to_string());

        mask_and_record(&mut store, 1, &ctx, &snp_location, block, &mut stats);

        assert_eq!(store.read(1, 0), Base::T); // outside block, untouched
        assert_eq!(store.read(1, 1), Base::N); // inside block, masked
        assert_eq!(store.read(1, 2), Base::N);
        assert_eq!(store.read(1, 3), Base::A); // outside block, untouched
        assert_eq!(stats.number_of_blocks, 1);
        assert_eq!(stats.bases_in_recombinations, 2);
        assert_eq!(stats.bases_in_recombinations_including_gaps, 11);
        assert_eq!(stats.branch_bases_in_recombinations, 2);
    }
}
