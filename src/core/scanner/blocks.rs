// blocks.rs - Step D: block geometry (extension over gaps, merging, trimming)

use crate::core::scanner::branch_snps::BranchContext;
use crate::core::tree::RecombinationBlock;

/// The per-branch variable-site coordinate system Steps C-E share: every
/// variable site on the branch (not only the branch-unique ones), paired
/// with whether that site is a gap in the Step B "effective branch
/// sequence" (i.e. NOT a branch-unique SNP).
pub struct BranchSequence<'a> {
    pub coords: &'a [u64],
    pub is_gap: &'a [bool],
}

impl<'a> BranchSequence<'a> {
    fn position_of(&self, coord: u64) -> Option<usize> {
        self.coords.iter().position(|&c| c == coord)
    }
}

/// Extends a block's right end across a contiguous run of gap-marked
/// variable sites to the farthest branch-unique SNP reachable without a
/// break in genome-coordinate contiguity (spec.md §4.4, testable properties
/// 6-9).
pub fn extend_end_of_block_right_over_gap(end: u64, branch: &BranchSequence) -> u64 {
    let Some(start_idx) = branch.position_of(end) else {
        return end;
    };
    let mut result = end;
    let mut expected = end + 1;
    let mut idx = start_idx + 1;
    while idx < branch.coords.len() && branch.coords[idx] == expected {
        if !branch.is_gap[idx] {
            result = branch.coords[idx];
        }
        expected += 1;
        idx += 1;
    }
    result
}

/// Mirror of [`extend_end_of_block_right_over_gap`] for the block's left end.
pub fn extend_end_of_block_left_over_gap(start: u64, branch: &BranchSequence) -> u64 {
    let Some(start_idx) = branch.position_of(start) else {
        return start;
    };
    let mut result = start;
    if start == 0 {
        return result;
    }
    let mut expected = start - 1;
    if start_idx == 0 {
        return result;
    }
    let mut idx = start_idx - 1;
    loop {
        if branch.coords[idx] != expected {
            break;
        }
        if !branch.is_gap[idx] {
            result = branch.coords[idx];
        }
        if idx == 0 || expected == 0 {
            break;
        }
        expected -= 1;
        idx -= 1;
    }
    result
}

/// Merges blocks that touch, overlap, or straddle only gap-marked variable
/// sites, applied transitively to a fixed point. Subsumed blocks have their
/// coordinates zeroed in place rather than being removed from the vector
/// (spec.md §9, testable property 2); returns the count of blocks that are
/// still live (non-subsumed) after merging.
pub fn merge_adjacent_blocks(blocks: &mut [RecombinationBlock], branch: &BranchSequence) -> usize {
    loop {
        let mut merged_any = false;
        let live: Vec<usize> = (0..blocks.len())
            .filter(|&i| !blocks[i].is_subsumed())
            .collect();

        'outer: for &i in &live {
            for &j in &live {
                if i == j || blocks[i].is_subsumed() || blocks[j].is_subsumed() {
                    continue;
                }
                let (earlier, later) = if blocks[i].start <= blocks[j].start {
                    (i, j)
                } else {
                    (j, i)
                };
                let a = blocks[earlier];
                let b = blocks[later];
                if should_merge(a.end, b.start, branch) {
                    blocks[earlier] = RecombinationBlock::new(
                        a.start,
                        b.end,
                        a.snp_count_within + b.snp_count_within,
                    );
                    blocks[later] = RecombinationBlock::subsumed();
                    merged_any = true;
                    break 'outer;
                }
            }
        }

        if !merged_any {
            break;
        }
    }

    blocks.iter().filter(|b| !b.is_subsumed()).count()
}

fn should_merge(earlier_end: u64, later_start: u64, branch: &BranchSequence) -> bool {
    if later_start <= earlier_end + 1 {
        return true;
    }
    // Straddles a gap: there is at least one variable site strictly between
    // the two blocks, and every such site is gap-marked on this branch. An
    // empty intervening set means the blocks are simply far apart, not
    // gap-joined, so it must not vacuously satisfy the straddle condition.
    let between: Vec<bool> = branch
        .coords
        .iter()
        .zip(branch.is_gap.iter())
        .filter(|&(&coord, _)| coord > earlier_end && coord < later_start)
        .map(|(_, &is_gap)| is_gap)
        .collect();
    !between.is_empty() && between.iter().all(|&is_gap| is_gap)
}

/// Retains only the entries of `list` outside `[start, end]`, compacting
/// them to the front in place, and returns the new length. Mirrors the
/// original `exclude_snp_sites_in_block` contract: repeated calls against
/// the same (shrinking) vector chain correctly (spec.md §8 property 11).
pub fn exclude_snp_sites_in_block(start: u64, end: u64, list: &mut Vec<u64>) -> usize {
    list.retain(|&pos| pos < start || pos > end);
    list.len()
}

/// Post-acceptance edge trim (Open Question resolution, see DESIGN.md):
/// trims `floor(trimming_ratio * L_informative / 2)` genome-coordinate
/// steps from each end of the block, never trimming past the innermost
/// branch-unique SNP, and never past the opposite end.
pub fn apply_trimming(
    block: RecombinationBlock,
    ctx: &BranchContext,
    snp_location: &[u64],
    trimming_ratio: f64,
) -> RecombinationBlock {
    if trimming_ratio <= 0.0 {
        return block;
    }
    let l_informative = (0..ctx.col_count())
        .filter(|&col| {
            let loc = snp_location[col];
            loc >= block.start && loc <= block.end && ctx.is_informative(col)
        })
        .count();
    let trim = ((trimming_ratio * l_informative as f64) / 2.0).floor() as u64;
    if trim == 0 {
        return block;
    }

    let brsnp_in_block: Vec<u64> = ctx
        .brsnp_cols
        .iter()
        .map(|&col| snp_location[col])
        .filter(|&loc| loc >= block.start && loc <= block.end)
        .collect();
    let (Some(&innermost_left), Some(&innermost_right)) =
        (brsnp_in_block.first(), brsnp_in_block.last())
    else {
        return block;
    };

    let new_start = (block.start + trim).min(innermost_left);
    let new_end = block.end.saturating_sub(trim).max(innermost_right);
    RecombinationBlock::new(new_start, new_end, block.snp_count_within)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch<'a>(coords: &'a [u64], pattern: &str) -> BranchSequence<'a> {
        let is_gap: Vec<bool> = pattern.chars().map(|c| c == '-').collect();
        assert_eq!(is_gap.len(), coords.len());
        BranchSequence {
            coords,
            is_gap: Box::leak(is_gap.into_boxed_slice()),
        }
    }

    // property 1
    #[test]
    fn blocks_far_apart_do_not_merge() {
        let coords = [10u64];
        let branch = branch(&coords, "A");
        let mut blocks = [
            RecombinationBlock::new(10, 20, 1),
            RecombinationBlock::new(1000, 1200, 1),
        ];
        let live = merge_adjacent_blocks(&mut blocks, &branch);
        assert_eq!(live, 2);
        assert_eq!(blocks[0], RecombinationBlock::new(10, 20, 1));
        assert_eq!(blocks[1], RecombinationBlock::new(1000, 1200, 1));
    }

    // property 2
    #[test]
    fn touching_blocks_merge_and_subsumed_is_zeroed() {
        let coords = [10u64];
        let branch = branch(&coords, "A");
        let mut blocks = [
            RecombinationBlock::new(10, 20, 1),
            RecombinationBlock::new(20, 30, 1),
        ];
        let live = merge_adjacent_blocks(&mut blocks, &branch);
        assert_eq!(live, 1);
        assert_eq!(blocks[0], RecombinationBlock::new(10, 30, 2));
        assert!(blocks[1].is_subsumed());
    }

    // property 3
    #[test]
    fn near_blocks_merge() {
        let coords = [10u64];
        let branch = branch(&coords, "A");
        let mut blocks = [
            RecombinationBlock::new(10, 21, 1),
            RecombinationBlock::new(20, 30, 1),
        ];
        let live = merge_adjacent_blocks(&mut blocks, &branch);
        assert_eq!(live, 1);
        assert_eq!(blocks[0], RecombinationBlock::new(10, 30, 2));
    }

    // property 4
    #[test]
    fn overlapping_blocks_merge() {
        let coords = [10u64];
        let branch = branch(&coords, "A");
        let mut blocks = [
            RecombinationBlock::new(10, 19, 1),
            RecombinationBlock::new(20, 30, 1),
        ];
        let live = merge_adjacent_blocks(&mut blocks, &branch);
        assert_eq!(live, 1);
        assert_eq!(blocks[0], RecombinationBlock::new(10, 30, 2));
    }

    // property 5
    #[test]
    fn blocks_straddling_only_gaps_merge() {
        let coords = [10u64, 30, 40, 41, 42, 43, 44, 60, 70];
        let branch = branch(&coords, "AAA---CCC");
        let mut blocks = [
            RecombinationBlock::new(10, 44, 1),
            RecombinationBlock::new(40, 70, 1),
        ];
        let live = merge_adjacent_blocks(&mut blocks, &branch);
        assert_eq!(live, 1);
        assert_eq!(blocks[0], RecombinationBlock::new(10, 70, 2));
    }

    // property 6
    #[test]
    fn extend_right_over_single_gap_run() {
        let coords = [30u64, 40, 41, 42, 43, 44, 60];
        let branch = branch(&coords, "AA---CC");
        assert_eq!(extend_end_of_block_right_over_gap(30, &branch), 30);
        assert_eq!(extend_end_of_block_right_over_gap(31, &branch), 31);
        assert_eq!(extend_end_of_block_right_over_gap(44, &branch), 44);
        assert_eq!(extend_end_of_block_right_over_gap(999, &branch), 999);
        assert_eq!(extend_end_of_block_right_over_gap(40, &branch), 44);
        assert_eq!(extend_end_of_block_right_over_gap(41, &branch), 44);
    }

    // property 7
    #[test]
    fn non_contiguous_gap_does_not_extend_right() {
        let coords = [30u64, 40, 41, 42, 43, 50, 60];
        let branch = branch(&coords, "AA---CC");
        assert_eq!(extend_end_of_block_right_over_gap(40, &branch), 40);
        assert_eq!(extend_end_of_block_right_over_gap(43, &branch), 43);
    }

    // property 8
    #[test]
    fn extension_reaches_across_multiple_gaps_and_an_interior_snp() {
        let coords = [30u64, 40, 41, 42, 43, 44, 60];
        let branch = branch(&coords, "AA-T-CC");
        assert_eq!(extend_end_of_block_right_over_gap(40, &branch), 44);
        assert_eq!(extend_end_of_block_right_over_gap(41, &branch), 44);
    }

    // property 9
    #[test]
    fn extension_stops_at_last_contiguous_snp() {
        let coords = [30u64, 40, 41, 42, 43, 50, 60];
        let branch = branch(&coords, "AA-T-CC");
        assert_eq!(extend_end_of_block_right_over_gap(40, &branch), 42);
        assert_eq!(extend_end_of_block_right_over_gap(41, &branch), 42);
    }

    // property 10
    #[test]
    fn extend_left_mirrors_extend_right() {
        let coords = [30u64, 40, 41, 42, 43, 44, 60];
        let branch = branch(&coords, "AA---CC");
        assert_eq!(extend_end_of_block_left_over_gap(60, &branch), 60);
        assert_eq!(extend_end_of_block_left_over_gap(59, &branch), 59);
        assert_eq!(extend_end_of_block_left_over_gap(40, &branch), 40);
        assert_eq!(extend_end_of_block_left_over_gap(999, &branch), 999);
        assert_eq!(extend_end_of_block_left_over_gap(44, &branch), 40);
        assert_eq!(extend_end_of_block_left_over_gap(41, &branch), 40);

        let coords2 = [30u64, 31, 41, 42, 43, 50, 60];
        let branch2 = branch(&coords2, "AA---CC");
        assert_eq!(extend_end_of_block_left_over_gap(41, &branch2), 41);
        assert_eq!(extend_end_of_block_left_over_gap(43, &branch2), 43);

        let coords3 = [30u64, 40, 41, 42, 43, 44, 60];
        let branch3 = branch(&coords3, "AA-T-CC");
        assert_eq!(extend_end_of_block_left_over_gap(44, &branch3), 40);
        assert_eq!(extend_end_of_block_left_over_gap(41, &branch3), 40);

        let coords4 = [30u64, 31, 41, 42, 43, 44, 60];
        let branch4 = branch(&coords4, "AA-T-CC");
        assert_eq!(extend_end_of_block_left_over_gap(44, &branch4), 42);
        assert_eq!(extend_end_of_block_left_over_gap(43, &branch4), 42);
    }

    // property 11
    #[test]
    fn exclude_snp_sites_chains_across_calls() {
        let mut sites = vec![1u64, 3, 5, 6, 7, 8, 10, 11];
        assert_eq!(exclude_snp_sites_in_block(0, 2, &mut sites), 7);
        assert_eq!(exclude_snp_sites_in_block(5, 7, &mut sites), 4);
        assert_eq!(exclude_snp_sites_in_block(8, 11, &mut sites), 1);
        assert_eq!(exclude_snp_sites_in_block(3, 3, &mut sites), 0);
    }
}
