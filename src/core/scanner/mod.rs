// mod.rs - Branch Recombination Scanner: composes Steps A-E (spec.md §4.4)
//
// `branch_snps` builds the per-branch coordinate system (Steps A-B),
// `window` runs the density test (Step C), `blocks` normalises the
// resulting candidates (Step D), and `apply` masks the accepted bases and
// folds them into per-sample statistics (Step E). `core::pipeline` drives
// all four across the tree and across outer iterations (Step F).

pub mod apply;
pub mod blocks;
pub mod branch_snps;
pub mod window;

pub use apply::mask_and_record;
pub use blocks::{
    apply_trimming, exclude_snp_sites_in_block, extend_end_of_block_left_over_gap,
    extend_end_of_block_right_over_gap, merge_adjacent_blocks, BranchSequence,
};
pub use branch_snps::BranchContext;
pub use window::{scan_branch, CandidateWindow, WindowConfig};
