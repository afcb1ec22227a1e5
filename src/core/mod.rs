// mod.rs - Core logic module: tree model, ancestor reconstruction, the
// branch recombination scanner, the outer fixed-point pipeline, and
// branch-length rescaling (spec.md §2).

pub mod pipeline;
pub mod reconstruct;
pub mod rescale;
pub mod scanner;
pub mod tree;

pub use pipeline::{
    finalize_genome_length_stats, run_pipeline, IdentityRefiner, PipelineConfig, PipelineResult,
    TreeRefiner,
};
pub use reconstruct::reconstruct;
pub use rescale::rescale_tree;
pub use tree::{Node, NodeId, RecombinationBlock, TraversalOrder, Tree};
