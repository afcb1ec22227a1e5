// lib.rs - phylorecomb library root

//! # phylorecomb - tree-ordered recombination detection for bacterial
//! whole-genome alignments
//!
//! Given a multiple sequence alignment, a starting phylogenetic tree, and
//! the variant sites across the alignment, this library reconstructs
//! ancestral sequences at every internal node, scans each branch for
//! genomic intervals whose substitution density is too high to be
//! clonal, masks the accepted intervals, and rescales branch lengths by
//! their remaining, non-recombinant substitutions.
//!
//! Parsing of FASTA/PHYLIP/Newick/VCF, CLI argument handling live in
//! [`cli`] and [`io`]; the inference itself lives in [`core`] and [`data`].

pub mod cli;
pub mod core;
pub mod data;
pub mod io;

pub mod prelude {
    pub use crate::cli::{validate_args, Args, ScanConfig, ValidationResult};
    pub use crate::core::{
        reconstruct, run_pipeline, IdentityRefiner, PipelineConfig, PipelineResult,
        RecombinationBlock, Tree, TreeRefiner,
    };
    pub use crate::data::{AlignmentStore, Base, SampleStats};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
