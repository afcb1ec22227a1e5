// config.rs - TOML configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every tunable from the CLI surface (spec.md §6), optional so that a
/// config file may set as few or as many as it likes; unset fields fall
/// back to the CLI default or an explicit `--flag` value (see `cli::merge`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScanConfig {
    pub alignment: Option<String>,
    pub tree: Option<String>,
    pub vcf: Option<String>,
    pub reference: Option<String>,
    pub output_prefix: Option<String>,

    pub min_snps: Option<usize>,
    pub window_min: Option<u64>,
    pub window_max: Option<u64>,
    pub uncorrected_p_value: Option<f64>,
    pub trimming_ratio: Option<f64>,
    pub extensive_search: Option<bool>,
    pub num_threads: Option<usize>,
    pub max_iterations: Option<usize>,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file '{}': {e}", path.display()))?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| format!("failed to parse config file '{}': {e}", path.display()))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize config: {e}"))?;

        fs::write(path, content)
            .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// A commented sample configuration file, as text.
    pub fn generate_sample() -> String {
        r#"# phylorecomb.toml - configuration file for phylorecomb
# Command line arguments override these settings.

# =============================================================================
# INPUTS / OUTPUTS
# =============================================================================

# Multi-FASTA alignment of variable sites
alignment = "/path/to/alignment.fasta"

# Starting rooted bifurcating Newick tree
tree = "/path/to/starting_tree.nwk"

# VCF giving each alignment column's genome coordinate (POS column)
vcf = "/path/to/variants.vcf"

# Reference genome FASTA, used only for its length
reference = "/path/to/reference.fasta"

# Prefix for every output file
output_prefix = "phylorecomb_out"

# =============================================================================
# WINDOW-SCAN TUNABLES (spec.md §4.4 Step C)
# =============================================================================

# Minimum branch-unique SNP count for a window to be considered
min_snps = 3

# Smallest / largest window width tried, in genome bases
window_min = 100
window_max = 10000

# Uncorrected p-value threshold below which a window is significant
uncorrected_p_value = 0.05

# Fraction of each accepted block's ends to trim post-acceptance
trimming_ratio = 0.0

# Test every width/offset pair instead of a doubling schedule
extensive_search = false

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of worker threads for the per-branch scan (omit for all cores)
# num_threads = 8

# Maximum outer fixed-point iterations before giving up
max_iterations = 1000
"#
        .to_string()
    }
}
