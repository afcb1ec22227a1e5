// args.rs - Command line arguments definition (spec.md §6 CLI surface)

use argh::FromArgs;

#[derive(FromArgs)]
/// phylorecomb - tree-ordered recombination detection and branch-length
/// rescaling for bacterial whole-genome alignments
pub struct Args {
    /// path to the multi-FASTA alignment of variable sites
    #[argh(option)]
    pub alignment: Option<String>,

    /// path to the starting rooted bifurcating Newick tree
    #[argh(option)]
    pub tree: Option<String>,

    /// path to the VCF giving each alignment column's 1-based genome coordinate
    #[argh(option)]
    pub vcf: Option<String>,

    /// path to the reference genome FASTA, used only for its length
    #[argh(option)]
    pub reference: Option<String>,

    /// prefix for every output file (Newick, PHYLIP, FASTA, VCF, statistics table)
    #[argh(option)]
    pub output_prefix: Option<String>,

    /// minimum branch-unique SNP count for a window to be considered (default 3)
    #[argh(option, default = "3")]
    pub min_snps: usize,

    /// smallest window width tried during the density scan, in genome bases (default 100)
    #[argh(option, default = "100")]
    pub window_min: u64,

    /// largest window width tried during the density scan, in genome bases (default 10000)
    #[argh(option, default = "10000")]
    pub window_max: u64,

    /// uncorrected p-value threshold below which a window is significant (default 0.05)
    #[argh(option, default = "0.05")]
    pub uncorrected_p_value: f64,

    /// fraction of each accepted block's ends to trim post-acceptance (default 0.0)
    #[argh(option, default = "0.0")]
    pub trimming_ratio: f64,

    /// test every width/offset pair in [window_min, window_max] instead of a doubling schedule
    #[argh(switch)]
    pub extensive_search: bool,

    /// number of worker threads for the per-branch scan (default: all available cores)
    #[argh(option)]
    pub num_threads: Option<usize>,

    /// maximum outer fixed-point iterations before giving up (default 1000)
    #[argh(option, default = "1000")]
    pub max_iterations: usize,

    /// path to a TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate a sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
