// merge.rs - merge a TOML configuration file with CLI arguments

use crate::cli::{Args, ScanConfig};

impl Args {
    /// Merge with configuration loaded from file. CLI arguments take
    /// precedence; a numeric/string field is only pulled from the config
    /// file if the CLI still holds its `argh` default.
    pub fn merge_with_config(mut self, config: ScanConfig) -> Self {
        if self.alignment.is_none() {
            self.alignment = config.alignment;
        }
        if self.tree.is_none() {
            self.tree = config.tree;
        }
        if self.vcf.is_none() {
            self.vcf = config.vcf;
        }
        if self.reference.is_none() {
            self.reference = config.reference;
        }
        if self.output_prefix.is_none() {
            self.output_prefix = config.output_prefix;
        }

        if self.min_snps == 3 {
            if let Some(v) = config.min_snps {
                self.min_snps = v;
            }
        }
        if self.window_min == 100 {
            if let Some(v) = config.window_min {
                self.window_min = v;
            }
        }
        if self.window_max == 10_000 {
            if let Some(v) = config.window_max {
                self.window_max = v;
            }
        }
        if self.uncorrected_p_value == 0.05 {
            if let Some(v) = config.uncorrected_p_value {
                self.uncorrected_p_value = v;
            }
        }
        if self.trimming_ratio == 0.0 {
            if let Some(v) = config.trimming_ratio {
                self.trimming_ratio = v;
            }
        }
        if !self.extensive_search && config.extensive_search.unwrap_or(false) {
            self.extensive_search = true;
        }
        if self.num_threads.is_none() {
            self.num_threads = config.num_threads;
        }
        if self.max_iterations == 1000 {
            if let Some(v) = config.max_iterations {
                self.max_iterations = v;
            }
        }

        self
    }

    /// Load configuration and merge it with the parsed CLI arguments.
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = ScanConfig::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
