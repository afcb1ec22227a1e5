// validation.rs - input validation: turns raw `Args` into typed, checked config

use std::path::Path;

use crate::cli::args::Args;
use crate::core::PipelineConfig;
use crate::core::scanner::WindowConfig;

/// Parsed paths plus a fully-typed `PipelineConfig`, produced once from
/// `Args` so the rest of the driver never re-checks raw strings/numbers.
pub struct ValidationResult {
    pub alignment_path: String,
    pub tree_path: String,
    pub vcf_path: String,
    pub reference_path: String,
    pub output_prefix: String,
    pub pipeline_config: PipelineConfig,
    pub num_threads: Option<usize>,
}

/// Validates all command line arguments, returning typed, checked values or
/// a diagnostic naming the offending flag (spec.md §7 input-malformed).
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    let alignment_path = args.alignment.clone().ok_or("--alignment is required")?;
    let tree_path = args.tree.clone().ok_or("--tree is required")?;
    let vcf_path = args.vcf.clone().ok_or("--vcf is required")?;
    let reference_path = args.reference.clone().ok_or("--reference is required")?;
    let output_prefix = args
        .output_prefix
        .clone()
        .ok_or("--output-prefix is required")?;

    for (flag, path) in [
        ("--alignment", &alignment_path),
        ("--tree", &tree_path),
        ("--vcf", &vcf_path),
        ("--reference", &reference_path),
    ] {
        if !Path::new(path).exists() {
            return Err(format!("{flag}: file not found: {path}"));
        }
    }

    if args.min_snps == 0 {
        return Err("--min-snps must be at least 1".to_string());
    }
    if args.window_min == 0 {
        return Err("--window-min must be at least 1".to_string());
    }
    if args.window_min > args.window_max {
        return Err(format!(
            "--window-min ({}) must not exceed --window-max ({})",
            args.window_min, args.window_max
        ));
    }
    if !(0.0..=1.0).contains(&args.uncorrected_p_value) {
        return Err("--uncorrected-p-value must be between 0.0 and 1.0".to_string());
    }
    if !(0.0..1.0).contains(&args.trimming_ratio) {
        return Err("--trimming-ratio must be in [0.0, 1.0)".to_string());
    }
    if args.max_iterations == 0 {
        return Err("--max-iterations must be at least 1".to_string());
    }
    if let Some(threads) = args.num_threads {
        if threads == 0 {
            return Err("--num-threads must be at least 1".to_string());
        }
    }

    let pipeline_config = PipelineConfig {
        window: WindowConfig {
            window_min: args.window_min,
            window_max: args.window_max,
            p_value_threshold: args.uncorrected_p_value,
            min_snps: args.min_snps,
            extensive_search: args.extensive_search,
        },
        trimming_ratio: args.trimming_ratio,
        max_iterations: args.max_iterations,
    };

    Ok(ValidationResult {
        alignment_path,
        tree_path,
        vcf_path,
        reference_path,
        output_prefix,
        pipeline_config,
        num_threads: args.num_threads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            alignment: Some("/dev/null".to_string()),
            tree: Some("/dev/null".to_string()),
            vcf: Some("/dev/null".to_string()),
            reference: Some("/dev/null".to_string()),
            output_prefix: Some("out".to_string()),
            min_snps: 3,
            window_min: 100,
            window_max: 10_000,
            uncorrected_p_value: 0.05,
            trimming_ratio: 0.0,
            extensive_search: false,
            num_threads: None,
            max_iterations: 1000,
            config: None,
            generate_config: false,
        }
    }

    #[test]
    fn rejects_window_min_greater_than_window_max() {
        let mut args = base_args();
        args.window_min = 500;
        args.window_max = 100;
        let err = validate_args(&args).unwrap_err();
        assert!(err.contains("window-min"));
    }

    #[test]
    fn rejects_missing_input_file() {
        let mut args = base_args();
        args.alignment = Some("/no/such/file.fasta".to_string());
        let err = validate_args(&args).unwrap_err();
        assert!(err.contains("--alignment"));
    }

    #[test]
    fn accepts_well_formed_args() {
        let args = base_args();
        assert!(validate_args(&args).is_ok());
    }
}
