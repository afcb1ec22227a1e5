// window.rs - Step C: the sliding-window density test

use super::branch_snps::BranchContext;

/// Tunables for the window-scan test, mirroring the CLI surface (§6).
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    pub window_min: u64,
    pub window_max: u64,
    pub p_value_threshold: f64,
    pub min_snps: usize,
    pub extensive_search: bool,
}

/// A single accepted window before block-geometry normalisation (§4.4 Step D).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateWindow {
    pub start: u64,
    pub end: u64,
    pub snp_count: usize,
    pub p_value: f64,
}

/// Switch point between the exact binomial tail and the Poisson
/// approximation (Open Question resolution, see DESIGN.md): below this
/// window size the binomial's exact combinatorics are cheap and more
/// accurate; above it the Poisson approximation avoids the growing cost of
/// the exact sum while remaining accurate for the branch's typically low
/// substitution rate.
const POISSON_SWITCH_N_W: usize = 400;

/// Runs the window scan for one branch, returning every accepted candidate
/// window (p-value below threshold, SNP count at least `min_snps`),
/// already resolved for mutual overlap per the tie-break rule (smallest
/// p-value, then earliest start, then greatest length).
pub fn scan_branch(
    ctx: &BranchContext,
    snp_location: &[u64],
    config: &WindowConfig,
) -> Vec<CandidateWindow> {
    let n = ctx.branch_snp_count();
    let l_eff = ctx.informative_length();
    if n < config.min_snps || l_eff == 0 {
        return Vec::new();
    }
    let rate = n as f64 / l_eff as f64;

    let widths = width_schedule(config);
    let mut raw_candidates = Vec::new();

    for &width in &widths {
        for &col in &ctx.brsnp_cols {
            let start = snp_location[col];
            let end = start + width.saturating_sub(1);
            let (k, n_w) = count_window(ctx, snp_location, start, end);
            if k < config.min_snps || n_w == 0 {
                continue;
            }
            let p = p_value(k, n_w, rate);
            if p < config.p_value_threshold {
                raw_candidates.push(CandidateWindow {
                    start,
                    end,
                    snp_count: k,
                    p_value: p,
                });
            }
        }
    }

    resolve_overlaps(raw_candidates)
}

fn width_schedule(config: &WindowConfig) -> Vec<u64> {
    let mut widths = Vec::new();
    if config.extensive_search {
        let mut w = config.window_min;
        while w <= config.window_max {
            widths.push(w);
            w += 1;
        }
    } else {
        let mut w = config.window_min;
        while w <= config.window_max {
            widths.push(w);
            w = w.saturating_mul(2);
        }
        if widths.last().copied() != Some(config.window_max) {
            widths.push(config.window_max);
        }
    }
    widths
}

fn count_window(ctx: &BranchContext, snp_location: &[u64], start: u64, end: u64) -> (usize, usize) {
    let mut k = 0;
    let mut n_w = 0;
    for col in 0..ctx.col_count() {
        let loc = snp_location[col];
        if loc < start || loc > end {
            continue;
        }
        if ctx.is_informative(col) {
            n_w += 1;
        }
    }
    for &col in &ctx.brsnp_cols {
        let loc = snp_location[col];
        if loc >= start && loc <= end {
            k += 1;
        }
    }
    (k, n_w)
}

/// Tail probability of observing at least `k` branch-unique SNPs among
/// `n_w` informative positions given the branch's overall rate.
fn p_value(k: usize, n_w: usize, rate: f64) -> f64 {
    if n_w <= POISSON_SWITCH_N_W {
        binomial_tail(k, n_w, rate)
    } else {
        poisson_tail(k, rate * n_w as f64)
    }
}

/// `P(X >= k)` for `X ~ Binomial(n_w, rate)`, computed in log-space via the
/// log-gamma function to avoid overflow for large `n_w`.
fn binomial_tail(k: usize, n_w: usize, rate: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if rate <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if rate >= 1.0 {
        return 1.0;
    }

    let ln_rate = rate.ln();
    let ln_1_minus_rate = (1.0 - rate).ln();
    let mut total = 0.0f64;
    for i in k..=n_w {
        let ln_term = ln_binomial_coeff(n_w, i) + i as f64 * ln_rate + (n_w - i) as f64 * ln_1_minus_rate;
        total += ln_term.exp();
    }
    if total.is_nan() {
        1.0 // NaN: treat as not-significant (spec.md §4.4 failure semantics)
    } else if total < f64::MIN_POSITIVE {
        0.0 // underflow: treat as significant (spec.md §4.4 failure semantics)
    } else {
        total.min(1.0)
    }
}

/// `P(X >= k)` for `X ~ Poisson(lambda)`, via the regularised incomplete
/// gamma relation `P(X >= k) = Q(k, lambda)` evaluated directly as a finite
/// sum over the lower tail `P(X < k)` in log-space.
fn poisson_tail(k: usize, lambda: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if lambda <= 0.0 {
        return 0.0;
    }
    let ln_lambda = lambda.ln();
    let mut lower_cumulative = 0.0f64;
    for i in 0..k {
        let ln_term = i as f64 * ln_lambda - lambda - ln_factorial(i);
        lower_cumulative += ln_term.exp();
    }
    let tail = 1.0 - lower_cumulative;
    if tail.is_nan() {
        1.0 // NaN: treat as not-significant (spec.md §4.4 failure semantics)
    } else {
        tail.clamp(0.0, 1.0)
    }
}

fn ln_binomial_coeff(n: usize, k: usize) -> f64 {
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

fn ln_factorial(n: usize) -> f64 {
    ln_gamma(n as f64 + 1.0)
}

/// Stirling-series log-gamma, accurate to within 1e-10 for the positive
/// arguments this module ever calls it with.
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5 - (x + 0.5) * (x + 5.5).ln();
    let mut series = 1.000000000190015;
    for &c in &COEFFS {
        y += 1.0;
        series += c / y;
    }
    -tmp + (2.5066282746310005 * series / x).ln()
}

fn resolve_overlaps(mut candidates: Vec<CandidateWindow>) -> Vec<CandidateWindow> {
    candidates.sort_by(|a, b| {
        a.p_value
            .partial_cmp(&b.p_value)
            .unwrap()
            .then(a.start.cmp(&b.start))
            .then(b.end.cmp(&a.end))
    });

    let mut accepted: Vec<CandidateWindow> = Vec::new();
    for cand in candidates {
        let overlaps = accepted
            .iter()
            .any(|acc| cand.start <= acc.end && acc.start <= cand.end);
        if !overlaps {
            accepted.push(cand);
        }
    }
    accepted.sort_by_key(|w| w.start);
    accepted
}
