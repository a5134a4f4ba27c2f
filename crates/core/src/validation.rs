//! Validation helpers shared across the pipeline.
//!
//! Provides the Wilson score bound used to gate promotion on a representative
//! sample, and the wallet address format predicate.

/// Calculates the Wilson score confidence interval for a proportion.
///
/// Stays inside `[0, 1]` for proportions near the edges and for small
/// samples, unlike the normal approximation.
///
/// # Formula
/// ```text
/// CI = (p + z^2/(2n) +/- z * sqrt(p(1-p)/n + z^2/(4n^2))) / (1 + z^2/n)
/// ```
///
/// # Returns
/// Tuple of (lower_bound, upper_bound), clamped to `[0, 1]`.
///
/// # Examples
/// ```
/// use arb_engine_core::validation::wilson_ci;
///
/// let (lower, upper) = wilson_ci(50, 100, 1.96);
/// assert!(lower > 0.39 && lower < 0.41);
/// assert!(upper > 0.59 && upper < 0.61);
/// ```
#[must_use]
pub fn wilson_ci(wins: usize, n: usize, z: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 0.0);
    }

    let n_f = n as f64;
    let p = wins.min(n) as f64 / n_f;
    let z_sq = z * z;

    let denominator = 1.0 + z_sq / n_f;
    let center = p + z_sq / (2.0 * n_f);

    let variance_term = p * (1.0 - p) / n_f;
    let correction_term = z_sq / (4.0 * n_f * n_f);
    let spread = z * (variance_term + correction_term).sqrt();

    let lower = (center - spread) / denominator;
    let upper = (center + spread) / denominator;

    (lower.max(0.0), upper.min(1.0))
}

/// Lower Wilson bound only.
#[must_use]
pub fn wilson_lower(wins: usize, n: usize, z: f64) -> f64 {
    wilson_ci(wins, n, z).0
}

/// Ethereum-style address check: `0x` followed by exactly 40 hex digits.
///
/// Checksum casing is not verified; mixed case is accepted as-is.
///
/// # Examples
/// ```
/// use arb_engine_core::validation::is_valid_wallet_address;
///
/// assert!(is_valid_wallet_address("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6"));
/// assert!(!is_valid_wallet_address("0x123"));
/// ```
#[must_use]
pub fn is_valid_wallet_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}
