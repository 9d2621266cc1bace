//! Token count estimation for prompt budgeting
//!
//! A deliberately crude character-count heuristic. The true tokenizer is
//! model-specific and not available cheaply, so batch-splitting decisions
//! are calibrated against these formulas; do not change them.

/// How to round the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproximationMode {
    /// Conservative lower bound: `floor(len / 5)`.
    Underestimate,
    /// Safe upper bound: `ceil(len / 3)`. Use whenever exceeding the true
    /// budget would fail a downstream call.
    Overestimate,
}

/// Estimate the number of tokens in a text.
///
/// This is a rough estimate and should only be used for rough comparisons.
/// Counts characters rather than bytes so accented text does not inflate
/// the estimate.
pub fn estimate_token_count(text: &str, mode: ApproximationMode) -> usize {
    let char_count = text.chars().count();
    match mode {
        ApproximationMode::Underestimate => char_count / 5,
        ApproximationMode::Overestimate => char_count.div_ceil(3),
    }
}
