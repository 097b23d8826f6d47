//! Trailing volatility estimate used by the cost model.

use crate::metrics::std_dev;

/// Sample standard deviation of the `lookback` asset returns ending at `end`
/// (inclusive).
///
/// `returns[0]` is the seed placeholder, so period `end` has `end` real
/// returns behind it. Returns `None` when fewer than `lookback` real returns
/// exist or the window is flat.
pub fn trailing_volatility(returns: &[f64], end: usize, lookback: usize) -> Option<f64> {
    if lookback < 2 || end < lookback || end >= returns.len() {
        return None;
    }
    let window = &returns[end + 1 - lookback..=end];
    let sigma = std_dev(window);
    if sigma > 0.0 && sigma.is_finite() {
        Some(sigma)
    } else {
        None
    }
}
