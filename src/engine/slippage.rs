//! Adaptive slippage
//!
//! Additive adjustments on top of the base slippage, driven by the quote's
//! price impact and the number of hops, clamped into `[min_bps, max_bps]`.

use crate::config::SlippageConfig;

/// (price impact threshold in percent, added bps), checked highest first
const IMPACT_STEPS: &[(f64, u16)] = &[(1.0, 100), (0.5, 50), (0.1, 20)];

/// Added bps for every hop beyond the first
const PER_EXTRA_HOP_BPS: u16 = 15;

/// Slippage for a quote with the given price impact (percent) and hop count
pub fn adjust_slippage(config: &SlippageConfig, price_impact_pct: f64, hops: usize) -> u16 {
    let (min, max) = bounds(config);

    if !config.adaptive {
        return config.base_bps.clamp(min, max);
    }

    let impact = if price_impact_pct.is_finite() {
        price_impact_pct.abs()
    } else {
        0.0
    };

    let impact_bps = IMPACT_STEPS
        .iter()
        .find(|(threshold, _)| impact >= *threshold)
        .map(|(_, bps)| u32::from(*bps))
        .unwrap_or(0);

    let extra_hops = hops.saturating_sub(1).min(u16::MAX as usize) as u32;
    let hop_bps = extra_hops.saturating_mul(u32::from(PER_EXTRA_HOP_BPS));

    let adjusted = u32::from(config.base_bps)
        .saturating_add(impact_bps)
        .saturating_add(hop_bps);

    adjusted.clamp(u32::from(min), u32::from(max)) as u16
}

/// Clamp bounds, tolerating inverted configuration
fn bounds(config: &SlippageConfig) -> (u16, u16) {
    if config.min_bps <= config.max_bps {
        (config.min_bps, config.max_bps)
    } else {
        (config.max_bps, config.min_bps)
    }
}
