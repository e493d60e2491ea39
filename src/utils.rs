use rust_decimal::prelude::*;

use crate::constants::LAMPORTS_PER_SOL;

/// Safely convert SOL (f64) to Lamports (u64) using Decimal to avoid precision loss
pub fn sol_to_lamports(sol: f64) -> u64 {
    // 1 SOL = 1,000,000,000 Lamports
    let sol_decimal = Decimal::from_f64_retain(sol).unwrap_or(Decimal::ZERO);
    let multiplier = Decimal::from(LAMPORTS_PER_SOL);

    (sol_decimal * multiplier).to_u64().unwrap_or(0)
}

/// Safely convert Lamports (u64) to SOL (f64) for display
pub fn lamports_to_sol(lamports: u64) -> f64 {
    let lamports_dec = Decimal::from(lamports);
    let divisor = Decimal::from(LAMPORTS_PER_SOL);

    (lamports_dec / divisor).to_f64().unwrap_or(0.0)
}

/// Convert a raw USDC amount (6 decimals) to a display value
pub fn usdc_units_to_float(units: u64) -> f64 {
    (Decimal::from(units) / Decimal::new(1_000_000, 0))
        .to_f64()
        .unwrap_or(0.0)
}
