//! Mock performance reporting
//!
//! Simulates a batch of swap runs and summarises them. Nothing here touches
//! the network; the numbers are drawn from fixed distributions.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::engine::priority_fee::percentile;
use crate::error::{AppError, AppResult};

/// Probability a mock run lands
const MOCK_SUCCESS_RATE: f64 = 0.92;

/// Mock latency range in milliseconds
const MOCK_LATENCY_MS: (u64, u64) = (350, 2_800);

/// Mock realised slippage range in bps
const MOCK_SLIPPAGE_BPS: (u16, u16) = (0, 120);

/// Mock priority fee range in micro-lamports per CU
const MOCK_PRIORITY_FEE: (u64, u64) = (5_000, 250_000);

/// One simulated swap
#[derive(Debug, Clone, Serialize)]
pub struct MockRun {
    pub success: bool,
    pub latency_ms: u64,
    pub slippage_bps: u16,
    pub priority_fee_micro_lamports: u64,
}

/// Aggregated report written to disk
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub samples: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub avg_slippage_bps: f64,
    pub avg_priority_fee_micro_lamports: f64,
    pub runs: Vec<MockRun>,
}

/// Draw `count` mock runs from `rng`
pub fn generate_runs<R: Rng>(rng: &mut R, count: usize) -> Vec<MockRun> {
    (0..count)
        .map(|_| MockRun {
            success: rng.gen_bool(MOCK_SUCCESS_RATE),
            latency_ms: rng.gen_range(MOCK_LATENCY_MS.0..=MOCK_LATENCY_MS.1),
            slippage_bps: rng.gen_range(MOCK_SLIPPAGE_BPS.0..=MOCK_SLIPPAGE_BPS.1),
            priority_fee_micro_lamports: rng
                .gen_range(MOCK_PRIORITY_FEE.0..=MOCK_PRIORITY_FEE.1),
        })
        .collect()
}

impl PerformanceReport {
    /// Summarise `runs`; an empty batch yields zeroed statistics
    pub fn from_runs(runs: Vec<MockRun>, generated_at: DateTime<Utc>) -> Self {
        let samples = runs.len();
        let successes = runs.iter().filter(|r| r.success).count();
        let latencies: Vec<u64> = runs.iter().map(|r| r.latency_ms).collect();

        let mean = |total: f64| {
            if samples == 0 {
                0.0
            } else {
                total / samples as f64
            }
        };

        Self {
            generated_at,
            samples,
            successes,
            success_rate: mean(successes as f64),
            avg_latency_ms: mean(latencies.iter().sum::<u64>() as f64),
            p50_latency_ms: percentile(&latencies, 50).unwrap_or(0),
            p95_latency_ms: percentile(&latencies, 95).unwrap_or(0),
            avg_slippage_bps: mean(runs.iter().map(|r| f64::from(r.slippage_bps)).sum()),
            avg_priority_fee_micro_lamports: mean(
                runs.iter()
                    .map(|r| r.priority_fee_micro_lamports as f64)
                    .sum(),
            ),
            runs,
        }
    }

    /// Report file name, e.g. `performance-20240101T120000Z.json`
    pub fn file_name(&self) -> String {
        format!(
            "performance-{}.json",
            self.generated_at.format("%Y%m%dT%H%M%SZ")
        )
    }
}

/// Generate a mock report with `samples` runs
pub fn generate_report(samples: usize) -> PerformanceReport {
    let mut rng = rand::thread_rng();
    let runs = generate_runs(&mut rng, samples);
    PerformanceReport::from_runs(runs, Utc::now())
}

/// Write `report` as pretty JSON into `dir`, returning the file path
pub fn write_report(dir: &Path, report: &PerformanceReport) -> AppResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report.file_name());

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::Internal(format!("Failed to serialize report: {}", e)))?;
    std::fs::write(&path, json)?;

    tracing::info!(
        path = %path.display(),
        samples = report.samples,
        success_rate = report.success_rate,
        "Performance report written"
    );

    Ok(path)
}
