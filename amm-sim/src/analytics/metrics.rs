//! Metrics calculation for simulation analysis

use crate::simulation::SimulationResults;
use amm::PoolId;
use serde::{Deserialize, Serialize};

/// Calculator for simulation metrics
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// k relative to its genesis value, per snapshot of `pool`
    pub fn k_growth(results: &SimulationResults, pool: PoolId) -> Vec<SeriesPoint> {
        let mut history = results.pool_history.iter().filter(|h| h.pool == pool);
        let base = match history.next() {
            Some(first) if first.k > 0 => first.k as f64,
            _ => return vec![],
        };

        std::iter::once(SeriesPoint { step: 0, value: 1.0 })
            .chain(history.map(|h| SeriesPoint {
                step: h.step,
                value: h.k as f64 / base,
            }))
            .collect()
    }

    /// Spot price of token0 in token1 over time for `pool`
    pub fn price_over_time(results: &SimulationResults, pool: PoolId) -> Vec<SeriesPoint> {
        results
            .pool_history
            .iter()
            .filter(|h| h.pool == pool)
            .map(|h| SeriesPoint {
                step: h.step,
                value: h.price_0_in_1,
            })
            .collect()
    }

    /// Cumulative swap fees over time, all pools and tokens combined
    pub fn cumulative_fees(results: &SimulationResults) -> Vec<SeriesPoint> {
        let mut cumulative = 0u64;
        let mut points = Vec::new();

        for trade in &results.trades {
            cumulative = cumulative.saturating_add(trade.fee_paid);
            points.push(SeriesPoint {
                step: trade.step,
                value: cumulative as f64,
            });
        }

        points
    }

    /// Rejected operations per error kind, most frequent first
    pub fn rejection_histogram(results: &SimulationResults) -> Vec<HistogramBucket> {
        let mut buckets: Vec<HistogramBucket> = results
            .rejections
            .iter()
            .map(|(kind, count)| HistogramBucket {
                range_start: 0.0,
                range_end: 0.0,
                count: *count,
                label: kind.clone(),
            })
            .collect();
        buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        buckets
    }

    /// Price impact distribution of executed swaps (histogram)
    pub fn price_impact_distribution(results: &SimulationResults) -> Vec<HistogramBucket> {
        let impacts: Vec<f64> = results
            .trades
            .iter()
            .map(|t| t.price_impact_bps as f64)
            .collect();

        if impacts.is_empty() {
            return vec![];
        }

        let min_impact = impacts.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_impact = impacts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let bucket_size = (max_impact - min_impact) / 10.0;

        if bucket_size == 0.0 {
            return vec![HistogramBucket {
                range_start: min_impact,
                range_end: max_impact,
                count: impacts.len() as u32,
                label: format!("{:.0}", min_impact),
            }];
        }

        // Create 10 buckets
        let mut buckets: Vec<HistogramBucket> = (0..10)
            .map(|i| {
                let start = min_impact + (i as f64 * bucket_size);
                let end = start + bucket_size;
                HistogramBucket {
                    range_start: start,
                    range_end: end,
                    count: 0,
                    label: format!("{:.0}-{:.0}", start, end),
                }
            })
            .collect();

        for impact in impacts {
            let bucket_idx = ((impact - min_impact) / bucket_size).floor() as usize;
            let bucket_idx = bucket_idx.min(9);
            buckets[bucket_idx].count += 1;
        }

        buckets
    }
}

/// Data point for time series charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub step: u32,
    pub value: f64,
}

/// Histogram bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub range_start: f64,
    pub range_end: f64,
    pub count: u32,
    pub label: String,
}
