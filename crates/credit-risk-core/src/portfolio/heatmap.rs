//! Days-overdue × outstanding-amount bucketing.
//!
//! Bounds are inclusive upper limits, so a value sitting exactly on a
//! boundary belongs to the lower bucket on both axes. A final open bucket
//! catches everything above the last bound, which makes the partition total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::collections::CollectionsAccount;
use crate::config::PortfolioConfig;
use crate::types::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket<T> {
    pub label: String,
    /// Exclusive lower limit; `None` for the first bucket.
    pub above: Option<T>,
    /// Inclusive upper limit; `None` for the open last bucket.
    pub up_to: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub overdue_bucket: usize,
    pub amount_bucket: usize,
    pub count: u64,
    pub outstanding: Money,
}

/// Rows are days-overdue buckets, columns are amount buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub overdue_buckets: Vec<Bucket<u32>>,
    pub amount_buckets: Vec<Bucket<Money>>,
    pub cells: Vec<Vec<HeatmapCell>>,
}

impl Heatmap {
    pub fn total_count(&self) -> u64 {
        self.cells.iter().flatten().map(|c| c.count).sum()
    }

    pub fn total_outstanding(&self) -> Money {
        self.cells.iter().flatten().map(|c| c.outstanding).sum()
    }

    pub fn cell(&self, overdue_bucket: usize, amount_bucket: usize) -> Option<&HeatmapCell> {
        self.cells.get(overdue_bucket)?.get(amount_bucket)
    }
}

/// Index of the first bucket whose inclusive upper bound holds `value`.
pub fn bucket_index<T: PartialOrd>(value: &T, bounds: &[T]) -> usize {
    bounds
        .iter()
        .position(|b| value <= b)
        .unwrap_or(bounds.len())
}

pub fn build_heatmap(accounts: &[CollectionsAccount], config: &PortfolioConfig) -> Heatmap {
    let overdue_buckets = overdue_buckets(&config.overdue_bucket_bounds);
    let amount_buckets = amount_buckets(&config.amount_bucket_bounds);

    let mut cells: Vec<Vec<HeatmapCell>> = (0..overdue_buckets.len())
        .map(|row| {
            (0..amount_buckets.len())
                .map(|col| HeatmapCell {
                    overdue_bucket: row,
                    amount_bucket: col,
                    count: 0,
                    outstanding: Decimal::ZERO,
                })
                .collect()
        })
        .collect();

    for account in accounts {
        let row = bucket_index(&account.days_overdue, &config.overdue_bucket_bounds);
        let col = bucket_index(&account.outstanding, &config.amount_bucket_bounds);
        let cell = &mut cells[row][col];
        cell.count += 1;
        cell.outstanding += account.outstanding;
    }

    Heatmap {
        overdue_buckets,
        amount_buckets,
        cells,
    }
}

fn overdue_buckets(bounds: &[u32]) -> Vec<Bucket<u32>> {
    let mut buckets = Vec::with_capacity(bounds.len() + 1);
    let mut prev: Option<u32> = None;
    for &b in bounds {
        let label = match prev {
            None if b == 0 => "0".to_string(),
            None => format!("0-{}", b),
            Some(p) if p.saturating_add(1) == b => b.to_string(),
            Some(p) => format!("{}-{}", p.saturating_add(1), b),
        };
        buckets.push(Bucket {
            label,
            above: prev,
            up_to: Some(b),
        });
        prev = Some(b);
    }
    buckets.push(Bucket {
        label: match prev {
            Some(p) => format!("{}+", p.saturating_add(1)),
            None => "all".to_string(),
        },
        above: prev,
        up_to: None,
    });
    buckets
}

fn amount_buckets(bounds: &[Money]) -> Vec<Bucket<Money>> {
    let mut buckets = Vec::with_capacity(bounds.len() + 1);
    let mut prev: Option<Money> = None;
    for &b in bounds {
        let label = match prev {
            None => format!("<= {}", b),
            Some(p) => format!("{} - {}", p, b),
        };
        buckets.push(Bucket {
            label,
            above: prev,
            up_to: Some(b),
        });
        prev = Some(b);
    }
    buckets.push(Bucket {
        label: match prev {
            Some(p) => format!("> {}", p),
            None => "all".to_string(),
        },
        above: prev,
        up_to: None,
    });
    buckets
}
