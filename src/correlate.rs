// src/correlate.rs
//! Join daily news volume onto the trend series.

use chrono::NaiveDate;
use metrics::counter;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error};

use crate::dates::day_of;
use crate::news::Article;
use crate::stats::{describe, ColumnSummary};
use crate::trends::TrendSeries;

/// One trend row with the number of articles published that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelatedRow {
    pub date: NaiveDate,
    pub values: Vec<u8>,
    pub news_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelatedTable {
    pub keywords: Vec<String>,
    pub rows: Vec<CorrelatedRow>,
}

#[derive(Debug, thiserror::Error)]
enum CorrelationError {
    #[error("row {row} has {got} values for {expected} keywords")]
    ShapeMismatch {
        row: usize,
        got: usize,
        expected: usize,
    },
}

impl CorrelatedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of keyword column `idx`, in row order.
    pub fn keyword_column(&self, idx: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|r| r.values.get(idx).map(|&v| f64::from(v)))
            .collect()
    }

    pub fn news_counts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| f64::from(r.news_count)).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Summary statistics for every numeric column (each keyword, then `news_count`).
    pub fn summary(&self) -> BTreeMap<String, ColumnSummary> {
        let mut out = BTreeMap::new();
        if self.rows.is_empty() {
            return out;
        }
        for (i, kw) in self.keywords.iter().enumerate() {
            out.insert(kw.clone(), describe(&self.keyword_column(i)));
        }
        out.insert("news_count".to_string(), describe(&self.news_counts()));
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrendCorrelator;

impl TrendCorrelator {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: any internal inconsistency degrades to zero news counts.
    pub fn correlate(&self, articles: &[Article], trends: &TrendSeries) -> CorrelatedTable {
        if trends.is_empty() {
            return CorrelatedTable {
                keywords: trends.keywords.clone(),
                rows: Vec::new(),
            };
        }
        if articles.is_empty() {
            return zero_filled(trends);
        }

        match try_correlate(articles, trends) {
            Ok(table) => table,
            Err(e) => {
                counter!("correlation_fallback_total").increment(1);
                error!(error = %e, "correlation failed; news counts defaulted to zero");
                zero_filled(trends)
            }
        }
    }
}

fn zero_filled(trends: &TrendSeries) -> CorrelatedTable {
    CorrelatedTable {
        keywords: trends.keywords.clone(),
        rows: trends
            .points
            .iter()
            .map(|p| CorrelatedRow {
                date: p.date.date(),
                values: p.values.clone(),
                news_count: 0,
            })
            .collect(),
    }
}

/// Count articles per calendar day; unparseable timestamps are skipped.
pub fn daily_counts(articles: &[Article]) -> HashMap<NaiveDate, u32> {
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for a in articles {
        match day_of(&a.published_at) {
            Some(day) => *counts.entry(day).or_insert(0) += 1,
            None => debug!(
                published_at = %a.published_at,
                "skipping article with unparseable date"
            ),
        }
    }
    counts
}

fn try_correlate(
    articles: &[Article],
    trends: &TrendSeries,
) -> Result<CorrelatedTable, CorrelationError> {
    let expected = trends.keywords.len();
    for (row, p) in trends.points.iter().enumerate() {
        if p.values.len() != expected {
            return Err(CorrelationError::ShapeMismatch {
                row,
                got: p.values.len(),
                expected,
            });
        }
    }

    let counts = daily_counts(articles);
    let rows = trends
        .points
        .iter()
        .map(|p| {
            let date = p.date.date();
            CorrelatedRow {
                date,
                values: p.values.clone(),
                news_count: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(CorrelatedTable {
        keywords: trends.keywords.clone(),
        rows,
    })
}
