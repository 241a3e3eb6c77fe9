// src/chart.rs
//! Plotly-compatible chart descriptions. Pure data → JSON-serializable structs;
//! rendering happens in the browser.

use serde::Serialize;
use serde_json::{json, Value};

use crate::correlate::CorrelatedTable;
use crate::sentiment::{Sentiment, SentimentCounts};

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Value>,
    pub layout: Value,
}

/// Line chart of keyword column `column` over time.
pub fn line_chart(
    table: &CorrelatedTable,
    column: usize,
    title: &str,
    x_label: &str,
    y_label: &str,
) -> Option<ChartSpec> {
    let name = table.keywords.get(column)?;
    let x: Vec<String> = table.dates().iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    let y = table.keyword_column(column);

    Some(ChartSpec {
        data: vec![json!({
            "type": "scatter",
            "mode": "lines",
            "name": name,
            "x": x,
            "y": y,
        })],
        layout: json!({
            "title": { "text": title },
            "xaxis": { "title": { "text": x_label } },
            "yaxis": { "title": { "text": y_label } },
        }),
    })
}

/// Pie chart of sentiment counts with the fixed sentiment palette.
pub fn pie_chart(counts: &SentimentCounts, title: &str) -> ChartSpec {
    let labels: Vec<&str> = Sentiment::ALL.iter().map(|s| s.as_str()).collect();
    let values: Vec<usize> = Sentiment::ALL.iter().map(|&s| counts.get(s)).collect();
    let colors: Vec<&str> = Sentiment::ALL.iter().map(|s| s.color()).collect();

    ChartSpec {
        data: vec![json!({
            "type": "pie",
            "labels": labels,
            "values": values,
            "marker": { "colors": colors },
        })],
        layout: json!({ "title": { "text": title } }),
    }
}
