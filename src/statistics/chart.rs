//! Reshapes grouped rollup sums into Chart.js line-chart payloads.

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::shared::month_label;

pub const PALETTE: [&str; 6] = [
    "#4e73df", "#1cc88a", "#36b9cc", "#f6c23e", "#e74a3b", "#858796",
];

const TRANSACTION_BACKGROUND: &str = "rgba(28, 200, 138, 0.05)";
const TRANSACTION_BORDER: &str = "rgba(28, 200, 138, 1)";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset<T> {
    pub label: String,
    pub data: Vec<T>,
    pub background_color: String,
    pub border_color: String,
    pub fill: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries<T> {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub monthly_customers: ChartSeries<i64>,
    pub monthly_transactions: ChartSeries<f64>,
}

/// One series per service type over every month seen in `rows`.
///
/// `rows` holds `(month, service type, total)`; months come out in calendar order and
/// series in name order, with 0 where a series has no value for a month.
pub fn monthly_customers(rows: &[(NaiveDate, String, i64)]) -> ChartSeries<i64> {
    let months: Vec<NaiveDate> = rows
        .iter()
        .map(|(month, _, _)| *month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut series: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for (month, service, total) in rows {
        let values = series
            .entry(service.as_str())
            .or_insert_with(|| vec![0; months.len()]);
        if let Ok(idx) = months.binary_search(month) {
            values[idx] += total;
        }
    }

    let datasets = series
        .into_iter()
        .enumerate()
        .map(|(i, (service, data))| {
            let color = PALETTE[i % PALETTE.len()];
            ChartDataset {
                label: service.to_string(),
                data,
                background_color: color.to_string(),
                border_color: color.to_string(),
                fill: false,
            }
        })
        .collect();

    ChartSeries {
        labels: months.into_iter().map(month_label).collect(),
        datasets,
    }
}

/// Single "Transaction Amount" series from `(month, total amount)` rows.
pub fn monthly_transactions(rows: &[(NaiveDate, BigDecimal)]) -> ChartSeries<f64> {
    let mut totals: BTreeMap<NaiveDate, BigDecimal> = BTreeMap::new();
    for (month, amount) in rows {
        *totals.entry(*month).or_default() += amount;
    }

    let (labels, data) = totals
        .into_iter()
        .map(|(month, amount)| (month_label(month), amount.to_f64().unwrap_or(0.0)))
        .unzip();

    ChartSeries {
        labels,
        datasets: vec![ChartDataset {
            label: "Transaction Amount".to_string(),
            data,
            background_color: TRANSACTION_BACKGROUND.to_string(),
            border_color: TRANSACTION_BORDER.to_string(),
            fill: false,
        }],
    }
}
