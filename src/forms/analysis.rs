//! Summaries of the responses: counts, checkbox splitting and rating statistics.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::forms::config_reader::{FieldKind, FieldMapping};
use survey_poller::{ResponseRecord, TimestampField};

/// Window used for the "recent responses" figure.
pub const RECENT_WINDOW_MINUTES: i64 = 5;

/// Number of submissions listed under "latest responses".
pub const LATEST_RESPONSES: usize = 5;

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub histogram: Vec<ValueCount>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    /// Responses with a non-blank answer.
    pub answered: usize,
    pub values: Vec<ValueCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<RatingStats>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct Answer {
    pub key: String,
    pub value: String,
}

/// One of the last submissions, restricted to the summarized fields.
#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub submitted: Option<NaiveDateTime>,
    pub answers: Vec<Answer>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
    pub total_responses: usize,
    pub first_response: Option<NaiveDateTime>,
    pub latest_response: Option<NaiveDateTime>,
    /// Seconds between the first and the latest response.
    pub time_range_seconds: Option<i64>,
    pub recent_responses: usize,
    pub hourly_counts: Vec<ValueCount>,
    pub fields: Vec<FieldSummary>,
    /// Most recent last, in sheet order.
    pub latest_responses: Vec<LatestResponse>,
}

/// Google Forms stores the boxes ticked for a checkbox question as one
/// comma-separated answer.
pub fn split_multi_select(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Counts each distinct value. Most frequent first, ties by value.
pub fn value_counts<I: IntoIterator<Item = String>>(values: I) -> Vec<ValueCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mut res: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    res.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    res
}

pub fn rating_stats(answers: &[&str]) -> Option<RatingStats> {
    let ratings: Vec<f64> = answers
        .iter()
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .collect();
    if ratings.is_empty() {
        return None;
    }
    let count = ratings.len();
    let mean = ratings.iter().sum::<f64>() / count as f64;
    let min = ratings.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = ratings.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut histogram: Vec<(f64, ValueCount)> = value_counts(
        ratings
            .iter()
            .map(|f| crate::forms::io_common::format_number(*f)),
    )
    .into_iter()
    .map(|vc| (vc.value.parse::<f64>().unwrap_or(f64::NAN), vc))
    .collect();
    histogram.sort_by(|a, b| a.0.total_cmp(&b.0));

    Some(RatingStats {
        count,
        mean,
        min,
        max,
        histogram: histogram.into_iter().map(|(_, vc)| vc).collect(),
    })
}

fn summarize_field(records: &[ResponseRecord], field: &FieldMapping) -> FieldSummary {
    let answers: Vec<&str> = records
        .iter()
        .filter_map(|r| r.get(&field.label))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    let values = match field.kind {
        FieldKind::Multi => value_counts(answers.iter().flat_map(|a| split_multi_select(a))),
        FieldKind::Single | FieldKind::Rating => {
            value_counts(answers.iter().map(|a| a.to_string()))
        }
    };
    let rating = match field.kind {
        FieldKind::Rating => rating_stats(&answers),
        _ => None,
    };
    FieldSummary {
        key: field.key.clone(),
        label: field.label.clone(),
        kind: field.kind,
        answered: answers.len(),
        values,
        rating,
    }
}

/// Without mappings, every column except the timestamp is counted as a
/// single-choice question, keyed by its label.
pub fn default_fields(records: &[ResponseRecord], timestamp: &TimestampField) -> Vec<FieldMapping> {
    match records.first() {
        Some(record) => record
            .labels()
            .filter(|l| *l != timestamp.column && !l.trim().is_empty())
            .map(|l| FieldMapping {
                key: l.to_string(),
                label: l.to_string(),
                kind: FieldKind::Single,
            })
            .collect(),
        None => vec![],
    }
}

/// The last `n` records of the sheet, which keeps arrival order.
pub fn latest_responses(records: &[ResponseRecord], n: usize) -> &[ResponseRecord] {
    &records[records.len().saturating_sub(n)..]
}

fn to_latest_response(
    record: &ResponseRecord,
    timestamp: &TimestampField,
    fields: &[FieldMapping],
) -> LatestResponse {
    LatestResponse {
        submitted: timestamp.parse(record),
        answers: fields
            .iter()
            .map(|f| Answer {
                key: f.key.clone(),
                value: record.get(&f.label).unwrap_or_default().trim().to_string(),
            })
            .collect(),
    }
}

/// Summarizes the full set of responses. `now` ends the recent window.
pub fn summarize(
    records: &[ResponseRecord],
    timestamp: &TimestampField,
    fields: &[FieldMapping],
    now: NaiveDateTime,
) -> SurveySummary {
    let defaults;
    let fields = if fields.is_empty() {
        defaults = default_fields(records, timestamp);
        &defaults
    } else {
        fields
    };
    let times: Vec<NaiveDateTime> = records.iter().filter_map(|r| timestamp.parse(r)).collect();
    let first_response = times.iter().min().cloned();
    let latest_response = times.iter().max().cloned();
    let recent_start = now - Duration::minutes(RECENT_WINDOW_MINUTES);

    let mut hourly_counts = value_counts(
        times
            .iter()
            .map(|t| t.format("%Y-%m-%d %H:00").to_string()),
    );
    hourly_counts.sort_by(|a, b| a.value.cmp(&b.value));

    SurveySummary {
        total_responses: records.len(),
        first_response,
        latest_response,
        time_range_seconds: match (first_response, latest_response) {
            (Some(first), Some(latest)) => Some((latest - first).num_seconds()),
            _ => None,
        },
        recent_responses: times.iter().filter(|t| **t > recent_start).count(),
        hourly_counts,
        fields: fields.iter().map(|f| summarize_field(records, f)).collect(),
        latest_responses: latest_responses(records, LATEST_RESPONSES)
            .iter()
            .map(|r| to_latest_response(r, timestamp, fields))
            .collect(),
    }
}
