//! The console dashboard, and the files it keeps up to date.

use std::fmt::Write as _;
use std::io::Write;

use crate::forms::analysis::{
    summarize, FieldSummary, LatestResponse, SurveySummary, RECENT_WINDOW_MINUTES,
};
use crate::forms::config_reader::{FieldKind, WatchConfig};
use crate::forms::*;

/// Values shown per field in the text summary.
const TOP_VALUES: usize = 5;

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

fn fmt_time(ts: &Option<NaiveDateTime>) -> String {
    match ts {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

fn fmt_range(seconds: i64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else {
        format!("{}m {:02}s", m, s)
    }
}

fn render_latest(out: &mut String, latest: &LatestResponse) {
    let answers: Vec<String> = latest
        .answers
        .iter()
        .filter(|a| !a.value.is_empty())
        .map(|a| format!("{}: {}", a.key, a.value))
        .collect();
    let _ = writeln!(out, "  {}  {}", fmt_time(&latest.submitted), answers.join(" | "));
}

/// Percentages are of all responses, blanks included.
fn render_field(out: &mut String, field: &FieldSummary, total: usize) {
    let _ = writeln!(
        out,
        "\n{} ({}): {} answered",
        field.key, field.label, field.answered
    );
    if let Some(r) = &field.rating {
        let _ = writeln!(
            out,
            "  mean {:.2} over {} rating(s), min {} max {}",
            r.mean,
            r.count,
            io_common::format_number(r.min),
            io_common::format_number(r.max)
        );
        for vc in r.histogram.iter() {
            let _ = writeln!(out, "  {:>6}  {}", vc.value, "#".repeat(vc.count));
        }
        return;
    }
    for vc in field.values.iter().take(TOP_VALUES) {
        let _ = writeln!(
            out,
            "  {:<40} {:>5} ({:.1}%)",
            vc.value,
            vc.count,
            percent(vc.count, total)
        );
    }
    let hidden = field.values.len().saturating_sub(TOP_VALUES);
    if hidden > 0 {
        let _ = writeln!(out, "  ... and {} other value(s)", hidden);
    }
    if field.kind == FieldKind::Multi {
        let _ = writeln!(out, "  (several answers per response)");
    }
}

/// The summary as printed on the console.
pub fn render_text(summary: &SurveySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total responses: {}", summary.total_responses);
    let _ = writeln!(out, "First response:  {}", fmt_time(&summary.first_response));
    let _ = writeln!(out, "Latest response: {}", fmt_time(&summary.latest_response));
    if let Some(range) = summary.time_range_seconds {
        let _ = writeln!(out, "Time range:      {}", fmt_range(range));
    }
    let _ = writeln!(
        out,
        "Last {} minutes: {}",
        RECENT_WINDOW_MINUTES, summary.recent_responses
    );
    if !summary.hourly_counts.is_empty() {
        let _ = writeln!(out, "\nResponses per hour:");
        for vc in summary.hourly_counts.iter() {
            let _ = writeln!(out, "  {}  {}", vc.value, vc.count);
        }
    }
    for field in summary.fields.iter() {
        render_field(&mut out, field, summary.total_responses);
    }
    if !summary.latest_responses.is_empty() {
        let _ = writeln!(out, "\nLatest responses:");
        for latest in summary.latest_responses.iter() {
            render_latest(&mut out, latest);
        }
    }
    out
}

pub fn write_summary_json(path: &str, summary: &SurveySummary) -> FormResult<()> {
    let js = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    fs::write(path, js).context(WritingFileSnafu { path })?;
    debug!("write_summary_json: wrote {}", path);
    Ok(())
}

/// Writes the header followed by every response, in source order.
pub fn export_csv(path: &str, records: &[ResponseRecord]) -> FormResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    if let Some(first) = records.first() {
        wtr.write_record(first.labels())
            .context(CsvWriteSnafu { path })?;
    }
    for record in records.iter() {
        wtr.write_record(record.fields().iter().map(|(_, v)| v.as_str()))
            .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    info!("Exported {} response(s) to {}", records.len(), path);
    Ok(())
}

/// Consumer printing a refreshed summary whenever responses arrive.
pub struct Dashboard<W: Write> {
    config: WatchConfig,
    out: W,
    deliveries: u64,
}

impl<W: Write> Dashboard<W> {
    pub fn new(config: &WatchConfig, out: W) -> Dashboard<W> {
        Dashboard {
            config: config.clone(),
            out,
            deliveries: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn refresh(&mut self, batch: &Batch<'_>) -> FormResult<()> {
        // The state goes first: a failing export must not replay the batch.
        if let Some(path) = &self.config.state_file {
            state::save(path, batch.watermark)?;
        }
        self.deliveries += 1;

        for record in batch.new_records.iter() {
            match self.config.rules.timestamp.parse(record) {
                Some(ts) => info!("New response at {}", ts),
                None => info!("New response"),
            }
        }

        let now = chrono::Local::now().naive_local();
        if batch.is_empty() && self.deliveries > 1 {
            writeln!(
                self.out,
                "[{}] No new responses ({} in total)",
                now.format("%H:%M:%S"),
                batch.all_records.len()
            )
            .context(WritingFileSnafu { path: "<console>" })?;
            return Ok(());
        }

        let summary = summarize(
            batch.all_records,
            &self.config.rules.timestamp,
            &self.config.fields,
            now,
        );
        writeln!(
            self.out,
            "\n=== Refresh {} at {}: {} new response(s) ===\n{}",
            batch.iteration,
            now.format("%H:%M:%S"),
            batch.new_records.len(),
            render_text(&summary)
        )
        .context(WritingFileSnafu { path: "<console>" })?;
        self.out
            .flush()
            .context(WritingFileSnafu { path: "<console>" })?;

        if let Some(path) = &self.config.summary_path {
            write_summary_json(path, &summary)?;
        }
        if let Some(path) = &self.config.export_path {
            export_csv(path, batch.all_records)?;
        }
        Ok(())
    }
}

impl<W: Write> ResponseConsumer for Dashboard<W> {
    fn consume(&mut self, batch: &Batch<'_>) -> Result<(), BoxError> {
        self.refresh(batch).map_err(|e| Box::new(e) as BoxError)
    }
}
