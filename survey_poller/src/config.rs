// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};

/// Errors raised by sources and consumers. They are opaque to the poller.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// One survey submission, as returned by a record source.
///
/// The fields keep the order of the columns in the source. Values are the
/// raw text of each cell; an unanswered question is an empty string.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ResponseRecord {
    fields: Vec<(String, String)>,
}

impl ResponseRecord {
    pub fn new(fields: Vec<(String, String)>) -> ResponseRecord {
        ResponseRecord { fields }
    }

    /// Builds a record from a header row and a data row.
    ///
    /// Spreadsheet exports routinely drop trailing empty cells, so a short
    /// row is padded with empty values. Cells without a header are dropped.
    pub fn from_row(header: &[String], row: &[String]) -> ResponseRecord {
        let fields = header
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), row.get(idx).cloned().unwrap_or_default()))
            .collect();
        ResponseRecord { fields }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }
}

/// The column holding the submission time, and how to read it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TimestampField {
    pub column: String,
    /// `chrono` format strings, tried in order. The special value
    /// [`TimestampField::RFC3339`] accepts offsets and converts to local
    /// time, the time base of the other formats.
    pub formats: Vec<String>,
}

impl TimestampField {
    pub const RFC3339: &'static str = "rfc3339";

    /// Google Forms writes `11/15/2025 10:00:00` in the response sheet.
    pub const DEFAULT_FORMATS: [&'static str; 5] = [
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        TimestampField::RFC3339,
    ];

    pub fn new(column: &str) -> TimestampField {
        TimestampField {
            column: column.to_string(),
            formats: TimestampField::DEFAULT_FORMATS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn with_formats(column: &str, formats: &[String]) -> TimestampField {
        TimestampField {
            column: column.to_string(),
            formats: formats.to_vec(),
        }
    }

    /// Reads the timestamp of a record. Missing, blank and unreadable values
    /// all give `None`.
    pub fn parse(&self, record: &ResponseRecord) -> Option<NaiveDateTime> {
        let raw = record.get(&self.column)?.trim();
        if raw.is_empty() {
            return None;
        }
        self.parse_str(raw)
    }

    pub fn parse_str(&self, raw: &str) -> Option<NaiveDateTime> {
        self.formats.iter().find_map(|fmt| {
            if fmt == TimestampField::RFC3339 {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.with_timezone(&Local).naive_local())
            } else {
                NaiveDateTime::parse_from_str(raw, fmt).ok()
            }
        })
    }
}

/// The most recent submission time delivered so far.
///
/// It only ever moves forward.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Hash)]
pub struct Watermark(Option<NaiveDateTime>);

impl Watermark {
    pub const NONE: Watermark = Watermark(None);

    pub fn at(ts: NaiveDateTime) -> Watermark {
        Watermark(Some(ts))
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        self.0
    }

    /// True if a record stamped `ts` has not been delivered yet.
    /// The bound is exclusive: a record equal to the watermark is old.
    pub fn is_before(&self, ts: &NaiveDateTime) -> bool {
        match &self.0 {
            None => true,
            Some(w) => w < ts,
        }
    }

    /// Moves the watermark to `ts` if that is later. Returns whether it moved.
    pub fn advance(&mut self, ts: NaiveDateTime) -> bool {
        if self.is_before(&ts) {
            self.0 = Some(ts);
            true
        } else {
            false
        }
    }
}

impl Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            None => write!(f, "<none>"),
            Some(ts) => write!(f, "{}", ts),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RunDuration {
    Bounded(Duration),
    Unbounded,
}

impl RunDuration {
    /// Time left after `elapsed`, or `None` when the run has no deadline.
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        match self {
            RunDuration::Bounded(d) => Some(d.saturating_sub(elapsed)),
            RunDuration::Unbounded => None,
        }
    }

    pub fn is_over(&self, elapsed: Duration) -> bool {
        match self {
            RunDuration::Bounded(d) => elapsed >= *d,
            RunDuration::Unbounded => false,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollRules {
    pub interval: Duration,
    pub duration: RunDuration,
    pub timestamp: TimestampField,
}

impl PollRules {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(60 * 60);
    pub const DEFAULT_TIMESTAMP_COLUMN: &'static str = "Timestamp";

    pub fn validate(&self) -> Result<(), PollErrors> {
        if self.interval.is_zero() {
            return Err(PollErrors::ZeroInterval);
        }
        if self.timestamp.column.trim().is_empty() {
            return Err(PollErrors::BlankTimestampColumn);
        }
        if self.timestamp.formats.is_empty() {
            return Err(PollErrors::NoTimestampFormats);
        }
        Ok(())
    }
}

impl Default for PollRules {
    fn default() -> Self {
        PollRules {
            interval: PollRules::DEFAULT_INTERVAL,
            duration: RunDuration::Bounded(PollRules::DEFAULT_DURATION),
            timestamp: TimestampField::new(PollRules::DEFAULT_TIMESTAMP_COLUMN),
        }
    }
}

/// Errors that prevent a poller from being built.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PollErrors {
    ZeroInterval,
    BlankTimestampColumn,
    NoTimestampFormats,
}

impl Error for PollErrors {}

impl Display for PollErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollErrors::ZeroInterval => write!(f, "the polling interval must be positive"),
            PollErrors::BlankTimestampColumn => write!(f, "the timestamp column is blank"),
            PollErrors::NoTimestampFormats => write!(f, "no timestamp format was provided"),
        }
    }
}

// ******** Output data structures *********

/// A failure inside one iteration. It is logged and the loop carries on.
#[derive(Debug)]
pub enum IterationFailure {
    Fetch(BoxError),
    Consume(BoxError),
}

impl Error for IterationFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IterationFailure::Fetch(e) | IterationFailure::Consume(e) => Some(e.as_ref()),
        }
    }
}

impl Display for IterationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IterationFailure::Fetch(e) => write!(f, "fetch failed: {}", e),
            IterationFailure::Consume(e) => write!(f, "consumer failed: {}", e),
        }
    }
}

/// What happened during a single iteration.
#[derive(Debug)]
pub enum IterationOutcome {
    /// The consumer received the batch.
    Delivered { new: usize, total: usize },
    /// Nothing was delivered and the watermark did not move.
    FetchFailed(IterationFailure),
    /// The watermark advanced but the consumer reported an error.
    ConsumeFailed {
        new: usize,
        total: usize,
        failure: IterationFailure,
    },
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunStats {
    pub iterations: u64,
    pub deliveries: u64,
    pub fetch_failures: u64,
    pub consume_failures: u64,
    pub watermark: Watermark,
    pub cancelled: bool,
}
