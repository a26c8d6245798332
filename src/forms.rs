use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;

use chrono::NaiveDateTime;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use survey_poller::builder::PollerBuilder;
use survey_poller::clock::CancelToken;
use survey_poller::*;

use crate::args::Args;
use crate::forms::analysis::summarize;
use crate::forms::config_reader::*;
use crate::forms::render::{render_text, write_summary_json, Dashboard};

pub mod analysis;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_sheets;
mod io_xlsx;
pub mod render;
pub mod state;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FormError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid JSON"))]
    ParsingJson { source: serde_json::Error },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },

    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("{path} contains several worksheets ({names}), choose one with --worksheet"))]
    AmbiguousWorksheet { path: String, names: String },
    #[snafu(display("The sheet has no header row"))]
    EmptySheet {},

    #[snafu(display("Request to the Sheets API failed"))]
    HttpRequest { source: reqwest::Error },
    #[snafu(display("The Sheets API answered with status {status}: {body}"))]
    HttpStatus { status: u16, body: String },
    #[snafu(display("Invalid API address {url}"))]
    InvalidApiBase { url: String },

    #[snafu(display("No credentials: set --api-key or --access-token (or FORMWATCH_API_KEY / FORMWATCH_ACCESS_TOKEN)"))]
    MissingCredentials {},
    #[snafu(display("No spreadsheet: set --spreadsheet-id or --spreadsheet-url"))]
    MissingSpreadsheet {},
    #[snafu(display("Cannot find a spreadsheet id in {url}"))]
    InvalidSpreadsheetUrl { url: String },
    #[snafu(display("The {provider} provider needs an input file (--input)"))]
    MissingFilePath { provider: String },
    #[snafu(display("Unknown provider {provider:?} (expected sheets, csv or xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown field kind {kind:?} (expected single, multi or rating)"))]
    UnknownFieldKind { kind: String },
    #[snafu(display("Cannot understand field {spec:?}, expected key=label or key=label:kind"))]
    InvalidFieldSpec { spec: String },
    #[snafu(display("Columns not found in the sheet: {}", labels.join(", ")))]
    MissingColumns { labels: Vec<String> },
    #[snafu(display("Cannot read {value:?} as a timestamp"))]
    InvalidTimestamp { value: String },
    #[snafu(display("Duration of {minutes} minutes is too long, use --forever instead"))]
    InvalidDuration { minutes: u64 },
    #[snafu(display("Invalid refresh settings"))]
    InvalidRules { source: PollErrors },
    #[snafu(display("Cannot install the Ctrl-C handler"))]
    Signal { source: ctrlc::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type FormResult<T> = Result<T, FormError>;

/// A place the responses can be read from, again and again.
pub trait FormSource {
    /// The header row: one label per question.
    fn column_names(&mut self) -> FormResult<Vec<String>>;

    /// All the responses, in arrival order.
    fn fetch_responses(&mut self) -> FormResult<Vec<ResponseRecord>>;
}

/// Presents a [`FormSource`] to the poller, which only sees opaque failures.
pub struct Fetcher {
    inner: Box<dyn FormSource>,
}

impl Fetcher {
    pub fn new(inner: Box<dyn FormSource>) -> Fetcher {
        Fetcher { inner }
    }
}

impl ResponseSource for Fetcher {
    fn fetch(&mut self) -> Result<Vec<ResponseRecord>, BoxError> {
        self.inner.fetch_responses().map_err(|e| Box::new(e) as BoxError)
    }
}

pub fn open_source(spec: &SourceSpec) -> FormResult<Box<dyn FormSource>> {
    let source: Box<dyn FormSource> = match spec {
        SourceSpec::Sheets {
            spreadsheet_id,
            worksheet,
            credentials,
            api_base,
        } => Box::new(io_sheets::SheetsSource::new(
            api_base,
            spreadsheet_id,
            worksheet,
            credentials.clone(),
        )?),
        SourceSpec::Csv { path } => Box::new(io_csv::CsvSource::new(path)),
        SourceSpec::Xlsx { path, worksheet } => {
            Box::new(io_xlsx::XlsxSource::new(path, worksheet.clone()))
        }
    };
    Ok(source)
}

/// Reads the header once and fails if a mapped column is missing.
pub fn check_columns(source: &mut dyn FormSource, config: &WatchConfig) -> FormResult<()> {
    let header = source.column_names()?;
    debug!("check_columns: header: {:?}", header);
    validate_columns(config, &header)?;
    info!(
        "Found {} column(s), {} mapped field(s)",
        header.len(),
        config.fields.len()
    );
    Ok(())
}

fn starting_watermark(config: &WatchConfig) -> FormResult<Watermark> {
    if let Some(since) = config.since {
        info!("Starting after {}", since);
        return Ok(Watermark::at(since));
    }
    match &config.state_file {
        Some(path) => state::load(path),
        None => Ok(Watermark::NONE),
    }
}

/// Polls the source until the configured duration is over or Ctrl-C is pressed.
pub fn run_watch(args: &Args) -> FormResult<RunStats> {
    let config = resolve_config(args)?;
    info!("config: {:?}", config.redacted());

    let mut source = open_source(&config.source)?;
    check_columns(source.as_mut(), &config)?;

    let watermark = starting_watermark(&config)?;

    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupted, stopping after the current refresh");
        handler_token.cancel();
    })
    .context(SignalSnafu {})?;

    let dashboard = Dashboard::new(&config, std::io::stdout());
    let mut poller = PollerBuilder::new(&config.rules)
        .context(InvalidRulesSnafu {})?
        .initial_watermark(watermark)
        .cancel_token(token)
        .build(Fetcher::new(source), dashboard);

    let stats = poller.run();
    println!("\nAuto-refresh completed!");
    Ok(stats)
}

/// Fetches once and prints the summary. With a reference file, the summary must match it.
pub fn run_once(args: &Args) -> FormResult<()> {
    let config = resolve_config(args)?;
    let mut source = open_source(&config.source)?;
    check_columns(source.as_mut(), &config)?;

    let records = source.fetch_responses()?;
    info!("Fetched {} response(s)", records.len());

    // A snapshot is reproducible: the recent window ends at the latest response.
    let now = latest_timestamp(&records, &config.rules.timestamp)
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    let summary = summarize(&records, &config.rules.timestamp, &config.fields, now);
    println!("{}", render_text(&summary));

    if let Some(path) = &config.summary_path {
        write_summary_json(path, &summary)?;
    }
    if let Some(path) = &config.export_path {
        render::export_csv(path, &records)?;
    }

    if let Some(reference_path) = &args.reference {
        let computed = serde_json::to_value(&summary).context(ParsingJsonSnafu {})?;
        check_reference(reference_path, &computed)?;
    }
    Ok(())
}

fn latest_timestamp(records: &[ResponseRecord], field: &TimestampField) -> Option<NaiveDateTime> {
    records.iter().filter_map(|r| field.parse(r)).max()
}

pub fn read_reference(path: &str) -> FormResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

fn check_reference(reference_path: &str, computed: &JSValue) -> FormResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    let pretty_computed = serde_json::to_string_pretty(computed).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_computed {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), pretty_computed.as_str(), "\n");
        whatever!("Difference detected between computed summary and reference summary")
    }
    info!("Summary matches the reference {}", reference_path);
    Ok(())
}
