use crate::args::Args;
use crate::forms::io_common::spreadsheet_id_from_url;
use crate::forms::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WORKSHEET: &str = "Form Responses 1";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSettings {
    pub provider: Option<String>,
    #[serde(rename = "spreadsheetId")]
    pub spreadsheet_id: Option<String>,
    #[serde(rename = "spreadsheetUrl")]
    pub spreadsheet_url: Option<String>,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "apiBase")]
    pub api_base: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimestampSettings {
    pub column: Option<String>,
    pub formats: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FieldSetting {
    pub key: String,
    pub label: String,
    pub kind: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshSettings {
    #[serde(rename = "intervalSeconds")]
    pub interval_seconds: Option<u64>,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: Option<u64>,
    pub forever: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "exportPath")]
    pub export_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "stateFile")]
    pub state_file: Option<String>,
}

/// The configuration file, as written by the user. Every section is optional.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormwatchConfig {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub timestamp: TimestampSettings,
    #[serde(default)]
    pub fields: Vec<FieldSetting>,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Credentials {
    ApiKey(String),
    AccessToken(String),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SourceSpec {
    Sheets {
        spreadsheet_id: String,
        worksheet: String,
        credentials: Credentials,
        api_base: String,
    },
    Csv {
        path: String,
    },
    Xlsx {
        path: String,
        worksheet: Option<String>,
    },
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Single,
    Multi,
    Rating,
}

impl FieldKind {
    pub fn parse(s: &str) -> FormResult<FieldKind> {
        match s.trim().to_lowercase().as_str() {
            "" | "single" => Ok(FieldKind::Single),
            "multi" => Ok(FieldKind::Multi),
            "rating" => Ok(FieldKind::Rating),
            x => UnknownFieldKindSnafu { kind: x }.fail(),
        }
    }
}

/// A question of the form, under a short name of the user's choosing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FieldMapping {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
}

impl FieldMapping {
    /// Parses `key=label` or `key=label:kind`.
    ///
    /// Question labels often contain colons, so the suffix is only taken as a
    /// kind when it names one.
    pub fn parse_spec(spec: &str) -> FormResult<FieldMapping> {
        let (key, rest) = spec
            .split_once('=')
            .context(InvalidFieldSpecSnafu { spec })?;
        let (label, kind) = match rest.rsplit_once(':') {
            Some((label, kind)) => match FieldKind::parse(kind) {
                Ok(k) if !kind.trim().is_empty() => (label, k),
                _ => (rest, FieldKind::Single),
            },
            None => (rest, FieldKind::Single),
        };
        let key = key.trim();
        let label = label.trim();
        ensure!(
            !key.is_empty() && !label.is_empty(),
            InvalidFieldSpecSnafu { spec }
        );
        Ok(FieldMapping {
            key: key.to_string(),
            label: label.to_string(),
            kind,
        })
    }
}

/// Everything needed to run, after merging the file and the command line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WatchConfig {
    pub source: SourceSpec,
    pub rules: PollRules,
    pub fields: Vec<FieldMapping>,
    pub since: Option<NaiveDateTime>,
    pub state_file: Option<String>,
    pub export_path: Option<String>,
    pub summary_path: Option<String>,
}

impl WatchConfig {
    /// A copy that is safe to log.
    pub fn redacted(&self) -> WatchConfig {
        let mut c = self.clone();
        if let SourceSpec::Sheets { credentials, .. } = &mut c.source {
            *credentials = match credentials {
                Credentials::ApiKey(_) => Credentials::ApiKey("***".to_string()),
                Credentials::AccessToken(_) => Credentials::AccessToken("***".to_string()),
            };
        }
        c
    }
}

pub fn read_config_file(path: &str) -> FormResult<FormwatchConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_config_file: {:?}", contents);
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn resolve_config(args: &Args) -> FormResult<WatchConfig> {
    let file = match &args.config {
        Some(path) => read_config_file(path)?,
        None => FormwatchConfig::default(),
    };
    merge_config(args, &file)
}

/// Command line values win over the file, which wins over the defaults.
pub fn merge_config(args: &Args, file: &FormwatchConfig) -> FormResult<WatchConfig> {
    let source = resolve_source(args, &file.source)?;

    let column = args
        .timestamp_column
        .clone()
        .or_else(|| file.timestamp.column.clone())
        .unwrap_or_else(|| PollRules::DEFAULT_TIMESTAMP_COLUMN.to_string());
    let timestamp = match &file.timestamp.formats {
        Some(formats) => TimestampField::with_formats(&column, formats),
        None => TimestampField::new(&column),
    };

    let interval = args
        .interval
        .or(file.refresh.interval_seconds)
        .map(Duration::from_secs)
        .unwrap_or(PollRules::DEFAULT_INTERVAL);
    let duration = if args.forever || file.refresh.forever.unwrap_or(false) {
        RunDuration::Unbounded
    } else {
        match args.duration.or(file.refresh.duration_minutes) {
            Some(minutes) => RunDuration::Bounded(Duration::from_secs(
                minutes
                    .checked_mul(60)
                    .context(InvalidDurationSnafu { minutes })?,
            )),
            None => RunDuration::Bounded(PollRules::DEFAULT_DURATION),
        }
    };
    let rules = PollRules {
        interval,
        duration,
        timestamp,
    };
    rules.validate().context(InvalidRulesSnafu {})?;

    let fields: Vec<FieldMapping> = if args.field.is_empty() {
        file.fields
            .iter()
            .map(|f| {
                Ok(FieldMapping {
                    key: f.key.clone(),
                    label: f.label.clone(),
                    kind: FieldKind::parse(f.kind.as_deref().unwrap_or(""))?,
                })
            })
            .collect::<FormResult<Vec<FieldMapping>>>()?
    } else {
        args.field
            .iter()
            .map(|s| FieldMapping::parse_spec(s))
            .collect::<FormResult<Vec<FieldMapping>>>()?
    };

    let since = match &args.since {
        Some(s) => Some(
            rules
                .timestamp
                .parse_str(s.trim())
                .context(InvalidTimestampSnafu { value: s })?,
        ),
        None => None,
    };

    Ok(WatchConfig {
        source,
        rules,
        fields,
        since,
        state_file: args.state_file.clone().or_else(|| file.output.state_file.clone()),
        export_path: args.export.clone().or_else(|| file.output.export_path.clone()),
        summary_path: args.out.clone().or_else(|| file.output.summary_path.clone()),
    })
}

fn resolve_source(args: &Args, file: &SourceSettings) -> FormResult<SourceSpec> {
    let provider = args
        .provider
        .clone()
        .or_else(|| file.provider.clone())
        .unwrap_or_else(|| "sheets".to_string());
    let worksheet = args.worksheet.clone().or_else(|| file.worksheet_name.clone());
    let path = args.input.clone().or_else(|| file.file_path.clone());

    match provider.as_str() {
        "sheets" => {
            let spreadsheet_id = match (
                args.spreadsheet_id.clone(),
                args.spreadsheet_url.clone(),
                file.spreadsheet_id.clone(),
                file.spreadsheet_url.clone(),
            ) {
                (Some(id), _, _, _) => id,
                (None, Some(url), _, _) => id_from_url(&url)?,
                (None, None, Some(id), _) => id,
                (None, None, None, Some(url)) => id_from_url(&url)?,
                (None, None, None, None) => return MissingSpreadsheetSnafu {}.fail(),
            };
            let credentials = match (&args.access_token, &args.api_key) {
                (Some(token), _) if !token.is_empty() => Credentials::AccessToken(token.clone()),
                (_, Some(key)) if !key.is_empty() => Credentials::ApiKey(key.clone()),
                _ => return MissingCredentialsSnafu {}.fail(),
            };
            Ok(SourceSpec::Sheets {
                spreadsheet_id,
                worksheet: worksheet.unwrap_or_else(|| DEFAULT_WORKSHEET.to_string()),
                credentials,
                api_base: file
                    .api_base
                    .clone()
                    .unwrap_or_else(|| io_sheets::DEFAULT_API_BASE.to_string()),
            })
        }
        "csv" => Ok(SourceSpec::Csv {
            path: path.context(MissingFilePathSnafu { provider: "csv" })?,
        }),
        "xlsx" => Ok(SourceSpec::Xlsx {
            path: path.context(MissingFilePathSnafu { provider: "xlsx" })?,
            worksheet,
        }),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

fn id_from_url(url: &str) -> FormResult<String> {
    spreadsheet_id_from_url(url).context(InvalidSpreadsheetUrlSnafu { url })
}

/// Every mapped label, and the timestamp column, must be in the header.
pub fn validate_columns(config: &WatchConfig, header: &[String]) -> FormResult<()> {
    let mut missing: Vec<String> = Vec::new();
    let required = std::iter::once(&config.rules.timestamp.column)
        .chain(config.fields.iter().map(|f| &f.label));
    for label in required {
        if !header.iter().any(|h| h == label) && !missing.contains(label) {
            missing.push(label.clone());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        MissingColumnsSnafu { labels: missing }.fail()
    }
}
