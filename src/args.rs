use clap::Parser;

/// Live dashboard for Google Forms surveys: polls the response sheet and reports new submissions.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. Command line options override its values.
    /// The format is described in the manual of the survey_poller crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (default sheets) Where the responses come from: sheets, csv or xlsx.
    #[clap(short, long, value_parser)]
    pub provider: Option<String>,

    /// The id of the Google spreadsheet holding the responses.
    #[clap(long, value_parser)]
    pub spreadsheet_id: Option<String>,

    /// The full URL of the Google spreadsheet, as an alternative to --spreadsheet-id.
    #[clap(long, value_parser)]
    pub spreadsheet_url: Option<String>,

    /// (default "Form Responses 1" for sheets) The worksheet containing the responses.
    #[clap(short, long, value_parser)]
    pub worksheet: Option<String>,

    /// (file path) The input file for the csv and xlsx providers.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// Google API key, for sheets readable by anyone with the link.
    #[clap(long, env = "FORMWATCH_API_KEY", value_parser, hide_env_values = true)]
    pub api_key: Option<String>,

    /// OAuth access token with read access to the sheet.
    #[clap(long, env = "FORMWATCH_ACCESS_TOKEN", value_parser, hide_env_values = true)]
    pub access_token: Option<String>,

    /// (default Timestamp) The column holding the submission time.
    #[clap(long, value_parser)]
    pub timestamp_column: Option<String>,

    /// (repeatable) A question to summarize, as key=label or key=label:kind, where kind is
    /// single (default), multi (checkboxes) or rating. The label must match the column exactly.
    #[clap(short, long, value_parser)]
    pub field: Vec<String>,

    /// (seconds, default 30) Pause between two refreshes.
    #[clap(long, value_parser)]
    pub interval: Option<u64>,

    /// (minutes, default 60) How long to keep refreshing. 0 exits immediately.
    #[clap(long, value_parser)]
    pub duration: Option<u64>,

    /// Keep refreshing until interrupted. Overrides --duration.
    #[clap(long, takes_value = false)]
    pub forever: bool,

    /// (timestamp) Only report responses submitted after this time.
    #[clap(long, value_parser)]
    pub since: Option<String>,

    /// (file path) Remember the last reported response across restarts.
    #[clap(long, value_parser)]
    pub state_file: Option<String>,

    /// (file path) Write all the responses as CSV after each refresh with new responses.
    #[clap(long, value_parser)]
    pub export: Option<String>,

    /// (file path) Write the summary in JSON format after each refresh with new responses.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// Fetch once, print the summary and exit.
    #[clap(long, takes_value = false)]
    pub once: bool,

    /// (file path) With --once, a reference summary in JSON format. formwatch checks that the computed
    /// summary matches it and prints the differences otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
