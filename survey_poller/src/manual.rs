/*!

This is the long-form manual for `survey_poller` and the `formwatch` command line tool.

## Sources

The following providers are supported:
* `sheets` Google Sheets, read live through the Sheets API (default)
* `csv` a CSV export of the response sheet
* `xlsx` an Excel export of the response sheet

In all cases the first row holds the question labels and each following row is one submission, in arrival order.

### `sheets`

Reads the values of one worksheet (by default `Form Responses 1`, the name Google Forms uses) with the
`spreadsheets.values.get` call of the Sheets API v4. The spreadsheet is given either by id or by its full URL.

Authentication uses either an API key (`--api-key` or `FORMWATCH_API_KEY`), which only works for sheets
readable by anyone with the link, or an OAuth access token (`--access-token` or `FORMWATCH_ACCESS_TOKEN`).
Obtaining the token is left to other tools.

### `csv`

A local file, re-read on every refresh. Useful to replay a downloaded sheet, or with a file that another
tool keeps up to date.

### `xlsx`

A local Excel file (`File > Download > Microsoft Excel` in Google Sheets). Use `--worksheet` when the
workbook has more than one sheet. Date cells are converted back to the `MM/DD/YYYY HH:MM:SS` text that
Google Forms writes.

## Timestamps

New submissions are recognized by their timestamp, read from the `Timestamp` column unless configured
otherwise. The accepted formats are tried in order; by default:

* `%m/%d/%Y %H:%M:%S` (Google Forms)
* `%Y-%m-%d %H:%M:%S`
* `%Y-%m-%dT%H:%M:%S%.f`
* `%Y-%m-%d %H:%M:%S%.f`
* `rfc3339` (converted to local time)

All times are local: the formats without an offset, `--since`, and the clock used for the
"last 5 minutes" figure.

Rows without a readable timestamp are reported, kept in the summary, and never counted as new.

A submission is new if its timestamp is strictly later than the latest one delivered so far (the watermark).
The watermark is kept in memory. With `--state-file` it is also written to disk after each refresh and read
back on the next start, so that a restarted dashboard does not announce old submissions again.
`--since` sets the starting watermark explicitly.

## Configuration file

All options can be set in a JSON file passed with `--config`. Command line flags win over the file.

```json
{
  "source": {
    "provider": "sheets",
    "spreadsheetId": "1f5epAPxP_Yd3g1TunEMdtianpVAhKS0RG6BKRDSLtrk",
    "worksheetName": "Form Responses 1"
  },
  "timestamp": {
    "column": "Timestamp",
    "formats": ["%m/%d/%Y %H:%M:%S"]
  },
  "fields": [
    { "key": "experience", "label": "What is your experience level with data analytics?" },
    { "key": "technologies", "label": "What technologies are you most interested in? (Select all that apply)", "kind": "multi" },
    { "key": "session_rating", "label": "How would you rate today's session?", "kind": "rating" }
  ],
  "refresh": { "intervalSeconds": 30, "durationMinutes": 60 },
  "output": {
    "exportPath": "survey_results.csv",
    "summaryPath": "summary.json",
    "stateFile": "formwatch-state.json"
  }
}
```

Field kinds:
* `single` (default) one answer per submission, counted as is
* `multi` checkbox questions: Google Forms joins the selected answers with commas, they are split and counted separately
* `rating` numeric answers (linear scales): count, average and histogram. Non-numeric answers are ignored.

Without any field, every column except the timestamp is summarized as a `single` question. Percentages
are of all responses, unanswered ones included. The summary also shows the time between the first and
latest response and the last five responses.

Every label must match a column of the sheet exactly. The tool checks this once at startup and stops
with the list of missing labels.

## Refresh

`--interval` (seconds, default 30) is the pause between two refreshes. `--duration` (minutes, default 60) is
how long to keep refreshing; `0` does nothing and `--forever` never stops. Ctrl-C stops after the
refresh in progress. A failed fetch or a failed report is logged and the next refresh happens as usual.

`--once` fetches a single time and prints the summary. Combined with `--reference`, the JSON summary is
compared with a reference file and the differences are printed.

*/
