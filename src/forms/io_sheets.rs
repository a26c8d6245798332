// Reading the response sheet through the Google Sheets API v4.
// see: https://developers.google.com/sheets/api/samples/reading

use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use crate::forms::config_reader::Credentials;
use crate::forms::{io_common::records_from_rows, *};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Clone, Deserialize)]
struct ValueRange {
    #[serde(rename = "majorDimension")]
    major_dimension: Option<String>,
    // Absent when the range is empty.
    #[serde(default)]
    values: Vec<Vec<JSValue>>,
}

pub struct SheetsSource {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    worksheet: String,
    credentials: Credentials,
}

impl SheetsSource {
    pub fn new(
        api_base: &str,
        spreadsheet_id: &str,
        worksheet: &str,
        credentials: Credentials,
    ) -> FormResult<SheetsSource> {
        let client = Client::builder().build().context(HttpRequestSnafu {})?;
        Ok(SheetsSource {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            worksheet: worksheet.to_string(),
            credentials,
        })
    }

    // A1 notation: sheet names are quoted, quotes inside are doubled.
    fn sheet_range(&self, cells: Option<&str>) -> String {
        let quoted = format!("'{}'", self.worksheet.replace('\'', "''"));
        match cells {
            Some(c) => format!("{}!{}", quoted, c),
            None => quoted,
        }
    }

    fn values_url(&self, range: &str) -> FormResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .ok()
            .context(InvalidApiBaseSnafu {
                url: self.api_base.as_str(),
            })?;
        {
            let mut segments = url.path_segments_mut().ok().context(InvalidApiBaseSnafu {
                url: self.api_base.as_str(),
            })?;
            segments
                .pop_if_empty()
                .extend(&["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        }
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        if let Credentials::ApiKey(key) = &self.credentials {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn get_values(&self, range: &str) -> FormResult<Vec<Vec<String>>> {
        let url = self.values_url(range)?;
        debug!("get_values: range {:?}", range);
        let mut request = self.client.get(url);
        if let Credentials::AccessToken(token) = &self.credentials {
            request = request.bearer_auth(token);
        }
        let response = request.send().context(HttpRequestSnafu {})?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return HttpStatusSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }
        let vr: ValueRange = response.json().context(HttpRequestSnafu {})?;
        if let Some(dim) = &vr.major_dimension {
            ensure_whatever!(dim == "ROWS", "Unexpected major dimension {:?}", dim);
        }
        Ok(vr
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

fn cell_text(v: &JSValue) -> String {
    match v {
        JSValue::String(s) => s.clone(),
        JSValue::Null => String::new(),
        other => other.to_string(),
    }
}

impl FormSource for SheetsSource {
    fn column_names(&mut self) -> FormResult<Vec<String>> {
        let rows = self.get_values(&self.sheet_range(Some("1:1")))?;
        let header = rows.into_iter().next().context(EmptySheetSnafu {})?;
        Ok(header.iter().map(|s| s.trim().to_string()).collect())
    }

    fn fetch_responses(&mut self) -> FormResult<Vec<ResponseRecord>> {
        info!(
            "Fetching responses from spreadsheet {} ({})",
            self.spreadsheet_id, self.worksheet
        );
        let rows = self.get_values(&self.sheet_range(None))?;
        let (_, records) = records_from_rows(rows)?;
        Ok(records)
    }
}
