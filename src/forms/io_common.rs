use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::forms::*;

/// The way Google Forms writes submission times in the response sheet.
pub const FORMS_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Splits a table into its header and one record per row.
///
/// Rows where every cell is blank are skipped: deleting a response in Google
/// Sheets leaves an empty row behind.
pub fn records_from_rows(rows: Vec<Vec<String>>) -> FormResult<(Vec<String>, Vec<ResponseRecord>)> {
    let mut iter = rows.into_iter();
    let header: Vec<String> = iter
        .next()
        .context(EmptySheetSnafu {})?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    let mut records: Vec<ResponseRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let record = ResponseRecord::from_row(&header, &row);
        if record.is_empty() {
            debug!("records_from_rows: skipping blank row {}", idx + 2);
            continue;
        }
        records.push(record);
    }
    Ok((header, records))
}

/// Extracts the id from `https://docs.google.com/spreadsheets/d/{id}/edit`.
pub fn spreadsheet_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/spreadsheets/d/")?;
    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Serial number of 9999-12-31, the last day Excel can show.
const EXCEL_MAX_SERIAL: f64 = 2_958_466.0;

/// Converts an Excel serial date (days since 1899-12-30) to a date and time,
/// rounded to the second. Out of range serials give `None`.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

/// Integral numbers are printed without a decimal part, the way a sheet shows them.
pub fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

pub fn simplify_file_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_rows_are_padded_and_blank_rows_skipped() {
        let (header, records) = records_from_rows(vec![
            row(&[" Timestamp ", "Name", "Comments"]),
            row(&["11/15/2025 10:00:00", "Ada"]),
            row(&["", "", ""]),
            row(&["11/15/2025 10:01:00", "Bob", "Great", "stray"]),
        ])
        .unwrap();
        assert_eq!(header, row(&["Timestamp", "Name", "Comments"]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Comments"), Some(""));
        assert_eq!(records[1].fields().len(), 3);
    }

    #[test]
    fn no_header() {
        assert!(matches!(
            records_from_rows(vec![]),
            Err(FormError::EmptySheet {})
        ));
    }

    #[test]
    fn spreadsheet_urls() {
        assert_eq!(
            spreadsheet_id_from_url("https://docs.google.com/spreadsheets/d/1f5e-P_x/edit#gid=0"),
            Some("1f5e-P_x".to_string())
        );
        assert_eq!(
            spreadsheet_id_from_url("https://docs.google.com/spreadsheets/d/abc"),
            Some("abc".to_string())
        );
        assert_eq!(spreadsheet_id_from_url("https://docs.google.com/forms/abc"), None);
        assert_eq!(spreadsheet_id_from_url("https://docs.google.com/spreadsheets/d/"), None);
    }

    #[test]
    fn excel_dates() {
        // 45976.5 is 2025-11-15 12:00:00
        let dt = excel_serial_to_datetime(45976.5).unwrap();
        assert_eq!(
            dt.format(FORMS_TIMESTAMP_FORMAT).to_string(),
            "11/15/2025 12:00:00"
        );
        assert_eq!(excel_serial_to_datetime(-1.0), None);
        assert_eq!(excel_serial_to_datetime(1e12), None);
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
        assert!(excel_serial_to_datetime(2_958_465.5).is_some());
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(4.5), "4.5");
    }
}
