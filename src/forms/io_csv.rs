// Primitives for reading CSV exports of the response sheet.

use crate::forms::{
    io_common::{records_from_rows, simplify_file_name},
    *,
};

pub struct CsvSource {
    path: String,
}

impl CsvSource {
    pub fn new(path: &str) -> CsvSource {
        CsvSource {
            path: path.to_string(),
        }
    }

    fn read_rows(&self) -> FormResult<Vec<Vec<String>>> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            // Trailing empty answers may be missing.
            .flexible(true)
            .from_path(&self.path)
            .context(CsvOpenSnafu {
                path: self.path.as_str(),
            })?;
        let mut rows: Vec<Vec<String>> = Vec::new();
        for (idx, line_r) in rdr.into_records().enumerate() {
            let line = line_r.context(CsvLineParseSnafu { lineno: idx + 1 })?;
            rows.push(line.iter().map(|s| s.to_string()).collect());
        }
        Ok(rows)
    }
}

impl FormSource for CsvSource {
    fn column_names(&mut self) -> FormResult<Vec<String>> {
        let (header, _) = records_from_rows(self.read_rows()?)?;
        Ok(header)
    }

    fn fetch_responses(&mut self) -> FormResult<Vec<ResponseRecord>> {
        info!("Reading responses from {}", simplify_file_name(&self.path));
        let (_, records) = records_from_rows(self.read_rows()?)?;
        debug!("fetch_responses: {} record(s)", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_quoted_multi_select_answers() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            "Timestamp,Technologies,Comments\n\
             11/15/2025 10:00:00,\"Spark, Delta Lake\",\"Nice, thanks\"\n\
             11/15/2025 10:01:00,MLflow\n"
        )
        .unwrap();
        let mut source = CsvSource::new(f.path().to_str().unwrap());
        assert_eq!(
            source.column_names().unwrap(),
            vec!["Timestamp", "Technologies", "Comments"]
        );
        let records = source.fetch_responses().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Technologies"), Some("Spark, Delta Lake"));
        assert_eq!(records[1].get("Comments"), Some(""));
    }

    #[test]
    fn file_appended_between_fetches() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "Timestamp,Name").unwrap();
        writeln!(f, "11/15/2025 10:00:00,Ada").unwrap();
        f.flush().unwrap();
        let mut source = CsvSource::new(f.path().to_str().unwrap());
        assert_eq!(source.fetch_responses().unwrap().len(), 1);
        writeln!(f, "11/15/2025 10:05:00,Bob").unwrap();
        f.flush().unwrap();
        assert_eq!(source.fetch_responses().unwrap().len(), 2);
    }

    #[test]
    fn missing_file() {
        let mut source = CsvSource::new("/nonexistent/responses.csv");
        assert!(matches!(
            source.fetch_responses(),
            Err(FormError::CsvOpen { .. })
        ));
    }
}
