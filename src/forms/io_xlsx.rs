use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::forms::{
    io_common::{
        excel_serial_to_datetime, format_number, records_from_rows, simplify_file_name,
        FORMS_TIMESTAMP_FORMAT,
    },
    *,
};

/// An Excel download of the response sheet.
pub struct XlsxSource {
    path: String,
    worksheet: Option<String>,
}

impl XlsxSource {
    pub fn new(path: &str, worksheet: Option<String>) -> XlsxSource {
        XlsxSource {
            path: path.to_string(),
            worksheet,
        }
    }

    fn get_range(&self) -> FormResult<Range<DataType>> {
        debug!(
            "get_range: path: {:?} worksheet: {:?}",
            &self.path, &self.worksheet
        );
        let mut workbook: Xlsx<_> = open_workbook(&self.path).context(OpeningExcelSnafu {
            path: self.path.as_str(),
        })?;

        // A worksheet name was provided, use it.
        if let Some(worksheet_name) = &self.worksheet {
            let wrange = workbook
                .worksheet_range(worksheet_name)
                .context(MissingWorksheetSnafu {
                    name: worksheet_name.as_str(),
                    path: self.path.as_str(),
                })?
                .context(OpeningExcelSnafu {
                    path: self.path.as_str(),
                })?;
            return Ok(wrange);
        }

        let mut all_worksheets = workbook.worksheets();
        match all_worksheets.len() {
            0 => EmptySheetSnafu {}.fail(),
            1 => {
                let (worksheet_name, wrange) = all_worksheets.remove(0);
                debug!("get_range: using the only worksheet {:?}", worksheet_name);
                Ok(wrange)
            }
            _ => {
                let names: Vec<String> = all_worksheets.into_iter().map(|(n, _)| n).collect();
                AmbiguousWorksheetSnafu {
                    path: self.path.as_str(),
                    names: names.join(", "),
                }
                .fail()
            }
        }
    }

    fn read_rows(&self) -> FormResult<Vec<Vec<String>>> {
        let wrange = self.get_range()?;
        Ok(wrange
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => String::new(),
        DataType::Float(f) => format_number(*f),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        // Google Sheets exports the Timestamp column as real dates.
        DataType::DateTime(serial) => match excel_serial_to_datetime(*serial) {
            Some(dt) => dt.format(FORMS_TIMESTAMP_FORMAT).to_string(),
            None => format_number(*serial),
        },
        other => other.to_string(),
    }
}

impl FormSource for XlsxSource {
    fn column_names(&mut self) -> FormResult<Vec<String>> {
        let (header, _) = records_from_rows(self.read_rows()?)?;
        Ok(header)
    }

    fn fetch_responses(&mut self) -> FormResult<Vec<ResponseRecord>> {
        info!("Reading responses from {}", simplify_file_name(&self.path));
        let (_, records) = records_from_rows(self.read_rows()?)?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_as_sheet_text() {
        assert_eq!(cell_text(&DataType::String("Expert".to_string())), "Expert");
        assert_eq!(cell_text(&DataType::Float(5.0)), "5");
        assert_eq!(cell_text(&DataType::Int(3)), "3");
        assert_eq!(cell_text(&DataType::Empty), "");
        assert_eq!(
            cell_text(&DataType::DateTime(45976.5)),
            "11/15/2025 12:00:00"
        );
        // Not a date Excel can show: kept as the raw number.
        assert_eq!(cell_text(&DataType::DateTime(1e12)), "1000000000000");
    }

    #[test]
    fn missing_workbook() {
        let mut source = XlsxSource::new("/nonexistent/responses.xlsx", None);
        assert!(matches!(
            source.fetch_responses(),
            Err(FormError::OpeningExcel { .. })
        ));
    }
}
