//! Tabular file codecs for import and export.
//!
//! A [`Dataset`] is a header row plus string cells. It encodes to and
//! decodes from CSV, XLSX (first worksheet) and JSON (an array of objects).

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Csv,
    Xlsx,
    Json,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Xlsx => "xlsx",
            Format::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Csv => "text/csv; charset=utf-8",
            Format::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Format::Json => "application/json",
        }
    }

    /// File line of the first data row. Spreadsheet formats count the
    /// header as line 1; JSON counts array elements from 1.
    pub fn first_data_line(&self) -> usize {
        match self {
            Format::Csv | Format::Xlsx => 2,
            Format::Json => 1,
        }
    }
}

impl std::str::FromStr for Format {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "xlsx" => Ok(Format::Xlsx),
            "json" => Ok(Format::Json),
            other => Err(AppError::validation(format!(
                "Unsupported format '{}': use csv, xlsx or json",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// One data row keyed by normalized header name
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Line in the source file, for error reports
    pub line: usize,
    /// Set when the row could not be decoded; its cells are then unreliable
    pub error: Option<String>,
    fields: HashMap<String, String>,
}

impl Record {
    /// Trimmed, non-empty value of a column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, column: &str) -> AppResult<&str> {
        self.get(column)
            .ok_or_else(|| AppError::validation(format!("Missing value for '{}'", column)))
    }

    /// True when every cell is blank
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(|v| v.trim().is_empty())
    }
}

/// Header row plus string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Source line of each row when decoded from CSV; empty otherwise
    lines: Vec<usize>,
    /// Decode failure per row index
    faults: HashMap<usize, String>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Dataset {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        }
    }

    fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            ..Self::default()
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Rows as records numbered by their line in a file of `format`.
    /// CSV rows keep the line the reader found them on, which accounts for
    /// blank lines and quoted fields spanning several lines.
    pub fn records(&self, format: Format) -> Vec<Record> {
        let first = format.first_data_line();
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| Record {
                line: self.lines.get(index).copied().unwrap_or(first + index),
                error: self.faults.get(&index).cloned(),
                fields: self
                    .headers
                    .iter()
                    .enumerate()
                    .map(|(col, header)| (header.clone(), row.get(col).cloned().unwrap_or_default()))
                    .collect(),
            })
            .collect()
    }

    pub fn encode(&self, format: Format) -> AppResult<Vec<u8>> {
        match format {
            Format::Csv => self.encode_csv(),
            Format::Xlsx => self.encode_xlsx(),
            Format::Json => self.encode_json(),
        }
    }

    pub fn decode(bytes: &[u8], format: Format) -> AppResult<Self> {
        let mut dataset = match format {
            Format::Csv => Self::decode_csv(bytes)?,
            Format::Xlsx => Self::decode_xlsx(bytes)?,
            Format::Json => Self::decode_json(bytes)?,
        };
        dataset.headers = dataset.headers.iter().map(|h| normalize_header(h)).collect();
        Ok(dataset)
    }

    fn encode_csv(&self) -> AppResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))
    }

    fn encode_xlsx(&self) -> AppResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, header) in self.headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, header.as_str())
                .map_err(|e| AppError::internal(format!("XLSX write failed: {}", e)))?;
        }
        for (index, row) in self.rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                worksheet
                    .write_string(index as u32 + 1, col as u16, cell.as_str())
                    .map_err(|e| AppError::internal(format!("XLSX write failed: {}", e)))?;
            }
        }

        workbook
            .save_to_buffer()
            .map_err(|e| AppError::internal(format!("XLSX write failed: {}", e)))
    }

    fn encode_json(&self) -> AppResult<Vec<u8>> {
        let items: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = self
                    .headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, cell)| (header.clone(), Value::String(cell.clone())))
                    .collect();
                Value::Object(object)
            })
            .collect();

        serde_json::to_vec_pretty(&items)
            .map_err(|e| AppError::internal(format!("JSON write failed: {}", e)))
    }

    fn decode_csv(bytes: &[u8]) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .byte_headers()
            .map_err(|e| AppError::validation(format!("Unreadable CSV header: {}", e)))?
            .iter()
            .map(|field| {
                String::from_utf8(field.to_vec())
                    .map_err(|_| AppError::validation("CSV header is not valid UTF-8"))
            })
            .collect::<AppResult<Vec<String>>>()?;

        let mut dataset = Self::from_rows(headers, Vec::new());
        for record in reader.byte_records() {
            let record = record.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                AppError::validation(format!("Unreadable CSV at line {}: {}", line, e))
            })?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(Format::Csv.first_data_line() + dataset.rows.len());

            // Undecodable cells spoil only their own row
            let mut cells = Vec::with_capacity(record.len());
            let mut bad_column = None;
            for (col, field) in record.iter().enumerate() {
                match String::from_utf8(field.to_vec()) {
                    Ok(text) => cells.push(text),
                    Err(_) => {
                        bad_column.get_or_insert(col);
                        cells.push(String::from_utf8_lossy(field).into_owned());
                    }
                }
            }
            if let Some(col) = bad_column {
                let column = dataset
                    .headers
                    .get(col)
                    .map(|h| normalize_header(h))
                    .unwrap_or_else(|| format!("column {}", col + 1));
                dataset.faults.insert(
                    dataset.rows.len(),
                    format!("Value for '{}' is not valid UTF-8 text", column),
                );
            }

            dataset.lines.push(line);
            dataset.rows.push(cells);
        }

        Ok(dataset)
    }

    fn decode_xlsx(bytes: &[u8]) -> AppResult<Self> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| AppError::validation(format!("Unreadable XLSX file: {}", e)))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::validation("XLSX file has no worksheet"))?
            .map_err(|e| AppError::validation(format!("Unreadable XLSX worksheet: {}", e)))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();
        let rows = rows.map(|row| row.iter().map(cell_text).collect()).collect();

        Ok(Self::from_rows(headers, rows))
    }

    fn decode_json(bytes: &[u8]) -> AppResult<Self> {
        let items: Vec<Map<String, Value>> = serde_json::from_slice(bytes).map_err(|e| {
            AppError::validation(format!("JSON import must be an array of objects: {}", e))
        })?;

        let mut headers: Vec<String> = Vec::new();
        for item in &items {
            for key in item.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = items
            .iter()
            .map(|item| {
                headers
                    .iter()
                    .map(|h| item.get(h).map(json_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self::from_rows(headers, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new(&["email", "first_name", "notes"]);
        dataset.push(vec![
            "juan@kasiglahan.jcsgo.com".into(),
            "Juan".into(),
            "likes music, sings".into(),
        ]);
        dataset.push(vec!["maria@kasiglahan.jcsgo.com".into(), "Maria".into(), String::new()]);
        dataset
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("XLSX".parse::<Format>().unwrap(), Format::Xlsx);
        assert!("pdf".parse::<Format>().is_err());
    }

    #[test]
    fn test_csv_quotes_commas() {
        let bytes = sample().encode(Format::Csv).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"likes music, sings\""));

        let decoded = Dataset::decode(&bytes, Format::Csv).unwrap();
        assert_eq!(decoded.headers, sample().headers);
        assert_eq!(decoded.rows, sample().rows);
    }

    #[test]
    fn test_csv_lines_follow_the_source_file() {
        let raw = "email,first_name,notes\n\
                   ana@tabak.jcsgo.com,Ana,\"first line\nsecond line\"\n\
                   \n\
                   ben@tabak.jcsgo.com,Ben,\n";
        let decoded = Dataset::decode(raw.as_bytes(), Format::Csv).unwrap();
        let records = decoded.records(Format::Csv);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].get("notes"), Some("first line\nsecond line"));
        assert_eq!(records[1].line, 5);
        assert_eq!(records[1].get("first_name"), Some("Ben"));
    }

    #[test]
    fn test_csv_invalid_utf8_marks_only_its_row() {
        let mut raw = b"email,first_name\nana@tabak.jcsgo.com,Ana\nben@tabak.jcsgo.com,B".to_vec();
        raw.extend_from_slice(b"\xff\xfe\n");
        raw.extend_from_slice(b"cel@tabak.jcsgo.com,Cel\n");

        let decoded = Dataset::decode(&raw, Format::Csv).unwrap();
        let records = decoded.records(Format::Csv);

        assert_eq!(records.len(), 3);
        assert!(records[0].error.is_none());
        assert_eq!(records[1].line, 3);
        assert!(records[1].error.as_deref().unwrap().contains("first_name"));
        assert!(records[2].error.is_none());
        assert_eq!(records[2].get("first_name"), Some("Cel"));
    }

    #[test]
    fn test_csv_headers_are_normalized_and_short_rows_padded() {
        let raw = "Email,First Name,Last-Name\njuan@kasiglahan.jcsgo.com,Juan\n";
        let decoded = Dataset::decode(raw.as_bytes(), Format::Csv).unwrap();
        assert_eq!(decoded.headers, vec!["email", "first_name", "last_name"]);

        let records = decoded.records(Format::Csv);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].get("first_name"), Some("Juan"));
        assert_eq!(records[0].get("last_name"), None);
        assert!(records[0].required("last_name").is_err());
    }

    #[test]
    fn test_json_line_numbers_start_at_one() {
        let raw = r#"[{"email": "a@x.jcsgo.com", "capacity": 12}, {"email": null}]"#;
        let decoded = Dataset::decode(raw.as_bytes(), Format::Json).unwrap();
        let records = decoded.records(Format::Json);

        assert_eq!(records[0].line, 1);
        assert_eq!(records[0].get("capacity"), Some("12"));
        assert!(records[1].is_blank());
    }

    #[test]
    fn test_json_rejects_non_array() {
        assert!(Dataset::decode(b"{\"email\": 1}", Format::Json).is_err());
    }

    #[test]
    fn test_xlsx_encode_decode() {
        let bytes = sample().encode(Format::Xlsx).unwrap();
        let decoded = Dataset::decode(&bytes, Format::Xlsx).unwrap();
        assert_eq!(decoded.headers, sample().headers);
        assert_eq!(decoded.rows[0][2], "likes music, sings");
        assert_eq!(decoded.records(Format::Xlsx)[1].line, 3);
    }
}
