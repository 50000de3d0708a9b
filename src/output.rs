//! Output encodings for run results
//!
//! [`ResultSerializer`] turns a [`RunResult`] into the bytes of a CSV, JSON or
//! XLSX file. It never touches the network or the filesystem.

use std::{fmt, str::FromStr};

use rust_xlsxwriter::Workbook;

use crate::{RunResult, SerializeError};

/// Longest text a single spreadsheet cell can hold
const XLSX_MAX_CELL_CHARS: usize = 32_767;

const SHEET_NAME: &str = "Sheet1";

/// Supported output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    /// Excel workbook with a single sheet
    Xlsx,
}

impl OutputFormat {
    /// MIME type for download or upload of the payload
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }

    /// Default file name for saved results
    pub fn file_name(&self) -> String {
        format!("results.{}", self.extension())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(format!("unknown output format '{other}', expected csv, json or xlsx")),
        }
    }
}

/// Encodes run results
pub struct ResultSerializer;

impl ResultSerializer {
    /// Encode `result` in the given format
    ///
    /// - CSV: header row from the first record's keys, then one row per record;
    ///   an empty result gives an empty payload
    /// - JSON: an array with one object per record, keys in column order
    /// - XLSX: one sheet laid out like the CSV output
    pub fn serialize(result: &RunResult, format: OutputFormat) -> Result<Vec<u8>, SerializeError> {
        match format {
            OutputFormat::Csv => Self::to_csv(result),
            OutputFormat::Json => Self::to_json(result),
            OutputFormat::Xlsx => Self::to_xlsx(result),
        }
    }

    fn to_csv(result: &RunResult) -> Result<Vec<u8>, SerializeError> {
        if result.is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(result.keys())?;
        for record in result {
            writer.write_record(record.values())?;
        }

        writer.into_inner().map_err(|e| e.into_error().into())
    }

    fn to_json(result: &RunResult) -> Result<Vec<u8>, SerializeError> {
        Ok(serde_json::to_vec(result)?)
    }

    fn to_xlsx(result: &RunResult) -> Result<Vec<u8>, SerializeError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, key) in result.keys().into_iter().enumerate() {
            worksheet.write_string(0, col as u16, key)?;
        }
        for (row, record) in result.iter().enumerate() {
            for (col, value) in record.values().enumerate() {
                let value = truncate_chars(value, XLSX_MAX_CELL_CHARS);
                worksheet.write_string(row as u32 + 1, col as u16, value)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
