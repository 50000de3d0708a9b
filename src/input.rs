//! Loading URL lists from text, CSV and Excel files

use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Seek},
    path::Path,
};

use calamine::{Data, Reader, Xlsx};

use crate::InputError;

/// Default name of the column holding URLs
pub const DEFAULT_URL_COLUMN: &str = "URL";

/// Load URLs from a file
///
/// `.xlsx` and `.csv` files are read as tables with a header row, taking the
/// URLs from `url_column`. Any other file is read as one URL per line.
pub fn load_urls(path: &Path, url_column: &str) -> Result<Vec<String>, InputError> {
    let file = File::open(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("xlsx") => urls_from_xlsx(BufReader::new(file), url_column),
        Some("csv") => urls_from_csv(file, url_column),
        _ => urls_from_lines(BufReader::new(file)),
    }
}

/// Read one URL per line, skipping blank lines
pub fn urls_from_lines<R: BufRead>(reader: R) -> Result<Vec<String>, InputError> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if !url.is_empty() {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

/// Read URLs from the `url_column` column of a CSV document with a header row
pub fn urls_from_csv<R: Read>(reader: R, url_column: &str) -> Result<Vec<String>, InputError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let column = reader
        .headers()?
        .iter()
        .position(|header| header.trim() == url_column)
        .ok_or_else(|| InputError::MissingColumn(url_column.to_string()))?;

    let mut urls = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(url) = row.get(column).map(str::trim)
            && !url.is_empty()
        {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

/// Read URLs from the `url_column` column of the first sheet of a workbook
///
/// The first row of the sheet is the header row. Empty cells are skipped.
pub fn urls_from_xlsx<R: Read + Seek>(
    reader: R,
    url_column: &str,
) -> Result<Vec<String>, InputError> {
    let mut workbook: Xlsx<R> = calamine::open_workbook_from_rs(reader)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(InputError::MissingColumn(url_column.to_string())),
    };

    let mut rows = range.rows();
    let column = rows
        .next()
        .and_then(|header| {
            header
                .iter()
                .position(|cell| cell_text(cell).trim() == url_column)
        })
        .ok_or_else(|| InputError::MissingColumn(url_column.to_string()))?;

    Ok(rows
        .filter_map(|row| row.get(column))
        .map(|cell| cell_text(cell).trim().to_string())
        .filter(|url| !url.is_empty())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
