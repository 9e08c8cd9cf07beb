use std::io::Cursor;

use anyhow::{anyhow, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;

use crate::error::Error;

/// Tabular formats a catalog resource can be decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat { Csv, Excel }

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Decide how to decode a resource: by URL extension first, then by content.
pub fn sniff_format(bytes: &[u8], url: &str) -> Result<ResourceFormat, Error> {
    match extension(url).as_deref() {
        Some("csv" | "txt") => return Ok(ResourceFormat::Csv),
        Some("xls" | "xlsx" | "xlsm" | "xlsb" | "ods") => return Ok(ResourceFormat::Excel),
        _ => {}
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return Ok(ResourceFormat::Excel);
    }
    if looks_like_text(bytes) {
        return Ok(ResourceFormat::Csv);
    }
    Err(Error::Unsupported(format!("resource format of {url}")))
}

/// Decode a tabular resource into a DataFrame.
pub fn read_tabular(bytes: &[u8], url: &str) -> Result<DataFrame> {
    match sniff_format(bytes, url)? {
        ResourceFormat::Csv => read_csv_bytes(bytes),
        ResourceFormat::Excel => read_excel_bytes(bytes),
    }
}

/// Lower-cased extension of the last path segment, ignoring query and fragment.
fn extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

fn looks_like_text(bytes: &[u8]) -> bool {
    !bytes.is_empty() && !bytes.iter().take(4096).any(|&b| b == 0)
}

/// The most frequent of `;`, `,` and tab on the header line (ties go to `,`).
fn sniff_separator(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    [b',', b';', b'\t'].into_iter()
        .max_by_key(|&sep| (header.bytes().filter(|&b| b == sep).count(), sep == b','))
        .unwrap_or(b',')
}

/// Read CSV bytes; input that is not valid UTF-8 is decoded as Windows-1252.
fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1252.decode(bytes).0.into_owned(),
    };
    let separator = sniff_separator(&text);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()?;
    Ok(df)
}

/// Read the first worksheet; the first row holds the column names.
/// Columns whose cells are all numbers become Int64/Float64, everything else String.
fn read_excel_bytes(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| anyhow!("open workbook: {e}"))?;
    let range = workbook.worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no sheets"))?
        .map_err(|e| anyhow!("read first sheet: {e}"))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else { return Ok(DataFrame::empty()) };
    let body = rows.collect::<Vec<_>>();

    let columns = header.iter().enumerate()
        .map(|(i, cell)| {
            let name = match cell {
                Data::Empty => format!("column_{i}"),
                other => other.to_string(),
            };
            let cells = body.iter().map(|row| row.get(i).unwrap_or(&Data::Empty)).collect::<Vec<_>>();
            excel_column(&name, &cells)
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

fn excel_column(name: &str, cells: &[&Data]) -> Column {
    let present = cells.iter().filter(|c| !matches!(c, Data::Empty)).collect::<Vec<_>>();

    if !present.is_empty() && present.iter().all(|c| matches!(c, Data::Int(_))) {
        let values = cells.iter().map(|c| match c { Data::Int(v) => Some(*v), _ => None }).collect::<Vec<_>>();
        return Column::new(name.into(), values);
    }
    if !present.is_empty() && present.iter().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) {
        let values = cells.iter()
            .map(|c| match c {
                Data::Int(v) => Some(*v as f64),
                Data::Float(v) => Some(*v),
                _ => None,
            })
            .collect::<Vec<_>>();
        return Column::new(name.into(), values);
    }

    let values = cells.iter()
        .map(|c| match c { Data::Empty => None, other => Some(other.to_string()) })
        .collect::<Vec<_>>();
    Column::new(name.into(), values)
}
