// Table import: spreadsheet (first sheet), then comma CSV, then semicolon CSV.
//
// The loader only guarantees "a well-formed table with named columns". Cell
// values come back typed so the engine can normalize them in one place.

use std::fmt;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::LoadError;

/// A single cell as read from the source table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            // Integral floats print without decimals: spreadsheets store ids as numbers
            Self::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Which parser accepted the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Spreadsheet,
    CommaSeparated,
    SemicolonSeparated,
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spreadsheet => write!(f, "spreadsheet"),
            Self::CommaSeparated => write!(f, "csv (comma)"),
            Self::SemicolonSeparated => write!(f, "csv (semicolon)"),
        }
    }
}

/// One data row. `number` is the 1-based row/line in the source (header is row 1).
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub number: usize,
    pub cells: Vec<CellValue>,
}

impl TableRow {
    /// Cell at `idx`, or an empty cell when the row is short.
    pub fn cell(&self, idx: usize) -> &CellValue {
        self.cells.get(idx).unwrap_or(&EMPTY_CELL)
    }
}

/// Row-oriented table. After `load_table`, `columns` is exactly the requested list.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub format: TableFormat,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Parse `bytes` and keep only `required` columns, in that order.
///
/// Fails with `InvalidInput` when no parser accepts the bytes, and with
/// `MissingColumns` (listing what *was* present) when a column is absent.
/// Column names are matched exactly and case-sensitively.
pub fn load_table(bytes: &[u8], required: &[&str]) -> Result<Table, LoadError> {
    let table = parse_any(bytes)?;
    log::debug!(
        "parsed table as {} ({} columns, {} rows)",
        table.format,
        table.columns.len(),
        table.rows.len()
    );
    select_columns(table, required)
}

fn parse_any(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut last_error = match parse_spreadsheet(bytes) {
        Ok(table) if !is_degenerate(&table) => return Ok(table),
        Ok(_) => "spreadsheet has no header row".to_string(),
        Err(e) => e,
    };

    for (delimiter, format) in [
        (b',', TableFormat::CommaSeparated),
        (b';', TableFormat::SemicolonSeparated),
    ] {
        match parse_delimited(bytes, delimiter, format) {
            Ok(table) if !is_degenerate(&table) => return Ok(table),
            Ok(_) => last_error = format!("{format}: no usable header row"),
            Err(e) => last_error = e,
        }
    }

    Err(LoadError::InvalidInput(last_error))
}

/// A table with no columns, or a single column whose name still contains a
/// delimiter (the wrong separator was used).
fn is_degenerate(table: &Table) -> bool {
    match table.columns.as_slice() {
        [] => true,
        [only] => only.contains(';') || only.contains(','),
        _ => false,
    }
}

fn parse_spreadsheet(bytes: &[u8]) -> Result<Table, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| format!("not a spreadsheet: {e}"))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "spreadsheet contains no sheets".to_string())?
        .map_err(|e| format!("cannot read first sheet: {e}"))?;

    // Range start offset (data may not begin at A1)
    let start_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let mut source_rows = range.rows();

    let columns: Vec<String> = match source_rows.next() {
        Some(header) => header.iter().map(|c| cell_from_data(c).to_string()).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for (offset, row) in source_rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        rows.push(TableRow {
            number: start_row + offset + 2,
            cells,
        });
    }

    Ok(Table {
        format: TableFormat::Spreadsheet,
        columns,
        rows,
    })
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(n) => CellValue::Int(*n),
        Data::Float(n) => CellValue::Float(*n),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_delimited(bytes: &[u8], delimiter: u8, format: TableFormat) -> Result<Table, String> {
    if bytes.contains(&0) {
        return Err(format!("{format}: binary content"));
    }
    let content = decode_text(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| format!("{format}: {e}"))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("{format}: {e}"))?;
        let number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);

        // Short rows are padded; long rows mean the delimiter is wrong.
        if record.len() > columns.len() {
            return Err(format!(
                "{format}: line {number} has {} fields, header has {}",
                record.len(),
                columns.len()
            ));
        }

        let cells = (0..columns.len())
            .map(|i| match record.get(i) {
                Some(field) if !field.is_empty() => CellValue::Text(field.to_string()),
                _ => CellValue::Empty,
            })
            .collect();
        rows.push(TableRow { number, cells });
    }

    Ok(Table {
        format,
        columns,
        rows,
    })
}

/// Decode table text: UTF-8 (BOM stripped), falling back to Windows-1251,
/// the usual encoding of Cyrillic CSV exports.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1251.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn select_columns(table: Table, required: &[&str]) -> Result<Table, LoadError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            missing,
            available: table.columns,
        });
    }

    let indices: Vec<usize> = required
        .iter()
        .filter_map(|name| table.column_index(name))
        .collect();

    let rows = table
        .rows
        .into_iter()
        .map(|row| TableRow {
            number: row.number,
            cells: indices.iter().map(|&i| row.cell(i).clone()).collect(),
        })
        .collect();

    Ok(Table {
        format: table.format,
        columns: required.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}
