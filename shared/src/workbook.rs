use std::fmt;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use serde::{Deserialize, Serialize};

/// One decoded data row: its zero-based index plus (header, value) cells in
/// header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub id: usize,
    pub cells: Vec<(String, String)>,
}

impl SheetRow {
    /// The value under `header`, if that column exists.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(key, _)| key == header)
            .map(|(_, value)| value.as_str())
    }
}

/// The first sheet of a generated workbook, decoded into a header row plus
/// data rows. Replaced wholesale on every successful fetch+decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookTable {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl WorkbookTable {
    /// Build a table from a raw cell grid. The first row is the header row;
    /// each following row becomes a [`SheetRow`] keyed by header, with missing
    /// trailing cells defaulting to the empty string and surplus cells beyond
    /// the header count dropped.
    pub fn from_rows(grid: Vec<Vec<String>>) -> Self {
        let mut rows_iter = grid.into_iter();
        let Some(headers) = rows_iter.next() else {
            return Self::default();
        };

        let rows = rows_iter
            .enumerate()
            .map(|(id, row)| {
                let cells = headers
                    .iter()
                    .enumerate()
                    .map(|(column, header)| {
                        let value = row.get(column).cloned().unwrap_or_default();
                        (header.clone(), value)
                    })
                    .collect();
                SheetRow { id, cells }
            })
            .collect();

        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkbookError {
    /// The bytes could not be parsed as a spreadsheet.
    Unreadable(String),
    /// The workbook contains no sheets.
    NoSheet,
}

impl fmt::Display for WorkbookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkbookError::Unreadable(detail) => write!(f, "Unreadable workbook: {}", detail),
            WorkbookError::NoSheet => write!(f, "Workbook contains no sheets"),
        }
    }
}

impl std::error::Error for WorkbookError {}

/// Decode the first sheet of a binary workbook into a [`WorkbookTable`].
pub fn decode_workbook(bytes: &[u8]) -> Result<WorkbookTable, WorkbookError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> =
        Xlsx::new(cursor).map_err(|err| WorkbookError::Unreadable(err.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(WorkbookError::NoSheet)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| WorkbookError::Unreadable(err.to_string()))?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    Ok(WorkbookTable::from_rows(grid))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_from_rows_keys_data_rows_by_header() {
        let table = WorkbookTable::from_rows(grid(&[&["Category", "Amount"], &["Rent", "500"]]));

        assert_eq!(table.headers, vec!["Category", "Amount"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].id, 0);
        assert_eq!(table.rows[0].get("Category"), Some("Rent"));
        assert_eq!(table.rows[0].get("Amount"), Some("500"));
    }

    #[test]
    fn test_from_rows_defaults_missing_cells_to_empty_string() {
        let table = WorkbookTable::from_rows(grid(&[&["Category", "Amount"], &["Rent"]]));
        assert_eq!(table.rows[0].get("Amount"), Some(""));
    }

    #[test]
    fn test_from_rows_drops_cells_beyond_header_count() {
        let table = WorkbookTable::from_rows(grid(&[&["Category"], &["Rent", "500"]]));
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.rows[0].get("Category"), Some("Rent"));
    }

    #[test]
    fn test_from_rows_empty_grid_yields_empty_table() {
        let table = WorkbookTable::from_rows(Vec::new());
        assert!(table.is_empty());
        assert!(table.headers.is_empty());
    }

    #[test]
    fn test_from_rows_header_only_yields_no_rows() {
        let table = WorkbookTable::from_rows(grid(&[&["Category", "Amount"]]));
        assert!(table.is_empty());
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn test_row_ids_follow_data_row_order() {
        let table = WorkbookTable::from_rows(grid(&[
            &["Category", "Amount"],
            &["Rent", "500"],
            &["Food", "200"],
        ]));
        assert_eq!(table.rows[0].id, 0);
        assert_eq!(table.rows[1].id, 1);
        assert_eq!(table.rows[1].get("Category"), Some("Food"));
    }

    #[test]
    fn test_get_unknown_header_is_none() {
        let table = WorkbookTable::from_rows(grid(&[&["Category"], &["Rent"]]));
        assert_eq!(table.rows[0].get("Balance"), None);
    }

    #[test]
    fn test_decode_rejects_non_spreadsheet_bytes() {
        let outcome = decode_workbook(b"definitely not a workbook");
        assert!(matches!(outcome, Err(WorkbookError::Unreadable(_))));
    }
}
