//! In-memory CSV tables and their plain-text rendering.

use std::path::Path;

use hclaudit_core::DataError;
use serde::Serialize;

/// Placeholder printed for empty cells.
const MISSING: &str = "NaN";
/// Gap between rendered columns.
const COLUMN_GAP: &str = "  ";

/// A tabular dataset: a header row plus ordered data rows.
///
/// Every row has exactly `headers.len()` cells; short rows are padded with
/// empty cells and extra cells are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV bytes with a mandatory header row.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so spreadsheets exported
    /// in a legacy encoding still load.
    pub fn parse(bytes: &[u8]) -> Result<Self, csv::Error> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            let mut row: Vec<String> = record
                .iter()
                .take(headers.len())
                .map(|c| String::from_utf8_lossy(c).into_owned())
                .collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Read and parse a CSV file.
    pub async fn read(path: &Path) -> Result<Self, DataError> {
        let unreadable = |reason: String| DataError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| unreadable(e.to_string()))?;
        let table = Self::parse(&bytes).map_err(|e| unreadable(e.to_string()))?;

        if table.headers.iter().all(String::is_empty) {
            return Err(unreadable("no header row".into()));
        }
        Ok(table)
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render every row and column as aligned plain text.
    ///
    /// Rows are prefixed with their zero-based index; columns are
    /// right-aligned to their widest cell.
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return format!(
                "Empty DataFrame\nColumns: [{}]\nIndex: []",
                self.headers.join(", ")
            );
        }

        let index: Vec<String> = (0..self.rows.len()).map(|i| i.to_string()).collect();
        let index_width = index.iter().map(|i| i.len()).max().unwrap_or(0);

        let cell = |value: &str| -> String {
            if value.trim().is_empty() {
                MISSING.to_string()
            } else {
                value.replace(['\r', '\n'], " ")
            }
        };
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| cell(v)).collect())
            .collect();

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                cells
                    .iter()
                    .map(|row| width(&row[col]))
                    .chain(std::iter::once(width(header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(index_width));
        for (header, w) in self.headers.iter().zip(&widths) {
            out.push_str(COLUMN_GAP);
            out.push_str(&pad_left(header, *w));
        }

        for (idx, row) in index.iter().zip(&cells) {
            out.push('\n');
            out.push_str(&format!("{idx:<index_width$}"));
            for (value, w) in row.iter().zip(&widths) {
                out.push_str(COLUMN_GAP);
                out.push_str(&pad_left(value, *w));
            }
        }
        out
    }
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad_left(s: &str, w: usize) -> String {
    let pad = w.saturating_sub(width(s));
    format!("{}{s}", " ".repeat(pad))
}
