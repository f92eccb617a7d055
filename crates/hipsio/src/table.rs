//! Whitespace-delimited numeric tables.
//!
//! Companion waveform/reflectance data ships as plain text: one row per
//! line, columns separated by whitespace, `#` starting a comment line.

use alloc::vec::Vec;

use crate::error::{Error, Result};

/// A dense table of f64 values with a fixed column count.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformTable {
    columns: usize,
    values: Vec<f64>,
}

impl WaveformTable {
    /// Parses table text. Blank and `#` lines are skipped; every remaining
    /// line must have the same number of columns.
    pub fn parse(text: &str) -> Result<Self> {
        let mut columns = 0usize;
        let mut values = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let before = values.len();
            for field in line.split_whitespace() {
                let v = field.parse::<f64>().map_err(|_| Error::InvalidTable {
                    line: i + 1,
                    reason: "non-numeric field",
                })?;
                values.push(v);
            }
            let width = values.len() - before;
            if columns == 0 {
                columns = width;
            } else if width != columns {
                return Err(Error::InvalidTable {
                    line: i + 1,
                    reason: "inconsistent column count",
                });
            }
        }
        log::trace!(
            "parsed table with {} columns and {} rows",
            columns,
            values.len().checked_div(columns).unwrap_or(0)
        );
        Ok(WaveformTable { columns, values })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.values.len().checked_div(self.columns).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One row, or `None` when out of range.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows() {
            return None;
        }
        let start = index * self.columns;
        Some(&self.values[start..start + self.columns])
    }

    /// Copies one column out.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.columns {
            return None;
        }
        Some(
            self.values
                .iter()
                .skip(index)
                .step_by(self.columns)
                .copied()
                .collect(),
        )
    }
}

/// Reads and parses the table file at `path`.
#[cfg(feature = "std")]
pub fn read_table<P: AsRef<std::path::Path>>(path: P) -> Result<WaveformTable> {
    let text = std::fs::read_to_string(path)?;
    WaveformTable::parse(&text)
}
