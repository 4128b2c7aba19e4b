//! Dense matrix text format
//!
//! One row per line, entries separated by whitespace or commas. Blank lines
//! and lines starting with `#` are skipped.

use crate::core::{Error, Result};
use crate::linalg::Matrix;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Read a dense matrix from a file
pub fn read_matrix_file<P: AsRef<Path>>(path: P) -> Result<Matrix> {
    read_matrix(BufReader::new(File::open(path)?))
}

/// Read a dense matrix; every row must have the same length
pub fn read_matrix<R: BufRead>(reader: R) -> Result<Matrix> {
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let row = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>().map_err(|_| {
                    Error::ParseError(format!("line {}: invalid number: {s}", line_num + 1))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(Error::ParseError(format!(
                    "line {}: expected {} columns, found {}",
                    line_num + 1,
                    first.len(),
                    row.len()
                )));
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Matrix::from_rows(&rows)
}

/// Write a matrix one row per line, space separated
pub fn write_matrix<W: Write>(mut writer: W, matrix: &Matrix) -> Result<()> {
    for i in 0..matrix.nrows() {
        let line: Vec<String> = matrix.row(i).iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", line.join(" "))?;
    }
    Ok(())
}
