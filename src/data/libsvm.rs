//! LibSVM format dataset implementation
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! -1 2:0.3 5:2.1
//!
//! Labels are integral class identifiers and are kept as read, so the same
//! file can feed a binary or a one-vs-one multi-class model.

use crate::core::{Dataset, Error, Result, Sample, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Dataset implementation for LibSVM format files
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    inputs: Vec<SparseVector>,
    labels: Vec<i32>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut inputs = Vec::new();
        let mut labels = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (label, features) = Self::parse_line(line).map_err(|e| {
                Error::ParseError(format!("line {}: {}", line_num + 1, e))
            })?;
            dimensions = dimensions.max(features.dim_hint());
            inputs.push(features);
            labels.push(label);
        }

        if inputs.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Ok(Self {
            inputs,
            labels,
            dimensions,
        })
    }

    /// Parse a single line in libsvm format
    fn parse_line(line: &str) -> Result<(i32, SparseVector)> {
        let mut parts = line.split_whitespace();
        let label_str = parts
            .next()
            .ok_or_else(|| Error::ParseError("empty line".to_string()))?;
        let label = parse_label(label_str)?;

        let mut indices = Vec::new();
        let mut values = Vec::new();

        for feature_str in parts {
            let (index_str, value_str) = feature_str.split_once(':').ok_or_else(|| {
                Error::ParseError(format!("invalid feature format: {feature_str}"))
            })?;

            let index = index_str
                .parse::<usize>()
                .map_err(|_| Error::ParseError(format!("invalid feature index: {index_str}")))?;
            let value = value_str
                .parse::<f64>()
                .map_err(|_| Error::ParseError(format!("invalid feature value: {value_str}")))?;

            // libsvm uses 1-based indexing
            if index == 0 {
                return Err(Error::ParseError(
                    "feature index must be positive: 0".to_string(),
                ));
            }

            indices.push(index - 1);
            values.push(value);
        }

        Ok((label, SparseVector::new(indices, values)))
    }

    pub fn inputs(&self) -> &[SparseVector] {
        &self.inputs
    }

    /// Class labels as read from the file
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Distinct labels in ascending order
    pub fn classes(&self) -> Vec<i32> {
        let mut classes = self.labels.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    pub fn into_parts(self) -> (Vec<SparseVector>, Vec<i32>) {
        (self.inputs, self.labels)
    }
}

/// Accepts `+1`, `-1`, `3` and integral floats such as `2.0`
fn parse_label(s: &str) -> Result<i32> {
    if let Ok(label) = s.trim_start_matches('+').parse::<i32>() {
        return Ok(label);
    }
    match s.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(Error::ParseError(format!("invalid label: {s}"))),
    }
}

/// Write samples in libsvm format, one line per input
pub fn write_libsvm<W: Write>(
    mut writer: W,
    inputs: &[SparseVector],
    labels: &[i32],
) -> Result<()> {
    if inputs.len() != labels.len() {
        return Err(Error::DimensionMismatch {
            expected: inputs.len(),
            actual: labels.len(),
        });
    }
    for (x, label) in inputs.iter().zip(labels) {
        write!(writer, "{label}")?;
        for (i, v) in x.indices.iter().zip(&x.values) {
            write!(writer, " {}:{}", i + 1, v)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

impl Dataset for LibSVMDataset {
    fn len(&self) -> usize {
        self.inputs.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        Sample::new(self.inputs[i].clone(), f64::from(self.labels[i]))
    }

    fn get_labels(&self) -> Vec<f64> {
        self.labels.iter().map(|&l| f64::from(l)).collect()
    }
}
