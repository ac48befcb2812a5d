use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

use crate::error::{LineError, MtimeError, Result};
use crate::fs_utils;
use crate::timestamp::{TIMESTAMP_DIGITS, Timestamp};

/// Default manifest file name inside the output/manifest directory
pub const MANIFEST_FILENAME: &str = "config.mtime";

/// One manifest line: a portable path and the mtime recorded for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Slash-separated path relative to a root, or an absolute path
    pub path: String,
    pub timestamp: Timestamp,
}

impl Record {
    pub fn new(path: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }

    /// Format as `path<TAB>yyyyMMddHHmmss` without the line terminator
    pub fn to_line(&self) -> String {
        format!("{}\t{}", self.path, self.timestamp)
    }

    /// Parse and fully validate one non-blank manifest line
    pub fn from_line(line: &str, line_number: usize) -> Result<Self> {
        let (path, digits) = parse_line(line).map_err(|source| MtimeError::Format {
            line: line_number,
            source,
        })?;

        let timestamp = Timestamp::from_digits(digits)
            .filter(|ts| ts.to_local().is_some())
            .ok_or_else(|| MtimeError::TimestampParse {
                line: line_number,
                value: digits.to_string(),
            })?;

        Ok(Self::new(path, timestamp))
    }
}

/// Split a manifest line into its path and 14-digit timestamp fields.
/// Calendar validity of the digits is not checked here.
pub fn parse_line(line: &str) -> std::result::Result<(&str, &str), LineError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 2 {
        return Err(LineError::FieldCount {
            fields: fields.len(),
            line: line.to_string(),
        });
    }

    let path = fields[0].trim();
    if path.is_empty() {
        return Err(LineError::EmptyPath);
    }

    let digits = fields[1].trim();
    if digits.is_empty() {
        return Err(LineError::EmptyTimestamp);
    }

    if digits.len() != TIMESTAMP_DIGITS {
        return Err(LineError::TimestampLength {
            len: digits.chars().count(),
            value: digits.to_string(),
        });
    }

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LineError::TimestampDigits {
            value: digits.to_string(),
        });
    }

    Ok((path, digits))
}

/// Ordered list of records, persisted as one text file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub records: Vec<Record>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Serialize all records, one per line
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for record in &self.records {
            writeln!(writer, "{}", record.to_line())?;
        }
        writer.flush()
    }

    /// Open a manifest file for record-by-record reading
    pub fn open(path: &Path) -> Result<RecordReader<BufReader<File>>> {
        let file = File::open(path).map_err(|e| MtimeError::io("open manifest", path, e))?;
        Ok(RecordReader::new(BufReader::new(file), path))
    }

    /// Replace the manifest file at `path` atomically
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        let mut content = Vec::new();
        self.write_to(&mut content)
            .map_err(|e| MtimeError::io("serialize manifest", path, e))?;

        fs_utils::atomic_write(path, &content)?;
        Ok(path.to_path_buf())
    }
}

/// Yields one parsed record per non-blank manifest line. Line numbers are
/// 1-based and count blank lines too. Callers stop at the first error.
pub struct RecordReader<R> {
    lines: Lines<R>,
    line_number: usize,
    source: PathBuf,
}

impl<R: BufRead> RecordReader<R> {
    /// `source` is only used in I/O error messages
    pub fn new(reader: R, source: &Path) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            source: source.to_path_buf(),
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(MtimeError::io("read manifest", &self.source, e))),
            };
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return Some(Record::from_line(line, self.line_number));
        }
    }
}
