use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::SweepError;

/// One tab-separated output table, one file per outer sweep point.
///
/// The first line is a `#`-prefixed header naming the columns; every later
/// line is one inner sweep point. Write failures are fatal to the sweep —
/// a half-written table for the current point is worse than stopping, and
/// files already flushed for earlier points stay valid.
pub struct Table {
    file: File,
    path: PathBuf,
}

impl Table {
    pub fn create(path: &Path, header: &str) -> Result<Self, SweepError> {
        let mut table = File::create(path)
            .map(|file| Table {
                file,
                path: path.to_path_buf(),
            })
            .map_err(|source| SweepError::OutputFile {
                path: path.to_path_buf(),
                source,
            })?;
        table.write_line(header)?;
        Ok(table)
    }

    /// Append one row: the inner sweep coordinate, then its metric columns.
    pub fn write_row(&mut self, coordinate: u32, metrics: &[f64]) -> Result<(), SweepError> {
        let mut row = coordinate.to_string();
        for metric in metrics {
            row.push('\t');
            row.push_str(&metric.to_string());
        }
        self.write_line(&row)
    }

    fn write_line(&mut self, line: &str) -> Result<(), SweepError> {
        writeln!(self.file, "{line}").map_err(|source| SweepError::OutputFile {
            path: self.path.clone(),
            source,
        })
    }
}

/// `{host}.{mode-name}.s{servers}.dat`
pub fn channel_file_name(host: &str, mode_name: &str, servers: u32) -> String {
    format!("{host}.{mode_name}.s{servers}.dat")
}

/// `{host}.{name}.u{load}.dat`
pub fn latency_file_name(host: &str, name: &str, load_percent: u32) -> String {
    format!("{host}.{name}.u{load_percent}.dat")
}
