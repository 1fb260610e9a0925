//! Candidate writers.

use crate::{Error, Result};
use opsfinder_core::EventCandidate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV header of candidate files.
pub const CSV_HEADER: &str = "window,event_type,n_hits,n_annihilation,n_prompt,\
vertex_x,vertex_y,vertex_z,annihilation_time_ps,lifetime_ps,angle_sum_deg,angle_diff_deg";

/// Output file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One row per candidate, absent values left empty.
    Csv,
    /// One JSON object per candidate and line.
    JsonLines,
}

impl OutputFormat {
    /// Picks the format from the file extension (`.csv`, `.jsonl`).
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for any other extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") => Ok(Self::JsonLines),
            _ => Err(Error::InvalidFormat(format!(
                "cannot infer output format of {}",
                path.display()
            ))),
        }
    }
}

#[derive(Serialize)]
struct Record<'a> {
    window: u64,
    #[serde(flatten)]
    candidate: &'a EventCandidate,
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writer of accepted candidates.
pub struct CandidateWriter<W: Write = BufWriter<File>> {
    writer: W,
    format: OutputFormat,
    written: u64,
}

impl CandidateWriter {
    /// Creates a file writer; the format follows the file extension.
    ///
    /// # Errors
    /// Returns an error if the extension is unknown or the file cannot be
    /// created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = OutputFormat::from_path(&path)?;
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), format)
    }
}

impl<W: Write> CandidateWriter<W> {
    /// Wraps a writer; CSV output starts with its header.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn new(mut writer: W, format: OutputFormat) -> Result<Self> {
        if format == OutputFormat::Csv {
            writeln!(writer, "{CSV_HEADER}")?;
        }
        Ok(Self {
            writer,
            format,
            written: 0,
        })
    }

    /// Returns the output format.
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Number of candidates written.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Writes the candidates of one window.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_window(&mut self, window: u64, candidates: &[EventCandidate]) -> Result<()> {
        for candidate in candidates {
            match self.format {
                OutputFormat::Csv => self.write_csv_row(window, candidate)?,
                OutputFormat::JsonLines => {
                    serde_json::to_writer(&mut self.writer, &Record { window, candidate })?;
                    self.writer.write_all(b"\n")?;
                }
            }
            self.written += 1;
        }
        Ok(())
    }

    fn write_csv_row(&mut self, window: u64, candidate: &EventCandidate) -> Result<()> {
        let point = candidate.annihilation_point;
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            window,
            candidate.event_type,
            candidate.len(),
            candidate.annihilation_count(),
            candidate.prompt_count(),
            cell(point.map(|p| p.x)),
            cell(point.map(|p| p.y)),
            cell(point.map(|p| p.z)),
            cell(candidate.annihilation_time),
            cell(candidate.lifetime),
            cell(candidate.angles.map(|a| a.sum_two_smallest())),
            cell(candidate.angles.map(|a| a.diff_two_smallest())),
        )?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}
