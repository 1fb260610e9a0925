//! JSON Lines readers of hit windows.
//!
//! Each non-blank line holds one serialized [`TimeWindow`].

use crate::{Error, Result};
use memmap2::Mmap;
use opsfinder_core::TimeWindow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

fn parse_line(bytes: &[u8], line: usize) -> Result<Option<TimeWindow>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|err| Error::InvalidFormat(format!("line {line}: {err}")))
}

/// Streaming reader over any buffered source.
pub struct WindowReader<R> {
    reader: R,
    buffer: Vec<u8>,
    line: usize,
}

impl WindowReader<BufReader<File>> {
    /// Opens a file for streamed reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> WindowReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line: 0,
        }
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for WindowReader<R> {
    type Item = Result<TimeWindow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    match parse_line(&self.buffer, self.line) {
                        Ok(Some(window)) => return Some(Ok(window)),
                        Ok(None) => {}
                        Err(err) => return Some(Err(err)),
                    }
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

/// A memory-mapped JSON Lines file of hit windows.
pub struct MappedWindowFile {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedWindowFile {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the mapped path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Iterates over the windows of the file.
    pub fn windows(&self) -> impl Iterator<Item = Result<TimeWindow>> + '_ {
        self.mmap
            .split(|byte| *byte == b'\n')
            .enumerate()
            .filter_map(|(i, bytes)| parse_line(bytes, i + 1).transpose())
    }
}
