//! opsfinder-io: Configuration and file I/O for opsfinder.
//!
//! This crate provides the JSON run configuration loader, the TOT
//! normalization table reader, streamed and memory-mapped readers of JSON
//! Lines hit windows, and CSV / JSON Lines candidate writers.
//!

pub mod config;
mod error;
mod reader;
mod tot_table;
mod writer;

pub use config::RunConfig;
pub use error::{Error, Result};
pub use reader::{MappedWindowFile, WindowReader};
pub use tot_table::{load_tot_normalization, read_tot_normalization};
pub use writer::{CandidateWriter, OutputFormat, CSV_HEADER};
