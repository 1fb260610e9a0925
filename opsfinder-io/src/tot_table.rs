//! Text tables of per-slot TOT normalization factors.
//!
//! One `<slot> <factor>` pair per line, whitespace separated. Everything
//! after `#` is a comment and blank lines are ignored.

use crate::{Error, Result};
use opsfinder_core::TotNormalization;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reads a normalization table from a file.
///
/// # Errors
/// Returns an error if the file cannot be read or a line is malformed.
pub fn load_tot_normalization<P: AsRef<Path>>(path: P) -> Result<TotNormalization> {
    let file = File::open(path)?;
    read_tot_normalization(BufReader::new(file))
}

/// Reads a normalization table from any buffered reader.
///
/// A slot listed twice keeps its last factor.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] with the 1-based line number of the first
/// malformed line.
pub fn read_tot_normalization<R: BufRead>(reader: R) -> Result<TotNormalization> {
    let mut table = TotNormalization::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let mut fields = content.split_whitespace();
        let (Some(slot), Some(factor), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(Error::InvalidFormat(format!(
                "line {}: expected `<slot> <factor>`",
                number + 1
            )));
        };
        let slot: u16 = slot.parse().map_err(|_| {
            Error::InvalidFormat(format!("line {}: bad slot `{slot}`", number + 1))
        })?;
        let factor: f64 = factor.parse().map_err(|_| {
            Error::InvalidFormat(format!("line {}: bad factor `{factor}`", number + 1))
        })?;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(Error::InvalidFormat(format!(
                "line {}: factor {factor} must be positive",
                number + 1
            )));
        }
        table.insert(slot, factor);
    }
    log::info!("loaded {} TOT normalization factors", table.len());
    Ok(table)
}
