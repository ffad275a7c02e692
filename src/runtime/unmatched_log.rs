//! Unmatched-variant log.
//!
//! The log is truncated and given its banner when created, then receives one
//! line per clinical record that found no annotation. Lines are written
//! through as they are recorded, so the file is complete up to the last
//! recorded failure even if the run stops early.

use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::Path;

/// First line of every unmatched log.
pub const BANNER: &str = "Unmatched Variants Log";

pub struct UnmatchedLog<W: Write> {
    writer: W,
}

impl UnmatchedLog<LineWriter<File>> {
    /// Create (or truncate) the log file at `path` and write the banner.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(LineWriter::new(file))
    }
}

impl<W: Write> UnmatchedLog<W> {
    /// Wrap a writer and write the banner.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{}", BANNER)?;
        Ok(Self { writer })
    }

    /// Record a clinical row that could not be merged.
    pub fn record(&mut self, position: usize) -> io::Result<()> {
        writeln!(self.writer, "Variant in row {} could not be merged", position)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
