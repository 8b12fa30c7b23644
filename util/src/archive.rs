//! Cyclic CSV archiving
//!
//! Modules that want a per-cycle record of their status hold an `Archiver`
//! and call `serialise` once per cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Could not create the archive file: {0}")]
    CreateError(std::io::Error),

    #[error("Could not write the archive record: {0}")]
    WriteError(csv::Error),

    #[error("Could not flush the archive: {0}")]
    FlushError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root. Missing parent directories are created.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        let full_path = session.arch_root.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::CreateError)?;
        }

        let file = File::create(&full_path).map_err(ArchiveError::CreateError)?;

        Ok(Self::from_writer(file))
    }

    /// Wrap any file as an archive.
    pub fn from_writer(file: File) -> Self {
        Self {
            writer: WriterBuilder::new().has_headers(true).from_writer(file),
        }
    }

    /// Serialise a record into the archive.
    ///
    /// Records must be flat structs, nested structs and maps cannot be
    /// written as CSV rows.
    pub fn serialise<T: Serialize>(&mut self, record: &T) -> Result<(), ArchiveError> {
        self.writer
            .serialize(record)
            .map_err(ArchiveError::WriteError)?;

        self.writer.flush().map_err(ArchiveError::FlushError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        cte_m: f64,
        gated: bool,
    }

    #[test]
    fn test_archive_rows() {
        let path = std::env::temp_dir().join(format!("archive_test_{}.csv", std::process::id()));
        let mut arch = Archiver::from_writer(File::create(&path).unwrap());

        arch.serialise(&Row { cte_m: 0.25, gated: true }).unwrap();
        arch.serialise(&Row { cte_m: -1.0, gated: false }).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "cte_m,gated\n0.25,true\n-1.0,false\n");

        fs::remove_file(path).ok();
    }
}
