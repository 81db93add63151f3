//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{File, OpenOptions};
use csv::WriterBuilder;
pub use csv::Writer;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a timestamped csv.
///
/// To implement this trait, the struct shall have an `Archiver` member which
/// shall be ignored by Serde using `#[serde(skip_serializing)]. The archiver
/// member shall be setup in the struct's `init` or `new` functions. 
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session_path = session.arch_root.join(path);

        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::from_file_path(session_path)
    }

    /// Create a new archiver writing to an absolute file path.
    pub fn from_file_path<P: AsRef<Path>>(
        path: P
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // Create (or truncate) the file
        File::create(path.as_ref())?;

        // Open the file in append mode
        let file = OpenOptions::new()
            .append(true)
            .open(path.as_ref())?;

        let w = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer: Some(w)
        })
    }

    /// Serialise a record into the archive.
    ///
    /// Archivers built with `Default` have no writer, and silently drop records.
    pub fn serialise<T: serde::Serialize>(
        &mut self, record: T
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(ref mut w) = self.writer {
            w.serialize(record)?;
            w.flush()?
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        time_s: f64,
        value: f64
    }

    #[test]
    fn test_archive_rows() {
        let mut path = std::env::temp_dir();
        path.push(format!("follow_sw_archive_test_{}.csv", std::process::id()));

        let mut arch = Archiver::from_file_path(&path).unwrap();
        arch.serialise(Row { time_s: 0.0, value: 1.0 }).unwrap();
        arch.serialise(Row { time_s: 0.1, value: 2.5 }).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["time_s,value", "0.0,1.0", "0.1,2.5"]);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_default_archiver_drops_records() {
        let mut arch = Archiver::default();
        assert!(arch.serialise(Row { time_s: 0.0, value: 0.0 }).is_ok());
    }
}
