//! Journal file writer
//!
//! One markdown file per target date, `<output-dir>/YYYY-MM-DD.md`. The file
//! is written next to its destination and renamed into place so a crash never
//! leaves a half-written journal behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::schedule::NormalizedDocument;

#[derive(Debug, Error)]
#[error("Failed to write journal {}: {source}", path.display())]
pub struct JournalError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

pub struct JournalWriter {
    output_dir: PathBuf,
}

impl JournalWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Destination file for `date`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(format!("{}.md", date.format("%Y-%m-%d")))
    }

    /// Write the document, replacing any journal already there for that date
    pub fn write(&self, date: NaiveDate, document: &NormalizedDocument) -> Result<PathBuf, JournalError> {
        let path = self.path_for(date);
        debug!(?path, "JournalWriter::write: called");

        fs::create_dir_all(&self.output_dir).map_err(|source| JournalError {
            path: self.output_dir.clone(),
            source,
        })?;

        if path.exists() {
            info!("Replacing existing journal {}", path.display());
        }

        let mut content = document.to_markdown();
        content.push('\n');
        write_atomic(&path, &content).map_err(|source| JournalError {
            path: path.clone(),
            source,
        })?;

        info!("Wrote journal {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}

fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "journal path has no file name"))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
