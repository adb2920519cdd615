//! Export finalization: accumulated listings to a tabular CSV artifact.
//!
//! Runs on every terminal path, so even a cancelled or failed session hands
//! its caller a downloadable file. Ownership of the artifact transfers to
//! the download endpoint, which deletes it after a successful transfer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::types::Listing;

/// Writes the accumulated record set to `results_<millis>.csv` under a fixed
/// export directory.
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    /// Create an exporter rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize `records` to a fresh artifact and return its bare filename.
    ///
    /// An empty record set still produces a valid artifact: header row only.
    pub fn export(&self, records: &[Listing]) -> io::Result<String> {
        let filename = self.unique_filename();
        let path = self.dir.join(&filename);

        let mut buf: Vec<u8> = Vec::new();
        let header: Vec<String> = Listing::COLUMNS.iter().map(|c| c.to_string()).collect();
        write_row(&mut buf, &header)?;
        for record in records {
            write_row(&mut buf, &record.to_row())?;
        }
        fs::write(&path, buf)?;

        info!(filename, records = records.len(), "export artifact written");
        Ok(filename)
    }

    /// Timestamp-derived name; a same-millisecond collision gets a suffix
    /// rather than overwriting an artifact another session still owns.
    fn unique_filename(&self) -> String {
        let base = Utc::now().timestamp_millis();
        let plain = format!("results_{base}.csv");
        if !self.dir.join(&plain).exists() {
            return plain;
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("results_{base}-{n}.csv");
            if !self.dir.join(&candidate).exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row, quoting only the cells that need it.
fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, address: Option<&str>) -> Listing {
        Listing {
            title: title.to_string(),
            rating: Some("4.5".into()),
            reviews: None,
            website: None,
            address: address.map(str::to_string),
            category: None,
            phone: None,
            country_code: None,
        }
    }

    #[test]
    fn empty_set_still_produces_valid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        let filename = exporter.export(&[]).unwrap();
        assert!(filename.starts_with("results_"));
        assert!(filename.ends_with(".csv"));

        let contents = fs::read_to_string(dir.path().join(&filename)).unwrap();
        assert_eq!(
            contents.trim_end(),
            "title,rating,reviews,website,address,category,phone,countryCode"
        );
    }

    #[test]
    fn rows_follow_the_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        let filename = exporter
            .export(&[listing("Cafe Luna", Some("12 Main St"))])
            .unwrap();
        let contents = fs::read_to_string(dir.path().join(&filename)).unwrap();
        let mut lines = contents.lines();
        lines.next();
        assert_eq!(lines.next().unwrap(), "Cafe Luna,4.5,,,12 Main St,,,");
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        let filename = exporter
            .export(&[listing("Bar \"Q\", Grill", Some("1 Side St, Floor 2"))])
            .unwrap();
        let contents = fs::read_to_string(dir.path().join(&filename)).unwrap();
        assert!(contents.contains("\"Bar \"\"Q\"\", Grill\""));
        assert!(contents.contains("\"1 Side St, Floor 2\""));
    }

    #[test]
    fn back_to_back_exports_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        let a = exporter.export(&[]).unwrap();
        let b = exporter.export(&[]).unwrap();
        assert_ne!(a, b);
        assert!(dir.path().join(&a).exists());
        assert!(dir.path().join(&b).exists());
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        let exporter = CsvExporter::new(&nested).unwrap();
        exporter.export(&[]).unwrap();
        assert!(nested.is_dir());
    }
}
