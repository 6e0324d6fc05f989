use std::{fs::File, io::Write, path::Path};

use anyhow::{anyhow, bail, ensure, Context, Result};
use tracing::{debug, error, info, trace, warn};

use serde::Serialize;

pub const HEADER: [&str; 3] = ["Image Path", "X", "Y"];

/// One saved annotation, coordinates in source image pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointRow {
    pub path: String,
    pub x: f64,
    pub y: f64,
}

pub trait RowSink {
    fn write_row(&mut self, row: &PointRow) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Flush and release the underlying resource.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Truncates any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        debug!("Opened output file {}", path.display());
        Self::new(file)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self> {
        /// header is written by hand so it exists even with zero rows
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush output: {}", e.error()))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_row(&mut self, row: &PointRow) -> Result<()> {
        self.writer
            .serialize(row)
            .with_context(|| format!("Failed to write row for {}", row.path))?;
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush output")
    }

    fn close(self) -> Result<()> {
        let _ = self.into_inner()?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use std::{cell::RefCell, rc::Rc};

    /// Shared view of everything a `MemorySink` received.
    #[derive(Debug, Default)]
    pub struct MemoryLog {
        pub rows: Vec<PointRow>,
        pub closed: usize,
    }

    #[derive(Default, Clone)]
    pub struct MemorySink {
        pub log: Rc<RefCell<MemoryLog>>,
    }

    impl RowSink for MemorySink {
        fn write_row(&mut self, row: &PointRow) -> Result<()> {
            self.log.borrow_mut().rows.push(row.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(self) -> Result<()> {
            self.log.borrow_mut().closed += 1;
            Ok(())
        }
    }

    fn contents(sink: CsvSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn header_written_without_rows() {
        let sink = CsvSink::new(Vec::new()).unwrap();
        assert_eq!(contents(sink), "Image Path,X,Y\n");
    }

    #[test]
    fn rows_follow_header() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write_row(&PointRow {
            path: "A".to_string(),
            x: 30.0,
            y: 40.0,
        })
        .unwrap();
        sink.write_row(&PointRow {
            path: "/imgs/b.png".to_string(),
            x: 12.25,
            y: 0.5,
        })
        .unwrap();

        assert_eq!(
            contents(sink),
            "Image Path,X,Y\nA,30.0,40.0\n/imgs/b.png,12.25,0.5\n"
        );
    }

    #[test]
    fn paths_with_commas_are_quoted() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.write_row(&PointRow {
            path: "dir,with,commas/a.jpg".to_string(),
            x: 1.5,
            y: 2.0,
        })
        .unwrap();

        assert_eq!(
            contents(sink),
            "Image Path,X,Y\n\"dir,with,commas/a.jpg\",1.5,2.0\n"
        );
    }

    #[test]
    fn create_truncates_existing_file() {
        let path = std::env::temp_dir().join("point_labeler_truncate.csv");
        std::fs::write(&path, "old,contents\nmore,stuff\n").unwrap();

        let sink = CsvSink::create(&path).unwrap();
        sink.close().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Image Path,X,Y\n");
        let _ = std::fs::remove_file(&path);
    }
}
