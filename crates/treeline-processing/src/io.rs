//! Frame loading from CSV and Parquet sources.

use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::error::{PreprocessingError, Result, ResultExt};

/// Rows sampled for CSV schema inference.
pub const CSV_INFER_SCHEMA_ROWS: usize = 1000;

/// Supported tabular input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Csv,
    Parquet,
}

impl FrameFormat {
    /// Pick the format from a file name; anything but `.parquet` is CSV.
    pub fn from_file_name(name: &str) -> Self {
        let is_parquet = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("parquet"));
        if is_parquet { Self::Parquet } else { Self::Csv }
    }
}

/// Read a frame from in-memory bytes.
///
/// CSV input must have a header row; dtypes are inferred from the first
/// [`CSV_INFER_SCHEMA_ROWS`] rows.
pub fn read_frame_from_bytes(bytes: &[u8], format: FrameFormat) -> Result<DataFrame> {
    if bytes.is_empty() {
        return Err(PreprocessingError::EmptyDataset(
            "uploaded file is empty".to_string(),
        ));
    }

    let df = match format {
        FrameFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(CSV_INFER_SCHEMA_ROWS))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .context("Failed to parse CSV")?,
        FrameFormat::Parquet => ParquetReader::new(Cursor::new(bytes))
            .finish()
            .context("Failed to parse Parquet")?,
    };

    debug!(
        "Loaded {:?} frame with {} rows x {} columns",
        format,
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Read a frame from a file, choosing the format by extension.
pub fn read_frame_from_path(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PreprocessingError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;
    read_frame_from_bytes(&bytes, FrameFormat::from_file_name(name))
}
