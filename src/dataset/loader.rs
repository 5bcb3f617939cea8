//! Dataset loading from delimited files.
//!
//! Loading is all-or-nothing: either the whole file parses into a
//! [`Dataset`] or the caller gets a [`LoadFailure`].

use super::{Column, Dataset};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a dataset could not be loaded.
#[derive(Debug, Error)]
pub enum LoadFailure {
    /// The configured path does not exist.
    #[error("dataset not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// The file exists but could not be read as a table.
    #[error("failed to load dataset {}: {reason}", path.display())]
    LoadError { path: PathBuf, reason: String },
}

impl LoadFailure {
    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        match self {
            LoadFailure::SourceNotFound { path } | LoadFailure::LoadError { path, .. } => path,
        }
    }
}

/// Options for reading a cohort file.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Path of the delimited source file.
    pub path: PathBuf,
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Raw cell spellings read as null. Matched exactly, before trimming.
    pub null_values: Vec<String>,
}

#[cfg(test)]
impl LoadOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        let config = crate::config::DatasetConfig::default();
        Self::from(&config)
    }
}

impl From<&crate::config::DatasetConfig> for LoadOptions {
    fn from(config: &crate::config::DatasetConfig) -> Self {
        Self {
            path: config.path.clone(),
            // Non-ASCII delimiters are rejected by Config::validate
            delimiter: u8::try_from(config.delimiter).unwrap_or(b','),
            null_values: config.null_values.clone(),
        }
    }
}

/// Reads cohort files into datasets.
///
/// Holds only immutable options, so one loader can serve any number of
/// independent report requests.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    options: LoadOptions,
}

impl DatasetLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Path of the source file this loader reads.
    pub fn path(&self) -> &Path {
        &self.options.path
    }

    /// Load the configured file.
    pub fn load(&self) -> Result<Dataset, LoadFailure> {
        let path = self.path();

        if !path.exists() {
            return Err(LoadFailure::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|e| self.load_error(e.to_string()))?;
        let dataset = self.read(file).map_err(|reason| self.load_error(reason))?;

        info!(
            "Loaded {} records with {} columns from {}",
            dataset.row_count(),
            dataset.column_names().count(),
            path.display()
        );

        for missing in dataset.missing_columns() {
            warn!("Schema incomplete: column '{}' is missing", missing);
        }

        Ok(dataset)
    }

    /// Parse delimited content held in memory.
    #[allow(dead_code)] // In-memory counterpart of load()
    pub fn parse_content(&self, content: &str) -> Result<Dataset, LoadFailure> {
        self.read(content.as_bytes())
            .map_err(|reason| self.load_error(reason))
    }

    fn load_error(&self, reason: String) -> LoadFailure {
        LoadFailure::LoadError {
            path: self.options.path.clone(),
            reason,
        }
    }

    fn read<R: Read>(&self, source: R) -> Result<Dataset, String> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .trim(Trim::None)
            .flexible(true) // Short records are padded with nulls
            .from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| format!("Failed to read header row: {}", e))?
            .clone();

        if headers.is_empty() {
            return Err("No columns to parse from file".to_string());
        }

        let (mut columns, slots) = self.columns_for(&headers);
        let mut row_count = 0;

        for result in reader.records() {
            let record = result.map_err(|e| format!("Failed to parse record: {}", e))?;

            if record.len() > headers.len() {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(format!(
                    "Expected {} fields in line {}, saw {}",
                    headers.len(),
                    line,
                    record.len()
                ));
            }

            for (index, slot) in slots.iter().enumerate() {
                if let Some(column) = slot {
                    let value = record.get(index).and_then(|raw| self.cell(raw));
                    columns[*column].push(value);
                }
            }
            row_count += 1;
        }

        debug!("Parsed {} records", row_count);

        Ok(Dataset { columns, row_count })
    }

    /// One empty column per distinct header, plus the column each header
    /// position feeds. Repeated names after the first feed nothing.
    fn columns_for(&self, headers: &StringRecord) -> (Vec<Column>, Vec<Option<usize>>) {
        let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
        let mut slots = Vec::with_capacity(headers.len());

        for name in headers.iter() {
            if columns.iter().any(|c| c.name() == name) {
                debug!("Ignoring repeated column '{}'", name);
                slots.push(None);
            } else {
                slots.push(Some(columns.len()));
                columns.push(Column::new(name, Vec::new()));
            }
        }

        (columns, slots)
    }

    fn cell(&self, raw: &str) -> Option<String> {
        if self.options.null_values.iter().any(|marker| marker == raw) {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CKD_STAGE, HTN};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn loader_for(path: &Path) -> DatasetLoader {
        DatasetLoader::new(LoadOptions::new(path))
    }

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_csv_file() {
        let file = write_csv("id,ckd_stage,htn\n1,1,1\n2, 3 ,0\n3,,1\n");
        let dataset = loader_for(file.path()).load().unwrap();

        assert_eq!(dataset.row_count(), 3);
        let stage = dataset.column(CKD_STAGE).unwrap();
        assert_eq!(
            stage.values(),
            &[Some("1".to_string()), Some(" 3 ".to_string()), None]
        );
        assert_eq!(dataset.column(HTN).unwrap().non_null_count(), 3);
    }

    #[test]
    fn test_missing_file_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");

        let err = loader_for(&path).load().unwrap_err();
        assert!(matches!(err, LoadFailure::SourceNotFound { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_empty_file_is_load_error() {
        let file = write_csv("");
        let err = loader_for(file.path()).load().unwrap_err();
        assert!(matches!(err, LoadFailure::LoadError { .. }));
    }

    #[test]
    fn test_extra_fields_are_load_error() {
        let loader = DatasetLoader::new(LoadOptions::default());
        let err = loader.parse_content("a,b\n1,2\n1,2,3\n").unwrap_err();

        match err {
            LoadFailure::LoadError { reason, .. } => assert!(reason.contains("saw 3")),
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_load_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"ckd_stage\n\xff\xfe\n").unwrap();
        file.flush().unwrap();

        let err = loader_for(file.path()).load().unwrap_err();
        assert!(matches!(err, LoadFailure::LoadError { .. }));
    }

    #[test]
    fn test_short_records_are_padded_with_nulls() {
        let loader = DatasetLoader::new(LoadOptions::default());
        let dataset = loader.parse_content("htn,hld\n1\n0,1\n").unwrap();

        assert_eq!(dataset.row_count(), 2);
        assert_eq!(
            dataset.column("hld").unwrap().values(),
            &[None, Some("1".to_string())]
        );
    }

    #[test]
    fn test_null_markers() {
        let loader = DatasetLoader::new(LoadOptions::default());
        let dataset = loader
            .parse_content("ckd_stage\nNA\nnan\nNULL\n2\nx\n")
            .unwrap();

        let stage = dataset.column(CKD_STAGE).unwrap();
        assert_eq!(stage.non_null_count(), 2);
        assert_eq!(stage.present_values().collect::<Vec<_>>(), vec!["2", "x"]);
    }

    #[test]
    fn test_null_markers_match_raw_text_only() {
        let loader = DatasetLoader::new(LoadOptions::default());
        let dataset = loader
            .parse_content("ckd_stage\n1\n   \n NA \nNA\n")
            .unwrap();

        let stage = dataset.column(CKD_STAGE).unwrap();
        assert_eq!(
            stage.values(),
            &[
                Some("1".to_string()),
                Some("   ".to_string()),
                Some(" NA ".to_string()),
                None
            ]
        );
        assert_eq!(stage.present_values().collect::<Vec<_>>(), vec!["1", "", "NA"]);
    }

    #[test]
    fn test_header_only_file_has_no_records() {
        let loader = DatasetLoader::new(LoadOptions::default());
        let dataset = loader.parse_content("ckd_stage,htn\n").unwrap();

        assert!(dataset.is_empty());
        assert!(dataset.has_column(CKD_STAGE));
    }

    #[test]
    fn test_repeated_header_keeps_first() {
        let loader = DatasetLoader::new(LoadOptions::default());
        let dataset = loader.parse_content("htn,htn\n1,0\n").unwrap();

        assert_eq!(dataset.column_names().count(), 1);
        assert_eq!(dataset.column(HTN).unwrap().values(), &[Some("1".to_string())]);
    }

    #[test]
    fn test_custom_delimiter() {
        let mut options = LoadOptions::default();
        options.delimiter = b';';
        let loader = DatasetLoader::new(options);
        let dataset = loader.parse_content("ckd_stage;htn\n4;1\n").unwrap();

        assert_eq!(
            dataset.column(HTN).unwrap().values(),
            &[Some("1".to_string())]
        );
    }
}
