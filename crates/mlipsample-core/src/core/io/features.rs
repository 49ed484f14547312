use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const METADATA_SUFFIX: &str = ".meta.toml";
const GZIP_LEVEL: u32 = 9;

#[derive(Debug, Error)]
pub enum FeatureIoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to serialize metadata: {0}")]
    MetadataWrite(#[from] toml::ser::Error),
    #[error("Failed to parse metadata: {0}")]
    MetadataRead(#[from] toml::de::Error),
    #[error("Feature table is empty, nothing to write")]
    EmptyTable,
    #[error("Row {row}: expected {expected} features, found {found}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Row {row}, column '{column}': invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Duplicate structure index {0}")]
    DuplicateIndex(usize),
    #[error("Metadata does not match table contents: {0}")]
    MetadataMismatch(String),
}

/// Feature vector extracted for one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Position of the structure in its source file.
    pub structure_index: usize,
    pub num_atoms: usize,
    pub features: Vec<f64>,
}

/// Summary stored next to a feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FeatureMetadata {
    pub num_structures: usize,
    pub feature_dim: usize,
    pub description: String,
    #[serde(default)]
    pub featurizer: String,
}

/// A feature matrix with one row per structure, ordered by structure index.
///
/// On disk the table is a CSV file with the columns
/// `structure_index,num_atoms,f0,...` (gzip-compressed when the path ends in
/// `.gz`) and a TOML sidecar `<path>.meta.toml` holding [`FeatureMetadata`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    description: String,
    featurizer: String,
    records: Vec<FeatureRecord>,
}

impl FeatureTable {
    /// Builds a table, sorting records by structure index.
    ///
    /// # Errors
    ///
    /// Returns an error if rows differ in feature dimension or a structure
    /// index occurs twice.
    pub fn new(
        description: impl Into<String>,
        featurizer: impl Into<String>,
        mut records: Vec<FeatureRecord>,
    ) -> Result<Self, FeatureIoError> {
        records.sort_by_key(|r| r.structure_index);

        if let Some(first) = records.first() {
            let expected = first.features.len();
            for (row, record) in records.iter().enumerate() {
                if record.features.len() != expected {
                    return Err(FeatureIoError::DimensionMismatch {
                        row,
                        expected,
                        found: record.features.len(),
                    });
                }
            }
        }
        for pair in records.windows(2) {
            if pair[0].structure_index == pair[1].structure_index {
                return Err(FeatureIoError::DuplicateIndex(pair[0].structure_index));
            }
        }

        Ok(Self {
            description: description.into(),
            featurizer: featurizer.into(),
            records,
        })
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn feature_dim(&self) -> usize {
        self.records.first().map_or(0, |r| r.features.len())
    }

    pub fn structure_indices(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.structure_index).collect()
    }

    pub fn num_atoms(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.num_atoms).collect()
    }

    pub fn metadata(&self) -> FeatureMetadata {
        FeatureMetadata {
            num_structures: self.len(),
            feature_dim: self.feature_dim(),
            description: self.description.clone(),
            featurizer: self.featurizer.clone(),
        }
    }

    /// Path of the metadata sidecar for a table stored at `path`.
    pub fn metadata_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(METADATA_SUFFIX);
        PathBuf::from(name)
    }

    /// Writes the table as CSV.
    pub fn write_csv(&self, writer: impl Write) -> Result<(), FeatureIoError> {
        if self.is_empty() {
            return Err(FeatureIoError::EmptyTable);
        }
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["structure_index".to_string(), "num_atoms".to_string()];
        header.extend((0..self.feature_dim()).map(|i| format!("f{}", i)));
        csv_writer.write_record(&header)?;

        for record in &self.records {
            let mut row = Vec::with_capacity(record.features.len() + 2);
            row.push(record.structure_index.to_string());
            row.push(record.num_atoms.to_string());
            row.extend(record.features.iter().map(|v| v.to_string()));
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Reads a table from CSV. Description and featurizer are left empty.
    pub fn read_csv(reader: impl Read) -> Result<Self, FeatureIoError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let expected = headers.len().saturating_sub(2);

        let mut records = Vec::new();
        for (row, result) in csv_reader.records().enumerate() {
            let record = result?;
            if record.len() != expected + 2 {
                return Err(FeatureIoError::DimensionMismatch {
                    row,
                    expected,
                    found: record.len().saturating_sub(2),
                });
            }

            let field = |i: usize| {
                let value = &record[i];
                let column = headers.get(i).unwrap_or("").to_string();
                (value, column)
            };
            let parse_usize = |i: usize| -> Result<usize, FeatureIoError> {
                let (value, column) = field(i);
                value.parse().map_err(|_| FeatureIoError::InvalidValue {
                    row,
                    column,
                    value: value.to_string(),
                })
            };

            let structure_index = parse_usize(0)?;
            let num_atoms = parse_usize(1)?;
            let features = (2..record.len())
                .map(|i| {
                    let (value, column) = field(i);
                    value.parse::<f64>().map_err(|_| FeatureIoError::InvalidValue {
                        row,
                        column,
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            records.push(FeatureRecord {
                structure_index,
                num_atoms,
                features,
            });
        }

        Self::new(String::new(), String::new(), records)
    }

    /// Writes the CSV (gzip-compressed for `.gz` paths) and its metadata sidecar.
    pub fn write_to_path(&self, path: &Path) -> Result<(), FeatureIoError> {
        if self.is_empty() {
            return Err(FeatureIoError::EmptyTable);
        }

        let file = BufWriter::new(File::create(path)?);
        if is_gzip(path) {
            let mut encoder = GzEncoder::new(file, Compression::new(GZIP_LEVEL));
            self.write_csv(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut file = file;
            self.write_csv(&mut file)?;
            file.flush()?;
        }

        let metadata = toml::to_string(&self.metadata())?;
        std::fs::write(Self::metadata_path(path), metadata)?;
        Ok(())
    }

    /// Reads a table written by [`FeatureTable::write_to_path`] and checks it
    /// against its metadata sidecar.
    pub fn read_from_path(path: &Path) -> Result<Self, FeatureIoError> {
        let metadata: FeatureMetadata =
            toml::from_str(&std::fs::read_to_string(Self::metadata_path(path))?)?;

        let file = BufReader::new(File::open(path)?);
        let mut table = if is_gzip(path) {
            Self::read_csv(GzDecoder::new(file))?
        } else {
            Self::read_csv(file)?
        };

        if table.len() != metadata.num_structures {
            return Err(FeatureIoError::MetadataMismatch(format!(
                "metadata lists {} structures, table has {}",
                metadata.num_structures,
                table.len()
            )));
        }
        if table.feature_dim() != metadata.feature_dim {
            return Err(FeatureIoError::MetadataMismatch(format!(
                "metadata lists feature dimension {}, table has {}",
                metadata.feature_dim,
                table.feature_dim()
            )));
        }

        table.description = metadata.description;
        table.featurizer = metadata.featurizer;
        Ok(table)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}
