//! Dataset loading
//!
//! Parses tabular case data (a header row followed by comma-separated rows)
//! into fixed-shape [`Record`]s. Rows with a missing or malformed required
//! field are skipped and reported, never coerced.

use crate::record::{CaseId, Features, Record};
use crate::units;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Columns every dataset must provide, in any order
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "case", "gestation", "parity", "age", "height", "weight", "smoke", "bwt",
];

pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// Why a row was left out of the dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingField { column: String },
    Unparseable { column: String, value: String },
    InvalidSmoke { value: String },
    FieldCount { expected: usize, actual: usize },
    DuplicateCase { id: CaseId },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField { column } => write!(f, "missing value for '{}'", column),
            SkipReason::Unparseable { column, value } => {
                write!(f, "'{}' is not a valid number for '{}'", value, column)
            }
            SkipReason::InvalidSmoke { value } => write!(f, "smoke must be 0 or 1, got '{}'", value),
            SkipReason::FieldCount { expected, actual } => {
                write!(f, "expected {} fields, got {}", expected, actual)
            }
            SkipReason::DuplicateCase { id } => write!(f, "duplicate case id {}", id),
        }
    }
}

/// A row excluded at load time, with its 1-based line number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: SkipReason,
}

/// The fully loaded, immutable case collection
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    skipped: Vec<SkippedRow>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            skipped: Vec::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: CaseId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Header positions of the required columns
struct ColumnIndex {
    positions: [usize; REQUIRED_COLUMNS.len()],
    width: usize,
}

impl ColumnIndex {
    fn from_header(header: &str) -> Result<Self> {
        let names: Vec<String> = split_fields(header.trim_start_matches('\u{feff}'))
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();

        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = names
                .iter()
                .position(|name| name == column)
                .ok_or_else(|| Error::MissingColumn(column.to_string()))?;
        }

        Ok(Self {
            positions,
            width: names.len(),
        })
    }

    /// `column` must be one of [`REQUIRED_COLUMNS`]; rows are width-checked
    /// against the header before any lookup.
    fn field<'a>(&self, fields: &[&'a str], column: &str) -> &'a str {
        REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|slot| fields.get(self.positions[slot]))
            .copied()
            .unwrap_or("")
    }
}

/// Split one CSV line on commas outside double quotes.
///
/// Quoted fields keep embedded commas. Doubled quotes (`""`) inside a field
/// are left as written; no column this loader reads needs them.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);

    fields
        .into_iter()
        .map(|field| field.trim().trim_matches('"').trim())
        .collect()
}

/// Loads datasets from CSV sources
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    max_rows: usize,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl DatasetLoader {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        info!("Loading dataset from {:?}", path);
        let file = File::open(path)?;
        self.load_reader(BufReader::new(file))
    }

    pub fn load_str(&self, data: &str) -> Result<Dataset> {
        self.load_reader(data.as_bytes())
    }

    pub fn load_reader<R: BufRead>(&self, reader: R) -> Result<Dataset> {
        let mut columns: Option<ColumnIndex> = None;
        let mut seen = HashSet::new();
        let mut dataset = Dataset::default();
        let mut rows = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            if columns.is_none() {
                columns = Some(ColumnIndex::from_header(&line)?);
                continue;
            }
            let Some(cols) = columns.as_ref() else { continue };

            rows += 1;
            if rows > self.max_rows {
                return Err(Error::DatasetTooLarge { limit: self.max_rows });
            }

            let outcome = parse_row(&line, cols).and_then(|record| {
                if seen.insert(record.id) {
                    Ok(record)
                } else {
                    Err(SkipReason::DuplicateCase { id: record.id })
                }
            });

            match outcome {
                Ok(record) => dataset.records.push(record),
                Err(reason) => {
                    debug!(line = line_no, %reason, "Skipping dataset row");
                    dataset.skipped.push(SkippedRow { line: line_no, reason });
                }
            }
        }

        if columns.is_none() {
            return Err(Error::MissingColumn(REQUIRED_COLUMNS[0].to_string()));
        }

        info!(
            records = dataset.records.len(),
            skipped = dataset.skipped.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }
}

fn parse_row(line: &str, cols: &ColumnIndex) -> std::result::Result<Record, SkipReason> {
    let fields = split_fields(line);
    if fields.len() != cols.width {
        return Err(SkipReason::FieldCount {
            expected: cols.width,
            actual: fields.len(),
        });
    }

    // Blank fields are reported before malformed ones.
    for column in REQUIRED_COLUMNS {
        let raw = cols.field(&fields, column);
        if raw.is_empty() || raw.eq_ignore_ascii_case("na") {
            return Err(SkipReason::MissingField {
                column: column.to_string(),
            });
        }
    }

    let number = |column: &str| -> std::result::Result<f64, SkipReason> {
        let raw = cols.field(&fields, column);
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(SkipReason::Unparseable {
                column: column.to_string(),
                value: raw.to_string(),
            }),
        }
    };

    let raw_id = cols.field(&fields, "case");
    let id = raw_id.parse::<u64>().map_err(|_| SkipReason::Unparseable {
        column: "case".to_string(),
        value: raw_id.to_string(),
    })?;

    let smoke = number("smoke")?;
    if smoke != 0.0 && smoke != 1.0 {
        return Err(SkipReason::InvalidSmoke {
            value: cols.field(&fields, "smoke").to_string(),
        });
    }

    let features = Features {
        gestation: number("gestation")?,
        parity: number("parity")?,
        age: number("age")?,
        height: number("height")?,
        weight: number("weight")?,
        smoke,
    };
    let birth_weight = units::oz_to_g(number("bwt")?).round();

    Ok(Record::new(id, features, birth_weight))
}
