//! Dataset loading with a columnar on-disk cache.
//!
//! A logical dataset `name` lives in a directory as `name.csv` (the source)
//! and, once converted, `name.bin` (a bincode-encoded [`Table`]). Loaded
//! tables are kept in memory for the lifetime of the store and handed out as
//! shared, immutable [`Arc<Table>`] handles; callers that need to add columns
//! clone first.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::ReaderBuilder;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::table::{Column, Table};

const CSV_EXT: &str = "csv";
const CACHE_EXT: &str = "bin";

/// On-disk representation to read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Read the columnar cache, building it from the CSV source on first use.
    #[default]
    Columnar,
    /// Always parse the CSV source; never write a cache.
    Csv,
}

/// Explicit dataset cache: initialized on first access, immutable afterwards.
#[derive(Debug)]
pub struct DatasetStore {
    dir: PathBuf,
    format: Format,
    loaded: RwLock<HashMap<String, Arc<Table>>>,
}

impl DatasetStore {
    pub fn new(dir: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            dir: dir.into(),
            format,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Logical dataset names (CSV sources) in the directory, sorted.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == CSV_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load `name`, returning the shared handle if it was loaded before.
    pub fn load(&self, name: &str) -> Result<Arc<Table>> {
        if let Some(table) = self.loaded.read().get(name) {
            debug!(name, "dataset cache hit");
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(self.read(name)?);
        info!(
            name,
            rows = table.n_rows(),
            columns = table.n_columns(),
            "dataset loaded"
        );
        let mut loaded = self.loaded.write();
        // Another caller may have raced us here; keep whichever landed first.
        Ok(Arc::clone(
            loaded.entry(name.to_string()).or_insert(table),
        ))
    }

    fn read(&self, name: &str) -> Result<Table> {
        let csv_path = self.dir.join(format!("{name}.{CSV_EXT}"));
        let cache_path = self.dir.join(format!("{name}.{CACHE_EXT}"));

        match self.format {
            Format::Columnar if cache_path.exists() => match read_cache(&cache_path) {
                Ok(table) => Ok(table),
                Err(e) if csv_path.exists() => {
                    warn!(path = %cache_path.display(), error = %e, "unreadable columnar cache; rebuilding from csv");
                    build_cache(&csv_path, &cache_path)
                }
                Err(e) => Err(e),
            },
            Format::Columnar if csv_path.exists() => build_cache(&csv_path, &cache_path),
            Format::Csv if csv_path.exists() => read_delimited(&csv_path),
            _ => Err(Error::DatasetNotFound {
                name: name.to_string(),
                dir: self.dir.display().to_string(),
            }),
        }
    }
}

fn read_cache(path: &Path) -> Result<Table> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}

/// Parse the CSV source and try to persist it as the columnar cache.
///
/// A failed cache write only costs the next store a re-parse.
fn build_cache(csv_path: &Path, cache_path: &Path) -> Result<Table> {
    let table = read_delimited(csv_path)?;
    match write_cache(cache_path, &table) {
        Ok(()) => info!(path = %cache_path.display(), "columnar cache written"),
        Err(e) => warn!(path = %cache_path.display(), error = %e, "could not write columnar cache"),
    }
    Ok(table)
}

/// Write `table` next to `path` and rename it into place once fully flushed,
/// so a partial write never shadows the source.
fn write_cache(path: &Path, table: &Table) -> Result<()> {
    let tmp = path.with_extension(format!("{CACHE_EXT}.tmp"));
    let written = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        bincode::serialize_into(&mut writer, table)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

/// Parse a delimited file: comma first, semicolon if that gives one column.
pub fn read_delimited(path: &Path) -> Result<Table> {
    let comma = parse_delimited(path, b',');
    if matches!(&comma, Ok(t) if t.n_columns() > 1) {
        return comma;
    }

    match &comma {
        Err(e) => warn!(path = %path.display(), error = %e, "comma parse failed; retrying with ';'"),
        Ok(_) => debug!(path = %path.display(), "single column with ','; retrying with ';'"),
    }
    match parse_delimited(path, b';') {
        Ok(t) if t.n_columns() > 1 => Ok(t),
        semicolon => comma.or(semicolon),
    }
}

fn parse_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (col, field) in cells.iter_mut().zip(record.iter()) {
            col.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| (name, infer_column(raw)))
        .collect();
    Table::from_columns(columns)
}

fn parse_numeric(cell: &str) -> Option<f64> {
    match cell {
        "True" | "true" => Some(1.0),
        "False" | "false" => Some(0.0),
        _ => cell.parse().ok(),
    }
}

/// Numeric if every non-empty cell is a number or a boolean, text otherwise.
fn infer_column(raw: Vec<String>) -> Column {
    let numeric: Option<Vec<Option<f64>>> = raw
        .iter()
        .map(|cell| {
            let cell = cell.trim();
            if cell.is_empty() {
                Some(None)
            } else {
                parse_numeric(cell).map(Some)
            }
        })
        .collect();

    match numeric {
        Some(values) => Column::Numeric(values),
        None => Column::Text(
            raw.into_iter()
                .map(|cell| if cell.trim().is_empty() { None } else { Some(cell) })
                .collect(),
        ),
    }
}
