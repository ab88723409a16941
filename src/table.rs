//! CSV persistence for the results and environment tables.
//!
//! Writers go through a temp file in the destination directory and rename it
//! into place, so a reader never observes a half-written table.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};

use crate::schema::{EnvironmentInfo, TrialRecord};
use crate::{BenchError, Result};

pub const DEFAULT_RESULTS_PATH: &str = "benchmark_results.csv";
pub const DEFAULT_ENV_PATH: &str = "env_info.csv";

/// Temp file created next to `dest` so the final rename stays on one filesystem.
pub(crate) fn temp_beside(dest: &Path) -> io::Result<NamedTempFile> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir)
}

/// Keep the underlying `io::Error` for I/O failures; anything else is bad data.
fn csv_write_error(e: csv::Error) -> io::Error {
    let msg = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(err) => err,
        _ => io::Error::new(io::ErrorKind::InvalidData, msg),
    }
}

fn write_rows<T: Serialize>(dest: &Path, rows: &[T]) -> Result<NamedTempFile> {
    let mut tmp = temp_beside(dest)?;
    {
        let mut writer = csv::Writer::from_writer(BufWriter::new(tmp.as_file_mut()));
        for row in rows {
            writer.serialize(row).map_err(csv_write_error)?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().sync_all()?;
    Ok(tmp)
}

/// Staged but not yet visible tables. Dropping without `commit` discards them.
pub struct PendingTables {
    results: (NamedTempFile, PathBuf),
    env: (NamedTempFile, PathBuf),
}

impl PendingTables {
    /// Move both tables into place, or neither.
    ///
    /// An existing results table is parked in a temp path first; if the env
    /// table cannot be placed, the parked table is put back (or the new one
    /// removed when there was none).
    pub fn commit(self) -> Result<()> {
        let (results_tmp, results_dest) = self.results;
        let (env_tmp, env_dest) = self.env;

        let backup = park_existing(&results_dest)?;

        if let Err(e) = results_tmp.persist(&results_dest) {
            restore(backup, &results_dest);
            return Err(e.error.into());
        }
        debug!(path = %results_dest.display(), "table written");

        if let Err(e) = env_tmp.persist(&env_dest) {
            match backup {
                Some(_) => restore(backup, &results_dest),
                None => {
                    if let Err(rm) = fs::remove_file(&results_dest) {
                        warn!(path = %results_dest.display(), error = %rm, "could not remove new results table");
                    }
                }
            }
            return Err(e.error.into());
        }
        debug!(path = %env_dest.display(), "table written");
        Ok(())
    }
}

/// Rename an existing file at `dest` to a temp path beside it. The temp path
/// deletes itself on drop, which discards the old table after a commit.
fn park_existing(dest: &Path) -> io::Result<Option<TempPath>> {
    if !dest.exists() {
        return Ok(None);
    }
    let backup = temp_beside(dest)?.into_temp_path();
    fs::rename(dest, &backup)?;
    Ok(Some(backup))
}

fn restore(backup: Option<TempPath>, dest: &Path) {
    if let Some(backup) = backup {
        if let Err(e) = backup.persist(dest) {
            warn!(path = %dest.display(), error = %e.error, "could not restore previous results table");
        }
    }
}

/// Fully write both tables to temp files. Nothing at the destinations changes yet.
pub fn stage_tables(
    records: &[TrialRecord],
    results_path: &Path,
    env: &EnvironmentInfo,
    env_path: &Path,
) -> Result<PendingTables> {
    let results = write_rows(results_path, records)?;
    let env_tmp = write_rows(env_path, std::slice::from_ref(env))?;
    Ok(PendingTables {
        results: (results, results_path.to_path_buf()),
        env: (env_tmp, env_path.to_path_buf()),
    })
}

pub fn write_tables(
    records: &[TrialRecord],
    results_path: &Path,
    env: &EnvironmentInfo,
    env_path: &Path,
) -> Result<()> {
    stage_tables(records, results_path, env, env_path)?.commit()
}

/// Write bytes to `dest` through a temp file + rename.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = temp_beside(dest)?;
    tmp.write_all(bytes)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Load the results table.
///
/// A missing or unreadable file is an I/O error; an empty table, an
/// unparsable row, or a negative/non-finite time is a data-integrity error.
pub fn read_results(path: &Path) -> Result<Vec<TrialRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<TrialRecord>().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let record = row.map_err(|e| {
            let msg = e.to_string();
            match e.into_kind() {
                csv::ErrorKind::Io(err) => BenchError::Io(err),
                _ => BenchError::DataIntegrity(format!(
                    "{}: malformed row at line {line}: {msg}",
                    path.display()
                )),
            }
        })?;
        if !record.elapsed_time.is_finite() || record.elapsed_time < 0.0 {
            return Err(BenchError::DataIntegrity(format!(
                "{}: elapsed_time at line {line} must be a non-negative number, got {}",
                path.display(),
                record.elapsed_time
            )));
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(BenchError::DataIntegrity(format!(
            "{}: results table is empty",
            path.display()
        )));
    }
    Ok(records)
}

/// Load the single-row environment table.
pub fn read_environment(path: &Path) -> Result<EnvironmentInfo> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));
    let mut rows = reader.deserialize::<EnvironmentInfo>();

    let env = match rows.next() {
        Some(Ok(env)) => env,
        Some(Err(e)) => {
            return Err(BenchError::DataIntegrity(format!(
                "{}: malformed environment row: {e}",
                path.display()
            )))
        }
        None => {
            return Err(BenchError::DataIntegrity(format!(
                "{}: environment table is empty",
                path.display()
            )))
        }
    };
    if rows.next().is_some() {
        return Err(BenchError::DataIntegrity(format!(
            "{}: environment table must have exactly one row",
            path.display()
        )));
    }
    Ok(env)
}
