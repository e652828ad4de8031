//! Verification results and metrics on disk.
//!
//! Results go to `<stem>.json` (pretty array) and `<stem>.csv`. The CSV leads
//! with the identifying columns and appends every other key seen in any
//! record, sorted.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use contactcheck_eval::{Evaluation, VerificationRecord};
use serde_json::{Map, Value};

use crate::CliError;

pub const LEADING_COLUMNS: [&str; 5] = ["Type", "Input", "GroundTruth", "Status", "IsValid"];

/// Paths written by [`write_results`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFiles {
    pub json: PathBuf,
    pub csv: PathBuf,
}

pub fn write_results(stem: &Path, results: &[VerificationRecord]) -> Result<Option<ResultFiles>, CliError> {
    if results.is_empty() {
        tracing::warn!("no verification results, nothing written");
        return Ok(None);
    }
    if let Some(dir) = stem.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;
    }

    let files = ResultFiles {
        json: stem.with_extension("json"),
        csv: stem.with_extension("csv"),
    };

    let json = serde_json::to_string_pretty(results)
        .map_err(|e| CliError::io(format!("JSON error: {e}")))?;
    fs::write(&files.json, json)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", files.json.display())))?;
    tracing::info!("[File] Results saved to {}", files.json.display());

    let file = fs::File::create(&files.csv)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", files.csv.display())))?;
    write_results_csv(results, std::io::BufWriter::new(file))?;
    tracing::info!("[File] Results saved to {}", files.csv.display());

    Ok(Some(files))
}

/// Header: leading columns, then the remaining keys across all records, sorted.
pub fn csv_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let extra: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .filter(|key| !LEADING_COLUMNS.contains(key))
        .collect();

    LEADING_COLUMNS
        .iter()
        .copied()
        .chain(extra)
        .map(str::to_string)
        .collect()
}

pub fn write_results_csv<W: Write>(results: &[VerificationRecord], writer: W) -> Result<(), CliError> {
    let rows = results
        .iter()
        .map(|record| match serde_json::to_value(record) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(CliError::io(format!("unexpected record shape: {other}"))),
            Err(e) => Err(CliError::io(format!("JSON error: {e}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let columns = csv_columns(&rows);

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&columns)
        .map_err(|e| CliError::io(format!("CSV write error: {e}")))?;
    for row in &rows {
        let cells = columns.iter().map(|col| cell(row.get(col)));
        wtr.write_record(cells)
            .map_err(|e| CliError::io(format!("CSV write error: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| CliError::io(format!("CSV write error: {e}")))?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Read a results file written by [`write_results`].
pub fn load_results(path: &Path) -> Result<Vec<VerificationRecord>, CliError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        CliError::io(format!("cannot read {}: {e}", path.display()))
            .with_hint("run `contactcheck run` first to produce verification results")
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::parse(format!("{}: {e}", path.display())))
}

pub fn write_metrics_json(path: &Path, evaluation: &Evaluation) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(evaluation)
        .map_err(|e| CliError::io(format!("JSON error: {e}")))?;
    fs::write(path, json)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    tracing::info!("[File] Metrics saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use contactcheck_eval::{GroundTruth, RecordKind};

    fn results() -> Vec<VerificationRecord> {
        let mut email = VerificationRecord::new(RecordKind::Email, "a@x.com")
            .with_status("Valid")
            .with_validity("Yes")
            .with_field("Domain", "x.com")
            .with_field("IsDisposable", false);
        email.ground_truth = Some(GroundTruth::Real);

        let mut phone = VerificationRecord::new(RecordKind::Phone, "+447700900001")
            .with_validity("No")
            .with_field("NetworkName", Value::Null)
            .with_field("CountryPrefix", 44);
        phone.ground_truth = Some(GroundTruth::Fake);

        vec![email, phone]
    }

    #[test]
    fn csv_header_and_rows() {
        let mut buf = Vec::new();
        write_results_csv(&results(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Type,Input,GroundTruth,Status,IsValid,CountryPrefix,Domain,IsDisposable,NetworkName"
        );
        assert_eq!(lines[1], "Email,a@x.com,Real,Valid,Yes,,x.com,false,");
        assert_eq!(lines[2], "Phone,+447700900001,Fake,,No,44,,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_results_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("verification_results");
        assert!(write_results(&stem, &[]).unwrap().is_none());
        assert!(!stem.with_extension("json").exists());
        assert!(!stem.with_extension("csv").exists());
    }

    #[test]
    fn json_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("data").join("verification_results");
        let files = write_results(&stem, &results()).unwrap().unwrap();
        assert!(files.csv.exists());

        let loaded = load_results(&files.json).unwrap();
        assert_eq!(loaded, results());
    }

    #[test]
    fn load_missing_is_io_error_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_results(&dir.path().join("none.json")).unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_IO);
        assert!(err.hint.is_some());
    }

    #[test]
    fn load_malformed_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"Type\": \"Email\"}").unwrap();
        let err = load_results(&path).unwrap_err();
        assert_eq!(err.code, exit_codes::EXIT_PARSE);
    }
}
