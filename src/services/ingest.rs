use crate::{
    error::{AppError, AppResult},
    models::{RawRecord, REQUIRED_COLUMNS},
};

/// Decodes an uploaded CSV document into raw records.
///
/// The header row must name every required column; extra columns are
/// ignored and empty cells decode as missing values.
pub fn parse_csv(bytes: &[u8]) -> AppResult<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::DataFormat(format!("unreadable CSV header: {}", e)))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::DataFormat(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let records = reader
        .deserialize::<RawRecord>()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(|e| AppError::DataFormat(format!("row {}: {}", index + 1, e)))
        })
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(rows = records.len(), "CSV decoded");
    Ok(records)
}
