use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{
        record::{CONTENT_TYPE_COLUMN, HOURS_VIEWED_COLUMN, LANGUAGE_COLUMN},
        CategoricalEncoding, ContentRecord, Dataset, RawRecord,
    },
};

/// Validated row, before dedup and id assignment
struct CleanRow {
    title: Option<String>,
    language: String,
    content_type: String,
    hours_viewed: u64,
}

/// Turns raw tabular rows into a model-ready dataset.
///
/// Every row must carry a language, content type and parseable hours-viewed
/// value. Rows without a title are dropped, duplicate titles keep their first
/// occurrence, and content ids are assigned densely in the surviving order.
pub fn normalize(raw_records: Vec<RawRecord>) -> AppResult<Dataset> {
    let total_rows = raw_records.len();

    let mut rows = Vec::with_capacity(total_rows);
    for (index, raw) in raw_records.into_iter().enumerate() {
        let row_number = index + 1;
        // presence of every required field first, then value parsing
        let language = required(raw.language, LANGUAGE_COLUMN, row_number)?;
        let content_type = required(raw.content_type, CONTENT_TYPE_COLUMN, row_number)?;
        let hours_raw = required(raw.hours_viewed, HOURS_VIEWED_COLUMN, row_number)?;
        let hours_viewed = parse_hours_viewed(&hours_raw)
            .map_err(|e| AppError::Parse(format!("row {}: {}", row_number, e)))?;
        rows.push(CleanRow {
            title: raw.title.filter(|t| !t.trim().is_empty()),
            language,
            content_type,
            hours_viewed,
        });
    }

    let mut seen: HashSet<String> = HashSet::new();
    let kept: Vec<(String, CleanRow)> = rows
        .into_iter()
        .filter_map(|row| row.title.clone().map(|title| (title, row)))
        .filter(|(title, _)| seen.insert(title.clone()))
        .collect();

    let languages = CategoricalEncoding::from_labels(kept.iter().map(|(_, r)| r.language.as_str()));
    let content_types =
        CategoricalEncoding::from_labels(kept.iter().map(|(_, r)| r.content_type.as_str()));

    let mut records = Vec::with_capacity(kept.len());
    for (content_id, (title, row)) in kept.into_iter().enumerate() {
        let language_id = encode(&languages, &row.language)?;
        let type_id = encode(&content_types, &row.content_type)?;
        records.push(ContentRecord {
            content_id,
            title,
            language: row.language,
            content_type: row.content_type,
            hours_viewed: row.hours_viewed,
            language_id,
            type_id,
        });
    }

    tracing::debug!(
        total_rows,
        kept = records.len(),
        languages = languages.len(),
        content_types = content_types.len(),
        "Dataset normalized"
    );

    Ok(Dataset::new(records, languages, content_types))
}

/// Parses an hours-viewed cell such as "1,650,450,000"
pub fn parse_hours_viewed(raw: &str) -> Result<u64, String> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    digits
        .parse::<u64>()
        .map_err(|_| format!("invalid hours viewed value '{}'", raw))
}

fn required(value: Option<String>, column: &str, row_number: usize) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::DataFormat(format!(
            "row {}: missing required field '{}'",
            row_number, column
        ))),
    }
}

fn encode(encoding: &CategoricalEncoding, label: &str) -> AppResult<usize> {
    encoding
        .code(label)
        .ok_or_else(|| AppError::Internal(format!("label '{}' missing from encoding", label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_records;

    fn raw(title: Option<&str>, language: &str, hours: &str) -> RawRecord {
        RawRecord {
            title: title.map(str::to_string),
            language: Some(language.to_string()),
            content_type: Some("TV Show".to_string()),
            hours_viewed: Some(hours.to_string()),
        }
    }

    #[test]
    fn test_parse_hours_viewed_strips_separators() {
        assert_eq!(parse_hours_viewed("1,650,450,000"), Ok(1_650_450_000));
        assert_eq!(parse_hours_viewed("245,000,000"), Ok(245_000_000));
        assert_eq!(parse_hours_viewed("999"), Ok(999));
        assert_eq!(parse_hours_viewed(" 12,345 "), Ok(12_345));
    }

    #[test]
    fn test_parse_hours_viewed_rejects_residue() {
        assert!(parse_hours_viewed("12 hours").is_err());
        assert!(parse_hours_viewed("1.5").is_err());
        assert!(parse_hours_viewed("-100").is_err());
        assert!(parse_hours_viewed(",").is_err());
    }

    #[test]
    fn test_normalize_sample_catalog() {
        let dataset = normalize(sample_records()).unwrap();

        assert_eq!(dataset.len(), 20);
        assert_eq!(dataset.languages().labels(), &["English", "German", "Korean", "Spanish"]);
        assert_eq!(dataset.content_types().len(), 1);

        let squid = dataset.find_by_title("squid").unwrap();
        assert_eq!(squid.hours_viewed, 1_650_450_000);
        assert_eq!(dataset.languages().label(squid.language_id), Some("Korean"));
    }

    #[test]
    fn test_normalize_dedups_and_assigns_contiguous_ids() {
        let records = vec![
            raw(Some("Dark"), "German", "10"),
            raw(Some("Elite"), "Spanish", "20"),
            raw(Some("Dark"), "English", "30"),
            raw(None, "English", "40"),
            raw(Some("  "), "English", "50"),
            raw(Some("You"), "English", "60"),
        ];

        let dataset = normalize(records).unwrap();

        assert_eq!(dataset.titles(), vec!["Dark", "Elite", "You"]);
        let ids: Vec<usize> = dataset.records().iter().map(|r| r.content_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);

        // first occurrence wins
        let dark = dataset.get(0).unwrap();
        assert_eq!(dark.language, "German");
        assert_eq!(dark.hours_viewed, 10);
    }

    #[test]
    fn test_encodings_only_cover_retained_rows() {
        let records = vec![
            raw(Some("Dark"), "German", "10"),
            raw(None, "Korean", "20"),
            raw(Some("Dark"), "Hindi", "30"),
        ];

        let dataset = normalize(records).unwrap();
        assert_eq!(dataset.languages().labels(), &["German"]);
    }

    #[test]
    fn test_normalize_parse_error_names_row() {
        let records = vec![
            raw(Some("Dark"), "German", "10"),
            raw(Some("Elite"), "Spanish", "lots"),
        ];

        match normalize(records) {
            Err(AppError::Parse(msg)) => {
                assert!(msg.contains("row 2"));
                assert!(msg.contains("lots"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_missing_field_is_data_format_error() {
        let mut record = raw(Some("Dark"), "German", "10");
        record.content_type = None;

        match normalize(vec![record]) {
            Err(AppError::DataFormat(msg)) => assert!(msg.contains("Content Type")),
            other => panic!("expected data format error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_reported_before_bad_hours() {
        let mut record = raw(Some("Dark"), "German", "lots");
        record.language = None;

        match normalize(vec![record]) {
            Err(AppError::DataFormat(msg)) => assert!(msg.contains("Language Indicator")),
            other => panic!("expected data format error, got {:?}", other),
        }
    }

    #[test]
    fn test_hours_are_validated_before_titles_are_dropped() {
        let records = vec![raw(Some("Dark"), "German", "10"), raw(None, "German", "n/a")];
        assert!(matches!(normalize(records), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_normalize_empty_input() {
        let dataset = normalize(Vec::new()).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.languages().is_empty());
    }
}
