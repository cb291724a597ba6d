use serde::{Deserialize, Serialize};

/// Column headers every uploaded table must carry
pub const TITLE_COLUMN: &str = "Title";
pub const LANGUAGE_COLUMN: &str = "Language Indicator";
pub const CONTENT_TYPE_COLUMN: &str = "Content Type";
pub const HOURS_VIEWED_COLUMN: &str = "Hours Viewed";

pub const REQUIRED_COLUMNS: [&str; 4] = [
    TITLE_COLUMN,
    LANGUAGE_COLUMN,
    CONTENT_TYPE_COLUMN,
    HOURS_VIEWED_COLUMN,
];

/// One row of catalog data as it arrives, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRecord {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Language Indicator", default)]
    pub language: Option<String>,
    #[serde(rename = "Content Type", default)]
    pub content_type: Option<String>,
    /// Hours viewed, possibly with thousands separators (e.g. "1,650,450,000")
    #[serde(rename = "Hours Viewed", default)]
    pub hours_viewed: Option<String>,
}

impl RawRecord {
    /// Builds a fully populated raw record
    pub fn new(title: &str, language: &str, content_type: &str, hours_viewed: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            language: Some(language.to_string()),
            content_type: Some(content_type.to_string()),
            hours_viewed: Some(hours_viewed.to_string()),
        }
    }
}

/// Model input triple for one content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Features {
    pub content_id: usize,
    pub language_id: usize,
    pub type_id: usize,
}

/// A validated catalog entry with its encoded identifiers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentRecord {
    /// Dense 0-based id within the dataset it belongs to
    pub content_id: usize,
    pub title: String,
    pub language: String,
    pub content_type: String,
    pub hours_viewed: u64,
    pub language_id: usize,
    pub type_id: usize,
}

impl ContentRecord {
    pub fn features(&self) -> Features {
        Features {
            content_id: self.content_id,
            language_id: self.language_id,
            type_id: self.type_id,
        }
    }
}

/// A single recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationItem {
    pub title: String,
    pub language: String,
    pub content_type: String,
    pub hours_viewed: u64,
}

impl From<&ContentRecord> for RecommendationItem {
    fn from(record: &ContentRecord) -> Self {
        Self {
            title: record.title.clone(),
            language: record.language.clone(),
            content_type: record.content_type.clone(),
            hours_viewed: record.hours_viewed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_uses_column_headers() {
        let json = r#"{"Title":"Dark","Language Indicator":"German","Content Type":"TV Show","Hours Viewed":"188,170,000"}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, RawRecord::new("Dark", "German", "TV Show", "188,170,000"));
    }

    #[test]
    fn test_raw_record_missing_fields_default_to_none() {
        let record: RawRecord = serde_json::from_str(r#"{"Title":"Dark"}"#).unwrap();
        assert_eq!(record.title.as_deref(), Some("Dark"));
        assert!(record.language.is_none());
        assert!(record.hours_viewed.is_none());
    }

    #[test]
    fn test_recommendation_item_from_record() {
        let record = ContentRecord {
            content_id: 3,
            title: "Bridgerton".to_string(),
            language: "English".to_string(),
            content_type: "TV Show".to_string(),
            hours_viewed: 625_490_000,
            language_id: 0,
            type_id: 0,
        };

        let item = RecommendationItem::from(&record);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["title"], "Bridgerton");
        assert_eq!(json["content_type"], "TV Show");
        assert_eq!(json["hours_viewed"], 625_490_000u64);
        assert!(json.get("content_id").is_none());
    }
}
