//! Professor review JSON documents.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Number, Value};

use super::RecordSource;
use crate::error::RecordError;
use crate::models::ReviewRecord;

/// Top-level key holding the review list.
pub const REVIEWS_KEY: &str = "professor_reviews";

/// Reads `{"professor_reviews": [...]}` documents from disk.
#[derive(Debug, Clone)]
pub struct JsonReviewSource {
    path: PathBuf,
}

impl JsonReviewSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonReviewSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_records(&self) -> Result<Vec<ReviewRecord>, RecordError> {
        load_reviews(&self.path)
    }
}

/// Load and validate every review in the file at `path`.
pub fn load_reviews(path: &Path) -> Result<Vec<ReviewRecord>, RecordError> {
    let content = std::fs::read_to_string(path).map_err(|e| RecordError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_reviews(&content)
}

/// Parse a review document. The first malformed record aborts parsing.
pub fn parse_reviews(input: &str) -> Result<Vec<ReviewRecord>, RecordError> {
    let document: ReviewDocument =
        serde_json::from_str(input).map_err(|e| RecordError::Malformed(e.to_string()))?;

    document
        .professor_reviews
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_record(index, &entry))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ReviewDocument {
    professor_reviews: Vec<Value>,
}

/// One entry as exported. Absent and `null` fields both deserialize to `None`.
#[derive(Debug, Deserialize)]
struct RawReview {
    #[serde(rename = "professor")]
    professor_id: Option<String>,
    // Older exports spell the key `departement`
    #[serde(alias = "departement")]
    department: Option<String>,
    rating: Option<Number>,
    review: Option<String>,
    timestamp: Option<String>,
}

fn parse_record(index: usize, entry: &Value) -> Result<ReviewRecord, RecordError> {
    if !entry.is_object() {
        return Err(RecordError::InvalidField {
            index,
            field: REVIEWS_KEY,
            reason: "entry is not an object".to_string(),
        });
    }

    let raw = match RawReview::deserialize(entry) {
        Ok(raw) => raw,
        Err(e) => {
            return Err(RecordError::InvalidField {
                index,
                field: mistyped_field(entry).unwrap_or(REVIEWS_KEY),
                reason: e.to_string(),
            });
        }
    };

    let professor_id = required(index, "professor", raw.professor_id)?;
    if professor_id.trim().is_empty() {
        return Err(RecordError::InvalidField {
            index,
            field: "professor",
            reason: "must not be empty".to_string(),
        });
    }

    Ok(ReviewRecord {
        professor_id,
        department: required(index, "department", raw.department)?,
        rating: required(index, "rating", raw.rating)?,
        review_text: required(index, "review", raw.review)?,
        timestamp: required(index, "timestamp", raw.timestamp)?,
    })
}

fn required<T>(index: usize, field: &'static str, value: Option<T>) -> Result<T, RecordError> {
    value.ok_or(RecordError::MissingField { index, field })
}

/// serde errors do not carry the field name, so find the first field whose JSON type is wrong.
fn mistyped_field(entry: &Value) -> Option<&'static str> {
    const STRING_FIELDS: [(&str, &str); 5] = [
        ("professor", "professor"),
        ("department", "department"),
        ("departement", "department"),
        ("review", "review"),
        ("timestamp", "timestamp"),
    ];

    let is_set = |key: &str| entry.get(key).is_some_and(|v| !v.is_null());

    STRING_FIELDS
        .iter()
        .find(|&&(key, _)| is_set(key) && !entry[key].is_string())
        .map(|&(_, field)| field)
        .or_else(|| (is_set("rating") && !entry["rating"].is_number()).then_some("rating"))
}
