//! Record sources.
//!
//! A source supplies the finite batch of review records for one ingestion run.

mod reviews;

pub use reviews::{JsonReviewSource, REVIEWS_KEY, load_reviews, parse_reviews};

use crate::error::RecordError;
use crate::models::ReviewRecord;

/// Supplies review records, read once per run.
pub trait RecordSource: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> String;

    /// Read and validate every record, in source order.
    fn read_records(&self) -> Result<Vec<ReviewRecord>, RecordError>;
}
