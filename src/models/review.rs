use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A single professor review as read from the record source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub professor_id: String,
    pub department: String,
    /// Kept exactly as written in the source, so `4` stays an integer.
    pub rating: Number,
    pub review_text: String,
    pub timestamp: String,
}
