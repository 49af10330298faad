use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an uploaded file: `pending` → `processing` → `completed` | `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub source_filename: String,
    pub storage_key: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub parsed_confidence: Option<f64>,
    pub parsed_model: Option<String>,
    pub processing_status: String,
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Fields known at upload time, before any processing.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub id: Uuid,
    pub source_filename: String,
    pub storage_key: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_match_serde() {
        for status in [
            ProcessingStatus::Pending,
            ProcessingStatus::Processing,
            ProcessingStatus::Completed,
            ProcessingStatus::Failed,
        ] {
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.as_str().to_string())
            );
        }
    }
}
