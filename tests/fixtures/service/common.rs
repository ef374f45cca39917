use serde::{Deserialize, Serialize};

/// Fields shared by every stored document
#[derive(Debug, Serialize, Deserialize)]
pub struct CommonType {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}
