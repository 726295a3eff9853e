use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local mirror of an identity-provider user. The id is the provider's
/// opaque string id, not something we mint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
