use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

/// Inbound event as delivered by the event infrastructure.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

impl EventEnvelope {
    /// Decode the event data into the handler's payload type.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            AppError::Validation(format!("Malformed payload for {}: {}", self.name, e))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

/// `user.created` / `user.updated` data, in the identity provider's shape.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl UserPayload {
    /// Display name from the provider's first/last name fields.
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(first) = self.first_name.as_deref().filter(|s| !s.is_empty()) {
            parts.push(first);
        }
        if let Some(last) = self.last_name.as_deref().filter(|s| !s.is_empty()) {
            parts.push(last);
        }
        parts.join(" ")
    }

    /// First listed email, or a synthesized placeholder when the provider
    /// sent none.
    pub fn primary_email(&self) -> String {
        self.email_addresses
            .first()
            .map(|e| e.email_address.clone())
            .unwrap_or_else(|| format!("{}@unknown.invalid", self.id))
    }
}

/// `organization.created` / `organization.updated` data.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// `organization_member.created` data.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub organization: OrganizationRef,
    pub public_user_data: PublicUserData,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicUserData {
    pub user_id: String,
}

/// `*.deleted` events carry only the id of the removed record.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedPayload {
    pub id: String,
}
