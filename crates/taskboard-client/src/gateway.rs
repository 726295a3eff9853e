use reqwest::{Client, StatusCode};
use serde_json::Value;
use taskboard_shared::{
    api::{AddMemberRequest, AddMemberResponse},
    Workspace,
};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No authentication token provided")]
    MissingCredential,
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
    #[error("{0}")]
    Http(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub struct WorkspaceGateway {
    client: Client,
    base_url: String,
}

impl WorkspaceGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Fetch every workspace the token's user belongs to. One attempt, no
    /// retries; a blank token fails before any network traffic.
    pub async fn fetch_workspaces(&self, token: &str) -> Result<Vec<Workspace>, GatewayError> {
        if token.trim().is_empty() {
            tracing::warn!("Aborting workspace fetch: no token provided");
            return Err(GatewayError::MissingCredential);
        }

        let response = self
            .client
            .get(self.url("/workspaces"))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http(extract_error_message(status, &body)));
        }

        let value: Value = response.json().await?;
        parse_workspaces(value)
    }

    /// Invite a user into a workspace by email.
    pub async fn add_member(
        &self,
        token: &str,
        req: &AddMemberRequest,
    ) -> Result<AddMemberResponse, GatewayError> {
        if token.trim().is_empty() {
            return Err(GatewayError::MissingCredential);
        }

        let response = self
            .client
            .post(self.url("/workspaces/add-member"))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http(extract_error_message(status, &body)));
        }

        response.json().await.map_err(GatewayError::Network)
    }
}

/// Accept both the enveloped (`{ "workspaces": [...] }`) and the bare list
/// form of the workspaces endpoint.
fn parse_workspaces(value: Value) -> Result<Vec<Workspace>, GatewayError> {
    let payload = match value {
        Value::Object(mut map) => match map.remove("workspaces") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    };

    let Value::Array(items) = payload else {
        return Err(GatewayError::UnexpectedShape(format!(
            "expected an array, got {}",
            json_type_name(&payload)
        )));
    };

    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Workspace>, _>>()
        .map_err(|e| GatewayError::UnexpectedShape(e.to_string()))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Prefer the server's own error body over the bare status line.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }

    format!("Request failed with status {}", status)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn workspace_json(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Acme",
            "slug": "acme",
            "owner_id": "user_1",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_parse_accepts_enveloped_payload() {
        let value = json!({ "workspaces": [workspace_json("org_1"), workspace_json("org_2")] });
        let workspaces = parse_workspaces(value).unwrap();
        assert_eq!(workspaces.len(), 2);
        assert_eq!(workspaces[0].id, "org_1");
    }

    #[test]
    fn test_parse_accepts_bare_array() {
        let value = json!([workspace_json("org_1")]);
        let workspaces = parse_workspaces(value).unwrap();
        assert_eq!(workspaces.len(), 1);
    }

    #[test]
    fn test_parse_defaults_missing_projects_to_empty() {
        let value = json!({ "workspaces": [workspace_json("org_1")] });
        let workspaces = parse_workspaces(value).unwrap();
        assert!(workspaces[0].projects.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_array_payload() {
        let err = parse_workspaces(json!({ "workspaces": { "id": "org_1" } })).unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedShape(_)));

        let err = parse_workspaces(json!("nope")).unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedShape(_)));
    }

    #[test]
    fn test_error_message_prefers_server_body() {
        let msg = extract_error_message(
            StatusCode::FORBIDDEN,
            r#"{"error": "Only admins can add members"}"#,
        );
        assert_eq!(msg, "Only admins can add members");

        let msg = extract_error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(msg, "Request failed with status 502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_blank_token_fails_without_network_call() {
        // The base URL is unroutable; a blank token must fail before any
        // connection is attempted.
        let gateway = WorkspaceGateway::new("http://127.0.0.1:1");
        let err = gateway.fetch_workspaces("   ").await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredential));
    }
}
