//! Mirrors identity-provider lifecycle events into the local database.
//!
//! One handler per event name, one data-store operation per handler. There is
//! no idempotency guard: re-delivery of a `created` event for an existing id
//! fails on the unique key, and the delivering infrastructure owns retries.

mod payload;

pub use payload::EventEnvelope;

use payload::{DeletedPayload, MembershipPayload, OrganizationPayload, UserPayload};

use chrono::Utc;
use sqlx::PgPool;
use taskboard_shared::WorkspaceRole;
use uuid::Uuid;

use crate::error::AppError;

/// Canonical set of handled event names.
pub const HANDLED_EVENTS: [&str; 7] = [
    "clerk/user.created",
    "clerk/user.updated",
    "clerk/user.deleted",
    "clerk/organization.created",
    "clerk/organization.updated",
    "clerk/organization.deleted",
    "clerk/organization_member.created",
];

/// Route an inbound event to its handler. Returns `Ok(false)` for event
/// names outside the handled set; handler errors are logged and re-raised.
pub async fn dispatch(db: &PgPool, envelope: &EventEnvelope) -> Result<bool, AppError> {
    if !HANDLED_EVENTS.contains(&envelope.name.as_str()) {
        return Ok(false);
    }

    let result = run_handler(db, envelope).await;

    if let Err(err) = &result {
        tracing::error!(event = %envelope.name, error = %err, "Event handler failed");
    }

    result.map(|()| true)
}

async fn run_handler(db: &PgPool, envelope: &EventEnvelope) -> Result<(), AppError> {
    match envelope.name.as_str() {
        "clerk/user.created" => user_created(db, envelope.payload()?).await,
        "clerk/user.updated" => user_updated(db, envelope.payload()?).await,
        "clerk/user.deleted" => user_deleted(db, envelope.payload()?).await,
        "clerk/organization.created" => organization_created(db, envelope.payload()?).await,
        "clerk/organization.updated" => organization_updated(db, envelope.payload()?).await,
        "clerk/organization.deleted" => organization_deleted(db, envelope.payload()?).await,
        "clerk/organization_member.created" => membership_created(db, envelope.payload()?).await,
        other => Err(AppError::Validation(format!("No handler for event: {}", other))),
    }
}

/// Uppercase the provider's role string before parsing it.
fn normalize_role(raw: &str) -> Result<WorkspaceRole, AppError> {
    raw.to_uppercase()
        .parse()
        .map_err(|_| AppError::Validation(format!("Unsupported member role: {}", raw)))
}

/// URL-friendly slug, for organizations delivered without one.
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

async fn user_created(db: &PgPool, data: UserPayload) -> Result<(), AppError> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, image_url, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&data.id)
    .bind(data.primary_email())
    .bind(data.display_name())
    .bind(&data.image_url)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

async fn user_updated(db: &PgPool, data: UserPayload) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET email = $2, name = $3, image_url = $4, updated_at = $5
        WHERE id = $1
        "#,
    )
    .bind(&data.id)
    .bind(data.primary_email())
    .bind(data.display_name())
    .bind(&data.image_url)
    .bind(Utc::now())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found"));
    }

    Ok(())
}

async fn user_deleted(db: &PgPool, data: DeletedPayload) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(&data.id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found"));
    }

    Ok(())
}

async fn organization_created(db: &PgPool, data: OrganizationPayload) -> Result<(), AppError> {
    let creator = data.created_by.clone().ok_or_else(|| {
        AppError::Validation("organization.created event without created_by".to_string())
    })?;
    let slug = data.slug.clone().unwrap_or_else(|| slugify(&data.name));
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO workspaces (id, name, slug, image_url, owner_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&data.id)
    .bind(&data.name)
    .bind(&slug)
    .bind(&data.image_url)
    .bind(&creator)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    // The creator joins as admin
    sqlx::query(
        r#"
        INSERT INTO workspace_members (id, workspace_id, user_id, role, message, created_at)
        VALUES ($1, $2, $3, $4, NULL, $5)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&data.id)
    .bind(&creator)
    .bind(WorkspaceRole::Admin)
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

async fn organization_updated(db: &PgPool, data: OrganizationPayload) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE workspaces
        SET name = $2,
            slug = COALESCE($3, slug),
            image_url = COALESCE($4, image_url),
            updated_at = $5
        WHERE id = $1
        "#,
    )
    .bind(&data.id)
    .bind(&data.name)
    .bind(&data.slug)
    .bind(&data.image_url)
    .bind(Utc::now())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Workspace not found"));
    }

    Ok(())
}

async fn organization_deleted(db: &PgPool, data: DeletedPayload) -> Result<(), AppError> {
    // Members, projects, tasks and comments go with it via FK cascade
    let result = sqlx::query("DELETE FROM workspaces WHERE id = $1")
        .bind(&data.id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Workspace not found"));
    }

    Ok(())
}

async fn membership_created(db: &PgPool, data: MembershipPayload) -> Result<(), AppError> {
    let role = normalize_role(&data.role)?;
    let id = data
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    sqlx::query(
        r#"
        INSERT INTO workspace_members (id, workspace_id, user_id, role, message, created_at)
        VALUES ($1, $2, $3, $4, NULL, $5)
        "#,
    )
    .bind(&id)
    .bind(&data.organization.id)
    .bind(&data.public_user_data.user_id)
    .bind(role)
    .bind(Utc::now())
    .execute(db)
    .await?;

    Ok(())
}
