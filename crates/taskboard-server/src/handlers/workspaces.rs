use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use taskboard_shared::{
    api::{AddMemberRequest, AddMemberResponse, WorkspacesResponse},
    Comment, Project, ProjectMember, Task, Workspace, WorkspaceMember, WorkspaceRole,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::AppState;

type WorkspaceRow = (
    String,                        // id
    String,                        // name
    String,                        // slug
    Option<String>,                // image_url
    String,                        // owner_id
    chrono::DateTime<Utc>,         // created_at
    chrono::DateTime<Utc>,         // updated_at
);

type MemberRow = (
    String,                        // id
    String,                        // workspace_id
    String,                        // user_id
    WorkspaceRole,                 // role
    Option<String>,                // message
    chrono::DateTime<Utc>,         // created_at
);

type ProjectRow = (
    String,                        // id
    String,                        // workspace_id
    String,                        // name
    Option<String>,                // description
    Option<String>,                // team_lead_id
    chrono::DateTime<Utc>,         // created_at
    chrono::DateTime<Utc>,         // updated_at
);

type ProjectMemberRow = (
    String,                        // id
    String,                        // project_id
    String,                        // user_id
    WorkspaceRole,                 // role
    chrono::DateTime<Utc>,         // created_at
);

type TaskRow = (
    String,                        // id
    String,                        // project_id
    String,                        // title
    Option<String>,                // description
    Option<String>,                // assignee_id
    Option<chrono::NaiveDate>,     // due_date
    chrono::DateTime<Utc>,         // created_at
    chrono::DateTime<Utc>,         // updated_at
);

type CommentRow = (
    String,                        // id
    String,                        // task_id
    String,                        // user_id
    String,                        // content
    chrono::DateTime<Utc>,         // created_at
    chrono::DateTime<Utc>,         // updated_at
);

/// GET /api/workspaces
///
/// Every workspace the caller belongs to, denormalized down to task comments,
/// in workspace creation order.
pub async fn list_workspaces(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WorkspacesResponse>, AppError> {
    let workspace_rows: Vec<WorkspaceRow> = sqlx::query_as(
        r#"
        SELECT w.id, w.name, w.slug, w.image_url, w.owner_id, w.created_at, w.updated_at
        FROM workspaces w
        JOIN workspace_members wm ON wm.workspace_id = w.id
        WHERE wm.user_id = $1
        ORDER BY w.created_at
        "#,
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    let workspace_ids: Vec<String> = workspace_rows.iter().map(|r| r.0.clone()).collect();

    let member_rows: Vec<MemberRow> = sqlx::query_as(
        r#"
        SELECT id, workspace_id, user_id, role, message, created_at
        FROM workspace_members
        WHERE workspace_id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(&workspace_ids)
    .fetch_all(&state.db)
    .await?;

    let project_rows: Vec<ProjectRow> = sqlx::query_as(
        r#"
        SELECT id, workspace_id, name, description, team_lead_id, created_at, updated_at
        FROM projects
        WHERE workspace_id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(&workspace_ids)
    .fetch_all(&state.db)
    .await?;

    let project_ids: Vec<String> = project_rows.iter().map(|r| r.0.clone()).collect();

    let project_member_rows: Vec<ProjectMemberRow> = sqlx::query_as(
        r#"
        SELECT id, project_id, user_id, role, created_at
        FROM project_members
        WHERE project_id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(&project_ids)
    .fetch_all(&state.db)
    .await?;

    let task_rows: Vec<TaskRow> = sqlx::query_as(
        r#"
        SELECT id, project_id, title, description, assignee_id, due_date, created_at, updated_at
        FROM tasks
        WHERE project_id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(&project_ids)
    .fetch_all(&state.db)
    .await?;

    let task_ids: Vec<String> = task_rows.iter().map(|r| r.0.clone()).collect();

    let comment_rows: Vec<CommentRow> = sqlx::query_as(
        r#"
        SELECT id, task_id, user_id, content, created_at, updated_at
        FROM comments
        WHERE task_id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(&task_ids)
    .fetch_all(&state.db)
    .await?;

    // Assemble bottom-up: comments into tasks, tasks into projects, projects
    // and members into workspaces.
    let mut comments_by_task: HashMap<String, Vec<Comment>> = HashMap::new();
    for (id, task_id, user_id, content, created_at, updated_at) in comment_rows {
        comments_by_task
            .entry(task_id.clone())
            .or_default()
            .push(Comment {
                id,
                task_id,
                user_id,
                content,
                created_at,
                updated_at,
            });
    }

    let mut tasks_by_project: HashMap<String, Vec<Task>> = HashMap::new();
    for (id, project_id, title, description, assignee_id, due_date, created_at, updated_at) in
        task_rows
    {
        let comments = comments_by_task.remove(&id).unwrap_or_default();
        tasks_by_project
            .entry(project_id.clone())
            .or_default()
            .push(Task {
                id,
                project_id,
                title,
                description,
                assignee_id,
                due_date,
                comments,
                created_at,
                updated_at,
            });
    }

    let mut members_by_project: HashMap<String, Vec<ProjectMember>> = HashMap::new();
    for (id, project_id, user_id, role, created_at) in project_member_rows {
        members_by_project
            .entry(project_id.clone())
            .or_default()
            .push(ProjectMember {
                id,
                project_id,
                user_id,
                role,
                created_at,
            });
    }

    let mut projects_by_workspace: HashMap<String, Vec<Project>> = HashMap::new();
    for (id, workspace_id, name, description, team_lead_id, created_at, updated_at) in project_rows
    {
        let tasks = tasks_by_project.remove(&id).unwrap_or_default();
        let members = members_by_project.remove(&id).unwrap_or_default();
        projects_by_workspace
            .entry(workspace_id.clone())
            .or_default()
            .push(Project {
                id,
                workspace_id,
                name,
                description,
                team_lead_id,
                members,
                tasks,
                created_at,
                updated_at,
            });
    }

    let mut members_by_workspace: HashMap<String, Vec<WorkspaceMember>> = HashMap::new();
    for (id, workspace_id, user_id, role, message, created_at) in member_rows {
        members_by_workspace
            .entry(workspace_id.clone())
            .or_default()
            .push(WorkspaceMember {
                id,
                workspace_id,
                user_id,
                role,
                message,
                created_at,
            });
    }

    let workspaces = workspace_rows
        .into_iter()
        .map(|(id, name, slug, image_url, owner_id, created_at, updated_at)| Workspace {
            members: members_by_workspace.remove(&id).unwrap_or_default(),
            projects: projects_by_workspace.remove(&id).unwrap_or_default(),
            id,
            name,
            slug,
            image_url,
            owner_id,
            created_at,
            updated_at,
        })
        .collect();

    Ok(Json(WorkspacesResponse { workspaces }))
}

/// POST /api/workspaces/add-member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<AddMemberResponse>, AppError> {
    if req.workspace_id.trim().is_empty() || req.role.trim().is_empty() {
        return Err(AppError::Validation(
            "workspace_id and role are required".to_string(),
        ));
    }
    if req.email.trim().is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }

    let role: WorkspaceRole = req
        .role
        .parse()
        .map_err(|_| AppError::Validation("Invalid role specified".to_string()))?;

    let target: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(req.email.trim())
        .fetch_optional(&state.db)
        .await?;
    let (target_id,) = target.ok_or(AppError::NotFound("User not found"))?;

    let workspace: Option<(String,)> = sqlx::query_as("SELECT id FROM workspaces WHERE id = $1")
        .bind(&req.workspace_id)
        .fetch_optional(&state.db)
        .await?;
    if workspace.is_none() {
        return Err(AppError::NotFound("Workspace not found"));
    }

    let requester_role: Option<(WorkspaceRole,)> = sqlx::query_as(
        "SELECT role FROM workspace_members WHERE workspace_id = $1 AND user_id = $2",
    )
    .bind(&req.workspace_id)
    .bind(&user.id)
    .fetch_optional(&state.db)
    .await?;
    match requester_role {
        Some((r,)) if r.can_admin() => {}
        _ => return Err(AppError::Forbidden),
    }

    let existing: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM workspace_members WHERE workspace_id = $1 AND user_id = $2",
    )
    .bind(&req.workspace_id)
    .bind(&target_id)
    .fetch_optional(&state.db)
    .await?;
    if existing.is_some() {
        return Err(AppError::Validation(
            "User is already a member of the workspace".to_string(),
        ));
    }

    let member = WorkspaceMember {
        id: Uuid::new_v4().to_string(),
        workspace_id: req.workspace_id.clone(),
        user_id: target_id,
        role,
        message: req.message.clone().filter(|m| !m.trim().is_empty()),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO workspace_members (id, workspace_id, user_id, role, message, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&member.id)
    .bind(&member.workspace_id)
    .bind(&member.user_id)
    .bind(member.role)
    .bind(&member.message)
    .bind(member.created_at)
    .execute(&state.db)
    .await?;

    Ok(Json(AddMemberResponse {
        member,
        message: "Member added successfully".to_string(),
    }))
}
