use taskboard_shared::{Project, Task, Workspace};

use crate::gateway::WorkspaceGateway;
use crate::selection::SelectionStore;

/// Partial workspace update: the id plus whichever fields changed.
#[derive(Debug, Clone, Default)]
pub struct WorkspacePatch {
    pub id: String,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
}

/// One or many task ids to remove in a single operation.
#[derive(Debug, Clone)]
pub enum TaskIds {
    One(String),
    Many(Vec<String>),
}

impl TaskIds {
    fn contains(&self, id: &str) -> bool {
        match self {
            Self::One(single) => single == id,
            Self::Many(ids) => ids.iter().any(|i| i == id),
        }
    }
}

impl From<String> for TaskIds {
    fn from(id: String) -> Self {
        Self::One(id)
    }
}

impl From<&str> for TaskIds {
    fn from(id: &str) -> Self {
        Self::One(id.to_string())
    }
}

impl From<Vec<String>> for TaskIds {
    fn from(ids: Vec<String>) -> Self {
        Self::Many(ids)
    }
}

/// Tagged state transitions. Every local mutation funnels through
/// [`WorkspaceStore::apply`]; an action whose target id does not exist is a
/// no-op rather than an error, so stale ids from the UI cannot corrupt state.
#[derive(Debug, Clone)]
pub enum WorkspaceAction {
    SetWorkspaces(Vec<Workspace>),
    SetCurrentWorkspace(String),
    AddWorkspace(Workspace),
    UpdateWorkspace(WorkspacePatch),
    DeleteWorkspace(String),
    AddProject {
        workspace_id: String,
        project: Project,
    },
    AddTask {
        workspace_id: String,
        project_id: String,
        task: Task,
    },
    UpdateTask {
        workspace_id: String,
        project_id: String,
        task: Task,
    },
    DeleteTask {
        workspace_id: String,
        project_id: String,
        task_ids: TaskIds,
    },
}

/// Client-side mirror of the user's workspaces: the full list, the selected
/// workspace, and the fetch lifecycle. Replaced wholesale by a successful
/// fetch, patched incrementally by [`WorkspaceAction`]s in between.
///
/// The selected workspace, when set, is always a copy of an entry in the
/// list; mutations that touch that entry re-clone it so the two stay
/// logically consistent.
pub struct WorkspaceStore {
    workspaces: Vec<Workspace>,
    current_workspace: Option<Workspace>,
    loading: bool,
    error: Option<String>,
    selection: SelectionStore,
}

impl WorkspaceStore {
    pub fn new(selection: SelectionStore) -> Self {
        Self {
            workspaces: Vec::new(),
            current_workspace: None,
            loading: false,
            error: None,
            selection,
        }
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.current_workspace.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace the mirror from the server, then re-resolve the selection.
    /// A failed fetch records a readable error and leaves existing data
    /// untouched.
    pub async fn fetch_workspaces(&mut self, gateway: &WorkspaceGateway, token: &str) {
        self.loading = true;
        self.error = None;

        match gateway.fetch_workspaces(token).await {
            Ok(workspaces) => {
                tracing::info!(count = workspaces.len(), "Fetched workspaces");
                self.workspaces = workspaces;
                self.resolve_selection();
            }
            Err(err) => {
                tracing::warn!(error = %err, "Workspace fetch failed");
                self.error = Some(err.to_string());
            }
        }

        self.loading = false;
    }

    pub fn apply(&mut self, action: WorkspaceAction) {
        match action {
            WorkspaceAction::SetWorkspaces(list) => {
                self.workspaces = list;
            }
            WorkspaceAction::SetCurrentWorkspace(id) => {
                // The id is persisted whether or not it matches, so a
                // selection made ahead of a fetch is not lost.
                self.persist_selection(&id);
                self.current_workspace = self.find_workspace(&id).cloned();
            }
            WorkspaceAction::AddWorkspace(workspace) => {
                let adopt = self.current_workspace.is_none();
                if adopt {
                    self.persist_selection(&workspace.id);
                    self.current_workspace = Some(workspace.clone());
                }
                self.workspaces.push(workspace);
            }
            WorkspaceAction::UpdateWorkspace(patch) => {
                let WorkspacePatch {
                    id,
                    name,
                    slug,
                    image_url,
                } = patch;
                let Some(ws) = self.workspaces.iter_mut().find(|w| w.id == id) else {
                    return;
                };
                if let Some(name) = name {
                    ws.name = name;
                }
                if let Some(slug) = slug {
                    ws.slug = slug;
                }
                if let Some(image_url) = image_url {
                    ws.image_url = Some(image_url);
                }
                self.mirror_current(&id);
            }
            WorkspaceAction::DeleteWorkspace(id) => {
                self.workspaces.retain(|w| w.id != id);
                if self
                    .current_workspace
                    .as_ref()
                    .is_some_and(|w| w.id == id)
                {
                    self.current_workspace = self.workspaces.first().cloned();
                    let next_id = self
                        .current_workspace
                        .as_ref()
                        .map(|w| w.id.clone())
                        .unwrap_or_default();
                    self.persist_selection(&next_id);
                }
            }
            WorkspaceAction::AddProject {
                workspace_id,
                project,
            } => {
                let Some(ws) = self.workspaces.iter_mut().find(|w| w.id == workspace_id) else {
                    return;
                };
                ws.projects.push(project);
                self.mirror_current(&workspace_id);
            }
            WorkspaceAction::AddTask {
                workspace_id,
                project_id,
                task,
            } => {
                let Some(project) = self.find_project_mut(&workspace_id, &project_id) else {
                    return;
                };
                project.tasks.push(task);
                self.mirror_current(&workspace_id);
            }
            WorkspaceAction::UpdateTask {
                workspace_id,
                project_id,
                task,
            } => {
                let Some(project) = self.find_project_mut(&workspace_id, &project_id) else {
                    return;
                };
                let Some(slot) = project.tasks.iter_mut().find(|t| t.id == task.id) else {
                    return;
                };
                *slot = task;
                self.mirror_current(&workspace_id);
            }
            WorkspaceAction::DeleteTask {
                workspace_id,
                project_id,
                task_ids,
            } => {
                let Some(project) = self.find_project_mut(&workspace_id, &project_id) else {
                    return;
                };
                project.tasks.retain(|t| !task_ids.contains(&t.id));
                self.mirror_current(&workspace_id);
            }
        }
    }

    /// Post-fetch selection policy: keep the persisted id when it matches a
    /// fetched workspace, else take the first entry, else nothing. The
    /// outcome is persisted either way so stale ids get overwritten.
    fn resolve_selection(&mut self) {
        if self.workspaces.is_empty() {
            self.current_workspace = None;
            self.persist_selection("");
            return;
        }

        let saved = self.selection.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Could not read persisted workspace selection");
            None
        });

        let index = saved
            .and_then(|id| self.workspaces.iter().position(|w| w.id == id))
            .unwrap_or(0);

        let chosen = self.workspaces[index].clone();
        self.persist_selection(&chosen.id);
        self.current_workspace = Some(chosen);
    }

    /// Re-clone the selected workspace from the list after a mutation that
    /// touched its entry.
    fn mirror_current(&mut self, workspace_id: &str) {
        if self
            .current_workspace
            .as_ref()
            .is_some_and(|w| w.id == workspace_id)
        {
            self.current_workspace = self.find_workspace(workspace_id).cloned();
        }
    }

    fn persist_selection(&self, workspace_id: &str) {
        // Selection persistence is best-effort; mutations never fail visibly
        if let Err(err) = self.selection.save(workspace_id) {
            tracing::warn!(error = %err, "Could not persist workspace selection");
        }
    }

    fn find_workspace(&self, id: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    fn find_project_mut(&mut self, workspace_id: &str, project_id: &str) -> Option<&mut Project> {
        self.workspaces
            .iter_mut()
            .find(|w| w.id == workspace_id)?
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use tempfile::{tempdir, TempDir};

    use super::*;

    fn ts() -> DateTime<Utc> {
        "2025-01-01T00:00:00Z".parse().unwrap()
    }

    fn workspace(id: &str, name: &str) -> Workspace {
        Workspace {
            id: id.to_string(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            image_url: None,
            owner_id: "user_1".to_string(),
            members: Vec::new(),
            projects: Vec::new(),
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn project(id: &str, workspace_id: &str) -> Project {
        Project {
            id: id.to_string(),
            workspace_id: workspace_id.to_string(),
            name: format!("Project {}", id),
            description: None,
            team_lead_id: None,
            members: Vec::new(),
            tasks: Vec::new(),
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn task(id: &str, project_id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            project_id: project_id.to_string(),
            title: title.to_string(),
            description: None,
            assignee_id: None,
            due_date: None,
            comments: Vec::new(),
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn store_in(dir: &TempDir) -> WorkspaceStore {
        WorkspaceStore::new(SelectionStore::at(dir.path().join("workspace.json")))
    }

    /// Store preloaded with one workspace/project/task tree: w1 -> p1 -> t1.
    fn seeded_store(dir: &TempDir) -> WorkspaceStore {
        let mut store = store_in(dir);
        let mut ws = workspace("w1", "One");
        let mut p = project("p1", "w1");
        p.tasks.push(task("t1", "p1", "First"));
        ws.projects.push(p);
        store.apply(WorkspaceAction::SetWorkspaces(vec![ws, workspace("w2", "Two")]));
        store.apply(WorkspaceAction::SetCurrentWorkspace("w1".to_string()));
        store
    }

    #[test]
    fn test_selection_resolution_prefers_saved_id() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.selection.save("w2").unwrap();

        store.workspaces = vec![
            workspace("w1", "One"),
            workspace("w2", "Two"),
            workspace("w3", "Three"),
        ];
        store.resolve_selection();

        assert_eq!(store.current_workspace().unwrap().id, "w2");
        assert_eq!(store.selection.load().unwrap(), Some("w2".to_string()));
    }

    #[test]
    fn test_selection_resolution_falls_back_to_first() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.selection.save("w_gone").unwrap();

        store.workspaces = vec![workspace("w1", "One"), workspace("w2", "Two")];
        store.resolve_selection();

        assert_eq!(store.current_workspace().unwrap().id, "w1");
        // The stale id has been overwritten
        assert_eq!(store.selection.load().unwrap(), Some("w1".to_string()));
    }

    #[test]
    fn test_selection_resolution_empty_list_clears_current() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.selection.save("w1").unwrap();
        store.current_workspace = Some(workspace("w1", "One"));

        store.workspaces = Vec::new();
        store.resolve_selection();

        assert!(store.current_workspace().is_none());
        assert_eq!(store.selection.load().unwrap(), None);
    }

    #[test]
    fn test_set_current_workspace_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::SetCurrentWorkspace("w2".to_string()));
        let once = store.current_workspace().cloned();
        store.apply(WorkspaceAction::SetCurrentWorkspace("w2".to_string()));

        assert_eq!(store.current_workspace().cloned(), once);
        assert_eq!(store.selection.load().unwrap(), Some("w2".to_string()));
    }

    #[test]
    fn test_set_current_workspace_unknown_id_clears_match_but_persists() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::SetCurrentWorkspace("w_gone".to_string()));

        assert!(store.current_workspace().is_none());
        assert_eq!(store.selection.load().unwrap(), Some("w_gone".to_string()));
    }

    #[test]
    fn test_add_workspace_adopts_selection_when_none() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);

        store.apply(WorkspaceAction::AddWorkspace(workspace("w1", "One")));

        assert_eq!(store.current_workspace().unwrap().id, "w1");
        assert_eq!(store.selection.load().unwrap(), Some("w1".to_string()));

        // A second addition does not steal the selection
        store.apply(WorkspaceAction::AddWorkspace(workspace("w2", "Two")));
        assert_eq!(store.current_workspace().unwrap().id, "w1");
    }

    #[test]
    fn test_update_workspace_merges_patch_and_mirrors_current() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::UpdateWorkspace(WorkspacePatch {
            id: "w1".to_string(),
            name: Some("Renamed".to_string()),
            ..Default::default()
        }));

        assert_eq!(store.workspaces()[0].name, "Renamed");
        // Untouched fields survive the merge
        assert_eq!(store.workspaces()[0].slug, "one");
        assert_eq!(store.current_workspace().unwrap().name, "Renamed");
        // The other workspace is untouched
        assert_eq!(store.workspaces()[1].name, "Two");
    }

    #[test]
    fn test_delete_workspace_falls_back_to_first_remaining() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::DeleteWorkspace("w1".to_string()));

        assert_eq!(store.workspaces().len(), 1);
        assert_eq!(store.current_workspace().unwrap().id, "w2");
        assert_eq!(store.selection.load().unwrap(), Some("w2".to_string()));
    }

    #[test]
    fn test_delete_last_workspace_clears_selection() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.apply(WorkspaceAction::AddWorkspace(workspace("w1", "One")));

        store.apply(WorkspaceAction::DeleteWorkspace("w1".to_string()));

        assert!(store.workspaces().is_empty());
        assert!(store.current_workspace().is_none());
        assert_eq!(store.selection.load().unwrap(), None);
    }

    #[test]
    fn test_delete_workspace_not_current_keeps_selection() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::DeleteWorkspace("w2".to_string()));

        assert_eq!(store.current_workspace().unwrap().id, "w1");
        assert_eq!(store.selection.load().unwrap(), Some("w1".to_string()));
    }

    #[test]
    fn test_add_project_mirrors_into_current() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::AddProject {
            workspace_id: "w1".to_string(),
            project: project("p2", "w1"),
        });

        assert_eq!(store.workspaces()[0].projects.len(), 2);
        assert_eq!(store.current_workspace().unwrap().projects.len(), 2);
    }

    #[test]
    fn test_add_then_update_task_replaces_by_id() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::AddTask {
            workspace_id: "w1".to_string(),
            project_id: "p1".to_string(),
            task: task("t2", "p1", "X"),
        });
        store.apply(WorkspaceAction::UpdateTask {
            workspace_id: "w1".to_string(),
            project_id: "p1".to_string(),
            task: task("t2", "p1", "Y"),
        });

        let tasks = &store.current_workspace().unwrap().projects[0].tasks;
        let matching: Vec<_> = tasks.iter().filter(|t| t.id == "t2").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].title, "Y");
    }

    #[test]
    fn test_update_task_unknown_id_is_noop() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);
        let before = store.workspaces().to_vec();

        store.apply(WorkspaceAction::UpdateTask {
            workspace_id: "w1".to_string(),
            project_id: "p1".to_string(),
            task: task("t_gone", "p1", "Y"),
        });

        assert_eq!(store.workspaces(), &before[..]);
    }

    #[test]
    fn test_delete_task_accepts_multiple_ids_and_ignores_missing() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);
        store.apply(WorkspaceAction::AddTask {
            workspace_id: "w1".to_string(),
            project_id: "p1".to_string(),
            task: task("t2", "p1", "Second"),
        });

        store.apply(WorkspaceAction::DeleteTask {
            workspace_id: "w1".to_string(),
            project_id: "p1".to_string(),
            task_ids: vec!["t1".to_string(), "t2".to_string(), "t_gone".to_string()].into(),
        });

        assert!(store.workspaces()[0].projects[0].tasks.is_empty());
        assert!(store.current_workspace().unwrap().projects[0].tasks.is_empty());
    }

    #[test]
    fn test_delete_task_single_id_form() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);

        store.apply(WorkspaceAction::DeleteTask {
            workspace_id: "w1".to_string(),
            project_id: "p1".to_string(),
            task_ids: "t1".into(),
        });

        assert!(store.workspaces()[0].projects[0].tasks.is_empty());
    }

    #[test]
    fn test_mutations_with_unknown_workspace_are_noops() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);
        let workspaces_before = store.workspaces().to_vec();
        let current_before = store.current_workspace().cloned();

        store.apply(WorkspaceAction::AddProject {
            workspace_id: "w_gone".to_string(),
            project: project("p9", "w_gone"),
        });
        store.apply(WorkspaceAction::AddTask {
            workspace_id: "w_gone".to_string(),
            project_id: "p1".to_string(),
            task: task("t9", "p1", "Nine"),
        });
        store.apply(WorkspaceAction::DeleteTask {
            workspace_id: "w1".to_string(),
            project_id: "p_gone".to_string(),
            task_ids: "t1".into(),
        });
        store.apply(WorkspaceAction::UpdateWorkspace(WorkspacePatch {
            id: "w_gone".to_string(),
            name: Some("Nope".to_string()),
            ..Default::default()
        }));

        assert_eq!(store.workspaces(), &workspaces_before[..]);
        assert_eq!(store.current_workspace().cloned(), current_before);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_existing_data() {
        let dir = tempdir().unwrap();
        let mut store = seeded_store(&dir);
        let before = store.workspaces().to_vec();

        // Nothing is listening here, so the fetch fails at the transport
        let gateway = WorkspaceGateway::new("http://127.0.0.1:1");
        store.fetch_workspaces(&gateway, "some-token").await;

        assert!(!store.is_loading());
        assert!(store.error().is_some());
        assert_eq!(store.workspaces(), &before[..]);
        assert_eq!(store.current_workspace().unwrap().id, "w1");
    }

    #[tokio::test]
    async fn test_fetch_without_token_reports_credential_error() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);

        let gateway = WorkspaceGateway::new("http://127.0.0.1:1");
        store.fetch_workspaces(&gateway, "").await;

        assert_eq!(store.error(), Some("No authentication token provided"));
        assert!(store.workspaces().is_empty());
    }
}
