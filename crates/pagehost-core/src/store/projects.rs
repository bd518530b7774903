//! Observable project list
//!
//! The store holds a full-replacement snapshot of the server's project
//! list for the active filter. Every fetch takes a generation token and
//! only the latest one may touch `projects` or `loading`; a response that
//! lands after a newer request was issued is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::api::{DeleteResponse, Project, ProjectApi, ToggleResponse, UploadForm, UploadResponse};
use crate::error::Result;

/// Snapshot published to subscribers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectsState {
    pub projects: Vec<Project>,
    pub loading: bool,
    pub error: Option<String>,
    /// Active filter; empty when unfiltered
    pub search_query: String,
}

impl ProjectsState {
    pub fn find(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }
}

/// Project list store over any [`ProjectApi`]
pub struct ProjectStore<A: ProjectApi + ?Sized> {
    api: Arc<A>,
    state: Arc<watch::Sender<ProjectsState>>,
    generation: Arc<AtomicU64>,
}

impl<A: ProjectApi + ?Sized> Clone for ProjectStore<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<A: ProjectApi + ?Sized> std::fmt::Debug for ProjectStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectStore")
            .field("state", &*self.state.borrow())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

/// Clears `loading` when dropped, if its request is still the latest.
///
/// Runs on success, on error, and when the owning future is dropped or
/// unwinds mid-request.
struct LoadingGuard {
    state: Arc<watch::Sender<ProjectsState>>,
    latest: Arc<AtomicU64>,
    generation: u64,
}

impl LoadingGuard {
    /// Only meaningful while the state lock is held, since `begin` bumps the
    /// generation under that lock.
    fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    /// Apply `update` if this request is still the latest. Returns whether
    /// it was applied.
    fn apply(&self, update: impl FnOnce(&mut ProjectsState)) -> bool {
        self.state.send_if_modified(|s| {
            if !self.is_current() {
                return false;
            }
            update(s);
            true
        })
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.state
            .send_if_modified(|s| self.is_current() && std::mem::replace(&mut s.loading, false));
    }
}

impl<A: ProjectApi + ?Sized> ProjectStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (state, _) = watch::channel(ProjectsState::default());
        Self {
            api,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<ProjectsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ProjectsState {
        self.state.borrow().clone()
    }

    pub fn search_query(&self) -> String {
        self.state.borrow().search_query.clone()
    }

    /// Issue a new generation and mark the store as loading
    fn begin(&self) -> LoadingGuard {
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.loading = true;
            s.error = None;
        });
        LoadingGuard {
            state: Arc::clone(&self.state),
            latest: Arc::clone(&self.generation),
            generation,
        }
    }

    /// Fetch the project list, replacing the held snapshot on success
    pub async fn fetch_projects(&self, search: Option<&str>) {
        let guard = self.begin();
        let result = self.api.list_projects(search).await;

        if let Err(e) = &result {
            error!(error = %e, "Failed to fetch project list");
        }

        let applied = guard.apply(|s| {
            match result {
                Ok(projects) => {
                    s.projects = projects;
                    s.error = None;
                }
                Err(e) => s.error = Some(e.to_string()),
            }
            s.loading = false;
        });

        if applied {
            debug!(generation = guard.generation, "Applied project list response");
        } else {
            debug!(generation = guard.generation, "Discarding stale project list response");
        }
    }

    /// Record `query` as the active filter and fetch with it
    pub async fn search_projects(&self, query: &str) {
        self.state
            .send_modify(|s| s.search_query = query.to_string());
        self.fetch_projects(Some(query)).await;
    }

    /// Drop the filter and fetch the unfiltered list
    pub async fn clear_search(&self) {
        self.state.send_modify(|s| s.search_query.clear());
        self.fetch_projects(None).await;
    }

    /// Fetch again with whatever filter is active
    pub async fn refresh_projects(&self) {
        let query = self.search_query();
        let search = (!query.is_empty()).then_some(query.as_str());
        self.fetch_projects(search).await;
    }

    /// Upload a project, then refetch
    pub async fn upload_project(&self, form: UploadForm) -> Result<UploadResponse> {
        let response = self.mutate(self.api.upload_project(form)).await?;
        info!(slug = %response.slug, "Project uploaded");
        self.refresh_projects().await;
        Ok(response)
    }

    /// Toggle a project, then refetch. The held entry is never flipped locally.
    pub async fn toggle_project(&self, slug: &str) -> Result<ToggleResponse> {
        let response = self.mutate(self.api.toggle_project(slug)).await?;
        info!(slug = %slug, is_active = response.is_active, "Project toggled");
        self.refresh_projects().await;
        Ok(response)
    }

    /// Delete a project, then refetch
    pub async fn delete_project(&self, slug: &str) -> Result<DeleteResponse> {
        let response = self.mutate(self.api.delete_project(slug)).await?;
        info!(slug = %slug, "Project deleted");
        self.refresh_projects().await;
        Ok(response)
    }

    /// Run a mutating call under the loading flag. A failure is recorded
    /// in the state only if no newer request has started since.
    async fn mutate<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let guard = self.begin();
        call.await.inspect_err(|e| {
            error!(error = %e, "Project operation failed");
            if !guard.apply(|s| s.error = Some(e.to_string())) {
                debug!(generation = guard.generation, "Newer request pending, not recording error");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::testing::{ScriptedApi, project};
    use std::time::Duration;

    fn store(api: &Arc<ScriptedApi>) -> ProjectStore<ScriptedApi> {
        ProjectStore::new(Arc::clone(api))
    }

    #[tokio::test]
    async fn test_fetch_replaces_snapshot() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Ok(vec![project(1, "alpha"), project(2, "beta")]));
        store.fetch_projects(None).await;
        assert_eq!(store.snapshot().projects.len(), 2);

        api.push_list(Ok(vec![project(3, "gamma")]));
        store.fetch_projects(None).await;

        let state = store.snapshot();
        assert_eq!(state.projects, vec![project(3, "gamma")]);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_projects_and_records_message() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Ok(vec![project(1, "alpha")]));
        store.fetch_projects(None).await;

        api.push_list(Err(Error::api(404, Some("not found".to_string()))));
        store.fetch_projects(None).await;

        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("not found"));
        assert_eq!(state.projects, vec![project(1, "alpha")]);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_fetch_error_without_reason_uses_fallback() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Err(Error::api(500, None)));
        store.fetch_projects(None).await;

        assert_eq!(store.snapshot().error.as_deref(), Some("Request failed"));
    }

    #[tokio::test]
    async fn test_new_fetch_clears_previous_error() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Err(Error::api(500, None)));
        store.fetch_projects(None).await;
        assert!(store.snapshot().error.is_some());

        api.push_list(Ok(vec![]));
        store.fetch_projects(None).await;
        assert_eq!(store.snapshot().error, None);
    }

    #[tokio::test]
    async fn test_loading_true_while_request_pending() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let release = api.push_gated_list(Ok(vec![project(1, "alpha")]));

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_projects(None).await })
        };
        api.wait_for_calls(1).await;
        assert!(store.snapshot().loading);

        release.send(()).unwrap();
        task.await.unwrap();
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn test_loading_cleared_when_fetch_is_dropped() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let _release = api.push_gated_list(Ok(vec![]));

        let result = tokio::time::timeout(Duration::from_millis(20), store.fetch_projects(None)).await;
        assert!(result.is_err());
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let release_first = api.push_gated_list(Ok(vec![project(1, "old")]));
        api.push_list(Ok(vec![project(2, "new")]));

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.search_projects("old").await })
        };
        api.wait_for_calls(1).await;

        store.search_projects("new").await;
        assert_eq!(store.snapshot().projects, vec![project(2, "new")]);
        assert!(!store.snapshot().loading);

        release_first.send(()).unwrap();
        first.await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.projects, vec![project(2, "new")]);
        assert_eq!(state.search_query, "new");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_loading_stays_true_until_latest_request_resolves() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let release_first = api.push_gated_list(Ok(vec![project(1, "first")]));
        let release_second = api.push_gated_list(Ok(vec![project(2, "second")]));

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_projects(None).await })
        };
        api.wait_for_calls(1).await;
        let second = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_projects(None).await })
        };
        api.wait_for_calls(2).await;

        release_first.send(()).unwrap();
        first.await.unwrap();
        let state = store.snapshot();
        assert!(state.loading);
        assert!(state.projects.is_empty());

        release_second.send(()).unwrap();
        second.await.unwrap();
        assert_eq!(store.snapshot().projects, vec![project(2, "second")]);
        assert!(!store.snapshot().loading);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_latest_fetch_wins_across_worker_threads() {
        for _ in 0..20 {
            let api = Arc::new(ScriptedApi::new());
            let store = store(&api);
            let mut releases = Vec::new();
            let mut tasks = Vec::new();

            for i in 0..4i64 {
                releases.push(api.push_gated_list(Ok(vec![project(i, &format!("p{}", i))])));
                let store = store.clone();
                tasks.push(tokio::spawn(async move { store.fetch_projects(None).await }));
                api.wait_for_calls(i as usize + 1).await;
            }

            for release in releases.into_iter().rev() {
                release.send(()).unwrap();
            }
            for task in tasks {
                task.await.unwrap();
            }

            let state = store.snapshot();
            assert_eq!(state.projects, vec![project(3, "p3")]);
            assert!(!state.loading);
        }
    }

    #[tokio::test]
    async fn test_loading_true_while_mutation_pending() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let release = api.push_gated_toggle(Ok(ToggleResponse {
            message: "Project disabled".to_string(),
            is_active: false,
        }));
        api.push_list(Ok(vec![project(1, "alpha")]));

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.toggle_project("alpha").await })
        };
        api.wait_for_toggles(1).await;
        assert!(store.snapshot().loading);

        release.send(()).unwrap();
        task.await.unwrap().unwrap();

        let state = store.snapshot();
        assert!(!state.loading);
        assert_eq!(state.projects, vec![project(1, "alpha")]);
    }

    #[tokio::test]
    async fn test_loading_cleared_when_mutation_is_dropped() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let _release = api.push_gated_toggle(Ok(ToggleResponse {
            message: "Project disabled".to_string(),
            is_active: false,
        }));

        let result =
            tokio::time::timeout(Duration::from_millis(20), store.toggle_project("alpha")).await;
        assert!(result.is_err());
        assert!(!store.snapshot().loading);
        assert!(api.list_calls().is_empty());
    }

    #[tokio::test]
    async fn test_superseded_mutation_failure_not_recorded() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let release = api.push_gated_toggle(Err(Error::api(
            404,
            Some("Project not found".to_string()),
        )));

        let toggle = {
            let store = store.clone();
            tokio::spawn(async move { store.toggle_project("ghost").await })
        };
        api.wait_for_toggles(1).await;

        api.push_list(Ok(vec![project(1, "alpha")]));
        store.fetch_projects(None).await;

        release.send(()).unwrap();
        let err = toggle.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Project not found");

        let state = store.snapshot();
        assert_eq!(state.error, None);
        assert!(!state.loading);
        assert_eq!(state.projects, vec![project(1, "alpha")]);
    }

    #[tokio::test]
    async fn test_search_then_clear_search() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Ok(vec![project(1, "x-site")]));
        store.search_projects("x").await;
        assert_eq!(store.search_query(), "x");

        api.push_list(Ok(vec![project(1, "x-site"), project(2, "other")]));
        store.clear_search().await;

        assert_eq!(store.search_query(), "");
        assert_eq!(api.list_calls(), vec![Some("x".to_string()), None]);
        assert_eq!(store.snapshot().projects.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_uses_active_filter() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Ok(vec![]));
        store.refresh_projects().await;

        api.push_list(Ok(vec![]));
        store.search_projects("docs").await;

        api.push_list(Ok(vec![]));
        store.refresh_projects().await;

        assert_eq!(
            api.list_calls(),
            vec![None, Some("docs".to_string()), Some("docs".to_string())]
        );
    }

    #[tokio::test]
    async fn test_toggle_refetches_instead_of_patching() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Ok(vec![project(1, "alpha")]));
        store.fetch_projects(None).await;

        api.push_toggle(Ok(ToggleResponse {
            message: "Project disabled".to_string(),
            is_active: false,
        }));
        let mut refreshed = project(1, "alpha");
        refreshed.is_active = false;
        api.push_list(Ok(vec![refreshed.clone()]));

        let response = store.toggle_project("alpha").await.unwrap();
        assert!(!response.is_active);
        assert_eq!(store.snapshot().projects, vec![refreshed]);
        assert_eq!(api.list_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_delete_records_error_and_skips_refetch() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_delete(Err(Error::api(404, Some("Project not found".to_string()))));
        let err = store.delete_project("ghost").await.unwrap_err();

        assert_eq!(err.to_string(), "Project not found");
        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("Project not found"));
        assert!(!state.loading);
        assert!(api.list_calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_success_refetches() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_delete(Ok(DeleteResponse {
            message: "Project deleted".to_string(),
        }));
        api.push_list(Ok(vec![]));

        let response = store.delete_project("alpha").await.unwrap();
        assert_eq!(response.message, "Project deleted");
        assert_eq!(api.list_calls(), vec![None]);
    }

    #[tokio::test]
    async fn test_upload_refetches_with_active_filter() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);

        api.push_list(Ok(vec![]));
        store.search_projects("demo").await;

        api.push_upload(Ok(UploadResponse {
            id: 9,
            slug: "demo-site".to_string(),
            name: "Demo".to_string(),
            message: "Upload successful".to_string(),
            url: "/projects/demo-site".to_string(),
        }));
        api.push_list(Ok(vec![project(9, "demo-site")]));

        let form = UploadForm::new("demo.zip", vec![1, 2, 3]).with_name("Demo");
        let response = store.upload_project(form).await.unwrap();

        assert_eq!(response.slug, "demo-site");
        assert_eq!(
            api.list_calls(),
            vec![Some("demo".to_string()), Some("demo".to_string())]
        );
        assert_eq!(store.snapshot().projects, vec![project(9, "demo-site")]);
    }

    #[tokio::test]
    async fn test_subscribers_see_loading_transitions() {
        let api = Arc::new(ScriptedApi::new());
        let store = store(&api);
        let mut rx = store.subscribe();
        let release = api.push_gated_list(Ok(vec![project(1, "alpha")]));

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_projects(None).await })
        };

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().loading);

        release.send(()).unwrap();
        task.await.unwrap();

        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert_eq!(state.projects.len(), 1);
    }

    #[test]
    fn test_state_find() {
        let state = ProjectsState {
            projects: vec![project(1, "alpha"), project(2, "beta")],
            ..Default::default()
        };
        assert_eq!(state.find("beta").map(|p| p.id), Some(2));
        assert!(state.find("gamma").is_none());
    }
}
