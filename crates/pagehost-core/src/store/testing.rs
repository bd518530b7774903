//! Scripted [`ProjectApi`] for store tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{Notify, oneshot};

use crate::api::{
    DeleteResponse, Project, ProjectApi, ToggleResponse, UploadForm, UploadResponse,
};
use crate::error::{Error, Result};

pub fn project(id: i64, slug: &str) -> Project {
    Project {
        id,
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        entry_point: "index.html".to_string(),
        is_active: true,
        uploaded_at: "2024-01-15 10:30:00".to_string(),
    }
}

struct Scripted<T> {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<T>,
}

/// Replays queued responses in order, optionally holding one until released
#[derive(Default)]
pub struct ScriptedApi {
    lists: Mutex<VecDeque<Scripted<Vec<Project>>>>,
    uploads: Mutex<VecDeque<Result<UploadResponse>>>,
    toggles: Mutex<VecDeque<Scripted<ToggleResponse>>>,
    deletes: Mutex<VecDeque<Result<DeleteResponse>>>,
    list_calls: Mutex<Vec<Option<String>>>,
    toggle_calls: Mutex<Vec<String>>,
    called: Notify,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, result: Result<Vec<Project>>) {
        self.lists
            .lock()
            .unwrap()
            .push_back(Scripted { gate: None, result });
    }

    /// Queue a list response that is held until the returned sender fires
    pub fn push_gated_list(&self, result: Result<Vec<Project>>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lists.lock().unwrap().push_back(Scripted {
            gate: Some(rx),
            result,
        });
        tx
    }

    pub fn push_upload(&self, result: Result<UploadResponse>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn push_toggle(&self, result: Result<ToggleResponse>) {
        self.toggles
            .lock()
            .unwrap()
            .push_back(Scripted { gate: None, result });
    }

    /// Queue a toggle response that is held until the returned sender fires
    pub fn push_gated_toggle(&self, result: Result<ToggleResponse>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.toggles.lock().unwrap().push_back(Scripted {
            gate: Some(rx),
            result,
        });
        tx
    }

    pub fn push_delete(&self, result: Result<DeleteResponse>) {
        self.deletes.lock().unwrap().push_back(result);
    }

    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.list_calls.lock().unwrap().clone()
    }

    /// Wait until `count` list calls have been made
    pub async fn wait_for_calls(&self, count: usize) {
        self.wait_until(|| self.list_calls.lock().unwrap().len() >= count)
            .await;
    }

    /// Wait until `count` toggle calls have been made
    pub async fn wait_for_toggles(&self, count: usize) {
        self.wait_until(|| self.toggle_calls.lock().unwrap().len() >= count)
            .await;
    }

    async fn wait_until(&self, done: impl Fn() -> bool) {
        loop {
            let notified = self.called.notified();
            if done() {
                return;
            }
            notified.await;
        }
    }

    async fn release<T>(scripted: Option<Scripted<T>>, what: &str) -> Result<T> {
        let Some(scripted) = scripted else {
            return Self::unscripted(what);
        };
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.result
    }

    fn unscripted<T>(what: &str) -> Result<T> {
        Err(Error::Other(format!("no scripted {} response", what)))
    }
}

#[async_trait]
impl ProjectApi for ScriptedApi {
    async fn list_projects(&self, search: Option<&str>) -> Result<Vec<Project>> {
        let next = self.lists.lock().unwrap().pop_front();
        self.list_calls
            .lock()
            .unwrap()
            .push(search.map(str::to_string));
        self.called.notify_waiters();
        Self::release(next, "list").await
    }

    async fn upload_project(&self, _form: UploadForm) -> Result<UploadResponse> {
        let next = self.uploads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Self::unscripted("upload"))
    }

    async fn toggle_project(&self, slug: &str) -> Result<ToggleResponse> {
        let next = self.toggles.lock().unwrap().pop_front();
        self.toggle_calls.lock().unwrap().push(slug.to_string());
        self.called.notify_waiters();
        Self::release(next, "toggle").await
    }

    async fn delete_project(&self, _slug: &str) -> Result<DeleteResponse> {
        let next = self.deletes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Self::unscripted("delete"))
    }
}
