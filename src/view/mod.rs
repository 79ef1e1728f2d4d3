//! Resource view
//!
//! Composes a list, an optional form and a notice queue for one resource,
//! and drives them through the resource's repository. Exactly one of the
//! list, add form or edit form is active at a time.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::form::{FormController, FormError, FormMode};
use crate::gateway::GatewayError;
use crate::list::{Debouncer, ListController};
use crate::model::{Record, RecordId};
use crate::repository::Repository;
use crate::resources::ListStrategy;

/// Errors surfaced by view actions. Each one has already been pushed to
/// the notice queue.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("no form is open")]
    NoForm,
}

/// Result type for view actions
pub type Result<T> = std::result::Result<T, ViewError>;

/// What the view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    AddForm,
    EditForm(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user feedback (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// List + form screen for one resource.
#[derive(Debug)]
pub struct View {
    repo: Repository,
    list: ListController,
    mode: ViewMode,
    form: Option<FormController>,
    notices: Vec<Notice>,
    debouncer: Debouncer,
}

impl View {
    pub fn new(repo: Repository) -> Self {
        let list = ListController::new(repo.spec().strategy, repo.spec().page_size);
        Self {
            repo,
            list,
            mode: ViewMode::List,
            form: None,
            notices: Vec::new(),
            debouncer: Debouncer::default(),
        }
    }

    /// Override the resource's default page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.list.set_items_per_page(size);
        self
    }

    /// Quiet period before typed search input is applied.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    pub fn debouncer(&self) -> Debouncer {
        self.debouncer
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn list(&self) -> &ListController {
        &self.list
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn form(&self) -> Option<&FormController> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut FormController> {
        self.form.as_mut()
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn fail<E: Into<ViewError>>(&mut self, err: E) -> ViewError {
        let err = err.into();
        warn!(resource = self.repo.name(), error = %err, "view action failed");
        self.notices.push(Notice::error(err.to_string()));
        err
    }

    /// Initial load.
    pub async fn mount(&mut self) -> Result<()> {
        self.reload().await
    }

    /// Fetch the list again for the current keyword and page.
    pub async fn reload(&mut self) -> Result<()> {
        let ticket = self.list.begin_request();
        match self.list.strategy() {
            ListStrategy::Client => match self.repo.list().await {
                Ok(items) => {
                    self.list.apply_items(ticket, items);
                    Ok(())
                }
                Err(e) => Err(self.fail(e)),
            },
            ListStrategy::Server => {
                let query = self.list.search_query();
                match self.repo.search(&query).await {
                    Ok(page) => {
                        self.list.apply_page(ticket, page);
                        Ok(())
                    }
                    Err(e) => Err(self.fail(e)),
                }
            }
        }
    }

    /// Change the keyword. Server-strategy lists fetch page one again.
    pub async fn search(&mut self, term: &str) -> Result<()> {
        self.list.set_search(term);
        match self.list.strategy() {
            ListStrategy::Client => Ok(()),
            ListStrategy::Server => self.reload().await,
        }
    }

    /// Search as the user types: each keyword arriving on `input` replaces
    /// the previous one, and only a keyword left alone for the debounce
    /// delay is searched. `on_update` runs after every search, failed ones
    /// included, so the caller can render rows or drain notices. Returns
    /// when the input closes.
    pub async fn follow_search<F>(&mut self, input: &mut mpsc::Receiver<String>, mut on_update: F)
    where
        F: FnMut(&mut View),
    {
        loop {
            let Some(term) = self.debouncer.next_settled(input).await else {
                break;
            };
            debug!(resource = self.repo.name(), keyword = %term, "search input settled");
            // failures are queued as notices for on_update to report
            let _ = self.search(&term).await;
            on_update(self);
        }
    }

    /// Sort by a column of the loaded rows.
    pub fn toggle_sort(&mut self, key: &str) {
        self.list.toggle_sort(key);
    }

    pub async fn go_to_page(&mut self, n: usize) -> Result<()> {
        match self.list.strategy() {
            ListStrategy::Client => {
                self.list.go_to_page(n);
                Ok(())
            }
            ListStrategy::Server => {
                let target = n.clamp(1, self.list.total_pages());
                if target == self.list.current_page() && !self.list.items().is_empty() {
                    return Ok(());
                }
                self.list.request_page(target);
                self.reload().await
            }
        }
    }

    pub fn open_add(&mut self) {
        self.form = Some(FormController::add(self.repo.spec()));
        self.mode = ViewMode::AddForm;
    }

    /// Open the edit form, using the loaded row or fetching it when the
    /// row is not on the current page.
    pub async fn open_edit(&mut self, id: RecordId) -> Result<()> {
        let record = match self.list.get(id) {
            Some(row) => row.clone(),
            None => match self.repo.find(id).await {
                Ok(record) => record,
                Err(e) => return Err(self.fail(e)),
            },
        };
        self.form = Some(FormController::edit(self.repo.spec(), record));
        self.mode = ViewMode::EditForm(id);
        Ok(())
    }

    /// Leave the form without saving.
    pub fn cancel(&mut self) {
        self.form = None;
        self.mode = ViewMode::List;
    }

    /// Submit the open form. On success the list is reconciled with the
    /// record the backend returned and the view goes back to the list.
    pub async fn save(&mut self) -> Result<Record> {
        let Some(form) = self.form.as_mut() else {
            return Err(ViewError::NoForm);
        };
        let creating = form.mode() == FormMode::Add;
        match form.submit(&self.repo).await {
            Ok(saved) => {
                if creating {
                    self.list.insert(saved.clone());
                } else {
                    self.list.replace(saved.clone());
                }
                self.form = None;
                self.mode = ViewMode::List;
                let verb = if creating { "created" } else { "updated" };
                info!(resource = self.repo.name(), id = ?saved.id, "{} via form", verb);
                self.notices.push(Notice::success(format!("Record {}", verb)));
                Ok(saved)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Delete one record and drop it from the list.
    pub async fn delete(&mut self, id: RecordId) -> Result<()> {
        if let Err(e) = self.repo.delete(id).await {
            return Err(self.fail(e));
        }
        self.list.remove(id);
        if self.mode == ViewMode::EditForm(id) {
            self.cancel();
        }
        self.notices.push(Notice::success("Record deleted"));

        // a server page emptied by the delete is refilled from the backend
        if self.list.strategy() == ListStrategy::Server
            && self.list.items().is_empty()
            && self.list.total_count() > 0
        {
            self.reload().await?;
        }
        Ok(())
    }

    /// Delete every record of the resource.
    pub async fn clear_all(&mut self) -> Result<()> {
        if let Err(e) = self.repo.clear().await {
            return Err(self.fail(e));
        }
        self.list.clear_items();
        self.cancel();
        self.notices
            .push(Notice::success(format!("All {} deleted", self.repo.spec().label.to_lowercase())));
        Ok(())
    }
}
