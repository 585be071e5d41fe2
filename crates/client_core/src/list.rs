//! List Controller: the sole owner of a locally held collection. Every
//! mutation is followed by a full reload; membership and order are never
//! patched locally.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{Meeting, MeetingId, Note, NoteId, SortColumn},
    protocol::{CreateNoteRequest, MeetingInput},
    validation::validate_note_content,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    gateway::EntityGateway,
    sort::SortController,
    state::{LoadStatus, Sequencer, Ticket},
};

/// What a list holds and how it is fetched.
#[async_trait]
pub trait ListKind: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Id: Copy + Eq + fmt::Display + Send + Sync + 'static;
    /// Parameters sent with every fetch (sort state, parent id).
    type Query: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;
    fn id_of(&self, item: &Self::Item) -> Self::Id;
    async fn fetch(
        &self,
        gateway: &dyn EntityGateway,
        query: &Self::Query,
    ) -> Result<Vec<Self::Item>>;
    async fn delete(&self, gateway: &dyn EntityGateway, id: Self::Id) -> Result<()>;
}

pub struct Meetings;

#[async_trait]
impl ListKind for Meetings {
    type Item = Meeting;
    type Id = MeetingId;
    type Query = SortController;

    fn name(&self) -> &'static str {
        "meetings"
    }

    fn id_of(&self, item: &Meeting) -> MeetingId {
        item.id
    }

    async fn fetch(
        &self,
        gateway: &dyn EntityGateway,
        query: &SortController,
    ) -> Result<Vec<Meeting>> {
        gateway.list_meetings(query.query()).await
    }

    async fn delete(&self, gateway: &dyn EntityGateway, id: MeetingId) -> Result<()> {
        gateway.delete_meeting(id).await
    }
}

pub struct Notes;

#[async_trait]
impl ListKind for Notes {
    type Item = Note;
    type Id = NoteId;
    type Query = MeetingId;

    fn name(&self) -> &'static str {
        "notes"
    }

    fn id_of(&self, item: &Note) -> NoteId {
        item.id
    }

    async fn fetch(&self, gateway: &dyn EntityGateway, meeting_id: &MeetingId) -> Result<Vec<Note>> {
        gateway.list_notes(*meeting_id).await
    }

    async fn delete(&self, gateway: &dyn EntityGateway, id: NoteId) -> Result<()> {
        gateway.delete_note(id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub status: LoadStatus,
    /// Failure of the last create/update/delete. Kept apart from `status`
    /// so a failed delete does not hide the still-valid collection.
    pub action_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CollectionState<T> {
    items: Vec<T>,
    status: LoadStatus,
    action_error: Option<String>,
    seq: Sequencer,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: LoadStatus::Idle,
            action_error: None,
            seq: Sequencer::default(),
        }
    }
}

impl<T: Clone> CollectionState<T> {
    pub fn begin_load(&mut self) -> Ticket {
        self.status = LoadStatus::Loading;
        self.seq.issue()
    }

    /// Applies a finished load unless something newer has already been
    /// applied. A failure only surfaces when it belongs to the most recent
    /// load; an older failure is superseded by the attempt still in flight.
    pub fn complete_load(&mut self, ticket: Ticket, result: std::result::Result<Vec<T>, String>) -> bool {
        if !self.seq.is_fresh(ticket) {
            return false;
        }

        match result {
            Ok(items) => {
                self.items = items;
                self.seq.mark_applied(ticket);
                self.status = if self.seq.is_latest(ticket) {
                    LoadStatus::Ready
                } else {
                    LoadStatus::Loading
                };
                true
            }
            Err(message) if self.seq.is_latest(ticket) => {
                self.seq.mark_applied(ticket);
                self.status = LoadStatus::Failed(message);
                true
            }
            Err(_) => false,
        }
    }

    /// Installs a server-provided collection wholesale; loads still in flight
    /// become stale.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.seq.supersede();
        self.items = items;
        self.status = LoadStatus::Ready;
    }

    pub fn set_action_error(&mut self, message: Option<String>) {
        self.action_error = message;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        ListSnapshot {
            items: self.items.clone(),
            status: self.status.clone(),
            action_error: self.action_error.clone(),
        }
    }
}

pub struct ListController<K: ListKind> {
    kind: K,
    gateway: Arc<dyn EntityGateway>,
    query: Mutex<K::Query>,
    state: Mutex<CollectionState<K::Item>>,
}

pub type MeetingListController = ListController<Meetings>;
pub type NoteListController = ListController<Notes>;

impl<K: ListKind> ListController<K> {
    pub fn with_kind(kind: K, gateway: Arc<dyn EntityGateway>, query: K::Query) -> Self {
        Self {
            kind,
            gateway,
            query: Mutex::new(query),
            state: Mutex::new(CollectionState::default()),
        }
    }

    /// Fetches the whole collection for the current query. Overlapping calls
    /// are allowed; the newest result to arrive that is newer than what is
    /// shown wins.
    pub async fn load(&self) -> Result<()> {
        let query = self.query.lock().await.clone();
        let ticket = self.state.lock().await.begin_load();
        debug!("{}: load issued ticket={}", self.kind.name(), ticket.value());

        let result = self.kind.fetch(self.gateway.as_ref(), &query).await;

        let (outcome, returned) = match result {
            Ok(items) => (Ok(items), Ok(())),
            Err(err) => (Err(err.message()), Err(err)),
        };

        let mut state = self.state.lock().await;
        if state.complete_load(ticket, outcome) {
            debug!("{}: load applied ticket={}", self.kind.name(), ticket.value());
        } else {
            debug!(
                "{}: stale load discarded ticket={}",
                self.kind.name(),
                ticket.value()
            );
        }
        returned
    }

    /// Deletes on the server, then reloads. The item only leaves the list
    /// because the reload no longer contains it; a failed delete leaves the
    /// collection untouched and records the error.
    pub async fn remove(&self, id: K::Id) -> Result<()> {
        self.state.lock().await.set_action_error(None);

        if let Err(err) = self.kind.delete(self.gateway.as_ref(), id).await {
            warn!("{}: delete failed id={} error={}", self.kind.name(), id, err);
            self.state
                .lock()
                .await
                .set_action_error(Some(err.message()));
            return Err(err);
        }

        info!("{}: deleted id={}", self.kind.name(), id);
        self.load().await
    }

    pub async fn replace_all(&self, items: Vec<K::Item>) {
        self.state.lock().await.replace_all(items);
    }

    pub async fn snapshot(&self) -> ListSnapshot<K::Item> {
        self.state.lock().await.snapshot()
    }

    pub async fn items(&self) -> Vec<K::Item> {
        self.state.lock().await.items().to_vec()
    }

    pub async fn status(&self) -> LoadStatus {
        self.state.lock().await.status().clone()
    }

    pub async fn find(&self, id: K::Id) -> Option<K::Item> {
        let state = self.state.lock().await;
        state
            .items()
            .iter()
            .find(|item| self.kind.id_of(item) == id)
            .cloned()
    }

    async fn after_mutation<T>(&self, what: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                // The mutation stands even if the refresh fails; the load
                // status carries that failure.
                if let Err(err) = self.load().await {
                    warn!("{}: reload after {} failed error={}", self.kind.name(), what, err);
                }
                Ok(value)
            }
            Err(err) => {
                warn!("{}: {} failed error={}", self.kind.name(), what, err);
                self.state
                    .lock()
                    .await
                    .set_action_error(Some(err.message()));
                Err(err)
            }
        }
    }
}

impl ListController<Meetings> {
    pub fn new(gateway: Arc<dyn EntityGateway>, sort: SortController) -> Self {
        Self::with_kind(Meetings, gateway, sort)
    }

    pub async fn sort(&self) -> SortController {
        *self.query.lock().await
    }

    /// Applies the sort toggle and reloads with the new state as the
    /// server-side ordering parameters.
    pub async fn select_sort_column(&self, column: SortColumn) -> Result<()> {
        let sort = {
            let mut sort = self.query.lock().await;
            sort.select_column(column);
            *sort
        };
        info!("meetings: sort changed column={} order={}", sort.column(), sort.order());
        self.load().await
    }

    pub async fn create(&self, input: MeetingInput) -> Result<Meeting> {
        self.state.lock().await.set_action_error(None);
        input.validate()?;
        let result = self.gateway.create_meeting(&input).await;
        self.after_mutation("create", result).await
    }

    pub async fn update(&self, id: MeetingId, input: MeetingInput) -> Result<Meeting> {
        self.state.lock().await.set_action_error(None);
        input.validate()?;
        let result = self.gateway.update_meeting(id, &input).await;
        self.after_mutation("update", result).await
    }
}

impl ListController<Notes> {
    pub fn new(gateway: Arc<dyn EntityGateway>, meeting_id: MeetingId) -> Self {
        Self::with_kind(Notes, gateway, meeting_id)
    }

    pub async fn meeting_id(&self) -> MeetingId {
        *self.query.lock().await
    }

    pub async fn create(&self, content: &str) -> Result<Note> {
        self.state.lock().await.set_action_error(None);
        validate_note_content(content)?;
        let request = CreateNoteRequest {
            meeting_id: self.meeting_id().await,
            content: content.to_string(),
        };
        let result = self.gateway.create_note(&request).await;
        self.after_mutation("create", result).await
    }

    pub async fn update(&self, id: NoteId, content: &str) -> Result<Note> {
        self.state.lock().await.set_action_error(None);
        validate_note_content(content)?;
        let result = self.gateway.update_note(id, content).await;
        self.after_mutation("update", result).await
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
