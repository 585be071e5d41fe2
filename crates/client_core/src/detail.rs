//! Single-entity views (meeting detail, note edit form) with the same
//! loading/error/sequence discipline as the lists.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use shared::domain::{Meeting, MeetingId, Note, NoteId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    error::Result,
    gateway::EntityGateway,
    state::{LoadStatus, Sequencer},
};

#[async_trait]
pub trait DetailKind: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Id: Copy + Eq + fmt::Display + Send + Sync + 'static;

    fn name(&self) -> &'static str;
    fn id_of(&self, item: &Self::Item) -> Self::Id;
    async fn fetch(&self, gateway: &dyn EntityGateway, id: Self::Id) -> Result<Self::Item>;
}

pub struct MeetingDetail;

#[async_trait]
impl DetailKind for MeetingDetail {
    type Item = Meeting;
    type Id = MeetingId;

    fn name(&self) -> &'static str {
        "meeting"
    }

    fn id_of(&self, item: &Meeting) -> MeetingId {
        item.id
    }

    async fn fetch(&self, gateway: &dyn EntityGateway, id: MeetingId) -> Result<Meeting> {
        gateway.get_meeting(id).await
    }
}

pub struct NoteDetail;

#[async_trait]
impl DetailKind for NoteDetail {
    type Item = Note;
    type Id = NoteId;

    fn name(&self) -> &'static str {
        "note"
    }

    fn id_of(&self, item: &Note) -> NoteId {
        item.id
    }

    async fn fetch(&self, gateway: &dyn EntityGateway, id: NoteId) -> Result<Note> {
        gateway.get_note(id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSnapshot<T> {
    pub entity: Option<T>,
    pub status: LoadStatus,
}

struct DetailState<T> {
    entity: Option<T>,
    status: LoadStatus,
    seq: Sequencer,
}

pub struct DetailController<K: DetailKind> {
    kind: K,
    gateway: Arc<dyn EntityGateway>,
    state: Mutex<DetailState<K::Item>>,
}

pub type MeetingDetailController = DetailController<MeetingDetail>;
pub type NoteDetailController = DetailController<NoteDetail>;

impl<K: DetailKind> DetailController<K> {
    pub fn with_kind(kind: K, gateway: Arc<dyn EntityGateway>) -> Self {
        Self {
            kind,
            gateway,
            state: Mutex::new(DetailState {
                entity: None,
                status: LoadStatus::Idle,
                seq: Sequencer::default(),
            }),
        }
    }

    /// Only the most recently requested id may land; switching entities
    /// quickly never shows an earlier one.
    pub async fn load(&self, id: K::Id) -> Result<()> {
        let ticket = {
            let mut state = self.state.lock().await;
            state.status = LoadStatus::Loading;
            state.seq.issue()
        };

        let result = self.kind.fetch(self.gateway.as_ref(), id).await;

        let mut state = self.state.lock().await;
        if !state.seq.is_latest(ticket) {
            debug!("{}: stale detail discarded id={id}", self.kind.name());
            return result.map(|_| ());
        }
        state.seq.mark_applied(ticket);
        match result {
            Ok(entity) => {
                state.entity = Some(entity);
                state.status = LoadStatus::Ready;
                Ok(())
            }
            Err(err) => {
                state.status = LoadStatus::Failed(err.message());
                Err(err)
            }
        }
    }

    /// Installs an entity the server just returned; pending loads go stale.
    pub async fn replace(&self, entity: K::Item) {
        let mut state = self.state.lock().await;
        state.seq.supersede();
        state.entity = Some(entity);
        state.status = LoadStatus::Ready;
    }

    pub async fn entity(&self) -> Option<K::Item> {
        self.state.lock().await.entity.clone()
    }

    /// The loaded entity, if it is the one with `id`.
    pub async fn loaded(&self, id: K::Id) -> Option<K::Item> {
        self.state
            .lock()
            .await
            .entity
            .as_ref()
            .filter(|entity| self.kind.id_of(entity) == id)
            .cloned()
    }

    pub async fn snapshot(&self) -> DetailSnapshot<K::Item> {
        let state = self.state.lock().await;
        DetailSnapshot {
            entity: state.entity.clone(),
            status: state.status.clone(),
        }
    }
}

impl DetailController<MeetingDetail> {
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self::with_kind(MeetingDetail, gateway)
    }
}

impl DetailController<NoteDetail> {
    pub fn new(gateway: Arc<dyn EntityGateway>) -> Self {
        Self::with_kind(NoteDetail, gateway)
    }
}
