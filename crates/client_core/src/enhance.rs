//! AI enhancement with single-level undo, shared by note content and
//! meeting summaries.
//!
//! Each target id owns one [`TargetFlow`]. Starting an enhancement drops
//! whatever undo was available for that id; only a successful enhancement
//! makes the pre-enhancement value restorable, and only until the next
//! enhancement or a successful undo.

use std::{collections::HashMap, fmt, hash::Hash, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{MeetingId, NoteId},
    protocol::MeetingInput,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    detail::MeetingDetailController,
    error::{ClientError, Result},
    gateway::EntityGateway,
    list::NoteListController,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnhancePhase {
    #[default]
    Idle,
    /// An enhance or undo request is outstanding.
    Pending,
    /// The last enhancement landed and its input is held for undo.
    Settled,
    Failed(String),
}

/// Pure per-target state; the controller drives it around the network calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFlow<V> {
    phase: EnhancePhase,
    previous: Option<V>,
    candidate: Option<V>,
}

impl<V> Default for TargetFlow<V> {
    fn default() -> Self {
        Self {
            phase: EnhancePhase::Idle,
            previous: None,
            candidate: None,
        }
    }
}

impl<V: Clone> TargetFlow<V> {
    pub fn phase(&self) -> &EnhancePhase {
        &self.phase
    }

    pub fn previous(&self) -> Option<&V> {
        self.previous.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.previous.is_some() && self.phase != EnhancePhase::Pending
    }

    pub fn begin_enhance(&mut self, current: V) -> Result<()> {
        if self.phase == EnhancePhase::Pending {
            return Err(ClientError::precondition("a request is already in progress"));
        }
        self.previous = None;
        self.candidate = Some(current);
        self.phase = EnhancePhase::Pending;
        Ok(())
    }

    pub fn enhance_succeeded(&mut self) {
        self.previous = self.candidate.take();
        self.phase = EnhancePhase::Settled;
    }

    pub fn enhance_failed(&mut self, message: String) {
        self.previous = None;
        self.candidate = None;
        self.phase = EnhancePhase::Failed(message);
    }

    /// Returns the value to restore.
    pub fn begin_undo(&mut self) -> Result<V> {
        if self.phase == EnhancePhase::Pending {
            return Err(ClientError::precondition("a request is already in progress"));
        }
        let previous = self
            .previous
            .clone()
            .ok_or_else(|| ClientError::precondition("nothing to undo"))?;
        self.phase = EnhancePhase::Pending;
        Ok(previous)
    }

    pub fn undo_succeeded(&mut self) {
        self.previous = None;
        self.phase = EnhancePhase::Idle;
    }

    /// The undo slot survives so the user can retry.
    pub fn undo_failed(&mut self, message: String) {
        self.phase = EnhancePhase::Failed(message);
    }
}

/// Something an enhancement can rewrite and an undo can put back.
#[async_trait]
pub trait EnhancementTarget: Send + Sync + 'static {
    type Id: Copy + Eq + Hash + fmt::Display + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    /// The value as the owning view currently shows it.
    async fn current(&self, id: Self::Id) -> Result<Self::Value>;

    /// Produces, persists and re-displays the enhanced value.
    async fn enhance(&self, id: Self::Id, current: &Self::Value) -> Result<()>;

    /// Persists `previous` and re-displays it.
    async fn restore(&self, id: Self::Id, previous: &Self::Value) -> Result<()>;
}

/// Note content rewritten by the enhancement endpoint. The endpoint only
/// returns text, so the result is saved with a regular update and the
/// list refreshed from the server.
pub struct NoteEnhancement {
    gateway: Arc<dyn EntityGateway>,
    notes: Arc<NoteListController>,
}

impl NoteEnhancement {
    pub fn new(gateway: Arc<dyn EntityGateway>, notes: Arc<NoteListController>) -> Self {
        Self { gateway, notes }
    }

    async fn refresh(&self) {
        if let Err(err) = self.notes.load().await {
            warn!("notes: refresh after enhancement failed error={err}");
        }
    }
}

#[async_trait]
impl EnhancementTarget for NoteEnhancement {
    type Id = NoteId;
    type Value = String;

    fn name(&self) -> &'static str {
        "note"
    }

    async fn current(&self, id: NoteId) -> Result<String> {
        self.notes
            .find(id)
            .await
            .map(|note| note.content)
            .ok_or_else(|| ClientError::precondition(format!("note {id} is not loaded")))
    }

    async fn enhance(&self, id: NoteId, current: &String) -> Result<()> {
        let enhanced = self.gateway.enhance_note(id, current).await?;
        self.gateway.update_note(id, &enhanced).await?;
        self.refresh().await;
        Ok(())
    }

    async fn restore(&self, id: NoteId, previous: &String) -> Result<()> {
        self.gateway.update_note(id, previous).await?;
        self.refresh().await;
        Ok(())
    }
}

/// Meeting summaries generated server-side from the meeting's notes. The
/// summarize call persists and returns the meeting; undo writes the old
/// summary back with a full meeting update.
pub struct MeetingSummarization {
    gateway: Arc<dyn EntityGateway>,
    detail: Arc<MeetingDetailController>,
}

impl MeetingSummarization {
    pub fn new(gateway: Arc<dyn EntityGateway>, detail: Arc<MeetingDetailController>) -> Self {
        Self { gateway, detail }
    }
}

#[async_trait]
impl EnhancementTarget for MeetingSummarization {
    type Id = MeetingId;
    type Value = Option<String>;

    fn name(&self) -> &'static str {
        "meeting"
    }

    async fn current(&self, id: MeetingId) -> Result<Option<String>> {
        self.detail
            .loaded(id)
            .await
            .map(|meeting| meeting.summary)
            .ok_or_else(|| ClientError::precondition(format!("meeting {id} is not loaded")))
    }

    async fn enhance(&self, id: MeetingId, _current: &Option<String>) -> Result<()> {
        let updated = self.gateway.summarize_meeting(id).await?;
        self.detail.replace(updated).await;
        Ok(())
    }

    async fn restore(&self, id: MeetingId, previous: &Option<String>) -> Result<()> {
        let meeting = self
            .detail
            .loaded(id)
            .await
            .ok_or_else(|| ClientError::precondition(format!("meeting {id} is not loaded")))?;
        let input = MeetingInput::from_meeting(&meeting).with_summary(previous.clone());
        let updated = self.gateway.update_meeting(id, &input).await?;
        self.detail.replace(updated).await;
        Ok(())
    }
}

pub struct EnhancementController<T: EnhancementTarget> {
    target: T,
    flows: Mutex<HashMap<T::Id, TargetFlow<T::Value>>>,
}

pub type NoteEnhancementController = EnhancementController<NoteEnhancement>;
pub type SummaryController = EnhancementController<MeetingSummarization>;

impl<T: EnhancementTarget> EnhancementController<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            flows: Mutex::new(HashMap::new()),
        }
    }

    pub async fn enhance(&self, id: T::Id) -> Result<()> {
        let current = self.target.current(id).await?;
        self.flows
            .lock()
            .await
            .entry(id)
            .or_default()
            .begin_enhance(current.clone())?;
        info!("{}: enhancement started id={id}", self.target.name());

        let result = self.target.enhance(id, &current).await;

        let mut flows = self.flows.lock().await;
        let flow = flows.entry(id).or_default();
        match result {
            Ok(()) => {
                flow.enhance_succeeded();
                info!("{}: enhancement applied id={id}", self.target.name());
                Ok(())
            }
            Err(err) => {
                flow.enhance_failed(err.message());
                warn!("{}: enhancement failed id={id} error={err}", self.target.name());
                Err(err)
            }
        }
    }

    /// Restores the value from before the last successful enhancement.
    pub async fn undo(&self, id: T::Id) -> Result<()> {
        let previous = self.flows.lock().await.entry(id).or_default().begin_undo()?;

        let result = self.target.restore(id, &previous).await;

        let mut flows = self.flows.lock().await;
        let flow = flows.entry(id).or_default();
        match result {
            Ok(()) => {
                flow.undo_succeeded();
                info!("{}: enhancement undone id={id}", self.target.name());
                Ok(())
            }
            Err(err) => {
                flow.undo_failed(err.message());
                warn!("{}: undo failed id={id} error={err}", self.target.name());
                Err(err)
            }
        }
    }

    pub async fn phase(&self, id: T::Id) -> EnhancePhase {
        self.flows
            .lock()
            .await
            .get(&id)
            .map(|flow| flow.phase().clone())
            .unwrap_or_default()
    }

    pub async fn can_undo(&self, id: T::Id) -> bool {
        self.flows
            .lock()
            .await
            .get(&id)
            .is_some_and(TargetFlow::can_undo)
    }

    pub async fn is_pending(&self, id: T::Id) -> bool {
        self.phase(id).await == EnhancePhase::Pending
    }
}

impl EnhancementController<NoteEnhancement> {
    pub fn for_notes(gateway: Arc<dyn EntityGateway>, notes: Arc<NoteListController>) -> Self {
        Self::new(NoteEnhancement::new(gateway, notes))
    }
}

impl EnhancementController<MeetingSummarization> {
    pub fn for_meeting(gateway: Arc<dyn EntityGateway>, detail: Arc<MeetingDetailController>) -> Self {
        Self::new(MeetingSummarization::new(gateway, detail))
    }
}

#[cfg(test)]
#[path = "tests/enhance_tests.rs"]
mod tests;
