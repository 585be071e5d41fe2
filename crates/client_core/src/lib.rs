use std::sync::Arc;

pub mod config;
pub mod detail;
pub mod enhance;
pub mod error;
pub mod gateway;
pub mod list;
pub mod preferences;
pub mod reorder;
pub mod search;
pub mod sort;
pub mod state;

pub use config::{load_settings, normalize_server_url, ClientSettings};
pub use detail::{DetailSnapshot, MeetingDetailController, NoteDetailController};
pub use enhance::{
    EnhancePhase, EnhancementController, EnhancementTarget, NoteEnhancementController,
    SummaryController,
};
pub use error::{ClientError, Result};
pub use gateway::{EntityGateway, HttpGateway};
pub use list::{ListSnapshot, MeetingListController, NoteListController};
pub use preferences::PreferencesController;
pub use reorder::{MoveOutcome, ReorderController};
pub use search::{highlight_ranges, truncate_summary, SearchController, SearchSnapshot};
pub use sort::SortController;
pub use state::LoadStatus;

use shared::domain::MeetingId;
use tracing::info;

/// Shared gateway plus settings; hands out controllers that all talk to
/// the same server.
#[derive(Clone)]
pub struct NotebookClient {
    gateway: Arc<dyn EntityGateway>,
    settings: ClientSettings,
}

impl NotebookClient {
    pub fn connect(settings: ClientSettings) -> Result<Self> {
        let gateway = HttpGateway::with_timeout(&settings.server_url, settings.request_timeout())?;
        info!(
            "client: configured server_url={} timeout_secs={}",
            settings.server_url, settings.request_timeout_secs
        );
        Ok(Self::with_gateway(Arc::new(gateway), settings))
    }

    pub fn with_gateway(gateway: Arc<dyn EntityGateway>, settings: ClientSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn gateway(&self) -> Arc<dyn EntityGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn meetings(&self) -> MeetingListController {
        let sort = SortController::new(
            self.settings.default_sort_column,
            self.settings.default_sort_order,
        );
        MeetingListController::new(self.gateway(), sort)
    }

    pub fn notes(&self, meeting_id: MeetingId) -> Arc<NoteListController> {
        Arc::new(NoteListController::new(self.gateway(), meeting_id))
    }

    pub fn meeting_detail(&self) -> Arc<MeetingDetailController> {
        Arc::new(MeetingDetailController::new(self.gateway()))
    }

    pub fn note_detail(&self) -> NoteDetailController {
        NoteDetailController::new(self.gateway())
    }

    pub fn search(&self) -> Arc<SearchController> {
        SearchController::new(self.gateway(), self.settings.search_debounce())
    }

    pub fn reorder(&self, notes: &Arc<NoteListController>) -> ReorderController {
        ReorderController::new(self.gateway(), Arc::clone(notes))
    }

    pub fn note_enhancement(&self, notes: &Arc<NoteListController>) -> NoteEnhancementController {
        NoteEnhancementController::for_notes(self.gateway(), Arc::clone(notes))
    }

    pub fn summaries(&self, detail: &Arc<MeetingDetailController>) -> SummaryController {
        SummaryController::for_meeting(self.gateway(), Arc::clone(detail))
    }

    pub fn preferences(&self, language: impl Into<String>) -> PreferencesController {
        PreferencesController::new(self.gateway(), language)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
