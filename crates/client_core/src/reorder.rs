use std::sync::Arc;

use shared::domain::{MoveDirection, NoteId};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, Result},
    gateway::EntityGateway,
    list::NoteListController,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The server moved the note; the local sequence now mirrors its answer.
    Moved,
    /// The server refused because the note already sits at that edge.
    AtBoundary,
}

/// Server rejections for a move past the first/last position.
pub fn is_boundary_rejection(err: &ClientError) -> bool {
    match err {
        ClientError::Server(api) if api.status == 400 => {
            let message = api.message.to_ascii_lowercase();
            message.contains("already first") || message.contains("already last")
        }
        _ => false,
    }
}

pub struct ReorderController {
    gateway: Arc<dyn EntityGateway>,
    notes: Arc<NoteListController>,
    // Held for the whole round trip so rapid clicks reach the server one
    // after another, each against the order the previous one produced.
    in_flight: Mutex<()>,
    moving: Mutex<Option<NoteId>>,
    last_error: Mutex<Option<String>>,
}

impl ReorderController {
    pub fn new(gateway: Arc<dyn EntityGateway>, notes: Arc<NoteListController>) -> Self {
        Self {
            gateway,
            notes,
            in_flight: Mutex::new(()),
            moving: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Asks the server to move one note and installs the full sequence it
    /// returns. Position is never checked or computed locally.
    pub async fn move_note(&self, note_id: NoteId, direction: MoveDirection) -> Result<MoveOutcome> {
        let _serialized = self.in_flight.lock().await;
        *self.moving.lock().await = Some(note_id);
        *self.last_error.lock().await = None;

        let result = self.gateway.reorder_note(note_id, direction).await;
        *self.moving.lock().await = None;

        match result {
            Ok(notes) => {
                info!(
                    "notes: reorder applied note={note_id} direction={direction} count={}",
                    notes.len()
                );
                self.notes.replace_all(notes).await;
                Ok(MoveOutcome::Moved)
            }
            Err(err) if is_boundary_rejection(&err) => {
                debug!("notes: reorder at boundary note={note_id} direction={direction}");
                Ok(MoveOutcome::AtBoundary)
            }
            Err(err) => {
                warn!("notes: reorder failed note={note_id} direction={direction} error={err}");
                *self.last_error.lock().await = Some(err.message());
                Err(err)
            }
        }
    }

    pub async fn moving(&self) -> Option<NoteId> {
        *self.moving.lock().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }
}

#[cfg(test)]
#[path = "tests/reorder_tests.rs"]
mod tests;
