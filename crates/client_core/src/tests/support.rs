//! In-memory gateway for controller tests. Responses are computed when a
//! call starts; a held call then waits on its gate before returning, which
//! lets tests force out-of-order completion.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::{
    domain::{Meeting, MeetingId, MoveDirection, Note, NoteId},
    error::ApiError,
    protocol::{
        ConfigData, ConfigUpdateRequest, CreateNoteRequest, ListMeetingsQuery, MeetingInput,
        UserInfo,
    },
};
use tokio::sync::oneshot;

use crate::{
    error::{ClientError, Result},
    gateway::EntityGateway,
};

pub fn meeting(id: i64, subject: &str) -> Meeting {
    let at = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
    Meeting {
        id: MeetingId(id),
        created_by: "dev@example.com".into(),
        subject: subject.into(),
        meeting_date: "2026-10-01".into(),
        start_time: "09:00".into(),
        end_time: None,
        participants: None,
        summary: None,
        keywords: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn note(id: i64, meeting_id: i64, note_number: u32, content: &str) -> Note {
    let at = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
    Note {
        id: NoteId(id),
        meeting_id: MeetingId(meeting_id),
        note_number,
        content: content.into(),
        created_at: at,
        updated_at: at,
    }
}

pub fn note_numbers(notes: &[Note]) -> Vec<(i64, u32)> {
    notes.iter().map(|n| (n.id.0, n.note_number)).collect()
}

#[derive(Default)]
struct FakeState {
    meetings: Vec<Meeting>,
    notes: Vec<Note>,
    config: ConfigData,
    next_id: i64,
    calls: Vec<String>,
    failures: HashMap<&'static str, VecDeque<ClientError>>,
    gates: HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>,
    enhanced_suffix: String,
    summary_text: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeGateway {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        let gateway = Self::default();
        {
            let mut state = gateway.inner.lock().unwrap();
            state.next_id = 1000;
            state.enhanced_suffix = " (enhanced)".into();
        }
        gateway
    }

    pub fn with_meetings(self, meetings: Vec<Meeting>) -> Self {
        self.set_meetings(meetings);
        self
    }

    pub fn with_notes(self, notes: Vec<Note>) -> Self {
        self.inner.lock().unwrap().notes = notes;
        self
    }

    pub fn set_meetings(&self, meetings: Vec<Meeting>) {
        self.inner.lock().unwrap().meetings = meetings;
    }

    pub fn set_summary_text(&self, summary: &str) {
        self.inner.lock().unwrap().summary_text = Some(summary.to_string());
    }

    pub fn stored_note(&self, id: i64) -> Option<Note> {
        self.inner
            .lock()
            .unwrap()
            .notes
            .iter()
            .find(|n| n.id.0 == id)
            .cloned()
    }

    pub fn stored_meeting(&self, id: i64) -> Option<Meeting> {
        self.inner
            .lock()
            .unwrap()
            .meetings
            .iter()
            .find(|m| m.id.0 == id)
            .cloned()
    }

    pub fn config(&self) -> ConfigData {
        self.inner.lock().unwrap().config.clone()
    }

    /// Every call made so far, e.g. `"search:abc"`.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, op: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.split(':').next() == Some(op))
            .collect()
    }

    pub fn fail_next(&self, op: &'static str, status: u16, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(ClientError::Server(ApiError::new(status, message)));
    }

    pub fn fail_next_transport(&self, op: &'static str) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(ClientError::Transport("request failed: connection refused".into()));
    }

    /// Holds the next call to `op` until the returned sender fires.
    pub fn hold(&self, op: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap()
            .gates
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    fn begin(&self, op: &'static str, detail: String) -> (Option<ClientError>, Option<oneshot::Receiver<()>>) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(if detail.is_empty() {
            op.to_string()
        } else {
            format!("{op}:{detail}")
        });
        let failure = state.failures.get_mut(op).and_then(VecDeque::pop_front);
        let gate = state.gates.get_mut(op).and_then(VecDeque::pop_front);
        (failure, gate)
    }

    /// Computes the outcome at call time, then waits for the gate (if any).
    async fn run<T>(
        &self,
        op: &'static str,
        detail: String,
        compute: impl FnOnce(&mut FakeState) -> Result<T>,
    ) -> Result<T> {
        let (failure, gate) = self.begin(op, detail);
        let outcome = match failure {
            Some(err) => Err(err),
            None => {
                let mut state = self.inner.lock().unwrap();
                compute(&mut state)
            }
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        outcome
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::Server(ApiError::new(404, format!("{what} not found")))
}

fn renumber(state: &mut FakeState, meeting_id: MeetingId) -> Vec<Note> {
    let mut siblings: Vec<Note> = state
        .notes
        .iter()
        .filter(|n| n.meeting_id == meeting_id)
        .cloned()
        .collect();
    siblings.sort_by_key(|n| n.note_number);
    for (index, sibling) in siblings.iter_mut().enumerate() {
        sibling.note_number = index as u32 + 1;
    }
    state.notes.retain(|n| n.meeting_id != meeting_id);
    state.notes.extend(siblings.iter().cloned());
    siblings
}

#[async_trait]
impl EntityGateway for FakeGateway {
    async fn list_meetings(&self, query: ListMeetingsQuery) -> Result<Vec<Meeting>> {
        self.run(
            "list_meetings",
            format!("{}/{}", query.sort, query.order),
            |state| Ok(state.meetings.clone()),
        )
        .await
    }

    async fn get_meeting(&self, id: MeetingId) -> Result<Meeting> {
        self.run("get_meeting", id.to_string(), |state| {
            state
                .meetings
                .iter()
                .find(|m| m.id == id)
                .cloned()
                .ok_or_else(|| not_found("meeting"))
        })
        .await
    }

    async fn create_meeting(&self, input: &MeetingInput) -> Result<Meeting> {
        let input = input.clone();
        self.run("create_meeting", input.subject.clone(), |state| {
            state.next_id += 1;
            let mut created = meeting(state.next_id, &input.subject);
            created.meeting_date = input.meeting_date;
            created.start_time = input.start_time;
            state.meetings.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update_meeting(&self, id: MeetingId, input: &MeetingInput) -> Result<Meeting> {
        let input = input.clone();
        self.run("update_meeting", id.to_string(), |state| {
            let existing = state
                .meetings
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| not_found("meeting"))?;
            existing.subject = input.subject;
            existing.meeting_date = input.meeting_date;
            existing.start_time = input.start_time;
            existing.end_time = input.end_time;
            existing.participants = input.participants;
            existing.summary = input.summary;
            existing.keywords = input.keywords;
            Ok(existing.clone())
        })
        .await
    }

    async fn delete_meeting(&self, id: MeetingId) -> Result<()> {
        self.run("delete_meeting", id.to_string(), |state| {
            let before = state.meetings.len();
            state.meetings.retain(|m| m.id != id);
            if state.meetings.len() == before {
                return Err(not_found("meeting"));
            }
            state.notes.retain(|n| n.meeting_id != id);
            Ok(())
        })
        .await
    }

    async fn search_meetings(&self, query: &str) -> Result<Vec<Meeting>> {
        let needle = query.to_lowercase();
        self.run("search", query.to_string(), move |state| {
            Ok(state
                .meetings
                .iter()
                .filter(|m| m.subject.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        })
        .await
    }

    async fn summarize_meeting(&self, id: MeetingId) -> Result<Meeting> {
        self.run("summarize", id.to_string(), |state| {
            let note_count = state.notes.iter().filter(|n| n.meeting_id == id).count();
            let summary = state
                .summary_text
                .clone()
                .unwrap_or_else(|| format!("Summary of {note_count} notes"));
            let existing = state
                .meetings
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| not_found("meeting"))?;
            existing.summary = Some(summary);
            Ok(existing.clone())
        })
        .await
    }

    async fn list_notes(&self, meeting_id: MeetingId) -> Result<Vec<Note>> {
        self.run("list_notes", meeting_id.to_string(), |state| {
            let mut notes: Vec<Note> = state
                .notes
                .iter()
                .filter(|n| n.meeting_id == meeting_id)
                .cloned()
                .collect();
            notes.sort_by_key(|n| n.note_number);
            Ok(notes)
        })
        .await
    }

    async fn get_note(&self, id: NoteId) -> Result<Note> {
        self.run("get_note", id.to_string(), |state| {
            state
                .notes
                .iter()
                .find(|n| n.id == id)
                .cloned()
                .ok_or_else(|| not_found("note"))
        })
        .await
    }

    async fn create_note(&self, request: &CreateNoteRequest) -> Result<Note> {
        let request = request.clone();
        self.run("create_note", request.meeting_id.to_string(), |state| {
            state.next_id += 1;
            let position = state
                .notes
                .iter()
                .filter(|n| n.meeting_id == request.meeting_id)
                .count() as u32
                + 1;
            let created = note(state.next_id, request.meeting_id.0, position, &request.content);
            state.notes.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update_note(&self, id: NoteId, content: &str) -> Result<Note> {
        let content = content.to_string();
        self.run("update_note", format!("{id}={content}"), |state| {
            let existing = state
                .notes
                .iter_mut()
                .find(|n| n.id == id)
                .ok_or_else(|| not_found("note"))?;
            existing.content = content;
            Ok(existing.clone())
        })
        .await
    }

    async fn delete_note(&self, id: NoteId) -> Result<()> {
        self.run("delete_note", id.to_string(), |state| {
            let meeting_id = state
                .notes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.meeting_id)
                .ok_or_else(|| not_found("note"))?;
            state.notes.retain(|n| n.id != id);
            renumber(state, meeting_id);
            Ok(())
        })
        .await
    }

    async fn enhance_note(&self, id: NoteId, content: &str) -> Result<String> {
        let content = content.to_string();
        self.run("enhance", id.to_string(), move |state| {
            if !state.notes.iter().any(|n| n.id == id) {
                return Err(not_found("note"));
            }
            Ok(format!("{content}{}", state.enhanced_suffix))
        })
        .await
    }

    async fn reorder_note(&self, id: NoteId, direction: MoveDirection) -> Result<Vec<Note>> {
        self.run("reorder", format!("{id}/{direction}"), |state| {
            let meeting_id = state
                .notes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.meeting_id)
                .ok_or_else(|| not_found("note"))?;
            let mut siblings = renumber(state, meeting_id);
            let index = siblings
                .iter()
                .position(|n| n.id == id)
                .ok_or_else(|| not_found("note"))?;
            let other = match direction {
                MoveDirection::Up if index == 0 => {
                    return Err(ClientError::Server(ApiError::new(400, "note is already first")))
                }
                MoveDirection::Down if index + 1 == siblings.len() => {
                    return Err(ClientError::Server(ApiError::new(400, "note is already last")))
                }
                MoveDirection::Up => index - 1,
                MoveDirection::Down => index + 1,
            };
            let moved = siblings[index].note_number;
            siblings[index].note_number = siblings[other].note_number;
            siblings[other].note_number = moved;
            state.notes.retain(|n| n.meeting_id != meeting_id);
            state.notes.extend(siblings.iter().cloned());
            Ok(renumber(state, meeting_id))
        })
        .await
    }

    async fn get_config(&self) -> Result<ConfigData> {
        self.run("get_config", String::new(), |state| Ok(state.config.clone()))
            .await
    }

    async fn update_config(&self, request: &ConfigUpdateRequest) -> Result<ConfigData> {
        let request = request.clone();
        self.run("update_config", String::new(), |state| {
            if !request.llm_provider_url.is_empty() {
                state.config.llm_provider_url = request.llm_provider_url;
            }
            if !request.llm_api_key.is_empty() {
                state.config.llm_api_key = request.llm_api_key;
            }
            if !request.llm_model.is_empty() {
                state.config.llm_model = request.llm_model;
            }
            if !request.language.is_empty() {
                state.config.language = request.language;
            }
            Ok(state.config.clone())
        })
        .await
    }

    async fn whoami(&self) -> Result<UserInfo> {
        self.run("whoami", String::new(), |_| {
            Ok(UserInfo {
                display_name: "Dev User".into(),
                login_name: "dev@example.com".into(),
                profile_pic_url: String::new(),
                node_name: "dev-machine".into(),
                node_id: "dev-node-12345".into(),
            })
        })
        .await
    }
}
