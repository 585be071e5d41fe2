//! Entity Gateway: one typed call per server operation, no state.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Meeting, MeetingId, MoveDirection, Note, NoteId},
    error::ApiError,
    protocol::{
        ConfigData, ConfigUpdateRequest, CreateNoteRequest, EnhanceNoteRequest,
        EnhanceNoteResponse, ListMeetingsQuery, MeetingInput, ReorderNoteRequest, SearchQuery,
        UpdateNoteRequest, UserInfo,
    },
};
use tracing::debug;

use crate::error::Result;

#[async_trait]
pub trait EntityGateway: Send + Sync {
    async fn list_meetings(&self, query: ListMeetingsQuery) -> Result<Vec<Meeting>>;
    async fn get_meeting(&self, id: MeetingId) -> Result<Meeting>;
    async fn create_meeting(&self, input: &MeetingInput) -> Result<Meeting>;
    async fn update_meeting(&self, id: MeetingId, input: &MeetingInput) -> Result<Meeting>;
    async fn delete_meeting(&self, id: MeetingId) -> Result<()>;
    /// A blank query short-circuits to an empty result without a request.
    async fn search_meetings(&self, query: &str) -> Result<Vec<Meeting>>;
    async fn summarize_meeting(&self, id: MeetingId) -> Result<Meeting>;

    async fn list_notes(&self, meeting_id: MeetingId) -> Result<Vec<Note>>;
    async fn get_note(&self, id: NoteId) -> Result<Note>;
    async fn create_note(&self, request: &CreateNoteRequest) -> Result<Note>;
    async fn update_note(&self, id: NoteId, content: &str) -> Result<Note>;
    async fn delete_note(&self, id: NoteId) -> Result<()>;
    /// Returns enhanced text only; nothing is persisted by this call.
    async fn enhance_note(&self, id: NoteId, content: &str) -> Result<String>;
    /// Returns the meeting's full note list in its new order.
    async fn reorder_note(&self, id: NoteId, direction: MoveDirection) -> Result<Vec<Note>>;

    async fn get_config(&self) -> Result<ConfigData>;
    async fn update_config(&self, request: &ConfigUpdateRequest) -> Result<ConfigData>;
    async fn whoami(&self) -> Result<UserInfo>;
}

pub struct HttpGateway {
    http: Client,
    server_url: String,
}

impl HttpGateway {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }

    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            server_url: server_url.into(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status.as_u16(), status.canonical_reason(), &body);
        debug!("gateway: request failed status={} message={}", err.status, err.message);
        Err(err.into())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl EntityGateway for HttpGateway {
    async fn list_meetings(&self, query: ListMeetingsQuery) -> Result<Vec<Meeting>> {
        debug!("gateway: list meetings sort={} order={}", query.sort, query.order);
        self.fetch(self.http.get(self.url("/api/meetings")).query(&query))
            .await
    }

    async fn get_meeting(&self, id: MeetingId) -> Result<Meeting> {
        self.fetch(self.http.get(self.url(&format!("/api/meetings/{id}"))))
            .await
    }

    async fn create_meeting(&self, input: &MeetingInput) -> Result<Meeting> {
        self.fetch(self.http.post(self.url("/api/meetings")).json(input))
            .await
    }

    async fn update_meeting(&self, id: MeetingId, input: &MeetingInput) -> Result<Meeting> {
        self.fetch(
            self.http
                .put(self.url(&format!("/api/meetings/{id}")))
                .json(input),
        )
        .await
    }

    async fn delete_meeting(&self, id: MeetingId) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/api/meetings/{id}"))))
            .await?;
        Ok(())
    }

    async fn search_meetings(&self, query: &str) -> Result<Vec<Meeting>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        debug!("gateway: search query={query:?}");
        self.fetch(self.http.get(self.url("/api/search")).query(&SearchQuery {
            q: query.to_string(),
        }))
        .await
    }

    async fn summarize_meeting(&self, id: MeetingId) -> Result<Meeting> {
        self.fetch(
            self.http
                .post(self.url(&format!("/api/meetings/{id}/summarize")))
                .json(&serde_json::json!({})),
        )
        .await
    }

    async fn list_notes(&self, meeting_id: MeetingId) -> Result<Vec<Note>> {
        self.fetch(
            self.http
                .get(self.url(&format!("/api/meetings/{meeting_id}/notes"))),
        )
        .await
    }

    async fn get_note(&self, id: NoteId) -> Result<Note> {
        self.fetch(self.http.get(self.url(&format!("/api/notes/{id}"))))
            .await
    }

    async fn create_note(&self, request: &CreateNoteRequest) -> Result<Note> {
        self.fetch(self.http.post(self.url("/api/notes")).json(request))
            .await
    }

    async fn update_note(&self, id: NoteId, content: &str) -> Result<Note> {
        self.fetch(
            self.http
                .put(self.url(&format!("/api/notes/{id}")))
                .json(&UpdateNoteRequest {
                    content: content.to_string(),
                }),
        )
        .await
    }

    async fn delete_note(&self, id: NoteId) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/api/notes/{id}"))))
            .await?;
        Ok(())
    }

    async fn enhance_note(&self, id: NoteId, content: &str) -> Result<String> {
        let body: EnhanceNoteResponse = self
            .fetch(
                self.http
                    .post(self.url(&format!("/api/notes/{id}/enhance")))
                    .json(&EnhanceNoteRequest {
                        content: content.to_string(),
                    }),
            )
            .await?;
        Ok(body.content)
    }

    async fn reorder_note(&self, id: NoteId, direction: MoveDirection) -> Result<Vec<Note>> {
        debug!("gateway: reorder note={id} direction={direction}");
        self.fetch(
            self.http
                .put(self.url(&format!("/api/notes/{id}/reorder")))
                .json(&ReorderNoteRequest { direction }),
        )
        .await
    }

    async fn get_config(&self) -> Result<ConfigData> {
        self.fetch(self.http.get(self.url("/api/config"))).await
    }

    async fn update_config(&self, request: &ConfigUpdateRequest) -> Result<ConfigData> {
        self.fetch(self.http.put(self.url("/api/config")).json(request))
            .await
    }

    async fn whoami(&self) -> Result<UserInfo> {
        self.fetch(self.http.get(self.url("/api/whoami"))).await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
