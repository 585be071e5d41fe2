use serde::{Deserialize, Serialize};

use crate::domain::{Meeting, MeetingId, MoveDirection, SortColumn, SortOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListMeetingsQuery {
    pub sort: SortColumn,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Body of `POST /api/meetings` and `PUT /api/meetings/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingInput {
    pub subject: String,
    pub meeting_date: String,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl MeetingInput {
    pub fn from_meeting(meeting: &Meeting) -> Self {
        Self {
            subject: meeting.subject.clone(),
            meeting_date: meeting.meeting_date.clone(),
            start_time: meeting.start_time.clone(),
            end_time: meeting.end_time.clone(),
            participants: meeting.participants.clone(),
            summary: meeting.summary.clone(),
            keywords: meeting.keywords.clone(),
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub meeting_id: MeetingId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceNoteRequest {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceNoteResponse {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderNoteRequest {
    pub direction: MoveDirection,
}

/// `GET /api/config` response. The API key arrives masked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default)]
    pub llm_provider_url: String,
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default)]
    pub llm_model: String,
    #[serde(default)]
    pub language: String,
}

/// `PUT /api/config` body. Empty fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdateRequest {
    pub llm_provider_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub language: String,
}

impl ConfigUpdateRequest {
    /// Builds an update from an edited form. An API key equal to the masked
    /// value originally loaded is sent empty so the stored key survives.
    pub fn from_edit(edited: &ConfigData, original_masked_key: &str) -> Self {
        let llm_api_key = if edited.llm_api_key == original_masked_key {
            String::new()
        } else {
            edited.llm_api_key.clone()
        };
        Self {
            llm_provider_url: edited.llm_provider_url.clone(),
            llm_api_key,
            llm_model: edited.llm_model.clone(),
            language: edited.language.clone(),
        }
    }

    pub fn language_only(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub display_name: String,
    pub login_name: String,
    #[serde(rename = "profilePicURL", default)]
    pub profile_pic_url: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(rename = "nodeID", default)]
    pub node_id: String,
}
