//! Field rules mirrored from the server so obviously invalid input never
//! leaves the client. The server remains the authority.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::protocol::MeetingInput;

pub const MAX_SUBJECT_LENGTH: usize = 255;
pub const MAX_PARTICIPANTS_LENGTH: usize = 1000;
pub const MAX_SUMMARY_LENGTH: usize = 10_000;
pub const MAX_KEYWORDS_LENGTH: usize = 500;
pub const MAX_NOTE_CONTENT_LENGTH: usize = 50_000;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: subject, meeting_date, start_time")]
    MissingMeetingFields,
    #[error("invalid {field} format, expected {expected}")]
    InvalidFormat {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("content is required")]
    EmptyContent,
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn check_optional_length(
    field: &'static str,
    value: Option<&String>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => check_length(field, value, max),
        None => Ok(()),
    }
}

impl MeetingInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject.trim().is_empty()
            || self.meeting_date.is_empty()
            || self.start_time.is_empty()
        {
            return Err(ValidationError::MissingMeetingFields);
        }

        NaiveDate::parse_from_str(&self.meeting_date, DATE_FORMAT).map_err(|_| {
            ValidationError::InvalidFormat {
                field: "meeting_date",
                expected: "YYYY-MM-DD",
            }
        })?;
        NaiveTime::parse_from_str(&self.start_time, TIME_FORMAT).map_err(|_| {
            ValidationError::InvalidFormat {
                field: "start_time",
                expected: "HH:MM",
            }
        })?;
        if let Some(end_time) = self.end_time.as_deref().filter(|v| !v.is_empty()) {
            NaiveTime::parse_from_str(end_time, TIME_FORMAT).map_err(|_| {
                ValidationError::InvalidFormat {
                    field: "end_time",
                    expected: "HH:MM",
                }
            })?;
        }

        check_length("subject", &self.subject, MAX_SUBJECT_LENGTH)?;
        check_optional_length(
            "participants",
            self.participants.as_ref(),
            MAX_PARTICIPANTS_LENGTH,
        )?;
        check_optional_length("summary", self.summary.as_ref(), MAX_SUMMARY_LENGTH)?;
        check_optional_length("keywords", self.keywords.as_ref(), MAX_KEYWORDS_LENGTH)?;
        Ok(())
    }
}

pub fn validate_note_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    check_length("content", content, MAX_NOTE_CONTENT_LENGTH)
}
