use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

pub(crate) const MAX_TEXT_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) post_id: String,
    pub(crate) user_id: i64,
    /// Снимок username автора на момент создания; не пересинхронизируется.
    pub(crate) username: String,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateCommentRequest {
    pub(crate) post_id: String,
    pub(crate) text: String,
}

impl CreateCommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            post_id: normalize_post_id(&self.post_id)?,
            text: normalize_text(&self.text)?,
        })
    }
}

impl Comment {
    pub(crate) fn new(
        id: i64,
        post_id: impl Into<String>,
        user_id: i64,
        username: impl Into<String>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("user_id", user_id)?;
        let post_id = normalize_post_id(&post_id.into())?;
        let username = username.into();
        if username.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "username",
                message: "must not be empty",
            });
        }
        let text = normalize_text(&text.into())?;

        if updated_at < created_at {
            return Err(DomainError::Validation {
                field: "updated_at",
                message: "must be >= created_at",
            });
        }

        Ok(Self {
            id,
            post_id,
            user_id,
            username,
            text,
            created_at,
            updated_at,
        })
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_post_id(post_id: &str) -> Result<String, DomainError> {
    let post_id = post_id.trim();
    if post_id.is_empty() || post_id.len() > 64 {
        return Err(DomainError::Validation {
            field: "post_id",
            message: "must be 1..64 chars",
        });
    }
    Ok(post_id.to_string())
}

pub(crate) fn normalize_text(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    let chars = text.chars().count();
    if chars == 0 || chars > MAX_TEXT_CHARS {
        return Err(DomainError::Validation {
            field: "text",
            message: "must be 1..500 chars after trimming",
        });
    }
    Ok(text.to_string())
}
