use crate::domain::task::{TaskDraft, TaskPatch};
use crate::error::{PaygateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Fields for the task created by a successful claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Patch payload for `update_task`.
///
/// `due_date` distinguishes three cases: the key absent leaves the value
/// unchanged, an explicit `null` clears it, a timestamp replaces it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UpdatePayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

// Only invoked when the key is present, so `null` becomes Some(None) while
// an absent key stays None via the field default.
fn double_option<'de, D>(de: D) -> std::result::Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(de).map(Some)
}

impl From<ClaimPayload> for TaskDraft {
    fn from(payload: ClaimPayload) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            due_date: payload.due_date,
        }
    }
}

impl From<UpdatePayload> for TaskPatch {
    fn from(payload: UpdatePayload) -> Self {
        Self {
            name: payload.name,
            description: payload.description,
            due_date: payload.due_date,
        }
    }
}

pub fn parse_claim(raw: &str) -> Result<ClaimPayload> {
    serde_json::from_str(raw).map_err(|e| PaygateError::InvalidPayload(e.to_string()))
}

pub fn parse_update(raw: &str) -> Result<UpdatePayload> {
    serde_json::from_str(raw).map_err(|e| PaygateError::InvalidPayload(e.to_string()))
}
