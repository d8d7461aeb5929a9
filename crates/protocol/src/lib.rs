use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Body of every non-2xx API response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    NotLoaded,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub loaded: bool,
    pub keys: usize,
}

impl HealthReport {
    pub fn from_key_count(keys: usize) -> Self {
        let loaded = keys > 0;
        Self {
            status: if loaded {
                HealthStatus::Ok
            } else {
                HealthStatus::NotLoaded
            },
            loaded,
            keys,
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
