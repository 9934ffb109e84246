//! JSON bodies exchanged with HTTP clients.

use p2c_core::OutputMode;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /compile`.
///
/// Missing or `null` fields fall back to an empty program and mode `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompileRequest {
    #[serde(deserialize_with = "deserialize_code")]
    pub code: String,
    #[serde(deserialize_with = "deserialize_mode")]
    pub mode: OutputMode,
}

/// Successful compile response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub result: String,
}

/// Failed compile response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

fn deserialize_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_mode<'de, D>(deserializer: D) -> Result<OutputMode, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<u8>::deserialize(deserializer)? {
        Some(value) => OutputMode::try_from(value).map_err(serde::de::Error::custom),
        None => Ok(OutputMode::default()),
    }
}
