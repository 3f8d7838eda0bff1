//! Host <-> view message protocol.
//!
//! Both directions carry JSON records discriminated by a `command` field.
//! Sends are fire-and-forget; the view never waits on a reply.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CatalogEntry, ResultRow};

/// Scope option standing for "every namespace".
pub const ALL_NAMESPACES: &str = "All namespaces";

/// Outbound messages (view -> host).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Intent {
    /// Sent once when the view starts.
    Ready,
    /// Request schema and rows for one catalog entry.
    Select {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<u64>,
    },
    /// Change the namespace scope of the instance table.
    SetScope {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<u64>,
    },
    /// Row action: open one instance as YAML. Carries identifying values, not a row index.
    OpenInstance {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
    },
    /// Open the raw schema text of the current selection.
    OpenSchema,
}

/// Inbound messages (host -> view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostEvent {
    /// Populates the scope selection control.
    Init {
        options: Vec<String>,
        #[serde(rename = "selectedOption", default, skip_serializing_if = "Option::is_none")]
        selected_option: Option<String>,
    },
    /// The selectable resource types.
    Catalog { entries: Vec<CatalogEntry> },
    /// Blank rows and columns and show a loading indicator.
    Clear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<u64>,
    },
    Results {
        columns: Vec<String>,
        rows: Vec<ResultRow>,
        #[serde(default)]
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<u64>,
    },
    /// Schema payload for the tree view.
    ResourceData {
        details: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(rename = "rawText", default)]
        raw_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<u64>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<u64>,
    },
}

impl HostEvent {
    pub fn token(&self) -> Option<u64> {
        match self {
            HostEvent::Clear { token }
            | HostEvent::Results { token, .. }
            | HostEvent::ResourceData { token, .. }
            | HostEvent::Error { token, .. } => *token,
            HostEvent::Init { .. } | HostEvent::Catalog { .. } => None,
        }
    }

    pub fn command(&self) -> &'static str {
        match self {
            HostEvent::Init { .. } => "init",
            HostEvent::Catalog { .. } => "catalog",
            HostEvent::Clear { .. } => "clear",
            HostEvent::Results { .. } => "results",
            HostEvent::ResourceData { .. } => "resourceData",
            HostEvent::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("message has no command field")]
    MissingCommand,
    #[error("unknown or incomplete command: {command}")]
    Unrecognized { command: String, source: serde_json::Error },
}

fn decode<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, ProtocolError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let command = value
        .get("command")
        .and_then(|c| c.as_str())
        .ok_or(ProtocolError::MissingCommand)?
        .to_string();
    serde_json::from_value(value).map_err(|source| ProtocolError::Unrecognized { command, source })
}

pub fn decode_event(raw: &str) -> Result<HostEvent, ProtocolError> {
    decode(raw)
}

pub fn decode_intent(raw: &str) -> Result<Intent, ProtocolError> {
    decode(raw)
}

pub fn encode<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}
