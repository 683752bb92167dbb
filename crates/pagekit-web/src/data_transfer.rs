#![forbid(unsafe_code)]

//! Host-side mirror of a browser `DataTransfer`.
//!
//! JS hosts copy the string entries of the event's data transfer into this
//! map (directly or as JSON) before handing the event to Rust. MIME types are
//! lowercased on insert, as browsers do.

use std::collections::BTreeMap;

use pagekit_dnd::{DragPayload, PayloadKind};
use serde::{Deserialize, Serialize};

/// Block id of an existing block being moved.
pub const MIME_MOVE: &str = "application/x-pagekit-move";
/// Block type of a palette item.
pub const MIME_NEW: &str = "application/x-pagekit-new";
/// Reusable component id accompanying [`MIME_NEW`].
pub const MIME_COMPONENT: &str = "application/x-pagekit-component";
/// Display label for drag affordances.
pub const MIME_LABEL: &str = "application/x-pagekit-label";
/// Plain-text fallback carrying a bare block type.
pub const MIME_TEXT: &str = "text/plain";

/// String entries of one drag event's data transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTransfer {
    entries: BTreeMap<String, String>,
}

impl DataTransfer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries a drag source should write for `payload`.
    #[must_use]
    pub fn from_payload(payload: &DragPayload) -> Self {
        let mut transfer = Self::new();
        match &payload.kind {
            PayloadKind::Move { block_id } => {
                transfer.set_data(MIME_MOVE, block_id.to_string());
            }
            PayloadKind::New {
                block_type,
                component_id,
            } => {
                transfer.set_data(MIME_NEW, block_type.clone());
                if let Some(component) = component_id {
                    transfer.set_data(MIME_COMPONENT, component.clone());
                }
                transfer.set_data(MIME_TEXT, block_type.clone());
            }
        }
        if !payload.label.is_empty() {
            transfer.set_data(MIME_LABEL, payload.label.clone());
        }
        transfer
    }

    /// Decode the JSON object form (`{"mime": "value", ...}`).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: BTreeMap<String, String> = serde_json::from_str(json)?;
        Ok(entries.into_iter().collect())
    }

    /// Encode as a JSON object, for hosts that replay transfers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn set_data(&mut self, mime: &str, value: impl Into<String>) {
        self.entries.insert(mime.to_ascii_lowercase(), value.into());
    }

    /// Value for `mime`; empty strings count as absent, as in browsers.
    #[must_use]
    pub fn get_data(&self, mime: &str) -> Option<&str> {
        self.entries
            .get(&mime.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// MIME types present, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for DataTransfer {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transfer = Self::new();
        for (mime, value) in iter {
            transfer.set_data(mime.as_ref(), value);
        }
        transfer
    }
}
