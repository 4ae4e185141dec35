//! JSON payload envelope
//!
//! Optional transform that wraps each formatted record in a JSON object
//! carrying a fixed set of standard tags, with the record itself under a
//! `message` key:
//!
//! ```text
//! {"env":"prod","service":"checkout","message":"<formatted record>"}
//! ```
//!
//! Tags are kept in a `BTreeMap` so the emitted field order is stable.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::format::{FormatError, PayloadTransform};

/// Key the formatted record is stored under
const MESSAGE_KEY: &str = "message";

/// Wraps formatted records in a tagged JSON object
#[derive(Debug, Clone, Default)]
pub struct JsonEnvelope {
    /// Standard tags added to every record
    tags: BTreeMap<String, String>,
}

impl JsonEnvelope {
    /// Create an envelope with the given standard tags
    pub fn new(tags: BTreeMap<String, String>) -> Self {
        Self { tags }
    }

    /// Add one tag
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Number of standard tags
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }
}

impl PayloadTransform for JsonEnvelope {
    /// Wrap the payload; the record must be valid UTF-8
    fn apply(&self, payload: Vec<u8>) -> Result<Vec<u8>, FormatError> {
        let message = String::from_utf8(payload)
            .map_err(|e| FormatError::new(format!("record is not valid UTF-8: {e}")))?;

        let mut object = serde_json::Map::with_capacity(self.tags.len() + 1);
        for (key, value) in &self.tags {
            object.insert(key.clone(), Value::String(value.clone()));
        }
        object.insert(MESSAGE_KEY.to_string(), Value::String(message));

        serde_json::to_vec(&Value::Object(object)).map_err(|e| FormatError::new(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "json_envelope"
    }
}
