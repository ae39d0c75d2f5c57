//! Medical exemption type record.

use crate::model::validation::{require_text, ValidationError};
use crate::model::{new_record_id, RecordId};
use serde::{Deserialize, Serialize};

/// A medical profile restriction that people can hold and tasks can prohibit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExemptionType {
    pub id: RecordId,
    pub name: String,
    pub description: String,
}

impl ExemptionType {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("id", &self.id)?;
        require_text("name", &self.name)
    }
}
