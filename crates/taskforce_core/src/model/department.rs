//! Department (unit) record.

use crate::model::validation::{require_color_code, require_text, ValidationError};
use crate::model::{new_record_id, RecordId};
use serde::{Deserialize, Serialize};

/// Organisational unit people belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: RecordId,
    pub name: String,
    /// Display colour, `#RRGGBB`.
    pub color_code: String,
}

impl Department {
    /// Creates a department with a generated id.
    pub fn new(name: impl Into<String>, color_code: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            color_code: color_code.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("id", &self.id)?;
        require_text("name", &self.name)?;
        require_color_code(&self.color_code)
    }
}
