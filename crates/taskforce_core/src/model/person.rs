//! Person (soldier) record.
//!
//! # Invariants
//! - `exemption_ids` holds no duplicates once normalized.
//! - `department_id` may not resolve for imported records; it has no
//!   foreign key.

use crate::model::validation::{normalize_list, require_email, require_text, ValidationError};
use crate::model::{new_record_id, RecordId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department_id: RecordId,
    /// Only available people are offered as task assignees.
    pub available: bool,
    pub emergency_contact: String,
    pub exemption_ids: Vec<RecordId>,
    /// Linked login account, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
}

impl Person {
    /// Creates an available person without exemptions.
    pub fn new(name: impl Into<String>, department_id: impl Into<RecordId>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            department_id: department_id.into(),
            available: true,
            emergency_contact: String::new(),
            exemption_ids: Vec::new(),
            user_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("id", &self.id)?;
        require_text("name", &self.name)?;
        if !self.email.trim().is_empty() {
            require_email(&self.email)?;
        }
        Ok(())
    }

    /// Returns a copy with trimmed, de-duplicated exemption ids.
    pub fn normalized(&self) -> Self {
        let mut person = self.clone();
        person.exemption_ids = normalize_list(&self.exemption_ids);
        person
    }

    /// Returns whether this person holds the given exemption.
    pub fn has_exemption(&self, exemption_id: &str) -> bool {
        self.exemption_ids.iter().any(|id| id == exemption_id)
    }
}
