//! Task record with status/priority lifecycle labels.
//!
//! # Responsibility
//! - Define the task shape and its Hebrew wire labels.
//! - Provide storage codes so the database stays ASCII-keyed.
//!
//! # Invariants
//! - `prohibited_exemption_ids` and `required_skills` hold no duplicates once
//!   normalized.
//! - `due_date` is a calendar date `YYYY-MM-DD` without time zone.

use crate::model::validation::{normalize_list, require_due_date, require_text, ValidationError};
use crate::model::{new_record_id, RecordId};
use serde::{Deserialize, Serialize};

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "ממתין")]
    Pending,
    #[serde(rename = "בביצוע")]
    InProgress,
    #[serde(rename = "הושלם")]
    Completed,
    #[serde(rename = "בוטל")]
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];

    /// Hebrew label shown in the UI and used in exported snapshots.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Pending => "ממתין",
            Self::InProgress => "בביצוע",
            Self::Completed => "הושלם",
            Self::Cancelled => "בוטל",
        }
    }

    pub fn parse_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_label() == value.trim())
    }

    pub(crate) fn as_code(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub(crate) fn parse_code(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_code() == value)
    }
}

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "נמוכה")]
    Low,
    #[serde(rename = "בינונית")]
    Medium,
    #[serde(rename = "גבוהה")]
    High,
    #[serde(rename = "דחופה")]
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Low => "נמוכה",
            Self::Medium => "בינונית",
            Self::High => "גבוהה",
            Self::Urgent => "דחופה",
        }
    }

    pub fn parse_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_label() == value.trim())
    }

    pub(crate) fn as_code(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub(crate) fn parse_code(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_code() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub assigned_person_id: Option<RecordId>,
    pub status: Status,
    pub priority: Priority,
    pub required_skills: Vec<String>,
    /// Holders of any of these exemptions may not be assigned.
    pub prohibited_exemption_ids: Vec<RecordId>,
    pub due_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by_id: Option<RecordId>,
}

impl Task {
    /// Creates an unassigned pending task with medium priority, matching the
    /// defaults of the task form.
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            title: title.into(),
            description: String::new(),
            assigned_person_id: None,
            status: Status::Pending,
            priority: Priority::Medium,
            required_skills: Vec::new(),
            prohibited_exemption_ids: Vec::new(),
            due_date: due_date.into(),
            assigned_by_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("id", &self.id)?;
        require_text("title", &self.title)?;
        require_due_date(&self.due_date)
    }

    /// Returns a copy with trimmed, de-duplicated skill and exemption lists.
    pub fn normalized(&self) -> Self {
        let mut task = self.clone();
        task.required_skills = normalize_list(&self.required_skills);
        task.prohibited_exemption_ids = normalize_list(&self.prohibited_exemption_ids);
        task.assigned_person_id = self
            .assigned_person_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        task
    }
}
