//! Task assignment eligibility.
//!
//! # Responsibility
//! - Decide who may be assigned a task given its prohibited exemptions.
//! - Report stale assignments left behind by later exemption edits.
//!
//! # Invariants
//! - A person is eligible iff they are available and hold none of the
//!   prohibited exemptions.
//! - Results are computed from the inputs on every call; callers pass the
//!   current draft of prohibited ids so selectors follow form edits live.
//! - Nothing here mutates stored data. Existing assignments are never
//!   revoked when exemptions change.

use crate::model::person::Person;
use crate::model::task::Task;
use crate::model::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason an assignment is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// Assignee id does not match any person.
    UnknownPerson(RecordId),
    /// Assignee is marked unavailable.
    PersonUnavailable(RecordId),
    /// Assignee holds exemptions the task prohibits.
    ProhibitedExemption {
        person_id: RecordId,
        exemption_ids: Vec<RecordId>,
    },
}

impl Display for AssignmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPerson(id) => write!(f, "assignee not found: {id}"),
            Self::PersonUnavailable(id) => write!(f, "assignee is not available: {id}"),
            Self::ProhibitedExemption {
                person_id,
                exemption_ids,
            } => write!(
                f,
                "assignee {person_id} holds prohibited exemptions: {}",
                exemption_ids.join(",")
            ),
        }
    }
}

impl Error for AssignmentError {}

/// An existing assignment that would no longer pass `check_assignment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentConflict {
    pub task_id: RecordId,
    pub person_id: RecordId,
    /// Exemptions held by the assignee that the task prohibits.
    pub exemption_ids: Vec<RecordId>,
}

/// Exemptions the person holds that appear in `prohibited_exemption_ids`,
/// in the person's own order.
pub fn conflicting_exemptions(
    person: &Person,
    prohibited_exemption_ids: &[RecordId],
) -> Vec<RecordId> {
    person
        .exemption_ids
        .iter()
        .filter(|id| prohibited_exemption_ids.contains(id))
        .cloned()
        .collect()
}

pub fn is_eligible(person: &Person, prohibited_exemption_ids: &[RecordId]) -> bool {
    person.available
        && !prohibited_exemption_ids
            .iter()
            .any(|id| person.has_exemption(id))
}

/// People that may be offered in the assignee selector, input order kept.
pub fn eligible_assignees<'a>(
    people: &'a [Person],
    prohibited_exemption_ids: &[RecordId],
) -> Vec<&'a Person> {
    people
        .iter()
        .filter(|person| is_eligible(person, prohibited_exemption_ids))
        .collect()
}

/// Validates the task's current assignee against the roster.
///
/// An unassigned task always passes.
pub fn check_assignment(task: &Task, people: &[Person]) -> Result<(), AssignmentError> {
    let Some(person_id) = task.assigned_person_id.as_deref() else {
        return Ok(());
    };
    let person = people
        .iter()
        .find(|person| person.id == person_id)
        .ok_or_else(|| AssignmentError::UnknownPerson(person_id.to_string()))?;

    if !person.available {
        return Err(AssignmentError::PersonUnavailable(person.id.clone()));
    }
    let conflicts = conflicting_exemptions(person, &task.prohibited_exemption_ids);
    if !conflicts.is_empty() {
        return Err(AssignmentError::ProhibitedExemption {
            person_id: person.id.clone(),
            exemption_ids: conflicts,
        });
    }
    Ok(())
}

/// Lists assignments whose assignee now holds a prohibited exemption.
///
/// Availability is not considered: an assignee who became unavailable after
/// assignment is a scheduling matter, not an exemption conflict.
pub fn assignment_conflicts(tasks: &[Task], people: &[Person]) -> Vec<AssignmentConflict> {
    tasks
        .iter()
        .filter_map(|task| {
            let person_id = task.assigned_person_id.as_deref()?;
            let person = people.iter().find(|person| person.id == person_id)?;
            let exemption_ids = conflicting_exemptions(person, &task.prohibited_exemption_ids);
            if exemption_ids.is_empty() {
                return None;
            }
            Some(AssignmentConflict {
                task_id: task.id.clone(),
                person_id: person.id.clone(),
                exemption_ids,
            })
        })
        .collect()
}
