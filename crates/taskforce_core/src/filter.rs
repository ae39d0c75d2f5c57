//! List view filters.
//!
//! Text matching is a case-insensitive substring test; an empty term matches
//! everything. Phone numbers are matched verbatim.

use crate::model::department::Department;
use crate::model::exemption::ExemptionType;
use crate::model::person::Person;
use crate::model::task::{Priority, Status, Task};
use crate::model::RecordId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleFilter {
    /// Matched against name, email and phone.
    pub term: String,
    pub department_id: Option<RecordId>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Matched against title and description.
    pub term: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl PeopleFilter {
    pub fn matches(&self, person: &Person) -> bool {
        let matches_term = contains_folded(&person.name, &self.term)
            || contains_folded(&person.email, &self.term)
            || person.phone.contains(self.term.as_str());
        let matches_department = self
            .department_id
            .as_deref()
            .map_or(true, |id| person.department_id == id);
        let matches_availability = self
            .available
            .map_or(true, |available| person.available == available);
        matches_term && matches_department && matches_availability
    }

    pub fn apply<'a>(&self, people: &'a [Person]) -> Vec<&'a Person> {
        people.iter().filter(|person| self.matches(person)).collect()
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let matches_term = contains_folded(&task.title, &self.term)
            || contains_folded(&task.description, &self.term);
        let matches_status = self.status.map_or(true, |status| task.status == status);
        let matches_priority = self
            .priority
            .map_or(true, |priority| task.priority == priority);
        matches_term && matches_status && matches_priority
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

pub fn filter_departments<'a>(departments: &'a [Department], term: &str) -> Vec<&'a Department> {
    departments
        .iter()
        .filter(|department| contains_folded(&department.name, term))
        .collect()
}

pub fn filter_exemptions<'a>(exemptions: &'a [ExemptionType], term: &str) -> Vec<&'a ExemptionType> {
    exemptions
        .iter()
        .filter(|exemption| {
            contains_folded(&exemption.name, term) || contains_folded(&exemption.description, term)
        })
        .collect()
}
