//! Roster snapshot: teachers and subjects.
//!
//! The roster is owned and mutated by external registries; the engine
//! consumes it as a read-only snapshot taken when a generation run
//! starts. Deleting a teacher or subject from the external store must go
//! through [`SchedulerEngine`](crate::engine::SchedulerEngine) so that
//! in-flight runs are stopped and dependent assignments purged.

use serde::{Deserialize, Serialize};

/// A teacher and the subjects they may teach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher name.
    pub name: String,
    /// Codes of the subjects this teacher is capable of teaching.
    pub subjects: Vec<String>,
    /// `(day, period)` slots this teacher can never take.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_slots: Vec<(usize, usize)>,
    /// Maximum placements per day across all sections, if capped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_load: Option<usize>,
}

impl Teacher {
    /// Creates a teacher with no capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subjects: Vec::new(),
            unavailable_slots: Vec::new(),
            max_daily_load: None,
        }
    }

    /// Adds a subject capability.
    pub fn with_subject(mut self, code: impl Into<String>) -> Self {
        self.subjects.push(code.into());
        self
    }

    /// Marks a `(day, period)` slot as unavailable.
    pub fn with_unavailable_slot(mut self, day: usize, period: usize) -> Self {
        self.unavailable_slots.push((day, period));
        self
    }

    /// Caps the number of placements this teacher takes per day.
    pub fn with_max_daily_load(mut self, cap: usize) -> Self {
        self.max_daily_load = Some(cap);
        self
    }

    /// Whether this teacher may teach the given subject.
    pub fn can_teach(&self, code: &str) -> bool {
        self.subjects.iter().any(|s| s == code)
    }

    /// Whether this teacher is available at `(day, period)`.
    pub fn is_available(&self, day: usize, period: usize) -> bool {
        !self.unavailable_slots.contains(&(day, period))
    }
}

/// A subject with its weekly-hour quota and the sections it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject code (e.g., "MATH").
    pub code: String,
    /// Required occupied slots per week for each applicable section.
    pub weekly_hours: usize,
    /// `(year, section)` pairs this subject is taught in.
    pub sections: Vec<(usize, usize)>,
}

impl Subject {
    /// Creates a subject with the given weekly-hour quota.
    pub fn new(code: impl Into<String>, weekly_hours: usize) -> Self {
        Self {
            code: code.into(),
            weekly_hours,
            sections: Vec::new(),
        }
    }

    /// Adds an applicable section.
    pub fn with_section(mut self, year: usize, section: usize) -> Self {
        self.sections.push((year, section));
        self
    }

    /// Whether this subject is taught in `(year, section)`.
    pub fn applies_to(&self, year: usize, section: usize) -> bool {
        self.sections.contains(&(year, section))
    }
}

/// Snapshot of the teacher and subject registries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// All registered teachers.
    pub teachers: Vec<Teacher>,
    /// All registered subjects.
    pub subjects: Vec<Subject>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Looks up a teacher by name.
    pub fn teacher(&self, name: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.name == name)
    }

    /// Looks up a subject by code.
    pub fn subject(&self, code: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.code == code)
    }

    /// All teachers capable of teaching a subject.
    pub fn teachers_for(&self, code: &str) -> Vec<&Teacher> {
        self.teachers.iter().filter(|t| t.can_teach(code)).collect()
    }

    /// All subjects taught in `(year, section)`.
    pub fn subjects_for(&self, year: usize, section: usize) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|s| s.applies_to(year, section))
            .collect()
    }

    /// Whether the roster has no teachers or no subjects.
    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty() || self.subjects.is_empty()
    }
}
