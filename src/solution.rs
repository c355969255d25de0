//! The generated-assignment grid.
//!
//! [`ScheduleSolution`] stores zero or one [`Entry`] per
//! `(year, section, day, period)` slot. It is created empty from a
//! [`ScheduleStructure`], fully replaced by a successful generation run,
//! patched by validated direct edits, pruned when a teacher or subject is
//! deleted, and resized when the structure changes.
//!
//! Shared form: [`SharedSolution`] wraps the grid in
//! `Arc<tokio::sync::RwLock<_>>` — one writer at a time, consistent
//! snapshot reads. All mutation surfaces are all-or-nothing: a rejected
//! edit leaves every cell untouched.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{Roster, ScheduleStructure};
use crate::validation::validate_section_edit;

/// One subject/teacher pair occupying a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Subject code taught in this slot.
    pub subject: String,
    /// Name of the teacher taking the slot.
    pub teacher: String,
}

impl Entry {
    /// Creates an entry.
    pub fn new(subject: impl Into<String>, teacher: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            teacher: teacher.into(),
        }
    }
}

/// One section's week: `rows[day - 1][period - 1]`.
pub type SectionRows = Vec<Vec<Option<Entry>>>;

/// An occupied slot in a single teacher's weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherSlot {
    pub year: usize,
    pub section: usize,
    pub day: usize,
    pub period: usize,
    /// Subject taught in the slot.
    pub subject: String,
}

/// Why a read or edit of the grid was rejected.
///
/// Rejections are data, not faults: the grid is byte-for-byte unchanged
/// after any error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolutionError {
    #[error("year {0} is outside the timetable structure")]
    YearOutOfBounds(usize),

    #[error("section {section} of year {year} is outside the timetable structure")]
    SectionOutOfBounds { year: usize, section: usize },

    #[error(
        "section rows must be {days} days x {periods} periods, got {got_days} days x {got_periods} periods"
    )]
    ShapeMismatch {
        days: usize,
        periods: usize,
        got_days: usize,
        got_periods: usize,
    },

    #[error("unknown teacher: {0}")]
    UnknownTeacher(String),

    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("teacher {teacher} is not capable of teaching {subject}")]
    IncapableTeacher { teacher: String, subject: String },

    #[error(
        "teacher {teacher} is already booked at day {day} period {period} \
         in year {other_year} section {other_section}"
    )]
    TeacherConflict {
        teacher: String,
        day: usize,
        period: usize,
        other_year: usize,
        other_section: usize,
    },

    #[error("subject {subject} is not taught in year {year} section {section}")]
    NotApplicable {
        subject: String,
        year: usize,
        section: usize,
    },

    #[error(
        "subject {subject} in year {year} section {section} requires {required} weekly hours, \
         rows contain {placed}"
    )]
    QuotaMismatch {
        subject: String,
        year: usize,
        section: usize,
        required: usize,
        placed: usize,
    },
}

/// The full timetable grid.
///
/// Indexed internally 0-based; the public surface is 1-based like the
/// rest of the crate. Out-of-bounds reads return an error, never panic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSolution {
    days_per_week: usize,
    periods_per_day: usize,
    /// `grid[year - 1][section - 1]` is one section's week.
    grid: Vec<Vec<SectionRows>>,
}

/// Shared handle to the grid: single writer, many snapshot readers.
pub type SharedSolution = Arc<RwLock<ScheduleSolution>>;

fn empty_rows(days: usize, periods: usize) -> SectionRows {
    vec![vec![None; periods]; days]
}

impl ScheduleSolution {
    /// Creates an empty grid shaped after the structure.
    pub fn new(structure: &ScheduleStructure) -> Self {
        let days = structure.days_per_week();
        let periods = structure.periods_per_day();
        let grid = (1..=structure.year_count())
            .map(|year| {
                (0..structure.sections_in(year))
                    .map(|_| empty_rows(days, periods))
                    .collect()
            })
            .collect();
        Self {
            days_per_week: days,
            periods_per_day: periods,
            grid,
        }
    }

    /// Shared form of an empty grid.
    pub fn shared(structure: &ScheduleStructure) -> SharedSolution {
        Arc::new(RwLock::new(Self::new(structure)))
    }

    /// Working days per week of the current shape.
    pub fn days_per_week(&self) -> usize {
        self.days_per_week
    }

    /// Periods per day of the current shape.
    pub fn periods_per_day(&self) -> usize {
        self.periods_per_day
    }

    /// True iff no slot anywhere is occupied.
    pub fn is_empty(&self) -> bool {
        self.occupied_count() == 0
    }

    /// Number of occupied slots across the whole grid.
    pub fn occupied_count(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .filter(|cell| cell.is_some())
            .count()
    }

    /// The whole grid, year-major.
    pub fn all(&self) -> &[Vec<SectionRows>] {
        &self.grid
    }

    /// All sections of one year.
    pub fn by_year(&self, year: usize) -> Result<&[SectionRows], SolutionError> {
        self.grid
            .get(year.wrapping_sub(1))
            .map(Vec::as_slice)
            .ok_or(SolutionError::YearOutOfBounds(year))
    }

    /// One section's week.
    pub fn by_section(&self, year: usize, section: usize) -> Result<&SectionRows, SolutionError> {
        self.by_year(year)?
            .get(section.wrapping_sub(1))
            .ok_or(SolutionError::SectionOutOfBounds { year, section })
    }

    /// The entry at `(year, section, day, period)`, if any.
    ///
    /// Returns `None` for out-of-bounds coordinates as well; use
    /// [`by_section`](Self::by_section) when bounds must be distinguished.
    pub fn entry(&self, year: usize, section: usize, day: usize, period: usize) -> Option<&Entry> {
        self.by_section(year, section)
            .ok()?
            .get(day.wrapping_sub(1))?
            .get(period.wrapping_sub(1))?
            .as_ref()
    }

    /// Atomically replaces all slots of one `(year, section)`.
    ///
    /// Validates shape, roster references, teacher capability, teacher
    /// exclusivity against every other section, and exact weekly-hour
    /// quotas for this section. On any violation the grid is unchanged
    /// and the violation is returned.
    pub fn set_section(
        &mut self,
        year: usize,
        section: usize,
        rows: SectionRows,
        roster: &Roster,
    ) -> Result<(), SolutionError> {
        validate_section_edit(self, year, section, &rows, roster)?;
        self.grid[year - 1][section - 1] = rows;
        Ok(())
    }

    /// Clears every slot taught by `name`. Returns the number cleared.
    pub fn remove_teacher(&mut self, name: &str) -> usize {
        self.clear_matching(|entry| entry.teacher == name)
    }

    /// Clears every slot assigned to subject `code`. Returns the number cleared.
    pub fn remove_subject(&mut self, code: &str) -> usize {
        self.clear_matching(|entry| entry.subject == code)
    }

    fn clear_matching(&mut self, matches: impl Fn(&Entry) -> bool) -> usize {
        let mut cleared = 0;
        for cell in self.grid.iter_mut().flatten().flatten().flatten() {
            if cell.as_ref().is_some_and(&matches) {
                *cell = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// All occupied slots taught by `name`, ordered by
    /// `(day, period, year, section)`.
    pub fn teacher_schedule(&self, name: &str) -> Vec<TeacherSlot> {
        let mut slots = Vec::new();
        for (y, sections) in self.grid.iter().enumerate() {
            for (s, rows) in sections.iter().enumerate() {
                for (d, row) in rows.iter().enumerate() {
                    for (p, cell) in row.iter().enumerate() {
                        if let Some(entry) = cell {
                            if entry.teacher == name {
                                slots.push(TeacherSlot {
                                    year: y + 1,
                                    section: s + 1,
                                    day: d + 1,
                                    period: p + 1,
                                    subject: entry.subject.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }
        slots.sort_by_key(|s| (s.day, s.period, s.year, s.section));
        slots
    }

    /// Clears the entire grid, keeping its shape.
    pub fn reset(&mut self) {
        for cell in self.grid.iter_mut().flatten().flatten().flatten() {
            *cell = None;
        }
    }

    /// Resizes the grid after a structure change.
    ///
    /// Slots still inside the new bounds are preserved; slots outside are
    /// dropped; new slots start empty.
    pub fn reconcile(&mut self, structure: &ScheduleStructure) {
        let days = structure.days_per_week();
        let periods = structure.periods_per_day();

        self.grid.truncate(structure.year_count());
        while self.grid.len() < structure.year_count() {
            self.grid.push(Vec::new());
        }

        for (y, sections) in self.grid.iter_mut().enumerate() {
            let wanted = structure.sections_in(y + 1);
            sections.truncate(wanted);
            while sections.len() < wanted {
                sections.push(empty_rows(days, periods));
            }
            for rows in sections.iter_mut() {
                rows.truncate(days);
                while rows.len() < days {
                    rows.push(vec![None; periods]);
                }
                for row in rows.iter_mut() {
                    row.truncate(periods);
                    while row.len() < periods {
                        row.push(None);
                    }
                }
            }
        }

        self.days_per_week = days;
        self.periods_per_day = periods;
    }
}
