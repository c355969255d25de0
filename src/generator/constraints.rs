//! Pluggable placement constraints.
//!
//! The search enforces teacher exclusivity, capability, and quota in its
//! own bookkeeping; everything else a deployment may want to forbid goes
//! through [`PlacementConstraint`]. A candidate placement is tried only
//! if every configured constraint permits it.
//!
//! Additional constraints plug in via
//! [`GeneratorConfig::with_constraint`](crate::generator::GeneratorConfig::with_constraint)
//! without touching the search's control structure.

use std::fmt::Debug;

use crate::models::{Subject, Teacher};
use crate::solution::Entry;

/// A candidate placement as seen by a constraint.
#[derive(Debug)]
pub struct PlacementView<'a> {
    /// Target slot, 1-based.
    pub year: usize,
    pub section: usize,
    pub day: usize,
    pub period: usize,
    /// Subject being placed.
    pub subject: &'a Subject,
    /// Teacher being booked.
    pub teacher: &'a Teacher,
    /// Partially filled rows of the target section, `[day-1][period-1]`.
    pub section_rows: &'a [Vec<Option<Entry>>],
    /// Placements this teacher already holds on `day` across all sections.
    pub teacher_day_load: usize,
}

/// A hard constraint on a single placement.
///
/// Returning `false` vetoes the candidate; the search then tries the
/// next teacher, subject, or leaves the slot empty.
pub trait PlacementConstraint: Send + Sync + Debug {
    /// Constraint name, used in tracing output.
    fn name(&self) -> &'static str;

    /// Whether the candidate placement is acceptable.
    fn permits(&self, view: &PlacementView<'_>) -> bool;
}

/// Honours each teacher's `unavailable_slots`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeacherAvailability;

impl PlacementConstraint for TeacherAvailability {
    fn name(&self) -> &'static str {
        "teacher-availability"
    }

    fn permits(&self, view: &PlacementView<'_>) -> bool {
        view.teacher.is_available(view.day, view.period)
    }
}

/// Honours each teacher's optional `max_daily_load` cap.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxDailyLoad;

impl PlacementConstraint for MaxDailyLoad {
    fn name(&self) -> &'static str {
        "max-daily-load"
    }

    fn permits(&self, view: &PlacementView<'_>) -> bool {
        match view.teacher.max_daily_load {
            Some(cap) => view.teacher_day_load < cap,
            None => true,
        }
    }
}
