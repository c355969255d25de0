//! Timetabling domain models.
//!
//! Provides the grid shape descriptor and the roster snapshot types the
//! generation engine consumes.
//!
//! # Conventions
//!
//! All coordinates are 1-based: years, sections, days and periods start
//! at 1, matching how the surrounding API layer addresses the grid.

mod roster;
mod structure;

pub use roster::{Roster, Subject, Teacher};
pub use structure::ScheduleStructure;
