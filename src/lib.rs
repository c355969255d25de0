//! Timetable generation engine for school scheduling.
//!
//! Assigns subjects, taught by specific teachers, into a fixed grid of
//! years × sections × days × periods, producing a conflict-free weekly
//! timetable: no teacher double-booked across sections, every subject's
//! weekly-hour quota met exactly, every placement taught by a capable
//! teacher.
//!
//! # Modules
//!
//! - **`models`**: Grid shape (`ScheduleStructure`) and roster snapshot
//!   types (`Teacher`, `Subject`, `Roster`)
//! - **`solution`**: The generated-assignment grid (`ScheduleSolution`)
//!   with its query and mutation surface
//! - **`validation`**: Atomic validation of direct section edits
//! - **`generator`**: Cancellable backtracking search that fills the grid
//! - **`engine`**: Stop-then-replace orchestration of generation runs
//!
//! # Architecture
//!
//! The search runs on a background task and is cancelled cooperatively;
//! the caller observes the outcome through a one-shot channel. The grid is
//! the single piece of shared mutable state and lives behind a
//! single-writer/multi-reader lock.
//!
//! # Reference
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod engine;
pub mod generator;
pub mod models;
pub mod solution;
pub mod validation;

pub use engine::SchedulerEngine;
pub use generator::{
    GenerateError, Generator, GeneratorConfig, MaxDailyLoad, OutcomeReceiver, PlacementConstraint,
    PlacementView, RunHandle, TeacherAvailability,
};
pub use models::{Roster, ScheduleStructure, Subject, Teacher};
pub use solution::{
    Entry, ScheduleSolution, SectionRows, SharedSolution, SolutionError, TeacherSlot,
};
