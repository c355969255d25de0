//! Stop-then-replace orchestration of generation runs.
//!
//! [`SchedulerEngine`] owns the current structure, the shared solution
//! grid, and the handle of the in-flight run. Every entry point that
//! changes what a run would read — a new generation request, a structure
//! replacement, a teacher or subject deletion, a reset — first cancels
//! the in-flight run and waits for it to wind down, so stale work never
//! overwrites newer state. Two runs are never active at once.

use tokio::sync::{Mutex, RwLock};

use crate::generator::{Generator, GeneratorConfig, OutcomeReceiver, RunHandle};
use crate::models::{Roster, ScheduleStructure};
use crate::solution::{ScheduleSolution, SectionRows, SharedSolution, SolutionError};

/// Orchestrates generation against a single shared grid.
#[derive(Debug)]
pub struct SchedulerEngine {
    structure: RwLock<ScheduleStructure>,
    solution: SharedSolution,
    current: Mutex<Option<RunHandle>>,
    config: GeneratorConfig,
}

impl SchedulerEngine {
    /// Creates an engine with an empty grid shaped after `structure`.
    pub fn new(structure: ScheduleStructure) -> Self {
        let solution = ScheduleSolution::shared(&structure);
        Self {
            structure: RwLock::new(structure),
            solution,
            current: Mutex::new(None),
            config: GeneratorConfig::default(),
        }
    }

    /// Replaces the configuration used for subsequent runs.
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared handle to the grid, for readers outside the engine.
    pub fn solution(&self) -> SharedSolution {
        self.solution.clone()
    }

    /// Snapshot of the current structure.
    pub async fn structure(&self) -> ScheduleStructure {
        self.structure.read().await.clone()
    }

    /// Starts a generation run against the current structure and the
    /// given roster snapshot, cancelling any in-flight run first.
    ///
    /// The returned receiver resolves with the run outcome, or with a
    /// closed-channel error if this run is itself superseded or stopped.
    pub async fn generate(&self, roster: &Roster) -> OutcomeReceiver {
        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            tracing::debug!("superseding in-flight generation run");
            previous.halt().await;
        }

        let structure = self.structure.read().await.clone();
        let generator = Generator::new(structure, roster.clone(), self.solution.clone())
            .with_config(self.config.clone());
        let (handle, outcome) = generator.spawn();
        *current = Some(handle);
        outcome
    }

    /// Cancels the in-flight run, if any, and waits for it to wind down.
    pub async fn stop(&self) {
        if let Some(handle) = self.current.lock().await.take() {
            handle.halt().await;
        }
    }

    /// Replaces the structure and reconciles the grid to the new shape.
    ///
    /// In-bounds slots survive; out-of-bounds slots are dropped; new
    /// slots start empty.
    pub async fn update_structure(&self, new: ScheduleStructure) {
        self.stop().await;
        *self.structure.write().await = new.clone();
        self.solution.write().await.reconcile(&new);
        tracing::info!(
            years = new.year_count(),
            days = new.days_per_week(),
            periods = new.periods_per_day(),
            "structure replaced, grid reconciled",
        );
    }

    /// Purges every assignment taught by `name` after stopping any
    /// in-flight run. Call when the external registry deletes a teacher.
    pub async fn remove_teacher(&self, name: &str) -> usize {
        self.stop().await;
        let cleared = self.solution.write().await.remove_teacher(name);
        tracing::info!(teacher = name, cleared, "teacher purged from grid");
        cleared
    }

    /// Purges every assignment of subject `code` after stopping any
    /// in-flight run. Call when the external registry deletes a subject.
    pub async fn remove_subject(&self, code: &str) -> usize {
        self.stop().await;
        let cleared = self.solution.write().await.remove_subject(code);
        tracing::info!(subject = code, cleared, "subject purged from grid");
        cleared
    }

    /// Validated direct edit of one section's rows.
    ///
    /// Serialized against generation installs by the grid's write lock;
    /// a rejected edit leaves the grid untouched.
    pub async fn edit_section(
        &self,
        year: usize,
        section: usize,
        rows: SectionRows,
        roster: &Roster,
    ) -> Result<(), SolutionError> {
        self.solution.write().await.set_section(year, section, rows, roster)
    }

    /// Stops any in-flight run and clears the whole grid.
    pub async fn reset(&self) {
        self.stop().await;
        self.solution.write().await.reset();
    }
}
