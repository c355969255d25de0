//! Cancellable background generation runs.
//!
//! A [`Generator`] owns snapshots of the structure and roster plus a
//! handle to the shared solution grid. [`Generator::spawn`] starts the
//! backtracking search on a blocking task and returns a [`RunHandle`]
//! (to stop the run) together with an [`OutcomeReceiver`] (to await the
//! result). Exactly one of success or failure is delivered per run that
//! is not cancelled; a cancelled run delivers neither — the receiver
//! resolves to a closed-channel error instead.
//!
//! A successful run builds the whole candidate grid off to the side,
//! re-validates it section by section through
//! [`ScheduleSolution::set_section`], and swaps it in atomically under
//! the write lock. A failed or cancelled run never touches the grid.

pub mod constraints;
mod search;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::{Roster, ScheduleStructure};
use crate::solution::{ScheduleSolution, SharedSolution, SolutionError};
pub use constraints::{MaxDailyLoad, PlacementConstraint, PlacementView, TeacherAvailability};
use search::{SearchError, Searcher};

/// Default bound on backtracking steps before a run gives up.
const DEFAULT_MAX_BACKTRACKS: u64 = 200_000;

/// Why a generation run produced no timetable.
///
/// Every failure is data handed to the caller; no failure path escapes
/// as a panic, and the grid is unchanged from its pre-run state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("roster has no teachers or no subjects")]
    EmptyRoster,

    #[error("no teacher is capable of teaching {0}")]
    NoCapableTeacher(String),

    #[error("subject {subject} in year {year} section {section} could not be fully scheduled")]
    Unsatisfiable {
        subject: String,
        year: usize,
        section: usize,
    },

    #[error("search budget exhausted after {0} backtracks")]
    BudgetExhausted(u64),

    #[error("generated timetable rejected on install: {0}")]
    Install(#[from] SolutionError),

    #[error("generation task failed: {0}")]
    Internal(String),
}

/// Tuning and extension knobs for a generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// RNG seed; `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    /// Backtracking budget before the run reports failure.
    pub max_backtracks: u64,
    constraints: Vec<Arc<dyn PlacementConstraint>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_backtracks: DEFAULT_MAX_BACKTRACKS,
            constraints: vec![Arc::new(TeacherAvailability), Arc::new(MaxDailyLoad)],
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the backtracking budget.
    pub fn with_max_backtracks(mut self, max: u64) -> Self {
        self.max_backtracks = max;
        self
    }

    /// Adds a placement constraint on top of the built-in set.
    pub fn with_constraint(mut self, constraint: Arc<dyn PlacementConstraint>) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Receiver for the run outcome.
///
/// Resolves to `Ok(result)` when the run completes; to `Err(_)` (closed
/// channel) when the run was cancelled and therefore delivered nothing.
pub type OutcomeReceiver = oneshot::Receiver<Result<(), GenerateError>>;

/// Handle to an in-flight generation run.
///
/// Dropping the handle does not stop the run; call [`stop`](Self::stop)
/// or [`halt`](Self::halt).
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl RunHandle {
    /// Requests the run to abandon work at its next cancellation poll.
    ///
    /// After the request takes effect the run neither writes to the grid
    /// nor delivers an outcome.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the background task has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stops the run and waits until it has fully wound down.
    ///
    /// On return the run is guaranteed to have no further effect on the
    /// grid — the stop-before-mutate step of every roster or structure
    /// edit.
    pub async fn halt(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }
}

/// One generation request: structure and roster snapshots, the shared
/// grid to install into, and the run configuration.
#[derive(Debug)]
pub struct Generator {
    structure: ScheduleStructure,
    roster: Roster,
    solution: SharedSolution,
    config: GeneratorConfig,
}

impl Generator {
    /// Creates a run with the default configuration.
    pub fn new(structure: ScheduleStructure, roster: Roster, solution: SharedSolution) -> Self {
        Self {
            structure,
            roster,
            solution,
            config: GeneratorConfig::default(),
        }
    }

    /// Replaces the run configuration.
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts the run on a background task.
    pub fn spawn(self) -> (RunHandle, OutcomeReceiver) {
        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            match run(self.structure, self.roster, self.solution, self.config, token).await {
                RunEnd::Cancelled => {
                    tracing::debug!("generation run cancelled, outcome suppressed");
                }
                RunEnd::Completed(result) => {
                    match &result {
                        Ok(()) => tracing::info!("generation run succeeded"),
                        Err(err) => tracing::warn!(error = %err, "generation run failed"),
                    }
                    // The caller may have dropped the receiver; that is fine.
                    let _ = tx.send(result);
                }
            }
        });

        (RunHandle { cancel, join }, rx)
    }
}

enum RunEnd {
    Completed(Result<(), GenerateError>),
    Cancelled,
}

async fn run(
    structure: ScheduleStructure,
    roster: Roster,
    solution: SharedSolution,
    config: GeneratorConfig,
    cancel: CancellationToken,
) -> RunEnd {
    if roster.is_empty() {
        return RunEnd::Completed(Err(GenerateError::EmptyRoster));
    }

    let seed = config.seed.unwrap_or_else(|| rand::random());
    tracing::info!(
        years = structure.year_count(),
        days = structure.days_per_week(),
        periods = structure.periods_per_day(),
        teachers = roster.teachers.len(),
        subjects = roster.subjects.len(),
        seed,
        "generation run started",
    );

    let searched = {
        let structure = structure.clone();
        let roster = roster.clone();
        let token = cancel.clone();
        let max_backtracks = config.max_backtracks;
        let constraints = config.constraints.clone();
        tokio::task::spawn_blocking(move || {
            Searcher::new(&structure, &roster, &constraints, &token, seed, max_backtracks).solve()
        })
        .await
    };

    let placed = match searched {
        Err(join_err) => return RunEnd::Completed(Err(GenerateError::Internal(join_err.to_string()))),
        Ok(Err(SearchError::Cancelled)) => return RunEnd::Cancelled,
        Ok(Err(err)) => return RunEnd::Completed(Err(err.into())),
        Ok(Ok(placed)) => placed,
    };

    if cancel.is_cancelled() {
        return RunEnd::Cancelled;
    }

    // Re-validate through the same surface as direct edits, into a
    // scratch grid, then swap the whole grid in one write.
    let mut scratch = ScheduleSolution::new(&structure);
    for section in placed {
        if let Err(err) = scratch.set_section(section.year, section.section, section.rows, &roster) {
            return RunEnd::Completed(Err(GenerateError::Install(err)));
        }
    }

    let mut grid = solution.write().await;
    *grid = scratch;
    RunEnd::Completed(Ok(()))
}

impl From<SearchError> for GenerateError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NoCapableTeacher { subject } => GenerateError::NoCapableTeacher(subject),
            SearchError::Unsatisfiable {
                subject,
                year,
                section,
            } => GenerateError::Unsatisfiable {
                subject,
                year,
                section,
            },
            SearchError::BudgetExhausted { backtracks } => GenerateError::BudgetExhausted(backtracks),
            // A cancelled search never surfaces as an error outcome.
            SearchError::Cancelled => GenerateError::Internal("cancelled".into()),
        }
    }
}
