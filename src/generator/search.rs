//! Constructive backtracking search over the timetable grid.
//!
//! # Algorithm
//!
//! Cells are visited in a fixed (year, section, day, period) scan order.
//! At each cell the candidates are every subject with remaining quota in
//! the section paired with every capable teacher who is free at that
//! (day, period) across all sections and passes the configured
//! [`PlacementConstraint`]s; leaving the cell empty is a candidate
//! whenever the remaining cells still fit the remaining required hours.
//! On a dead end the search backtracks and tries the next candidate.
//!
//! Soft preference: subjects not yet placed on the current day are tried
//! before the empty option, the empty option before repeating a day, so
//! a subject's hours spread across distinct days first. Teacher order is
//! shuffled with a seedable RNG so regeneration can produce a different
//! valid timetable.
//!
//! The cancellation token is polled once per visited cell; a bounded
//! backtrack budget guarantees termination on pathological inputs.
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", §3 (sequential
//! constructive methods)

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tokio_util::sync::CancellationToken;

use crate::generator::constraints::{PlacementConstraint, PlacementView};
use crate::models::{Roster, ScheduleStructure};
use crate::solution::{Entry, SectionRows};

/// Terminal outcomes of a search that produced no timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SearchError {
    /// The cancellation token fired; the run produces no outcome.
    Cancelled,
    /// A required subject has no capable teacher in the roster.
    NoCapableTeacher { subject: String },
    /// No assignment satisfies every quota exactly.
    Unsatisfiable {
        subject: String,
        year: usize,
        section: usize,
    },
    /// The backtrack budget ran out before the search space was exhausted.
    BudgetExhausted { backtracks: u64 },
}

/// One fully assigned section of a completed search.
#[derive(Debug, Clone)]
pub(crate) struct PlacedSection {
    pub year: usize,
    pub section: usize,
    pub rows: SectionRows,
}

/// Remaining weekly hours for one subject in one section.
#[derive(Debug, Clone)]
struct Demand {
    subject_idx: usize,
    remaining: usize,
}

/// Per-section work list in scan order.
#[derive(Debug, Clone)]
struct SectionPlan {
    year: usize,
    section: usize,
    demands: Vec<Demand>,
}

/// What the search may do with one cell.
#[derive(Debug, Clone, Copy)]
enum CellOption {
    Place { demand: usize, teacher: usize },
    LeaveEmpty,
}

pub(crate) struct Searcher<'a> {
    structure: &'a ScheduleStructure,
    roster: &'a Roster,
    constraints: &'a [Arc<dyn PlacementConstraint>],
    cancel: &'a CancellationToken,
    rng: ChaCha8Rng,
    max_backtracks: u64,
    backtracks: u64,
    plans: Vec<SectionPlan>,
    grids: Vec<SectionRows>,
    /// Capable teacher indices per subject index.
    capable: Vec<Vec<usize>>,
    /// `(day, period, teacher_idx)` slots taken anywhere in the grid.
    busy: HashSet<(usize, usize, usize)>,
    /// `(teacher_idx, day)` → placements so far.
    day_load: HashMap<(usize, usize), usize>,
    /// Deepest `(section, cell)` where every option failed.
    deepest_fail: Option<(usize, usize)>,
    /// Subject blamed for the deepest dead end.
    blame: Option<(String, usize, usize)>,
}

impl<'a> Searcher<'a> {
    pub(crate) fn new(
        structure: &'a ScheduleStructure,
        roster: &'a Roster,
        constraints: &'a [Arc<dyn PlacementConstraint>],
        cancel: &'a CancellationToken,
        seed: u64,
        max_backtracks: u64,
    ) -> Self {
        use rand::SeedableRng;

        let plans: Vec<SectionPlan> = structure
            .sections()
            .map(|(year, section)| SectionPlan {
                year,
                section,
                demands: roster
                    .subjects
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.applies_to(year, section) && s.weekly_hours > 0)
                    .map(|(subject_idx, s)| Demand {
                        subject_idx,
                        remaining: s.weekly_hours,
                    })
                    .collect(),
            })
            .collect();

        let capable = roster
            .subjects
            .iter()
            .map(|subject| {
                roster
                    .teachers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.can_teach(&subject.code))
                    .map(|(idx, _)| idx)
                    .collect()
            })
            .collect();

        let grids = plans
            .iter()
            .map(|_| vec![vec![None; structure.periods_per_day()]; structure.days_per_week()])
            .collect();

        Self {
            structure,
            roster,
            constraints,
            cancel,
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_backtracks,
            backtracks: 0,
            plans,
            grids,
            capable,
            busy: HashSet::new(),
            day_load: HashMap::new(),
            deepest_fail: None,
            blame: None,
        }
    }

    /// Runs the search to a terminal outcome.
    pub(crate) fn solve(mut self) -> Result<Vec<PlacedSection>, SearchError> {
        self.precheck()?;

        if self.place(0, 0)? {
            let grids = std::mem::take(&mut self.grids);
            Ok(self
                .plans
                .iter()
                .zip(grids)
                .map(|(plan, rows)| PlacedSection {
                    year: plan.year,
                    section: plan.section,
                    rows,
                })
                .collect())
        } else {
            Err(self.unsatisfiable())
        }
    }

    /// Rejects instances that can never fit, before any search work.
    fn precheck(&self) -> Result<(), SearchError> {
        for plan in &self.plans {
            for demand in &plan.demands {
                if self.capable[demand.subject_idx].is_empty() {
                    return Err(SearchError::NoCapableTeacher {
                        subject: self.roster.subjects[demand.subject_idx].code.clone(),
                    });
                }
            }

            let total: usize = plan.demands.iter().map(|d| d.remaining).sum();
            if total > self.structure.slots_per_week() {
                // Blame the subject contributing the most hours.
                let worst = plan
                    .demands
                    .iter()
                    .max_by_key(|d| d.remaining)
                    .map(|d| self.roster.subjects[d.subject_idx].code.clone())
                    .unwrap_or_default();
                return Err(SearchError::Unsatisfiable {
                    subject: worst,
                    year: plan.year,
                    section: plan.section,
                });
            }
        }
        Ok(())
    }

    fn unsatisfiable(&self) -> SearchError {
        if let Some((subject, year, section)) = self.blame.clone() {
            return SearchError::Unsatisfiable {
                subject,
                year,
                section,
            };
        }
        // No dead end was recorded; fall back to the first demand.
        let plan = &self.plans[0];
        SearchError::Unsatisfiable {
            subject: plan
                .demands
                .first()
                .map(|d| self.roster.subjects[d.subject_idx].code.clone())
                .unwrap_or_default(),
            year: plan.year,
            section: plan.section,
        }
    }

    /// Tries to fill `cell` of section `sec` and everything after it.
    fn place(&mut self, sec: usize, cell: usize) -> Result<bool, SearchError> {
        if sec == self.plans.len() {
            return Ok(true);
        }
        if self.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let periods = self.structure.periods_per_day();
        let total_cells = self.structure.slots_per_week();
        if cell == total_cells {
            return self.place(sec + 1, 0);
        }

        let remaining: usize = self.plans[sec].demands.iter().map(|d| d.remaining).sum();
        if remaining == 0 {
            // Nothing left to schedule; the rest of the section stays empty.
            return self.place(sec, cell + 1);
        }

        let day = cell / periods + 1;
        let period = cell % periods + 1;
        let cells_left = total_cells - cell;
        let options = self.cell_options(sec, day, remaining, cells_left);

        for option in options {
            match option {
                CellOption::Place { demand, teacher } => {
                    if !self.admissible(sec, day, period, demand, teacher) {
                        continue;
                    }
                    self.apply(sec, day, period, demand, teacher);
                    if self.place(sec, cell + 1)? {
                        return Ok(true);
                    }
                    self.undo(sec, day, period, demand, teacher);
                    self.spend_backtrack()?;
                }
                CellOption::LeaveEmpty => {
                    if self.place(sec, cell + 1)? {
                        return Ok(true);
                    }
                    self.spend_backtrack()?;
                }
            }
        }

        self.record_dead_end(sec, cell);
        Ok(false)
    }

    /// Candidate order for one cell: subjects fresh to this day first,
    /// then the empty option, then subjects repeating a day (the soft
    /// day-spread preference). Teacher order is shuffled.
    fn cell_options(
        &mut self,
        sec: usize,
        day: usize,
        remaining: usize,
        cells_left: usize,
    ) -> Vec<CellOption> {
        let mut fresh: Vec<usize> = Vec::new();
        let mut repeat: Vec<usize> = Vec::new();
        for (idx, demand) in self.plans[sec].demands.iter().enumerate() {
            if demand.remaining == 0 {
                continue;
            }
            let code = &self.roster.subjects[demand.subject_idx].code;
            if self.on_day(sec, day, code) == 0 {
                fresh.push(idx);
            } else {
                repeat.push(idx);
            }
        }
        let by_remaining = |demands: &[Demand], idx: &usize| std::cmp::Reverse(demands[*idx].remaining);
        fresh.sort_by_key(|idx| by_remaining(&self.plans[sec].demands, idx));
        repeat.sort_by_key(|idx| by_remaining(&self.plans[sec].demands, idx));

        let mut options = Vec::new();
        for idx in fresh {
            self.push_teacher_options(sec, idx, &mut options);
        }
        if cells_left - 1 >= remaining {
            options.push(CellOption::LeaveEmpty);
        }
        for idx in repeat {
            self.push_teacher_options(sec, idx, &mut options);
        }
        options
    }

    fn push_teacher_options(&mut self, sec: usize, demand: usize, options: &mut Vec<CellOption>) {
        let subject_idx = self.plans[sec].demands[demand].subject_idx;
        let mut teachers = self.capable[subject_idx].clone();
        teachers.shuffle(&mut self.rng);
        options.extend(
            teachers
                .into_iter()
                .map(|teacher| CellOption::Place { demand, teacher }),
        );
    }

    /// Occupied slots for `code` on `day` in the section's partial grid.
    fn on_day(&self, sec: usize, day: usize, code: &str) -> usize {
        self.grids[sec][day - 1]
            .iter()
            .flatten()
            .filter(|e| e.subject == code)
            .count()
    }

    /// Exclusivity plus the configured pluggable constraints.
    fn admissible(&self, sec: usize, day: usize, period: usize, demand: usize, teacher: usize) -> bool {
        if self.busy.contains(&(day, period, teacher)) {
            return false;
        }
        let plan = &self.plans[sec];
        let view = PlacementView {
            year: plan.year,
            section: plan.section,
            day,
            period,
            subject: &self.roster.subjects[plan.demands[demand].subject_idx],
            teacher: &self.roster.teachers[teacher],
            section_rows: &self.grids[sec],
            teacher_day_load: self.day_load.get(&(teacher, day)).copied().unwrap_or(0),
        };
        self.constraints.iter().all(|c| c.permits(&view))
    }

    fn apply(&mut self, sec: usize, day: usize, period: usize, demand: usize, teacher: usize) {
        let subject_idx = self.plans[sec].demands[demand].subject_idx;
        self.grids[sec][day - 1][period - 1] = Some(Entry::new(
            self.roster.subjects[subject_idx].code.clone(),
            self.roster.teachers[teacher].name.clone(),
        ));
        self.busy.insert((day, period, teacher));
        *self.day_load.entry((teacher, day)).or_insert(0) += 1;
        self.plans[sec].demands[demand].remaining -= 1;
    }

    fn undo(&mut self, sec: usize, day: usize, period: usize, demand: usize, teacher: usize) {
        self.grids[sec][day - 1][period - 1] = None;
        self.busy.remove(&(day, period, teacher));
        if let Some(load) = self.day_load.get_mut(&(teacher, day)) {
            *load -= 1;
        }
        self.plans[sec].demands[demand].remaining += 1;
    }

    fn spend_backtrack(&mut self) -> Result<(), SearchError> {
        self.backtracks += 1;
        if self.backtracks > self.max_backtracks {
            return Err(SearchError::BudgetExhausted {
                backtracks: self.backtracks,
            });
        }
        Ok(())
    }

    fn record_dead_end(&mut self, sec: usize, cell: usize) {
        if self.deepest_fail.is_some_and(|deepest| (sec, cell) < deepest) {
            return;
        }
        self.deepest_fail = Some((sec, cell));
        let plan = &self.plans[sec];
        self.blame = plan
            .demands
            .iter()
            .find(|d| d.remaining > 0)
            .map(|d| {
                (
                    self.roster.subjects[d.subject_idx].code.clone(),
                    plan.year,
                    plan.section,
                )
            });
    }
}
