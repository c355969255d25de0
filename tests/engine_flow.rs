//! End-to-end engine flows.
//!
//! Exercises the full request lifecycle against the public surface:
//! generate into the shared grid, supersede an in-flight run, purge on
//! roster deletions, reject invalid direct edits, and survive structure
//! replacement.

use std::collections::HashSet;

use timetable_engine::{
    Entry, GenerateError, Roster, ScheduleStructure, SchedulerEngine, SectionRows, SolutionError,
    Subject, Teacher,
};

fn one_section_structure() -> ScheduleStructure {
    ScheduleStructure::uniform(1, 1, 5, 6)
}

fn math_roster(quota: usize) -> Roster {
    Roster::new()
        .with_teacher(Teacher::new("T1").with_subject("MATH"))
        .with_subject(Subject::new("MATH", quota).with_section(1, 1))
}

#[tokio::test]
async fn generated_grid_meets_quota_exactly() {
    let engine = SchedulerEngine::new(one_section_structure());
    let outcome = engine.generate(&math_roster(3)).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));

    let solution = engine.solution();
    let grid = solution.read().await;
    // Exactly 3 of the 30 slots carry (MATH, T1); 27 stay empty.
    assert_eq!(grid.occupied_count(), 3);
    let rows = grid.by_section(1, 1).unwrap();
    for entry in rows.iter().flatten().flatten() {
        assert_eq!(entry, &Entry::new("MATH", "T1"));
    }
}

#[tokio::test]
async fn infeasible_quota_reports_and_preserves_grid() {
    let engine = SchedulerEngine::new(one_section_structure());

    // A prior feasible run fills the grid.
    let outcome = engine.generate(&math_roster(3)).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));
    let solution = engine.solution();
    let before = solution.read().await.clone();

    // 31 required hours cannot fit 30 slots.
    let outcome = engine.generate(&math_roster(31)).await;
    match outcome.await.unwrap() {
        Err(GenerateError::Unsatisfiable { subject, year, section }) => {
            assert_eq!(subject, "MATH");
            assert_eq!((year, section), (1, 1));
        }
        other => panic!("expected infeasibility, got {other:?}"),
    }
    assert_eq!(*solution.read().await, before);
}

#[tokio::test]
async fn deleting_teacher_empties_grid() {
    let engine = SchedulerEngine::new(one_section_structure());
    let outcome = engine.generate(&math_roster(3)).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));

    assert_eq!(engine.remove_teacher("T1").await, 3);
    let solution = engine.solution();
    let grid = solution.read().await;
    assert!(grid.is_empty());
    assert!(grid.teacher_schedule("T1").is_empty());
}

#[tokio::test]
async fn multi_section_generation_respects_teacher_exclusivity() {
    let structure = ScheduleStructure::uniform(2, 2, 5, 6);
    let mut math = Subject::new("MATH", 4);
    let mut eng = Subject::new("ENG", 3);
    for (year, section) in structure.sections() {
        math = math.with_section(year, section);
        eng = eng.with_section(year, section);
    }
    let roster = Roster::new()
        .with_teacher(Teacher::new("T1").with_subject("MATH"))
        .with_teacher(Teacher::new("T2").with_subject("MATH"))
        .with_teacher(Teacher::new("T3").with_subject("MATH"))
        .with_teacher(Teacher::new("T4").with_subject("MATH"))
        .with_teacher(Teacher::new("T5").with_subject("ENG"))
        .with_teacher(Teacher::new("T6").with_subject("ENG"))
        .with_teacher(Teacher::new("T7").with_subject("ENG"))
        .with_teacher(Teacher::new("T8").with_subject("ENG"))
        .with_subject(math)
        .with_subject(eng);

    let engine = SchedulerEngine::new(structure.clone());
    let outcome = engine.generate(&roster).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));

    let solution = engine.solution();
    let grid = solution.read().await;
    // 4 sections x (4 + 3) hours.
    assert_eq!(grid.occupied_count(), 28);

    // No teacher twice in the same (day, period) across sections.
    let mut taken: HashSet<(usize, usize, String)> = HashSet::new();
    for (year, section) in structure.sections() {
        let rows = grid.by_section(year, section).unwrap();
        for (d, row) in rows.iter().enumerate() {
            for (p, cell) in row.iter().enumerate() {
                if let Some(entry) = cell {
                    assert!(
                        taken.insert((d + 1, p + 1, entry.teacher.clone())),
                        "{} double-booked at day {} period {}",
                        entry.teacher,
                        d + 1,
                        p + 1,
                    );
                }
            }
        }
    }

    // Per-section quotas are exact.
    for (year, section) in structure.sections() {
        let rows = grid.by_section(year, section).unwrap();
        let math_hours = rows
            .iter()
            .flatten()
            .flatten()
            .filter(|e| e.subject == "MATH")
            .count();
        assert_eq!(math_hours, 4, "MATH quota in {year}/{section}");
    }
}

#[tokio::test]
async fn direct_edit_rejection_leaves_grid_identical() {
    let engine = SchedulerEngine::new(one_section_structure());
    let roster = math_roster(3);
    let outcome = engine.generate(&roster).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));
    let solution = engine.solution();
    let before = solution.read().await.clone();

    // Rows referencing a teacher the roster no longer knows.
    let mut rows: SectionRows = vec![vec![None; 6]; 5];
    rows[0][0] = Some(Entry::new("MATH", "DELETED"));
    rows[1][0] = Some(Entry::new("MATH", "T1"));
    rows[2][0] = Some(Entry::new("MATH", "T1"));
    let err = engine.edit_section(1, 1, rows, &roster).await.unwrap_err();
    assert_eq!(err, SolutionError::UnknownTeacher("DELETED".into()));
    assert_eq!(*solution.read().await, before);
}

#[tokio::test]
async fn structure_replacement_reshapes_grid() {
    let engine = SchedulerEngine::new(one_section_structure());
    let outcome = engine.generate(&math_roster(3)).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));

    // Grow the grid: existing assignments survive, new cells are empty.
    engine.update_structure(ScheduleStructure::uniform(2, 2, 5, 6)).await;
    let solution = engine.solution();
    let grid = solution.read().await;
    assert_eq!(grid.occupied_count(), 3);
    assert!(grid.by_section(2, 2).unwrap().iter().flatten().all(Option::is_none));
}

#[tokio::test]
async fn regeneration_replaces_previous_solution_wholesale() {
    let engine = SchedulerEngine::new(one_section_structure());
    let outcome = engine.generate(&math_roster(3)).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));

    // A second run against a smaller quota must fully replace the grid,
    // not merge with it.
    let outcome = engine.generate(&math_roster(1)).await;
    assert_eq!(outcome.await.unwrap(), Ok(()));
    let solution = engine.solution();
    assert_eq!(solution.read().await.occupied_count(), 1);
}
