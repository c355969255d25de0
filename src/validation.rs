//! Validation of direct section edits.
//!
//! A direct edit replaces one `(year, section)` of the grid wholesale.
//! Before anything is written the candidate rows are checked against:
//! - the grid bounds and the `days × periods` rectangular shape,
//! - the roster (every referenced teacher and subject must exist),
//! - teacher capability for each placed subject,
//! - teacher exclusivity against every *other* section's current slots,
//! - exact weekly-hour quotas for every subject of the target section.
//!
//! The first violation found is returned and nothing is written; the
//! caller's grid is byte-for-byte unchanged on rejection.

use std::collections::HashMap;

use crate::models::Roster;
use crate::solution::{ScheduleSolution, SectionRows, SolutionError};

/// Checks a candidate section replacement without applying it.
///
/// Used by [`ScheduleSolution::set_section`]; exposed so callers can
/// dry-run an edit before committing it.
pub fn validate_section_edit(
    solution: &ScheduleSolution,
    year: usize,
    section: usize,
    rows: &SectionRows,
    roster: &Roster,
) -> Result<(), SolutionError> {
    solution.by_section(year, section)?;
    check_shape(solution, rows)?;
    check_roster_references(year, section, rows, roster)?;
    check_exclusivity(solution, year, section, rows)?;
    check_quotas(year, section, rows, roster)
}

fn check_shape(solution: &ScheduleSolution, rows: &SectionRows) -> Result<(), SolutionError> {
    let days = solution.days_per_week();
    let periods = solution.periods_per_day();
    let got_days = rows.len();
    let got_periods = rows.iter().map(Vec::len).max().unwrap_or(0);
    let rectangular = rows.iter().all(|row| row.len() == periods);
    if got_days != days || !rectangular {
        return Err(SolutionError::ShapeMismatch {
            days,
            periods,
            got_days,
            got_periods,
        });
    }
    Ok(())
}

fn check_roster_references(
    year: usize,
    section: usize,
    rows: &SectionRows,
    roster: &Roster,
) -> Result<(), SolutionError> {
    for entry in rows.iter().flatten().flatten() {
        let subject = roster
            .subject(&entry.subject)
            .ok_or_else(|| SolutionError::UnknownSubject(entry.subject.clone()))?;
        let teacher = roster
            .teacher(&entry.teacher)
            .ok_or_else(|| SolutionError::UnknownTeacher(entry.teacher.clone()))?;
        if !teacher.can_teach(&entry.subject) {
            return Err(SolutionError::IncapableTeacher {
                teacher: entry.teacher.clone(),
                subject: entry.subject.clone(),
            });
        }
        if !subject.applies_to(year, section) {
            return Err(SolutionError::NotApplicable {
                subject: entry.subject.clone(),
                year,
                section,
            });
        }
    }
    Ok(())
}

/// No teacher in `rows` may already hold the same `(day, period)` in any
/// other section of the current grid.
fn check_exclusivity(
    solution: &ScheduleSolution,
    year: usize,
    section: usize,
    rows: &SectionRows,
) -> Result<(), SolutionError> {
    for (d, row) in rows.iter().enumerate() {
        for (p, cell) in row.iter().enumerate() {
            let Some(entry) = cell else { continue };
            let (day, period) = (d + 1, p + 1);
            for (other_year, sections) in solution.all().iter().enumerate() {
                for (other_section, _) in sections.iter().enumerate() {
                    let (oy, os) = (other_year + 1, other_section + 1);
                    if (oy, os) == (year, section) {
                        continue;
                    }
                    let taken = solution
                        .entry(oy, os, day, period)
                        .is_some_and(|e| e.teacher == entry.teacher);
                    if taken {
                        return Err(SolutionError::TeacherConflict {
                            teacher: entry.teacher.clone(),
                            day,
                            period,
                            other_year: oy,
                            other_section: os,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Every subject applicable to the section must appear exactly
/// `weekly_hours` times — not merely at most.
fn check_quotas(
    year: usize,
    section: usize,
    rows: &SectionRows,
    roster: &Roster,
) -> Result<(), SolutionError> {
    let mut placed: HashMap<&str, usize> = HashMap::new();
    for entry in rows.iter().flatten().flatten() {
        *placed.entry(entry.subject.as_str()).or_insert(0) += 1;
    }
    for subject in roster.subjects_for(year, section) {
        let got = placed.get(subject.code.as_str()).copied().unwrap_or(0);
        if got != subject.weekly_hours {
            return Err(SolutionError::QuotaMismatch {
                subject: subject.code.clone(),
                year,
                section,
                required: subject.weekly_hours,
                placed: got,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleStructure, Subject, Teacher};
    use crate::solution::Entry;

    fn structure() -> ScheduleStructure {
        ScheduleStructure::uniform(1, 2, 2, 2)
    }

    fn roster() -> Roster {
        Roster::new()
            .with_teacher(Teacher::new("T1").with_subject("MATH"))
            .with_subject(Subject::new("MATH", 1).with_section(1, 1))
    }

    fn empty_rows() -> SectionRows {
        vec![vec![None; 2]; 2]
    }

    fn math_rows(day: usize, period: usize) -> SectionRows {
        let mut rows = empty_rows();
        rows[day - 1][period - 1] = Some(Entry::new("MATH", "T1"));
        rows
    }

    #[test]
    fn test_valid_edit() {
        let sol = ScheduleSolution::new(&structure());
        assert!(validate_section_edit(&sol, 1, 1, &math_rows(1, 1), &roster()).is_ok());
    }

    #[test]
    fn test_shape_mismatch() {
        let sol = ScheduleSolution::new(&structure());
        let ragged = vec![vec![None, None], vec![None]];
        let err = validate_section_edit(&sol, 1, 1, &ragged, &roster()).unwrap_err();
        assert!(matches!(err, SolutionError::ShapeMismatch { .. }));

        let short = vec![vec![None, None]];
        let err = validate_section_edit(&sol, 1, 1, &short, &roster()).unwrap_err();
        assert!(matches!(err, SolutionError::ShapeMismatch { got_days: 1, .. }));
    }

    #[test]
    fn test_unknown_subject() {
        let sol = ScheduleSolution::new(&structure());
        let mut rows = math_rows(1, 1);
        rows[1][1] = Some(Entry::new("ART", "T1"));
        let err = validate_section_edit(&sol, 1, 1, &rows, &roster()).unwrap_err();
        assert_eq!(err, SolutionError::UnknownSubject("ART".into()));
    }

    #[test]
    fn test_incapable_teacher() {
        let sol = ScheduleSolution::new(&structure());
        let roster = roster()
            .with_teacher(Teacher::new("T2").with_subject("ENG"))
            .with_subject(Subject::new("ENG", 0));
        let mut rows = empty_rows();
        rows[0][0] = Some(Entry::new("MATH", "T2"));
        let err = validate_section_edit(&sol, 1, 1, &rows, &roster).unwrap_err();
        assert_eq!(
            err,
            SolutionError::IncapableTeacher {
                teacher: "T2".into(),
                subject: "MATH".into(),
            }
        );
    }

    #[test]
    fn test_not_applicable_subject() {
        // MATH only applies to (1,1); placing it in (1,2) is rejected.
        let sol = ScheduleSolution::new(&structure());
        let err = validate_section_edit(&sol, 1, 2, &math_rows(1, 1), &roster()).unwrap_err();
        assert_eq!(
            err,
            SolutionError::NotApplicable {
                subject: "MATH".into(),
                year: 1,
                section: 2,
            }
        );
    }

    #[test]
    fn test_quota_must_be_exact() {
        let sol = ScheduleSolution::new(&structure());

        // Zero placements when one is required.
        let err = validate_section_edit(&sol, 1, 1, &empty_rows(), &roster()).unwrap_err();
        assert_eq!(
            err,
            SolutionError::QuotaMismatch {
                subject: "MATH".into(),
                year: 1,
                section: 1,
                required: 1,
                placed: 0,
            }
        );

        // Two placements when one is required.
        let mut rows = math_rows(1, 1);
        rows[1][0] = Some(Entry::new("MATH", "T1"));
        let err = validate_section_edit(&sol, 1, 1, &rows, &roster()).unwrap_err();
        assert!(matches!(err, SolutionError::QuotaMismatch { placed: 2, .. }));
    }

    #[test]
    fn test_cross_section_conflict() {
        let roster = Roster::new()
            .with_teacher(Teacher::new("T1").with_subject("MATH"))
            .with_subject(Subject::new("MATH", 1).with_section(1, 1).with_section(1, 2));
        let mut sol = ScheduleSolution::new(&structure());
        sol.set_section(1, 1, math_rows(1, 1), &roster).unwrap();

        let err = validate_section_edit(&sol, 1, 2, &math_rows(1, 1), &roster).unwrap_err();
        assert!(matches!(err, SolutionError::TeacherConflict { day: 1, period: 1, .. }));

        // A different slot is fine.
        assert!(validate_section_edit(&sol, 1, 2, &math_rows(1, 2), &roster).is_ok());
    }
}
