//! Grid shape descriptor.
//!
//! A timetable grid is years × sections × days × periods. The structure
//! only describes the shape; the assignment content lives in
//! [`ScheduleSolution`](crate::solution::ScheduleSolution), which
//! reconciles itself whenever the structure is replaced.

use serde::{Deserialize, Serialize};

/// Shape of the timetable grid.
///
/// Years and sections are addressed 1-based: `(year, section)` is valid
/// iff `1 <= year <= year_count` and `1 <= section <= sections_in(year)`.
/// Days and periods are likewise 1-based throughout the crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStructure {
    /// Sections per year; index 0 is year 1.
    sections_per_year: Vec<usize>,
    /// Working days per week.
    days_per_week: usize,
    /// Teaching periods per day.
    periods_per_day: usize,
}

impl ScheduleStructure {
    /// Creates a structure from an explicit per-year section count.
    pub fn new(sections_per_year: Vec<usize>, days_per_week: usize, periods_per_day: usize) -> Self {
        Self {
            sections_per_year,
            days_per_week,
            periods_per_day,
        }
    }

    /// Creates a structure where every year has the same number of sections.
    pub fn uniform(
        years: usize,
        sections: usize,
        days_per_week: usize,
        periods_per_day: usize,
    ) -> Self {
        Self::new(vec![sections; years], days_per_week, periods_per_day)
    }

    /// Number of years in the grid.
    pub fn year_count(&self) -> usize {
        self.sections_per_year.len()
    }

    /// Number of sections in a year (0 if the year is out of bounds).
    pub fn sections_in(&self, year: usize) -> usize {
        if year == 0 {
            return 0;
        }
        self.sections_per_year.get(year - 1).copied().unwrap_or(0)
    }

    /// Working days per week.
    pub fn days_per_week(&self) -> usize {
        self.days_per_week
    }

    /// Teaching periods per day.
    pub fn periods_per_day(&self) -> usize {
        self.periods_per_day
    }

    /// Whether `(year, section)` addresses a section inside the grid.
    pub fn contains(&self, year: usize, section: usize) -> bool {
        section >= 1 && section <= self.sections_in(year)
    }

    /// Number of slots in one section's week.
    pub fn slots_per_week(&self) -> usize {
        self.days_per_week * self.periods_per_day
    }

    /// Iterates every `(year, section)` pair in scan order.
    pub fn sections(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sections_per_year
            .iter()
            .enumerate()
            .flat_map(|(y, &count)| (1..=count).map(move |s| (y + 1, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_structure() {
        let s = ScheduleStructure::uniform(3, 2, 5, 6);
        assert_eq!(s.year_count(), 3);
        assert_eq!(s.sections_in(1), 2);
        assert_eq!(s.sections_in(3), 2);
        assert_eq!(s.days_per_week(), 5);
        assert_eq!(s.periods_per_day(), 6);
        assert_eq!(s.slots_per_week(), 30);
    }

    #[test]
    fn test_ragged_sections() {
        let s = ScheduleStructure::new(vec![3, 1, 2], 5, 6);
        assert_eq!(s.sections_in(1), 3);
        assert_eq!(s.sections_in(2), 1);
        assert_eq!(s.sections_in(3), 2);
    }

    #[test]
    fn test_contains_bounds() {
        let s = ScheduleStructure::uniform(2, 2, 5, 6);
        assert!(s.contains(1, 1));
        assert!(s.contains(2, 2));
        assert!(!s.contains(0, 1));
        assert!(!s.contains(1, 0));
        assert!(!s.contains(3, 1));
        assert!(!s.contains(2, 3));
    }

    #[test]
    fn test_out_of_bounds_year() {
        let s = ScheduleStructure::uniform(2, 2, 5, 6);
        assert_eq!(s.sections_in(0), 0);
        assert_eq!(s.sections_in(99), 0);
    }

    #[test]
    fn test_section_iteration_order() {
        let s = ScheduleStructure::new(vec![2, 1], 5, 6);
        let pairs: Vec<_> = s.sections().collect();
        assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_empty_structure() {
        let s = ScheduleStructure::default();
        assert_eq!(s.year_count(), 0);
        assert_eq!(s.slots_per_week(), 0);
        assert!(s.sections().next().is_none());
    }
}
