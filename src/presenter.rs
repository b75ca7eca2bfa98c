use serde::Serialize;

use crate::models::{Program, Routine};

/// Read-only aggregates over a normalized program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramPresenter<'a> {
    program: &'a Program,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramSummary {
    pub name: String,
    pub weeks: u32,
    pub routines: usize,
    pub exercises: usize,
    pub sets: usize,
    pub periodized: bool,
}

impl<'a> ProgramPresenter<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Routines in the first week; every week of a replicated program has the same list.
    pub fn routine_count(&self) -> usize {
        self.first_week_routines().len()
    }

    pub fn total_exercises(&self) -> usize {
        self.first_week_routines()
            .iter()
            .map(|r| r.exercises.len())
            .sum()
    }

    pub fn program_weeks(&self) -> u32 {
        self.program.duration_weeks
    }

    /// Routines scheduled for `week_number` (1-based). Empty when the week does not exist.
    pub fn week_routines(&self, week_number: u32) -> &'a [Routine] {
        self.program
            .week(week_number)
            .map(|w| w.routines.as_slice())
            .unwrap_or(&[])
    }

    /// Every set across every week, routine and exercise.
    pub fn total_sets(&self) -> usize {
        self.program
            .weeks
            .iter()
            .flat_map(|w| w.routines.iter())
            .flat_map(|r| r.exercises.iter())
            .map(|e| e.prescription.sets().count())
            .sum()
    }

    pub fn summary(&self) -> ProgramSummary {
        ProgramSummary {
            name: self.program.name.clone(),
            weeks: self.program_weeks(),
            routines: self.routine_count(),
            exercises: self.total_exercises(),
            sets: self.total_sets(),
            periodized: self.program.is_periodized,
        }
    }

    fn first_week_routines(&self) -> &'a [Routine] {
        self.program
            .weeks
            .first()
            .map(|w| w.routines.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_program;
    use serde_json::json;

    fn program() -> Program {
        let raw = json!({
            "name": "Upper/Lower",
            "isPeriodized": true,
            "durationWeeks": 2,
            "routines": [
                { "name": "Upper", "exercises": [
                    { "name": "Bench", "sets": [{}, {}, {}] },
                    { "name": "Row", "sets": [{}, {}] }
                ]},
                { "name": "Lower", "exercises": [
                    { "name": "Squat", "sets": [{}] }
                ]}
            ]
        });
        normalize_program(&raw, None).unwrap().program
    }

    #[test]
    fn counts_come_from_the_first_week() {
        let program = program();
        let presenter = ProgramPresenter::new(&program);

        assert_eq!(presenter.routine_count(), 2);
        assert_eq!(presenter.total_exercises(), 3);
        assert_eq!(presenter.program_weeks(), 2);
        assert_eq!(presenter.total_sets(), 12);
    }

    #[test]
    fn week_slices_degrade_to_empty() {
        let program = program();
        let presenter = ProgramPresenter::new(&program);

        assert_eq!(presenter.week_routines(2).len(), 2);
        assert_eq!(presenter.week_routines(2)[1].name, "Lower");
        assert!(presenter.week_routines(9).is_empty());
    }

    #[test]
    fn empty_program_reports_zeroes() {
        let program = Program {
            name: "Empty".into(),
            description: None,
            duration_weeks: 1,
            is_periodized: false,
            weeks: Vec::new(),
            extra: Default::default(),
        };
        let summary = ProgramPresenter::new(&program).summary();

        assert_eq!(summary.routines, 0);
        assert_eq!(summary.exercises, 0);
        assert_eq!(summary.sets, 0);
    }
}
