use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{
    Exercise, ExerciseWeek, ImportDocument, Prescription, Program, Routine, Set, Week,
};

pub const DEFAULT_PROGRAM_NAME: &str = "Untitled Program";
pub const DEFAULT_DURATION_WEEKS: u32 = 4;
/// Longest program the normalizer will replicate routines into. Anything
/// larger is treated as an invalid duration.
pub const MAX_DURATION_WEEKS: u32 = 104;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no import data was provided")]
    MissingImport,

    #[error("import has no program data")]
    MissingProgramData,
}

/// A normalized program plus what the normalizer had to throw away.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport {
    pub program: Program,
    /// Input weeks dropped when a non-periodized program was collapsed to one week.
    pub discarded_weeks: usize,
}

pub fn normalize(import: Option<&ImportDocument>) -> Result<Program, NormalizeError> {
    normalize_with_report(import).map(|r| r.program)
}

pub fn normalize_with_report(
    import: Option<&ImportDocument>,
) -> Result<NormalizationReport, NormalizeError> {
    let import = import.ok_or(NormalizeError::MissingImport)?;
    let raw = import
        .program
        .as_ref()
        .ok_or(NormalizeError::MissingProgramData)?;

    normalize_program(raw, import.name.as_deref())
}

/// Turns a raw imported program object into the canonical `weeks`-based shape.
///
/// `name_override` is the import's own label and wins over the name embedded in
/// the program. Only a missing or non-object `raw` is an error; every other
/// malformed field is replaced with its default.
pub fn normalize_program(
    raw: &Value,
    name_override: Option<&str>,
) -> Result<NormalizationReport, NormalizeError> {
    let mut rest = raw
        .as_object()
        .ok_or(NormalizeError::MissingProgramData)?
        .clone();

    let embedded_name = rest
        .remove("name")
        .as_ref()
        .and_then(text)
        .filter(|n| !n.is_empty());
    let name = name_override
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or(embedded_name)
        .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string());

    let description = take(&mut rest, "description", |v| v.as_str().map(str::to_string));
    let requested_weeks = positive_int(rest.remove("durationWeeks").as_ref())
        .filter(|w| *w <= MAX_DURATION_WEEKS)
        .unwrap_or(DEFAULT_DURATION_WEEKS);
    let is_periodized = matches!(rest.remove("isPeriodized"), Some(Value::Bool(true)));

    let raw_weeks = non_empty_array(rest.remove("weeks"));
    let raw_routines = non_empty_array(rest.remove("routines"));

    let mut discarded_weeks = 0;
    let weeks = if is_periodized {
        if let Some(weeks) = raw_weeks {
            debug!(weeks = weeks.len(), "periodized program already has weeks");
            weeks
                .iter()
                .enumerate()
                .map(|(i, w)| week_from(i, w))
                .collect()
        } else if let Some(routines) = raw_routines {
            debug!(
                weeks = requested_weeks,
                routines = routines.len(),
                "replicating routines into every week"
            );
            let routines = routines_from(&routines);
            (1..=requested_weeks)
                .map(|week_number| Week {
                    week_number,
                    routines: routines.clone(),
                    extra: Map::new(),
                })
                .collect()
        } else {
            debug!(weeks = requested_weeks, "periodized program has no routines");
            (1..=requested_weeks)
                .map(|week_number| Week {
                    week_number,
                    routines: Vec::new(),
                    extra: Map::new(),
                })
                .collect()
        }
    } else {
        let week = if let Some(weeks) = raw_weeks {
            discarded_weeks = weeks.len() - 1;
            if discarded_weeks > 0 {
                warn!(
                    discarded = discarded_weeks,
                    "non-periodized program keeps only its first week"
                );
            }
            let mut first = week_from(0, &weeks[0]);
            first.week_number = 1;
            first
        } else {
            Week {
                week_number: 1,
                routines: raw_routines.as_deref().map(routines_from).unwrap_or_default(),
                extra: Map::new(),
            }
        };
        vec![week]
    };

    let duration_weeks = if is_periodized {
        u32::try_from(weeks.len()).unwrap_or(u32::MAX)
    } else {
        1
    };

    Ok(NormalizationReport {
        program: Program {
            name,
            description,
            duration_weeks,
            is_periodized,
            weeks,
            extra: rest,
        },
        discarded_weeks,
    })
}

/// Program weeks are numbered by position so they stay 1-based and contiguous,
/// whatever numbers the import carried.
fn week_from(index: usize, value: &Value) -> Week {
    let mut rest = value.as_object().cloned().unwrap_or_default();
    rest.remove("weekNumber");
    let week_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
    let routines = non_empty_array(rest.remove("routines"))
        .as_deref()
        .map(routines_from)
        .unwrap_or_default();

    Week {
        week_number,
        routines,
        extra: rest,
    }
}

fn routines_from(values: &[Value]) -> Vec<Routine> {
    values.iter().map(routine_from).collect()
}

fn routine_from(value: &Value) -> Routine {
    let mut rest = value.as_object().cloned().unwrap_or_default();
    let name = rest.remove("name").as_ref().and_then(text).unwrap_or_default();
    let exercises = match rest.remove("exercises") {
        Some(Value::Array(items)) => items.iter().map(exercise_from).collect(),
        _ => Vec::new(),
    };

    Routine {
        name,
        exercises,
        extra: rest,
    }
}

fn exercise_from(value: &Value) -> Exercise {
    let mut rest = value.as_object().cloned().unwrap_or_default();
    let name = rest.remove("name").as_ref().and_then(text).unwrap_or_default();

    // Per-week progressions win; a flat `sets` beside them is left alone.
    let prescription = match take(&mut rest, "weeks", |v| v.as_array().cloned()) {
        Some(weeks) => Prescription::Periodized(
            weeks
                .iter()
                .enumerate()
                .map(|(i, w)| exercise_week_from(i, w))
                .collect(),
        ),
        None => Prescription::Flat(match rest.remove("sets") {
            Some(Value::Array(sets)) => sets_from(&sets),
            _ => Vec::new(),
        }),
    };

    Exercise {
        name,
        prescription,
        extra: rest,
    }
}

fn exercise_week_from(index: usize, value: &Value) -> ExerciseWeek {
    let mut rest = value.as_object().cloned().unwrap_or_default();
    let week_number = number_or_position(rest.remove("weekNumber").as_ref(), index);
    let sets = match rest.remove("sets") {
        Some(Value::Array(sets)) => sets_from(&sets),
        _ => Vec::new(),
    };

    ExerciseWeek {
        week_number,
        sets,
        extra: rest,
    }
}

fn sets_from(values: &[Value]) -> Vec<Set> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| set_from(i, v))
        .collect()
}

fn set_from(index: usize, value: &Value) -> Set {
    let mut rest = value.as_object().cloned().unwrap_or_default();

    Set {
        set_number: number_or_position(rest.remove("setNumber").as_ref(), index),
        reps: rest.remove("reps"),
        weight: rest.remove("weight"),
        rpe: rest.remove("rpe"),
        rest: rest.remove("rest"),
        notes: take(&mut rest, "notes", |v| v.as_str().map(str::to_string)),
        warmup: take(&mut rest, "warmup", Value::as_bool),
        extra: rest,
    }
}

/// Removes `key` from `rest` only when `pick` accepts its value, so a value of
/// the wrong type survives untouched.
fn take<T>(
    rest: &mut Map<String, Value>,
    key: &str,
    pick: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let picked = rest.get(key).and_then(pick)?;
    rest.remove(key);
    Some(picked)
}

fn non_empty_array(value: Option<Value>) -> Option<Vec<Value>> {
    match value {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A JSON integer (or integral float) greater than zero.
pub(crate) fn positive_int(value: Option<&Value>) -> Option<u32> {
    let Some(Value::Number(n)) = value else {
        return None;
    };

    if let Some(u) = n.as_u64() {
        return u32::try_from(u).ok().filter(|u| *u > 0);
    }

    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
        .map(|f| f as u32)
}

fn number_or_position(value: Option<&Value>, index: usize) -> u32 {
    positive_int(value).unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positive_int_accepts_only_whole_positive_numbers() {
        assert_eq!(positive_int(Some(&json!(3))), Some(3));
        assert_eq!(positive_int(Some(&json!(3.0))), Some(3));
        assert_eq!(positive_int(Some(&json!(2.5))), None);
        assert_eq!(positive_int(Some(&json!(0))), None);
        assert_eq!(positive_int(Some(&json!(-2))), None);
        assert_eq!(positive_int(Some(&json!("3"))), None);
        assert_eq!(positive_int(None), None);
    }

    #[test]
    fn bad_duration_falls_back_to_four_weeks() {
        let too_long = json!(u64::from(u32::MAX));
        let just_over = json!(MAX_DURATION_WEEKS + 1);
        for duration in [
            json!(0),
            json!(-1),
            json!("six"),
            json!(1.5),
            Value::Null,
            too_long,
            just_over,
        ] {
            let raw = json!({ "isPeriodized": true, "durationWeeks": duration });
            let report = normalize_program(&raw, None).unwrap();
            assert_eq!(report.program.duration_weeks, DEFAULT_DURATION_WEEKS);
            assert_eq!(report.program.weeks.len(), 4);
        }
    }

    #[test]
    fn longest_allowed_duration_is_kept() {
        let raw = json!({ "isPeriodized": true, "durationWeeks": MAX_DURATION_WEEKS });
        let program = normalize_program(&raw, None).unwrap().program;
        assert_eq!(program.duration_weeks, MAX_DURATION_WEEKS);
        assert_eq!(program.weeks.len(), MAX_DURATION_WEEKS as usize);
    }

    #[test]
    fn override_name_wins_over_embedded_name() {
        let raw = json!({ "name": "Embedded" });
        assert_eq!(
            normalize_program(&raw, Some("Label")).unwrap().program.name,
            "Label"
        );
        assert_eq!(
            normalize_program(&raw, Some("")).unwrap().program.name,
            "Embedded"
        );
        for raw in [json!({}), json!({ "name": "" })] {
            assert_eq!(
                normalize_program(&raw, None).unwrap().program.name,
                DEFAULT_PROGRAM_NAME
            );
        }
    }

    #[test]
    fn non_object_program_is_missing_data() {
        for raw in [Value::Null, json!([1, 2]), json!("program")] {
            assert_eq!(
                normalize_program(&raw, None).unwrap_err(),
                NormalizeError::MissingProgramData
            );
        }
    }

    #[test]
    fn mistyped_optional_fields_are_kept_verbatim() {
        let raw = json!({
            "routines": [{
                "name": "A",
                "exercises": [{
                    "name": "Row",
                    "tempo": "3-1-1",
                    "sets": [{ "reps": "8-10", "notes": 7, "warmup": "yes" }]
                }]
            }]
        });
        let program = normalize_program(&raw, None).unwrap().program;
        let exercise = &program.weeks[0].routines[0].exercises[0];
        assert_eq!(exercise.extra.get("tempo"), Some(&json!("3-1-1")));

        let Prescription::Flat(sets) = &exercise.prescription else {
            panic!("expected flat sets");
        };
        assert_eq!(sets[0].reps, Some(json!("8-10")));
        assert_eq!(sets[0].notes, None);
        assert_eq!(sets[0].extra.get("notes"), Some(&json!(7)));
        assert_eq!(sets[0].extra.get("warmup"), Some(&json!("yes")));
    }

    #[test]
    fn periodized_exercise_keeps_unused_flat_sets() {
        let raw = json!({
            "routines": [{
                "name": "A",
                "exercises": [{
                    "name": "Bench",
                    "weeks": [{ "sets": [{}, {}] }],
                    "sets": [{ "reps": 1 }]
                }]
            }]
        });
        let program = normalize_program(&raw, None).unwrap().program;
        let exercise = &program.weeks[0].routines[0].exercises[0];

        let Prescription::Periodized(weeks) = &exercise.prescription else {
            panic!("expected per-week progressions");
        };
        assert_eq!(weeks[0].week_number, 1);
        assert_eq!(
            weeks[0].sets.iter().map(|s| s.set_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(exercise.extra.get("sets"), Some(&json!([{ "reps": 1 }])));
    }
}
