use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{ClientStatus, ImportStatus};

/// Canonical, normalized training program.
/// There is no top-level `routines` field: every routine lives under `weeks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration_weeks: u32,
    pub is_periodized: bool,
    pub weeks: Vec<Week>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Program {
    /// Projects the program back into the raw import shape, with the legacy
    /// `routines` field present and empty.
    pub fn to_raw(&self) -> Value {
        let mut raw = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        raw.insert("routines".into(), Value::Array(Vec::new()));
        Value::Object(raw)
    }

    pub fn week(&self, week_number: u32) -> Option<&Week> {
        self.weeks.iter().find(|w| w.week_number == week_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub week_number: u32,
    pub routines: Vec<Routine>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named collection of exercises performed in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    pub exercises: Vec<Exercise>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(flatten)]
    pub prescription: Prescription,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How an exercise's sets are laid out.
/// Serialized as either a `weeks` or a `sets` key on the exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Prescription {
    /// Per-week progressions.
    #[serde(rename = "weeks")]
    Periodized(Vec<ExerciseWeek>),
    #[serde(rename = "sets")]
    Flat(Vec<Set>),
}

impl Prescription {
    /// Every set across all weeks, in order.
    pub fn sets(&self) -> Box<dyn Iterator<Item = &Set> + '_> {
        match self {
            Self::Periodized(weeks) => Box::new(weeks.iter().flat_map(|w| w.sets.iter())),
            Self::Flat(sets) => Box::new(sets.iter()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseWeek {
    pub week_number: u32,
    pub sets: Vec<Set>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One prescribed set.
/// `reps`, `weight`, `rpe` and `rest` keep whatever JSON the spreadsheet produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    pub set_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored program import as read from the document store.
/// `program` is the raw, un-normalized payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDocument {
    pub id: String,
    pub name: Option<String>,
    pub program: Option<Value>,
    pub status: ImportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets_url: Option<String>,
}

/// A trainer's client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub status: ClientStatus,
    pub linked: bool,
}

impl Client {
    pub fn is_reachable(&self) -> bool {
        self.linked && self.status == ClientStatus::Active
    }
}
