//! Import, normalize, review and send spreadsheet-derived training programs.

pub mod db;
pub mod dispatch;
pub mod loader;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod presenter;
pub mod roster;
pub mod storage;
pub mod types;
pub mod utils;

pub use dispatch::{DispatchError, DispatchReceipt, Dispatcher};
pub use loader::{ClientSource, ImportSource, LoadError, LoadOutcome, ReviewLoader, ReviewState};
pub use models::{Exercise, ExerciseWeek, ImportDocument, Prescription, Program, Routine, Set, Week};
pub use normalize::{NormalizationReport, NormalizeError, normalize, normalize_program, normalize_with_report};
pub use presenter::{ProgramPresenter, ProgramSummary};
pub use roster::ClientRoster;
