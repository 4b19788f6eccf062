//! Client-side state for the gradebook
//!
//! Owned state objects the front end holds and passes around explicitly:
//! the signed-in session, the grades cache, persisted settings. Derived
//! values (averages, labels, calendar weeks, display times) are pure
//! functions over them.

pub mod calendar;
pub mod display;
pub mod error;
pub mod grades;
pub mod session;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use calendar::{TodayInfo, WorkingDay, build_calendar_week};
pub use error::{Error, Result};
pub use grades::{GradeEntry, GradeStats, GradeTier, GradesCache, SubjectWithGrades};
pub use session::{Session, SessionState, SessionUser};
pub use settings::{NotificationKind, NotificationToggles, Settings, SettingsStore};
