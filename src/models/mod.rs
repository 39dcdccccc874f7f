//! Data models for the onboarding backend.
//!
//! Field names serialize in camelCase for the dashboard, except the legacy
//! progress records which keep their legacy snake_case wire shape.

mod catalog;
mod checklist;
mod period;
mod trainee;

pub use catalog::*;
pub use checklist::*;
pub use period::*;
pub use trainee::*;
