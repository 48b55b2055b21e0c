//! Core data models for the sleep diary.

mod record;
mod stats;
mod user;

pub use record::*;
pub use stats::*;
pub use user::*;
