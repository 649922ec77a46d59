//! Data models for the membership dashboard.
//!
//! Wire forms are camelCase to match the frontend interfaces exactly.

mod camp;
mod event;
mod follow_up;
mod member;
mod user;

pub use camp::*;
pub use event::*;
pub use follow_up::*;
pub use member::*;
pub use user::*;
