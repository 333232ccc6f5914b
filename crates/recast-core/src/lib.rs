//! Core shared types for Recast.
//!
//! This crate is intentionally small: text ranges and edit trees, the
//! refactoring status accumulator, and the cooperative cancellation/progress
//! handles threaded through change creation.

mod progress;
mod status;
mod text;

pub use progress::{CancellationToken, Cancelled, ProgressMonitor};
pub use status::{RefactoringStatus, Severity, StatusEntry};
pub use text::{apply_edit, Applied, Edit, EditError, MultiEdit, TextEdit, TextRange};
