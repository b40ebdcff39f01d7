//! Draft composition.
//!
//! This module provides:
//! - The [`Composer`] state machine owning one draft
//! - Submission status and the read-only view handed to a UI
//! - Errors for operations called in the wrong state

mod machine;
mod types;

pub use machine::Composer;
pub use types::{
    ComposerView, Draft, OperationError, SubmissionStatus, SubmitError, TextField,
};

pub use crate::validation::Field;
