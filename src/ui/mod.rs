//! Terminal output helpers

pub mod progress;

pub use progress::{ProgressMessage, ProgressReporter};
