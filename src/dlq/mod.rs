//! Dead-letter-queue consumer that marks failed ingestion tasks on the management API

pub mod classify;
pub mod handler;
pub mod reporter;

pub use handler::{DlqDeps, function_handler as handler, process_batch};
pub use reporter::{HttpStatusReporter, StatusReporter};
