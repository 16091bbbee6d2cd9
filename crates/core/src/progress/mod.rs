//! Throttled, idempotent progress reporting to the chat surface.
//!
//! Stage runners call [`TaskReporter::report`] as often as they like; the
//! reporter bounds the edit rate of the underlying message so the chat API
//! never sees one edit per 512 KB chunk. Stage entry and completion always
//! emit, regardless of throttling.

mod format;
mod reporter;

pub use format::{eta_secs, format_bytes, format_duration, percent, progress_bar, speed};
pub use reporter::{ProgressReporter, TaskReporter};
