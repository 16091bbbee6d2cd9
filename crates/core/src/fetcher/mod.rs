//! Fetch stage: brings a task's source bytes onto local disk.
//!
//! Remote sources are streamed over HTTP into the incoming directory; manual
//! uploads already on disk are a pass-through copy. Cancellation is polled at
//! every chunk boundary and partial files never outlive the stage.

mod error;
mod http;
mod traits;

pub use error::FetchError;
pub use http::{sanitize_filename, HttpFetcher};
pub use traits::Fetcher;
