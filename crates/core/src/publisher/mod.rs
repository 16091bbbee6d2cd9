//! Publish stage: delivers the transcoded artifact to the destination
//! surface.

mod error;
mod messenger;
mod traits;

pub use error::PublishError;
pub use messenger::MessengerPublisher;
pub use traits::Publisher;
