//! Chat transport boundary.
//!
//! The pipeline only ever needs three things from a chat surface: send a
//! text message, edit it later, and deliver a file. Concrete transports live
//! outside core (the bot crate ships a Telegram implementation).

mod error;
mod traits;

pub use error::MessengerError;
pub use traits::{MessageHandle, Messenger};
