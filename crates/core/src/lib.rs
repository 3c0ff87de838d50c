//! `blogdesk-core` — wire foundation shared by the session core.
//!
//! This crate contains the blog API's response envelope, its status
//! discriminator and identifier types. No I/O and no session state.

pub mod envelope;
pub mod error;
pub mod id;
pub mod status;

pub use envelope::Envelope;
pub use error::{EnvelopeError, EnvelopeResult};
pub use id::{NavigationId, UserId};
pub use status::ApiStatus;
