//! Message templates.
//!
//! Everything the bot writes is built here from fixed texts: the tracking
//! artifact with its subscriber count, subscription replies, invalid-request
//! notices, notifications, and operator forwards.

pub mod artifact;
pub mod replies;

pub use artifact::{
    COMPOSE_URL, LinkError, annotate_subscriber_count, compose_link, invitation_body,
    subscriber_suffix,
};
pub use replies::Diagnosis;
